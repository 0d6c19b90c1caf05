use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::error::CaptureError;
use crate::intent::{Disambiguator, Intent, IntentClassifier, Resolution};
use crate::parser::{self, MedicationVocabulary, SlotAnswer, SlotKind, Transcript};
use crate::plan::types::DisambiguationPlan;
use crate::plan::{missing_slots, Plan, PlanBuilder, SlotEngine};

use super::event::{SessionEvent, SideEffect};
use super::session::DialogueSession;
use super::state::DialogueState;

/// The dialogue state machine. Synchronous: `handle_event_at` takes one
/// event, returns the side effects the driver must run. All I/O (capture,
/// synthesis, store) lives behind those effects.
// Note: one session at a time. Multi-session would need the registry to
// move out of here, not planned.
pub struct Orchestrator {
    config: PlannerConfig,
    vocabulary: MedicationVocabulary,
    classifier: IntentClassifier,
    disambiguator: Disambiguator,
    builder: PlanBuilder,
    slot_engine: SlotEngine,
    session: Option<DialogueSession>,
}

impl Orchestrator {
    pub fn new(config: PlannerConfig, vocabulary: MedicationVocabulary) -> Self {
        Self {
            classifier: IntentClassifier::new(config.classification_floor),
            disambiguator: Disambiguator::new(
                config.disambiguation_margin,
                config.disambiguation_ceiling,
            ),
            builder: PlanBuilder::new(config.clone()),
            slot_engine: SlotEngine::new(vocabulary.clone()),
            vocabulary,
            config,
            session: None,
        }
    }

    // --- Introspection for the presentation layer ---

    pub fn state(&self) -> DialogueState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(DialogueState::Idle)
    }

    pub fn state_name(&self) -> &'static str {
        self.state().name()
    }

    pub fn current_plan(&self) -> Option<&Plan> {
        self.session.as_ref().and_then(|s| s.current_plan.as_ref())
    }

    pub fn retry_count(&self, kind: SlotKind) -> u32 {
        self.session
            .as_ref()
            .map(|s| s.retry_count(kind))
            .unwrap_or(0)
    }

    pub fn session(&self) -> Option<&DialogueSession> {
        self.session.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.last_error.as_deref())
    }

    // --- Event handling ---

    pub fn handle_event(&mut self, event: SessionEvent) -> Vec<SideEffect> {
        self.handle_event_at(event, Local::now().naive_local())
    }

    /// `now` is injected so processing is reproducible; production code
    /// goes through `handle_event`.
    pub fn handle_event_at(&mut self, event: SessionEvent, now: NaiveDateTime) -> Vec<SideEffect> {
        match event {
            SessionEvent::Cancelled => self.cancel(),
            SessionEvent::StartRecording => self.start_recording(),
            SessionEvent::CaptureFinished(result) => self.capture_finished(result, now),
            SessionEvent::SlotInput(value) => self.slot_input(&value, now),
            SessionEvent::OptionSelected(intent) => self.option_selected(intent, now),
            SessionEvent::SaveRequested => self.save_requested(),
            SessionEvent::Confirmed => self.confirmed(),
            SessionEvent::ChangeRequested => self.change_requested(),
            SessionEvent::SaveFinished(result) => self.save_finished(result),
        }
    }

    /// Cancellation is immediate and total: any in-flight capture or
    /// speech stops, no pending plan may execute afterwards.
    fn cancel(&mut self) -> Vec<SideEffect> {
        if let Some(session) = self.session.take() {
            info!(session = %session.id, from = session.state.name(), "session cancelled");
            vec![
                SideEffect::StopCapture,
                SideEffect::StopSpeech,
                SideEffect::SessionClosed,
            ]
        } else {
            Vec::new()
        }
    }

    fn start_recording(&mut self) -> Vec<SideEffect> {
        if self.session.is_some() {
            warn!("capture start ignored: session already active");
            return Vec::new();
        }
        let session = DialogueSession::new();
        info!(session = %session.id, "session started");
        self.session = Some(session);
        vec![SideEffect::StartCapture]
    }

    fn capture_finished(
        &mut self,
        result: Result<Transcript, CaptureError>,
        now: NaiveDateTime,
    ) -> Vec<SideEffect> {
        let Some(session) = self.session.as_mut() else {
            warn!("capture result without a session, dropped");
            return Vec::new();
        };
        if session.state != DialogueState::Recording {
            warn!(state = session.state.name(), "capture result ignored");
            return Vec::new();
        }

        match result {
            Ok(transcript) => {
                session.transition(DialogueState::Processing);
                self.process(transcript, now)
            }
            Err(CaptureError::Unavailable(reason)) => {
                warn!(%reason, "speech capture unavailable");
                self.session = None;
                vec![
                    SideEffect::Speak("Die Spracheingabe ist auf diesem Gerät nicht verfügbar.".to_string()),
                    SideEffect::SessionClosed,
                ]
            }
            Err(CaptureError::Cancelled) => {
                self.session = None;
                vec![SideEffect::SessionClosed]
            }
            Err(CaptureError::Failed(reason)) => {
                // Unintelligible capture degrades to the empty-transcript
                // path instead of erroring out.
                warn!(%reason, "capture failed, degrading to empty transcript");
                session.transition(DialogueState::Processing);
                self.process(Transcript::german("", 0.0), now)
            }
        }
    }

    /// Parsing and classification run as one atomic step; the session
    /// never rests in `Processing`.
    fn process(&mut self, transcript: Transcript, now: NaiveDateTime) -> Vec<SideEffect> {
        let slots = parser::parse(&transcript, now, &self.vocabulary);
        let candidates = self.classifier.classify(&transcript, &slots);

        let session = self.session.as_mut().expect("process requires a session");
        session.collected = slots;
        session.transcripts.push(transcript.clone());

        let top = candidates[0].clone();
        if top.intent == Intent::Unsupported {
            let plan = Plan::NotSupported(
                self.builder
                    .not_supported("Das habe ich leider nicht verstanden.".to_string(), top.score),
            );
            return self.show_plan(plan);
        }

        match self.disambiguator.resolve(&candidates) {
            Resolution::Ambiguous(first, second) => {
                let plan = Plan::Disambiguation(DisambiguationPlan {
                    options: [first, second],
                    transcript: transcript.text,
                });
                let prompt = plan.summary();
                let session = self.session.as_mut().expect("session");
                session.current_plan = Some(plan);
                session.transition(DialogueState::Disambiguating);
                vec![SideEffect::Speak(prompt)]
            }
            Resolution::Committed(candidate) => {
                self.commit_intent(candidate.intent, candidate.score, now)
            }
        }
    }

    /// An intent is decided (directly or via a disambiguation choice):
    /// either ask for missing slots or build the final plan.
    fn commit_intent(&mut self, intent: Intent, score: f32, now: NaiveDateTime) -> Vec<SideEffect> {
        let session = self.session.as_mut().expect("commit requires a session");
        session.committed_intent = Some(intent);
        session.committed_score = score;

        let missing = missing_slots(intent, &session.collected, &session.answered);
        if missing.is_empty() {
            return self.finish_plan(now);
        }

        let confidence = score * session.capture_confidence();
        let plan = Plan::SlotFilling(self.slot_engine.elicitation_plan(
            missing,
            session.collected.clone(),
            confidence,
        ));
        let prompt = plan.summary();
        session.current_plan = Some(plan);
        session.transition(DialogueState::SlotFilling);
        vec![SideEffect::Speak(prompt)]
    }

    fn finish_plan(&mut self, now: NaiveDateTime) -> Vec<SideEffect> {
        let session = self.session.as_ref().expect("finish requires a session");
        let Some(intent) = session.committed_intent else {
            warn!("no committed intent, cannot build a plan");
            return Vec::new();
        };
        let confidence = session.committed_score * session.capture_confidence();
        let text = session
            .last_transcript()
            .map(|t| t.text.clone())
            .unwrap_or_default();
        let plan = self
            .builder
            .build(intent, &session.collected, &text, confidence, now);
        self.show_plan(plan)
    }

    /// Present a finished plan for review. Confirmation is not entered
    /// here; it happens on the explicit save action.
    fn show_plan(&mut self, plan: Plan) -> Vec<SideEffect> {
        let summary = plan.summary();
        let session = self.session.as_mut().expect("session");
        info!(session = %session.id, kind = plan.kind_name(), "plan ready for review");
        session.current_plan = Some(plan);
        session.transition(DialogueState::Reviewing);
        vec![SideEffect::Speak(summary)]
    }

    fn slot_input(&mut self, value: &str, now: NaiveDateTime) -> Vec<SideEffect> {
        let Some(session) = self.session.as_mut() else {
            warn!("slot input without a session, dropped");
            return Vec::new();
        };
        if session.state != DialogueState::SlotFilling {
            warn!(state = session.state.name(), "slot input ignored");
            return Vec::new();
        }
        let Some(Plan::SlotFilling(current)) = session.current_plan.clone() else {
            warn!("slot filling state without a slot plan");
            return Vec::new();
        };
        let kind = current.missing_slots[0];

        match parser::parse_slot(kind, value, now, &self.vocabulary) {
            SlotAnswer::Value(partial) => {
                session.collected.merge(partial);
                session.answered.insert(kind);
            }
            SlotAnswer::Declined => {
                session.answered.insert(kind);
            }
            SlotAnswer::Unrecognized => {
                let attempts = session.bump_retry(kind);
                if attempts >= self.config.slot_retry_limit {
                    info!(slot = kind.label(), attempts, "slot retries exhausted");
                    let plan = Plan::NotSupported(self.builder.not_supported(
                        "Das klappt per Sprache gerade nicht. Lege den Eintrag bitte manuell an."
                            .to_string(),
                        current.confidence,
                    ));
                    return self.show_plan(plan);
                }
                let prompt = self.slot_engine.retry_prompt(kind);
                session.transition(DialogueState::SlotFilling);
                return vec![SideEffect::Speak(prompt)];
            }
        }

        let Some(intent) = session.committed_intent else {
            warn!("slot filling without a committed intent");
            return Vec::new();
        };
        let missing = missing_slots(intent, &session.collected, &session.answered);
        if missing.is_empty() {
            return self.finish_plan(now);
        }

        let confidence = current.confidence;
        let plan = Plan::SlotFilling(self.slot_engine.elicitation_plan(
            missing,
            session.collected.clone(),
            confidence,
        ));
        let prompt = plan.summary();
        session.current_plan = Some(plan);
        session.transition(DialogueState::SlotFilling);
        vec![SideEffect::Speak(prompt)]
    }

    /// A disambiguation choice routes straight back into plan building
    /// with the chosen intent; no re-classification.
    fn option_selected(&mut self, intent: Intent, now: NaiveDateTime) -> Vec<SideEffect> {
        let Some(session) = self.session.as_ref() else {
            warn!("option selected without a session, dropped");
            return Vec::new();
        };
        if session.state != DialogueState::Disambiguating {
            warn!(state = session.state.name(), "option selection ignored");
            return Vec::new();
        }
        let score = match &session.current_plan {
            Some(Plan::Disambiguation(d)) => d
                .options
                .iter()
                .find(|c| c.intent == intent)
                .map(|c| c.score)
                .unwrap_or(0.6),
            _ => 0.6,
        };
        self.commit_intent(intent, score, now)
    }

    fn save_requested(&mut self) -> Vec<SideEffect> {
        let Some(session) = self.session.as_mut() else {
            warn!("save requested without a session, dropped");
            return Vec::new();
        };
        if session.state != DialogueState::Reviewing {
            warn!(state = session.state.name(), "save request ignored");
            return Vec::new();
        }
        session.last_error = None;

        match session.current_plan.clone() {
            Some(Plan::Confirm(confirm)) => {
                session.transition(DialogueState::Confirming);
                vec![SideEffect::Speak(confirm.question)]
            }
            Some(plan @ (Plan::Mutation(_) | Plan::Navigate(_) | Plan::Query(_))) => {
                session.transition(DialogueState::Saving);
                vec![SideEffect::Execute(plan)]
            }
            other => {
                warn!(plan = other.map(|p| p.kind_name()).unwrap_or("none"), "nothing to save");
                Vec::new()
            }
        }
    }

    fn confirmed(&mut self) -> Vec<SideEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.state != DialogueState::Confirming {
            warn!(state = session.state.name(), "confirm ignored");
            return Vec::new();
        }
        let Some(Plan::Confirm(confirm)) = session.current_plan.clone() else {
            warn!("confirming state without a confirm plan");
            return Vec::new();
        };
        let pending = *confirm.pending;
        session.current_plan = Some(pending.clone());
        session.transition(DialogueState::Saving);
        vec![SideEffect::Execute(pending)]
    }

    fn change_requested(&mut self) -> Vec<SideEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.state != DialogueState::Confirming {
            warn!(state = session.state.name(), "change request ignored");
            return Vec::new();
        }
        session.transition(DialogueState::Reviewing);
        Vec::new()
    }

    fn save_finished(&mut self, result: Result<(), String>) -> Vec<SideEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.state != DialogueState::Saving {
            warn!(state = session.state.name(), "save result ignored");
            return Vec::new();
        }

        match result {
            Ok(()) => {
                session.transition(DialogueState::Done);
                info!(session = %session.id, "session complete");
                self.session = None;
                vec![
                    SideEffect::Speak("Gespeichert.".to_string()),
                    SideEffect::SessionClosed,
                ]
            }
            Err(message) => {
                // Surfaced verbatim; retried only on an explicit user
                // action, never automatically. The plan goes back
                // through the gate so a risky retry is confirmed again.
                warn!(%message, "execution failed");
                session.last_error = Some(message.clone());
                if let Some(plan) = session.current_plan.take() {
                    session.current_plan = Some(self.builder.gate(plan));
                }
                session.transition(DialogueState::Reviewing);
                vec![SideEffect::Speak(format!(
                    "Speichern fehlgeschlagen: {message}"
                ))]
            }
        }
    }
}
