use chrono::{NaiveDate, NaiveDateTime};
use migravoice::config::PlannerConfig;
use migravoice::dialogue::{DialogueState, SessionEvent, SideEffect};
use migravoice::error::CaptureError;
use migravoice::intent::{Intent, MutationKind};
use migravoice::parser::{MedicationVocabulary, Transcript};
use migravoice::plan::{ConfirmType, EntryRef, Plan, Risk};
use migravoice::Orchestrator;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 28)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(
        PlannerConfig::default(),
        MedicationVocabulary::from_names(&["Sumatriptan", "Ibuprofen"]),
    )
}

fn capture(orch: &mut Orchestrator, text: &str) -> Vec<SideEffect> {
    let start = orch.handle_event_at(SessionEvent::StartRecording, now());
    assert_eq!(start, vec![SideEffect::StartCapture]);
    orch.handle_event_at(
        SessionEvent::CaptureFinished(Ok(Transcript::german(text, 0.95))),
        now(),
    )
}

fn executed_plan(effects: &[SideEffect]) -> Option<&Plan> {
    effects.iter().find_map(|e| match e {
        SideEffect::Execute(plan) => Some(plan),
        _ => None,
    })
}

#[test]
fn scenario_create_executes_without_confirmation() {
    let mut orch = orchestrator();
    capture(&mut orch, "Ich habe Schmerzstufe 8 und Sumatriptan 50 genommen, jetzt");

    assert_eq!(orch.state(), DialogueState::Reviewing);
    let plan = orch.current_plan().expect("plan").clone();
    let mutation = match plan {
        Plan::Mutation(m) => m,
        other => panic!("expected unwrapped mutation, got {}", other.kind_name()),
    };
    assert_eq!(mutation.mutation_type, MutationKind::Create);
    assert_eq!(mutation.risk, Risk::Low);
    assert!(mutation.confidence >= 0.8);
    assert_eq!(mutation.payload.pain_level, Some(8));
    assert_eq!(mutation.payload.medications[0].label(), "Sumatriptan 50");

    let effects = orch.handle_event_at(SessionEvent::SaveRequested, now());
    assert_eq!(orch.state(), DialogueState::Saving);
    assert!(matches!(executed_plan(&effects), Some(Plan::Mutation(_))));

    let effects = orch.handle_event_at(SessionEvent::SaveFinished(Ok(())), now());
    assert!(effects.contains(&SideEffect::SessionClosed));
    assert_eq!(orch.state(), DialogueState::Idle);
}

#[test]
fn scenario_delete_requires_danger_confirmation() {
    let mut orch = orchestrator();
    capture(&mut orch, "Lösche den Eintrag von gestern");

    assert_eq!(orch.state(), DialogueState::Reviewing);
    match orch.current_plan() {
        Some(Plan::Confirm(c)) => {
            assert_eq!(c.confirm_type, ConfirmType::Danger);
            match c.pending.as_ref() {
                Plan::Mutation(m) => {
                    assert_eq!(m.mutation_type, MutationKind::Delete);
                    assert_eq!(m.risk, Risk::High);
                    assert_eq!(
                        m.payload.entry_ref,
                        Some(EntryRef::Date(NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()))
                    );
                }
                other => panic!("expected pending mutation, got {}", other.kind_name()),
            }
        }
        other => panic!("expected confirmation, got {other:?}"),
    }

    // The save action enters confirmation instead of executing.
    let effects = orch.handle_event_at(SessionEvent::SaveRequested, now());
    assert_eq!(orch.state(), DialogueState::Confirming);
    assert!(executed_plan(&effects).is_none());
    assert!(effects
        .iter()
        .any(|e| matches!(e, SideEffect::Speak(q) if q.contains("wirklich"))));

    // Only an explicit confirm reaches the executor.
    let effects = orch.handle_event_at(SessionEvent::Confirmed, now());
    assert_eq!(orch.state(), DialogueState::Saving);
    match executed_plan(&effects) {
        Some(Plan::Mutation(m)) => assert_eq!(m.mutation_type, MutationKind::Delete),
        other => panic!("expected delete execution, got {other:?}"),
    }
}

#[test]
fn risky_mutation_never_skips_confirming() {
    let mut orch = orchestrator();
    capture(&mut orch, "Lösche den Eintrag von gestern");

    // A Confirmed event in reviewing is an illegal shortcut; nothing
    // may execute and the state may not change.
    let effects = orch.handle_event_at(SessionEvent::Confirmed, now());
    assert!(effects.is_empty());
    assert_eq!(orch.state(), DialogueState::Reviewing);
}

#[test]
fn scenario_empty_transcript_degrades_to_not_supported() {
    let mut orch = orchestrator();
    capture(&mut orch, "");

    assert_eq!(orch.state(), DialogueState::Reviewing);
    match orch.current_plan() {
        Some(Plan::NotSupported(plan)) => {
            assert!((0.0..=1.0).contains(&plan.confidence));
            assert!(!plan.suggestions.is_empty());
        }
        other => panic!("expected not-supported plan, got {other:?}"),
    }

    // Saving an unsupported plan is refused, not crashed on.
    let effects = orch.handle_event_at(SessionEvent::SaveRequested, now());
    assert!(effects.is_empty());
    assert_eq!(orch.state(), DialogueState::Reviewing);
}

#[test]
fn ambiguous_utterance_offers_two_options() {
    let mut orch = orchestrator();
    capture(&mut orch, "Zeig den Verlauf, wann war der letzte Eintrag?");

    assert_eq!(orch.state(), DialogueState::Disambiguating);
    let options = match orch.current_plan() {
        Some(Plan::Disambiguation(d)) => d.options.clone(),
        other => panic!("expected disambiguation, got {other:?}"),
    };
    assert!(options[0].score >= options[1].score);
    assert!(options[0].score - options[1].score < 0.15);

    // The user's choice routes straight to plan building. The chosen
    // intent's score times capture confidence lands below the
    // confirmation threshold here, so the query is gated too.
    orch.handle_event_at(SessionEvent::OptionSelected(Intent::Query), now());
    assert_eq!(orch.state(), DialogueState::Reviewing);
    match orch.current_plan() {
        Some(Plan::Confirm(c)) => {
            assert_eq!(c.confirm_type, ConfirmType::Normal);
            assert!(matches!(c.pending.as_ref(), Plan::Query(_)));
        }
        other => panic!("expected gated query, got {other:?}"),
    }

    orch.handle_event_at(SessionEvent::SaveRequested, now());
    assert_eq!(orch.state(), DialogueState::Confirming);
    let effects = orch.handle_event_at(SessionEvent::Confirmed, now());
    assert!(matches!(executed_plan(&effects), Some(Plan::Query(_))));
}

#[test]
fn change_request_returns_to_reviewing() {
    let mut orch = orchestrator();
    capture(&mut orch, "Lösche den Eintrag von gestern");
    orch.handle_event_at(SessionEvent::SaveRequested, now());
    assert_eq!(orch.state(), DialogueState::Confirming);

    orch.handle_event_at(SessionEvent::ChangeRequested, now());
    assert_eq!(orch.state(), DialogueState::Reviewing);
    // The plan keeps its confirmation wrapper for the next save attempt.
    assert!(matches!(orch.current_plan(), Some(Plan::Confirm(_))));
}

#[test]
fn save_failure_surfaces_and_allows_explicit_retry() {
    let mut orch = orchestrator();
    capture(&mut orch, "Ich habe Schmerzstufe 8 und Sumatriptan 50 genommen, jetzt");
    orch.handle_event_at(SessionEvent::SaveRequested, now());

    let effects =
        orch.handle_event_at(SessionEvent::SaveFinished(Err("store offline".to_string())), now());
    assert_eq!(orch.state(), DialogueState::Reviewing);
    assert_eq!(orch.last_error(), Some("store offline"));
    assert!(effects
        .iter()
        .any(|e| matches!(e, SideEffect::Speak(msg) if msg.contains("store offline"))));

    // No automatic retry; a second explicit save executes again.
    let effects = orch.handle_event_at(SessionEvent::SaveRequested, now());
    assert_eq!(orch.state(), DialogueState::Saving);
    assert!(executed_plan(&effects).is_some());
}

#[test]
fn failed_risky_save_must_be_reconfirmed() {
    let mut orch = orchestrator();
    capture(&mut orch, "Lösche den Eintrag von gestern");
    orch.handle_event_at(SessionEvent::SaveRequested, now());
    orch.handle_event_at(SessionEvent::Confirmed, now());
    assert_eq!(orch.state(), DialogueState::Saving);

    orch.handle_event_at(SessionEvent::SaveFinished(Err("store offline".to_string())), now());
    assert_eq!(orch.state(), DialogueState::Reviewing);
    assert!(matches!(orch.current_plan(), Some(Plan::Confirm(_))));

    // The retry goes through confirmation again, not straight to the
    // executor.
    let effects = orch.handle_event_at(SessionEvent::SaveRequested, now());
    assert_eq!(orch.state(), DialogueState::Confirming);
    assert!(executed_plan(&effects).is_none());
}

#[test]
fn cancel_is_immediate_and_total() {
    let mut orch = orchestrator();
    capture(&mut orch, "Ich hatte Schmerzstufe 8");
    assert_eq!(orch.state(), DialogueState::SlotFilling);

    let effects = orch.handle_event_at(SessionEvent::Cancelled, now());
    assert_eq!(
        effects,
        vec![
            SideEffect::StopCapture,
            SideEffect::StopSpeech,
            SideEffect::SessionClosed
        ]
    );
    assert_eq!(orch.state(), DialogueState::Idle);
    assert!(orch.current_plan().is_none());

    // Nothing in flight may execute after the cancel was observed.
    let effects = orch.handle_event_at(SessionEvent::SaveFinished(Ok(())), now());
    assert!(effects.is_empty());
    assert_eq!(orch.state(), DialogueState::Idle);
}

#[test]
fn unavailable_capture_reports_and_resets() {
    let mut orch = orchestrator();
    orch.handle_event_at(SessionEvent::StartRecording, now());
    let effects = orch.handle_event_at(
        SessionEvent::CaptureFinished(Err(CaptureError::Unavailable("no microphone".to_string()))),
        now(),
    );
    assert_eq!(orch.state(), DialogueState::Idle);
    assert!(effects.contains(&SideEffect::SessionClosed));
    assert!(effects
        .iter()
        .any(|e| matches!(e, SideEffect::Speak(msg) if msg.contains("nicht verfügbar"))));
}

#[test]
fn every_emitted_plan_stays_within_confidence_bounds() {
    let inputs = [
        "Ich habe Schmerzstufe 8 und Sumatriptan 50 genommen, jetzt",
        "Lösche den Eintrag von gestern",
        "Wie viele Einträge hatte ich letzte Woche?",
        "Öffne den Kalender",
        "",
    ];
    for text in inputs {
        let mut orch = orchestrator();
        capture(&mut orch, text);
        if let Some(plan) = orch.current_plan() {
            let confidence = plan.confidence();
            assert!((0.0..=1.0).contains(&confidence), "{text}: {confidence}");
        }
        orch.handle_event_at(SessionEvent::Cancelled, now());
    }
}

#[test]
fn stray_events_never_break_the_state_machine() {
    let mut orch = orchestrator();
    // Events with no session are dropped.
    assert!(orch
        .handle_event_at(SessionEvent::SlotInput("8".to_string()), now())
        .is_empty());
    assert!(orch.handle_event_at(SessionEvent::SaveRequested, now()).is_empty());

    // A second capture start while recording is refused.
    orch.handle_event_at(SessionEvent::StartRecording, now());
    assert!(orch.handle_event_at(SessionEvent::StartRecording, now()).is_empty());
    assert_eq!(orch.state(), DialogueState::Recording);

    // Slot input during recording is ignored.
    assert!(orch
        .handle_event_at(SessionEvent::SlotInput("gestern".to_string()), now())
        .is_empty());
    assert_eq!(orch.state(), DialogueState::Recording);
}
