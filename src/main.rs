use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use migravoice::dialogue::{SessionEvent, SideEffect};
use migravoice::error::CaptureError;
use migravoice::parser::{MedicationVocabulary, Transcript};
use migravoice::plan::{MutationPlan, Plan};
use migravoice::speech::{ConsoleSpeech, SpeechCapture, SpeechSynthesis};
use migravoice::store::{DiaryStore, MemoryDiaryStore};
use migravoice::{Orchestrator, PlannerConfig};
use migravoice::dialogue::DialogueState;
use migravoice::intent::MutationKind;

/// Console stand-in for the speech recognizer: one line of input is one
/// finished utterance.
struct StdinCapture {
    reader: Mutex<BufReader<Stdin>>,
}

impl StdinCapture {
    fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        let mut reader = self.reader.lock().await;
        match reader.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl SpeechCapture for StdinCapture {
    async fn capture(&self, cancel: CancellationToken) -> Result<Transcript, CaptureError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(CaptureError::Cancelled),
            line = self.read_line() => match line {
                Some(text) => Ok(Transcript::german(&text, 0.92)),
                None => Err(CaptureError::Unavailable("stdin closed".to_string())),
            }
        }
    }

    fn stop(&self) {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    info!("migravoice demo driver starting");

    let vocabulary = MedicationVocabulary::from_names(&[
        "Sumatriptan",
        "Ibuprofen",
        "Paracetamol",
        "Aspirin",
        "Naproxen",
    ]);
    let mut orchestrator = Orchestrator::new(PlannerConfig::default(), vocabulary);

    let capture = StdinCapture::new();
    let tts = ConsoleSpeech;
    let store = MemoryDiaryStore::new();
    let cancel_root = CancellationToken::new();

    println!("Sprachtagebuch-Demo. \"ende\" beendet, \"abbrechen\" bricht die Sitzung ab.");

    let mut pending: VecDeque<SessionEvent> = VecDeque::from([SessionEvent::StartRecording]);
    let mut capture_dead = false;
    'driver: loop {
        while let Some(event) = pending.pop_front() {
            for effect in orchestrator.handle_event(event) {
                match effect {
                    SideEffect::StartCapture => {
                        println!("> Sprich:");
                        let result = capture.capture(cancel_root.child_token()).await;
                        capture_dead = matches!(&result, Err(CaptureError::Unavailable(_)));
                        pending.push_back(SessionEvent::CaptureFinished(result));
                    }
                    SideEffect::StopCapture => capture.stop(),
                    SideEffect::Speak(text) => {
                        println!("  [Anna] {text}");
                        tts.speak(&text).await?;
                    }
                    SideEffect::StopSpeech => tts.stop(),
                    SideEffect::Execute(plan) => {
                        let result = execute(&store, &plan).await;
                        pending.push_back(SessionEvent::SaveFinished(result));
                    }
                    SideEffect::SessionClosed => {
                        println!("  (Sitzung beendet, {} Einträge im Tagebuch)", store.len().await);
                    }
                }
            }
        }

        // Waiting on the user: translate the next console line into the
        // event the current state expects.
        let event = match orchestrator.state() {
            DialogueState::Idle => {
                if capture_dead {
                    break 'driver;
                }
                SessionEvent::StartRecording
            }
            DialogueState::Reviewing => {
                println!("> [speichern / abbrechen / ende]");
                match prompt(&capture).await.as_deref() {
                    Some("ende") | None => break 'driver,
                    Some("abbrechen") => SessionEvent::Cancelled,
                    _ => SessionEvent::SaveRequested,
                }
            }
            DialogueState::Confirming => {
                println!("> [ja / ändern / abbrechen]");
                match prompt(&capture).await.as_deref() {
                    Some("ja") => SessionEvent::Confirmed,
                    Some("ändern") => SessionEvent::ChangeRequested,
                    _ => SessionEvent::Cancelled,
                }
            }
            DialogueState::SlotFilling => match prompt(&capture).await {
                Some(line) if line == "abbrechen" => SessionEvent::Cancelled,
                Some(line) => SessionEvent::SlotInput(line),
                None => break 'driver,
            },
            DialogueState::Disambiguating => {
                let options = match orchestrator.current_plan() {
                    Some(Plan::Disambiguation(d)) => d.options.clone(),
                    _ => break 'driver,
                };
                println!(
                    "> [1: {} / 2: {}]",
                    options[0].intent.describe(),
                    options[1].intent.describe()
                );
                match prompt(&capture).await.as_deref() {
                    Some("2") => SessionEvent::OptionSelected(options[1].intent),
                    Some("abbrechen") | None => SessionEvent::Cancelled,
                    _ => SessionEvent::OptionSelected(options[0].intent),
                }
            }
            // Recording/Processing/Saving/Done resolve through effects,
            // never through console input.
            _ => break 'driver,
        };
        pending.push_back(event);
    }

    info!("driver stopped");
    Ok(())
}

async fn prompt(capture: &StdinCapture) -> Option<String> {
    capture.read_line().await
}

/// The Executor boundary: apply an approved plan to the diary store.
async fn execute(store: &MemoryDiaryStore, plan: &Plan) -> Result<(), String> {
    match plan {
        Plan::Mutation(mutation) => execute_mutation(store, mutation).await,
        Plan::Query(query) => {
            let result = store
                .query(query.query_kind, &query.filters)
                .await
                .map_err(|e| e.to_string())?;
            println!("  [Ergebnis] {} Einträge gefunden", result.total);
            Ok(())
        }
        Plan::Navigate(nav) => {
            println!("  [UI] wechsle zu {:?}", nav.target);
            Ok(())
        }
        other => Err(format!("plan kind {} is not executable", other.kind_name())),
    }
}

async fn execute_mutation(store: &MemoryDiaryStore, plan: &MutationPlan) -> Result<(), String> {
    match plan.mutation_type {
        MutationKind::Create => store
            .create_entry(&plan.payload)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        MutationKind::Delete => {
            let entry_ref = plan
                .payload
                .entry_ref
                .clone()
                .unwrap_or(migravoice::plan::EntryRef::Latest);
            store.delete_entry(&entry_ref).await.map_err(|e| e.to_string())
        }
        MutationKind::Update | MutationKind::Rate => {
            let entry_ref = plan
                .payload
                .entry_ref
                .clone()
                .unwrap_or(migravoice::plan::EntryRef::Latest);
            let effect = plan
                .payload
                .effect
                .unwrap_or(migravoice::plan::EffectRating::Helped);
            store
                .update_effect(&entry_ref, effect)
                .await
                .map_err(|e| e.to_string())
        }
    }
}
