use crate::error::CaptureError;
use crate::intent::Intent;
use crate::parser::Transcript;
use crate::plan::Plan;

/// Every inbound signal the orchestrator can observe. All events funnel
/// through one ordered stream; nothing touches a session concurrently.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User started a voice interaction.
    StartRecording,
    /// The capture capability finished (or failed).
    CaptureFinished(Result<Transcript, CaptureError>),
    /// Free-text or quick-reply answer to the slot currently asked.
    SlotInput(String),
    /// User picked one of the two disambiguation options.
    OptionSelected(Intent),
    /// User approved the pending confirmation.
    Confirmed,
    /// User wants to edit instead of confirming.
    ChangeRequested,
    /// Explicit save action from the review screen.
    SaveRequested,
    /// The executor reported the outcome of the approved action.
    SaveFinished(Result<(), String>),
    /// Explicit cancel; immediate and total.
    Cancelled,
}

/// Outbound effects. The orchestrator stays pure; the async driver
/// executes these against the capability objects.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    StartCapture,
    StopCapture,
    Speak(String),
    StopSpeech,
    /// Hand the approved, unwrapped plan to the external executor.
    Execute(Plan),
    /// The session ended (done, cancelled, or capability unavailable).
    SessionClosed,
}
