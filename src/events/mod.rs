use crate::conversion::ConversionResult;
use crate::error::{Error, FailureKind};
use crate::models::JobStatus;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Progress,
    Status,
    Complete,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Start,
        EventKind::Progress,
        EventKind::Status,
        EventKind::Complete,
        EventKind::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Progress => "progress",
            EventKind::Status => "status",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
        }
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown event: {}", name)))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStep {
    RequestingUploadUrl,
    Uploading,
    Confirming,
    Converting,
    Downloading,
}

impl ProgressStep {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStep::RequestingUploadUrl => "requesting-upload-url",
            ProgressStep::Uploading => "uploading",
            ProgressStep::Confirming => "confirming",
            ProgressStep::Converting => "converting",
            ProgressStep::Downloading => "downloading",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ProgressStep::RequestingUploadUrl => "Requesting upload URL from server...",
            ProgressStep::Uploading => "Uploading file to cloud storage...",
            ProgressStep::Confirming => "Confirming upload and queuing conversion...",
            ProgressStep::Converting => "Converting image...",
            ProgressStep::Downloading => "Downloading converted file...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartEvent {
    pub file_name: String,
    pub source_format: String,
    pub target_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub step: ProgressStep,
    pub message: String,
    pub job_id: Option<String>,
    pub status: Option<JobStatus>,
}

impl ProgressEvent {
    pub fn new(step: ProgressStep, job_id: Option<&str>) -> Self {
        Self {
            step,
            message: step.message().to_string(),
            job_id: job_id.map(str::to_string),
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub job_id: String,
    pub status: JobStatus,
    pub attempt: u32,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub error: String,
    pub kind: Option<FailureKind>,
    pub input_path: PathBuf,
    pub target_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ConversionEvent {
    Start(StartEvent),
    Progress(ProgressEvent),
    Status(StatusEvent),
    Complete(ConversionResult),
    Error(ErrorEvent),
}

impl ConversionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ConversionEvent::Start(_) => EventKind::Start,
            ConversionEvent::Progress(_) => EventKind::Progress,
            ConversionEvent::Status(_) => EventKind::Status,
            ConversionEvent::Complete(_) => EventKind::Complete,
            ConversionEvent::Error(_) => EventKind::Error,
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&ConversionEvent) + Send + Sync>;

/// One handler slot per event kind, shared by every clone of a client.
#[derive(Clone, Default)]
pub struct EventHandlers {
    slots: Arc<RwLock<HashMap<EventKind, EventHandler>>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever handler was registered for `kind`.
    pub fn register(&self, kind: EventKind, handler: EventHandler) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.insert(kind, handler);
    }

    pub fn unregister(&self, kind: EventKind) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&kind).is_some()
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.contains_key(&kind)
    }

    /// Invokes the handler inline; the lock is released first so a handler
    /// may re-register.
    pub fn emit(&self, event: ConversionEvent) {
        let handler = {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            slots.get(&event.kind()).cloned()
        };

        if let Some(handler) = handler {
            handler(&event);
        }
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let registered: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|kind| slots.contains_key(kind))
            .collect();
        f.debug_struct("EventHandlers")
            .field("registered", &registered)
            .finish()
    }
}
