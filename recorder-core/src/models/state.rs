/// Session lifecycle as observed by the bridge.
///
/// ```text
/// initialized → recording ⇄ stopped
///      │            │         │
///      └────────────┴─────────┴──→ deleted
/// ```
///
/// Only `Deleted` is enforced locally. Start/stop ordering is left to the
/// engine, which reports `INVALID_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initialized,
    Recording,
    Stopped,
    Deleted,
}

impl SessionState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}
