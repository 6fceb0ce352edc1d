/// Cancellation state machine shared by playback and recording sessions.
///
/// State transitions:
/// ```text
/// Active → CancelRequested → CancelSignaled → Stopped
///    └────────(natural end of stream)────────────┘
/// ```
///
/// Transitions only ever move forward. The guarded methods below return
/// whether the transition applied, so an out-of-order request is a no-op
/// rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Normal streaming.
    Active,
    /// The user asked to stop; SM_CANCEL not yet written.
    CancelRequested,
    /// SM_CANCEL has been written; waiting for the device to clear it.
    CancelSignaled,
    /// Terminal. The session loop must exit on its next check.
    Stopped,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// `Active → CancelRequested`. No-op in any other state.
    pub fn request_cancel(&mut self) -> bool {
        if matches!(self, Self::Active) {
            *self = Self::CancelRequested;
            true
        } else {
            false
        }
    }

    /// `CancelRequested → CancelSignaled`. Exactly one such transition
    /// happens per session; re-signaling is a no-op.
    pub fn cancel_signaled(&mut self) -> bool {
        if matches!(self, Self::CancelRequested) {
            *self = Self::CancelSignaled;
            true
        } else {
            false
        }
    }

    /// `CancelSignaled → Stopped`, or `Active → Stopped` when the stream
    /// ended naturally without a user cancellation.
    pub fn stop(&mut self) -> bool {
        if matches!(self, Self::Active | Self::CancelSignaled) {
            *self = Self::Stopped;
            true
        } else {
            false
        }
    }
}
