use crate::models::progress::{PlaybackProgress, RecordProgress};
use crate::models::state::SessionState;

/// Event sink for session notifications.
///
/// Purely advisory: engines emit a structured record each reporting
/// interval and on every state transition, and never wait for an
/// acknowledgment. All calls happen on the engine's own (single) thread.
pub trait ProgressObserver {
    /// Called when the session's cancellation state advances.
    fn on_state_changed(&self, state: SessionState);

    /// Called each reporting interval during playback.
    fn on_playback_progress(&self, progress: &PlaybackProgress);

    /// Called each reporting interval during recording.
    fn on_record_progress(&self, progress: &RecordProgress);
}
