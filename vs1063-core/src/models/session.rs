use super::format::{AudioFormat, END_FILL_SHORT};
use super::state::SessionState;

/// Which way bytes flow through the bulk-data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    Playback,
    Record,
}

/// Mutable state of one playback or recording pass.
///
/// Owned exclusively by the engine executing the session: created at call
/// entry, dropped at return, never shared across sessions. What used to be
/// scattered globals in typical firmware examples lives here instead.
#[derive(Debug, Clone)]
pub struct StreamSession {
    pub direction: StreamDirection,
    /// Running byte position (bytes sent for playback, bytes captured for
    /// recording).
    pub position: u64,
    pub state: SessionState,
    pub format: AudioFormat,
    /// Fill byte value for the end-of-stream flush. Sampled from
    /// PAR_END_FILL_BYTE during healthy playback only; the register may
    /// return garbage once cancellation is in flight.
    pub fill_byte: u8,
    /// Fill byte count, chosen by format family.
    pub fill_count: usize,
    /// Byte position at which the next progress report is due.
    pub next_report: u64,
}

impl StreamSession {
    pub fn playback() -> Self {
        Self {
            direction: StreamDirection::Playback,
            position: 0,
            state: SessionState::Active,
            format: AudioFormat::Unknown,
            fill_byte: 0,
            // Until the first sniff lands, assume the common short flush.
            fill_count: END_FILL_SHORT,
            next_report: 0,
        }
    }

    pub fn record(format: AudioFormat) -> Self {
        Self {
            direction: StreamDirection::Record,
            position: 0,
            state: SessionState::Active,
            format,
            fill_byte: 0,
            fill_count: 0,
            next_report: 0,
        }
    }
}

/// What a finished playback session streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    /// Source bytes pushed through the bulk channel by the main loop.
    pub bytes_streamed: u64,
    /// Fill bytes written by the flush and end-of-stream drain.
    pub fill_bytes_sent: u64,
    /// Last format sniffed before the session ended.
    pub format: AudioFormat,
    pub final_state: SessionState,
}
