//! The streaming engines. One session (playback or recording) runs at a
//! time on a single call stack; the bus is exclusively owned by whichever
//! engine is executing.

pub mod playback;
pub mod record;

/// Source read chunk size.
pub const FILE_BUFFER_SIZE: usize = 512;

/// Upper bound for a single SDI burst. The device input FIFO is shallow;
/// larger single transfers risk overrun on some transports.
pub const SDI_MAX_TRANSFER_SIZE: usize = 32;

/// Words drained from the encoder per loop iteration at most.
pub const REC_BUFFER_WORDS: usize = 256;

/// Bytes between progress collections. 1–8 KiB is a good range.
pub const REPORT_INTERVAL: u64 = 4096;

/// Fill-byte pairs written to an unresponsive decoder before giving up on
/// the natural-end drain.
pub const MAX_CANCEL_DRAIN_PAIRS: usize = 65_536;

/// Idle polls tolerated after a recording cancel before giving up.
pub const MAX_CANCEL_IDLE_POLLS: usize = 65_536;
