//! # vs1063-core
//!
//! Transport-agnostic driver core for the VLSI VS1063 streaming audio
//! codec.
//!
//! The chip does all encoding and decoding; this crate owns the host side
//! of the conversation: turning a byte source into correctly paced,
//! correctly terminated SDI transactions for playback, and turning encoder
//! capture words into a well-formed output file for recording. That
//! includes format sniffing, the two-phase cancellation protocol,
//! end-of-stream fill bytes, and RIFF header backpatching.
//!
//! Transports (SPI timing, chip select, DREQ) implement the [`SciBus`]
//! trait and plug in underneath; `vs1063-sim` ships a deterministic
//! simulated chip for tests and desktop bring-up.
//!
//! ## Architecture
//!
//! ```text
//! vs1063-core (this crate)
//! ├── traits/   ← SciBus, CommandSource, ProgressObserver
//! ├── models/   ← DriverError, SessionState, AudioFormat, RecordConfig, ...
//! ├── device/   ← register map, parametric memory, bring-up, patch loading
//! ├── session/  ← PlaybackSession, RecordSession (the streaming engines)
//! └── storage/  ← RIFF length patcher, metadata sidecar, checksums
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use vs1063_core::{PlaybackSession, Vs1063};
//!
//! let mut device = Vs1063::with_patch(bus, patch_image);
//! device.init()?;
//! let summary = PlaybackSession::new(&mut device, keys).run(&mut file)?;
//! println!("played {} bytes of {}", summary.bytes_streamed, summary.format);
//! ```

pub mod device;
pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use device::Vs1063;
pub use models::config::{AdcMode, RecordCodec, RecordConfig, RecordQuality};
pub use models::error::DriverError;
pub use models::format::AudioFormat;
pub use models::progress::{PlaybackProgress, RecordProgress, VuReading};
pub use models::recording_result::{RecordingMetadata, RecordingResult, RecordingSummary};
pub use models::session::{PlaybackSummary, StreamDirection, StreamSession};
pub use models::state::SessionState;
pub use session::playback::PlaybackSession;
pub use session::record::{record_to_path, RecordSession};
pub use traits::command_source::{Command, CommandSource};
pub use traits::progress_observer::ProgressObserver;
pub use traits::sci_bus::SciBus;
