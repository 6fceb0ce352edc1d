//! # vs1063-sim
//!
//! Deterministic simulated VS1063 for tests and desktop bring-up.
//!
//! Provides [`SimDevice`], a software chip implementing
//! [`vs1063_core::SciBus`]: register file, parametric WRAM with the
//! auto-incrementing pointer, SDI byte sink, SM_CANCEL clearing after a
//! configurable drain, encoder word production, and soft-reset behavior.
//!
//! The simulation steps only on bus accesses (no threads, no timers), so
//! every run is exactly reproducible. The device handle is cloneable:
//! hand one clone to the driver and keep another to script and inspect
//! the chip from the test.
//!
//! ## Usage
//! ```ignore
//! use vs1063_core::{PlaybackSession, Vs1063};
//! use vs1063_sim::SimDevice;
//!
//! let sim = SimDevice::new();
//! sim.set_header_word(0x7665); // pretend a RIFF stream is playing
//! let mut device = Vs1063::new(sim.clone());
//! device.init()?;
//! ```

mod device;

pub use device::SimDevice;

#[cfg(test)]
mod integration_tests;
