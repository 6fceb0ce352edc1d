//! Streaming playback: source bytes → SDI, with pause gating, two-phase
//! cancellation, periodic progress collection, and the end-of-stream
//! flush that leaves the decoder in a stable state no matter how the
//! source ended.

use std::io::Read;

use crate::device::registers::*;
use crate::device::Vs1063;
use crate::models::error::DriverError;
use crate::models::format::AudioFormat;
use crate::models::progress::{PlaybackProgress, VuReading};
use crate::models::session::{PlaybackSummary, StreamSession};
use crate::models::state::SessionState;
use crate::traits::command_source::{Command, CommandSource};
use crate::traits::progress_observer::ProgressObserver;
use crate::traits::sci_bus::SciBus;

use super::{FILE_BUFFER_SIZE, MAX_CANCEL_DRAIN_PAIRS, REPORT_INTERVAL, SDI_MAX_TRANSFER_SIZE};

/// One playback pass over a byte source.
///
/// Owns the [`StreamSession`] for its lifetime; create a fresh one per
/// stream. The device must have been initialized before the first session.
pub struct PlaybackSession<'a, B: SciBus, C: CommandSource> {
    device: &'a mut Vs1063<B>,
    commands: C,
    observer: Option<&'a dyn ProgressObserver>,
    session: StreamSession,
    /// Host copy of PAR_PLAY_MODE; commands read-modify-write through it.
    play_mode: u16,
    /// Attenuation in 0.5 dB steps, assumed equal on both channels.
    vol_level: u8,
    speed_shift: u16,
    ear_speaker: u16,
    rate_tune: i32,
    vu_meter: bool,
}

impl<'a, B: SciBus, C: CommandSource> PlaybackSession<'a, B, C> {
    pub fn new(device: &'a mut Vs1063<B>, commands: C) -> Self {
        Self {
            device,
            commands,
            observer: None,
            session: StreamSession::playback(),
            play_mode: 0,
            vol_level: 0,
            speed_shift: SPEED_SHIFT_NORMAL,
            ear_speaker: 0,
            rate_tune: 0,
            vu_meter: false,
        }
    }

    pub fn observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Play the whole source, then flush and leave the decoder idle.
    ///
    /// Returns once the stream is exhausted or a graceful cancel has been
    /// acknowledged. The engine itself raises no device-health errors;
    /// bus faults propagate as-is.
    pub fn run<R: Read>(mut self, source: &mut R) -> Result<PlaybackSummary, DriverError> {
        self.play_mode = self.device.read_mem(PAR_PLAY_MODE)?;
        self.vol_level = (self.device.bus_mut().read_sci(SCI_VOL)? & 0xFF) as u8;
        self.device.bus_mut().write_sci(SCI_DECODE_TIME, 0)?;
        self.notify_state();

        let mut buf = [0u8; FILE_BUFFER_SIZE];
        while !self.session.state.is_stopped() {
            let n = source
                .read(&mut buf)
                .map_err(|e| DriverError::Source(e.to_string()))?;
            if n == 0 {
                break;
            }
            let mut chunk = &buf[..n];

            while !chunk.is_empty() && !self.session.state.is_stopped() {
                if self.play_mode & PAR_PLAY_MODE_PAUSE_ENA == 0 {
                    let t = chunk.len().min(SDI_MAX_TRANSFER_SIZE);
                    self.device.bus_mut().write_sdi(&chunk[..t])?;
                    chunk = &chunk[t..];
                    self.session.position += t as u64;
                }

                self.step_cancel()?;

                if self.session.state.is_active()
                    && self.session.position >= self.session.next_report
                {
                    self.collect_and_report()?;
                }

                self.dispatch_command()?;
            }
        }

        let fill_bytes_sent = self.flush_and_drain()?;

        Ok(PlaybackSummary {
            bytes_streamed: self.session.position,
            fill_bytes_sent,
            format: self.session.format,
            final_state: self.session.state,
        })
    }

    /// Advance the two cancellation phases.
    ///
    /// Not an `else if` chain: setting SM_CANCEL and the first poll for
    /// its clearing may happen in the same iteration.
    fn step_cancel(&mut self) -> Result<(), DriverError> {
        if self.session.state == SessionState::CancelRequested {
            self.session.state.cancel_signaled();
            log::info!(
                "setting SM_CANCEL at stream offset {}",
                self.session.position
            );
            let mode = self.device.bus_mut().read_sci(SCI_MODE)?;
            self.device.bus_mut().write_sci(SCI_MODE, mode | SM_CANCEL)?;
            self.notify_state();
        }
        if self.session.state == SessionState::CancelSignaled {
            let mode = self.device.bus_mut().read_sci(SCI_MODE)?;
            if mode & SM_CANCEL == 0 {
                log::info!(
                    "SM_CANCEL cleared at stream offset {}",
                    self.session.position
                );
                self.session.state.stop();
                self.notify_state();
            }
        }
        Ok(())
    }

    /// Collect the flush policy and a progress record.
    ///
    /// This is the only place the fill byte is refreshed: it must be
    /// captured while playback is still healthy, because the register can
    /// return garbage once cancellation or a broken stream has the
    /// decoder mid-shutdown.
    fn collect_and_report(&mut self) -> Result<(), DriverError> {
        self.session.next_report += REPORT_INTERVAL;

        self.session.fill_byte = (self.device.read_mem(PAR_END_FILL_BYTE)? & 0xFF) as u8;
        let header_word = self.device.bus_mut().read_sci(SCI_HDAT1)?;
        self.session.format = AudioFormat::sniff(header_word);
        self.session.fill_count = self.session.format.end_fill_len();

        let audata = self.device.bus_mut().read_sci(SCI_AUDATA)?;
        let bitrate_per_100 = self.device.read_mem(PAR_BITRATE_PER_100)?;
        let decode_time_secs = self.device.bus_mut().read_sci(SCI_DECODE_TIME)?;
        let vu = if self.vu_meter {
            Some(VuReading::from_register(self.device.read_mem(PAR_VU_METER)?))
        } else {
            None
        };

        if let Some(observer) = self.observer {
            observer.on_playback_progress(&PlaybackProgress {
                position: self.session.position,
                decode_time_secs,
                bitrate_per_100,
                sample_rate: audata & 0xFFFE,
                stereo: audata & 1 == 1,
                format: self.session.format,
                header_word,
                vu,
            });
        }
        Ok(())
    }

    /// Step 3/4 of the protocol: write the flush bytes, and if the stream
    /// ended naturally, cancel and feed fill-byte pairs until the decoder
    /// has unwound.
    fn flush_and_drain(&mut self) -> Result<u64, DriverError> {
        let fill = [self.session.fill_byte; SDI_MAX_TRANSFER_SIZE];
        log::info!(
            "sending {} fill bytes of {:#04x}",
            self.session.fill_count,
            self.session.fill_byte
        );

        let mut sent = 0u64;
        let mut remaining = self.session.fill_count;
        while remaining > 0 {
            let t = remaining.min(SDI_MAX_TRANSFER_SIZE);
            self.device.bus_mut().write_sdi(&fill[..t])?;
            remaining -= t;
            sent += t as u64;
        }

        if self.session.state.is_active() {
            // The stream ran out on its own. The decoder still needs a
            // cancel plus a trickle of fill bytes before it notices
            // end-of-stream and drains its internal buffering.
            let mode = self.device.bus_mut().read_sci(SCI_MODE)?;
            self.device.bus_mut().write_sci(SCI_MODE, mode | SM_CANCEL)?;
            let pair = [self.session.fill_byte; 2];
            let mut pairs = 0usize;
            while self.device.bus_mut().read_sci(SCI_MODE)? & SM_CANCEL != 0 {
                if pairs >= MAX_CANCEL_DRAIN_PAIRS {
                    return Err(DriverError::CancelTimeout);
                }
                self.device.bus_mut().write_sdi(&pair)?;
                pairs += 1;
                sent += 2;
            }
            self.session.state.stop();
            self.notify_state();
        }
        Ok(sent)
    }

    fn dispatch_command(&mut self) -> Result<(), DriverError> {
        let Some(command) = self.commands.poll() else {
            return Ok(());
        };
        match command {
            Command::VolumeUp => {
                if self.vol_level > 0 {
                    self.vol_level -= 1;
                    self.write_volume()?;
                }
            }
            Command::VolumeDown => {
                if self.vol_level < 255 {
                    self.vol_level += 1;
                    self.write_volume()?;
                }
            }
            Command::PlaySpeed(speed) => {
                let speed = speed.clamp(1, 4);
                log::info!("play speed {speed}x");
                self.device.write_mem(PAR_PLAY_SPEED, speed as u16)?;
            }
            Command::SpeedShiftUp => {
                self.speed_shift = (self.speed_shift + SPEED_SHIFT_STEP).min(SPEED_SHIFT_MAX);
                self.apply_speed_shift(true)?;
            }
            Command::SpeedShiftDown => {
                self.speed_shift =
                    self.speed_shift.saturating_sub(SPEED_SHIFT_STEP).max(SPEED_SHIFT_MIN);
                self.apply_speed_shift(true)?;
            }
            Command::SpeedShiftOff => {
                self.speed_shift = SPEED_SHIFT_NORMAL;
                self.apply_speed_shift(false)?;
            }
            Command::EarSpeaker => {
                self.ear_speaker = self.ear_speaker.wrapping_add(8192);
                log::info!("earspeaker level {}", self.ear_speaker);
                self.device.write_mem(PAR_EARSPEAKER_LEVEL, self.ear_speaker)?;
            }
            Command::VuMeterToggle => {
                self.vu_meter = !self.vu_meter;
                if self.vu_meter {
                    self.play_mode |= PAR_PLAY_MODE_VU_METER_ENA;
                } else {
                    self.play_mode &= !PAR_PLAY_MODE_VU_METER_ENA;
                }
                self.device.write_mem(PAR_PLAY_MODE, self.play_mode)?;
            }
            Command::PauseToggle => {
                self.play_mode ^= PAR_PLAY_MODE_PAUSE_ENA;
                log::info!(
                    "pause {}",
                    if self.play_mode & PAR_PLAY_MODE_PAUSE_ENA != 0 { "on" } else { "off" }
                );
                self.device.write_mem(PAR_PLAY_MODE, self.play_mode)?;
            }
            Command::MonoToggle => {
                self.play_mode ^= PAR_PLAY_MODE_MONO_OUTPUT_ENA;
                self.device.write_mem(PAR_PLAY_MODE, self.play_mode)?;
            }
            Command::DifferentialToggle => {
                let mode = self.device.bus_mut().read_sci(SCI_MODE)? ^ SM_DIFF;
                self.device.bus_mut().write_sci(SCI_MODE, mode)?;
            }
            Command::RateTuneDown => {
                self.rate_tune = if self.rate_tune >= 0 {
                    self.rate_tune * 95 / 100
                } else {
                    self.rate_tune * 105 / 100
                };
                self.rate_tune = (self.rate_tune - 2).max(-990_000);
                self.write_rate_tune()?;
            }
            Command::RateTuneUp => {
                self.rate_tune = if self.rate_tune <= 0 {
                    self.rate_tune * 95 / 100
                } else {
                    self.rate_tune * 105 / 100
                };
                self.rate_tune = (self.rate_tune + 2).min(990_000);
                self.write_rate_tune()?;
            }
            Command::RateTuneOff => {
                self.rate_tune = 0;
                self.write_rate_tune()?;
            }
            Command::Diagnostics => self.dump_diagnostics()?,
            Command::Quit => {
                if self.session.state.request_cancel() {
                    self.notify_state();
                }
            }
            Command::Abort => {
                log::warn!("forced abort, bypassing flush");
                std::process::exit(1);
            }
            Command::Unrecognized(c) => {
                log::debug!("ignoring unrecognized command {c:?}");
            }
        }
        Ok(())
    }

    fn write_volume(&mut self) -> Result<(), DriverError> {
        self.device
            .bus_mut()
            .write_sci(SCI_VOL, self.vol_level as u16 * 0x0101)
    }

    fn apply_speed_shift(&mut self, enable: bool) -> Result<(), DriverError> {
        log::info!(
            "speed shift {} ({:.3})",
            self.speed_shift,
            self.speed_shift as f32 / SPEED_SHIFT_NORMAL as f32
        );
        if enable {
            self.device.write_mem(PAR_SPEED_SHIFTER, self.speed_shift)?;
            self.play_mode |= PAR_PLAY_MODE_SPEED_SHIFTER_ENA;
        } else {
            self.play_mode &= !PAR_PLAY_MODE_SPEED_SHIFTER_ENA;
        }
        self.device.write_mem(PAR_PLAY_MODE, self.play_mode)
    }

    fn write_rate_tune(&mut self) -> Result<(), DriverError> {
        log::info!("rate tune {} ppm", self.rate_tune);
        self.device.write_mem32(PAR_RATE_TUNE, self.rate_tune as u32)
    }

    fn dump_diagnostics(&mut self) -> Result<(), DriverError> {
        let mode = self.device.bus_mut().read_sci(SCI_MODE)?;
        let status = self.device.bus_mut().read_sci(SCI_STATUS)?;
        let hdat1 = self.device.bus_mut().read_sci(SCI_HDAT1)?;
        let hdat0 = self.device.bus_mut().read_sci(SCI_HDAT0)?;
        log::info!(
            "vol -{:.1} dB, MODE {mode:#06x}, STATUS {status:#06x}, HDAT1 {hdat1:#06x}, HDAT0 {hdat0:#06x}",
            self.vol_level as f32 * 0.5
        );
        let samples = self.device.read_mem32_counter(PAR_SAMPLE_COUNTER)?;
        let sdi_free = self.device.read_mem(PAR_SDI_FREE)?;
        let audio_fill = self.device.read_mem(PAR_AUDIO_FILL)?;
        let position = self.device.read_mem32_counter(PAR_POSITION_MSEC)?;
        let config1 = self.device.read_mem(PAR_CONFIG1)?;
        log::info!(
            "samples {samples}, sdi free {sdi_free}, audio fill {audio_fill}, position {position} ms, config1 {config1:#06x}"
        );
        Ok(())
    }

    fn notify_state(&self) {
        if let Some(observer) = self.observer {
            observer.on_state_changed(self.session.state);
        }
    }
}
