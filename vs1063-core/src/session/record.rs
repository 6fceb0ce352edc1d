//! Capture: encoder words → sink, with eager cancellation, the
//! double-checked stop condition, odd-length handling, RIFF length
//! backpatching, and the post-session re-initialization that recording
//! requires.

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use crate::device::registers::*;
use crate::device::Vs1063;
use crate::models::config::{AdcMode, RecordCodec, RecordConfig, RecordQuality};
use crate::models::error::DriverError;
use crate::models::progress::RecordProgress;
use crate::models::recording_result::{RecordingMetadata, RecordingResult, RecordingSummary};
use crate::models::session::StreamSession;
use crate::models::state::SessionState;
use crate::storage::{metadata, riff};
use crate::traits::command_source::{Command, CommandSource};
use crate::traits::progress_observer::ProgressObserver;
use crate::traits::sci_bus::SciBus;

use super::{MAX_CANCEL_IDLE_POLLS, REC_BUFFER_WORDS, REPORT_INTERVAL};

/// One recording pass into a byte sink.
///
/// The sink must be seekable: RIFF-family captures get their header
/// lengths rewritten after the fact, and only the caller knows up front
/// which codec it asked for.
pub struct RecordSession<'a, B: SciBus, C: CommandSource> {
    device: &'a mut Vs1063<B>,
    commands: C,
    observer: Option<&'a dyn ProgressObserver>,
    config: RecordConfig,
    session: StreamSession,
    vol_level: u8,
    last_elapsed_secs: u32,
}

impl<'a, B: SciBus, C: CommandSource> RecordSession<'a, B, C> {
    pub fn new(device: &'a mut Vs1063<B>, commands: C, config: RecordConfig) -> Self {
        let session = StreamSession::record(config.container());
        Self {
            device,
            commands,
            observer: None,
            config,
            session,
            vol_level: 0,
            last_elapsed_secs: 0,
        }
    }

    pub fn observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Record until a graceful quit has drained the encoder.
    ///
    /// On return the device has been re-initialized: unlike playback, the
    /// encoder leaves state behind that only a reset clears, so a fresh
    /// bring-up is part of finishing the session.
    pub fn run<W: Write + Seek>(mut self, sink: &mut W) -> Result<RecordingSummary, DriverError> {
        self.config.validate().map_err(DriverError::Config)?;
        self.configure_encoder()?;
        self.vol_level = (self.device.bus_mut().read_sci(SCI_VOL)? & 0xFF) as u8;
        self.notify_state();

        let mut capture = Vec::with_capacity(REC_BUFFER_WORDS * 2);
        let mut idle_polls = 0usize;

        while !self.session.state.is_stopped() {
            self.dispatch_command()?;

            let available = self.device.bus_mut().read_sci(SCI_RECWORDS)? as usize;
            if available > 0 {
                idle_polls = 0;
                let n = available.min(REC_BUFFER_WORDS);
                capture.clear();
                for _ in 0..n {
                    let word = self.device.bus_mut().read_sci(SCI_RECDATA)?;
                    capture.push((word >> 8) as u8);
                    capture.push(word as u8);
                }
                sink.write_all(&capture)
                    .map_err(|e| DriverError::Storage(e.to_string()))?;
                self.session.position += capture.len() as u64;
            } else if self.session.state == SessionState::CancelSignaled {
                if self.device.bus_mut().read_sci(SCI_MODE)? & SM_CANCEL == 0 {
                    // SCI_RECWORDS must be re-read after SM_CANCEL is seen
                    // cleared: a final partial word can surface in exactly
                    // that window, and checking once is unsafe.
                    if self.device.bus_mut().read_sci(SCI_RECWORDS)? == 0 {
                        self.session.state.stop();
                        self.notify_state();
                    }
                } else {
                    idle_polls += 1;
                    if idle_polls > MAX_CANCEL_IDLE_POLLS {
                        return Err(DriverError::CancelTimeout);
                    }
                }
            }

            if self.session.position - self.session.next_report >= REPORT_INTERVAL {
                self.collect_and_report()?;
            }
        }

        // The codec packs output in 16-bit words; a capture with an odd
        // byte count reports the dangling final byte out-of-band in the
        // low byte of PAR_END_FILL_BYTE.
        let last = self.device.read_mem(PAR_END_FILL_BYTE)?;
        let odd_length = last & 0x8000 != 0;
        if odd_length {
            sink.write_all(&[last as u8])
                .map_err(|e| DriverError::Storage(e.to_string()))?;
            self.session.position += 1;
            log::info!("odd length recording");
        } else {
            log::info!("even length recording");
        }

        if self.session.format.is_riff() {
            log::info!("correcting RIFF length headers");
            riff::patch_riff_lengths(sink, self.session.position)?;
        }

        self.device.init()?;

        Ok(RecordingSummary {
            bytes_written: self.session.position,
            odd_length,
            format: self.session.format,
            sample_rate: self.config.sample_rate,
            duration_secs: self.last_elapsed_secs as f64,
        })
    }

    fn configure_encoder(&mut self) -> Result<(), DriverError> {
        // This clock is high enough for both Ogg and MP3 encoding.
        self.device
            .bus_mut()
            .write_sci(SCI_CLOCKF, sc_freq_hz(CLOCK_HZ) | SC_MULT_53_50X | SC_ADD_53_00X)?;

        // Only the Ogg encoder reads the serial number, and only when told
        // to; a fresh random one per session keeps stream serials distinct.
        let serial = self
            .config
            .serial_number
            .unwrap_or_else(|| uuid::Uuid::new_v4().as_u128() as u32);
        self.device.write_mem32(PAR_ENC_SERIAL_NUMBER, serial)?;

        self.device
            .bus_mut()
            .write_sci(SCI_RECRATE, self.config.sample_rate)?;
        match self.config.gain {
            Some(gain) => self.device.bus_mut().write_sci(SCI_RECGAIN, gain)?,
            None => {
                self.device.bus_mut().write_sci(SCI_RECGAIN, 0)?;
                self.device
                    .bus_mut()
                    .write_sci(SCI_RECMAXAUTO, self.config.max_auto_gain)?;
            }
        }
        let recmode = self.recmode_value();
        self.device.bus_mut().write_sci(SCI_RECMODE, recmode)?;
        let recquality = self.recquality_value();
        self.device
            .bus_mut()
            .write_sci(SCI_RECQUALITY, recquality)?;

        let mode = self.device.bus_mut().read_sci(SCI_MODE)?;
        self.device
            .bus_mut()
            .write_sci(SCI_MODE, mode | SM_LINE1 | SM_ENCODE)?;
        self.device
            .bus_mut()
            .write_sci(SCI_AIADDR, ENCODER_START_ADDR)?;
        Ok(())
    }

    fn recmode_value(&self) -> u16 {
        let format = match self.config.codec {
            RecordCodec::OggVorbis => RM_63_FORMAT_OGG_VORBIS,
            RecordCodec::Mp3 => RM_63_FORMAT_MP3,
            RecordCodec::Pcm => RM_63_FORMAT_PCM,
            RecordCodec::ImaAdpcm => RM_63_FORMAT_IMA_ADPCM,
        };
        let adc = match self.config.adc_mode {
            AdcMode::JointAgcStereo => RM_63_ADC_MODE_JOINT_AGC_STEREO,
            AdcMode::DualAgcStereo => RM_63_ADC_MODE_DUAL_AGC_STEREO,
            AdcMode::Left => RM_63_ADC_MODE_LEFT,
            AdcMode::Right => RM_63_ADC_MODE_RIGHT,
        };
        format | adc
    }

    fn recquality_value(&self) -> u16 {
        let serial_bit = if self.config.codec == RecordCodec::OggVorbis {
            RQ_OGG_PAR_SERIAL_NUMBER
        } else {
            0
        };
        match self.config.quality {
            RecordQuality::Quality(level) => RQ_MODE_QUALITY | serial_bit | level.min(10) as u16,
            RecordQuality::Vbr(kbps) => RQ_MODE_VBR | RQ_MULT_1000 | serial_bit | kbps,
            RecordQuality::Cbr(kbps) => RQ_MODE_CBR | RQ_MULT_1000 | serial_bit | kbps,
        }
    }

    fn dispatch_command(&mut self) -> Result<(), DriverError> {
        let Some(command) = self.commands.poll() else {
            return Ok(());
        };
        match command {
            Command::Quit => {
                // Recording signals cancellation eagerly: the cancel bit
                // goes out in the same dispatch as the state change.
                if self.session.state.request_cancel() {
                    self.notify_state();
                    log::info!("switching encoder off at {} bytes", self.session.position);
                    let mode = self.device.bus_mut().read_sci(SCI_MODE)?;
                    self.device.bus_mut().write_sci(SCI_MODE, mode | SM_CANCEL)?;
                    self.session.state.cancel_signaled();
                    self.notify_state();
                }
            }
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
            Command::PauseToggle => {
                let recmode = self.device.bus_mut().read_sci(SCI_RECMODE)? ^ RM_63_PAUSE;
                log::info!(
                    "pause {}",
                    if recmode & RM_63_PAUSE != 0 { "on" } else { "off" }
                );
                self.device.bus_mut().write_sci(SCI_RECMODE, recmode)?;
            }
            Command::Diagnostics => {
                log::info!("vol -{:.1} dB", self.vol_level as f32 * 0.5);
            }
            Command::Abort => {
                log::warn!("forced abort, bypassing encoder shutdown");
                std::process::exit(1);
            }
            Command::Unrecognized(c) => {
                log::debug!("ignoring unrecognized command {c:?}");
            }
            other => {
                log::debug!("command {other:?} not available while recording");
            }
        }
        Ok(())
    }

    fn collect_and_report(&mut self) -> Result<(), DriverError> {
        self.session.next_report += REPORT_INTERVAL;
        let audata = self.device.bus_mut().read_sci(SCI_AUDATA)?;
        let sample_rate = audata & 0xFFFE;
        let samples = self.device.read_mem32_counter(PAR_SAMPLE_COUNTER)?;
        let elapsed_secs = if sample_rate == 0 {
            0
        } else {
            samples / sample_rate as u32
        };
        self.last_elapsed_secs = elapsed_secs;

        if let Some(observer) = self.observer {
            observer.on_record_progress(&RecordProgress {
                bytes_written: self.session.position,
                elapsed_secs,
                sample_rate,
                stereo: audata & 1 == 1,
                format: self.session.format,
            });
        }
        Ok(())
    }

    fn write_volume(&mut self) -> Result<(), DriverError> {
        self.device
            .bus_mut()
            .write_sci(SCI_VOL, self.vol_level as u16 * 0x0101)
    }

    fn notify_state(&self) {
        if let Some(observer) = self.observer {
            observer.on_state_changed(self.session.state);
        }
    }
}

/// Record straight into a file, then checksum it and drop a JSON metadata
/// sidecar next to it.
pub fn record_to_path<B: SciBus, C: CommandSource>(
    device: &mut Vs1063<B>,
    commands: C,
    config: RecordConfig,
    path: &Path,
    observer: Option<&dyn ProgressObserver>,
) -> Result<RecordingResult, DriverError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| DriverError::Storage(format!("failed to create directory: {}", e)))?;
        }
    }
    let mut file = fs::File::create(path).map_err(|e| {
        DriverError::Storage(format!("failed opening {} for writing: {}", path.display(), e))
    })?;
    log::info!("record file {}", path.display());

    let mut session = RecordSession::new(device, commands, config.clone());
    if let Some(observer) = observer {
        session = session.observer(observer);
    }
    let summary = session.run(&mut file)?;
    drop(file);

    let checksum = metadata::sha256_file(path)?;
    let meta = RecordingMetadata::new(&summary, &config, path, &checksum);
    metadata::write_metadata(&meta, path)?;

    Ok(RecordingResult {
        file_path: path.to_path_buf(),
        summary,
        metadata: meta,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format::AudioFormat;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::io::Cursor;

    /// Encoder mock: a scripted word queue, MODE-read cancel clearing once
    /// the queue drains, and optionally one final word surfacing exactly
    /// when the cancel bit is observed cleared.
    struct RecMockBus {
        regs: [u16; 16],
        wram: HashMap<u16, u16>,
        wram_addr: u16,
        queue: VecDeque<u16>,
        late_word: Option<u16>,
        cancel_pending: bool,
        resets: usize,
    }

    impl RecMockBus {
        fn with_words(words: &[u16]) -> Self {
            let mut regs = [0u16; 16];
            regs[SCI_STATUS as usize] = 6 << SS_VER_SHIFT; // VS1063
            Self {
                regs,
                wram: HashMap::new(),
                wram_addr: 0,
                queue: words.iter().copied().collect(),
                late_word: None,
                cancel_pending: false,
                resets: 0,
            }
        }
    }

    impl SciBus for RecMockBus {
        fn read_sci(&mut self, reg: u8) -> Result<u16, DriverError> {
            match reg {
                SCI_RECWORDS => Ok(self.queue.len() as u16),
                SCI_RECDATA => Ok(self.queue.pop_front().unwrap_or(0)),
                SCI_MODE => {
                    if self.cancel_pending && self.queue.is_empty() {
                        self.cancel_pending = false;
                        self.regs[SCI_MODE as usize] &= !SM_CANCEL;
                        if let Some(word) = self.late_word.take() {
                            self.queue.push_back(word);
                        }
                    }
                    Ok(self.regs[SCI_MODE as usize])
                }
                SCI_WRAM => {
                    let v = self.wram.get(&self.wram_addr).copied().unwrap_or(0);
                    self.wram_addr = self.wram_addr.wrapping_add(1);
                    Ok(v)
                }
                _ => Ok(self.regs[reg as usize]),
            }
        }

        fn write_sci(&mut self, reg: u8, value: u16) -> Result<(), DriverError> {
            match reg {
                // Also SCI_RECQUALITY; the alias is harmless here.
                SCI_WRAMADDR => self.wram_addr = value,
                SCI_WRAM => {
                    self.wram.insert(self.wram_addr, value);
                    self.wram_addr = self.wram_addr.wrapping_add(1);
                }
                SCI_MODE => {
                    if value & SM_RESET != 0 {
                        self.resets += 1;
                    }
                    if value & SM_CANCEL != 0 {
                        self.cancel_pending = true;
                    }
                    self.regs[SCI_MODE as usize] = value & !SM_RESET;
                }
                _ => self.regs[reg as usize] = value,
            }
            Ok(())
        }

        fn write_sdi(&mut self, _data: &[u8]) -> Result<(), DriverError> {
            Ok(())
        }
    }

    struct Script(RefCell<VecDeque<Option<Command>>>);

    impl Script {
        fn new(commands: impl IntoIterator<Item = Option<Command>>) -> Self {
            Self(RefCell::new(commands.into_iter().collect()))
        }
    }

    impl CommandSource for &Script {
        fn poll(&mut self) -> Option<Command> {
            self.0.borrow_mut().pop_front().flatten()
        }
    }

    fn ogg_config() -> RecordConfig {
        RecordConfig {
            serial_number: Some(0x8765_4321),
            ..Default::default()
        }
    }

    fn pcm_config() -> RecordConfig {
        RecordConfig {
            codec: RecordCodec::Pcm,
            quality: RecordQuality::Quality(0),
            ..Default::default()
        }
    }

    #[test]
    fn drains_words_high_byte_first() {
        let mut dev = Vs1063::new(RecMockBus::with_words(&[0x0102, 0x0304, 0x0506]));
        let script = Script::new([Some(Command::Quit)]);
        let mut sink = Cursor::new(Vec::new());
        let summary = RecordSession::new(&mut dev, &script, ogg_config())
            .run(&mut sink)
            .unwrap();

        assert_eq!(summary.bytes_written, 6);
        assert!(!summary.odd_length);
        assert_eq!(summary.format, AudioFormat::OggVorbis);
        assert_eq!(sink.into_inner(), vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn odd_capture_appends_dangling_byte() {
        let mut bus = RecMockBus::with_words(&[0x0102, 0x0304]);
        bus.wram.insert(PAR_END_FILL_BYTE, 0x80AB);
        let mut dev = Vs1063::new(bus);
        let script = Script::new([Some(Command::Quit)]);
        let mut sink = Cursor::new(Vec::new());
        let summary = RecordSession::new(&mut dev, &script, ogg_config())
            .run(&mut sink)
            .unwrap();

        assert!(summary.odd_length);
        assert_eq!(summary.bytes_written, 5);
        assert_eq!(sink.into_inner(), vec![0x01, 0x02, 0x03, 0x04, 0xAB]);
    }

    #[test]
    fn riff_capture_gets_length_patch() {
        let words: Vec<u16> = (0..30).map(|i| 0x1100 + i).collect();
        let mut dev = Vs1063::new(RecMockBus::with_words(&words));
        let script = Script::new([Some(Command::Quit)]);
        let mut sink = Cursor::new(Vec::new());
        let summary = RecordSession::new(&mut dev, &script, pcm_config())
            .run(&mut sink)
            .unwrap();

        assert_eq!(summary.format, AudioFormat::Riff);
        assert_eq!(summary.bytes_written, 60);
        let data = sink.into_inner();
        assert_eq!(
            u32::from_le_bytes(data[4..8].try_into().unwrap()),
            60 - 8
        );
        assert_eq!(
            u32::from_le_bytes(data[44..48].try_into().unwrap()),
            60 - 48
        );
    }

    #[test]
    fn final_word_after_cancel_clear_is_captured() {
        let mut bus = RecMockBus::with_words(&[0x0102]);
        bus.late_word = Some(0x0908);
        let mut dev = Vs1063::new(bus);
        let script = Script::new([Some(Command::Quit)]);
        let mut sink = Cursor::new(Vec::new());
        let summary = RecordSession::new(&mut dev, &script, ogg_config())
            .run(&mut sink)
            .unwrap();

        // The double-check caught the word that surfaced as SM_CANCEL
        // cleared.
        assert_eq!(summary.bytes_written, 4);
        assert_eq!(sink.into_inner(), vec![0x01, 0x02, 0x09, 0x08]);
    }

    #[test]
    fn device_is_reinitialized_after_capture() {
        let mut dev = Vs1063::new(RecMockBus::with_words(&[0x0102]));
        let script = Script::new([Some(Command::Quit)]);
        let mut sink = Cursor::new(Vec::new());
        RecordSession::new(&mut dev, &script, ogg_config())
            .run(&mut sink)
            .unwrap();
        assert_eq!(dev.into_bus().resets, 1);
    }

    #[test]
    fn encoder_configuration_lands_in_registers() {
        let mut dev = Vs1063::new(RecMockBus::with_words(&[0x0102]));
        let script = Script::new([Some(Command::Quit)]);
        let config = RecordConfig {
            sample_rate: 44_100,
            gain: Some(512),
            quality: RecordQuality::Vbr(160),
            codec: RecordCodec::Mp3,
            serial_number: Some(7),
            ..Default::default()
        };
        RecordSession::new(&mut dev, &script, config)
            .run(&mut Cursor::new(Vec::new()))
            .unwrap();

        let bus = dev.into_bus();
        // The post-capture bring-up scribbles over AICTRL1/2 (the scratch
        // sanity check), but RECRATE, RECMODE, and AIADDR survive it.
        assert_eq!(bus.regs[SCI_RECRATE as usize], 44_100);
        assert_eq!(
            bus.regs[SCI_RECMODE as usize],
            RM_63_FORMAT_MP3 | RM_63_ADC_MODE_JOINT_AGC_STEREO
        );
        assert_eq!(bus.regs[SCI_AIADDR as usize], ENCODER_START_ADDR);
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_the_device() {
        let mut dev = Vs1063::new(RecMockBus::with_words(&[]));
        let config = RecordConfig {
            sample_rate: 96_000,
            ..Default::default()
        };
        let result =
            RecordSession::new(&mut dev, (), config).run(&mut Cursor::new(Vec::new()));
        assert!(matches!(result, Err(DriverError::Config(_))));
    }

    #[test]
    fn record_to_path_writes_file_checksum_and_sidecar() {
        let dir = std::env::temp_dir().join("vs1063_record_to_path_test");
        let path = dir.join("take1.ogg");
        let mut dev = Vs1063::new(RecMockBus::with_words(&[0x4F67, 0x6753]));
        let script = Script::new([Some(Command::Quit)]);

        let result =
            record_to_path(&mut dev, &script, ogg_config(), &path, None).unwrap();

        assert_eq!(result.summary.bytes_written, 4);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x4F, 0x67, 0x67, 0x53]);
        assert_eq!(result.checksum, metadata::sha256_file(&path).unwrap());

        let sidecar = metadata::read_metadata(&path).unwrap();
        assert_eq!(sidecar, result.metadata);
        assert_eq!(sidecar.format, "Ogg");
        assert_eq!(sidecar.file_size, 4);
        assert_eq!(sidecar.channels, "stereo");

        std::fs::remove_dir_all(&dir).ok();
    }
}
