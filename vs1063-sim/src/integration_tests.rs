//! End-to-end scenarios: real engines from `vs1063-core` driving the
//! simulated chip.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;

use vs1063_core::device::registers::*;
use vs1063_core::models::format::END_FILL_SHORT;
use vs1063_core::{
    Command, CommandSource, DriverError, PlaybackProgress, PlaybackSession, ProgressObserver,
    RecordCodec, RecordConfig, RecordProgress, RecordQuality, RecordSession, SessionState,
    Vs1063,
};

use crate::SimDevice;

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

#[derive(Default)]
struct Recorder {
    states: RefCell<Vec<SessionState>>,
    playback_reports: RefCell<Vec<PlaybackProgress>>,
    record_reports: RefCell<Vec<RecordProgress>>,
}

impl ProgressObserver for Recorder {
    fn on_state_changed(&self, state: SessionState) {
        self.states.borrow_mut().push(state);
    }
    fn on_playback_progress(&self, progress: &PlaybackProgress) {
        self.playback_reports.borrow_mut().push(*progress);
    }
    fn on_record_progress(&self, progress: &RecordProgress) {
        self.record_reports.borrow_mut().push(*progress);
    }
}

#[test]
fn riff_playback_runs_to_natural_exhaustion() {
    let sim = SimDevice::new();
    sim.set_header_word(0x7665); // RIFF
    sim.set_parametric(PAR_END_FILL_BYTE, 0x0055);
    sim.set_parametric(PAR_BITRATE_PER_100, 14);

    let mut device = Vs1063::new(sim.clone());
    device.init().unwrap();

    let source: Vec<u8> = (0..10_000).map(|i| (i % 241) as u8).collect();
    let recorder = Recorder::default();
    let summary = PlaybackSession::new(&mut device, ())
        .observer(&recorder)
        .run(&mut Cursor::new(source.clone()))
        .unwrap();

    // Natural exhaustion: Active straight to Stopped, nothing in between.
    assert_eq!(summary.final_state, SessionState::Stopped);
    assert_eq!(
        recorder.states.into_inner(),
        vec![SessionState::Active, SessionState::Stopped]
    );

    // RIFF takes the short flush; the sim cleared SM_CANCEL on the first
    // poll, so not a single extra drain pair went out.
    assert_eq!(summary.bytes_streamed, 10_000);
    assert_eq!(summary.fill_bytes_sent, END_FILL_SHORT as u64);
    assert_eq!(sim.sdi_len(), 10_000 + END_FILL_SHORT);

    let sdi = sim.sdi_bytes();
    assert_eq!(&sdi[..10_000], source.as_slice());
    assert!(sdi[10_000..].iter().all(|&b| b == 0x55));

    // Reports fired roughly every 4 KiB and sniffed the right format.
    let reports = recorder.playback_reports.into_inner();
    assert!(reports.len() >= 3);
    assert!(reports
        .iter()
        .all(|r| r.format == vs1063_core::AudioFormat::Riff));
    assert_eq!(reports.last().unwrap().sample_rate, 48_000);
}

#[test]
fn quit_mid_playback_stops_early() {
    let sim = SimDevice::new();
    sim.set_header_word(0x4F67); // Ogg
    sim.set_cancel_drain_bytes(8);

    let mut device = Vs1063::new(sim.clone());
    device.init().unwrap();

    // A long stream, a quit shortly into it.
    let script = Script::new((0..40).map(|_| None).chain([Some(Command::Quit)]));
    let recorder = Recorder::default();
    let summary = PlaybackSession::new(&mut device, &script)
        .observer(&recorder)
        .run(&mut Cursor::new(vec![0u8; 100_000]))
        .unwrap();

    assert_eq!(summary.final_state, SessionState::Stopped);
    assert!(summary.bytes_streamed < 100_000);
    assert_eq!(
        recorder.states.into_inner(),
        vec![
            SessionState::Active,
            SessionState::CancelRequested,
            SessionState::CancelSignaled,
            SessionState::Stopped,
        ]
    );
}

#[test]
fn pcm_record_produces_patched_riff_and_reinitializes() {
    let sim = SimDevice::new();
    let words: Vec<u16> = (0..40u16).map(|i| 0x4100 + i).collect();
    sim.queue_encoder_words(&words);

    let mut device = Vs1063::new(sim.clone());
    device.init().unwrap();
    assert_eq!(sim.reset_count(), 1);

    let config = RecordConfig {
        codec: RecordCodec::Pcm,
        quality: RecordQuality::Quality(0),
        serial_number: Some(1),
        ..Default::default()
    };
    let script = Script::new([Some(Command::Quit)]);
    let mut sink = Cursor::new(Vec::new());
    let summary = RecordSession::new(&mut device, &script, config)
        .run(&mut sink)
        .unwrap();

    assert_eq!(summary.bytes_written, 80);
    assert!(!summary.odd_length);

    let data = sink.into_inner();
    assert_eq!(data.len(), 80);
    // Every word landed high byte first...
    assert_eq!(&data[..2], &[0x41, 0x00]);
    assert_eq!(&data[78..], &[0x41, 0x27]);
    // ...and both RIFF length fields were backpatched.
    assert_eq!(u32::from_le_bytes(data[4..8].try_into().unwrap()), 72);
    assert_eq!(u32::from_le_bytes(data[44..48].try_into().unwrap()), 32);

    // Recording leaves the chip in a state only a reset clears; the
    // session brought it back up on completion.
    assert_eq!(sim.reset_count(), 2);
}

#[test]
fn odd_length_ogg_record_appends_dangling_byte() {
    let sim = SimDevice::new();
    sim.queue_encoder_words(&[0x4F67, 0x6753]);
    sim.set_parametric(PAR_END_FILL_BYTE, 0x80C3);

    let mut device = Vs1063::new(sim.clone());
    device.init().unwrap();

    let script = Script::new([Some(Command::Quit)]);
    let mut sink = Cursor::new(Vec::new());
    let summary = RecordSession::new(
        &mut device,
        &script,
        RecordConfig {
            serial_number: Some(2),
            ..Default::default()
        },
    )
    .run(&mut sink)
    .unwrap();

    assert!(summary.odd_length);
    assert_eq!(summary.bytes_written, 5);
    assert_eq!(sink.into_inner(), vec![0x4F, 0x67, 0x67, 0x53, 0xC3]);
}

#[test]
fn init_rejects_the_wrong_chip() {
    let sim = SimDevice::new();
    sim.poke_sci(SCI_STATUS, 4 << SS_VER_SHIFT); // a VS1053
    let mut device = Vs1063::new(sim);
    assert_eq!(device.init(), Err(DriverError::WrongChip(1053)));
}
