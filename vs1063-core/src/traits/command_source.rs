/// A discrete control command fed to a running session.
///
/// Commands mutate device registers directly and are idempotent to
/// re-issue. Unknown input maps to `Unrecognized` and is handled
/// uniformly (logged and dropped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Louder by one 0.5 dB step.
    VolumeUp,
    /// Quieter by one 0.5 dB step.
    VolumeDown,
    /// Fast-forward multiplier, 1–4×.
    PlaySpeed(u8),
    SpeedShiftUp,
    SpeedShiftDown,
    SpeedShiftOff,
    /// Step the EarSpeaker spatial processing level.
    EarSpeaker,
    VuMeterToggle,
    PauseToggle,
    MonoToggle,
    /// Toggle differential (inverted left channel) output.
    DifferentialToggle,
    /// Samplerate finetuning down, ppm scale.
    RateTuneDown,
    RateTuneUp,
    RateTuneOff,
    /// Dump interesting registers through the log.
    Diagnostics,
    /// Ask the session nicely to stop; runs the full cancel-and-flush
    /// protocol.
    Quit,
    /// Terminate the whole process immediately, bypassing the flush.
    /// Interactive escape hatch only.
    Abort,
    Unrecognized(char),
}

impl Command {
    /// Map a single keystroke to a command, using the conventional
    /// interactive-player key bindings.
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Self::VolumeUp,
            '-' => Self::VolumeDown,
            '1'..='4' => Self::PlaySpeed(c as u8 - b'0'),
            ':' => Self::SpeedShiftUp,
            ';' => Self::SpeedShiftDown,
            '*' => Self::SpeedShiftOff,
            'e' => Self::EarSpeaker,
            'u' => Self::VuMeterToggle,
            'p' => Self::PauseToggle,
            'm' => Self::MonoToggle,
            'd' => Self::DifferentialToggle,
            'r' => Self::RateTuneDown,
            'R' => Self::RateTuneUp,
            '/' => Self::RateTuneOff,
            '_' => Self::Diagnostics,
            'q' => Self::Quit,
            'Q' => Self::Abort,
            other => Self::Unrecognized(other),
        }
    }
}

/// Supplies commands to a running session, one per poll.
///
/// Must never block the engine beyond a single poll; return `None` when
/// nothing is pending.
pub trait CommandSource {
    fn poll(&mut self) -> Option<Command>;
}

/// A session with no external control: `poll` always returns `None`.
impl CommandSource for () {
    fn poll(&mut self) -> Option<Command> {
        None
    }
}
