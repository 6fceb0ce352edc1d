use super::format::AudioFormat;

/// VU-meter reading, one byte per channel, roughly dB below full scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VuReading {
    pub left: u8,
    pub right: u8,
}

impl VuReading {
    pub(crate) fn from_register(value: u16) -> Self {
        Self {
            left: (value >> 8) as u8,
            right: value as u8,
        }
    }
}

/// One playback reporting-interval observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackProgress {
    /// Bytes streamed to the device so far.
    pub position: u64,
    /// Decoded seconds per SCI_DECODE_TIME.
    pub decode_time_secs: u16,
    /// Stream bitrate in units of 100 bit/s.
    pub bitrate_per_100: u16,
    /// Current sample rate in Hz (even; the low bit carries channel mode).
    pub sample_rate: u16,
    pub stereo: bool,
    pub format: AudioFormat,
    /// The raw header word the format was sniffed from.
    pub header_word: u16,
    /// Present only while the VU meter is enabled.
    pub vu: Option<VuReading>,
}

impl PlaybackProgress {
    pub fn bitrate_kbps(&self) -> f32 {
        self.bitrate_per_100 as f32 / 10.0
    }
}

/// One recording reporting-interval observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordProgress {
    pub bytes_written: u64,
    /// Estimate from the device's sample counter divided by sample rate.
    pub elapsed_secs: u32,
    pub sample_rate: u16,
    pub stereo: bool,
    pub format: AudioFormat,
}
