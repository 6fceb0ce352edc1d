use super::format::AudioFormat;

/// Codec the encoder should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCodec {
    /// Ogg Vorbis. Best quality-per-bit; use the quality mode.
    OggVorbis,
    /// MP3. Prefer VBR; if CBR is required, stay at or above 160 kbit/s.
    Mp3,
    /// Linear 16-bit PCM in a RIFF WAV container. Very high bitrate.
    Pcm,
    /// IMA ADPCM in a RIFF WAV container. Voice quality.
    ImaAdpcm,
}

/// ADC channel routing and gain-control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcMode {
    /// Stereo with a common automatic gain control.
    JointAgcStereo,
    /// Stereo with independent per-channel AGC.
    DualAgcStereo,
    /// Left channel only.
    Left,
    /// Right channel only.
    Right,
}

impl AdcMode {
    pub fn is_stereo(self) -> bool {
        matches!(self, Self::JointAgcStereo | Self::DualAgcStereo)
    }
}

/// Bitrate/quality selection for the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordQuality {
    /// Quality-mode level 0–10. Generally the best choice for Ogg.
    Quality(u8),
    /// Variable bitrate targeting the given kbit/s.
    Vbr(u16),
    /// Constant bitrate at the given kbit/s.
    Cbr(u16),
}

/// Capture parameters applied to the device before a recording session.
///
/// Supplied by the caller; the recording engine writes these to the
/// encoder registers verbatim and never second-guesses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordConfig {
    /// Sample rate in Hz, 8000–48000. Record at 48 kHz for best quality.
    pub sample_rate: u16,

    /// Fixed input gain, 1024 = 1.0×. `None` enables automatic gain.
    pub gain: Option<u16>,

    /// Ceiling for automatic gain when `gain` is `None` (1024 = 1.0×).
    pub max_auto_gain: u16,

    pub codec: RecordCodec,

    pub adc_mode: AdcMode,

    pub quality: RecordQuality,

    /// Ogg stream serial number. `None` draws a random one per session,
    /// which is what you want for distinct files.
    pub serial_number: Option<u32>,
}

impl RecordConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(8_000..=48_000).contains(&self.sample_rate) {
            return Err(format!("unsupported sample rate: {}", self.sample_rate));
        }
        match self.quality {
            RecordQuality::Quality(level) if level > 10 => {
                return Err(format!("quality level out of range: {level}"));
            }
            RecordQuality::Vbr(kbps) | RecordQuality::Cbr(kbps)
                if !(32..=320).contains(&kbps) =>
            {
                return Err(format!("bitrate out of range: {kbps} kbit/s"));
            }
            _ => {}
        }
        Ok(())
    }

    /// Container format the encoder will emit for this codec selection.
    pub fn container(&self) -> AudioFormat {
        match self.codec {
            RecordCodec::OggVorbis => AudioFormat::OggVorbis,
            RecordCodec::Mp3 => AudioFormat::Mp3,
            RecordCodec::Pcm | RecordCodec::ImaAdpcm => AudioFormat::Riff,
        }
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            gain: Some(1024),
            max_auto_gain: 4096,
            codec: RecordCodec::OggVorbis,
            adc_mode: AdcMode::JointAgcStereo,
            quality: RecordQuality::Quality(5),
            serial_number: None,
        }
    }
}
