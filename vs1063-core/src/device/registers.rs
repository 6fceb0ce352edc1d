//! VS1063 register map: SCI registers, mode bits, and the parametric
//! structure in WRAM.

// ── SCI registers ──────────────────────────────────────────────────────────

pub const SCI_MODE: u8 = 0x00;
pub const SCI_STATUS: u8 = 0x01;
pub const SCI_BASS: u8 = 0x02;
pub const SCI_CLOCKF: u8 = 0x03;
pub const SCI_DECODE_TIME: u8 = 0x04;
pub const SCI_AUDATA: u8 = 0x05;
pub const SCI_WRAM: u8 = 0x06;
pub const SCI_WRAMADDR: u8 = 0x07;
pub const SCI_HDAT0: u8 = 0x08;
pub const SCI_HDAT1: u8 = 0x09;
pub const SCI_AIADDR: u8 = 0x0A;
pub const SCI_VOL: u8 = 0x0B;
pub const SCI_AICTRL0: u8 = 0x0C;
pub const SCI_AICTRL1: u8 = 0x0D;
pub const SCI_AICTRL2: u8 = 0x0E;
pub const SCI_AICTRL3: u8 = 0x0F;

// Encoding-mode aliases. While SM_ENCODE is active the same addresses
// carry the encoder interface.
pub const SCI_RECQUALITY: u8 = SCI_WRAMADDR;
pub const SCI_RECDATA: u8 = SCI_HDAT0;
pub const SCI_RECWORDS: u8 = SCI_HDAT1;
pub const SCI_RECRATE: u8 = SCI_AICTRL0;
pub const SCI_RECGAIN: u8 = SCI_AICTRL1;
pub const SCI_RECMAXAUTO: u8 = SCI_AICTRL2;
pub const SCI_RECMODE: u8 = SCI_AICTRL3;

// ── SCI_MODE bits ──────────────────────────────────────────────────────────

pub const SM_DIFF: u16 = 1 << 0;
pub const SM_LAYER12: u16 = 1 << 1;
pub const SM_RESET: u16 = 1 << 2;
/// Set by the host to abandon the current decode/encode; cleared by the
/// device itself once it has safely unwound.
pub const SM_CANCEL: u16 = 1 << 3;
pub const SM_EARSPEAKER_LO: u16 = 1 << 4;
pub const SM_TESTS: u16 = 1 << 5;
pub const SM_STREAM: u16 = 1 << 6;
pub const SM_EARSPEAKER_HI: u16 = 1 << 7;
pub const SM_DACT: u16 = 1 << 8;
pub const SM_SDIORD: u16 = 1 << 9;
pub const SM_SDISHARE: u16 = 1 << 10;
pub const SM_SDINEW: u16 = 1 << 11;
pub const SM_ENCODE: u16 = 1 << 12;
pub const SM_LINE1: u16 = 1 << 14;
pub const SM_CLK_RANGE: u16 = 1 << 15;

/// SS_VER field position within SCI_STATUS.
pub const SS_VER_SHIFT: u16 = 4;
pub const SS_VER_MASK: u16 = 0x000F;

// ── SCI_CLOCKF fields ──────────────────────────────────────────────────────

pub const SC_MULT_53_10X: u16 = 0x0000;
pub const SC_MULT_53_20X: u16 = 0x2000;
pub const SC_MULT_53_25X: u16 = 0x4000;
pub const SC_MULT_53_30X: u16 = 0x6000;
pub const SC_MULT_53_35X: u16 = 0x8000;
pub const SC_MULT_53_40X: u16 = 0xA000;
pub const SC_MULT_53_45X: u16 = 0xC000;
pub const SC_MULT_53_50X: u16 = 0xE000;
pub const SC_ADD_53_00X: u16 = 0x0000;
pub const SC_ADD_53_10X: u16 = 0x0800;
pub const SC_ADD_53_15X: u16 = 0x1000;
pub const SC_ADD_53_20X: u16 = 0x1800;

/// Crystal frequency in Hz to the SC_FREQ field of SCI_CLOCKF.
pub const fn sc_freq_hz(hz: u32) -> u16 {
    ((hz - 8_000_000) / 4_000) as u16
}

/// 12.288 MHz crystal, the reference design's clock.
pub const CLOCK_HZ: u32 = 12_288_000;

// ── SCI_RECMODE (AICTRL3) fields ───────────────────────────────────────────

pub const RM_63_FORMAT_PCM: u16 = 0x0000;
pub const RM_63_FORMAT_IMA_ADPCM: u16 = 0x0010;
pub const RM_63_FORMAT_G711_ULAW: u16 = 0x0020;
pub const RM_63_FORMAT_G711_ALAW: u16 = 0x0030;
pub const RM_63_FORMAT_G722: u16 = 0x0040;
pub const RM_63_FORMAT_OGG_VORBIS: u16 = 0x0050;
pub const RM_63_FORMAT_MP3: u16 = 0x0060;
pub const RM_63_ADC_MODE_JOINT_AGC_STEREO: u16 = 0x0000;
pub const RM_63_ADC_MODE_DUAL_AGC_STEREO: u16 = 0x0001;
pub const RM_63_ADC_MODE_LEFT: u16 = 0x0002;
pub const RM_63_ADC_MODE_RIGHT: u16 = 0x0003;
pub const RM_63_PAUSE: u16 = 1 << 14;

// ── SCI_RECQUALITY fields ──────────────────────────────────────────────────

pub const RQ_MODE_QUALITY: u16 = 0x0000;
pub const RQ_MODE_VBR: u16 = 0x4000;
pub const RQ_MODE_ABR: u16 = 0x8000;
pub const RQ_MODE_CBR: u16 = 0xC000;
pub const RQ_MULT_10: u16 = 0x0000;
pub const RQ_MULT_100: u16 = 0x1000;
pub const RQ_MULT_1000: u16 = 0x2000;
pub const RQ_MULT_10000: u16 = 0x3000;
/// Take the Ogg stream serial number from PAR_ENC_SERIAL_NUMBER.
pub const RQ_OGG_PAR_SERIAL_NUMBER: u16 = 0x0400;

// ── Parametric structure in WRAM ───────────────────────────────────────────

pub const PAR_CHIP_ID: u16 = 0x1E00; // 32 bits
pub const PAR_VERSION: u16 = 0x1E02;
pub const PAR_CONFIG1: u16 = 0x1E03;
pub const PAR_PLAY_SPEED: u16 = 0x1E04;
pub const PAR_BITRATE_PER_100: u16 = 0x1E05;
/// Low byte: the value to pad the stream with after end-of-input.
/// During recording, top bit set means an odd-length capture whose final
/// byte is in the low byte.
pub const PAR_END_FILL_BYTE: u16 = 0x1E06;
pub const PAR_RATE_TUNE: u16 = 0x1E07; // 32 bits, signed ppm
pub const PAR_PLAY_MODE: u16 = 0x1E09;
pub const PAR_SAMPLE_COUNTER: u16 = 0x1E0A; // 32 bits, changing
pub const PAR_VU_METER: u16 = 0x1E0C;
pub const PAR_AD_MIXER_GAIN: u16 = 0x1E0D;
pub const PAR_AD_MIXER_CONFIG: u16 = 0x1E0E;
pub const PAR_PCM_MIXER_RATE: u16 = 0x1E0F;
pub const PAR_PCM_MIXER_FREE: u16 = 0x1E10;
pub const PAR_PCM_MIXER_VOL: u16 = 0x1E11;
pub const PAR_SPEED_SHIFTER: u16 = 0x1E1D;
pub const PAR_EARSPEAKER_LEVEL: u16 = 0x1E1E;
pub const PAR_SDI_FREE: u16 = 0x1E1F;
pub const PAR_AUDIO_FILL: u16 = 0x1E20;
pub const PAR_ENC_SERIAL_NUMBER: u16 = 0x1E24; // 32 bits
pub const PAR_POSITION_MSEC: u16 = 0x1E27; // 32 bits, changing
pub const PAR_RESYNC: u16 = 0x1E29;

pub const PAR_CONFIG1_AAC_SBR_SELECTIVE_UPSAMPLE: u16 = 0x0040;

// ── PAR_PLAY_MODE bits ─────────────────────────────────────────────────────

pub const PAR_PLAY_MODE_MONO_OUTPUT_ENA: u16 = 1 << 0;
pub const PAR_PLAY_MODE_PAUSE_ENA: u16 = 1 << 1;
pub const PAR_PLAY_MODE_VU_METER_ENA: u16 = 1 << 2;
pub const PAR_PLAY_MODE_AD_MIXER_ENA: u16 = 1 << 3;
pub const PAR_PLAY_MODE_PCM_MIXER_ENA: u16 = 1 << 4;
pub const PAR_PLAY_MODE_EQ5_ENA: u16 = 1 << 5;
pub const PAR_PLAY_MODE_SPEED_SHIFTER_ENA: u16 = 1 << 6;

// ── Speed shifter range ────────────────────────────────────────────────────

/// 16384 = 1.0×.
pub const SPEED_SHIFT_NORMAL: u16 = 16_384;
pub const SPEED_SHIFT_MIN: u16 = 11_141; // 0.68×
pub const SPEED_SHIFT_MAX: u16 = 26_869; // 1.64×
pub const SPEED_SHIFT_STEP: u16 = 128;

/// Default volume, −6.0 dB on both channels (0.5 dB steps).
pub const DEFAULT_VOLUME: u16 = 0x0C0C;

/// Written to SCI_AIADDR to hand control to the encoder.
pub const ENCODER_START_ADDR: u16 = 0x0050;
