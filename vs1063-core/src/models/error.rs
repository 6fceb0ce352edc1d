use thiserror::Error;

/// Errors that can occur while driving the codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Transport-level fault reported by the `SciBus` implementation.
    #[error("bus fault: {0}")]
    Bus(String),

    /// The scratch-register round trip read back the wrong values.
    /// Usually a wiring or SPI-speed problem.
    #[error("SCI sanity check failed: read back {read1:#06x}, {read2:#06x}")]
    SanityCheck { read1: u16, read2: u16 },

    /// SS_VER field of SCI_STATUS is not in the known chip table.
    #[error("unknown chip, SS_VER = {0}")]
    UnknownChip(u8),

    /// A chip was identified, but it is not a VS1063.
    #[error("incorrect chip: VS{0}")]
    WrongChip(u16),

    /// The firmware patch image ended mid-record.
    #[error("firmware patch image is truncated")]
    PatchTruncated,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("storage error: {0}")]
    Storage(String),

    /// The device never cleared SM_CANCEL within the drain ceiling.
    #[error("device did not acknowledge cancel")]
    CancelTimeout,
}
