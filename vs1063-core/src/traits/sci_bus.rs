use crate::models::error::DriverError;

/// Register and bulk-data access to the VS1063.
///
/// SCI is the low-throughput control path: sixteen 16-bit registers
/// addressed by a 4-bit register number. SDI is the unidirectional
/// high-throughput channel encoded audio bytes are streamed through.
///
/// Implementations own chip-select, DREQ waiting, and bus timing, and map
/// transport faults into [`DriverError::Bus`]. The bus is exclusively
/// owned by whichever session is running; there is no concurrent access
/// by construction.
pub trait SciBus {
    /// Read a 16-bit SCI register.
    fn read_sci(&mut self, reg: u8) -> Result<u16, DriverError>;

    /// Write a 16-bit SCI register.
    fn write_sci(&mut self, reg: u8, value: u16) -> Result<(), DriverError>;

    /// Push a burst of bytes to the SDI bulk-data channel.
    ///
    /// Callers keep bursts small (32 bytes or fewer); the device input
    /// FIFO is shallow and larger single transfers risk overrun on some
    /// transports.
    fn write_sdi(&mut self, data: &[u8]) -> Result<(), DriverError>;
}
