//! Device-level access: the driver handle, parametric memory reads and
//! writes, and bring-up.

pub mod init;
mod mem;
pub mod registers;

use crate::models::error::DriverError;
use crate::traits::sci_bus::SciBus;

use registers::{SCI_WRAM, SCI_WRAMADDR};

/// Driver handle for one VS1063.
///
/// Owns the bus and the firmware patch image so a session can re-run
/// bring-up without the caller threading the image through again.
pub struct Vs1063<B> {
    bus: B,
    patch: Vec<u16>,
}

impl<B: SciBus> Vs1063<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            patch: Vec::new(),
        }
    }

    /// Attach the firmware patch image applied at every [`init`](Self::init).
    pub fn with_patch(bus: B, patch: Vec<u16>) -> Self {
        Self { bus, patch }
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    fn has_patch(&self) -> bool {
        !self.patch.is_empty()
    }

    fn take_patch(&mut self) -> Vec<u16> {
        std::mem::take(&mut self.patch)
    }

    fn put_patch(&mut self, patch: Vec<u16>) {
        self.patch = patch;
    }

    /// Read a 16-bit value from parametric memory.
    pub fn read_mem(&mut self, addr: u16) -> Result<u16, DriverError> {
        self.bus.write_sci(SCI_WRAMADDR, addr)?;
        self.bus.read_sci(SCI_WRAM)
    }

    /// Write a 16-bit value to parametric memory.
    pub fn write_mem(&mut self, addr: u16, value: u16) -> Result<(), DriverError> {
        self.bus.write_sci(SCI_WRAMADDR, addr)?;
        self.bus.write_sci(SCI_WRAM, value)
    }

    /// Write a 32-bit value, low half first. The WRAM pointer
    /// auto-increments between the two accesses.
    pub fn write_mem32(&mut self, addr: u16, value: u32) -> Result<(), DriverError> {
        self.bus.write_sci(SCI_WRAMADDR, addr)?;
        self.bus.write_sci(SCI_WRAM, value as u16)?;
        self.bus.write_sci(SCI_WRAM, (value >> 16) as u16)
    }

    /// Read a non-changing 32-bit value, low half then high half.
    pub fn read_mem32(&mut self, addr: u16) -> Result<u32, DriverError> {
        self.bus.write_sci(SCI_WRAMADDR, addr)?;
        let lsb = self.bus.read_sci(SCI_WRAM)?;
        let msb = self.bus.read_sci(SCI_WRAM)?;
        Ok(mem::compose(msb, lsb))
    }

    /// Read a 32-bit counter that increases while being read.
    ///
    /// Samples the high half on both sides of the low half and lets
    /// [`mem::resolve_counter`] pick the coherent pair.
    pub fn read_mem32_counter(&mut self, addr: u16) -> Result<u32, DriverError> {
        self.bus.write_sci(SCI_WRAMADDR, addr + 1)?;
        let msb_first = self.bus.read_sci(SCI_WRAM)?;
        self.bus.write_sci(SCI_WRAMADDR, addr)?;
        let lsb = self.bus.read_sci(SCI_WRAM)?;
        let msb_second = self.bus.read_sci(SCI_WRAM)?;
        Ok(mem::resolve_counter(msb_first, lsb, msb_second))
    }
}
