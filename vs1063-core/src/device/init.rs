//! Software bring-up: reset, sanity check, chip identification, clock,
//! default volume, firmware patch load.

use crate::models::error::DriverError;
use crate::traits::sci_bus::SciBus;

use super::registers::*;
use super::Vs1063;

/// Chip numbers by SS_VER. Zero means the value is unassigned.
/// SS_VER 1 and 2 both identify as VS1011.
const CHIP_NUMBER: [u16; 16] = [
    1001, 1011, 1011, 1003, 1053, 1033, 1063, 1103, 0, 0, 0, 0, 0, 0, 0, 0,
];

const SANITY_PATTERN_1: u16 = 0xABAD;
const SANITY_PATTERN_2: u16 = 0x7E57;

impl<B: SciBus> Vs1063<B> {
    /// Full software bring-up, leaving the device ready to play or record.
    ///
    /// Run this once before the first session; recording sessions run it
    /// again on completion because the encoder leaves state behind that
    /// only a reset clears. The SPI clock must stay slow until the
    /// SCI_CLOCKF write in here has raised the device clock.
    pub fn init(&mut self) -> Result<(), DriverError> {
        // Dummy read settles chip select and leaves the SCI bus in a
        // known state.
        self.bus_mut().read_sci(SCI_MODE)?;

        self.bus_mut()
            .write_sci(SCI_MODE, SM_SDINEW | SM_SDISHARE | SM_TESTS | SM_RESET)?;

        // Quick sanity check: a failed read-back usually means wiring
        // trouble or a too-fast SPI clock (the MSB fails first).
        self.bus_mut().write_sci(SCI_AICTRL1, SANITY_PATTERN_1)?;
        self.bus_mut().write_sci(SCI_AICTRL2, SANITY_PATTERN_2)?;
        let read1 = self.bus_mut().read_sci(SCI_AICTRL1)?;
        let read2 = self.bus_mut().read_sci(SCI_AICTRL2)?;
        if read1 != SANITY_PATTERN_1 || read2 != SANITY_PATTERN_2 {
            return Err(DriverError::SanityCheck { read1, read2 });
        }
        self.bus_mut().write_sci(SCI_AICTRL1, 0)?;
        self.bus_mut().write_sci(SCI_AICTRL2, 0)?;

        let ss_ver = ((self.bus_mut().read_sci(SCI_STATUS)? >> SS_VER_SHIFT) & SS_VER_MASK) as u8;
        match CHIP_NUMBER[ss_ver as usize] {
            0 => return Err(DriverError::UnknownChip(ss_ver)),
            1063 => log::info!("chip is VS1063"),
            other => return Err(DriverError::WrongChip(other)),
        }

        self.bus_mut()
            .write_sci(SCI_CLOCKF, sc_freq_hz(CLOCK_HZ) | SC_MULT_53_40X | SC_ADD_53_15X)?;

        self.write_mem(PAR_CONFIG1, PAR_CONFIG1_AAC_SBR_SELECTIVE_UPSAMPLE)?;

        self.bus_mut().write_sci(SCI_VOL, DEFAULT_VOLUME)?;

        if !self.has_patch() {
            return Ok(());
        }
        let patch = self.take_patch();
        let result = self.load_patch(&patch);
        self.put_patch(patch);
        result
    }

    /// Apply a firmware patch image.
    ///
    /// The image is a sequence of (address, count, value...) u16 records.
    /// A count with the top bit set is an RLE run: one value replicated
    /// `count & 0x7FFF` times. Otherwise `count` literal values follow.
    /// Records are applied to registers verbatim.
    pub fn load_patch(&mut self, image: &[u16]) -> Result<(), DriverError> {
        let mut i = 0;
        while i < image.len() {
            if i + 1 >= image.len() {
                return Err(DriverError::PatchTruncated);
            }
            let addr = image[i] as u8;
            let count = image[i + 1];
            i += 2;
            if count & 0x8000 != 0 {
                let n = (count & 0x7FFF) as usize;
                let value = *image.get(i).ok_or(DriverError::PatchTruncated)?;
                i += 1;
                for _ in 0..n {
                    self.bus_mut().write_sci(addr, value)?;
                }
            } else {
                for _ in 0..count {
                    let value = *image.get(i).ok_or(DriverError::PatchTruncated)?;
                    i += 1;
                    self.bus_mut().write_sci(addr, value)?;
                }
            }
        }
        Ok(())
    }
}
