//! The simulated chip.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use vs1063_core::device::registers::*;
use vs1063_core::{DriverError, SciBus};

/// Chip state behind the cloneable handle.
struct SimState {
    sci: [u16; 16],
    wram: HashMap<u16, u16>,
    wram_addr: u16,
    /// Every byte ever pushed through SDI, in order.
    sdi: Vec<u8>,
    /// SDI bytes seen since SM_CANCEL was set.
    sdi_since_cancel: u64,
    cancel_pending: bool,
    /// SDI bytes the decoder "needs" after SM_CANCEL before it clears the
    /// bit. Zero clears on the next SCI_MODE read.
    cancel_drain_bytes: u64,
    /// Words the encoder still holds for the host.
    rec_queue: VecDeque<u16>,
    /// Value SCI_HDAT1 returns while decoding.
    header_word: u16,
    resets: usize,
}

impl SimState {
    fn new() -> Self {
        let mut sci = [0u16; 16];
        sci[SCI_STATUS as usize] = 6 << SS_VER_SHIFT; // identifies as VS1063
        sci[SCI_AUDATA as usize] = 0xBB81; // 48 kHz stereo
        Self {
            sci,
            wram: HashMap::new(),
            wram_addr: 0,
            sdi: Vec::new(),
            sdi_since_cancel: 0,
            cancel_pending: false,
            cancel_drain_bytes: 0,
            rec_queue: VecDeque::new(),
            header_word: 0,
            resets: 0,
        }
    }

    fn encoding(&self) -> bool {
        self.sci[SCI_MODE as usize] & SM_ENCODE != 0
    }

    fn maybe_clear_cancel(&mut self) {
        if self.cancel_pending
            && self.sdi_since_cancel >= self.cancel_drain_bytes
            && self.rec_queue.is_empty()
        {
            self.cancel_pending = false;
            self.sci[SCI_MODE as usize] &= !SM_CANCEL;
        }
    }

    fn soft_reset(&mut self, mode: u16) {
        self.resets += 1;
        self.cancel_pending = false;
        self.sdi_since_cancel = 0;
        self.rec_queue.clear();
        self.sci[SCI_MODE as usize] = mode & !SM_RESET;
        log::debug!("sim: soft reset #{}", self.resets);
    }
}

/// A simulated VS1063 behind a cloneable handle.
///
/// All clones share one chip; the driver takes one as its bus while the
/// test keeps another for scripting and inspection.
#[derive(Clone)]
pub struct SimDevice {
    inner: Arc<Mutex<SimState>>,
}

impl SimDevice {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState::new())),
        }
    }

    /// Value SCI_HDAT1 reports while a stream plays.
    pub fn set_header_word(&self, word: u16) {
        self.inner.lock().header_word = word;
    }

    /// SDI bytes the decoder needs after SM_CANCEL before clearing it.
    pub fn set_cancel_drain_bytes(&self, bytes: u64) {
        self.inner.lock().cancel_drain_bytes = bytes;
    }

    /// Append words to the encoder's output queue.
    pub fn queue_encoder_words(&self, words: &[u16]) {
        self.inner.lock().rec_queue.extend(words.iter().copied());
    }

    /// Poke a parametric WRAM location.
    pub fn set_parametric(&self, addr: u16, value: u16) {
        self.inner.lock().wram.insert(addr, value);
    }

    /// Poke an SCI register directly, without bus side effects.
    pub fn poke_sci(&self, reg: u8, value: u16) {
        self.inner.lock().sci[reg as usize] = value;
    }

    /// Everything pushed through SDI so far.
    pub fn sdi_bytes(&self) -> Vec<u8> {
        self.inner.lock().sdi.clone()
    }

    pub fn sdi_len(&self) -> usize {
        self.inner.lock().sdi.len()
    }

    /// How many soft resets the chip has seen.
    pub fn reset_count(&self) -> usize {
        self.inner.lock().resets
    }
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SciBus for SimDevice {
    fn read_sci(&mut self, reg: u8) -> Result<u16, DriverError> {
        let mut chip = self.inner.lock();
        let value = match reg {
            SCI_MODE => {
                chip.maybe_clear_cancel();
                chip.sci[SCI_MODE as usize]
            }
            SCI_HDAT1 => {
                if chip.encoding() {
                    chip.rec_queue.len() as u16
                } else {
                    chip.header_word
                }
            }
            SCI_HDAT0 => {
                if chip.encoding() {
                    chip.rec_queue.pop_front().unwrap_or(0)
                } else {
                    chip.sci[SCI_HDAT0 as usize]
                }
            }
            SCI_WRAM => {
                let addr = chip.wram_addr;
                let v = chip.wram.get(&addr).copied().unwrap_or(0);
                chip.wram_addr = chip.wram_addr.wrapping_add(1);
                v
            }
            _ => chip.sci[reg as usize],
        };
        Ok(value)
    }

    fn write_sci(&mut self, reg: u8, value: u16) -> Result<(), DriverError> {
        let mut chip = self.inner.lock();
        match reg {
            SCI_WRAMADDR => {
                // Doubles as SCI_RECQUALITY while encoding; both effects
                // are harmless to model unconditionally.
                chip.wram_addr = value;
                chip.sci[SCI_WRAMADDR as usize] = value;
            }
            SCI_WRAM => {
                let addr = chip.wram_addr;
                chip.wram.insert(addr, value);
                chip.wram_addr = chip.wram_addr.wrapping_add(1);
            }
            SCI_MODE => {
                if value & SM_RESET != 0 {
                    chip.soft_reset(value);
                } else {
                    if value & SM_CANCEL != 0 && !chip.cancel_pending {
                        chip.cancel_pending = true;
                        chip.sdi_since_cancel = 0;
                        log::debug!(
                            "sim: SM_CANCEL set, clears after {} SDI bytes",
                            chip.cancel_drain_bytes
                        );
                    }
                    chip.sci[SCI_MODE as usize] = value;
                }
            }
            _ => chip.sci[reg as usize] = value,
        }
        Ok(())
    }

    fn write_sdi(&mut self, data: &[u8]) -> Result<(), DriverError> {
        let mut chip = self.inner.lock();
        chip.sdi.extend_from_slice(data);
        if chip.cancel_pending {
            chip.sdi_since_cancel += data.len() as u64;
        }
        Ok(())
    }
}
