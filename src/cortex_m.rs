//! Platform pieces for Armv7-M targets.
//!
//! [`Itm`] transmits through stimulus port 0 of the Instrumentation Trace Macrocell, the usual
//! debug port for SWO output. [`in_interrupt()`] reads the active exception number from the System
//! Control Block.
//!
//! These access memory-mapped registers directly and must only be used on a Cortex-M3 or later.

use crate::platform::Transmitter;
use voladdress::{Safe, VolAddress};

/// Stimulus port 0. Reads as nonzero when the port can accept another write.
const ITM_STIM0: VolAddress<u32, Safe, ()> = unsafe { VolAddress::new(0xE000_0000) };
/// Stimulus port 0, written one byte at a time.
const ITM_STIM0_U8: VolAddress<u8, (), Safe> = unsafe { VolAddress::new(0xE000_0000) };
/// Trace Enable Register. Bit `n` enables stimulus port `n`.
const ITM_TER: VolAddress<u32, Safe, ()> = unsafe { VolAddress::new(0xE000_0E00) };
/// Trace Control Register.
const ITM_TCR: VolAddress<u32, Safe, ()> = unsafe { VolAddress::new(0xE000_0E80) };
/// Interrupt Control and State Register.
const SCB_ICSR: VolAddress<u32, Safe, ()> = unsafe { VolAddress::new(0xE000_ED04) };

const ITM_TCR_ITMENA: u32 = 1 << 0;
const SCB_ICSR_VECTACTIVE: u32 = 0x1FF;

/// A [`Transmitter`] over ITM stimulus port 0.
///
/// While no debugger has enabled the ITM (or port 0), bytes are discarded instead of waiting for
/// a FIFO that will never drain.
#[derive(Clone, Copy, Debug, Default)]
pub struct Itm;

impl Itm {
    /// Whether the ITM and stimulus port 0 are both enabled.
    pub fn is_enabled(&self) -> bool {
        ITM_TCR.read() & ITM_TCR_ITMENA != 0 && ITM_TER.read() & 1 != 0
    }
}

impl Transmitter for Itm {
    fn transmit(&self, byte: u8) {
        if !self.is_enabled() {
            return;
        }
        while ITM_STIM0.read() == 0 {
            core::hint::spin_loop();
        }
        ITM_STIM0_U8.write(byte);
    }
}

/// Whether the processor is currently handling an exception or interrupt.
pub fn in_interrupt() -> bool {
    SCB_ICSR.read() & SCB_ICSR_VECTACTIVE != 0
}
