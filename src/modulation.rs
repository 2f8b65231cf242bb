//! 4FSK symbol modulation over the direct (async) path.
//!
//! Four-level FSK is produced without touching the FIFO engine: each 2-bit
//! symbol nudges the carrier via the MODEM_FREQ_OFFSET property and the
//! driver then holds for one symbol period. Bytes are unpacked MSB-first,
//! so `0b00_01_10_11` walks the four tones in ascending order.
//!
//! The chip must already be keyed ([`Si4063::enable_carrier`]) in a direct
//! modulation mode such as [`Modulation::Cw`](crate::driver::Modulation)
//! before symbols are written; this module only steps the offset.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::consts::{FSK4_OFFSET_STEP, FSK4_TRAINING_BYTE};
use crate::driver::Si4063;
use crate::error::Error;

/// Hold duration of one symbol at `rate_bps` symbols per second, in
/// whole milliseconds (100 baud holds 10 ms). Rates above 1 kbaud floor
/// to a zero hold, leaving pacing to the bus transaction itself.
pub fn symbol_period_ms(rate_bps: u32) -> u32 {
    1000 / rate_bps.max(1)
}

impl<SPI, NSEL, SDN, D> Si4063<SPI, NSEL, SDN, D>
where
    SPI: SpiBus,
    NSEL: OutputPin,
    SDN: OutputPin,
    D: DelayNs,
{
    /// Shifts the carrier to one of the four tones and holds for one
    /// symbol period. Symbols above 3 are masked down.
    pub fn write_symbol(&mut self, symbol: u8) -> Result<(), Error> {
        self.set_frequency_offset(FSK4_OFFSET_STEP * u16::from(symbol & 0x03))?;
        self.delay.delay_ms(self.symbol_period_ms);
        Ok(())
    }

    /// Emits the four 2-bit symbols of `byte`, most significant first.
    pub fn write_symbol_byte(&mut self, byte: u8) -> Result<(), Error> {
        for shift in [6u8, 4, 2, 0] {
            self.write_symbol(byte >> shift)?;
        }
        Ok(())
    }

    /// Emits every byte of `data` as 4FSK symbols.
    pub fn write_symbols(&mut self, data: &[u8]) -> Result<(), Error> {
        for &byte in data {
            self.write_symbol_byte(byte)?;
        }
        Ok(())
    }

    /// Emits `count` training bytes so the receiver's demodulator can
    /// lock onto the tone spacing. The training byte cycles all four
    /// symbols in ascending order.
    pub fn preamble(&mut self, count: u32) -> Result<(), Error> {
        for _ in 0..count {
            self.write_symbol_byte(FSK4_TRAINING_BYTE)?;
        }
        Ok(())
    }

    /// Parks the carrier back on the lowest tone (offset zero) without a
    /// symbol hold.
    pub fn idle(&mut self) -> Result<(), Error> {
        self.set_frequency_offset(0)
    }
}
