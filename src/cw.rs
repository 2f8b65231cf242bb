//! Gated-carrier (CW) keying.
//!
//! Morse identification is produced by switching the transmitter between
//! the Tx and Ready states: the carrier is keyed on for the duration of a
//! dot or dash and inhibited in between. Mapping characters to element
//! sequences is left to the caller; this module provides the timing and
//! the keying primitive.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::driver::Si4063;
use crate::error::Error;

/// One keyed Morse element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Element {
    /// A dot, one unit long.
    Dot,
    /// A dash, three units long.
    Dash,
}

/// Element and gap durations derived from a words-per-minute speed using
/// the PARIS convention: one unit is `1200 / wpm` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct CwTiming {
    /// Dot duration, one unit.
    pub dot_ms: u32,
    /// Dash duration, three units.
    pub dash_ms: u32,
    /// Gap between letters, three units.
    pub char_gap_ms: u32,
    /// Gap between words, seven units.
    pub word_gap_ms: u32,
}

impl CwTiming {
    /// Derives the timing set for a keying speed in words per minute.
    /// A zero speed is clamped to one word per minute.
    pub fn from_wpm(wpm: u32) -> Self {
        let dot_ms = 1200 / wpm.max(1);
        Self {
            dot_ms,
            dash_ms: 3 * dot_ms,
            char_gap_ms: 3 * dot_ms,
            word_gap_ms: 7 * dot_ms,
        }
    }
}

impl<SPI, NSEL, SDN, D> Si4063<SPI, NSEL, SDN, D>
where
    SPI: SpiBus,
    NSEL: OutputPin,
    SDN: OutputPin,
    D: DelayNs,
{
    /// Keys one element: carrier on for the element duration, then off.
    /// Does not include the one-unit gap that follows an element; use
    /// [`element_gap`](Si4063::element_gap).
    pub fn key_element(&mut self, timing: &CwTiming, element: Element) -> Result<(), Error> {
        self.enable_carrier()?;
        let duration_ms = match element {
            Element::Dot => timing.dot_ms,
            Element::Dash => timing.dash_ms,
        };
        self.delay.delay_ms(duration_ms);
        self.inhibit_carrier()
    }

    /// Holds the one-unit silence between elements of a letter.
    pub fn element_gap(&mut self, timing: &CwTiming) {
        self.delay.delay_ms(timing.dot_ms);
    }

    /// Holds the three-unit silence between letters.
    pub fn char_gap(&mut self, timing: &CwTiming) {
        self.delay.delay_ms(timing.char_gap_ms);
    }

    /// Holds the seven-unit silence between words.
    pub fn word_gap(&mut self, timing: &CwTiming) {
        self.delay.delay_ms(timing.word_gap_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::test_support::{Script, finish};

    #[test]
    fn test_timing_follows_paris_convention() {
        let timing = CwTiming::from_wpm(20);
        assert_eq!(timing.dot_ms, 60);
        assert_eq!(timing.dash_ms, 180);
        assert_eq!(timing.char_gap_ms, 180);
        assert_eq!(timing.word_gap_ms, 420);
    }

    #[test]
    fn test_zero_wpm_is_clamped() {
        assert_eq!(CwTiming::from_wpm(0).dot_ms, 1200);
    }

    #[test]
    fn test_key_element_gates_the_carrier() {
        let timing = CwTiming::from_wpm(20);

        // Dot then dash: each keys Tx (0x07) and releases to Ready
        // (0x03); the hold itself is invisible to the bus.
        let mut script = Script::new();
        script.command(&[0x34, 0x07]);
        script.command(&[0x34, 0x03]);
        script.command(&[0x34, 0x07]);
        script.command(&[0x34, 0x03]);

        let mut driver = script.build();
        driver.key_element(&timing, Element::Dot).unwrap();
        driver.element_gap(&timing);
        driver.key_element(&timing, Element::Dash).unwrap();
        finish(driver);
    }
}
