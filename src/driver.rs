//! Si4063 transmitter driver.
//!
//! This module provides the [`Si4063`] struct, which owns the SPI bus, the
//! chip-select (NSEL) and shutdown (SDN) lines and a blocking delay source,
//! and drives the chip's command protocol: the clear-to-send handshake,
//! operating-state transitions, fractional-N PLL programming and the
//! transmit FIFO path.
//!
//! ## Bus protocol
//!
//! Every command is framed by [`crate::command::Command`]: the driver polls
//! the READ_CMD_BUFF opcode until the chip answers with the `0xFF`
//! clear-to-send sentinel, then asserts NSEL, writes the opcode and payload
//! and deasserts NSEL. Responses use the same poll, but on success NSEL
//! stays asserted while the response bytes stream out.
//!
//! ## Driver context
//!
//! The reference clock, current carrier frequency and current deviation
//! live as fields of the driver value rather than as globals, so the
//! deviation-depends-on-output-divider coupling becomes an explicit step:
//! [`Si4063::set_frequency`] always ends by reprogramming the deviation
//! from the stored target, because the divider may just have changed.
//!
//! ## Example
//!
//! ```ignore
//! let mut radio = Si4063::new(spi, nsel, sdn, delay);
//! radio.configure(&chip_parameters, &radio_parameters)?;
//! radio.set_frequency(434_712_000)?;
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::command::{CHIP_PEND_FIFO_UNDERFLOW, Command, OPCODE_READ_CMD_BUFF};
use crate::consts::{
    CTS_POLL_BUDGET, CTS_POLL_INTERVAL_US, CTS_READY, DEFAULT_CLOCK_HZ, DEFAULT_FREQUENCY_HZ,
    DEFAULT_RATE_BPS, FRR_CTL_A_MODE, FREQ_CONTROL_INTE, GLOBAL_CLK_CFG, GLOBAL_CONFIG,
    GLOBAL_XO_TUNE, GROUP_FREQ_CONTROL, GROUP_GLOBAL, GROUP_INT_CTL, GROUP_FRR_CTL, GROUP_MODEM,
    GROUP_PA, GROUP_PKT, GROUP_PREAMBLE, GROUP_SYNC, INT_CTL_ENABLE, MAX_CLOCK_HZ, MIN_CLOCK_HZ,
    MODEM_CLKGEN_BAND, MODEM_DATA_RATE, MODEM_FREQ_DEV, MODEM_FREQ_OFFSET, MODEM_MOD_TYPE,
    PA_BIAS_CLKDUTY, PA_PWR_LVL, PKT_FIELD_1_CRC_CONFIG, PREAMBLE_TX_LENGTH, SYNC_CONFIG,
    TX_FIFO_DEPTH,
};
use crate::error::Error;

/// The chip's operating states, as reported by REQUEST_DEVICE_STATE and
/// forced by CHANGE_STATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
pub enum State {
    /// Lowest-power state; the transmitter is off.
    Sleep = 0x01,
    /// SPI interface active, everything else idle.
    SpiActive = 0x02,
    /// Crystal running, ready to tune.
    Ready = 0x03,
    /// Second ready state reported by some chip revisions.
    Ready2 = 0x04,
    /// Synthesizer tuning for transmit.
    TxTune = 0x05,
    /// Actively transmitting.
    Tx = 0x07,
}

impl State {
    /// Decodes a raw device-state byte; `None` for transitional or
    /// undocumented values.
    pub fn from_raw(raw: u8) -> Option<State> {
        match raw {
            0x01 => Some(State::Sleep),
            0x02 => Some(State::SpiActive),
            0x03 => Some(State::Ready),
            0x04 => Some(State::Ready2),
            0x05 => Some(State::TxTune),
            0x07 => Some(State::Tx),
            _ => None,
        }
    }

    /// Whether this state means the chip is no longer transmitting.
    pub fn is_inactive(self) -> bool {
        matches!(
            self,
            State::Sleep | State::SpiActive | State::Ready | State::Ready2
        )
    }
}

/// Modulation mode programmed into MODEM_MOD_TYPE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Modulation {
    /// Pure carrier wave, shaped by the frequency-offset register
    /// (e.g. RTTY or 4FSK via direct offset stepping).
    Cw,
    /// Direct async mode with OOK modulation.
    Ook,
    /// Direct async mode with FSK modulation.
    Fsk,
    /// FSK modulation fed from the internal TX FIFO.
    FifoFsk,
}

impl Modulation {
    /// Direct async mode, GPIO3 as modulation source, MCU-controlled.
    const DIRECT_ASYNC_GPIO3: u8 = 0x80 | 0x60 | 0x08;

    /// The MODEM_MOD_TYPE property value for this mode.
    pub fn mod_type(self) -> u8 {
        match self {
            Modulation::Cw => Self::DIRECT_ASYNC_GPIO3,
            Modulation::Ook => Self::DIRECT_ASYNC_GPIO3 | 0x01,
            Modulation::Fsk => Self::DIRECT_ASYNC_GPIO3 | 0x02,
            // The buffered path bypasses direct mode entirely.
            Modulation::FifoFsk => 0x02,
        }
    }
}

/// One-time chip configuration: GPIO mapping, pad drive strength and the
/// reference-clock frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ChipParameters {
    /// GPIO0 pin mode.
    pub gpio0: u8,
    /// GPIO1 pin mode.
    pub gpio1: u8,
    /// GPIO2 pin mode.
    pub gpio2: u8,
    /// GPIO3 pin mode.
    pub gpio3: u8,
    /// Output drive strength for the GPIO pads.
    pub drive_strength: u8,
    /// Reference clock in Hz; values outside the supported range keep the
    /// driver's previous clock (26 MHz by default).
    pub clock_hz: u32,
}

/// RF configuration supplied by the caller at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioParameters {
    /// Target carrier frequency in Hz.
    pub frequency_hz: u32,
    /// Symbol/bit rate in bits per second; also sets the 4FSK symbol hold.
    pub rate_bps: u32,
    /// Raw MODEM_DATA_RATE register value (GFSK filtering only).
    pub data_rate: u32,
    /// Transmit power level, 0..=127.
    pub power: u8,
    /// Modulation mode.
    pub modulation: Modulation,
    /// Initial frequency-offset seed, in synthesizer steps.
    pub offset: u16,
    /// Target peak frequency deviation in Hz.
    pub deviation_hz: u32,
}

/// Upper band edge in Hz, output divider, band code. Evaluated in order;
/// the first matching upper bound wins, so each boundary frequency
/// resolves to the higher band.
const BAND_EDGES: [(u32, u32, u8); 5] = [
    (177_000_000, 24, 5),
    (239_000_000, 16, 4),
    (353_000_000, 12, 3),
    (525_000_000, 8, 2),
    (705_000_000, 6, 1),
];

/// Selects the synthesizer output divider for a target frequency,
/// following the recommended ranges in the Si406x datasheet.
pub fn output_divider(frequency_hz: u32) -> u32 {
    for &(upper, outdiv, _) in BAND_EDGES.iter() {
        if frequency_hz < upper {
            return outdiv;
        }
    }
    4
}

/// Selects the MODEM_CLKGEN_BAND code for a target frequency. Shares its
/// interval boundaries with [`output_divider`].
pub fn frequency_band(frequency_hz: u32) -> u8 {
    for &(upper, _, band) in BAND_EDGES.iter() {
        if frequency_hz < upper {
            return band;
        }
    }
    0
}

/// Blocking driver for the Si4063 transmitter.
///
/// ## Type Parameters
///
/// - `SPI`: the shared bus, implementing [`embedded_hal::spi::SpiBus`]
/// - `NSEL`: chip-select line, active low during any bus transaction
/// - `SDN`: shutdown line, pulsed to reset the chip
/// - `D`: blocking delay source used for handshake pacing and symbol
///   timing
///
/// Chip-select framing is handled here rather than through an
/// `SpiDevice`, because the clear-to-send handshake interleaves NSEL
/// edges with reads in a chip-specific pattern.
#[derive(Debug)]
pub struct Si4063<SPI, NSEL, SDN, D>
where
    SPI: SpiBus,
    NSEL: OutputPin,
    SDN: OutputPin,
    D: DelayNs,
{
    pub(crate) spi: SPI,
    pub(crate) nsel: NSEL,
    pub(crate) sdn: SDN,
    pub(crate) delay: D,
    // Driver context: every PLL computation reads these, and
    // set_frequency/set_deviation keep them current.
    pub(crate) clock_hz: u32,
    pub(crate) frequency_hz: u32,
    pub(crate) deviation_hz: u32,
    pub(crate) symbol_period_ms: u32,
}

impl<SPI, NSEL, SDN, D> Si4063<SPI, NSEL, SDN, D>
where
    SPI: SpiBus,
    NSEL: OutputPin,
    SDN: OutputPin,
    D: DelayNs,
{
    /// Creates a new driver without touching the bus.
    ///
    /// The context starts from the defaults the chip is usually deployed
    /// with: 26 MHz reference clock, 434 MHz carrier, zero deviation and
    /// a 100 baud symbol rate. [`configure`](Si4063::configure) replaces
    /// all of these.
    pub fn new(spi: SPI, nsel: NSEL, sdn: SDN, delay: D) -> Self {
        Self {
            spi,
            nsel,
            sdn,
            delay,
            clock_hz: DEFAULT_CLOCK_HZ,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            deviation_hz: 0,
            symbol_period_ms: crate::modulation::symbol_period_ms(DEFAULT_RATE_BPS),
        }
    }

    /// Releases the bus, control lines and delay source.
    pub fn release(self) -> (SPI, NSEL, SDN, D) {
        (self.spi, self.nsel, self.sdn, self.delay)
    }

    /// The carrier frequency most recently programmed, in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency_hz
    }

    /// The target deviation most recently programmed, in Hz.
    pub fn deviation(&self) -> u32 {
        self.deviation_hz
    }

    /// The reference clock the PLL math currently assumes, in Hz.
    pub fn reference_clock(&self) -> u32 {
        self.clock_hz
    }

    // ------------------------------------------------------------------
    // Bus transport
    // ------------------------------------------------------------------

    fn select(&mut self) -> Result<(), Error> {
        self.nsel.set_low().map_err(|_| Error::Gpio)
    }

    fn deselect(&mut self) -> Result<(), Error> {
        self.nsel.set_high().map_err(|_| Error::Gpio)
    }

    fn write_flush(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.spi.write(bytes).map_err(|_| Error::Bus)?;
        self.spi.flush().map_err(|_| Error::Bus)
    }

    /// One clear-to-send poll: select, write READ_CMD_BUFF, read the
    /// status byte, deselect.
    fn poll_cts(&mut self) -> Result<u8, Error> {
        self.select()?;
        let mut byte = [0u8];
        let result = self
            .spi
            .write(&[OPCODE_READ_CMD_BUFF])
            .and_then(|()| self.spi.read(&mut byte))
            .and_then(|()| self.spi.flush())
            .map_err(|_| Error::Bus);
        let deselect = self.deselect();
        result?;
        deselect?;
        Ok(byte[0])
    }

    /// Polls the chip until its command processor reports clear-to-send.
    ///
    /// Bounded by [`CTS_POLL_BUDGET`] polls paced at
    /// [`CTS_POLL_INTERVAL_US`], i.e. the handshake gives up after
    /// roughly 655 ms regardless of per-poll bus latency.
    pub fn wait_for_cts(&mut self) -> Result<(), Error> {
        for _ in 0..CTS_POLL_BUDGET {
            if self.poll_cts()? == CTS_READY {
                return Ok(());
            }
            self.delay.delay_us(CTS_POLL_INTERVAL_US);
        }
        Err(Error::CtsTimeout)
    }

    /// Waits for clear-to-send, then writes one encoded command frame.
    ///
    /// The select line is asserted for exactly the duration of the frame,
    /// which is what makes a command a single critical section on the
    /// shared bus.
    pub fn send_command(&mut self, command: &Command<'_>) -> Result<(), Error> {
        self.wait_for_cts()?;
        let frame = command.encode();
        self.select()?;
        let result = self.write_flush(&frame);
        let deselect = self.deselect();
        result?;
        deselect
    }

    /// Polls for clear-to-send and then streams `buf.len()` response
    /// bytes out without releasing the select line in between.
    pub fn read_response(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        for _ in 0..CTS_POLL_BUDGET {
            self.select()?;
            let mut byte = [0u8];
            if let Err(source) = self
                .spi
                .write(&[OPCODE_READ_CMD_BUFF])
                .and_then(|()| self.spi.read(&mut byte))
                .map_err(|_| Error::Bus)
            {
                let _ = self.deselect();
                return Err(source);
            }
            if byte[0] == CTS_READY {
                // The response follows the sentinel within the same
                // selected transaction.
                let result = self
                    .spi
                    .read(buf)
                    .and_then(|()| self.spi.flush())
                    .map_err(|_| Error::Bus);
                let deselect = self.deselect();
                result?;
                return deselect;
            }
            let flushed = self.spi.flush().map_err(|_| Error::Bus);
            self.deselect()?;
            flushed?;
            self.delay.delay_us(CTS_POLL_INTERVAL_US);
        }
        Err(Error::CtsTimeout)
    }

    fn set_property(&mut self, group: u8, start: u8, values: &[u8]) -> Result<(), Error> {
        self.send_command(&Command::SetProperty {
            group,
            start,
            values,
        })
    }

    // ------------------------------------------------------------------
    // State controller
    // ------------------------------------------------------------------

    /// Forces an operating-state transition. Fire-and-forget: no
    /// acknowledgement is read back, to keep symbol timing tight during
    /// modulation. Callers that need confirmation query
    /// [`device_state`](Si4063::device_state).
    pub fn set_state(&mut self, state: State) -> Result<(), Error> {
        self.send_command(&Command::ChangeState(state))
    }

    /// Keys the carrier on (transmit state).
    pub fn enable_carrier(&mut self) -> Result<(), Error> {
        self.set_state(State::Tx)
    }

    /// Keys the carrier off but keeps the chip ready to transmit again.
    pub fn inhibit_carrier(&mut self) -> Result<(), Error> {
        self.set_state(State::Ready)
    }

    /// Turns the transmitter off and puts the chip to sleep.
    pub fn disable_carrier(&mut self) -> Result<(), Error> {
        self.set_state(State::Sleep)
    }

    /// Reads the chip's current operating state; `None` when the chip
    /// reports a transitional value with no [`State`] representation.
    pub fn device_state(&mut self) -> Result<Option<State>, Error> {
        self.send_command(&Command::RequestDeviceState)?;
        let mut response = [0u8];
        self.read_response(&mut response)?;
        Ok(State::from_raw(response[0]))
    }

    // ------------------------------------------------------------------
    // Frequency synthesizer
    // ------------------------------------------------------------------

    /// Programs the synthesizer to a target carrier frequency in Hz.
    ///
    /// Computes the output divider and band for the frequency, derives
    /// the fractional-N PLL integer/fraction pair from the phase detector
    /// frequency `2 * clock / outdiv`, programs the clock-generator band
    /// and the six FREQ_CONTROL properties, stores the frequency, and
    /// finally reprograms the deviation from the stored target because
    /// the deviation register scales with the output divider.
    ///
    /// Frequencies below the lowest band's phase detector frequency are
    /// rejected with [`Error::InvalidParameter`] before any bus traffic.
    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), Error> {
        let outdiv = output_divider(frequency_hz);
        let band = frequency_band(frequency_hz);

        let f_pfd = 2 * self.clock_hz / outdiv;
        let n = (frequency_hz / f_pfd)
            .checked_sub(1)
            .ok_or(Error::InvalidParameter)?;
        let ratio = f64::from(frequency_hz) / f64::from(f_pfd);
        let rest = ratio - f64::from(n);
        let m = libm::floor(rest * f64::from(1u32 << 19)) as u32;

        #[cfg(feature = "log")]
        log::debug!("si4063: set frequency {frequency_hz} Hz (outdiv {outdiv}, band {band})");

        // SY_SEL: high-performance mode, fixed div-by-2 prescaler for
        // finer tuning.
        self.set_property(GROUP_MODEM, MODEM_CLKGEN_BAND, &[0x08 | band])?;
        self.set_property(
            GROUP_FREQ_CONTROL,
            FREQ_CONTROL_INTE,
            &[
                n as u8,
                (m >> 16) as u8,
                (m >> 8) as u8,
                m as u8,
                // EZ frequency programming channel step size.
                0x00,
                0x02,
            ],
        )?;

        self.frequency_hz = frequency_hz;

        // The deviation register's meaning depends on the output divider,
        // which may just have changed.
        self.set_deviation(self.deviation_hz)
    }

    /// Converts a deviation in Hz to the MODEM_FREQ_DEV register value
    /// for the currently stored carrier frequency and reference clock.
    pub fn calculate_deviation(&self, deviation_hz: u32) -> u32 {
        let outdiv = output_divider(self.frequency_hz);
        // SY_SEL = div-by-2.
        let steps = f64::from(1u32 << 19) * f64::from(outdiv) * f64::from(deviation_hz)
            / f64::from(2 * self.clock_hz);
        libm::floor(steps) as u32
    }

    /// Programs the peak frequency deviation in Hz and stores it as the
    /// target for future recomputation on frequency changes.
    pub fn set_deviation(&mut self, deviation_hz: u32) -> Result<(), Error> {
        let steps = self.calculate_deviation(deviation_hz);

        #[cfg(feature = "log")]
        log::debug!("si4063: set deviation {deviation_hz} Hz -> {steps} steps");

        self.set_property(
            GROUP_MODEM,
            MODEM_FREQ_DEV,
            &[(steps >> 16) as u8, (steps >> 8) as u8, steps as u8],
        )?;
        self.deviation_hz = deviation_hz;
        Ok(())
    }

    /// Nudges the carrier by `offset` synthesizer steps via
    /// MODEM_FREQ_OFFSET. This is the per-symbol primitive of the 4FSK
    /// encoder.
    pub fn set_frequency_offset(&mut self, offset: u16) -> Result<(), Error> {
        let bytes = offset.to_be_bytes();
        self.set_property(GROUP_MODEM, MODEM_FREQ_OFFSET, &bytes)
    }

    /// Updates the stored reference clock.
    ///
    /// Rejects values outside the supported range (both 26 MHz and
    /// 30 MHz are exclusive bounds) with [`Error::InvalidParameter`]
    /// before any bus traffic. All PLL math depends on this value, so
    /// callers must re-issue [`set_frequency`](Si4063::set_frequency)
    /// and [`set_deviation`](Si4063::set_deviation) afterwards.
    pub fn set_reference_clock(&mut self, clock_hz: u32) -> Result<(), Error> {
        if clock_hz > MIN_CLOCK_HZ && clock_hz < MAX_CLOCK_HZ {
            self.clock_hz = clock_hz;
            Ok(())
        } else {
            Err(Error::InvalidParameter)
        }
    }

    /// Sets the transmit power level; values above 127 are masked down.
    pub fn set_power(&mut self, power: u8) -> Result<(), Error> {
        #[cfg(feature = "log")]
        log::debug!("si4063: set TX power {power}");

        self.set_property(GROUP_PA, PA_PWR_LVL, &[power & 0x7F])
    }

    /// Programs the modulation mode.
    pub fn set_modulation(&mut self, modulation: Modulation) -> Result<(), Error> {
        #[cfg(feature = "log")]
        log::debug!("si4063: set modulation {modulation:?}");

        self.set_property(GROUP_MODEM, MODEM_MOD_TYPE, &[modulation.mod_type()])
    }

    /// Programs the TX NCO for `rate_bps` bits per second.
    ///
    /// MODEM_DATA_RATE is set to ten times the bit rate and TX_NCO_MODE
    /// to the reference clock, as the datasheet recommends for rates up
    /// to 200 kbps (the NCO downsamples by ten).
    pub fn set_data_rate(&mut self, rate_bps: u32) -> Result<(), Error> {
        let rate = rate_bps * 10;
        let clock = self.clock_hz;
        self.set_property(
            GROUP_MODEM,
            MODEM_DATA_RATE,
            &[
                (rate >> 16) as u8,
                (rate >> 8) as u8,
                rate as u8,
                (clock >> 24) as u8,
                (clock >> 16) as u8,
                (clock >> 8) as u8,
                clock as u8,
            ],
        )
    }

    /// Writes a raw 24-bit MODEM_DATA_RATE value (GFSK filtering only).
    pub fn configure_data_rate(&mut self, data_rate: u32) -> Result<(), Error> {
        self.set_property(
            GROUP_MODEM,
            MODEM_DATA_RATE,
            &[
                (data_rate >> 16) as u8,
                (data_rate >> 8) as u8,
                data_rate as u8,
            ],
        )
    }

    // ------------------------------------------------------------------
    // FIFO TX engine
    // ------------------------------------------------------------------

    /// Reads the interrupt status, clearing the latched FIFO-underflow
    /// flag, and reports whether it was pending.
    ///
    /// An underflow is not itself a hard failure; it signals that the
    /// buffered path is not being topped up fast enough.
    pub fn check_and_clear_fifo_underflow(&mut self) -> Result<bool, Error> {
        self.send_command(&Command::ClearFifoUnderflow)?;
        let mut response = [0u8; 7];
        self.read_response(&mut response)?;
        Ok(response[6] & CHIP_PEND_FIFO_UNDERFLOW != 0)
    }

    /// Resets the transmit FIFO.
    pub fn clear_fifo(&mut self) -> Result<(), Error> {
        self.send_command(&Command::ResetTxFifo)?;
        self.wait_for_cts()
    }

    /// Starts a buffered transmission of `data`.
    ///
    /// Clears any latched underflow and the FIFO, loads up to one FIFO
    /// depth of `data`, and issues START_TX with the total length and a
    /// return-to-sleep on completion.
    ///
    /// # Returns
    /// The number of bytes actually queued. When `data` is longer than
    /// the FIFO, the caller is responsible for topping the FIFO up as the
    /// chip drains it.
    pub fn start_tx(&mut self, data: &[u8]) -> Result<usize, Error> {
        let total_length = u16::try_from(data.len()).map_err(|_| Error::InvalidParameter)?;

        let _ = self.check_and_clear_fifo_underflow()?;
        self.clear_fifo()?;

        let queued = data.len().min(TX_FIFO_DEPTH);
        self.send_command(&Command::WriteTxFifo(&data[..queued]))?;

        self.send_command(&Command::StartTx { total_length })?;
        self.wait_for_cts()?;

        Ok(queued)
    }

    /// Polls the device state once per millisecond until the chip leaves
    /// the transmitting states, for at most `timeout_ms` polls.
    ///
    /// On timeout the chip is forced back to sleep and
    /// [`Error::TxTimeout`] is returned; the transmission is abandoned,
    /// not retried.
    pub fn wait_for_tx_complete(&mut self, timeout_ms: u32) -> Result<(), Error> {
        let _ = self.check_and_clear_fifo_underflow()?;
        self.send_command(&Command::ClearInterrupts)?;
        self.wait_for_cts()?;

        for _ in 0..timeout_ms {
            if let Some(state) = self.device_state()? {
                if state.is_inactive() {
                    return Ok(());
                }
            }
            self.delay.delay_ms(1);
        }

        self.wait_for_cts()?;
        self.disable_carrier()?;
        self.wait_for_cts()?;
        Err(Error::TxTimeout)
    }

    // ------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------

    /// Pulses the shutdown line to reset the chip.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.sdn.set_low().map_err(|_| Error::Gpio)?;
        self.delay.delay_us(50);
        self.wait_for_cts()?;
        self.sdn.set_high().map_err(|_| Error::Gpio)?;
        self.delay.delay_us(20);
        self.sdn.set_low().map_err(|_| Error::Gpio)?;
        self.delay.delay_us(50);
        Ok(())
    }

    /// Boots the chip with the stored reference clock as a TCXO source.
    ///
    /// A missing clear-to-send after the boot command surfaces as
    /// [`Error::PowerUpFailure`]; the caller decides whether to retry.
    pub fn power_up(&mut self) -> Result<(), Error> {
        self.send_command(&Command::PowerUp {
            xo_freq_hz: self.clock_hz,
        })?;
        self.wait_for_cts().map_err(|_| Error::PowerUpFailure)
    }

    /// Reads the chip's part number (0x4063 on matching silicon).
    pub fn part_info(&mut self) -> Result<u16, Error> {
        self.send_command(&Command::PartInfo)?;
        let mut response = [0u8; 8];
        self.read_response(&mut response)?;
        Ok(u16::from_be_bytes([response[1], response[2]]))
    }

    /// Full bring-up: reset, power-up handshake, part-number readout,
    /// RF property configuration, then GPIO/clock configuration.
    ///
    /// Only after this returns `Ok` is the driver considered configured;
    /// commands issued beforehand assume a powered, selected chip and are
    /// otherwise undefined.
    pub fn configure(
        &mut self,
        chip: &ChipParameters,
        radio: &RadioParameters,
    ) -> Result<(), Error> {
        self.reset()?;
        self.power_up()?;

        let part = self.part_info()?;
        #[cfg(feature = "log")]
        log::info!("si4063: detected part number {part:#06x}");
        #[cfg(not(feature = "log"))]
        let _ = part;

        self.configure_rf(radio)?;
        self.configure_chip(chip)
    }

    /// Programs the GPIO pin mapping and drive strength, then adopts the
    /// supplied reference clock.
    ///
    /// An out-of-range clock keeps the previous value, so a board wired
    /// for the default 26 MHz TCXO keeps working when the parameter block
    /// repeats that default.
    pub fn configure_chip(&mut self, chip: &ChipParameters) -> Result<(), Error> {
        self.send_command(&Command::GpioPinCfg {
            gpio: [chip.gpio0, chip.gpio1, chip.gpio2, chip.gpio3],
            drive_strength: chip.drive_strength,
        })?;

        if self.set_reference_clock(chip.clock_hz).is_err() {
            #[cfg(feature = "log")]
            log::warn!(
                "si4063: reference clock {} Hz unsupported, keeping {} Hz",
                chip.clock_hz,
                self.clock_hz
            );
        }
        Ok(())
    }

    /// Programs the fixed RF property block and the caller's radio
    /// parameters, and derives the 4FSK symbol hold from the configured
    /// bit rate. Rejects a zero bit rate before any bus traffic.
    pub fn configure_rf(&mut self, radio: &RadioParameters) -> Result<(), Error> {
        if radio.rate_bps == 0 {
            return Err(Error::InvalidParameter);
        }

        // Crystal tuning value determined for DFM17 radiosondes.
        self.set_property(GROUP_GLOBAL, GLOBAL_XO_TUNE, &[0x62])?;
        // No clock output needed.
        self.set_property(GROUP_GLOBAL, GLOBAL_CLK_CFG, &[0x00])?;
        // Reserved bit, fast sequencer mode, 129-byte FIFO,
        // high-performance mode.
        self.set_property(GROUP_GLOBAL, GLOBAL_CONFIG, &[0x40 | 0x20 | 0x10])?;
        // Disable all hardware interrupts.
        self.set_property(GROUP_INT_CTL, INT_CTL_ENABLE, &[0x00])?;
        // Disable all four fast-response registers.
        self.set_property(GROUP_FRR_CTL, FRR_CTL_A_MODE, &[0x00, 0x00, 0x00, 0x00])?;
        // No preamble; only the synchronous (GFSK) path would use one.
        self.set_property(GROUP_PREAMBLE, PREAMBLE_TX_LENGTH, &[0x00])?;
        // Sync word is not transmitted.
        self.set_property(GROUP_SYNC, SYNC_CONFIG, &[0x80])?;
        // Complementary drive signals, 50% duty cycle (high-power
        // setting; 0xC0 would select single-ended 25% duty).
        self.set_property(GROUP_PA, PA_BIAS_CLKDUTY, &[0x00])?;
        // Errata workaround: with preamble and sync word both skipped,
        // FIFO data corrupts unless CRC_START triggers the packet
        // handler. No CRC is transmitted unless a FIELD config enables
        // one.
        self.set_property(GROUP_PKT, PKT_FIELD_1_CRC_CONFIG, &[0x80])?;

        self.configure_data_rate(radio.data_rate)?;
        self.set_frequency_offset(radio.offset)?;
        self.set_deviation(radio.deviation_hz)?;
        self.set_modulation(radio.modulation)?;
        self.set_data_rate(radio.rate_bps)?;
        self.set_power(radio.power)?;
        self.set_frequency(radio.frequency_hz)?;

        self.symbol_period_ms = crate::modulation::symbol_period_ms(radio.rate_bps);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Expectation scripting shared by the driver, modulation and CW
    //! tests. Each helper appends the SPI and NSEL transactions one bus
    //! operation produces.

    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    use super::Si4063;

    pub(crate) type MockDriver = Si4063<SpiMock<u8>, PinMock, PinMock, NoopDelay>;

    #[derive(Default)]
    pub(crate) struct Script {
        pub spi: Vec<SpiTransaction<u8>>,
        pub nsel: Vec<PinTransaction>,
        pub sdn: Vec<PinTransaction>,
    }

    impl Script {
        pub fn new() -> Self {
            Self::default()
        }

        /// One clear-to-send poll answered with the ready sentinel.
        pub fn cts(&mut self) {
            self.nsel.push(PinTransaction::set(PinState::Low));
            self.spi.push(SpiTransaction::write_vec(vec![0x44]));
            self.spi.push(SpiTransaction::read_vec(vec![0xFF]));
            self.spi.push(SpiTransaction::flush());
            self.nsel.push(PinTransaction::set(PinState::High));
        }

        /// One clear-to-send poll answered not-ready.
        pub fn cts_busy(&mut self) {
            self.nsel.push(PinTransaction::set(PinState::Low));
            self.spi.push(SpiTransaction::write_vec(vec![0x44]));
            self.spi.push(SpiTransaction::read_vec(vec![0x00]));
            self.spi.push(SpiTransaction::flush());
            self.nsel.push(PinTransaction::set(PinState::High));
        }

        /// A command frame written after a successful handshake.
        pub fn command(&mut self, frame: &[u8]) {
            self.cts();
            self.raw_command(frame);
        }

        /// A command frame written with no preceding handshake.
        pub fn raw_command(&mut self, frame: &[u8]) {
            self.nsel.push(PinTransaction::set(PinState::Low));
            self.spi.push(SpiTransaction::write_vec(frame.to_vec()));
            self.spi.push(SpiTransaction::flush());
            self.nsel.push(PinTransaction::set(PinState::High));
        }

        /// A response readout: ready poll, then the data bytes stream out
        /// within the same selected transaction.
        pub fn response(&mut self, data: &[u8]) {
            self.nsel.push(PinTransaction::set(PinState::Low));
            self.spi.push(SpiTransaction::write_vec(vec![0x44]));
            self.spi.push(SpiTransaction::read_vec(vec![0xFF]));
            self.spi.push(SpiTransaction::read_vec(data.to_vec()));
            self.spi.push(SpiTransaction::flush());
            self.nsel.push(PinTransaction::set(PinState::High));
        }

        pub fn build(self) -> MockDriver {
            Si4063::new(
                SpiMock::new(&self.spi),
                PinMock::new(&self.nsel),
                PinMock::new(&self.sdn),
                NoopDelay::new(),
            )
        }
    }

    /// Verifies that every scripted transaction was consumed.
    pub(crate) fn finish(driver: MockDriver) {
        let (mut spi, mut nsel, mut sdn, _) = driver.release();
        spi.done();
        nsel.done();
        sdn.done();
    }
}
