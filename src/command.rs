//! Command framing for the Si4063 command protocol.
//!
//! Every interaction with the chip is an opcode byte followed by a
//! variable-length payload. Instead of scattering raw byte arrays across
//! call sites, the driver builds a [`Command`] value and encodes it in one
//! place, so the framing is tested once.
//!
//! The SET_PROPERTY payload layout is
//! `[group, count, start_index, value...]`; configuration helpers in
//! [`crate::driver`] all funnel through [`Command::SetProperty`].

use heapless::Vec;

use crate::consts::FRAME_CAPACITY;
use crate::driver::State;

/// PART_INFO: read back the part number.
pub const OPCODE_PART_INFO: u8 = 0x01;
/// POWER_UP: boot the chip into its functional mode.
pub const OPCODE_POWER_UP: u8 = 0x02;
/// SET_PROPERTY: write one or more consecutive properties.
pub const OPCODE_SET_PROPERTY: u8 = 0x11;
/// GPIO_PIN_CFG: configure the general-purpose I/O pins.
pub const OPCODE_GPIO_PIN_CFG: u8 = 0x13;
/// FIFO_INFO: query and optionally reset the FIFOs.
pub const OPCODE_FIFO_INFO: u8 = 0x15;
/// GET_INT_STATUS: read and selectively clear latched interrupt flags.
pub const OPCODE_GET_INT_STATUS: u8 = 0x20;
/// START_TX: start a buffered transmission.
pub const OPCODE_START_TX: u8 = 0x31;
/// REQUEST_DEVICE_STATE: read the current operating state.
pub const OPCODE_REQUEST_DEVICE_STATE: u8 = 0x33;
/// CHANGE_STATE: force an operating-state transition.
pub const OPCODE_CHANGE_STATE: u8 = 0x34;
/// READ_CMD_BUFF: clear-to-send poll and response readout.
pub const OPCODE_READ_CMD_BUFF: u8 = 0x44;
/// WRITE_TX_FIFO: append bytes to the transmit FIFO.
pub const OPCODE_WRITE_TX_FIFO: u8 = 0x66;

/// NIRQ pin mode programmed by [`Command::GpioPinCfg`]: do nothing.
const NIRQ_MODE_NONE: u8 = 0x00;
/// SDO pin mode programmed by [`Command::GpioPinCfg`]: SPI serial data out.
const SDO_MODE_SDO: u8 = 11;

/// Latched-interrupt mask for the FIFO-underflow bit in the CHIP_STATUS
/// pending byte.
pub const CHIP_PEND_FIFO_UNDERFLOW: u8 = 0x20;

/// One command frame, in tagged form.
///
/// [`Command::encode`] produces the exact wire bytes, opcode included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Command<'a> {
    /// Read the part number (8-byte response).
    PartInfo,
    /// Boot the chip with a TCXO reference of the given frequency.
    PowerUp {
        /// Reference oscillator frequency in Hz, encoded big-endian.
        xo_freq_hz: u32,
    },
    /// Write `values` to consecutive properties of `group`, starting at
    /// property index `start`.
    SetProperty {
        /// Property group byte.
        group: u8,
        /// Index of the first property to write.
        start: u8,
        /// One byte per property, at most twelve per the chip's API.
        values: &'a [u8],
    },
    /// Configure the four GPIO pins and the output drive strength. NIRQ
    /// is left unused and SDO carries the SPI data-out signal.
    GpioPinCfg {
        /// Pin modes for GPIO0..GPIO3.
        gpio: [u8; 4],
        /// Output drive strength byte.
        drive_strength: u8,
    },
    /// Reset the transmit FIFO.
    ResetTxFifo,
    /// Read the interrupt status, clearing only the latched
    /// FIFO-underflow flag (7-byte response).
    ClearFifoUnderflow,
    /// Read the interrupt status, clearing all latched flags.
    ClearInterrupts,
    /// Start a buffered transmission on channel 0 of `total_length`
    /// bytes, returning to sleep on completion. The FIFO may hold fewer
    /// bytes than `total_length`; the caller tops it up as it drains.
    StartTx {
        /// Total packet length in bytes, encoded big-endian.
        total_length: u16,
    },
    /// Read the current operating state (1-byte response).
    RequestDeviceState,
    /// Force a transition to the given operating state. Fire-and-forget;
    /// no acknowledgement is read back.
    ChangeState(State),
    /// Append up to one FIFO depth of payload bytes to the transmit FIFO.
    WriteTxFifo(&'a [u8]),
}

impl Command<'_> {
    /// The opcode byte for this command.
    pub fn opcode(&self) -> u8 {
        match self {
            Command::PartInfo => OPCODE_PART_INFO,
            Command::PowerUp { .. } => OPCODE_POWER_UP,
            Command::SetProperty { .. } => OPCODE_SET_PROPERTY,
            Command::GpioPinCfg { .. } => OPCODE_GPIO_PIN_CFG,
            Command::ResetTxFifo => OPCODE_FIFO_INFO,
            Command::ClearFifoUnderflow | Command::ClearInterrupts => OPCODE_GET_INT_STATUS,
            Command::StartTx { .. } => OPCODE_START_TX,
            Command::RequestDeviceState => OPCODE_REQUEST_DEVICE_STATE,
            Command::ChangeState(_) => OPCODE_CHANGE_STATE,
            Command::WriteTxFifo(_) => OPCODE_WRITE_TX_FIFO,
        }
    }

    /// Encodes the full wire frame: opcode byte followed by the payload.
    ///
    /// Payload sizes are bounded by construction ([`Command::WriteTxFifo`]
    /// callers clamp to the FIFO depth), so the frame always fits in
    /// [`FRAME_CAPACITY`] and pushes cannot fail.
    pub fn encode(&self) -> Vec<u8, FRAME_CAPACITY> {
        let mut frame: Vec<u8, FRAME_CAPACITY> = Vec::new();
        let _ = frame.push(self.opcode());
        match *self {
            Command::PartInfo | Command::RequestDeviceState => {}
            Command::PowerUp { xo_freq_hz } => {
                // Boot the main application image with an external TCXO.
                let _ = frame.extend_from_slice(&[0x01, 0x01]);
                let _ = frame.extend_from_slice(&xo_freq_hz.to_be_bytes());
            }
            Command::SetProperty {
                group,
                start,
                values,
            } => {
                let _ = frame.extend_from_slice(&[group, values.len() as u8, start]);
                let _ = frame.extend_from_slice(values);
            }
            Command::GpioPinCfg {
                gpio,
                drive_strength,
            } => {
                let _ = frame.extend_from_slice(&gpio);
                let _ = frame.extend_from_slice(&[NIRQ_MODE_NONE, SDO_MODE_SDO, drive_strength]);
            }
            Command::ResetTxFifo => {
                let _ = frame.push(0x01);
            }
            Command::ClearFifoUnderflow => {
                // Clear only the latched FIFO-underflow flag; everything
                // else stays pending for the caller to inspect.
                let _ = frame.extend_from_slice(&[0xFF, 0xFF, !CHIP_PEND_FIFO_UNDERFLOW]);
            }
            Command::ClearInterrupts => {
                let _ = frame.push(0x00);
            }
            Command::StartTx { total_length } => {
                let _ = frame.push(0x00); // channel
                let _ = frame.push((State::Sleep as u8) << 4);
                let _ = frame.extend_from_slice(&total_length.to_be_bytes());
                let _ = frame.push(0x00); // TX delay
            }
            Command::ChangeState(state) => {
                let _ = frame.push(state as u8);
            }
            Command::WriteTxFifo(data) => {
                let _ = frame.extend_from_slice(data);
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GROUP_MODEM, MODEM_FREQ_OFFSET};

    #[test]
    fn test_power_up_frame_at_26_mhz() {
        let frame = Command::PowerUp {
            xo_freq_hz: 26_000_000,
        }
        .encode();
        assert_eq!(&frame[..], &[0x02, 0x01, 0x01, 0x01, 0x8C, 0xBA, 0x80]);
    }

    #[test]
    fn test_set_property_frame_layout() {
        let frame = Command::SetProperty {
            group: GROUP_MODEM,
            start: MODEM_FREQ_OFFSET,
            values: &[0x00, 0x42],
        }
        .encode();
        assert_eq!(&frame[..], &[0x11, 0x20, 0x02, 0x0D, 0x00, 0x42]);
    }

    #[test]
    fn test_gpio_pin_cfg_frame() {
        let frame = Command::GpioPinCfg {
            gpio: [0x04, 0x02, 0x02, 0x02],
            drive_strength: 0x00,
        }
        .encode();
        assert_eq!(
            &frame[..],
            &[0x13, 0x04, 0x02, 0x02, 0x02, 0x00, 11, 0x00]
        );
    }

    #[test]
    fn test_start_tx_frame_returns_to_sleep_with_total_length() {
        let frame = Command::StartTx { total_length: 300 }.encode();
        assert_eq!(&frame[..], &[0x31, 0x00, 0x10, 0x01, 0x2C, 0x00]);
    }

    #[test]
    fn test_change_state_frame() {
        let frame = Command::ChangeState(State::Tx).encode();
        assert_eq!(&frame[..], &[0x34, 0x07]);
        let frame = Command::ChangeState(State::Sleep).encode();
        assert_eq!(&frame[..], &[0x34, 0x01]);
    }

    #[test]
    fn test_fifo_frames() {
        assert_eq!(&Command::ResetTxFifo.encode()[..], &[0x15, 0x01]);
        let frame = Command::WriteTxFifo(&[0xAA, 0xBB, 0xCC]).encode();
        assert_eq!(&frame[..], &[0x66, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_interrupt_status_frames() {
        assert_eq!(
            &Command::ClearFifoUnderflow.encode()[..],
            &[0x20, 0xFF, 0xFF, 0xDF]
        );
        assert_eq!(&Command::ClearInterrupts.encode()[..], &[0x20, 0x00]);
    }

    #[test]
    fn test_parameterless_frames_are_bare_opcodes() {
        assert_eq!(&Command::PartInfo.encode()[..], &[0x01]);
        assert_eq!(&Command::RequestDeviceState.encode()[..], &[0x33]);
    }
}
