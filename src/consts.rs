//! Constants for the Si4063 command protocol and the modulation layer.
//!
//! This module collects the wire-level constants shared by the command
//! encoder, the bus transport and the modulation encoder: property group
//! and index numbers, the clear-to-send handshake parameters, FIFO sizing
//! and the 4FSK symbol mapping.
//!
//! Property groups and indices follow the Si406x API documentation; only
//! the properties this driver actually programs are listed.

/// Byte returned by the READ_CMD_BUFF poll when the chip's command
/// processor is ready to accept a new command.
pub const CTS_READY: u8 = 0xFF;

/// Maximum number of clear-to-send polls before a command is abandoned.
pub const CTS_POLL_BUDGET: u32 = 65_535;

/// Pacing between clear-to-send polls, in microseconds.
///
/// Together with [`CTS_POLL_BUDGET`] this bounds the handshake at roughly
/// 655 ms independent of per-iteration bus latency.
pub const CTS_POLL_INTERVAL_US: u32 = 10;

/// Depth of the chip's transmit FIFO reachable in a single fill.
pub const TX_FIFO_DEPTH: usize = 64;

/// Capacity of an encoded command frame: one opcode byte plus the largest
/// payload (a full FIFO write).
pub const FRAME_CAPACITY: usize = 1 + TX_FIFO_DEPTH;

/// Frequency-offset step per 4FSK symbol, in synthesizer units.
pub const FSK4_OFFSET_STEP: u16 = 22;

/// Training byte repeated by the 4FSK preamble (symbols 0,1,2,3).
pub const FSK4_TRAINING_BYTE: u8 = 0x1B;

/// Default reference clock after construction, in Hz.
pub const DEFAULT_CLOCK_HZ: u32 = 26_000_000;

/// Default carrier frequency after construction, in Hz.
pub const DEFAULT_FREQUENCY_HZ: u32 = 434_000_000;

/// Default symbol rate after construction, in bits per second.
pub const DEFAULT_RATE_BPS: u32 = 100;

/// Lower bound (exclusive) of the supported reference clock range, in Hz.
pub const MIN_CLOCK_HZ: u32 = 26_000_000;

/// Upper bound (exclusive) of the supported reference clock range, in Hz.
pub const MAX_CLOCK_HZ: u32 = 30_000_000;

/// GLOBAL property group.
pub const GROUP_GLOBAL: u8 = 0x00;
/// INT_CTL property group.
pub const GROUP_INT_CTL: u8 = 0x01;
/// FRR_CTL property group.
pub const GROUP_FRR_CTL: u8 = 0x02;
/// PREAMBLE property group.
pub const GROUP_PREAMBLE: u8 = 0x10;
/// SYNC property group.
pub const GROUP_SYNC: u8 = 0x11;
/// PKT property group.
pub const GROUP_PKT: u8 = 0x12;
/// MODEM property group.
pub const GROUP_MODEM: u8 = 0x20;
/// PA property group.
pub const GROUP_PA: u8 = 0x22;
/// FREQ_CONTROL property group.
pub const GROUP_FREQ_CONTROL: u8 = 0x40;

/// GLOBAL_XO_TUNE: crystal oscillator capacitor-bank tuning.
pub const GLOBAL_XO_TUNE: u8 = 0x00;
/// GLOBAL_CLK_CFG: clock output configuration.
pub const GLOBAL_CLK_CFG: u8 = 0x01;
/// GLOBAL_CONFIG: sequencer mode, FIFO layout, performance mode.
pub const GLOBAL_CONFIG: u8 = 0x03;
/// INT_CTL_ENABLE: hardware interrupt enables.
pub const INT_CTL_ENABLE: u8 = 0x00;
/// FRR_CTL_A_MODE: first of the four fast-response register modes.
pub const FRR_CTL_A_MODE: u8 = 0x00;
/// PREAMBLE_TX_LENGTH: transmitted preamble length (packet mode only).
pub const PREAMBLE_TX_LENGTH: u8 = 0x00;
/// SYNC_CONFIG: sync word configuration (packet mode only).
pub const SYNC_CONFIG: u8 = 0x00;
/// PKT_FIELD_1_CRC_CONFIG: CRC engine control for packet field 1.
pub const PKT_FIELD_1_CRC_CONFIG: u8 = 0x10;
/// MODEM_MOD_TYPE: modulation type and modulation source.
pub const MODEM_MOD_TYPE: u8 = 0x00;
/// MODEM_DATA_RATE: 24-bit data rate used by the TX NCO.
pub const MODEM_DATA_RATE: u8 = 0x03;
/// MODEM_FREQ_DEV: 24-bit peak frequency deviation.
pub const MODEM_FREQ_DEV: u8 = 0x0A;
/// MODEM_FREQ_OFFSET: 16-bit direct frequency nudge.
pub const MODEM_FREQ_OFFSET: u8 = 0x0D;
/// MODEM_CLKGEN_BAND: synthesizer band and prescaler selection.
pub const MODEM_CLKGEN_BAND: u8 = 0x51;
/// PA_PWR_LVL: power amplifier level, 0x00..=0x7F.
pub const PA_PWR_LVL: u8 = 0x01;
/// PA_BIAS_CLKDUTY: PA bias and clock duty cycle.
pub const PA_BIAS_CLKDUTY: u8 = 0x02;
/// FREQ_CONTROL_INTE: fractional-N PLL integer divide number; the five
/// following properties hold the 24-bit fraction and the channel step.
pub const FREQ_CONTROL_INTE: u8 = 0x00;
