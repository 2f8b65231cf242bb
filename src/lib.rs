//! # si4063
//!
//! A portable, no_std Rust driver for the Silicon Labs Si4063 sub-GHz
//! transmitter, aimed at battery-powered telemetry beacons that modulate
//! 4-level FSK (e.g. Horus-style telemetry) or a gated carrier (CW/Morse
//! identification).
//!
//! This driver implements the full command-mode surface the chip exposes:
//! - opcode-framed SPI commands with the chip's clear-to-send handshake
//! - fractional-N PLL programming from an arbitrary target frequency in Hz
//! - frequency-deviation and per-symbol frequency-offset programming
//! - the TX FIFO path with underflow detection and completion polling
//! - direct (async) modulation: 4FSK symbol stepping and carrier gating
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` support (used by the test suite) |
//! | `defmt-0-3` | Derives `defmt::Format` on public types |
//! | `log`       | Emits `log` records for frequency/power programming |
//!
//! ## Usage
//!
//! ```ignore
//! use si4063::driver::{ChipParameters, Modulation, RadioParameters, Si4063};
//!
//! let mut radio = Si4063::new(spi, nsel, sdn, delay);
//! radio.configure(&chip_parameters, &radio_parameters)?;
//! radio.enable_carrier()?;
//! radio.preamble(8)?;
//! radio.write_symbols(&packet)?;
//! radio.idle()?;
//! ```
//!
//! All operations are synchronous and blocking; symbol timing is produced
//! by busy-holds on the supplied [`embedded_hal::delay::DelayNs`]
//! implementation, so the accuracy of the on-air signal is bounded by the
//! accuracy of that delay source.
//!
//! ## Design Notes
//!
//! This crate does **not** include packet framing, CRC computation, or a
//! receive path. It focuses solely on the transceiver command protocol
//! and symbol-level modulation; sentence assembly, callsign generation and
//! the outer send loop belong to the application.
//!
//! The driver owns the SPI bus, the chip-select (NSEL) and shutdown (SDN)
//! lines, and the delay source; exclusive access through `&mut self` is
//! what makes every command/response sequence a single critical section.
//! In a multi-threaded port, wrap the whole driver in one mutex.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
pub use heapless;

pub mod command;
pub mod consts;
pub mod cw;
pub mod driver;
pub mod error;
pub mod modulation;
