//! Error type shared by every fallible operation in this crate.

use thiserror::Error as ThisError;

/// Failures surfaced by the driver.
///
/// No operation retries beyond the fixed polling budgets baked into the
/// clear-to-send and transmit-complete loops; retry and backoff policy
/// belongs to the caller. After a [`Error::CtsTimeout`] the chip state is
/// ambiguous and the caller should re-run
/// [`configure`](crate::driver::Si4063::configure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// The clear-to-send sentinel was never observed within the polling
    /// budget. The in-flight operation was abandoned.
    #[error("timed out waiting for clear-to-send")]
    CtsTimeout,
    /// The chip never left the transmitting state within the allotted
    /// time; it has been forced back to sleep.
    #[error("transmission did not complete in time")]
    TxTimeout,
    /// A parameter was rejected before any bus traffic was issued.
    #[error("parameter out of supported range")]
    InvalidParameter,
    /// The power-up handshake after reset did not complete.
    #[error("power-up handshake failed")]
    PowerUpFailure,
    /// The underlying SPI transfer failed.
    #[error("SPI bus transfer failed")]
    Bus,
    /// Driving the chip-select or shutdown line failed.
    #[error("GPIO line error")]
    Gpio,
}
