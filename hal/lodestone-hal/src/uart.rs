//! UART serial communication abstractions
//!
//! Transmission at this level is polled, so [`UartTx`] is a blocking trait.
//! Reception is interrupt driven with a single subscriber per channel; the
//! subscriber is expressed through [`UartRxHandler`] rather than a blocking
//! read trait.

/// Callback invoked from interrupt context for every received byte.
///
/// Bytes that arrive with a frame, overrun, parity or break error are
/// discarded by the chip HAL before this callback is considered; the handler
/// only ever sees clean data.
pub type UartRxHandler = fn(arg: *mut (), byte: u8);

/// UART transmitter
///
/// Blocking trait for sending data over a UART channel.
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Returns once every byte has been handed to the transmit shift
    /// register pipeline, which is not necessarily once the last byte has
    /// left the wire.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Block until the transmit pipeline has fully drained
    fn flush(&mut self) -> Result<(), Self::Error>;
}
