//! SPI bus abstractions
//!
//! Provides the transfer trait implemented by an acquired bus session plus
//! the mode and clock-class vocabulary shared between drivers and chip HALs.
//!
//! Acquisition itself (locking the bus, programming divisor and mode) is a
//! chip-HAL concern; the trait below only covers transfers within a session
//! that is already held.

/// SPI bus transfers within an acquired session
///
/// All operations are busy-polled byte transfers; lengths are expected to be
/// short and there is no DMA at this level.
pub trait SpiBus {
    /// Error type for SPI operations
    type Error;

    /// Write data without keeping the received bytes
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data, transmitting a zero filler byte per received byte
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Full-duplex transfer
    ///
    /// Writes from `write` while reading into `read`. Both buffers must be
    /// the same length.
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error>;
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

/// Requested SPI clock rate class
///
/// Drivers pick one of a small set of rate classes rather than an arbitrary
/// frequency; the chip HAL maps the class onto its clock divider and rejects
/// classes the divider cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiClock {
    /// 100 kHz
    K100,
    /// 400 kHz
    K400,
    /// 1 MHz
    M1,
    /// 5 MHz
    M5,
    /// 10 MHz
    M10,
}

impl SpiClock {
    /// Nominal frequency of the clock class in Hz.
    pub fn hz(self) -> u32 {
        match self {
            SpiClock::K100 => 100_000,
            SpiClock::K400 => 400_000,
            SpiClock::M1 => 1_000_000,
            SpiClock::M5 => 5_000_000,
            SpiClock::M10 => 10_000_000,
        }
    }
}
