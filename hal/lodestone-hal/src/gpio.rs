//! GPIO pin abstractions
//!
//! Provides the shared vocabulary for digital I/O (direction, level, edge)
//! and the traits implemented by chip-specific pin handles. The handles are
//! constructed by the chip HAL from validated pin identifiers, so the trait
//! methods themselves are infallible.

/// Callback invoked from interrupt context when a subscribed pin fires.
///
/// The opaque argument is the one stored alongside the callback at
/// subscription time. The callback runs synchronously inside the ISR, so it
/// must be short and must not block.
pub type PinIsrHandler = fn(arg: *mut ());

/// Direction of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Pin is driven by external circuitry and sampled by the input latch.
    In,
    /// Pin is driven by the output latch.
    Out,
}

/// Logical level of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0.
    Low,
    /// Logic 1.
    High,
}

impl Level {
    /// `true` for [`Level::High`].
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Signal transition that triggers an edge interrupt.
///
/// Not every chip family can latch both polarities on one line; requesting
/// [`Edge::Both`] on such hardware is an unsupported configuration and is
/// reported as an error by the chip HAL, never approximated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low-to-high transition.
    Rising,
    /// High-to-low transition.
    Falling,
    /// Either transition.
    Both,
}

/// Digital output pin
///
/// Implementations manipulate the output latch of an already configured
/// output pin.
pub trait OutputPin {
    /// Drive the pin high (logic 1)
    fn set_high(&mut self);

    /// Drive the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self);

    /// Drive the pin to a specific level
    fn set_level(&mut self, level: Level) {
        match level {
            Level::High => self.set_high(),
            Level::Low => self.set_low(),
        }
    }

    /// Check if the output latch is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the output latch is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input pin
///
/// Implementations sample the input latch of an already configured
/// input pin.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Pin that can be used for both input and output
pub trait IoPin: OutputPin + InputPin {}

// Blanket implementation for types that implement both traits
impl<T: OutputPin + InputPin> IoPin for T {}
