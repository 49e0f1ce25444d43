//! Lodestone Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits and shared vocabulary
//! types implemented by chip-specific HALs. Radio and transport drivers are
//! written against these traits so the same driver code runs on every
//! supported chip family.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Drivers (radio, transport, sensors)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lodestone-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lodestone-hal-msp430f5 (chip layer)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`spi::SpiBus`] - SPI bus transfers within an acquired session
//! - [`uart::UartTx`] - Polled serial transmission
//!
//! Reception on serial channels and edge detection on pins are callback
//! driven at this level, so the RX side is expressed through the
//! [`uart::UartRxHandler`] and [`gpio::PinIsrHandler`] types rather than a
//! blocking read trait.

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod spi;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, OutputPin};
pub use spi::SpiBus;
pub use uart::UartTx;
