//! GPIO resource manager
//!
//! Direction and level control, peripheral function muxing, and the per-pin
//! edge-interrupt subscription table together with its ISR dispatch routine.
//!
//! Every operation resolves its pin through the codec first and
//! pattern-matches on the resulting layout; interrupt configuration is only
//! possible on pins that resolve to the interrupt-capable layout. The
//! subscription table is a fixed-size array sized by the hardware fact of
//! 16 interrupt lines; it is written by [`configure_interrupt`] (with the
//! line's enable bit down, so the write can never race its own ISR) and read
//! by the dispatch routine.

use lodestone_hal::gpio::{InputPin, OutputPin};

use crate::board;
use crate::pins::{self, PinId, PortAccess, IRQ_LINES, PINS_PER_PORT};
use crate::regs::IrqPortRegs;

pub use lodestone_hal::gpio::{Direction, Edge, Level, PinIsrHandler};

/// Errors from GPIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// The identifier does not resolve to any port group.
    InvalidPin,
    /// Interrupt configuration was requested on a pin whose port group has
    /// no interrupt registers.
    NoInterrupt,
    /// Both-edge triggering was requested; each line latches exactly one
    /// polarity on this family.
    BothEdges,
}

/// Opaque callback argument carried through the subscription table.
///
/// The raw pointer is only ever handed back to the callback it was
/// registered with; the table itself never dereferences it.
#[derive(Clone, Copy)]
struct IsrArg(*mut ());

unsafe impl Send for IsrArg {}

#[derive(Clone, Copy)]
struct IsrEntry {
    handler: PinIsrHandler,
    arg: IsrArg,
}

/// Interrupt subscription table, one slot per interrupt line.
///
/// Capacity is a compile-time hardware fact: two interrupt-capable port
/// groups of eight lines each.
static PIN_ISR: spin::Mutex<[Option<IsrEntry>; IRQ_LINES]> = spin::Mutex::new([None; IRQ_LINES]);

/// Configure a pin as plain input or output.
///
/// The output latch is cleared in either direction so a pin switched to
/// output does not replay a stale level.
pub fn configure(pin: PinId, dir: Direction) -> Result<(), GpioError> {
    let port = pins::resolve(pin).ok_or(GpioError::InvalidPin)?;
    let mask = pin.mask();

    match dir {
        Direction::Out => port.dir().set_bits(mask),
        Direction::In => port.dir().clear_bits(mask),
    }
    port.output().clear_bits(mask);

    Ok(())
}

/// Configure a pin for edge interrupts and register its callback.
///
/// Fails on pins without interrupt capability and on [`Edge::Both`], which
/// this family cannot latch. On success the line's enable bit is dropped
/// before anything else changes, so a half-written configuration can never
/// fire, and re-raised last.
pub fn configure_interrupt(
    pin: PinId,
    dir: Direction,
    edge: Edge,
    handler: PinIsrHandler,
    arg: *mut (),
) -> Result<(), GpioError> {
    let port = match pins::resolve(pin).ok_or(GpioError::InvalidPin)? {
        PortAccess::Irq(p) => p,
        PortAccess::Plain(_) => return Err(GpioError::NoInterrupt),
    };
    if edge == Edge::Both {
        return Err(GpioError::BothEdges);
    }
    // Resolution above guarantees the pin has a line.
    let line = pins::irq_line(pin).ok_or(GpioError::NoInterrupt)?;
    let mask = pin.mask();

    // Quiesce the line while reconfiguring.
    port.irq_enable.clear_bits(mask);

    configure(pin, dir)?;

    PIN_ISR.lock()[line] = Some(IsrEntry {
        handler,
        arg: IsrArg(arg),
    });

    if edge == Edge::Falling {
        port.edge_select.set_bits(mask);
    } else {
        port.edge_select.clear_bits(mask);
    }

    // Drop anything latched while the line was being set up, then arm it.
    port.irq_flag.clear_bits(mask);
    enable_interrupt(pin);

    Ok(())
}

/// Unmask a pin's interrupt line.
///
/// Idempotent; a no-op on pins without interrupt capability.
pub fn enable_interrupt(pin: PinId) {
    if let Some(port) = pins::irq_port(pin) {
        port.irq_enable.set_bits(pin.mask());
    }
}

/// Mask a pin's interrupt line.
///
/// Idempotent; a no-op on pins without interrupt capability. The
/// subscription entry is left in the table; a masked line never reaches it.
pub fn disable_interrupt(pin: PinId) {
    if let Some(port) = pins::irq_port(pin) {
        port.irq_enable.clear_bits(pin.mask());
    }
}

/// Hand a pin to its attached peripheral block, or reclaim it for GPIO.
///
/// No effect on invalid identifiers.
pub fn set_peripheral_function(pin: PinId, enabled: bool) {
    if let Some(port) = pins::resolve(pin) {
        if enabled {
            port.select().set_bits(pin.mask());
        } else {
            port.select().clear_bits(pin.mask());
        }
    }
}

/// Observed logical level of a pin.
///
/// A pin configured as output is read back from the output latch: the input
/// latch of this family does not reliably reflect a pin the chip itself
/// drives, so the driven value is the meaningful one.
pub fn read(pin: PinId) -> Result<Level, GpioError> {
    let port = pins::resolve(pin).ok_or(GpioError::InvalidPin)?;
    let mask = pin.mask();

    let raw = if port.dir().read() & mask != 0 {
        port.output().read()
    } else {
        port.input().read()
    };
    Ok(Level::from(raw & mask != 0))
}

/// Set a pin's output latch bit. No effect on invalid identifiers.
pub fn set(pin: PinId) {
    if let Some(port) = pins::resolve(pin) {
        port.output().set_bits(pin.mask());
    }
}

/// Clear a pin's output latch bit. No effect on invalid identifiers.
pub fn clear(pin: PinId) {
    if let Some(port) = pins::resolve(pin) {
        port.output().clear_bits(pin.mask());
    }
}

/// Toggle a pin's output latch bit. No effect on invalid identifiers.
pub fn toggle(pin: PinId) {
    if let Some(port) = pins::resolve(pin) {
        port.output().toggle_bits(pin.mask());
    }
}

/// Drive a pin's output latch to `level`. No effect on invalid identifiers.
pub fn write(pin: PinId, level: Level) {
    match level {
        Level::High => set(pin),
        Level::Low => clear(pin),
    }
}

/// Service every armed, pending line of one port group.
///
/// Fixed dispatch order: ascending bit position. Each pending flag is
/// cleared *before* its callback runs: the interrupts are edge triggered,
/// so acknowledging first prevents infinite re-entry when a callback is
/// slow. A pending line with no registered callback is a checked no-op: the
/// flag is still cleared (the line would otherwise re-fire forever), the
/// callback invocation is skipped.
fn dispatch(port: &IrqPortRegs, line_base: usize) {
    for bit in 0..PINS_PER_PORT {
        let mask = 1u8 << bit;
        if port.irq_enable.read() & mask != 0 && port.irq_flag.read() & mask != 0 {
            port.irq_flag.clear_bits(mask);
            let entry = PIN_ISR.lock()[line_base + bit];
            match entry {
                Some(entry) => (entry.handler)(entry.arg.0),
                None => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("gpio: pending line {} has no handler", line_base + bit);
                }
            }
        }
    }
}

/// ISR entry point for port group P1.
///
/// The platform's vector table routes the P1 interrupt here.
pub fn isr_port1() {
    if let Some(port) = board::get().and_then(|b| b.irq_ports[0]) {
        dispatch(port, 0);
    }
}

/// ISR entry point for port group P2.
pub fn isr_port2() {
    if let Some(port) = board::get().and_then(|b| b.irq_ports[1]) {
        dispatch(port, PINS_PER_PORT);
    }
}

/// An output pin handle implementing the HAL trait.
///
/// Constructing one performs [`configure`], so the handle always refers to
/// a validated identifier and the trait methods are infallible.
pub struct Output {
    pin: PinId,
}

impl Output {
    pub fn new(pin: PinId) -> Result<Self, GpioError> {
        configure(pin, Direction::Out)?;
        Ok(Output { pin })
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }
}

impl OutputPin for Output {
    fn set_high(&mut self) {
        set(self.pin);
    }

    fn set_low(&mut self) {
        clear(self.pin);
    }

    fn toggle(&mut self) {
        toggle(self.pin);
    }

    fn is_set_high(&self) -> bool {
        matches!(read(self.pin), Ok(Level::High))
    }
}

/// An input pin handle implementing the HAL trait.
pub struct Input {
    pin: PinId,
}

impl Input {
    pub fn new(pin: PinId) -> Result<Self, GpioError> {
        configure(pin, Direction::In)?;
        Ok(Input { pin })
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }
}

impl InputPin for Input {
    fn is_high(&self) -> bool {
        matches!(read(self.pin), Ok(Level::High))
    }
}
