//! Pin identifier codec
//!
//! A [`PinId`] packs (port group, bit mask) into one integer so board pin
//! tables stay plain constants. The codec resolves an identifier to exactly
//! one of the two physical port layouts, or to neither when the identifier
//! is invalid; every other module goes through [`resolve`] / [`irq_port`]
//! rather than touching the catalog directly.
//!
//! Which groups are interrupt-capable is a property of the chip family, not
//! of the board: P1 and P2 carry the interrupt registers, P3 through P11 do
//! not. The codec also owns the dense interrupt-line numbering used by the
//! subscription table, so ISR dispatch and subscribe/enable/disable always
//! agree on the index for a given identifier.

use crate::board;
use crate::regs::{IrqPortRegs, PortRegs};

/// Number of pins on each port group.
pub const PINS_PER_PORT: usize = 8;

/// Lowest valid port group number.
pub const FIRST_PORT: u8 = 1;
/// Highest valid port group number.
pub const LAST_PORT: u8 = 11;
/// Number of interrupt-capable port groups (P1 and P2).
pub const IRQ_PORT_COUNT: usize = 2;
/// Number of port groups without interrupt capability (P3..=P11).
pub const PLAIN_PORT_COUNT: usize = 9;
/// Total number of interrupt lines across the interrupt-capable groups.
pub const IRQ_LINES: usize = IRQ_PORT_COUNT * PINS_PER_PORT;

/// Logical pin identifier: port group in the high byte, single-bit mask in
/// the low byte.
///
/// Constructed once as a board constant and never mutated. [`PinId::new`]
/// always produces a well-formed mask; identifiers decoded from raw
/// integers go through [`PinId::from_raw`], which rejects masks with zero
/// or multiple bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(u16);

impl PinId {
    /// Identifier for bit `bit` (0..=7) of port group `group`.
    pub const fn new(group: u8, bit: u8) -> Self {
        PinId(((group as u16) << 8) | (1 << (bit & 0x07)) as u16)
    }

    /// Decode an identifier from its raw integer form.
    ///
    /// Returns `None` when the mask byte does not have exactly one bit set.
    /// Group validity is not checked here; an unknown group simply resolves
    /// to neither layout.
    pub fn from_raw(raw: u16) -> Option<Self> {
        let mask = raw as u8;
        if mask.count_ones() == 1 {
            Some(PinId(raw))
        } else {
            None
        }
    }

    /// Raw integer form.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Port group number (1-based).
    pub const fn group(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Single-bit mask within the port group.
    pub const fn mask(self) -> u8 {
        self.0 as u8
    }

    /// Bit position within the port group (0..=7).
    pub const fn bit(self) -> u8 {
        self.mask().trailing_zeros() as u8
    }
}

/// The physical register layout owning a resolved pin.
#[derive(Clone, Copy)]
pub enum PortAccess {
    /// Interrupt-capable layout (P1, P2).
    Irq(&'static IrqPortRegs),
    /// Plain layout without interrupt registers (P3..=P11).
    Plain(&'static PortRegs),
}

impl PortAccess {
    pub fn input(&self) -> &'static crate::regs::Reg8 {
        match self {
            PortAccess::Irq(p) => &p.input,
            PortAccess::Plain(p) => &p.input,
        }
    }

    pub fn output(&self) -> &'static crate::regs::Reg8 {
        match self {
            PortAccess::Irq(p) => &p.output,
            PortAccess::Plain(p) => &p.output,
        }
    }

    pub fn dir(&self) -> &'static crate::regs::Reg8 {
        match self {
            PortAccess::Irq(p) => &p.dir,
            PortAccess::Plain(p) => &p.dir,
        }
    }

    pub fn select(&self) -> &'static crate::regs::Reg8 {
        match self {
            PortAccess::Irq(p) => &p.select,
            PortAccess::Plain(p) => &p.select,
        }
    }
}

/// Resolve a pin identifier to its physical port layout.
///
/// Exactly one layout matches any valid identifier; `None` means the
/// identifier names an unknown group or a group the board catalog does not
/// populate, and every dependent operation must fail rather than touch
/// hardware.
pub fn resolve(pin: PinId) -> Option<PortAccess> {
    let board = board::get()?;
    match pin.group() {
        g @ 1..=2 => board.irq_ports[(g - 1) as usize].map(PortAccess::Irq),
        g @ 3..=11 => board.plain_ports[(g - 3) as usize].map(PortAccess::Plain),
        _ => None,
    }
}

/// Resolve a pin identifier to its interrupt-capable port, if it has one.
pub fn irq_port(pin: PinId) -> Option<&'static IrqPortRegs> {
    match resolve(pin)? {
        PortAccess::Irq(p) => Some(p),
        PortAccess::Plain(_) => None,
    }
}

/// Dense interrupt-line index for the subscription table.
///
/// Bits of P1 map to `[0, 8)`, bits of P2 to `[8, 16)`. Pins outside the
/// interrupt-capable groups have no line.
pub fn irq_line(pin: PinId) -> Option<usize> {
    match pin.group() {
        g @ 1..=2 => Some(pin.bit() as usize + PINS_PER_PORT * (g - 1) as usize),
        _ => None,
    }
}
