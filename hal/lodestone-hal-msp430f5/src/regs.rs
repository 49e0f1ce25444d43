//! Register catalog types for the MSP430F5 family
//!
//! The chip exposes two physically distinct I/O port layouts: the
//! interrupt-capable ports (P1 and P2) carry edge-select, interrupt-enable
//! and interrupt-flag registers in addition to the data registers, while the
//! remaining ports carry the data registers only. Both layouts, and the USCI
//! serial block shared by the SPI and UART personalities, are described here
//! as `repr(C)` blocks of volatile byte registers.
//!
//! This crate never bakes in register addresses. On hardware the board
//! support crate builds `&'static` references to these blocks from its
//! link-time memory map and installs them through [`crate::board::install`];
//! host tests build them from plain in-memory instances instead.

use core::cell::UnsafeCell;

use bitflags::bitflags;

/// An 8-bit volatile hardware register.
#[repr(transparent)]
pub struct Reg8(UnsafeCell<u8>);

// Registers are byte-atomic on this family and every access goes through
// volatile reads/writes, so sharing references across the main flow and ISRs
// is sound under the single-core execution model.
unsafe impl Sync for Reg8 {}

impl Reg8 {
    /// A register holding `value`, for catalogs that live in normal memory.
    pub const fn new(value: u8) -> Self {
        Reg8(UnsafeCell::new(value))
    }

    /// Volatile read.
    #[inline]
    pub fn read(&self) -> u8 {
        unsafe { self.0.get().read_volatile() }
    }

    /// Volatile write.
    #[inline]
    pub fn write(&self, value: u8) {
        unsafe { self.0.get().write_volatile(value) }
    }

    /// Read-modify-write.
    #[inline]
    pub fn modify(&self, f: impl FnOnce(u8) -> u8) {
        self.write(f(self.read()));
    }

    /// Set the bits in `mask`, leaving the rest untouched.
    #[inline]
    pub fn set_bits(&self, mask: u8) {
        self.modify(|v| v | mask);
    }

    /// Clear the bits in `mask`, leaving the rest untouched.
    #[inline]
    pub fn clear_bits(&self, mask: u8) {
        self.modify(|v| v & !mask);
    }

    /// Toggle the bits in `mask`, leaving the rest untouched.
    #[inline]
    pub fn toggle_bits(&self, mask: u8) {
        self.modify(|v| v ^ mask);
    }

    /// Busy-poll until at least one bit of `mask` reads set.
    ///
    /// This is the single blocking primitive of the crate: transfer lengths
    /// are short and DMA is out of scope, so waits are bounded by electrical
    /// transfer time only. There is no timeout; a stuck peripheral hangs the
    /// caller.
    #[inline]
    pub fn wait_set(&self, mask: u8) {
        while self.read() & mask == 0 {
            core::hint::spin_loop();
        }
    }

    /// Busy-poll until every bit of `mask` reads clear.
    #[inline]
    pub fn wait_clear(&self, mask: u8) {
        while self.read() & mask != 0 {
            core::hint::spin_loop();
        }
    }
}

/// A 16-bit volatile hardware register.
#[repr(transparent)]
pub struct Reg16(UnsafeCell<u16>);

unsafe impl Sync for Reg16 {}

impl Reg16 {
    pub const fn new(value: u16) -> Self {
        Reg16(UnsafeCell::new(value))
    }

    #[inline]
    pub fn read(&self) -> u16 {
        unsafe { self.0.get().read_volatile() }
    }

    #[inline]
    pub fn write(&self, value: u16) {
        unsafe { self.0.get().write_volatile(value) }
    }
}

/// I/O port without interrupt capability (P3 and up).
#[repr(C)]
pub struct PortRegs {
    /// Input latch.
    pub input: Reg8,
    _r0: Reg8,
    /// Output latch.
    pub output: Reg8,
    _r1: Reg8,
    /// Pin direction, 1 = output.
    pub dir: Reg8,
    _r2: Reg8,
    /// Pull resistor enable.
    pub pull_enable: Reg8,
    _r3: Reg8,
    /// Drive strength select.
    pub drive_strength: Reg8,
    _r4: Reg8,
    /// Peripheral function select, 1 = pin driven by the attached module.
    pub select: Reg8,
}

impl PortRegs {
    /// A zero-initialised block for host-side catalogs.
    pub const fn new() -> Self {
        PortRegs {
            input: Reg8::new(0),
            _r0: Reg8::new(0),
            output: Reg8::new(0),
            _r1: Reg8::new(0),
            dir: Reg8::new(0),
            _r2: Reg8::new(0),
            pull_enable: Reg8::new(0),
            _r3: Reg8::new(0),
            drive_strength: Reg8::new(0),
            _r4: Reg8::new(0),
            select: Reg8::new(0),
        }
    }
}

impl Default for PortRegs {
    fn default() -> Self {
        Self::new()
    }
}

/// I/O port with interrupt capability (P1 and P2).
///
/// Same data registers as [`PortRegs`] plus the edge-select, enable and flag
/// registers that back edge-triggered interrupts.
#[repr(C)]
pub struct IrqPortRegs {
    /// Input latch.
    pub input: Reg8,
    _r0: Reg8,
    /// Output latch.
    pub output: Reg8,
    _r1: Reg8,
    /// Pin direction, 1 = output.
    pub dir: Reg8,
    _r2: Reg8,
    /// Pull resistor enable.
    pub pull_enable: Reg8,
    _r3: Reg8,
    /// Drive strength select.
    pub drive_strength: Reg8,
    _r4: Reg8,
    /// Peripheral function select.
    pub select: Reg8,
    _r5: [Reg8; 3],
    /// Interrupt vector word, read by hardware-assisted dispatch (unused
    /// here, the dispatch routine scans the flag register instead).
    pub ivec: Reg16,
    _r6: [Reg8; 8],
    /// Edge select, 0 = rising, 1 = falling.
    pub edge_select: Reg8,
    _r7: Reg8,
    /// Per-bit interrupt enable.
    pub irq_enable: Reg8,
    _r8: Reg8,
    /// Per-bit pending interrupt flag; must be cleared by software.
    pub irq_flag: Reg8,
}

impl IrqPortRegs {
    /// A zero-initialised block for host-side catalogs.
    pub const fn new() -> Self {
        IrqPortRegs {
            input: Reg8::new(0),
            _r0: Reg8::new(0),
            output: Reg8::new(0),
            _r1: Reg8::new(0),
            dir: Reg8::new(0),
            _r2: Reg8::new(0),
            pull_enable: Reg8::new(0),
            _r3: Reg8::new(0),
            drive_strength: Reg8::new(0),
            _r4: Reg8::new(0),
            select: Reg8::new(0),
            _r5: [Reg8::new(0), Reg8::new(0), Reg8::new(0)],
            ivec: Reg16::new(0),
            _r6: [
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
            ],
            edge_select: Reg8::new(0),
            _r7: Reg8::new(0),
            irq_enable: Reg8::new(0),
            _r8: Reg8::new(0),
            irq_flag: Reg8::new(0),
        }
    }
}

impl Default for IrqPortRegs {
    fn default() -> Self {
        Self::new()
    }
}

/// USCI serial block, shared by the SPI and UART personalities.
#[repr(C)]
pub struct UsciRegs {
    /// Control 1: software reset and clock source select.
    pub ctl1: Reg8,
    /// Control 0: protocol mode, polarity, phase, frame format.
    pub ctl0: Reg8,
    _r0: [Reg8; 4],
    /// Baud/bit clock divider, low byte.
    pub br0: Reg8,
    /// Baud/bit clock divider, high byte.
    pub br1: Reg8,
    /// Modulation control.
    pub mctl: Reg8,
    _r1: Reg8,
    /// Status: busy flag and receive error flags.
    pub stat: Reg8,
    _r2: Reg8,
    /// Receive buffer; reading it clears the receive flag and any latched
    /// receive error.
    pub rxbuf: Reg8,
    _r3: Reg8,
    /// Transmit buffer.
    pub txbuf: Reg8,
    _r4: Reg8,
    _r5: [Reg8; 12],
    /// Interrupt enable (RX = bit 0, TX = bit 1).
    pub ie: Reg8,
    /// Interrupt flag (RX = bit 0, TX = bit 1).
    pub ifg: Reg8,
    /// Interrupt vector.
    pub iv: Reg8,
}

impl UsciRegs {
    /// A zero-initialised block for host-side catalogs.
    pub const fn new() -> Self {
        UsciRegs {
            ctl1: Reg8::new(0),
            ctl0: Reg8::new(0),
            _r0: [Reg8::new(0), Reg8::new(0), Reg8::new(0), Reg8::new(0)],
            br0: Reg8::new(0),
            br1: Reg8::new(0),
            mctl: Reg8::new(0),
            _r1: Reg8::new(0),
            stat: Reg8::new(0),
            _r2: Reg8::new(0),
            rxbuf: Reg8::new(0),
            _r3: Reg8::new(0),
            txbuf: Reg8::new(0),
            _r4: Reg8::new(0),
            _r5: [
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
                Reg8::new(0),
            ],
            ie: Reg8::new(0),
            ifg: Reg8::new(0),
            iv: Reg8::new(0),
        }
    }
}

impl Default for UsciRegs {
    fn default() -> Self {
        Self::new()
    }
}

/// CTL1: hold the block in software reset while reconfiguring.
pub const CTL1_SWRST: u8 = 0x01;
/// CTL1: clock source select mask.
pub const CTL1_SSEL_MASK: u8 = 0xc0;
/// CTL1: clock the block from the auxiliary (32.768 kHz) clock.
pub const CTL1_SSEL_AUXCLK: u8 = 0x40;
/// CTL1: clock the block from the sub-main (peripheral) clock.
pub const CTL1_SSEL_SMCLK: u8 = 0xc0;

/// Interrupt flag/enable bit for reception.
pub const USCI_RX_BIT: u8 = 0x01;
/// Interrupt flag/enable bit for transmission readiness.
pub const USCI_TX_BIT: u8 = 0x02;

/// Modulation stage shift within MCTL.
pub const MCTL_BRS_SHIFT: u8 = 1;

bitflags! {
    /// CTL0 bits in the SPI personality.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpiCtl0: u8 {
        /// Synchronous mode (always set for SPI).
        const SYNC = 0x01;
        /// Master mode.
        const MASTER = 0x08;
        /// Most significant bit first.
        const MSB_FIRST = 0x20;
        /// Clock polarity: idle high when set.
        const CKPL = 0x40;
        /// Clock phase select. Inverted relative to the usual CPHA
        /// convention: set means data is captured on the first edge.
        const CKPH = 0x80;
    }
}

bitflags! {
    /// Status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UsciStat: u8 {
        /// Transmit or receive shift register active.
        const BUSY = 0x01;
        /// Break condition detected.
        const BREAK = 0x08;
        /// Parity error.
        const PARITY_ERR = 0x10;
        /// Receive buffer overrun.
        const OVERRUN = 0x20;
        /// Framing error.
        const FRAME_ERR = 0x40;
        /// Internal loopback enabled.
        const LISTEN = 0x80;

        /// Any condition that invalidates a received byte.
        const RX_ERROR = Self::BREAK.bits()
            | Self::PARITY_ERR.bits()
            | Self::OVERRUN.bits()
            | Self::FRAME_ERR.bits();
    }
}
