//! SPI bus arbiter
//!
//! Serializes access to each shared bus behind a lock and drives the
//! three-shape polled byte-transfer protocol of the USCI block. A session is
//! scoped: [`acquire`] returns a [`SpiTransaction`] guard, transfers run
//! through the guard, and dropping it places the block back in reset and
//! unlocks the bus on every exit path. There is no way to leak the lock by
//! forgetting a release call.
//!
//! Chip-select framing is plain GPIO: the select pin is driven low before
//! the first byte and, unless the caller asks to keep the device selected,
//! back high after the last one, so multi-transfer framed sequences work
//! without toggling the line between transfers.

use lodestone_hal::spi::SpiBus;

use crate::board;
use crate::gpio;
use crate::pins::PinId;
use crate::regs::{SpiCtl0, UsciStat, CTL1_SSEL_SMCLK, CTL1_SWRST, USCI_RX_BIT, USCI_TX_BIT};

pub use lodestone_hal::spi::{Mode, Phase, Polarity, SpiClock};

/// Fastest clock rate the divider can represent against the peripheral
/// clock. Faster requests are reported as unsupported, never clamped.
pub const MAX_CLOCK_HZ: u32 = 5_000_000;

/// SPI bus instance identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiBusId {
    Spi0,
    Spi1,
}

impl SpiBusId {
    pub(crate) fn index(self) -> usize {
        match self {
            SpiBusId::Spi0 => 0,
            SpiBusId::Spi1 => 1,
        }
    }
}

/// Errors from SPI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError {
    /// The bus index names no instance in the board catalog.
    InvalidBus,
    /// The requested clock class is faster than the divider can represent.
    ClockUnsupported,
    /// A transfer was requested with neither an out nor an in buffer.
    NoBuffer,
    /// Full-duplex buffers of different lengths.
    LengthMismatch,
}

/// One lock per bus instance. Exclusive, non-reentrant, no fairness
/// guarantee between waiting callers.
static BUS_LOCKS: [spin::Mutex<()>; board::SPI_MAX] =
    [spin::Mutex::new(()), spin::Mutex::new(())];

fn mode_bits(mode: Mode) -> SpiCtl0 {
    // The phase bit of this block is inverted relative to the usual CPHA
    // numbering: set CKPH means capture on the first edge.
    match mode {
        Mode::Mode0 => SpiCtl0::CKPH,
        Mode::Mode1 => SpiCtl0::empty(),
        Mode::Mode2 => SpiCtl0::CKPL | SpiCtl0::CKPH,
        Mode::Mode3 => SpiCtl0::CKPL,
    }
}

/// One-time bus bring-up: hold the block in reset with its clock source
/// selected and hand the bus pins to the peripheral.
pub fn init(bus: SpiBusId) -> Result<(), SpiError> {
    let conf = board::spi_conf(bus).ok_or(SpiError::InvalidBus)?;

    conf.usci.ctl1.write(CTL1_SWRST);
    conf.usci.ctl1.set_bits(CTL1_SSEL_SMCLK);

    init_pins(bus)
}

/// Switch the bus data and clock pins to their peripheral function.
pub fn init_pins(bus: SpiBusId) -> Result<(), SpiError> {
    let conf = board::spi_conf(bus).ok_or(SpiError::InvalidBus)?;

    gpio::set_peripheral_function(conf.miso, true);
    gpio::set_peripheral_function(conf.mosi, true);
    gpio::set_peripheral_function(conf.clk, true);

    Ok(())
}

/// An exclusive bus session.
///
/// Holds the bus lock for its lifetime. Dropping the transaction re-asserts
/// the block's reset latch, leaving the bus in a known idle state for the
/// next owner, and releases the lock.
pub struct SpiTransaction {
    conf: &'static board::SpiConf,
    cs: Option<PinId>,
    _lock: spin::MutexGuard<'static, ()>,
}

/// Acquire exclusive use of a bus and program it for a session.
///
/// Blocks until the previous session (if any) ends. Unsupported clock
/// classes are rejected before the lock is taken and before any register is
/// touched. The divisor is `periph_clock / rate`, floored at 2; the
/// hardware divider cannot represent smaller ratios.
///
/// `cs` is the chip-select pin framing every transfer of this session, or
/// `None` for buses whose device is always selected.
pub fn acquire(
    bus: SpiBusId,
    cs: Option<PinId>,
    mode: Mode,
    clock: SpiClock,
) -> Result<SpiTransaction, SpiError> {
    let conf = board::spi_conf(bus).ok_or(SpiError::InvalidBus)?;
    // spi_conf succeeded, so the catalog is installed.
    let periph_clock_hz = board::get().ok_or(SpiError::InvalidBus)?.periph_clock_hz;

    if clock.hz() > MAX_CLOCK_HZ {
        return Err(SpiError::ClockUnsupported);
    }

    let lock = BUS_LOCKS[bus.index()].lock();

    let div = (periph_clock_hz / clock.hz()).max(2);
    conf.usci.br0.write(div as u8);
    conf.usci.br1.write((div >> 8) as u8);

    let ctl0 = SpiCtl0::SYNC | SpiCtl0::MASTER | SpiCtl0::MSB_FIRST | mode_bits(mode);
    conf.usci.ctl0.write(ctl0.bits());
    conf.usci.ctl1.clear_bits(CTL1_SWRST);

    Ok(SpiTransaction {
        conf,
        cs,
        _lock: lock,
    })
}

impl SpiTransaction {
    /// Run one framed transfer.
    ///
    /// At least one buffer must be present. The shape follows from which
    /// buffers are given: write-only discards received bytes, read-only
    /// transmits a zero filler per received byte, full-duplex interleaves
    /// one write and one read per byte. All shapes busy-poll the hardware
    /// flags.
    ///
    /// With `keep_selected` the chip-select pin stays asserted after the
    /// last byte, so the next transfer continues the same frame.
    pub fn transfer_bytes(
        &mut self,
        keep_selected: bool,
        out: Option<&[u8]>,
        input: Option<&mut [u8]>,
    ) -> Result<(), SpiError> {
        if out.is_none() && input.is_none() {
            return Err(SpiError::NoBuffer);
        }
        if let (Some(out), Some(input)) = (&out, &input) {
            if out.len() != input.len() {
                return Err(SpiError::LengthMismatch);
            }
        }

        if let Some(cs) = self.cs {
            gpio::clear(cs);
        }

        let usci = self.conf.usci;
        match (out, input) {
            (Some(out), None) => {
                for &byte in out {
                    usci.ifg.wait_set(USCI_TX_BIT);
                    usci.txbuf.write(byte);
                }
                // The transmit flag only means the buffer took the byte;
                // wait for the shift register to drain before the caller
                // can deassert chip-select or drop the session.
                usci.stat.wait_clear(UsciStat::BUSY.bits());
                let _ = usci.rxbuf.read();
            }
            (None, Some(input)) => {
                for slot in input.iter_mut() {
                    usci.txbuf.write(0);
                    usci.ifg.wait_set(USCI_RX_BIT);
                    *slot = usci.rxbuf.read();
                }
            }
            (Some(out), Some(input)) => {
                for (&byte, slot) in out.iter().zip(input.iter_mut()) {
                    usci.ifg.wait_set(USCI_TX_BIT);
                    usci.txbuf.write(byte);
                    usci.ifg.wait_set(USCI_RX_BIT);
                    *slot = usci.rxbuf.read();
                }
            }
            (None, None) => return Err(SpiError::NoBuffer),
        }

        if !keep_selected {
            if let Some(cs) = self.cs {
                gpio::set(cs);
            }
        }

        Ok(())
    }
}

impl Drop for SpiTransaction {
    fn drop(&mut self) {
        // Back to a known idle electrical state; the lock guard releases
        // the bus afterwards.
        self.conf.usci.ctl1.set_bits(CTL1_SWRST);
    }
}

impl SpiBus for SpiTransaction {
    type Error = SpiError;

    fn write(&mut self, data: &[u8]) -> Result<(), SpiError> {
        self.transfer_bytes(false, Some(data), None)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), SpiError> {
        self.transfer_bytes(false, None, Some(buf))
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), SpiError> {
        self.transfer_bytes(false, Some(write), Some(read))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    const CS: PinId = PinId::new(6, 3);

    #[test]
    fn test_init_muxes_bus_pins() {
        let fix = testutil::fixture();
        let _serial = testutil::spi0_lock();
        init(SpiBusId::Spi0).unwrap();

        assert_ne!(fix.spi0.ctl1.read() & CTL1_SWRST, 0);
        // MISO P3.7, MOSI P5.4, CLK P5.5 handed to the peripheral.
        assert_ne!(fix.p3.select.read() & 0x80, 0);
        assert_ne!(fix.p5.select.read() & 0x10, 0);
        assert_ne!(fix.p5.select.read() & 0x20, 0);
    }

    #[test]
    fn test_unsupported_clock_is_rejected_without_side_effects() {
        let fix = testutil::fixture();

        // Spi1 is reserved for this test so no other session touches it.
        fix.spi1.br0.write(0xaa);
        fix.spi1.br1.write(0x55);
        let err = acquire(SpiBusId::Spi1, None, Mode::Mode0, SpiClock::M10);
        assert!(matches!(err, Err(SpiError::ClockUnsupported)));
        assert_eq!(fix.spi1.br0.read(), 0xaa);
        assert_eq!(fix.spi1.br1.read(), 0x55);
    }

    #[test]
    fn test_acquire_programs_divisor_and_mode() {
        let fix = testutil::fixture();
        let _serial = testutil::spi0_lock();

        {
            let _spi = acquire(SpiBusId::Spi0, None, Mode::Mode3, SpiClock::M1).unwrap();
            // 8 MHz / 1 MHz = 8.
            assert_eq!(fix.spi0.br0.read(), 8);
            assert_eq!(fix.spi0.br1.read(), 0);
            let ctl0 = SpiCtl0::from_bits_truncate(fix.spi0.ctl0.read());
            assert!(ctl0.contains(SpiCtl0::SYNC | SpiCtl0::MASTER | SpiCtl0::MSB_FIRST));
            assert!(ctl0.contains(SpiCtl0::CKPL));
            assert!(!ctl0.contains(SpiCtl0::CKPH));
            // Running: reset latch released.
            assert_eq!(fix.spi0.ctl1.read() & CTL1_SWRST, 0);
        }
        // Session ended: back in reset.
        assert_ne!(fix.spi0.ctl1.read() & CTL1_SWRST, 0);
    }

    #[test]
    fn test_divisor_never_below_floor() {
        let fix = testutil::fixture();
        let _serial = testutil::spi0_lock();

        // 8 MHz / 5 MHz = 1, floored at 2.
        let _spi = acquire(SpiBusId::Spi0, None, Mode::Mode0, SpiClock::M5).unwrap();
        assert_eq!(fix.spi0.br0.read(), 2);
        assert_eq!(fix.spi0.br1.read(), 0);
    }

    #[test]
    fn test_sequential_sessions_on_one_bus() {
        testutil::fixture();
        let _serial = testutil::spi0_lock();

        let first = acquire(SpiBusId::Spi0, None, Mode::Mode0, SpiClock::M1).unwrap();
        drop(first);
        // The scoped release made the bus available again.
        let _second = acquire(SpiBusId::Spi0, None, Mode::Mode0, SpiClock::M1).unwrap();
    }

    #[test]
    fn test_write_only_transfer() {
        let fix = testutil::fixture();
        let _serial = testutil::spi0_lock();

        let mut spi = acquire(SpiBusId::Spi0, Some(CS), Mode::Mode0, SpiClock::M1).unwrap();
        gpio::set(CS);

        spi.transfer_bytes(false, Some(&[0x01, 0x02, 0x03]), None)
            .unwrap();
        assert_eq!(fix.spi0.txbuf.read(), 0x03);
        // Chip-select released after the frame.
        assert_ne!(fix.p6.output.read() & CS.mask(), 0);
    }

    #[test]
    fn test_keep_selected_leaves_chip_select_asserted() {
        let fix = testutil::fixture();
        let _serial = testutil::spi0_lock();

        let mut spi = acquire(SpiBusId::Spi0, Some(CS), Mode::Mode0, SpiClock::M1).unwrap();
        gpio::set(CS);

        // Zero-length write: still a full chip-select frame.
        spi.transfer_bytes(true, Some(&[]), None).unwrap();
        assert_eq!(fix.p6.output.read() & CS.mask(), 0);

        spi.transfer_bytes(false, Some(&[]), None).unwrap();
        assert_ne!(fix.p6.output.read() & CS.mask(), 0);
    }

    #[test]
    fn test_read_only_transfer_sends_zero_filler() {
        let fix = testutil::fixture();
        let _serial = testutil::spi0_lock();

        let mut spi = acquire(SpiBusId::Spi0, None, Mode::Mode0, SpiClock::M1).unwrap();
        fix.spi0.txbuf.write(0xff);
        fix.spi0.rxbuf.write(0x5a);

        let mut buf = [0u8; 4];
        spi.transfer_bytes(false, None, Some(&mut buf)).unwrap();
        assert_eq!(buf, [0x5a; 4]);
        assert_eq!(fix.spi0.txbuf.read(), 0);
    }

    #[test]
    fn test_full_duplex_transfer() {
        let fix = testutil::fixture();
        let _serial = testutil::spi0_lock();

        let mut spi = acquire(SpiBusId::Spi0, None, Mode::Mode0, SpiClock::M1).unwrap();
        fix.spi0.rxbuf.write(0x77);

        let out = [0xde, 0xad];
        let mut input = [0u8; 2];
        spi.transfer_bytes(false, Some(&out), Some(&mut input))
            .unwrap();
        assert_eq!(input, [0x77, 0x77]);
        assert_eq!(fix.spi0.txbuf.read(), 0xad);
    }

    #[test]
    fn test_transfer_argument_errors() {
        testutil::fixture();
        let _serial = testutil::spi0_lock();

        let mut spi = acquire(SpiBusId::Spi0, None, Mode::Mode0, SpiClock::M1).unwrap();
        assert_eq!(spi.transfer_bytes(false, None, None), Err(SpiError::NoBuffer));

        let mut short = [0u8; 1];
        assert_eq!(
            spi.transfer_bytes(false, Some(&[1, 2]), Some(&mut short)),
            Err(SpiError::LengthMismatch)
        );
    }

    #[test]
    fn test_trait_transfers() {
        let fix = testutil::fixture();
        let _serial = testutil::spi0_lock();

        let mut spi = acquire(SpiBusId::Spi0, None, Mode::Mode0, SpiClock::M1).unwrap();
        fix.spi0.rxbuf.write(0x21);

        SpiBus::write(&mut spi, &[9]).unwrap();
        let mut buf = [0u8; 2];
        SpiBus::read(&mut spi, &mut buf).unwrap();
        assert_eq!(buf, [0x21, 0x21]);
        SpiBus::transfer(&mut spi, &mut buf, &[4, 5]).unwrap();
        assert_eq!(fix.spi0.txbuf.read(), 5);
    }
}
