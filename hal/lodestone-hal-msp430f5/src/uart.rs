//! UART channel
//!
//! Fixed-format (8N1) asynchronous channel on a USCI block. Transmission is
//! polled; reception is interrupt driven with exactly one subscriber per
//! channel, registered at [`init`] time.
//!
//! The baud generator is a fixed lookup keyed by the requested rate, not a
//! formula: only the divisor pair validated against the 32.768 kHz auxiliary
//! clock is carried (9600 baud). A general divisor computation for this
//! block exists on paper but has never been validated on hardware, so
//! unknown rates are rejected instead of approximated.

use lodestone_hal::uart::{UartRxHandler, UartTx};

use crate::board;
use crate::gpio::{self, Direction};
use crate::regs::{UsciStat, CTL1_SSEL_AUXCLK, CTL1_SWRST, MCTL_BRS_SHIFT, USCI_RX_BIT, USCI_TX_BIT};

/// UART channel instance identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

impl UartId {
    pub(crate) fn index(self) -> usize {
        match self {
            UartId::Uart0 => 0,
            UartId::Uart1 => 1,
        }
    }
}

/// Errors from UART operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// The channel index names no instance in the board catalog.
    InvalidChannel,
    /// No validated divisor pair exists for the requested baud rate.
    UnsupportedBaud,
    /// The board wired the channel to pins the codec cannot resolve.
    BadPinConfig,
}

/// Divisor pair for the baud generator.
#[derive(Clone, Copy)]
struct BaudDivisors {
    br0: u8,
    br1: u8,
    brs: u8,
}

/// Validated rates only; see the module docs.
fn baud_divisors(baudrate: u32) -> Option<BaudDivisors> {
    match baudrate {
        9_600 => Some(BaudDivisors {
            br0: 3,
            br1: 0,
            brs: 3,
        }),
        _ => None,
    }
}

/// Opaque callback argument; see the GPIO subscription table for the same
/// pattern.
#[derive(Clone, Copy)]
struct RxArg(*mut ());

unsafe impl Send for RxArg {}

#[derive(Clone, Copy)]
struct RxEntry {
    handler: UartRxHandler,
    arg: RxArg,
}

/// Per-channel receive subscriber. One slot per channel, no fan-out.
static RX_CTX: spin::Mutex<[Option<RxEntry>; board::UART_MAX]> =
    spin::Mutex::new([None; board::UART_MAX]);

/// Bring up a channel and register its receive subscriber.
///
/// The block is reconfigured under its reset latch: clock source, frame
/// format and divisors are programmed, the RX/TX pins are handed to the
/// peripheral, and only then is the latch released. The receive interrupt
/// is unmasked last; the transmit interrupt stays masked because
/// transmission is polled.
pub fn init(
    channel: UartId,
    baudrate: u32,
    handler: UartRxHandler,
    arg: *mut (),
) -> Result<(), UartError> {
    let conf = board::uart_conf(channel).ok_or(UartError::InvalidChannel)?;
    let div = baud_divisors(baudrate).ok_or(UartError::UnsupportedBaud)?;
    let usci = conf.usci;

    // Quiesce while reconfiguring.
    usci.ctl1.write(CTL1_SWRST);
    usci.ctl1.set_bits(CTL1_SSEL_AUXCLK);
    // UART personality, 8 data bits, no parity, one stop bit.
    usci.ctl0.write(0);
    usci.stat.write(0);

    usci.br0.write(div.br0);
    usci.br1.write(div.br1);
    usci.mctl.write(div.brs << MCTL_BRS_SHIFT);

    // Hand the pins to the peripheral; direction still matters for the mux.
    gpio::set_peripheral_function(conf.rx, true);
    gpio::set_peripheral_function(conf.tx, true);
    gpio::configure(conf.rx, Direction::In).map_err(|_| UartError::BadPinConfig)?;
    gpio::configure(conf.tx, Direction::Out).map_err(|_| UartError::BadPinConfig)?;

    // Releasing the reset latch starts the channel.
    usci.ctl1.clear_bits(CTL1_SWRST);

    RX_CTX.lock()[channel.index()] = Some(RxEntry {
        handler,
        arg: RxArg(arg),
    });

    // RX interrupt armed, TX stays polled.
    usci.ifg.clear_bits(USCI_RX_BIT);
    usci.ifg.set_bits(USCI_TX_BIT);
    usci.ie.set_bits(USCI_RX_BIT);
    usci.ie.clear_bits(USCI_TX_BIT);

    Ok(())
}

/// Transmit `data`, busy-polling the transmit-ready flag per byte.
///
/// Returns once every byte sits in the transmit pipeline; the last byte may
/// still be shifting out on the wire.
pub fn write(channel: UartId, data: &[u8]) -> Result<(), UartError> {
    let conf = board::uart_conf(channel).ok_or(UartError::InvalidChannel)?;

    for &byte in data {
        conf.usci.ifg.wait_set(USCI_TX_BIT);
        conf.usci.txbuf.write(byte);
    }

    Ok(())
}

/// Receive ISR entry point for a channel.
///
/// Reads the status flags and the data register; the read itself clears
/// the hardware condition. A byte carrying a frame, overrun, parity or
/// break error is discarded without surfacing an error anywhere; clean
/// bytes go to the registered subscriber.
pub fn rx_isr(channel: UartId) {
    let Some(conf) = board::uart_conf(channel) else {
        return;
    };

    let stat = UsciStat::from_bits_truncate(conf.usci.stat.read());
    let data = conf.usci.rxbuf.read();

    if stat.intersects(UsciStat::RX_ERROR) {
        // The pseudo-read above already reset the status register.
        return;
    }

    let entry = RX_CTX.lock()[channel.index()];
    if let Some(entry) = entry {
        (entry.handler)(entry.arg.0, data);
    }
}

/// A transmit handle implementing the HAL trait.
pub struct UartWriter {
    channel: UartId,
}

impl UartWriter {
    /// A writer for an initialised channel.
    pub fn new(channel: UartId) -> Result<Self, UartError> {
        board::uart_conf(channel).ok_or(UartError::InvalidChannel)?;
        Ok(UartWriter { channel })
    }

    pub fn channel(&self) -> UartId {
        self.channel
    }
}

impl UartTx for UartWriter {
    type Error = UartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), UartError> {
        write(self.channel, data)
    }

    fn flush(&mut self) -> Result<(), UartError> {
        let conf = board::uart_conf(self.channel).ok_or(UartError::InvalidChannel)?;
        conf.usci.stat.wait_clear(UsciStat::BUSY.bits());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use super::*;
    use crate::pins::PinId;
    use crate::testutil;

    static RX_COUNT: AtomicUsize = AtomicUsize::new(0);
    static RX_LAST: AtomicU32 = AtomicU32::new(0);

    fn record_byte(arg: *mut (), byte: u8) {
        let count = unsafe { &*(arg as *const AtomicUsize) };
        count.fetch_add(1, Ordering::SeqCst);
        RX_LAST.store(byte as u32, Ordering::SeqCst);
    }

    // The channel registers and the subscriber slot are process-global, so
    // the whole happy-path flow lives in one test.
    #[test]
    fn test_uart_flow() {
        let fix = testutil::fixture();
        let rx = PinId::new(10, 5);
        let tx = PinId::new(10, 4);

        init(
            UartId::Uart0,
            9_600,
            record_byte,
            &RX_COUNT as *const _ as *mut (),
        )
        .unwrap();

        // Validated divisor pair for 9600 baud from the auxiliary clock.
        assert_eq!(fix.uart0.br0.read(), 3);
        assert_eq!(fix.uart0.br1.read(), 0);
        assert_eq!(fix.uart0.mctl.read(), 3 << MCTL_BRS_SHIFT);
        assert_eq!(fix.uart0.ctl1.read() & CTL1_SWRST, 0);
        assert_ne!(fix.uart0.ctl1.read() & CTL1_SSEL_AUXCLK, 0);

        // Pins muxed to the peripheral with the right directions.
        assert_ne!(fix.p10.select.read() & rx.mask(), 0);
        assert_ne!(fix.p10.select.read() & tx.mask(), 0);
        assert_eq!(fix.p10.dir.read() & rx.mask(), 0);
        assert_ne!(fix.p10.dir.read() & tx.mask(), 0);

        // RX interrupt armed, TX left polled.
        assert_eq!(fix.uart0.ie.read() & USCI_RX_BIT, USCI_RX_BIT);
        assert_eq!(fix.uart0.ie.read() & USCI_TX_BIT, 0);

        // Polled transmission.
        write(UartId::Uart0, b"ok").unwrap();
        assert_eq!(fix.uart0.txbuf.read(), b'k');

        // Clean byte reaches the subscriber.
        fix.uart0.stat.write(0);
        fix.uart0.rxbuf.write(0x42);
        rx_isr(UartId::Uart0);
        assert_eq!(RX_COUNT.load(Ordering::SeqCst), 1);
        assert_eq!(RX_LAST.load(Ordering::SeqCst), 0x42);

        // Overrun byte is dropped, subscriber never hears about it.
        fix.uart0.stat.write(UsciStat::OVERRUN.bits());
        fix.uart0.rxbuf.write(0x43);
        rx_isr(UartId::Uart0);
        assert_eq!(RX_COUNT.load(Ordering::SeqCst), 1);

        // Framing error likewise.
        fix.uart0.stat.write(UsciStat::FRAME_ERR.bits());
        rx_isr(UartId::Uart0);
        assert_eq!(RX_COUNT.load(Ordering::SeqCst), 1);

        // Back-to-back clean byte is delivered again.
        fix.uart0.stat.write(0);
        fix.uart0.rxbuf.write(0x44);
        rx_isr(UartId::Uart0);
        assert_eq!(RX_COUNT.load(Ordering::SeqCst), 2);
        assert_eq!(RX_LAST.load(Ordering::SeqCst), 0x44);

        // Trait handle on the same channel.
        let mut writer = UartWriter::new(UartId::Uart0).unwrap();
        writer.write_blocking(b"!").unwrap();
        writer.flush().unwrap();
        assert_eq!(fix.uart0.txbuf.read(), b'!');
    }

    #[test]
    fn test_init_rejects_unknown_baud() {
        testutil::fixture();
        let err = init(
            UartId::Uart0,
            115_200,
            record_byte,
            &RX_COUNT as *const _ as *mut (),
        );
        assert_eq!(err, Err(UartError::UnsupportedBaud));
    }

    #[test]
    fn test_unconfigured_channel_fails() {
        testutil::fixture();
        assert_eq!(
            init(
                UartId::Uart1,
                9_600,
                record_byte,
                &RX_COUNT as *const _ as *mut (),
            ),
            Err(UartError::InvalidChannel)
        );
        assert_eq!(write(UartId::Uart1, b"x"), Err(UartError::InvalidChannel));
        assert!(UartWriter::new(UartId::Uart1).is_err());
        // An ISR raised for a channel the board never declared is ignored.
        rx_isr(UartId::Uart1);
    }
}
