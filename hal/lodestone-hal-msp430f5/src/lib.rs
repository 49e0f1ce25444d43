//! MSP430 F5/F6 family HAL for the Lodestone firmware
//!
//! This crate implements the `lodestone-hal` traits for the MSP430 F5/F6
//! family: pin identifier codec, GPIO with edge interrupts on P1/P2, a
//! polled SPI master on the USCI blocks and a fixed-format UART channel.
//!
//! Register access goes through the catalog the board support crate
//! installs at startup ([`board::install`]), so the driver layer itself
//! contains no hard-coded addresses and runs against in-memory register
//! blocks on the host.
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting support

#![no_std]

#[cfg(test)]
extern crate std;

pub mod board;
pub mod gpio;
pub mod pins;
pub mod regs;
pub mod spi;
pub mod uart;

// Re-export shared types from lodestone-hal
pub use lodestone_hal::gpio::{Direction, Edge, Level};
pub use lodestone_hal::spi::{Mode, SpiClock};

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared in-memory board for the unit tests.
    //!
    //! All tests in this crate run in one process against one installed
    //! catalog, so each test works with pins and instances no other test
    //! touches. The SPI0 registers are the exception; tests that drive them
    //! serialize through [`spi0_lock`].

    use spin::{Mutex, MutexGuard, Once};
    use std::boxed::Box;

    use crate::board::{self, Board, SpiConf, UartConf};
    use crate::pins::PinId;
    use crate::regs::{IrqPortRegs, PortRegs, UsciRegs, USCI_RX_BIT, USCI_TX_BIT};

    #[derive(Clone, Copy)]
    pub struct TestBoard {
        pub p1: &'static IrqPortRegs,
        pub p2: &'static IrqPortRegs,
        pub p3: &'static PortRegs,
        pub p4: &'static PortRegs,
        pub p5: &'static PortRegs,
        pub p6: &'static PortRegs,
        pub p10: &'static PortRegs,
        pub spi0: &'static UsciRegs,
        pub spi1: &'static UsciRegs,
        pub uart0: &'static UsciRegs,
    }

    static FIXTURE: Once<TestBoard> = Once::new();
    static SPI0_SERIAL: Mutex<()> = Mutex::new(());

    /// The shared test board, installing it on first use.
    pub fn fixture() -> TestBoard {
        *FIXTURE.call_once(|| {
            let p1: &'static IrqPortRegs = Box::leak(Box::new(IrqPortRegs::new()));
            let p2: &'static IrqPortRegs = Box::leak(Box::new(IrqPortRegs::new()));

            let mut plain: [Option<&'static PortRegs>; 9] = [None; 9];
            // Groups 3 through 10; group 11 stays absent so lookups against
            // an unpopulated group can be exercised.
            for slot in plain.iter_mut().take(8) {
                *slot = Some(Box::leak(Box::new(PortRegs::new())));
            }

            let spi0: &'static UsciRegs = Box::leak(Box::new(UsciRegs::new()));
            let spi1: &'static UsciRegs = Box::leak(Box::new(UsciRegs::new()));
            let uart0: &'static UsciRegs = Box::leak(Box::new(UsciRegs::new()));

            // Transfer flags start ready so busy-polls terminate without a
            // peripheral on the other side.
            spi0.ifg.write(USCI_TX_BIT | USCI_RX_BIT);
            spi1.ifg.write(USCI_TX_BIT | USCI_RX_BIT);
            uart0.ifg.write(USCI_TX_BIT);

            let board = Board {
                irq_ports: [Some(p1), Some(p2)],
                plain_ports: plain,
                spi: [
                    Some(SpiConf {
                        usci: spi0,
                        miso: PinId::new(3, 7),
                        mosi: PinId::new(5, 4),
                        clk: PinId::new(5, 5),
                    }),
                    Some(SpiConf {
                        usci: spi1,
                        miso: PinId::new(4, 7),
                        mosi: PinId::new(4, 6),
                        clk: PinId::new(4, 5),
                    }),
                ],
                uart: [
                    Some(UartConf {
                        usci: uart0,
                        rx: PinId::new(10, 5),
                        tx: PinId::new(10, 4),
                    }),
                    None,
                ],
                periph_clock_hz: 8_000_000,
            };

            // Later fixture calls race the first; the install result does
            // not matter once a catalog is in place.
            let _ = board::install(board);

            let get = |group: u8| {
                plain[(group - 3) as usize].unwrap()
            };
            TestBoard {
                p1,
                p2,
                p3: get(3),
                p4: get(4),
                p5: get(5),
                p6: get(6),
                p10: get(10),
                spi0,
                spi1,
                uart0,
            }
        })
    }

    /// Serializes the tests that drive the shared SPI0 registers.
    pub fn spi0_lock() -> MutexGuard<'static, ()> {
        SPI0_SERIAL.lock()
    }
}
