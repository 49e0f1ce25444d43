//! Board catalog
//!
//! The board support crate owns the memory map: which port groups exist,
//! which USCI block backs each SPI bus and UART channel, which pins those
//! blocks are wired to, and how fast the peripheral clock runs. It hands all
//! of that to this module once during startup; afterwards the catalog is
//! read-only and every API operation resolves its instance through it.
//!
//! On hardware the references are produced from link-time addresses, which
//! is the board crate's one `unsafe` conversion. Host tests install a
//! catalog of plain in-memory register blocks instead.

use spin::Once;

use crate::pins::{PinId, IRQ_PORT_COUNT, PLAIN_PORT_COUNT};
use crate::regs::{IrqPortRegs, PortRegs, UsciRegs};
use crate::spi::SpiBusId;
use crate::uart::UartId;

/// Maximum number of SPI bus instances a board may declare.
pub const SPI_MAX: usize = 2;
/// Maximum number of UART channel instances a board may declare.
pub const UART_MAX: usize = 2;

/// One SPI bus instance: its USCI block and bus pin assignments.
#[derive(Clone, Copy)]
pub struct SpiConf {
    /// USCI block driving the bus.
    pub usci: &'static UsciRegs,
    /// Master-in slave-out data pin.
    pub miso: PinId,
    /// Master-out slave-in data pin.
    pub mosi: PinId,
    /// Serial clock pin.
    pub clk: PinId,
}

/// One UART channel instance: its USCI block and pin assignments.
#[derive(Clone, Copy)]
pub struct UartConf {
    /// USCI block driving the channel.
    pub usci: &'static UsciRegs,
    /// Receive pin.
    pub rx: PinId,
    /// Transmit pin.
    pub tx: PinId,
}

/// The complete board-supplied peripheral catalog.
pub struct Board {
    /// Interrupt-capable port groups P1 and P2, in order.
    pub irq_ports: [Option<&'static IrqPortRegs>; IRQ_PORT_COUNT],
    /// Plain port groups P3 through P11, in order.
    pub plain_ports: [Option<&'static PortRegs>; PLAIN_PORT_COUNT],
    /// SPI bus instances.
    pub spi: [Option<SpiConf>; SPI_MAX],
    /// UART channel instances.
    pub uart: [Option<UartConf>; UART_MAX],
    /// Peripheral (sub-main) clock frequency in Hz, the reference for SPI
    /// divisor computation.
    pub periph_clock_hz: u32,
}

/// Errors from catalog installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardError {
    /// A catalog was already installed.
    AlreadyInstalled,
}

static BOARD: Once<Board> = Once::new();

/// Install the board catalog.
///
/// Must be called once during single-threaded startup, before any other
/// operation of this crate. A second call is rejected and leaves the first
/// catalog in place.
pub fn install(board: Board) -> Result<(), BoardError> {
    if BOARD.is_completed() {
        return Err(BoardError::AlreadyInstalled);
    }
    BOARD.call_once(|| board);
    Ok(())
}

/// The installed catalog, or `None` before [`install`].
pub fn get() -> Option<&'static Board> {
    BOARD.get()
}

/// Configuration for a SPI bus instance, if the board declares it.
pub(crate) fn spi_conf(bus: SpiBusId) -> Option<&'static SpiConf> {
    get()?.spi[bus.index()].as_ref()
}

/// Configuration for a UART channel instance, if the board declares it.
pub(crate) fn uart_conf(channel: UartId) -> Option<&'static UartConf> {
    get()?.uart[channel.index()].as_ref()
}
