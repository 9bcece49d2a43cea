//! USB device core: a CDC-ACM serial channel and a HID boot keyboard
//! multiplexed over five ATmega32U4-style endpoints.
//!
//! The stack is generic over [`UsbRegs`], the register-file access trait,
//! so the whole protocol core runs unmodified against the real controller
//! and against the mock harness in the host tests. Interrupt service
//! routines call [`UsbDevice::handle_bus_event`] and
//! [`UsbDevice::handle_endpoint_event`]; foreground code uses the serial
//! and keyboard primitives, each of which takes its own short critical
//! section around the shared endpoint-selection register.

mod control;
mod endpoint;
mod keyboard;
mod request_type;
mod serial;
mod setup_packet;

pub mod descriptors;

#[cfg(test)]
mod mock;

pub use endpoint::{
    Banks, DeviceEvents, EndpointConfig, EndpointKind, EpStatus, UsbRegs, CDC_ACM_ENDPOINT,
    CDC_ACM_SIZE, CDC_RX_ENDPOINT, CDC_RX_SIZE, CDC_TX_ENDPOINT, CDC_TX_SIZE, CONTROL_ENDPOINT,
    ENDPOINT0_CONFIG, ENDPOINT0_SIZE, ENDPOINT_CONFIG_TABLE, KEYBOARD_ENDPOINT, KEYBOARD_SIZE,
    MAX_ENDPOINT,
};
pub use keyboard::KeyboardReport;
pub use request_type::{BmRequestType, Direction, Kind, Recipient};
pub use serial::{FastWriter, LineState, Serial};
pub use setup_packet::SetupPacket;

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use critical_section::Mutex;

/// Frame ticks a partially filled serial packet sits before the tick
/// interrupt forces it out.
pub const TRANSMIT_FLUSH_TIMEOUT: u8 = 5;
/// Frame ticks a blocking serial write waits for buffer space.
pub const TRANSMIT_TIMEOUT: u8 = 25;
/// Frame ticks the keyboard channel waits for its single bank to free up.
pub const KEYBOARD_READY_TIMEOUT: u8 = 50;

/// 57600 baud, 1 stop bit, no parity, 8 data bits. Stored verbatim and
/// handed back verbatim; the value is never interpreted.
const DEFAULT_LINE_CODING: [u8; 7] = [0x00, 0xE1, 0x00, 0x00, 0x00, 0x00, 0x08];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The device has not been configured by the host (or lost its
    /// configuration mid-operation).
    NotConfigured,
    /// A bounded busy-wait ran out of frame ticks.
    Timeout,
    /// No room in the transmit bank right now (non-blocking write only).
    BufferFull,
}

/// The device-side USB stack. One instance owns the endpoint register
/// file for the lifetime of the device.
///
/// All methods take `&self`: the register handle lives in a
/// `critical_section::Mutex` and the remaining shared state is atomic,
/// mirroring how the interrupt handlers and foreground code interleave
/// on the single core.
pub struct UsbDevice<R: UsbRegs> {
    regs: Mutex<RefCell<R>>,
    configuration: AtomicU8,
    line_state: AtomicU8,
    flush_timer: AtomicU8,
    write_timed_out: AtomicBool,
    line_coding: Mutex<RefCell<[u8; 7]>>,
    report: Mutex<RefCell<KeyboardReport>>,
    keyboard_idle: AtomicU8,
    keyboard_protocol: AtomicU8,
}

impl<R: UsbRegs> UsbDevice<R> {
    pub fn new(regs: R) -> Self {
        UsbDevice {
            regs: Mutex::new(RefCell::new(regs)),
            configuration: AtomicU8::new(0),
            line_state: AtomicU8::new(0),
            flush_timer: AtomicU8::new(0),
            write_timed_out: AtomicBool::new(false),
            line_coding: Mutex::new(RefCell::new(DEFAULT_LINE_CODING)),
            report: Mutex::new(RefCell::new(KeyboardReport::default())),
            keyboard_idle: AtomicU8::new(125),
            keyboard_protocol: AtomicU8::new(1),
        }
    }

    /// Non-zero once the host has issued `SET_CONFIGURATION`.
    #[inline]
    pub fn configuration(&self) -> u8 {
        self.configuration.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn configured(&self) -> bool {
        self.configuration() != 0
    }

    /// Device-level interrupt: bus reset and the 1 kHz frame tick.
    ///
    /// A reset re-arms endpoint 0 and drops the configuration; class
    /// endpoints stay down until the host configures again. The frame
    /// tick runs the transmit-flush countdown so short serial writes
    /// leave the device within [`TRANSMIT_FLUSH_TIMEOUT`] ms even if the
    /// caller never flushes.
    pub fn handle_bus_event(&self) {
        critical_section::with(|cs| {
            let mut regs = self.regs.borrow_ref_mut(cs);
            let events = regs.take_device_events();

            if events.bus_reset {
                regs.select(CONTROL_ENDPOINT);
                regs.configure(ENDPOINT0_CONFIG);
                regs.enable_setup_interrupt();
                self.configuration.store(0, Ordering::Relaxed);
                self.line_state.store(0, Ordering::Relaxed);
            }

            if events.frame_tick && self.configured() {
                let armed = self.flush_timer.load(Ordering::Relaxed);
                if armed != 0 {
                    let armed = armed - 1;
                    self.flush_timer.store(armed, Ordering::Relaxed);
                    if armed == 0 {
                        regs.select(CDC_TX_ENDPOINT);
                        regs.release_in();
                    }
                }
            }
        })
    }

    /// Endpoint interrupt: a setup packet on endpoint 0 runs the control
    /// state machine to completion; any other condition stalls.
    pub fn handle_endpoint_event(&self) {
        critical_section::with(|cs| {
            let mut regs = self.regs.borrow_ref_mut(cs);
            regs.select(CONTROL_ENDPOINT);
            if regs.status().received_setup() {
                let packet = SetupPacket::read(&mut *regs);
                regs.acknowledge_setup();
                control::handle(self, cs, &mut *regs, &packet);
            } else {
                regs.stall();
            }
        })
    }

    pub(crate) fn regs(&self) -> &Mutex<RefCell<R>> {
        &self.regs
    }

    pub(crate) fn configuration_cell(&self) -> &AtomicU8 {
        &self.configuration
    }

    pub(crate) fn line_state_cell(&self) -> &AtomicU8 {
        &self.line_state
    }

    pub(crate) fn flush_timer_cell(&self) -> &AtomicU8 {
        &self.flush_timer
    }

    pub(crate) fn write_timed_out_cell(&self) -> &AtomicBool {
        &self.write_timed_out
    }

    pub(crate) fn line_coding_cell(&self) -> &Mutex<RefCell<[u8; 7]>> {
        &self.line_coding
    }

    pub(crate) fn report_cell(&self) -> &Mutex<RefCell<KeyboardReport>> {
        &self.report
    }

    pub(crate) fn keyboard_idle_cell(&self) -> &AtomicU8 {
        &self.keyboard_idle
    }

    pub(crate) fn keyboard_protocol_cell(&self) -> &AtomicU8 {
        &self.keyboard_protocol
    }
}
