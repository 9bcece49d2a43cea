//! Endpoint numbering, the static endpoint configuration table, and the
//! register-level access trait the rest of the stack is written against.
//!
//! The ATmega32U4 exposes a single bank of endpoint registers that alias
//! whichever endpoint is currently selected, so every select-then-touch
//! sequence must run inside one critical section. The trait keeps that
//! "selected endpoint" model instead of hiding it; the mock used by the
//! host tests implements the same semantics.

pub const CONTROL_ENDPOINT: u8 = 0;
pub const KEYBOARD_ENDPOINT: u8 = 1;
pub const CDC_ACM_ENDPOINT: u8 = 2;
pub const CDC_RX_ENDPOINT: u8 = 3;
pub const CDC_TX_ENDPOINT: u8 = 4;
pub const MAX_ENDPOINT: u8 = 4;

pub const ENDPOINT0_SIZE: u8 = 16;
pub const KEYBOARD_SIZE: u8 = 8;
pub const CDC_ACM_SIZE: u8 = 16;
pub const CDC_RX_SIZE: u8 = 16;
pub const CDC_TX_SIZE: u8 = 64;

/// Transfer type plus direction, as the hardware wants them paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointKind {
    Control,
    BulkIn,
    BulkOut,
    InterruptIn,
}

/// Keyboard stays single-banked on purpose: with one bank, "bank free
/// again" is observable from firmware and doubles as the only available
/// "host consumed the report" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Banks {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointConfig {
    pub kind: EndpointKind,
    pub size: u8,
    pub banks: Banks,
}

pub const ENDPOINT0_CONFIG: EndpointConfig = EndpointConfig {
    kind: EndpointKind::Control,
    size: ENDPOINT0_SIZE,
    banks: Banks::Single,
};

/// Class endpoint layout, applied on `SET_CONFIGURATION`. Index 0 of the
/// table is endpoint 1; endpoint 0 is fixed at bus reset and never
/// reprogrammed from here.
pub const ENDPOINT_CONFIG_TABLE: [EndpointConfig; MAX_ENDPOINT as usize] = [
    EndpointConfig {
        kind: EndpointKind::InterruptIn,
        size: KEYBOARD_SIZE,
        banks: Banks::Single,
    },
    EndpointConfig {
        kind: EndpointKind::InterruptIn,
        size: CDC_ACM_SIZE,
        banks: Banks::Single,
    },
    EndpointConfig {
        kind: EndpointKind::BulkOut,
        size: CDC_RX_SIZE,
        banks: Banks::Double,
    },
    EndpointConfig {
        kind: EndpointKind::BulkIn,
        size: CDC_TX_SIZE,
        banks: Banks::Double,
    },
];

/// One-shot snapshot of the selected endpoint's interrupt/status byte.
///
/// Bit positions follow the hardware register so the real implementation
/// is a single volatile read. Consumers only see the named queries.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EpStatus(u8);

impl EpStatus {
    pub(crate) const TXINI: u8 = 1 << 0;
    pub(crate) const RXOUTI: u8 = 1 << 2;
    pub(crate) const RXSTPI: u8 = 1 << 3;
    pub(crate) const RWAL: u8 = 1 << 5;

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        EpStatus(bits)
    }

    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// More data can be read from (OUT) or written to (IN) the current bank.
    #[inline]
    pub fn read_write_allowed(&self) -> bool {
        self.0 & Self::RWAL != 0
    }

    /// A fresh OUT packet is waiting in a bank.
    #[inline]
    pub fn received_out(&self) -> bool {
        self.0 & Self::RXOUTI != 0
    }

    /// A setup packet is waiting (control endpoint only).
    #[inline]
    pub fn received_setup(&self) -> bool {
        self.0 & Self::RXSTPI != 0
    }

    /// The IN bank is free to be filled.
    #[inline]
    pub fn in_ready(&self) -> bool {
        self.0 & Self::TXINI != 0
    }
}

/// Device-level interrupt causes, drained once per bus-event interrupt.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceEvents {
    pub bus_reset: bool,
    pub frame_tick: bool,
}

/// Access to the endpoint register file and the handful of device-level
/// registers the stack needs. Exactly one endpoint is selected at a time
/// and all per-endpoint operations act on the selection; callers are
/// responsible for wrapping select-then-touch sequences in a critical
/// section (the stack does this by keeping the implementor inside a
/// `critical_section::Mutex`).
pub trait UsbRegs {
    /// Select the endpoint subsequent per-endpoint operations act on.
    /// Only the low three bits are significant, as in the hardware.
    fn select(&mut self, ep: u8);

    /// Snapshot the selected endpoint's status byte.
    fn status(&mut self) -> EpStatus;

    /// Read one byte from the selected endpoint's FIFO.
    fn read_byte(&mut self) -> u8;

    /// Append one byte to the selected endpoint's FIFO.
    fn write_byte(&mut self, byte: u8);

    /// Bytes remaining in the selected endpoint's current bank.
    fn byte_count(&mut self) -> u8;

    /// Clear the setup/OUT/IN flags after the setup header has been read.
    fn acknowledge_setup(&mut self);

    /// Arm the control IN bank for transmission (status or data stage).
    fn complete_in(&mut self);

    /// Consume a control OUT data stage.
    fn acknowledge_out(&mut self);

    /// Hand the filled IN bank of a class endpoint to the hardware.
    fn release_in(&mut self);

    /// Return a drained OUT bank of a class endpoint to the hardware.
    fn release_out(&mut self);

    /// Enable the selected endpoint with the given shape.
    fn configure(&mut self, config: EndpointConfig);

    /// Disable the selected endpoint.
    fn disable(&mut self);

    /// Raise endpoint interrupts for setup packets on the selected
    /// (control) endpoint.
    fn enable_setup_interrupt(&mut self);

    /// Halt the selected endpoint.
    fn stall(&mut self);

    /// Clear a halt and reset the data toggle of the selected endpoint.
    fn clear_stall(&mut self);

    fn is_stalled(&mut self) -> bool;

    /// Pulse the per-endpoint reset lines given by `mask` (bit 1 =
    /// endpoint 1, ...), resetting FIFOs and data toggles.
    fn reset_endpoints(&mut self, mask: u8);

    /// Apply and enable the device address. Callers must have confirmed
    /// the status stage went out first.
    fn set_address(&mut self, address: u8);

    /// Low byte of the 1 kHz frame counter; wraps every 256 ms.
    fn frame_number(&mut self) -> u8;

    /// Read and clear the pending device-level interrupt causes.
    fn take_device_events(&mut self) -> DeviceEvents;
}
