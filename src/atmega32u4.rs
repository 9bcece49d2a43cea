//! ATmega32U4 binding: the [`UsbRegs`] implementation over the real
//! controller registers, USB clock bring-up, and the two interrupt
//! service routines.
//!
//! Register values mirror the datasheet encodings directly (`UECFG0X`
//! type/direction bytes, `UECFG1X` size/bank bytes, `UEINTX` release
//! masks); the field-level meaning lives in the [`UsbRegs`] trait docs.

use core::ptr::addr_of;

use avr_device::atmega32u4::{PLL, USB_DEVICE};

use crate::usb::{Banks, DeviceEvents, EndpointConfig, EndpointKind, EpStatus, UsbDevice, UsbRegs};

// UEINTX write masks; writing 0 clears a flag, 1 leaves it alone.
const ACK_SETUP: u8 = !(0x08 | 0x04 | 0x01); // RXSTPI, RXOUTI, TXINI
const ACK_IN: u8 = !0x01; // TXINI
const ACK_OUT: u8 = !0x04; // RXOUTI
const RELEASE_IN: u8 = 0x3A; // clear FIFOCON, NAKINI, RXOUTI, TXINI
const RELEASE_OUT: u8 = 0x6B; // clear FIFOCON, NAKOUTI, RXOUTI

// UECONX
const EPEN: u8 = 0x01;
const RSTDT: u8 = 0x08;
const STALLRQC: u8 = 0x10;
const STALLRQ: u8 = 0x20;

/// The endpoint register file. Owns the USB controller peripheral; the
/// PLL is only needed during bring-up.
pub struct AvrUsbRegs {
    usb: USB_DEVICE,
}

impl AvrUsbRegs {
    /// Bring the controller up: regulator on, clock frozen while the
    /// PLL locks, then attach and enable the end-of-reset and
    /// start-of-frame interrupts. The device stays detached until this
    /// runs.
    pub fn new(usb: USB_DEVICE, pll: PLL) -> Self {
        usb.uhwcon.write(|w| unsafe { w.bits(0x01) }); // UVREGE
        usb.usbcon.write(|w| unsafe { w.bits(0xA0) }); // USBE | FRZCLK
        pll.pllcsr.write(|w| unsafe { w.bits(0x12) }); // PINDIV | PLLE, 16 MHz crystal
        while pll.pllcsr.read().plock().bit_is_clear() {}
        usb.usbcon.write(|w| unsafe { w.bits(0x90) }); // USBE | OTGPADE
        usb.udcon.write(|w| unsafe { w.bits(0x00) }); // attach
        usb.udien.write(|w| unsafe { w.bits(0x0C) }); // EORSTE | SOFE
        AvrUsbRegs { usb }
    }
}

fn kind_bits(kind: EndpointKind) -> u8 {
    match kind {
        EndpointKind::Control => 0x00,
        EndpointKind::BulkOut => 0x80,
        EndpointKind::BulkIn => 0x81,
        EndpointKind::InterruptIn => 0xC1,
    }
}

fn size_bits(size: u8) -> u8 {
    match size {
        64 => 0x30,
        32 => 0x20,
        16 => 0x10,
        _ => 0x00,
    }
}

fn bank_bits(banks: Banks) -> u8 {
    // both include the ALLOC bit
    match banks {
        Banks::Single => 0x02,
        Banks::Double => 0x06,
    }
}

impl UsbRegs for AvrUsbRegs {
    fn select(&mut self, ep: u8) {
        self.usb.uenum.write(|w| unsafe { w.bits(ep & 0x07) });
    }

    fn status(&mut self) -> EpStatus {
        EpStatus::from_bits(self.usb.ueintx.read().bits())
    }

    fn read_byte(&mut self) -> u8 {
        self.usb.uedatx.read().bits()
    }

    fn write_byte(&mut self, byte: u8) {
        self.usb.uedatx.write(|w| unsafe { w.bits(byte) });
    }

    fn byte_count(&mut self) -> u8 {
        self.usb.uebclx.read().bits()
    }

    fn acknowledge_setup(&mut self) {
        self.usb.ueintx.write(|w| unsafe { w.bits(ACK_SETUP) });
    }

    fn complete_in(&mut self) {
        self.usb.ueintx.write(|w| unsafe { w.bits(ACK_IN) });
    }

    fn acknowledge_out(&mut self) {
        self.usb.ueintx.write(|w| unsafe { w.bits(ACK_OUT) });
    }

    fn release_in(&mut self) {
        self.usb.ueintx.write(|w| unsafe { w.bits(RELEASE_IN) });
    }

    fn release_out(&mut self) {
        self.usb.ueintx.write(|w| unsafe { w.bits(RELEASE_OUT) });
    }

    fn configure(&mut self, config: EndpointConfig) {
        self.usb.ueconx.write(|w| unsafe { w.bits(EPEN) });
        self.usb
            .uecfg0x
            .write(|w| unsafe { w.bits(kind_bits(config.kind)) });
        self.usb
            .uecfg1x
            .write(|w| unsafe { w.bits(size_bits(config.size) | bank_bits(config.banks)) });
    }

    fn disable(&mut self) {
        self.usb.ueconx.write(|w| unsafe { w.bits(0x00) });
    }

    fn enable_setup_interrupt(&mut self) {
        self.usb.ueienx.write(|w| w.rxstpe().set_bit());
    }

    fn stall(&mut self) {
        self.usb.ueconx.write(|w| unsafe { w.bits(STALLRQ | EPEN) });
    }

    fn clear_stall(&mut self) {
        self.usb
            .ueconx
            .write(|w| unsafe { w.bits(STALLRQC | RSTDT | EPEN) });
    }

    fn is_stalled(&mut self) -> bool {
        self.usb.ueconx.read().stallrq().bit_is_set()
    }

    fn reset_endpoints(&mut self, mask: u8) {
        self.usb.uerst.write(|w| unsafe { w.bits(mask) });
        self.usb.uerst.write(|w| unsafe { w.bits(0) });
    }

    fn set_address(&mut self, address: u8) {
        self.usb
            .udaddr
            .write(|w| unsafe { w.bits(address | 0x80) }); // ADDEN
    }

    fn frame_number(&mut self) -> u8 {
        self.usb.udfnuml.read().bits()
    }

    fn take_device_events(&mut self) -> DeviceEvents {
        let bits = self.usb.udint.read().bits();
        self.usb.udint.write(|w| unsafe { w.bits(0) });
        DeviceEvents {
            bus_reset: bits & 0x08 != 0,  // EORSTI
            frame_tick: bits & 0x04 != 0, // SOFI
        }
    }
}

/// The one device instance the ISRs dispatch to.
///
/// Written exactly once by [`install`], before interrupts are enabled,
/// and read-only ever after; the device's own methods carry their own
/// critical sections.
static mut DEVICE: Option<UsbDevice<AvrUsbRegs>> = None;

/// Park the device stack where the interrupt handlers can find it.
/// Must run before `avr_device::interrupt::enable`.
pub fn install(device: UsbDevice<AvrUsbRegs>) -> &'static UsbDevice<AvrUsbRegs> {
    unsafe {
        DEVICE = Some(device);
        match (*addr_of!(DEVICE)).as_ref() {
            Some(installed) => installed,
            None => unreachable!(),
        }
    }
}

fn device() -> Option<&'static UsbDevice<AvrUsbRegs>> {
    unsafe { (*addr_of!(DEVICE)).as_ref() }
}

/// Device-level interrupt: bus reset and the 1 kHz frame tick.
#[avr_device::interrupt(atmega32u4)]
fn USB_GEN() {
    if let Some(dev) = device() {
        dev.handle_bus_event();
    }
}

/// Endpoint interrupt: setup packets on endpoint 0.
#[avr_device::interrupt(atmega32u4)]
fn USB_COM() {
    if let Some(dev) = device() {
        dev.handle_endpoint_event();
    }
}
