//! The 8-byte setup stage header of a control transfer.

use super::endpoint::UsbRegs;
use super::request_type::BmRequestType;

/// Field names follow the USB spec so they can be checked against it
/// directly.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupPacket {
    pub bmRequestType: BmRequestType,
    pub bRequest: u8,
    pub wValue: u16,
    pub wIndex: u16,
    pub wLength: u16,
}

impl SetupPacket {
    /// Pull the header off the control endpoint's FIFO, in wire order.
    /// Must run with the control endpoint selected and a setup packet
    /// pending; the caller acknowledges the setup flags afterwards.
    pub fn read<R: UsbRegs>(regs: &mut R) -> Self {
        let request_type = BmRequestType::from_bits(regs.read_byte());
        let request = regs.read_byte();
        let value = u16::from_le_bytes([regs.read_byte(), regs.read_byte()]);
        let index = u16::from_le_bytes([regs.read_byte(), regs.read_byte()]);
        let length = u16::from_le_bytes([regs.read_byte(), regs.read_byte()]);
        SetupPacket {
            bmRequestType: request_type,
            bRequest: request,
            wValue: value,
            wIndex: index,
            wLength: length,
        }
    }
}
