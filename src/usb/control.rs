//! The endpoint 0 control transfer state machine.
//!
//! Runs entirely inside the endpoint interrupt: the setup header has
//! already been pulled off the FIFO and acknowledged by the caller, and
//! every branch here finishes its status stage before returning. No
//! state carries over between invocations.

use core::sync::atomic::Ordering;

use critical_section::CriticalSection;

use super::descriptors;
use super::endpoint::{UsbRegs, CONTROL_ENDPOINT, ENDPOINT0_SIZE, ENDPOINT_CONFIG_TABLE, MAX_ENDPOINT};
use super::request_type::{Direction, Kind, Recipient};
use super::setup_packet::SetupPacket;
use super::UsbDevice;

// Standard request codes, USB spec 9.4.
const GET_STATUS: u8 = 0;
const CLEAR_FEATURE: u8 = 1;
const SET_FEATURE: u8 = 3;
const SET_ADDRESS: u8 = 5;
const GET_DESCRIPTOR: u8 = 6;
const GET_CONFIGURATION: u8 = 8;
const SET_CONFIGURATION: u8 = 9;
// HID class, HID 1.11 spec 7.2.
const HID_GET_REPORT: u8 = 1;
const HID_GET_IDLE: u8 = 2;
const HID_GET_PROTOCOL: u8 = 3;
const HID_SET_REPORT: u8 = 9;
const HID_SET_IDLE: u8 = 10;
const HID_SET_PROTOCOL: u8 = 11;
// CDC class, CDC spec 6.2.
const CDC_SET_LINE_CODING: u8 = 0x20;
const CDC_GET_LINE_CODING: u8 = 0x21;
const CDC_SET_CONTROL_LINE_STATE: u8 = 0x22;

/// Dispatch one control request. Several codes are ambiguous under
/// `bRequest` alone (1 is both `CLEAR_FEATURE` and HID `GET_REPORT`,
/// 9 both `SET_CONFIGURATION` and HID `SET_REPORT`), so the arms match
/// on the full `(bRequest, bmRequestType)` pair and their order is the
/// dispatch priority.
pub(crate) fn handle<R: UsbRegs>(
    dev: &UsbDevice<R>,
    cs: CriticalSection,
    regs: &mut R,
    req: &SetupPacket,
) {
    let keyboard_interface = req.wIndex == descriptors::KEYBOARD_INTERFACE as u16;
    match (req.bRequest, req.bmRequestType.bits()) {
        (GET_DESCRIPTOR, _) => get_descriptor(regs, req),
        (SET_ADDRESS, _) => {
            // The status stage still goes out to the old address; the
            // new one must not take effect before it is on the wire.
            regs.complete_in();
            wait_in_ready(regs);
            regs.set_address(req.wValue as u8);
        }
        (SET_CONFIGURATION, 0x00) => {
            let value = req.wValue as u8;
            dev.configuration_cell().store(value, Ordering::Relaxed);
            dev.line_state_cell().store(0, Ordering::Relaxed);
            dev.flush_timer_cell().store(0, Ordering::Relaxed);
            regs.complete_in();
            for (i, config) in ENDPOINT_CONFIG_TABLE.iter().enumerate() {
                regs.select(i as u8 + 1);
                if value != 0 {
                    regs.configure(*config);
                } else {
                    regs.disable();
                }
            }
            regs.reset_endpoints(0x1E);
        }
        (GET_CONFIGURATION, 0x80) => {
            wait_in_ready(regs);
            regs.write_byte(dev.configuration_cell().load(Ordering::Relaxed));
            regs.complete_in();
        }
        (CDC_GET_LINE_CODING, 0xA1) => {
            wait_in_ready(regs);
            for &byte in dev.line_coding_cell().borrow_ref(cs).iter() {
                regs.write_byte(byte);
            }
            regs.complete_in();
        }
        (CDC_SET_LINE_CODING, 0x21) => {
            wait_receive_out(regs);
            for byte in dev.line_coding_cell().borrow_ref_mut(cs).iter_mut() {
                *byte = regs.read_byte();
            }
            regs.acknowledge_out();
            regs.complete_in();
        }
        (CDC_SET_CONTROL_LINE_STATE, 0x21) => {
            dev.line_state_cell().store(req.wValue as u8, Ordering::Relaxed);
            wait_in_ready(regs);
            regs.complete_in();
        }
        (GET_STATUS, _) => {
            wait_in_ready(regs);
            let mut halted = 0;
            if req
                .bmRequestType
                .is(Direction::DeviceToHost, Kind::Standard, Recipient::Endpoint)
            {
                // The selection register is three bits wide; the
                // endpoint number is masked to it as the hardware would.
                regs.select(req.wIndex as u8 & 0x07);
                if regs.is_stalled() {
                    halted = 1;
                }
                regs.select(CONTROL_ENDPOINT);
            }
            regs.write_byte(halted);
            regs.write_byte(0);
            regs.complete_in();
        }
        (CLEAR_FEATURE | SET_FEATURE, _)
            if req
                .bmRequestType
                .is(Direction::HostToDevice, Kind::Standard, Recipient::Endpoint)
                && req.wValue == 0
                && (1..=MAX_ENDPOINT as u16).contains(&(req.wIndex & 0x7F)) =>
        {
            // ENDPOINT_HALT is the only feature carried.
            let endpoint = (req.wIndex & 0x7F) as u8;
            regs.complete_in();
            regs.select(endpoint);
            if req.bRequest == SET_FEATURE {
                regs.stall();
            } else {
                regs.clear_stall();
                regs.reset_endpoints(1 << endpoint);
            }
        }
        (HID_GET_REPORT, 0xA1) if keyboard_interface => {
            wait_in_ready(regs);
            dev.report_cell().borrow_ref(cs).write_to(regs);
            regs.complete_in();
        }
        (HID_GET_IDLE, 0xA1) if keyboard_interface => {
            wait_in_ready(regs);
            regs.write_byte(dev.keyboard_idle_cell().load(Ordering::Relaxed));
            regs.complete_in();
        }
        (HID_GET_PROTOCOL, 0xA1) if keyboard_interface => {
            wait_in_ready(regs);
            regs.write_byte(dev.keyboard_protocol_cell().load(Ordering::Relaxed));
            regs.complete_in();
        }
        (HID_SET_REPORT, 0x21) if keyboard_interface => {
            // One byte of LED state arrives; no LEDs are modeled.
            wait_receive_out(regs);
            let _ = regs.read_byte();
            regs.acknowledge_out();
            regs.complete_in();
        }
        (HID_SET_IDLE, 0x21) if keyboard_interface => {
            dev.keyboard_idle_cell()
                .store((req.wValue >> 8) as u8, Ordering::Relaxed);
            regs.complete_in();
        }
        (HID_SET_PROTOCOL, 0x21) if keyboard_interface => {
            dev.keyboard_protocol_cell()
                .store(req.wValue as u8, Ordering::Relaxed);
            regs.complete_in();
        }
        _ => regs.stall(),
    }
}

/// Stream a descriptor back in control-packet-sized chunks, or stall on
/// an unknown selector.
fn get_descriptor<R: UsbRegs>(regs: &mut R, req: &SetupPacket) {
    let Some(data) = descriptors::lookup(req.wValue, req.wIndex) else {
        regs.stall();
        return;
    };
    let mut remaining = req.wLength.min(255).min(data.len() as u16) as usize;
    let mut offset = 0;
    loop {
        // The host aborts a transfer by moving straight to the status
        // stage; an OUT packet showing up here means stop sending.
        if wait_for_in_or_out(regs) {
            return;
        }
        let n = remaining.min(ENDPOINT0_SIZE as usize);
        for &byte in &data[offset..offset + n] {
            regs.write_byte(byte);
        }
        offset += n;
        remaining -= n;
        regs.complete_in();
        // A zero-length answer still gets its one empty IN packet.
        if remaining == 0 {
            return;
        }
    }
}

fn wait_in_ready<R: UsbRegs>(regs: &mut R) {
    while !regs.status().in_ready() {}
}

fn wait_receive_out<R: UsbRegs>(regs: &mut R) {
    while !regs.status().received_out() {}
}

/// Wait for the IN bank to free up or an OUT packet to arrive; true
/// means the OUT side won.
fn wait_for_in_or_out<R: UsbRegs>(regs: &mut R) -> bool {
    loop {
        let status = regs.status();
        if status.received_out() {
            return true;
        }
        if status.in_ready() {
            return false;
        }
    }
}
