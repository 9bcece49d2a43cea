//! Firmware core for the ScreenTimer display-latency probe.
//!
//! The device shows up on the host as a CDC-ACM serial port (the
//! command and results channel) plus a HID boot keyboard (the stimulus
//! channel): the host asks for a measurement, the firmware "presses" a
//! key, and a photo sensor watching the display times how long the
//! host takes to show a reaction.
//!
//! The [`usb`] module is the hand-rolled device-side protocol stack
//! (enumeration, control transfers, the serial channel and the
//! single-buffered keyboard channel), written against a register access
//! trait so it runs both on the ATmega32U4 and under the host test
//! harness. [`protocol`] is the pure ASCII command layer on top, and
//! [`atmega32u4`] (behind the feature of the same name) binds the
//! stack to the real controller.

#![cfg_attr(not(test), no_std)]
// ISRs on AVR use a dedicated calling convention only nightly exposes.
#![cfg_attr(feature = "atmega32u4", feature(abi_avr_interrupt))]

pub mod fault;
pub mod keycodes;
pub mod protocol;
pub mod usb;

#[cfg(feature = "atmega32u4")]
pub mod atmega32u4;

pub use usb::{Error, KeyboardReport, LineState, Serial, UsbDevice, UsbRegs};
