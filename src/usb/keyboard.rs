//! HID boot-keyboard channel.
//!
//! The keyboard endpoint is single-banked on purpose: with one bank,
//! "bank free again" is visible to firmware and is the only available
//! signal that the host has consumed the previous report. That signal
//! is what [`UsbDevice::send_report_sync`] anchors measurements on.

use core::sync::atomic::Ordering;

use super::endpoint::{UsbRegs, KEYBOARD_ENDPOINT};
use super::{Error, UsbDevice, KEYBOARD_READY_TIMEOUT};

/// The 8-byte boot report: modifier byte (always 0 here), reserved byte,
/// six keycode slots. The press primitives only ever touch slot 0; the
/// control state machine reads the whole thing back for HID
/// `GET_REPORT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub keys: [u8; 6],
}

impl KeyboardReport {
    /// Write the report into the selected endpoint's FIFO in wire order.
    pub(crate) fn write_to<R: UsbRegs>(&self, regs: &mut R) {
        regs.write_byte(0); // modifiers
        regs.write_byte(0); // reserved
        for &key in &self.keys {
            regs.write_byte(key);
        }
    }
}

impl<R: UsbRegs> UsbDevice<R> {
    /// Wait until the keyboard bank can take a new report, bounded by
    /// [`KEYBOARD_READY_TIMEOUT`] ms of frame ticks.
    pub fn keyboard_ready(&self) -> Result<(), Error> {
        if !self.configured() {
            return Err(Error::NotConfigured);
        }
        let deadline = critical_section::with(|cs| {
            self.regs().borrow_ref_mut(cs).frame_number()
        })
        .wrapping_add(KEYBOARD_READY_TIMEOUT);

        loop {
            let ready = critical_section::with(|cs| {
                let mut regs = self.regs().borrow_ref_mut(cs);
                regs.select(KEYBOARD_ENDPOINT);
                if regs.status().read_write_allowed() {
                    return Ok(true);
                }
                if regs.frame_number() == deadline {
                    return Err(Error::Timeout);
                }
                Ok(false)
            })?;
            if ready {
                return Ok(());
            }
            if !self.configured() {
                return Err(Error::NotConfigured);
            }
        }
    }

    /// Transmit the current report. Fails without sending when the bank
    /// never frees up or the configuration drops.
    pub fn send_report(&self) -> Result<(), Error> {
        self.keyboard_ready()?;
        critical_section::with(|cs| {
            let mut regs = self.regs().borrow_ref_mut(cs);
            regs.select(KEYBOARD_ENDPOINT);
            self.report_cell().borrow_ref(cs).write_to(&mut *regs);
            regs.release_in();
        });
        Ok(())
    }

    /// As [`send_report`](Self::send_report), then wait until the
    /// hardware reports the bank free again, i.e. the host has started
    /// consuming the report.
    ///
    /// This return point is an approximation of "the keystroke reached
    /// the host": it is "buffer available again", not "host application
    /// processed the input", so a measured delay can read slightly high
    /// and, in edge cases, come out non-positive.
    pub fn send_report_sync(&self) -> Result<(), Error> {
        self.send_report()?;
        let deadline = critical_section::with(|cs| {
            self.regs().borrow_ref_mut(cs).frame_number()
        })
        .wrapping_add(KEYBOARD_READY_TIMEOUT);

        loop {
            let consumed = critical_section::with(|cs| {
                let mut regs = self.regs().borrow_ref_mut(cs);
                regs.select(KEYBOARD_ENDPOINT);
                if regs.status().read_write_allowed() {
                    return Ok(true);
                }
                if regs.frame_number() == deadline {
                    return Err(Error::Timeout);
                }
                Ok(false)
            })?;
            if consumed {
                return Ok(());
            }
            if !self.configured() {
                return Err(Error::NotConfigured);
            }
        }
    }

    /// Press and release `key`: exactly one non-empty report (key in
    /// slot 0) followed by one all-zero report. Host OSes sample
    /// discrete reports, so the release must be its own transmission.
    pub fn press(&self, key: u8) -> Result<(), Error> {
        self.set_key(key);
        let down = self.send_report();
        self.set_key(0);
        down?;
        self.send_report()
    }

    /// As [`press`](Self::press), but the key-down transmission is
    /// synchronous: the measurement loop starts its clock when this
    /// observes the report consumed. The release is a plain send.
    pub fn press_sync(&self, key: u8) -> Result<(), Error> {
        self.set_key(key);
        let down = self.send_report_sync();
        self.set_key(0);
        down?;
        self.send_report()
    }

    fn set_key(&self, key: u8) {
        critical_section::with(|cs| {
            self.report_cell().borrow_ref_mut(cs).keys[0] = key;
        })
    }
}
