//! CDC-ACM virtual serial channel: non-blocking reads off the bulk OUT
//! endpoint, bounded-blocking writes into the bulk IN endpoint, and the
//! unchecked fast path used when streaming fixed-size samples.
//!
//! All timing runs against the 8-bit 1 kHz frame counter, which wraps
//! every 256 ms. Deadlines are `start.wrapping_add(timeout)` and every
//! wait compares the counter for *equality* with the deadline; an
//! ordering comparison would misfire whenever the deadline wraps past
//! zero.

use core::sync::atomic::Ordering;

use super::endpoint::{UsbRegs, CDC_RX_ENDPOINT, CDC_TX_ENDPOINT};
use super::{Error, UsbDevice, TRANSMIT_FLUSH_TIMEOUT, TRANSMIT_TIMEOUT};
#[cfg(debug_assertions)]
use crate::fault;

/// The DTR/RTS bits the host last set via `SET_CONTROL_LINE_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineState(u8);

impl LineState {
    const DTR: u8 = 0x01;
    const RTS: u8 = 0x02;

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        LineState(bits)
    }

    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Set while a host terminal has the port open. The command layer
    /// polls this before attempting blocking writes.
    #[inline]
    pub fn dtr(&self) -> bool {
        self.0 & Self::DTR != 0
    }

    #[inline]
    pub fn rts(&self) -> bool {
        self.0 & Self::RTS != 0
    }
}

/// Borrowed handle for the serial primitives. Each call takes its own
/// short critical section; nothing is held between calls.
pub struct Serial<'a, R: UsbRegs> {
    dev: &'a UsbDevice<R>,
}

impl<R: UsbRegs> UsbDevice<R> {
    pub fn serial(&self) -> Serial<'_, R> {
        Serial { dev: self }
    }
}

impl<R: UsbRegs> Serial<'_, R> {
    /// Take one received byte, or `None` when unconfigured or nothing is
    /// queued. Draining the last byte of a bank hands the bank back to
    /// the hardware so the next host packet can land.
    pub fn read_byte(&self) -> Option<u8> {
        if !self.dev.configured() {
            return None;
        }
        critical_section::with(|cs| {
            let mut regs = self.dev.regs().borrow_ref_mut(cs);
            regs.select(CDC_RX_ENDPOINT);
            // An empty bank still occupies its slot until released; drop
            // drained banks until one with data (or nothing) remains.
            let mut status = regs.status();
            while !status.read_write_allowed() {
                if !status.received_out() {
                    return None;
                }
                regs.release_out();
                status = regs.status();
            }
            let byte = regs.read_byte();
            if !regs.status().read_write_allowed() {
                regs.release_out();
            }
            Some(byte)
        })
    }

    /// How many bytes are queued right now, without consuming any.
    pub fn bytes_available(&self) -> u8 {
        if !self.dev.configured() {
            return 0;
        }
        critical_section::with(|cs| {
            let mut regs = self.dev.regs().borrow_ref_mut(cs);
            regs.select(CDC_RX_ENDPOINT);
            let status = regs.status();
            if status.read_write_allowed() {
                return regs.byte_count();
            }
            if status.received_out() {
                regs.release_out();
                if regs.status().read_write_allowed() {
                    return regs.byte_count();
                }
            }
            0
        })
    }

    /// Discard everything received so far. Hosts sometimes probe a fresh
    /// port with modem AT commands; the command layer drops those before
    /// greeting.
    pub fn flush_input(&self) {
        if !self.dev.configured() {
            return;
        }
        critical_section::with(|cs| {
            let mut regs = self.dev.regs().borrow_ref_mut(cs);
            regs.select(CDC_RX_ENDPOINT);
            while regs.status().read_write_allowed() {
                regs.release_out();
            }
        })
    }

    /// Queue one byte for transmission, waiting up to
    /// [`TRANSMIT_TIMEOUT`] ms for bank space.
    ///
    /// A successful write arms the flush countdown, so the byte leaves
    /// within [`TRANSMIT_FLUSH_TIMEOUT`] ms even if nobody flushes. If
    /// the previous write timed out the space check runs once without
    /// re-waiting; a dead listener then costs one timeout, not one per
    /// byte.
    pub fn write_byte(&self, byte: u8) -> Result<(), Error> {
        let dev = self.dev;
        if !dev.configured() {
            return Err(Error::NotConfigured);
        }
        critical_section::with(|cs| {
            let mut regs = dev.regs().borrow_ref_mut(cs);
            regs.select(CDC_TX_ENDPOINT);
            if dev.write_timed_out_cell().load(Ordering::Relaxed) {
                if !regs.status().read_write_allowed() {
                    return Err(Error::Timeout);
                }
                dev.write_timed_out_cell().store(false, Ordering::Relaxed);
            }
            Ok(())
        })?;

        let deadline = critical_section::with(|cs| {
            dev.regs().borrow_ref_mut(cs).frame_number()
        })
        .wrapping_add(TRANSMIT_TIMEOUT);

        loop {
            let wrote = critical_section::with(|cs| {
                let mut regs = dev.regs().borrow_ref_mut(cs);
                regs.select(CDC_TX_ENDPOINT);
                if regs.status().read_write_allowed() {
                    regs.write_byte(byte);
                    if !regs.status().read_write_allowed() {
                        regs.release_in();
                    }
                    dev.flush_timer_cell()
                        .store(TRANSMIT_FLUSH_TIMEOUT, Ordering::Relaxed);
                    return Ok(true);
                }
                if regs.frame_number() == deadline {
                    dev.write_timed_out_cell().store(true, Ordering::Relaxed);
                    return Err(Error::Timeout);
                }
                Ok(false)
            })?;
            if wrote {
                return Ok(());
            }
            // Interrupts run here, between polls.
            if !dev.configured() {
                return Err(Error::NotConfigured);
            }
        }
    }

    /// Single space check, no wait. `BufferFull` when the bank has no
    /// room right now.
    pub fn write_byte_nowait(&self, byte: u8) -> Result<(), Error> {
        let dev = self.dev;
        if !dev.configured() {
            return Err(Error::NotConfigured);
        }
        critical_section::with(|cs| {
            let mut regs = dev.regs().borrow_ref_mut(cs);
            regs.select(CDC_TX_ENDPOINT);
            if !regs.status().read_write_allowed() {
                return Err(Error::BufferFull);
            }
            regs.write_byte(byte);
            if !regs.status().read_write_allowed() {
                regs.release_in();
            }
            dev.flush_timer_cell()
                .store(TRANSMIT_FLUSH_TIMEOUT, Ordering::Relaxed);
            Ok(())
        })
    }

    /// Push out whatever is buffered, even a partial or empty packet,
    /// and disarm the flush countdown. A no-op when nothing is pending.
    pub fn flush_output(&self) {
        critical_section::with(|cs| {
            if self.dev.flush_timer_cell().load(Ordering::Relaxed) != 0 {
                let mut regs = self.dev.regs().borrow_ref_mut(cs);
                regs.select(CDC_TX_ENDPOINT);
                regs.release_in();
                self.dev.flush_timer_cell().store(0, Ordering::Relaxed);
            }
        })
    }

    /// DTR/RTS as last set by the host.
    pub fn line_state(&self) -> LineState {
        LineState::from_bits(self.dev.line_state_cell().load(Ordering::Relaxed))
    }

    /// Run `f` with the transmit endpoint selected, interrupts off and
    /// per-byte readiness checks skipped.
    ///
    /// Sample streaming calls this once per burst after establishing the
    /// bank is writable; the writes themselves are then single FIFO
    /// pushes. The readiness contract is checked in debug builds only.
    pub fn with_fast_writer<T>(&self, f: impl FnOnce(&mut FastWriter<'_, R>) -> T) -> T {
        critical_section::with(|cs| {
            let mut regs = self.dev.regs().borrow_ref_mut(cs);
            regs.select(CDC_TX_ENDPOINT);
            f(&mut FastWriter { regs: &mut *regs })
        })
    }
}

/// The unchecked write path. Exists only inside
/// [`Serial::with_fast_writer`], which selects the endpoint and holds
/// the critical section for the writer's whole lifetime.
pub struct FastWriter<'a, R: UsbRegs> {
    regs: &'a mut R,
}

impl<R: UsbRegs> FastWriter<'_, R> {
    /// Push one byte, assuming the bank is writable. A full bank is
    /// released so the next write lands in the other bank.
    pub fn write(&mut self, byte: u8) {
        #[cfg(debug_assertions)]
        self.require_writable();
        self.regs.write_byte(byte);
        if !self.regs.status().read_write_allowed() {
            self.regs.release_in();
        }
    }

    /// Push a 16-bit value, most significant byte first, as the sample
    /// stream encodes them.
    pub fn write_u16(&mut self, value: u16) {
        self.write((value >> 8) as u8);
        self.write(value as u8);
    }

    /// Hand the current bank to the hardware regardless of fill level.
    pub fn flush(&mut self) {
        self.regs.release_in();
    }

    #[cfg(debug_assertions)]
    fn require_writable(&mut self) {
        if !self.regs.status().read_write_allowed() {
            fault::trip();
        }
    }
}

impl<R: UsbRegs> embedded_hal::serial::Read<u8> for Serial<'_, R> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        match self.read_byte() {
            Some(byte) => Ok(byte),
            None => Err(nb::Error::WouldBlock),
        }
    }
}

impl<R: UsbRegs> embedded_hal::serial::Write<u8> for Serial<'_, R> {
    type Error = Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Error> {
        self.write_byte_nowait(word).map_err(|e| match e {
            Error::BufferFull => nb::Error::WouldBlock,
            other => nb::Error::Other(other),
        })
    }

    fn flush(&mut self) -> nb::Result<(), Error> {
        self.flush_output();
        Ok(())
    }
}
