//! The ASCII command protocol spoken over the virtual serial port.
//!
//! One command per CR/LF-terminated line of printable ASCII. The device
//! greets a newly attached terminal with [`BANNER`], answers `C`/`M`
//! with a sample stream bracketed by start and terminator markers, `I`
//! with the resolution line and `K` with an acknowledgment. This module
//! is pure byte-shuffling; the firmware binary wires it to the serial
//! channel.

use core::fmt::Write;

use heapless::{String, Vec};

/// Sent whenever DTR rises, before any command is read.
pub const BANNER: &[u8] = b"HELO ScreenTimer ready\n";
pub const ACCEPTED: &[u8] = b"ACPT\n";
pub const REJECTED: &[u8] = b"REJT\n";
pub const CALIBRATE_START: &[u8] = b"CSTA\n";
pub const MEASURE_START: &[u8] = b"MSTA\n";
/// Closes a sample stream that ran clean; clients key success off the
/// trailing `0xFE`.
pub const STREAM_COMPLETE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFE];
/// Closes a sample stream cut short (timer overflow mid-run).
pub const STREAM_ABORTED: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
/// Sampling-jitter estimate leading the `M` stream, 16-bit big-endian.
/// Jitter is not measured; the field is constant zero.
pub const MEASURE_VARIANCE: u16 = 0;

pub const LINE_CAPACITY: usize = 32;

pub type Line = Vec<u8, LINE_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `C`: stream raw sensor samples for offline threshold picking.
    Calibrate,
    /// `M`: trigger the test key and stream the sensor response.
    Measure,
    /// `I`: report the timer resolution (CPU frequency).
    Info,
    /// `K <test> <reset>`: set the trigger and reset keycodes.
    SetKeys { test: u8, reset: u8 },
}

/// Accumulates received bytes into command lines.
///
/// Printable ASCII is buffered; CR or LF completes the line, as does a
/// full buffer. Everything else is dropped on the floor.
#[derive(Default)]
pub struct LineReader {
    buf: Line,
}

impl LineReader {
    pub fn new() -> Self {
        LineReader::default()
    }

    /// Feed one received byte; returns the finished line when this byte
    /// completed one.
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        match byte {
            b'\r' | b'\n' => Some(core::mem::take(&mut self.buf)),
            b' '..=b'~' => {
                // capacity checked one line up
                let _ = self.buf.push(byte);
                if self.buf.is_full() {
                    Some(core::mem::take(&mut self.buf))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Parse one complete line. `None` answers [`REJECTED`].
pub fn parse(line: &[u8]) -> Option<Command> {
    match line.first()? {
        b'C' => Some(Command::Calibrate),
        b'M' => Some(Command::Measure),
        b'I' => Some(Command::Info),
        b'K' => parse_set_keys(line),
        _ => None,
    }
}

/// `K <test> <reset>`: two decimal arguments. Values accumulate into a
/// `u8` with wrapping arithmetic, the same truncation the original
/// firmware got from assigning `atoi` to an 8-bit variable. Trailing
/// bytes after the second number are ignored. A line that filled the
/// whole buffer is rejected since its tail may have been cut off.
fn parse_set_keys(line: &[u8]) -> Option<Command> {
    if line.len() < 3 || line[1] != b' ' || line.len() >= LINE_CAPACITY {
        return None;
    }
    let rest = &line[2..];
    let (test, rest) = parse_decimal(rest)?;
    let rest = rest.strip_prefix(b" ")?;
    let (reset, _) = parse_decimal(rest)?;
    Some(Command::SetKeys { test, reset })
}

/// Leading decimal run of a byte slice; fails on an empty run.
fn parse_decimal(bytes: &[u8]) -> Option<(u8, &[u8])> {
    let end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    if end == 0 {
        return None;
    }
    let mut value: u8 = 0;
    for &digit in &bytes[..end] {
        value = value.wrapping_mul(10).wrapping_add(digit - b'0');
    }
    Some((value, &bytes[end..]))
}

/// The `I` answer: `RESL <hz>\n`.
pub fn info_response(hz: u32) -> String<24> {
    let mut line = String::new();
    // 24 bytes always fits "RESL " + 10 digits + newline
    let _ = write!(line, "RESL {hz}\n");
    line
}

/// One sample: elapsed timer ticks then sensor level, each big-endian.
pub fn encode_sample(elapsed: u16, level: u16) -> [u8; 4] {
    let [elapsed_hi, elapsed_lo] = elapsed.to_be_bytes();
    let [level_hi, level_lo] = level.to_be_bytes();
    [elapsed_hi, elapsed_lo, level_hi, level_lo]
}
