//! Drives the command layer the way a host-side client does: raw bytes
//! in, commands and response lines out.

use screentimer::keycodes;
use screentimer::protocol::{self, Command, LineReader};

/// Feed a byte stream and collect every command the reader completes,
/// with `None` marking lines the parser rejected.
fn run_session(input: &[u8]) -> Vec<Option<Command>> {
    let mut reader = LineReader::new();
    let mut commands = Vec::new();
    for &byte in input {
        if let Some(line) = reader.push(byte) {
            commands.push(protocol::parse(&line));
        }
    }
    commands
}

#[test]
fn typical_client_session() {
    let commands = run_session(b"I\r\nK 4 41\r\nC\r\nM\r\n");
    assert_eq!(
        commands,
        vec![
            Some(Command::Info),
            // CRLF: the LF terminates the already-empty next line
            None,
            Some(Command::SetKeys {
                test: keycodes::KEY_A,
                reset: keycodes::KEY_ESC
            }),
            None,
            Some(Command::Calibrate),
            None,
            Some(Command::Measure),
            None,
        ]
    );
}

#[test]
fn bare_newline_terminated_session() {
    let commands = run_session(b"C\nM\n");
    assert_eq!(commands, vec![Some(Command::Calibrate), Some(Command::Measure)]);
}

#[test]
fn line_noise_does_not_derail_the_reader() {
    // modem chatter with control bytes, then a real command
    let commands = run_session(b"\x00\x07ATZ\r\xFF\xFEM\n");
    assert_eq!(commands, vec![None, Some(Command::Measure)]);
}

#[test]
fn rejected_lines_leave_the_reader_usable() {
    let commands = run_session(b"Q\nK nope\nC\n");
    assert_eq!(commands, vec![None, None, Some(Command::Calibrate)]);
}

#[test]
fn overlong_line_splits_at_the_buffer_boundary() {
    let mut input = vec![b'x'; protocol::LINE_CAPACITY + 3];
    input.extend_from_slice(b"\nI\n");
    let commands = run_session(&input);
    // the overflow chunk and the 3-byte remainder both reject
    assert_eq!(commands, vec![None, None, Some(Command::Info)]);
}

#[test]
fn measure_stream_walks_like_a_client_reads_it() {
    let samples = [(120u16, 512u16), (35, 510), (40, 700)];
    let mut stream: Vec<u8> = Vec::new();
    stream.extend_from_slice(protocol::MEASURE_START);
    stream.extend_from_slice(&protocol::MEASURE_VARIANCE.to_be_bytes());
    for &(elapsed, level) in &samples {
        stream.extend_from_slice(&protocol::encode_sample(elapsed, level));
    }
    stream.extend_from_slice(&protocol::STREAM_COMPLETE);

    // a client reads the status line, a 2-byte big-endian jitter field,
    // then 4-byte records until a terminator, and keys success off the
    // terminator ending in 0xFE
    let newline = stream.iter().position(|&b| b == b'\n').unwrap();
    assert_eq!(&stream[..=newline], protocol::MEASURE_START);
    let mut rest = &stream[newline + 1..];
    assert_eq!(
        u16::from_be_bytes([rest[0], rest[1]]),
        protocol::MEASURE_VARIANCE
    );
    rest = &rest[2..];
    let mut records = Vec::new();
    loop {
        let (record, tail) = rest.split_at(4);
        rest = tail;
        if record == protocol::STREAM_COMPLETE || record == protocol::STREAM_ABORTED {
            assert_eq!(record, protocol::STREAM_COMPLETE, "clean run read as failed");
            break;
        }
        records.push((
            u16::from_be_bytes([record[0], record[1]]),
            u16::from_be_bytes([record[2], record[3]]),
        ));
    }
    assert!(rest.is_empty());
    assert_eq!(records, samples);
}

#[test]
fn stream_terminators_are_distinguishable_from_samples() {
    // a sample's elapsed field of 0xFFFF can never be followed by a
    // level above 0x03FF, so both terminators sit outside sample space
    let max_sample = protocol::encode_sample(0xFFFF, 0x03FF);
    assert_ne!(max_sample, protocol::STREAM_COMPLETE);
    assert_ne!(max_sample, protocol::STREAM_ABORTED);
    assert_ne!(protocol::STREAM_COMPLETE, protocol::STREAM_ABORTED);
}

#[test]
fn banner_and_info_are_single_lines() {
    assert_eq!(protocol::BANNER.iter().filter(|&&b| b == b'\n').count(), 1);
    assert!(protocol::BANNER.ends_with(b"\n"));
    let info = protocol::info_response(16_000_000);
    assert!(info.as_bytes().ends_with(b"\n"));
}
