//! Command parsing and reply formatting.
//!
//! Lines split on single spaces, so consecutive spaces produce empty
//! tokens and an empty token is a legal (empty) key.

use bytes::BytesMut;

pub const REPLY_ADMITTED: &[u8] = b"0\r\n";
pub const REPLY_REJECTED: &[u8] = b"1\r\n";
pub const REPLY_DELETED: &[u8] = b"DELETED\r\n";
pub const REPLY_NOT_FOUND: &[u8] = b"NOT_FOUND\r\n";
pub const REPLY_END: &[u8] = b"END\r\n";
pub const REPLY_UNKNOWN: &[u8] = b"ERROR unknown command\r\n";
pub const REPLY_ERROR: &[u8] = b"ERROR\r\n";

/// One parsed request line. Surplus positional arguments are ignored.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Incr { key: &'a str, noreply: bool },
    Get { keys: Vec<&'a str> },
    Delete { key: &'a str, noreply: bool },
    /// Known command shape with a missing required argument.
    Malformed,
    /// Anything else.
    Unknown,
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let mut parts = line.split(' ');
        match parts.next().unwrap_or("") {
            "incr" => match parts.next() {
                Some(key) => Command::Incr {
                    key,
                    noreply: parts.next() == Some("noreply"),
                },
                None => Command::Malformed,
            },
            "get" => Command::Get {
                keys: parts.collect(),
            },
            "delete" => match parts.next() {
                Some(key) => Command::Delete {
                    key,
                    noreply: parts.next() == Some("noreply"),
                },
                None => Command::Malformed,
            },
            _ => Command::Unknown,
        }
    }
}

/// Append a `VALUE` block for one key. The payload is the wait in seconds,
/// rendered with at least one fractional digit and trailing zeros trimmed
/// (`9.0`, `1.95`, `0.05`).
pub fn write_value(key: &str, wait_ms: u32, out: &mut BytesMut) {
    let value = seconds_repr(wait_ms);
    out.extend_from_slice(format!("VALUE {} 0 {}\r\n", key, value.len()).as_bytes());
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}

fn seconds_repr(ms: u32) -> String {
    let secs = ms / 1000;
    let frac = ms % 1000;
    if frac == 0 {
        return format!("{secs}.0");
    }
    let frac = format!("{frac:03}");
    format!("{}.{}", secs, frac.trim_end_matches('0'))
}
