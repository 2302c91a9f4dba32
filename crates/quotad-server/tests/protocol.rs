//! Dispatcher-level protocol tests with a manually driven clock.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::BytesMut;

use quotad_core::protocol::frame::FrameBuffer;
use quotad_core::{Clock, ManualClock, Policy, RateLimit};
use quotad_server::dispatch::Dispatcher;

fn dispatcher(count: u32, period_s: u64, dynamic: bool) -> (Dispatcher, ManualClock) {
    let (clock, driver) = Clock::manual(1000);
    let list = RateLimit::with_clock(Policy::new(count, Duration::from_secs(period_s)), clock)
        .unwrap();
    (
        Dispatcher::new(Arc::new(Mutex::new(list)), dynamic),
        driver,
    )
}

fn feed(dispatcher: &Dispatcher, frame: &mut FrameBuffer, data: &[u8]) -> (Vec<u8>, bool) {
    let mut out = BytesMut::new();
    let keep_open = frame.feed(data, |line| dispatcher.dispatch(line, &mut out));
    (out.to_vec(), keep_open)
}

#[test]
fn incr_admits_then_rejects() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\n");
    assert_eq!(out, b"0\r\n");

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\n");
    assert_eq!(out, b"1\r\n");
}

#[test]
fn pipelined_commands_reply_in_order() {
    let (d, driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\nincr bar\r\n");
    assert_eq!(out, b"0\r\n0\r\n");

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\nincr baz\r\nincr bar\r\n");
    assert_eq!(out, b"1\r\n0\r\n1\r\n");

    driver.advance(50);
    let (out, _) = feed(&d, &mut frame, b"get foo bar baz qux\r\n");
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.split("\r\n").collect();
    assert_eq!(lines.len(), 8);

    for (i, key) in ["foo", "bar", "baz"].iter().enumerate() {
        let header = lines[i * 2];
        assert!(header.starts_with(&format!("VALUE {key} 0 ")), "{header}");
        let value: f64 = lines[i * 2 + 1].parse().unwrap();
        assert!((1.9..2.0).contains(&value), "{value}");
    }
    assert_eq!(lines[6], "END");
    assert_eq!(lines[7], "");
}

#[test]
fn get_without_entries_is_just_end() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();
    let (out, _) = feed(&d, &mut frame, b"get foo\r\n");
    assert_eq!(out, b"END\r\n");
}

#[test]
fn incr_noreply_is_silent() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();

    let (out, _) = feed(&d, &mut frame, b"incr foo noreply\r\n");
    assert!(out.is_empty());

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\n");
    assert_eq!(out, b"1\r\n");
}

#[test]
fn delete_frees_the_key() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\nincr bar\r\n");
    assert_eq!(out, b"0\r\n0\r\n");

    let (out, _) = feed(&d, &mut frame, b"delete foo\r\n");
    assert_eq!(out, b"DELETED\r\n");

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\nincr bar\r\n");
    assert_eq!(out, b"0\r\n1\r\n");

    let (out, _) = feed(&d, &mut frame, b"delete baz\r\n");
    assert_eq!(out, b"NOT_FOUND\r\n");
}

#[test]
fn delete_noreply_is_silent() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\n");
    assert_eq!(out, b"0\r\n");

    let (out, _) = feed(&d, &mut frame, b"delete foo noreply\r\n");
    assert!(out.is_empty());

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\n");
    assert_eq!(out, b"0\r\n");
}

#[test]
fn unknown_command_keeps_the_connection() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();

    let (out, keep_open) = feed(&d, &mut frame, b"set foo 0 0 3\r\n");
    assert_eq!(out, b"ERROR unknown command\r\n");
    assert!(keep_open);

    let (out, _) = feed(&d, &mut frame, b"incr foo\r\n");
    assert_eq!(out, b"0\r\n");
}

#[test]
fn missing_key_is_a_plain_error() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();

    let (out, keep_open) = feed(&d, &mut frame, b"incr\r\n");
    assert_eq!(out, b"ERROR\r\n");
    assert!(keep_open);

    let (out, _) = feed(&d, &mut frame, b"delete\r\n");
    assert_eq!(out, b"ERROR\r\n");
}

#[test]
fn oversized_line_closes_without_reply() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();

    let mut data = b"incr ".to_vec();
    data.extend(std::iter::repeat(b'b').take(270_000));

    let (out, keep_open) = feed(&d, &mut frame, &data);
    assert!(out.is_empty());
    assert!(!keep_open);
}

#[test]
fn lf_only_lines_are_accepted() {
    let (d, _driver) = dispatcher(1, 2, false);
    let mut frame = FrameBuffer::new();
    let (out, _) = feed(&d, &mut frame, b"incr foo\n");
    assert_eq!(out, b"0\r\n");
}

#[test]
fn dynamic_mode_routes_spec_keys_to_their_own_policy() {
    let (d, _driver) = dispatcher(10, 10, true);
    let mut frame = FrameBuffer::new();

    // child policy 1/4s: second hit rejected even though the root allows 10
    let (out, _) = feed(&d, &mut frame, b"incr 1/4:foo\r\nincr 1/4:foo\r\n");
    assert_eq!(out, b"0\r\n1\r\n");

    // distinct residual keys are tracked separately within the child
    let (out, _) = feed(&d, &mut frame, b"incr 1/4:other\r\n");
    assert_eq!(out, b"0\r\n");

    // no usable spec falls back to the root policy with the whole key
    let (out, _) = feed(&d, &mut frame, b"incr plain\r\nincr plain\r\n");
    assert_eq!(out, b"0\r\n0\r\n");
}

#[test]
fn dynamic_keys_do_not_pollute_the_root_list() {
    let (d, _driver) = dispatcher(10, 10, true);
    let mut frame = FrameBuffer::new();

    let (out, _) = feed(&d, &mut frame, b"incr 1/4:foo\r\n");
    assert_eq!(out, b"0\r\n");

    // get consults the root list only
    let (out, _) = feed(&d, &mut frame, b"get 1/4:foo foo\r\n");
    assert_eq!(out, b"END\r\n");
}
