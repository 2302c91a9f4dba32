//! Maps protocol lines onto the shared rate-limit list.

use std::sync::{Mutex, MutexGuard};

use bytes::BytesMut;

use quotad_core::protocol::command::{self, Command};
use quotad_core::{RateLimit, SharedRateLimit};

/// Line dispatcher shared by every connection of one acceptor.
pub struct Dispatcher {
    root: SharedRateLimit,
    dynamic: bool,
}

impl Dispatcher {
    pub fn new(root: SharedRateLimit, dynamic: bool) -> Self {
        Self { root, dynamic }
    }

    /// Handle one request line, appending any reply bytes to `out`.
    pub fn dispatch(&self, line: &str, out: &mut BytesMut) {
        match Command::parse(line) {
            Command::Incr { key, noreply } => {
                let admitted = self.incr(key);
                if !noreply {
                    out.extend_from_slice(if admitted {
                        command::REPLY_ADMITTED
                    } else {
                        command::REPLY_REJECTED
                    });
                }
            }
            Command::Get { keys } => {
                let list = lock(&self.root);
                for key in keys {
                    if let Some(wait_ms) = list.next_hit(key) {
                        command::write_value(key, wait_ms, out);
                    }
                }
                out.extend_from_slice(command::REPLY_END);
            }
            Command::Delete { key, noreply } => {
                let removed = lock(&self.root).remove(key);
                if !noreply {
                    out.extend_from_slice(if removed {
                        command::REPLY_DELETED
                    } else {
                        command::REPLY_NOT_FOUND
                    });
                }
            }
            Command::Malformed => out.extend_from_slice(command::REPLY_ERROR),
            Command::Unknown => out.extend_from_slice(command::REPLY_UNKNOWN),
        }
    }

    fn incr(&self, key: &str) -> bool {
        let mut root = lock(&self.root);
        if self.dynamic {
            if let Some((child, rest)) = root.dynlist(key) {
                drop(root);
                return lock(&child).hit(&rest);
            }
        }
        root.hit(key)
    }
}

/// A poisoned lock still holds a consistent list; take it and move on.
fn lock(list: &Mutex<RateLimit>) -> MutexGuard<'_, RateLimit> {
    list.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
