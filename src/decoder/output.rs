// src/decoder/output.rs

use ringbuf::traits::Producer as RbProducer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Blocking push into the playback ring buffer.
///
/// Waits while the buffer is full. Returns `false` as soon as `shutdown` is
/// raised so a closed clip never leaves the decoder thread spinning.
pub fn push_all<P: RbProducer<Item = f32>>(
    producer: &mut P,
    data: &[f32],
    shutdown: &AtomicBool,
) -> bool {
    let mut idx = 0usize;
    while idx < data.len() {
        if shutdown.load(Ordering::Relaxed) {
            return false;
        }
        let pushed = producer.push_slice(&data[idx..]);
        if pushed == 0 {
            std::thread::park_timeout(Duration::from_millis(2));
        }
        idx += pushed;
    }
    true
}
