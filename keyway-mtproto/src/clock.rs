//! Message id generation against a server-corrected clock.
//!
//! The upper 32 bits of a message id are Unix seconds; the clock keeps the
//! difference between the server's idea of "now" and ours so that ids stay
//! acceptable to the server even when the local clock drifts.

use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default)]
struct State {
    offset: i64,
    last_id: i64,
}

/// Issues strictly increasing message ids.
///
/// Share it behind an `Arc`; every operation takes one short lock.
#[derive(Debug)]
pub struct MsgIdClock {
    state: Mutex<State>,
    now: fn() -> i64,
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl Default for MsgIdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MsgIdClock {
    /// A clock reading the system time, with no correction applied.
    pub fn new() -> Self {
        Self::with_time_source(unix_now)
    }

    /// A clock reading seconds from `now` instead of the system time.
    pub fn with_time_source(now: fn() -> i64) -> Self {
        Self { state: Mutex::new(State::default()), now }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Align the clock with the seconds carried by a server message id.
    pub fn correct_offset(&self, server_msg_id: i64) {
        let now = (self.now)();
        let offset = (server_msg_id >> 32) - now;
        let mut state = self.lock();
        if state.offset != offset {
            log::debug!("clock offset corrected: {} -> {offset}s", state.offset);
        }
        state.offset = offset;
    }

    /// Seconds to add to local time to get server time.
    pub fn offset(&self) -> i64 {
        self.lock().offset
    }

    /// Next message id: corrected seconds in the upper half, bumped by 2
    /// past the previous id when the second has not changed.
    pub fn next_id(&self) -> i64 {
        let now = (self.now)();
        let mut state = self.lock();
        let mut id = (now + state.offset) << 32;
        if id <= state.last_id {
            id = state.last_id + 2;
        }
        state.last_id = id;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const FIXED: i64 = 1_700_000_000;

    fn fixed() -> i64 {
        FIXED
    }

    #[test]
    fn first_id_carries_the_second() {
        let clock = MsgIdClock::with_time_source(fixed);
        assert_eq!(clock.next_id(), FIXED << 32);
    }

    #[test]
    fn same_second_steps_by_two() {
        let clock = MsgIdClock::with_time_source(fixed);
        let a = clock.next_id();
        let b = clock.next_id();
        let c = clock.next_id();
        assert_eq!(b, a + 2);
        assert_eq!(c, b + 2);
    }

    #[test]
    fn offset_follows_server_seconds() {
        let clock = MsgIdClock::with_time_source(fixed);
        clock.correct_offset((FIXED + 30) << 32 | 0x1234);
        assert_eq!(clock.offset(), 30);
        assert_eq!(clock.next_id() >> 32, FIXED + 30);
    }

    #[test]
    fn backwards_correction_stays_monotonic() {
        let clock = MsgIdClock::with_time_source(fixed);
        let before = clock.next_id();
        clock.correct_offset((FIXED - 100) << 32);
        let after = clock.next_id();
        assert!(after > before);
        assert_eq!(after, before + 2);
    }

    #[test]
    fn concurrent_ids_are_unique() {
        let clock = Arc::new(MsgIdClock::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let clock = Arc::clone(&clock);
                std::thread::spawn(move || (0..500).map(|_| clock.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = Vec::new();
        for h in handles {
            let ids = h.join().unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            all.extend(ids);
        }
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
