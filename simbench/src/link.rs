//! A simulated one-way link with loss, latency, jitter and reordering.

use replication::{SyncMessage, Transport};
use serde::{Deserialize, Serialize};

use crate::rng::Rng;

/// Link behaviour, in seconds and probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkConditions {
    pub latency: f32,
    /// Extra delay drawn uniformly from `[0, jitter)` per message.
    pub jitter: f32,
    pub loss: f32,
    /// Chance a message is held back behind the ones sent after it.
    pub reorder: f32,
    pub reorder_delay: f32,
}

impl LinkConditions {
    #[must_use]
    pub const fn perfect() -> Self {
        Self {
            latency: 0.0,
            jitter: 0.0,
            loss: 0.0,
            reorder: 0.0,
            reorder_delay: 0.0,
        }
    }

    #[must_use]
    pub const fn lossy(loss: f32) -> Self {
        Self {
            latency: 0.03,
            loss,
            ..Self::perfect()
        }
    }

    #[must_use]
    pub const fn jittery(latency: f32, jitter: f32) -> Self {
        Self {
            latency,
            jitter,
            ..Self::perfect()
        }
    }

    #[must_use]
    pub const fn reordering(reorder: f32) -> Self {
        Self {
            latency: 0.03,
            reorder,
            reorder_delay: 0.1,
            ..Self::perfect()
        }
    }
}

#[derive(Debug)]
struct InFlight {
    deliver_at: f32,
    sequence: u64,
    message: SyncMessage,
}

/// Messages in flight between the owner and one observer.
///
/// The link is the owner's [`Transport`]; every message it is handed, to the
/// server or broadcast, goes to the same observer.
#[derive(Debug)]
pub struct SimLink {
    conditions: LinkConditions,
    rng: Rng,
    now: f32,
    next_sequence: u64,
    in_flight: Vec<InFlight>,
    pub sent: u64,
    pub dropped: u64,
    pub bytes_sent: u64,
}

impl SimLink {
    #[must_use]
    pub const fn new(conditions: LinkConditions, seed: u64) -> Self {
        Self {
            conditions,
            rng: Rng::new(seed),
            now: 0.0,
            next_sequence: 0,
            in_flight: Vec::new(),
            sent: 0,
            dropped: 0,
            bytes_sent: 0,
        }
    }

    /// Sets the send time for messages queued until the next call.
    pub fn set_time(&mut self, now: f32) {
        self.now = now;
    }

    /// Removes every message due at `now`, in arrival order.
    pub fn deliver(&mut self, now: f32) -> Vec<SyncMessage> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.in_flight.len() {
            if self.in_flight[index].deliver_at <= now {
                due.push(self.in_flight.swap_remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by(|a, b| {
            a.deliver_at
                .total_cmp(&b.deliver_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        due.into_iter().map(|flight| flight.message).collect()
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn push(&mut self, message: SyncMessage) {
        self.sent += 1;
        if let SyncMessage::Transform(bytes) = &message {
            self.bytes_sent += bytes.len() as u64;
        }
        if self.rng.chance(self.conditions.loss) {
            self.dropped += 1;
            return;
        }
        let mut delay = self.conditions.latency;
        if self.conditions.jitter > 0.0 {
            delay += self.rng.range_f32(0.0, self.conditions.jitter);
        }
        if self.rng.chance(self.conditions.reorder) {
            delay += self.conditions.reorder_delay;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.in_flight.push(InFlight {
            deliver_at: self.now + delay,
            sequence,
            message,
        });
    }
}

impl Transport for SimLink {
    fn send_to_server(&mut self, message: SyncMessage) {
        self.push(message);
    }

    fn broadcast(&mut self, message: SyncMessage) {
        self.push(message);
    }
}
