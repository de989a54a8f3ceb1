use crate::icmp::v4::SequenceNumber;
use std::collections::HashMap;
use tokio::time::Instant;

/// Echo requests awaiting a reply, keyed by identifier and sequence number.
pub(crate) struct PendingRequests {
    send_times: HashMap<(u16, SequenceNumber), Instant>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self { send_times: HashMap::new() }
    }

    pub(crate) fn insert(&mut self, identifier: u16, sequence: SequenceNumber, send_time: Instant) {
        if self.send_times.insert((identifier, sequence), send_time).is_some() {
            tracing::debug!(identifier, %sequence, "replacing pending request");
        }
    }

    /// Removes and returns the send time of a matching request.
    pub(crate) fn take(&mut self, identifier: u16, sequence: SequenceNumber) -> Option<Instant> {
        self.send_times.remove(&(identifier, sequence))
    }

    pub(crate) fn clear(&mut self) {
        self.send_times.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.send_times.len()
    }
}
