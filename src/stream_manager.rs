//! Exclusive owner of every stream on one connection.
//! https://httpwg.org/specs/rfc7540.html#StreamIdentifiers

use crate::error::ErrorCode;
use crate::stream::{Priority, Stream, StreamState};
use crate::types::{is_client_initiated, StreamId};
use std::collections::{HashMap, HashSet};

pub struct StreamManager {
    streams: HashMap<StreamId, Stream>,
    pub last_processed_id: StreamId,
    pub highest_seen_client_id: StreamId,
    closed_ids: HashSet<StreamId>,
    pending_priority: HashMap<StreamId, Priority>,
    pub local_initial_window: i64,
    pub remote_initial_window: i64,
    pub max_concurrent: u32,
}

impl StreamManager {
    #[must_use]
    pub fn new(local_initial_window: i64, remote_initial_window: i64, max_concurrent: u32) -> Self {
        Self {
            streams: HashMap::new(),
            last_processed_id: 0,
            highest_seen_client_id: 0,
            closed_ids: HashSet::new(),
            pending_priority: HashMap::new(),
            local_initial_window,
            remote_initial_window,
            max_concurrent,
        }
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.streams.values().filter(|s| !s.is_closed()).count()
    }

    #[must_use]
    pub fn get(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(&id)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: StreamId) -> Option<&mut Stream> {
        self.streams.get_mut(&id)
    }

    #[must_use]
    pub fn is_closed_id(&self, id: StreamId) -> bool {
        self.closed_ids.contains(&id)
    }

    /// Validates stream-id parity and monotonicity for a new client-initiated
    /// HEADERS frame, then creates and returns the stream. Any pending
    /// priority recorded while the stream was idle is applied immediately.
    pub fn open_client_stream(&mut self, id: StreamId) -> Result<&mut Stream, ErrorCode> {
        if !is_client_initiated(id) {
            return Err(ErrorCode::ProtocolError);
        }
        if id <= self.highest_seen_client_id {
            return Err(ErrorCode::ProtocolError);
        }
        // Bump before the capacity check: a refused id is still spent and must
        // never be reused, even though no Stream gets created for it.
        self.highest_seen_client_id = id;
        if self.active_count() as u32 >= self.max_concurrent {
            self.closed_ids.insert(id);
            return Err(ErrorCode::RefusedStream);
        }
        let mut stream = Stream::new(id, self.local_initial_window, self.remote_initial_window);
        if let Some(priority) = self.pending_priority.remove(&id) {
            stream.priority = priority;
        }
        self.streams.insert(id, stream);
        Ok(self.streams.get_mut(&id).expect("just inserted"))
    }

    /// Records a PRIORITY frame for a stream that does not exist yet, without
    /// creating the stream or counting against the concurrency limit.
    pub fn set_pending_priority(&mut self, id: StreamId, priority: Priority) {
        if let Some(stream) = self.streams.get_mut(&id) {
            stream.priority = priority;
        } else {
            self.pending_priority.insert(id, priority);
        }
    }

    /// Marks an id closed without ever creating a `Stream` for it — used for
    /// frames (e.g. RST_STREAM) that are valid on an idle stream and simply
    /// retire it.
    pub fn mark_closed(&mut self, id: StreamId) {
        self.closed_ids.insert(id);
    }

    /// Removes a stream once it has transitioned to `Closed`, recording its
    /// id so a later frame referencing it is recognized as "already closed"
    /// rather than "never existed".
    pub fn retire_closed(&mut self, id: StreamId) {
        if let Some(stream) = self.streams.get(&id) {
            if stream.state == StreamState::Closed {
                self.streams.remove(&id);
                self.closed_ids.insert(id);
            }
        }
    }

    pub fn retire_all(&mut self) {
        for id in self.streams.keys().copied().collect::<Vec<_>>() {
            self.closed_ids.insert(id);
        }
        self.streams.clear();
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Stream)) {
        for stream in self.streams.values_mut() {
            f(stream);
        }
    }

    pub fn ids_in_insertion_order(&self) -> Vec<StreamId> {
        let mut ids: Vec<StreamId> = self.streams.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_even_client_stream_id() {
        let mut mgr = StreamManager::new(65_535, 65_535, 100);
        assert_eq!(mgr.open_client_stream(2), Err(ErrorCode::ProtocolError));
    }

    #[test]
    fn rejects_non_monotonic_stream_id() {
        let mut mgr = StreamManager::new(65_535, 65_535, 100);
        mgr.open_client_stream(3).unwrap();
        assert_eq!(mgr.open_client_stream(1), Err(ErrorCode::ProtocolError));
    }

    #[test]
    fn refuses_stream_over_concurrency_limit() {
        let mut mgr = StreamManager::new(65_535, 65_535, 1);
        mgr.open_client_stream(1).unwrap();
        assert_eq!(mgr.open_client_stream(3), Err(ErrorCode::RefusedStream));
    }

    #[test]
    fn pending_priority_applies_on_stream_creation() {
        let mut mgr = StreamManager::new(65_535, 65_535, 100);
        mgr.set_pending_priority(1, Priority { dep_id: 0, exclusive: true, weight: 42 });
        let stream = mgr.open_client_stream(1).unwrap();
        assert_eq!(stream.priority.weight, 42);
        assert!(stream.priority.exclusive);
    }

    #[test]
    fn retiring_closed_stream_moves_its_id_to_closed_set() {
        let mut mgr = StreamManager::new(65_535, 65_535, 100);
        mgr.open_client_stream(1).unwrap();
        mgr.get_mut(1).unwrap().state = StreamState::Closed;
        mgr.retire_closed(1);
        assert!(mgr.get(1).is_none());
        assert!(mgr.is_closed_id(1));
    }

    #[test]
    fn mark_closed_retires_an_id_with_no_stream_ever_created() {
        let mut mgr = StreamManager::new(65_535, 65_535, 100);
        mgr.mark_closed(3);
        assert!(mgr.get(3).is_none());
        assert!(mgr.is_closed_id(3));
    }
}
