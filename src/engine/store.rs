//! In-memory request store: FIFO queue, result records, in-flight counter.
//!
//! Plain data, no locking. [`RequestTracker`](super::RequestTracker) wraps
//! it in a single mutex and holds that mutex for every read-modify-write,
//! so each method here is one atomic step from a reader's point of view.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{QueueStats, RequestId, ResultRecord, Status, WorkItem};

#[derive(Debug, Default)]
pub struct RequestStore {
    records: HashMap<RequestId, ResultRecord>,
    /// Submission order of every record still held. Defines "oldest".
    order: VecDeque<RequestId>,
    queue: VecDeque<WorkItem>,
    in_flight: usize,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new item as queued and put it at the back of the queue.
    pub fn enqueue(&mut self, item: WorkItem) -> ResultRecord {
        let record = ResultRecord::queued(&item);
        self.records.insert(item.id, record.clone());
        self.order.push_back(item.id);
        self.queue.push_back(item);
        record
    }

    /// Atomic check-and-admit: pop the next item only if a slot is free.
    pub fn admit(&mut self, max_concurrent: usize) -> Option<WorkItem> {
        if self.in_flight >= max_concurrent {
            return None;
        }
        let item = self.queue.pop_front()?;
        self.in_flight += 1;
        Some(item)
    }

    /// Give back a slot taken by [`admit`](Self::admit).
    pub fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Queued -> processing.
    pub fn start(&mut self, id: RequestId) -> Result<()> {
        self.transition(id, Status::Processing)?;
        Ok(())
    }

    /// Processing -> completed, with the normalized response.
    pub fn complete(&mut self, id: RequestId, response: String) -> Result<()> {
        let record = self.transition(id, Status::Completed)?;
        record.response = Some(response);
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Queued or processing -> error.
    pub fn fail(&mut self, id: RequestId, error: String) -> Result<()> {
        let record = self.transition(id, Status::Error)?;
        record.error = Some(error);
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, id: RequestId, to: Status) -> Result<&mut ResultRecord> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("request {id}")))?;
        if !record.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: record.status.to_string(),
                to: to.to_string(),
            });
        }
        record.status = to;
        Ok(record)
    }

    /// Bound the store. Once more than `capacity` records are held, drop the
    /// oldest terminal records until at most `capacity / 2` terminal ones
    /// remain. Queued and processing records are never touched.
    ///
    /// Returns the evicted IDs, oldest first.
    pub fn evict(&mut self, capacity: usize) -> Vec<RequestId> {
        if self.records.len() <= capacity {
            return Vec::new();
        }

        let terminal: Vec<RequestId> = self
            .order
            .iter()
            .filter(|id| self.records.get(id).is_some_and(|r| r.status.is_terminal()))
            .copied()
            .collect();

        let keep = capacity / 2;
        if terminal.len() <= keep {
            return Vec::new();
        }

        let evicted: Vec<RequestId> = terminal[..terminal.len() - keep].to_vec();
        let gone: HashSet<RequestId> = evicted.iter().copied().collect();
        for id in &evicted {
            self.records.remove(id);
        }
        self.order.retain(|id| !gone.contains(id));
        evicted
    }

    pub fn get(&self, id: RequestId) -> Result<ResultRecord> {
        self.records
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("request {id}")))
    }

    /// The `limit` most recently submitted records, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ResultRecord> {
        let skip = self.order.len().saturating_sub(limit);
        self.order
            .iter()
            .skip(skip)
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn stats(&self, max_concurrent: usize) -> QueueStats {
        QueueStats {
            queue_size: self.queue.len(),
            active_requests: self.in_flight,
            stored_requests: self.records.len(),
            max_concurrent,
        }
    }
}
