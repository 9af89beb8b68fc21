//! MemoryQueue - volatile bounded queue

use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use contracts::{DurableQueue, QueueError};
use ringbuf::{traits::*, HeapRb};

/// In-process queue with the same eviction rules as [`FileQueue`](super::FileQueue)
///
/// Not durable across restarts; used in tests and dry runs.
pub struct MemoryQueue {
    capacity: usize,
    ring: Mutex<HeapRb<Bytes>>,
}

impl MemoryQueue {
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity);
        }
        Ok(Self {
            capacity,
            ring: Mutex::new(HeapRb::new(capacity)),
        })
    }
}

impl DurableQueue for MemoryQueue {
    fn enqueue(&self, record: Bytes) -> Result<(), QueueError> {
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        ring.push_overwrite(record);
        Ok(())
    }

    fn drain_all(&self) -> Result<Vec<Bytes>, QueueError> {
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(ring.pop_iter().collect())
    }

    fn peek_all(&self) -> Result<Vec<Bytes>, QueueError> {
        let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(ring.iter().cloned().collect())
    }

    fn replace_front(&self, count: usize, records: Vec<Bytes>) -> Result<(), QueueError> {
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        ring.skip(count);
        for record in records {
            ring.push_overwrite(record);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .occupied_len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
