// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::broker::tasks::Task;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("task queue closed")]
    Closed,
}

/// Work-queue seam for the broker.
///
/// The contract mirrors a durable external queue: finite delivery delay,
/// at-least-once under transport retries, and no delivery of tasks the
/// workers marked fatal. The in-memory variant satisfies the contract for a
/// single process; production deployments plug a durable implementation in
/// here.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    fn enqueue(&self, task: Task) -> Result<(), QueueError>;

    /// Next task, or `None` once the queue is closed and drained.
    async fn dequeue(&self) -> Option<Task>;
}

pub struct MemoryTaskQueue {
    tx: mpsc::UnboundedSender<Task>,
    rx: Mutex<mpsc::UnboundedReceiver<Task>>,
}

impl MemoryTaskQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

impl Default for MemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    fn enqueue(&self, task: Task) -> Result<(), QueueError> {
        self.tx.send(task).map_err(|_| QueueError::Closed)
    }

    async fn dequeue(&self) -> Option<Task> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::tasks::TaskKind;

    #[tokio::test]
    async fn enqueue_dequeue_preserves_order() {
        let queue = MemoryTaskQueue::new();
        queue
            .enqueue(Task {
                kind: TaskKind::ApiCall,
                payload: b"one".to_vec(),
                attempt: 0,
            })
            .unwrap();
        queue
            .enqueue(Task {
                kind: TaskKind::ApiResult,
                payload: b"two".to_vec(),
                attempt: 0,
            })
            .unwrap();

        assert_eq!(queue.dequeue().await.unwrap().payload, b"one");
        assert_eq!(queue.dequeue().await.unwrap().payload, b"two");
    }
}
