//! In-memory run queue for development and testing
//!
//! Items stay in the backing Vec after they are claimed so `complete` and
//! `fail` can find them. Dequeue is FIFO over pending items. Nothing is
//! persisted across restarts.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use cryptforge_domain::{QueueItemId, RunId, RunJob};

use crate::infrastructure::ports::{
    ClockPort, QueueError, QueueItem, QueueItemStatus, RunQueuePort,
};

/// In-memory run queue implementation
pub struct InMemoryRunQueue {
    items: RwLock<Vec<QueueItem>>,
    clock: Arc<dyn ClockPort>,
}

impl InMemoryRunQueue {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            clock,
        }
    }

    pub async fn get(&self, id: QueueItemId) -> Option<QueueItem> {
        let items = self.items.read().await;
        items.iter().find(|i| i.id == id).cloned()
    }

    pub async fn list_by_status(&self, status: QueueItemStatus) -> Vec<QueueItem> {
        let items = self.items.read().await;
        items
            .iter()
            .filter(|i| i.status == status)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RunQueuePort for InMemoryRunQueue {
    async fn enqueue(&self, job: RunJob) -> Result<QueueItemId, QueueError> {
        let item = QueueItem::new(job, self.clock.now());
        let id = item.id;
        self.items.write().await.push(item);
        Ok(id)
    }

    async fn dequeue(&self) -> Result<Option<QueueItem>, QueueError> {
        let mut items = self.items.write().await;

        // Items are pushed in creation order, so the first pending one is the oldest
        let Some(item) = items
            .iter_mut()
            .find(|i| i.status == QueueItemStatus::Pending)
        else {
            return Ok(None);
        };

        item.status = QueueItemStatus::Processing;
        item.attempts += 1;
        Ok(Some(item.clone()))
    }

    async fn complete(&self, id: QueueItemId) -> Result<(), QueueError> {
        let mut items = self.items.write().await;
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.status = QueueItemStatus::Completed;
            Ok(())
        } else {
            Err(QueueError::NotFound(id.to_string()))
        }
    }

    async fn fail(&self, id: QueueItemId, error: &str) -> Result<(), QueueError> {
        let mut items = self.items.write().await;
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.status = QueueItemStatus::Failed;
            item.error_message = Some(error.to_string());
            Ok(())
        } else {
            Err(QueueError::NotFound(id.to_string()))
        }
    }

    async fn depth(&self) -> Result<usize, QueueError> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|i| i.status == QueueItemStatus::Pending)
            .count())
    }

    async fn find_run(&self, run_id: RunId) -> Result<Option<QueueItem>, QueueError> {
        let items = self.items.read().await;
        Ok(items.iter().rev().find(|i| i.job.run_id == run_id).cloned())
    }
}
