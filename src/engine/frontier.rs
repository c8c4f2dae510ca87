//! The crawl frontier: a concurrent, growable queue of pending work items.

use crate::rules::WorkItem;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

/// Unbounded multi-producer multi-consumer queue of [`WorkItem`]s.
///
/// Every enqueued item is dequeued exactly once, by exactly one worker,
/// provided at least one worker keeps polling. Ordering is FIFO from a
/// single producer but not strict across concurrent producers.
///
/// The frontier is owned by the engine and handed to workers; there is no
/// ambient or static queue state.
pub struct Frontier {
    queue: Mutex<VecDeque<WorkItem>>,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Adds an item to the frontier. Never blocks beyond lock contention.
    pub fn enqueue(&self, item: WorkItem) {
        self.queue.lock().unwrap().push_back(item);
        self.notify.notify_one();
    }

    /// Removes the next item, waiting up to `timeout` for one to arrive.
    ///
    /// The timeout is a fixed deadline per call: a worker woken by an
    /// enqueue that then loses the item to a faster worker keeps waiting
    /// only until its original deadline. Returns `None` on expiry, which a
    /// worker reads as "the crawl is drained".
    pub async fn dequeue(&self, timeout: Duration) -> Option<WorkItem> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(item) = self.queue.lock().unwrap().pop_front() {
                return Some(item);
            }

            if timeout_at(deadline, self.notify.notified()).await.is_err() {
                // Deadline hit. A notification for an item claimed by
                // another worker may have burned our wait; take whatever
                // arrived in the meantime rather than dropping it.
                return self.queue.lock().unwrap().pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::WorkItem;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Instant as StdInstant;

    fn item(location: &str) -> WorkItem {
        WorkItem::seed(location, Vec::new())
    }

    #[tokio::test]
    async fn test_enqueue_then_dequeue() {
        let frontier = Frontier::new();
        frontier.enqueue(item("https://example.com/a"));

        let dequeued = frontier.dequeue(Duration::from_millis(100)).await;
        assert_eq!(
            dequeued.map(|i| i.location),
            Some("https://example.com/a".to_string())
        );
        assert!(frontier.is_empty());
    }

    #[tokio::test]
    async fn test_dequeue_preserves_fifo_from_one_producer() {
        let frontier = Frontier::new();
        for n in 0..5 {
            frontier.enqueue(item(&format!("https://example.com/{}", n)));
        }

        for n in 0..5 {
            let dequeued = frontier.dequeue(Duration::from_millis(100)).await.unwrap();
            assert_eq!(dequeued.location, format!("https://example.com/{}", n));
        }
    }

    #[tokio::test]
    async fn test_dequeue_times_out_on_empty_frontier() {
        let frontier = Frontier::new();
        let timeout = Duration::from_millis(200);

        let start = StdInstant::now();
        let dequeued = frontier.dequeue(timeout).await;

        assert!(dequeued.is_none());
        assert!(start.elapsed() >= timeout);
    }

    #[tokio::test]
    async fn test_dequeue_receives_item_enqueued_mid_wait() {
        let frontier = Arc::new(Frontier::new());

        let producer = Arc::clone(&frontier);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            producer.enqueue(item("https://example.com/late"));
        });

        let dequeued = frontier.dequeue(Duration::from_secs(2)).await;
        assert_eq!(
            dequeued.map(|i| i.location),
            Some("https://example.com/late".to_string())
        );
    }

    #[tokio::test]
    async fn test_concurrent_dequeuers_each_item_delivered_once() {
        let frontier = Arc::new(Frontier::new());
        for n in 0..50 {
            frontier.enqueue(item(&format!("https://example.com/{}", n)));
        }

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let frontier = Arc::clone(&frontier);
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(item) = frontier.dequeue(Duration::from_millis(200)).await {
                    seen.push(item.location);
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }

        assert_eq!(all.len(), 50);
        let distinct: HashSet<_> = all.into_iter().collect();
        assert_eq!(distinct.len(), 50);
    }
}
