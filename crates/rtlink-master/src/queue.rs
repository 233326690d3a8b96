use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::entry::QueueRequest;

#[derive(Debug)]
struct Shared {
    entries: Mutex<VecDeque<QueueRequest>>,
    depth: usize,
}

/// Control-region half of the write/request queue.
#[derive(Debug)]
pub(crate) struct QueueProducer {
    shared: Arc<Shared>,
}

/// Transmit-region half of the write/request queue.
#[derive(Debug)]
pub(crate) struct QueueConsumer {
    shared: Arc<Shared>,
}

/// Create a bounded queue of the given depth. One producer, one
/// consumer; entries come out strictly in push order.
pub(crate) fn bounded(depth: usize) -> (QueueProducer, QueueConsumer) {
    let shared = Arc::new(Shared {
        entries: Mutex::new(VecDeque::with_capacity(depth)),
        depth,
    });
    (
        QueueProducer {
            shared: Arc::clone(&shared),
        },
        QueueConsumer { shared },
    )
}

impl QueueProducer {
    /// Whether the queue can accept another entry.
    pub fn writable(&self) -> bool {
        self.shared.entries.lock().expect("queue poisoned").len() < self.shared.depth
    }

    /// Push an entry; returns `false` without queuing when full.
    pub fn try_push(&self, request: QueueRequest) -> bool {
        let mut entries = self.shared.entries.lock().expect("queue poisoned");
        if entries.len() >= self.shared.depth {
            return false;
        }
        entries.push_back(request);
        true
    }
}

impl QueueConsumer {
    /// Pop the oldest entry, if any.
    pub fn try_pop(&self) -> Option<QueueRequest> {
        self.shared.entries.lock().expect("queue poisoned").pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_fifo_order() {
        let (producer, consumer) = bounded(4);
        for channel in 0..4u16 {
            assert!(producer.try_push(QueueRequest::fifo_space(channel)));
        }
        for channel in 0..4u16 {
            assert_eq!(consumer.try_pop().unwrap().channel, channel);
        }
        assert!(consumer.try_pop().is_none());
    }

    #[test]
    fn back_pressure_at_depth() {
        let (producer, consumer) = bounded(4);
        for channel in 0..4u16 {
            assert!(producer.writable());
            assert!(producer.try_push(QueueRequest::fifo_space(channel)));
        }
        assert!(!producer.writable());
        assert!(!producer.try_push(QueueRequest::fifo_space(99)));

        consumer.try_pop().unwrap();
        assert!(producer.writable());
        assert!(producer.try_push(QueueRequest::fifo_space(4)));
    }

    #[test]
    fn producer_and_consumer_on_separate_threads() {
        let (producer, consumer) = bounded(4);

        let feeder = std::thread::spawn(move || {
            for channel in 0..200u16 {
                loop {
                    if producer.try_push(QueueRequest::fifo_space(channel)) {
                        break;
                    }
                    std::thread::yield_now();
                }
            }
        });

        let mut seen = Vec::new();
        while seen.len() < 200 {
            if let Some(request) = consumer.try_pop() {
                seen.push(request.channel);
            } else {
                std::thread::yield_now();
            }
        }
        feeder.join().unwrap();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }
}
