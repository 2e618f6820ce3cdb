//! In-process publish/subscribe bus
//!
//! Each topic owns a [`Channel`] that maps a discriminator key (or no key) to
//! a `tokio::sync::broadcast` sender. Every subscriber gets its own cursor into
//! the channel buffer, so a slow consumer never blocks the publisher or its
//! neighbours. One that falls a full buffer behind skips the overflow.
//!
//! Publishing to a key nobody listens on drops the event.

mod event;
pub mod topics;

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, ready};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

pub use event::{MutationEvent, MutationKind};
pub use topics::{AuthorPostTopic, CommentEvent, CommentTopic, PostEvent, PostTopic, Topic};

/// Default per-subscriber buffer
pub const DEFAULT_CAPACITY: usize = 256;

type Registry<T> = Mutex<HashMap<Option<String>, broadcast::Sender<T>>>;

/// Keyed fan-out for one topic
pub struct Channel<T> {
    capacity: usize,
    senders: Arc<Registry<T>>,
}

impl<T: Clone + Send + 'static> Channel<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Deliver to every subscriber of `key`; returns how many received it
    pub fn publish(&self, key: Option<&str>, event: T) -> usize {
        let key = key.map(str::to_owned);
        let mut senders = self.senders.lock();
        let Some(sender) = senders.get(&key) else {
            return 0;
        };
        match sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                senders.remove(&key);
                0
            }
        }
    }

    pub fn subscribe(&self, key: Option<&str>) -> Subscription<T> {
        let key = key.map(str::to_owned);
        let receiver = {
            let mut senders = self.senders.lock();
            senders
                .entry(key.clone())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        };
        Subscription {
            inner: BroadcastStream::new(receiver),
            key,
            registry: Arc::downgrade(&self.senders),
        }
    }

    pub fn subscriber_count(&self, key: Option<&str>) -> usize {
        let key = key.map(str::to_owned);
        self.senders
            .lock()
            .get(&key)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

/// A live, ordered stream of events for one topic instance
///
/// Dropping it detaches from the bus; the key's registration is removed
/// once its last subscriber is gone.
pub struct Subscription<T> {
    inner: BroadcastStream<T>,
    key: Option<String>,
    registry: Weak<Registry<T>>,
}

impl<T: Clone + Send + 'static> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        loop {
            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(event)) => return Poll::Ready(Some(event)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(key = ?this.key, skipped, "Subscriber fell behind, events dropped");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut senders = registry.lock();
        // Our own receiver is still alive here, so 1 means nobody else is left.
        if senders
            .get(&self.key)
            .is_some_and(|sender| sender.receiver_count() <= 1)
        {
            senders.remove(&self.key);
        }
    }
}

/// The bus: one channel per registered topic
pub struct PubSub {
    pub(crate) posts: Channel<PostEvent>,
    pub(crate) author_posts: Channel<PostEvent>,
    pub(crate) comments: Channel<CommentEvent>,
}

impl PubSub {
    pub fn new(capacity: usize) -> Self {
        Self {
            posts: Channel::new(capacity),
            author_posts: Channel::new(capacity),
            comments: Channel::new(capacity),
        }
    }

    pub fn publish<T: Topic>(&self, key: Option<&str>, event: T::Payload) -> usize {
        let delivered = T::channel(self).publish(key, event);
        debug!(topic = T::NAME, key = ?key, delivered, "Published event");
        delivered
    }

    pub fn subscribe<T: Topic>(&self, key: Option<&str>) -> Subscription<T::Payload> {
        debug!(topic = T::NAME, key = ?key, "Subscriber attached");
        T::channel(self).subscribe(key)
    }

    pub fn subscriber_count<T: Topic>(&self, key: Option<&str>) -> usize {
        T::channel(self).subscriber_count(key)
    }
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::FutureExt;

    fn channel() -> Channel<u32> {
        Channel::new(16)
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let ch = channel();
        assert_eq!(ch.publish(None, 1), 0);
        let mut sub = ch.subscribe(None);
        ch.publish(None, 2);
        assert_eq!(sub.next().await, Some(2));
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let ch = channel();
        let mut p1 = ch.subscribe(Some("P1"));
        let mut p2 = ch.subscribe(Some("P2"));

        ch.publish(Some("P2"), 20);
        ch.publish(Some("P1"), 10);

        assert_eq!(p1.next().await, Some(10));
        assert_eq!(p2.next().await, Some(20));
        assert!(p1.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_unkeyed_and_keyed_do_not_mix() {
        let ch = channel();
        let mut all = ch.subscribe(None);
        assert_eq!(ch.publish(Some("P1"), 1), 0);
        ch.publish(None, 2);
        assert_eq!(all.next().await, Some(2));
    }

    #[tokio::test]
    async fn test_two_subscribers_same_order() {
        let ch = channel();
        let a = ch.subscribe(Some("k"));
        let b = ch.subscribe(Some("k"));
        for i in 0..5 {
            assert_eq!(ch.publish(Some("k"), i), 2);
        }
        let a: Vec<u32> = a.take(5).collect().await;
        let b: Vec<u32> = b.take(5).collect().await;
        assert_eq!(a, vec![0, 1, 2, 3, 4]);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_only_later_events() {
        let ch = channel();
        let _early = ch.subscribe(None);
        ch.publish(None, 1);
        let mut late = ch.subscribe(None);
        ch.publish(None, 2);
        assert_eq!(late.next().await, Some(2));
    }

    #[tokio::test]
    async fn test_drop_detaches_without_affecting_others() {
        let ch = channel();
        let first = ch.subscribe(Some("k"));
        let mut second = ch.subscribe(Some("k"));
        assert_eq!(ch.subscriber_count(Some("k")), 2);

        drop(first);
        assert_eq!(ch.subscriber_count(Some("k")), 1);
        assert_eq!(ch.publish(Some("k"), 7), 1);
        assert_eq!(second.next().await, Some(7));

        drop(second);
        assert!(ch.senders.lock().is_empty());
        assert_eq!(ch.publish(Some("k"), 8), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_skips_overflow() {
        let ch = Channel::new(2);
        let mut slow = ch.subscribe(None);
        let mut fast = ch.subscribe(None);
        for i in 0..4u32 {
            ch.publish(None, i);
            if i >= 2 {
                continue;
            }
            assert_eq!(fast.next().await, Some(i));
        }
        assert_eq!(fast.next().await, Some(2));
        assert_eq!(fast.next().await, Some(3));
        // The slow one lost the two oldest events but keeps going in order.
        assert_eq!(slow.next().await, Some(2));
        assert_eq!(slow.next().await, Some(3));
    }

    #[tokio::test]
    async fn test_bus_routes_by_topic() {
        use crate::db::CommentRecord;
        use chrono::Utc;

        let bus = PubSub::new(8);
        let mut comments = bus.subscribe::<CommentTopic>(Some("P1"));
        let now = Utc::now();
        let comment = CommentRecord {
            id: "C1".into(),
            post_id: "P1".into(),
            user_id: "U1".into(),
            content: "like graphql".into(),
            created_at: now,
            updated_at: now,
        };

        assert_eq!(bus.subscriber_count::<PostTopic>(None), 0);
        assert_eq!(
            bus.publish::<CommentTopic>(Some("P1"), MutationEvent::Created(comment.clone())),
            1
        );
        assert_eq!(comments.next().await, Some(MutationEvent::Created(comment)));
    }
}
