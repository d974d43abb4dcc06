//! Publication channel between streaming sessions and the UI.
//!
//! Every open conversation owns one `StreamFeed`. Each streaming session gets
//! a [`StreamTicket`] stamped with the feed's generation at the time it began.
//! Starting another session on the same feed, or calling
//! [`StreamFeed::supersede`], bumps the generation; from then on the old
//! ticket's publications are dropped and [`StreamTicket::superseded`]
//! resolves, so the stale session stops reading and nothing it produced
//! reaches the UI or the store. Sessions on different feeds never interfere.

use std::sync::Arc;

use marca_types::stream::StreamSnapshot;
use tokio::sync::watch;

/// Latest-value channel of [`StreamSnapshot`]s.
#[derive(Debug)]
pub struct StreamFeed {
    sender: watch::Sender<StreamSnapshot>,
}

impl StreamFeed {
    pub fn new() -> Arc<Self> {
        let (sender, _) = watch::channel(StreamSnapshot::default());
        Arc::new(Self { sender })
    }

    /// Start a new generation and hand out its ticket.
    ///
    /// Any previously issued ticket becomes stale.
    pub fn begin(self: &Arc<Self>) -> StreamTicket {
        let mut generation = 0;
        self.sender.send_modify(|snap| {
            snap.generation += 1;
            snap.text.clear();
            snap.busy = true;
            generation = snap.generation;
        });
        StreamTicket {
            feed: Arc::clone(self),
            generation,
        }
    }

    /// Invalidate the in-flight session, if any, and clear the display.
    pub fn supersede(&self) -> u64 {
        let mut generation = 0;
        self.sender.send_modify(|snap| {
            snap.generation += 1;
            snap.text.clear();
            snap.busy = false;
            generation = snap.generation;
        });
        tracing::debug!(generation, "stream feed superseded");
        generation
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        self.sender.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.sender.borrow().generation
    }
}

/// Right to publish for one generation of a [`StreamFeed`].
///
/// Dropping a ticket settles it, so a cancelled session never leaves the UI
/// stuck in the busy state.
#[derive(Debug)]
pub struct StreamTicket {
    feed: Arc<StreamFeed>,
    generation: u64,
}

impl StreamTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.feed.generation() == self.generation
    }

    /// Replace the displayed text. Returns false (and does nothing) when stale.
    pub fn publish(&self, text: &str) -> bool {
        self.feed.sender.send_if_modified(|snap| {
            if snap.generation != self.generation {
                return false;
            }
            snap.text.clear();
            snap.text.push_str(text);
            true
        })
    }

    /// Resolves once another session or a supersede has replaced this ticket.
    pub async fn superseded(&self) {
        let mut rx = self.feed.subscribe();
        let generation = self.generation;
        let closed = rx.wait_for(|snap| snap.generation != generation).await.is_err();
        if closed {
            // The ticket keeps the sender alive, so this is unreachable.
            std::future::pending::<()>().await;
        }
    }

    /// Clear the streaming text and the busy flag if still current.
    pub fn settle(&self) -> bool {
        self.feed.sender.send_if_modified(|snap| {
            if snap.generation != self.generation || (!snap.busy && snap.text.is_empty()) {
                return false;
            }
            snap.text.clear();
            snap.busy = false;
            true
        })
    }
}

impl Drop for StreamTicket {
    fn drop(&mut self) {
        self.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_marks_busy() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        let snap = feed.snapshot();
        assert!(snap.busy);
        assert_eq!(snap.generation, ticket.generation());
        assert!(snap.text.is_empty());
    }

    #[test]
    fn publish_updates_snapshot() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        assert!(ticket.publish("Hello"));
        assert!(ticket.publish("Hello world"));
        assert_eq!(feed.snapshot().text, "Hello world");
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let feed = StreamFeed::new();
        let old = feed.begin();
        old.publish("old");
        let fresh = feed.begin();

        assert!(!old.is_current());
        assert!(!old.publish("old text"));
        assert!(fresh.publish("new"));
        assert_eq!(feed.snapshot().text, "new");
    }

    #[test]
    fn supersede_clears_and_invalidates() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        ticket.publish("partial");
        feed.supersede();

        let snap = feed.snapshot();
        assert!(snap.text.is_empty());
        assert!(!snap.busy);
        assert!(!ticket.publish("more"));
        assert!(!ticket.settle());
    }

    #[test]
    fn drop_settles_current_ticket() {
        let feed = StreamFeed::new();
        {
            let ticket = feed.begin();
            ticket.publish("abc");
        }
        let snap = feed.snapshot();
        assert!(!snap.busy);
        assert!(snap.text.is_empty());
    }

    #[test]
    fn drop_of_stale_ticket_leaves_new_session_alone() {
        let feed = StreamFeed::new();
        let old = feed.begin();
        let fresh = feed.begin();
        fresh.publish("live");
        drop(old);
        let snap = feed.snapshot();
        assert!(snap.busy);
        assert_eq!(snap.text, "live");
    }

    #[tokio::test]
    async fn superseded_resolves_on_supersede() {
        let feed = StreamFeed::new();
        let ticket = feed.begin();
        let waiter = ticket.superseded();
        tokio::pin!(waiter);

        assert!(futures_util::poll!(waiter.as_mut()).is_pending());
        feed.supersede();
        waiter.await;
        assert!(!ticket.is_current());
    }

    #[tokio::test]
    async fn superseded_is_scoped_to_its_feed() {
        let a = StreamFeed::new();
        let b = StreamFeed::new();
        let ticket = a.begin();
        b.supersede();
        b.begin();

        let waiter = ticket.superseded();
        tokio::pin!(waiter);
        assert!(futures_util::poll!(waiter.as_mut()).is_pending());
        assert!(ticket.is_current());
    }

    #[tokio::test]
    async fn subscriber_sees_latest_value() {
        let feed = StreamFeed::new();
        let mut rx = feed.subscribe();
        let ticket = feed.begin();
        ticket.publish("a");
        ticket.publish("ab");

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().text, "ab");
    }
}
