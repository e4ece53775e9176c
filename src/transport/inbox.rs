//! Per-kind inbound channels.
//!
//! A participant's dispatch loop selects over one channel per message
//! kind. [`Mailbox`] is the overlay's sending half: it sorts each
//! delivered [`Message`] into the matching channel of the [`Inbox`].

use super::traits::{NodeId, TransportError, TransportResult};
use crate::protocol::messages::{AuthorityQuery, Envelope, Init, Message, Reply, RoundComplete};
use tokio::sync::mpsc;

/// Receiving half, owned by the participant's dispatch loop.
#[derive(Debug)]
pub struct Inbox {
    pub init: mpsc::UnboundedReceiver<Envelope<Init>>,
    pub queries: mpsc::UnboundedReceiver<Envelope<AuthorityQuery>>,
    pub replies: mpsc::UnboundedReceiver<Envelope<Reply>>,
    pub complete: mpsc::UnboundedReceiver<Envelope<RoundComplete>>,
}

/// Sending half, owned by the overlay.
#[derive(Debug, Clone)]
pub struct Mailbox {
    owner: NodeId,
    init: mpsc::UnboundedSender<Envelope<Init>>,
    queries: mpsc::UnboundedSender<Envelope<AuthorityQuery>>,
    replies: mpsc::UnboundedSender<Envelope<Reply>>,
    complete: mpsc::UnboundedSender<Envelope<RoundComplete>>,
}

impl Mailbox {
    /// Create a mailbox for `owner` and its inbox.
    pub fn new(owner: NodeId) -> (Self, Inbox) {
        let (init_tx, init_rx) = mpsc::unbounded_channel();
        let (query_tx, query_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let (complete_tx, complete_rx) = mpsc::unbounded_channel();

        let mailbox = Self {
            owner,
            init: init_tx,
            queries: query_tx,
            replies: reply_tx,
            complete: complete_tx,
        };
        let inbox = Inbox {
            init: init_rx,
            queries: query_rx,
            replies: reply_rx,
            complete: complete_rx,
        };
        (mailbox, inbox)
    }

    /// Route `message` into the channel for its kind.
    pub fn deliver(&self, from: NodeId, message: Message) -> TransportResult<()> {
        let delivered = match message {
            Message::Init(m) => self.init.send(Envelope { from, message: m }).is_ok(),
            Message::AuthorityQuery(m) => self.queries.send(Envelope { from, message: m }).is_ok(),
            Message::Reply(m) => self.replies.send(Envelope { from, message: m }).is_ok(),
            Message::RoundComplete(m) => self.complete.send(Envelope { from, message: m }).is_ok(),
        };

        if delivered {
            Ok(())
        } else {
            Err(TransportError::Closed(self.owner))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_routes_by_kind() {
        let (mailbox, mut inbox) = Mailbox::new(NodeId(0));

        mailbox.deliver(NodeId(0), Init {}.into()).unwrap();
        mailbox.deliver(NodeId(2), RoundComplete {}.into()).unwrap();

        let init = inbox.init.recv().await.unwrap();
        assert_eq!(init.from, NodeId(0));

        let complete = inbox.complete.recv().await.unwrap();
        assert_eq!(complete.from, NodeId(2));

        assert!(inbox.queries.try_recv().is_err());
        assert!(inbox.replies.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deliver_after_inbox_dropped() {
        let (mailbox, inbox) = Mailbox::new(NodeId(4));
        drop(inbox);

        let result = mailbox.deliver(NodeId(0), Init {}.into());
        assert_eq!(result, Err(TransportError::Closed(NodeId(4))));
    }

    #[tokio::test]
    async fn test_per_kind_order_is_preserved() {
        let (mailbox, mut inbox) = Mailbox::new(NodeId(0));
        for i in 0..5 {
            mailbox.deliver(NodeId(i), Init {}.into()).unwrap();
        }
        for i in 0..5 {
            assert_eq!(inbox.init.recv().await.unwrap().from, NodeId(i));
        }
    }
}
