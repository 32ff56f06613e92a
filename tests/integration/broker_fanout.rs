use dsk::broker::{forward, BrokerConfig, ForwardEnd, Message, MessageBroker, MessageSink};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records everything it receives.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

#[async_trait::async_trait]
impl MessageSink for Recorder {
    type Error = std::convert::Infallible;

    async fn send(&mut self, message: &Message) -> Result<(), Self::Error> {
        self.0.lock().unwrap().push(message.text().to_string());
        Ok(())
    }
}

#[tokio::test]
async fn many_subscribers_see_every_message_in_order() {
    let broker = MessageBroker::default();
    let mut inboxes: Vec<_> = (0..8).map(|_| broker.subscribe().1).collect();

    for i in 0..10 {
        let report = broker.publish(Message::new("tree-synced", i.to_string()));
        assert_eq!(report.delivered, 8);
    }

    for inbox in &mut inboxes {
        let mut texts = Vec::new();
        for _ in 0..10 {
            texts.push(inbox.recv().await.unwrap().text().to_string());
        }
        let expected: Vec<_> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(texts, expected);
    }
}

#[tokio::test]
async fn unsubscribed_inbox_gets_nothing_further() {
    let broker = MessageBroker::default();
    let (gone, mut gone_inbox) = broker.subscribe();
    let (_, mut kept) = broker.subscribe();

    broker.publish(Message::new("tree-synced", "a"));
    assert!(broker.unsubscribe(gone));
    broker.publish(Message::new("tree-synced", "b"));

    assert_eq!(gone_inbox.recv().await.unwrap().text(), "a");
    assert!(gone_inbox.recv().await.is_none());
    assert_eq!(kept.recv().await.unwrap().text(), "a");
    assert_eq!(kept.recv().await.unwrap().text(), "b");
}

#[tokio::test]
async fn stalled_subscriber_does_not_hold_back_others() {
    let broker = MessageBroker::new(BrokerConfig {
        inbox_capacity: 1,
        max_full_strikes: 2,
    });
    let (_, _stalled) = broker.subscribe();
    let (_, mut live) = broker.subscribe();

    for i in 0..4 {
        broker.publish(Message::new("tree-synced", i.to_string()));
        assert_eq!(live.recv().await.unwrap().text(), i.to_string());
    }
    // Two strikes on a full inbox removed the stalled one.
    assert_eq!(broker.subscriber_count(), 1);
}

#[tokio::test]
async fn forwarded_sinks_end_on_shutdown() {
    let broker = Arc::new(MessageBroker::default());
    let sinks: Vec<Recorder> = (0..3).map(|_| Recorder::default()).collect();
    let tasks: Vec<_> = sinks
        .iter()
        .map(|sink| tokio::spawn(forward(Arc::clone(&broker), sink.clone())))
        .collect();

    while broker.subscriber_count() < 3 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    broker.publish(Message::new("tree-synced", "one"));
    broker.publish(Message::new("tree-synced", "two"));
    broker.shutdown();

    for task in tasks {
        assert_eq!(task.await.unwrap(), ForwardEnd::InboxClosed);
    }
    for sink in sinks {
        assert_eq!(*sink.0.lock().unwrap(), vec!["one", "two"]);
    }
    assert_eq!(broker.subscriber_count(), 0);
}
