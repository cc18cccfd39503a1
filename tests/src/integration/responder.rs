//! # Host Answering the Embed
//!
//! The embedded document can ask the host something (e.g. approve a custom
//! action) by sending a reply port along with its event. Subscribed callbacks
//! answer through the `Responder` they are handed.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{embed, event, eventually};
    use parking_lot::Mutex;
    use relay_bus::{Registry, SubscribeOptions};
    use relay_host::testing::MockFrame;
    use relay_types::{reply_channel, EmbedEvent};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_callback_answers_remote_request() {
        let registry = Registry::default();
        registry.init().unwrap();
        let instance = embed(&registry, &MockFrame::echo());

        instance.on(
            EmbedEvent::CustomAction,
            |data, responder| {
                if let Some(responder) = responder {
                    let approved = data["id"] == "export-csv";
                    responder.respond(json!({ "approved": approved }));
                }
            },
            SubscribeOptions::default(),
        );

        let (port, receiver) = reply_channel();
        let message = event(instance.id(), EmbedEvent::CustomAction, None, json!({ "id": "export-csv" }))
            .with_port(port);
        registry.inbox().send(message).await.unwrap();

        let reply = receiver.recv().await.unwrap();
        assert_eq!(reply.data, json!({ "approved": true }));
    }

    #[test]
    fn test_first_responder_wins_across_callbacks() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let results = Arc::new(Mutex::new(Vec::new()));

        let (first, second) = (Arc::clone(&results), Arc::clone(&results));
        instance
            .on(
                EmbedEvent::Alert,
                move |_, responder| {
                    first.lock().push(responder.map(|r| r.respond(json!("first"))));
                },
                SubscribeOptions::default(),
            )
            .on(
                EmbedEvent::All,
                move |_, responder| {
                    second.lock().push(responder.map(|r| r.respond(json!("second"))));
                },
                SubscribeOptions::default(),
            );

        let (port, mut receiver) = reply_channel();
        registry.dispatch(event(instance.id(), EmbedEvent::Alert, None, json!({})).with_port(port));

        assert_eq!(*results.lock(), vec![Some(true), Some(false)]);
        assert_eq!(receiver.try_recv().unwrap().data, json!("first"));
    }

    #[test]
    fn test_no_port_means_no_responder() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let saw_responder = Arc::new(Mutex::new(None));

        let flag = Arc::clone(&saw_responder);
        instance.on(
            EmbedEvent::Load,
            move |_, responder| *flag.lock() = Some(responder.is_some()),
            SubscribeOptions::default(),
        );

        registry.dispatch(event(instance.id(), EmbedEvent::Load, None, json!({})));
        assert_eq!(*saw_responder.lock(), Some(false));
    }

    #[tokio::test]
    async fn test_unanswered_request_closes_port() {
        let registry = Registry::default();
        registry.init().unwrap();
        let instance = embed(&registry, &MockFrame::echo());
        let handled = Arc::new(Mutex::new(false));

        let flag = Arc::clone(&handled);
        instance.on(
            EmbedEvent::CustomAction,
            move |_, _| *flag.lock() = true,
            SubscribeOptions::default(),
        );

        let (port, receiver) = reply_channel();
        registry
            .inbox()
            .send(event(instance.id(), EmbedEvent::CustomAction, None, json!({})).with_port(port))
            .await
            .unwrap();

        eventually(|| *handled.lock()).await;
        assert!(receiver.recv().await.is_none());
    }
}
