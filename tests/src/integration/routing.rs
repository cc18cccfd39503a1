//! # Routing Across Instances
//!
//! Many embed instances share one registry and one inbound surface. These
//! scenarios check that every message reaches exactly the instance it names,
//! from the origin it is trusted from, and that instances come and go without
//! disturbing each other or the listener.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{embed, embed_with, event, eventually, Recorder, ORIGIN};
    use relay_bus::{DispatchOutcome, InboundMessage, Registry, SubscribeOptions};
    use relay_host::testing::MockFrame;
    use relay_host::{registry_for, HostConfig};
    use relay_types::{EmbedEvent, EmbedId};
    use serde_json::json;

    #[test]
    fn test_message_for_b_fires_only_b() {
        let registry = Registry::default();
        let frame = MockFrame::echo();
        let a = embed(&registry, &frame);
        let b = embed(&registry, &frame);
        let seen_a = Recorder::default();
        let seen_b = Recorder::default();

        a.on(EmbedEvent::Data, seen_a.callback("a"), SubscribeOptions::default());
        b.on(EmbedEvent::Data, seen_b.callback("b"), SubscribeOptions::default());

        registry.dispatch(event(b.id(), EmbedEvent::Data, None, json!({ "rows": 2 })));

        assert_eq!(seen_a.len(), 0);
        assert_eq!(seen_b.payloads(), vec![json!({ "rows": 2 })]);
    }

    #[test]
    fn test_unknown_embed_id_is_a_silent_no_op() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let seen = Recorder::default();
        instance.on(EmbedEvent::All, seen.callback("all"), SubscribeOptions::start());

        let outcome = registry.dispatch(event(
            &EmbedId::from_wire("never-issued"),
            EmbedEvent::Load,
            None,
            json!({}),
        ));

        assert_eq!(outcome, DispatchOutcome::UnknownEmbed);
        assert_eq!(seen.len(), 0);
        assert_eq!(registry.stats().unknown_embed, 1);
        assert_eq!(registry.stats().routed, 0);
    }

    #[test]
    fn test_foreign_origin_never_reaches_callbacks() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let seen = Recorder::default();
        instance.on(EmbedEvent::All, seen.callback("all"), SubscribeOptions::start());

        let mut spoofed = event(instance.id(), EmbedEvent::AuthExpire, None, json!({}));
        spoofed.origin = "https://evil.example.net".to_string();
        assert_eq!(registry.dispatch(spoofed), DispatchOutcome::ForeignOrigin);

        // same origin written differently is still trusted
        let mut normalized = event(instance.id(), EmbedEvent::AuthExpire, None, json!({}));
        normalized.origin = "HTTPS://Embed.Example.com:443".to_string();
        assert!(matches!(
            registry.dispatch(normalized),
            DispatchOutcome::Delivered { invoked: 1, .. }
        ));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_garbage_on_the_shared_surface_is_ignored() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let seen = Recorder::default();
        instance.on(EmbedEvent::All, seen.callback("all"), SubscribeOptions::start());

        for junk in [json!(null), json!("webpack-hmr"), json!({ "source": "devtools" })] {
            registry.dispatch(InboundMessage::new(ORIGIN, junk));
        }

        assert_eq!(seen.len(), 0);
        assert_eq!(registry.stats().malformed, 3);
    }

    #[test]
    fn test_destroying_one_instance_keeps_the_other_routed() {
        let registry = Registry::default();
        let frame = MockFrame::echo();
        let a = embed(&registry, &frame);
        let b = embed(&registry, &frame);
        let seen_b = Recorder::default();
        b.on(EmbedEvent::Load, seen_b.callback("b"), SubscribeOptions::default());

        let a_id = a.id().clone();
        a.destroy();

        assert_eq!(
            registry.dispatch(event(&a_id, EmbedEvent::Load, None, json!({}))),
            DispatchOutcome::UnknownEmbed
        );
        registry.dispatch(event(b.id(), EmbedEvent::Load, None, json!({})));
        assert_eq!(seen_b.len(), 1);
        assert_eq!(registry.route_count(), 1);
    }

    #[test]
    fn test_lenient_origin_for_local_frames() {
        let host = HostConfig {
            strict_origin: false,
            ..HostConfig::default()
        };
        let registry = registry_for(&host).unwrap();
        let instance = embed_with(&registry, &MockFrame::echo(), host);
        let seen = Recorder::default();
        instance.on(EmbedEvent::Load, seen.callback("load"), SubscribeOptions::default());

        let mut local = event(instance.id(), EmbedEvent::Load, None, json!({}));
        local.origin = "http://localhost:8080".to_string();
        registry.dispatch(local);

        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn test_listener_survives_instance_churn() {
        let registry = Registry::default();
        registry.init().unwrap();
        let inbox = registry.inbox();
        let frame = MockFrame::echo();

        for round in 0..3 {
            let instance = embed(&registry, &frame);
            let seen = Recorder::default();
            instance.on(EmbedEvent::Load, seen.callback("load"), SubscribeOptions::default());

            inbox
                .send(event(instance.id(), EmbedEvent::Load, None, json!({ "round": round })))
                .await
                .unwrap();
            eventually(|| seen.len() == 1).await;

            instance.destroy();
            assert!(registry.is_listening());
        }

        assert_eq!(registry.route_count(), 0);
        assert_eq!(registry.stats().routed, 3);
    }

    #[tokio::test]
    async fn test_teardown_detaches_listener() {
        let registry = Registry::default();
        registry.init().unwrap();
        let inbox = registry.inbox();
        let _instance = embed(&registry, &MockFrame::echo());

        assert_eq!(registry.teardown(), 1);
        eventually(|| inbox.is_closed()).await;
        assert!(inbox
            .post(InboundMessage::new(ORIGIN, json!({ "type": "load" })))
            .is_err());
    }
}
