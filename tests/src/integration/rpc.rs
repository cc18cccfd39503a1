//! # Host → Embed Requests
//!
//! Trigger settlement end to end: replies, remote errors, timeouts, late
//! replies, concurrent requests, and commands that never expect an answer.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{embed, embed_with};
    use futures::future::join_all;
    use relay_bus::Registry;
    use relay_host::testing::{MockFrame, ReplyMode};
    use relay_host::{ConfigError, EmbedInstance, HostConfig, RemoteError, RemoteFrame, TriggerResponse};
    use relay_types::{HostEvent, Origin, TransportError};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    fn short_timeout() -> HostConfig {
        HostConfig {
            trigger_timeout_ms: 1_000,
            ..HostConfig::default()
        }
    }

    #[tokio::test]
    async fn test_reply_settles_with_payload() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Reply(json!({ "url": "https://embed.example.com/#/pinboard/1" })));
        let instance = embed(&registry, &frame);

        let response = instance
            .trigger(HostEvent::GetIframeUrl, Value::Null)
            .unwrap()
            .await
            .unwrap();

        assert_eq!(
            response.reply(),
            Some(&json!({ "url": "https://embed.example.com/#/pinboard/1" }))
        );
        assert_eq!(instance.pending_stats().total_completed, 1);
    }

    #[tokio::test]
    async fn test_error_reply_rejects() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Error(json!({ "code": "NOT_FOUND" })));
        let instance = embed(&registry, &frame);

        let err = instance
            .trigger(HostEvent::GetTml, json!({ "vizIds": ["v1"] }))
            .unwrap()
            .await
            .unwrap_err();

        assert_eq!(err, RemoteError(json!({ "code": "NOT_FOUND" })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_late_reply() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Silent);
        let instance = embed_with(&registry, &frame, short_timeout());

        let response = instance.trigger(HostEvent::Save, json!({})).unwrap().await;

        let response = response.unwrap();
        assert!(response.is_timed_out());
        assert_eq!(instance.pending_count(), 0);
        assert_eq!(frame.held_count(), 1);

        assert!(!frame.reply_to_held(json!({ "saved": true })));
        let stats = instance.pending_stats();
        assert_eq!(stats.total_timeouts, 1);
        assert_eq!(stats.late_replies, 1);
        assert_eq!(stats.total_completed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_just_before_timeout_wins() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Delayed(Duration::from_millis(999)));
        let instance = embed_with(&registry, &frame, short_timeout());

        let response = instance.trigger(HostEvent::Search, json!("q")).unwrap().await;
        assert_eq!(response, Ok(TriggerResponse::Reply(json!("q"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_after_timeout_loses() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Delayed(Duration::from_millis(1_500)));
        let instance = embed_with(&registry, &frame, short_timeout());

        let response = instance.trigger(HostEvent::Search, json!("q")).unwrap().await.unwrap();
        assert!(response.is_timed_out());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(instance.pending_stats().late_replies, 1);
    }

    #[tokio::test]
    async fn test_concurrent_triggers_never_cross_deliver() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Delayed(Duration::from_millis(5)));
        let instance = embed(&registry, &frame);

        let triggers: Vec<_> = (0..16)
            .map(|i| instance.trigger(HostEvent::Search, json!({ "i": i })).unwrap())
            .collect();
        let responses = join_all(triggers).await;

        for (i, response) in responses.into_iter().enumerate() {
            assert_eq!(response, Ok(TriggerResponse::Reply(json!({ "i": i }))));
        }
        assert_eq!(instance.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_out_of_order_replies_reach_their_callers() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Silent);
        let instance = embed(&registry, &frame);

        let first = instance.trigger(HostEvent::Pin, json!(1)).unwrap();
        let second = instance.trigger(HostEvent::Pin, json!(2)).unwrap();

        // held ports are answered oldest first
        assert!(frame.reply_to_held(json!("for first")));
        assert!(frame.reply_to_held(json!("for second")));

        assert_eq!(second.await, Ok(TriggerResponse::Reply(json!("for second"))));
        assert_eq!(first.await, Ok(TriggerResponse::Reply(json!("for first"))));
    }

    #[tokio::test]
    async fn test_never_awaited_trigger_leaves_nothing_pending() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Silent);
        let instance = embed(&registry, &frame);

        let trigger = instance.trigger(HostEvent::Search, json!({})).unwrap();
        assert_eq!(instance.pending_count(), 1);
        drop(trigger);

        assert_eq!(instance.pending_count(), 0);
        assert_eq!(instance.pending_stats().total_cancelled, 1);
        assert!(!frame.reply_to_held(json!("too late")));
    }

    #[tokio::test]
    async fn test_reload_reissues_without_reply() {
        let registry = Registry::default();
        let frame = MockFrame::new(ReplyMode::Silent);
        let instance = embed(&registry, &frame);

        let response = instance.trigger(HostEvent::Reload, Value::Null).unwrap().await;

        assert_eq!(response, Ok(TriggerResponse::Dispatched));
        assert_eq!(frame.reissue_count(), 1);
        assert!(frame.posted().is_empty());
        assert_eq!(instance.pending_stats().total_registered, 0);
    }

    #[tokio::test]
    async fn test_disabled_presentation_is_suppressed() {
        let registry = Registry::default();
        let frame = MockFrame::echo();
        let host = HostConfig {
            disable_fullscreen_presentation: true,
            ..HostConfig::default()
        };
        let instance = embed_with(&registry, &frame, host);

        let response = instance.trigger(HostEvent::Present, json!({})).unwrap().await;
        assert_eq!(response, Ok(TriggerResponse::Suppressed));
        assert!(frame.posted().is_empty());

        // other commands are unaffected
        let response = instance.trigger(HostEvent::Search, json!({})).unwrap().await;
        assert_eq!(response, Ok(TriggerResponse::Reply(json!({}))));
    }

    #[tokio::test]
    async fn test_posts_are_scoped_to_expected_origin() {
        let registry = Registry::default();
        let frame = MockFrame::echo();
        let instance = embed(&registry, &frame);

        instance.trigger(HostEvent::Filter, json!({})).unwrap().await.unwrap();

        let posted = frame.posted();
        assert_eq!(posted[0].target_origin, *instance.expected_origin());
        assert_eq!(
            posted[0].envelope.to_value().unwrap()["embedId"],
            json!(instance.id().as_str())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigated_away_frame_does_not_receive() {
        let registry = Registry::default();
        let frame = MockFrame::echo()
            .with_actual_origin(Origin::parse("https://phishing.example").unwrap());
        let instance = embed_with(&registry, &frame, short_timeout());

        let response = instance.trigger(HostEvent::Search, json!({})).unwrap().await.unwrap();
        assert!(response.is_timed_out());
    }

    #[test]
    fn test_synchronous_failures() {
        let registry = Registry::default();
        let frame = MockFrame::echo();
        let instance = EmbedInstance::builder(&registry)
            .target(Arc::clone(&frame) as Arc<dyn RemoteFrame>)
            .expected_origin("https://embed.example.com")
            .build()
            .unwrap();

        frame.fail_posts(TransportError::Rejected("quota".into()));
        assert!(matches!(
            instance.trigger(HostEvent::Search, json!({})),
            Err(ConfigError::Transport(TransportError::Rejected(_)))
        ));
        assert!(matches!(
            instance.trigger(HostEvent::Reload, json!({})),
            Err(ConfigError::Transport(_))
        ));
        frame.clear_failure();

        frame.set_rendered(false);
        assert!(matches!(
            instance.trigger(HostEvent::Search, json!({})),
            Err(ConfigError::NotRendered(_))
        ));
    }
}
