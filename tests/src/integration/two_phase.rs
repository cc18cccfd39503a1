//! # Two-Phase Actions
//!
//! Remote actions may announce themselves with `status: "start"` before they
//! finish with `status: "end"` (or no status). Only subscriptions that opted
//! in see the start phase; everyone sees the end.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{embed, event, Recorder};
    use proptest::prelude::*;
    use relay_bus::{DispatchOutcome, Registry, SubscribeOptions};
    use relay_host::testing::MockFrame;
    use relay_types::{should_deliver, ActionPhase, EmbedEvent, EventStatus};
    use serde_json::json;

    #[test]
    fn test_start_reaches_only_opted_in() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let seen = Recorder::default();

        instance
            .on(EmbedEvent::Download, seen.callback("plain"), SubscribeOptions::default())
            .on(EmbedEvent::Download, seen.callback("eager"), SubscribeOptions::start())
            .on(EmbedEvent::All, seen.callback("wild-eager"), SubscribeOptions::start())
            .on(EmbedEvent::All, seen.callback("wild-plain"), SubscribeOptions::default());

        registry.dispatch(event(instance.id(), EmbedEvent::Download, Some(EventStatus::Start), json!({})));
        assert_eq!(seen.tags(), vec!["eager", "wild-eager"]);

        registry.dispatch(event(instance.id(), EmbedEvent::Download, Some(EventStatus::End), json!({})));
        assert_eq!(
            seen.tags(),
            vec!["eager", "wild-eager", "plain", "eager", "wild-eager", "wild-plain"]
        );
    }

    #[test]
    fn test_untagged_behaves_like_end() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let seen = Recorder::default();
        instance
            .on(EmbedEvent::Edit, seen.callback("plain"), SubscribeOptions::default())
            .on(EmbedEvent::Edit, seen.callback("eager"), SubscribeOptions::start());

        let outcome = registry.dispatch(event(instance.id(), EmbedEvent::Edit, None, json!({})));

        assert_eq!(outcome, DispatchOutcome::Delivered { invoked: 2, filtered: 0 });
        assert_eq!(seen.tags(), vec!["plain", "eager"]);
    }

    #[test]
    fn test_end_without_start_is_terminal() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let seen = Recorder::default();
        instance.on(EmbedEvent::Share, seen.callback("plain"), SubscribeOptions::default());

        registry.dispatch(event(instance.id(), EmbedEvent::Share, Some(EventStatus::End), json!({})));
        registry.dispatch(event(instance.id(), EmbedEvent::Share, Some(EventStatus::End), json!({})));

        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_filtered_callbacks_are_counted() {
        let registry = Registry::default();
        let instance = embed(&registry, &MockFrame::echo());
        let seen = Recorder::default();
        instance
            .on(EmbedEvent::Save, seen.callback("a"), SubscribeOptions::default())
            .on(EmbedEvent::Save, seen.callback("b"), SubscribeOptions::default());

        let outcome = registry.dispatch(event(instance.id(), EmbedEvent::Save, Some(EventStatus::Start), json!({})));

        assert_eq!(outcome, DispatchOutcome::Delivered { invoked: 0, filtered: 2 });
        assert_eq!(registry.stats().filtered_by_phase, 2);
    }

    fn phase() -> impl Strategy<Value = ActionPhase> {
        prop_oneof![
            Just(ActionPhase::Unstarted),
            Just(ActionPhase::Started),
            Just(ActionPhase::Ended),
        ]
    }

    proptest! {
        #[test]
        fn prop_ended_delivers_to_everyone(opted_in in any::<bool>()) {
            prop_assert!(should_deliver(ActionPhase::Ended, opted_in));
        }

        #[test]
        fn prop_opting_in_never_loses_deliveries(phase in phase()) {
            prop_assert!(!should_deliver(phase, false) || should_deliver(phase, true));
        }
    }
}
