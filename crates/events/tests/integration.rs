//! Integration tests for events

#[cfg(test)]
mod tests {
    use sprout_events::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_event_sender_emit() {
        let (tx, mut rx) = channel();

        tx.emit_warning("constraint on unknown package", "ghost installed");
        tx.emit_debug(
            "derived qualify options",
            BTreeMap::from([("base_shim".to_string(), "true".to_string())]),
        );
        tx.emit_resolver(ResolverEvent::ResolutionStarted {
            targets: vec!["aeson".to_string()],
            constraints: 0,
            known_instances: 12,
        });

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(
            event1,
            AppEvent::General(GeneralEvent::Warning { ref context, .. }) if context == "ghost installed"
        ));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            AppEvent::General(GeneralEvent::DebugLog { ref context, .. }) if context["base_shim"] == "true"
        ));

        let event3 = rx.recv().await.unwrap();
        assert!(matches!(
            event3,
            AppEvent::Resolver(ResolverEvent::ResolutionStarted { known_instances: 12, .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored", "");
    }

    #[test]
    fn test_event_serialization() {
        let event = AppEvent::Resolver(ResolverEvent::conflict_detected(
            vec!["p".to_string(), "q".to_string()],
            "no instance of r".to_string(),
            DependencyConflictType::VersionIncompatibility,
        ));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "resolver");
        assert_eq!(json["event"]["type"], "DependencyConflictDetected");
        assert_eq!(json["event"]["conflict_type"], "version_incompatibility");
    }

    #[test]
    fn test_log_levels() {
        let warning = AppEvent::General(GeneralEvent::Warning {
            message: "careful".to_string(),
            context: String::new(),
        });
        assert_eq!(warning.log_level(), tracing::Level::WARN);

        let jump = AppEvent::Resolver(ResolverEvent::Backjumped {
            skipped: "a".to_string(),
            conflict: vec![],
        });
        assert_eq!(jump.log_level(), tracing::Level::TRACE);
        assert_eq!(jump.log_target(), "sprout::events::resolver");
    }
}
