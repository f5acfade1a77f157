//! Integration tests for events

#[cfg(test)]
mod tests {
    use modsync_events::*;

    #[tokio::test]
    async fn test_event_sender_emit_helpers() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");
        tx.emit_package_progress(1, 3, "core");

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            AppEvent::General(GeneralEvent::Error { .. })
        ));
        assert_eq!(first.meta.level, EventLevel::Error);

        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.event,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
        assert_eq!(second.meta.level, EventLevel::Debug);

        let third = rx.recv().await.unwrap();
        assert_eq!(third.meta.source, EventSource::INSTALL);
        assert_eq!(third.meta.package.as_deref(), Some("core"));
        assert!(second.meta.package.is_none());
        match third.event {
            AppEvent::Install(InstallEvent::PackageProgress {
                current,
                total,
                package,
            }) => {
                assert_eq!((current, total), (1, 3));
                assert_eq!(package, "core");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[test]
    fn test_timeout_is_warning() {
        let event = AppEvent::Install(InstallEvent::PackageTimedOut {
            package: "ui".into(),
            ticks: 100,
        });
        assert_eq!(event.log_level(), tracing::Level::WARN);
        assert_eq!(event.log_target(), "modsync::events::install");
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = AppEvent::General(GeneralEvent::StepChanged {
            step: "cloning".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "general");
        assert_eq!(json["event"]["type"], "StepChanged");
        assert_eq!(json["event"]["step"], "cloning");
    }

    #[test]
    fn test_failure_context_from_error() {
        let err = modsync_errors::InstallError::SyncFailed {
            package: "ui".into(),
            message: "exit status 128".into(),
        };
        let ctx = FailureContext::from_error(&err);
        assert_eq!(ctx.code.as_deref(), Some("install.sync_failed"));
        assert!(ctx.retryable);
        assert!(ctx.hint.is_some());
    }
}
