//! The hotkey pipeline: event source to resolver to channel.
//!
//! Keycodes are processed one at a time in arrival order.  Each one is
//! resolved against the config snapshot current at that moment, so a reload
//! between two key presses takes effect for the second press.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::resolve_action::ActionResolver;
use crate::infrastructure::channel::CommandInitiator;
use crate::infrastructure::config_cache::ConfigCache;

/// Drains `events` until cancellation or end of input.
pub async fn run_hotkey_pipeline(
    mut events: mpsc::Receiver<u32>,
    cache: Arc<ConfigCache>,
    resolver: Arc<ActionResolver>,
    initiator: Arc<CommandInitiator>,
    cancel: CancellationToken,
) {
    info!("hotkey pipeline running");

    loop {
        let key_code = tokio::select! {
            _ = cancel.cancelled() => break,
            next = events.recv() => match next {
                Some(code) => code,
                None => break,
            },
        };

        debug!(key_code, "hotkey event");
        let snapshot = cache.get();
        let Some(command) = resolver.resolve(&snapshot, key_code) else {
            continue;
        };

        // Delivery is best effort; the initiator has already logged the reason.
        let sent = tokio::select! {
            _ = cancel.cancelled() => break,
            r = initiator.send(&command) => r,
        };
        if let Err(e) = sent {
            debug!(key_code, verb = command.verb(), "command not delivered: {e}");
        }
    }

    info!("hotkey pipeline stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::audio_sync::AudioStateSynchronizer;
    use crate::infrastructure::audio::mock::MockAudioEndpoint;
    use crate::infrastructure::channel::mock::{MockConnector, MockOutcome};
    use crate::infrastructure::channel::{ChannelState, InitiatorConfig};
    use crate::infrastructure::led::LoggingLedController;
    use std::path::PathBuf;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use uuid::Uuid;

    fn write_config(json: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hotkey-pipeline-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("hotkey_map.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[tokio::test]
    async fn test_pipeline_sends_resolved_commands_in_order() {
        // Arrange
        let path = write_config(
            r#"{ "Theme": "Dark", "Mappings": [
                { "KeyCode": 1,  "Action": "launch",  "Payload": "notepad" },
                { "KeyCode": 62, "Action": "special", "Payload": "toggle_mic_mute", "ShowPopup": true }
            ] }"#,
        );
        let cache = Arc::new(ConfigCache::new());
        cache.reload(&path).unwrap();

        let audio = Arc::new(AudioStateSynchronizer::new(
            Some(Arc::new(MockAudioEndpoint::new(false))),
            None,
            Arc::new(LoggingLedController),
        ));
        let resolver = Arc::new(ActionResolver::new(audio));

        let (client, server) = tokio::io::duplex(1024);
        let connector = Arc::new(MockConnector::new());
        connector.push(MockOutcome::Accept(client));
        let initiator = Arc::new(CommandInitiator::new(connector, InitiatorConfig::default()));
        let cancel = CancellationToken::new();
        let channel_task = tokio::spawn({
            let initiator = Arc::clone(&initiator);
            let cancel = cancel.clone();
            async move { initiator.run(cancel).await }
        });
        initiator
            .subscribe_state()
            .wait_for(|s| *s == ChannelState::Connected)
            .await
            .unwrap();

        let (tx, rx) = mpsc::channel(8);
        let pipeline = tokio::spawn(run_hotkey_pipeline(
            rx,
            cache,
            resolver,
            Arc::clone(&initiator),
            cancel.clone(),
        ));

        // Act: an unmapped key between two mapped ones.
        for code in [1, 99, 62] {
            tx.send(code).await.unwrap();
        }

        // Assert
        let mut lines = BufReader::new(server).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("launch::notepad"));
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("show_icon::microphone_mute::dark")
        );

        cancel.cancel();
        pipeline.await.unwrap();
        channel_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_stops_pipeline_blocked_on_send() {
        // Arrange: the agent never reads and the pipe holds 8 bytes, so the
        // launch line stalls mid-write.
        let path = write_config(
            r#"{ "Mappings": [ { "KeyCode": 1, "Action": "launch", "Payload": "notepad" } ] }"#,
        );
        let cache = Arc::new(ConfigCache::new());
        cache.reload(&path).unwrap();
        let audio = Arc::new(AudioStateSynchronizer::new(None, None, Arc::new(LoggingLedController)));

        let (client, _server) = tokio::io::duplex(8);
        let connector = Arc::new(MockConnector::new());
        connector.push(MockOutcome::Accept(client));
        let initiator = Arc::new(CommandInitiator::new(connector, InitiatorConfig::default()));
        let cancel = CancellationToken::new();
        let channel_task = tokio::spawn({
            let initiator = Arc::clone(&initiator);
            let cancel = cancel.clone();
            async move { initiator.run(cancel).await }
        });
        initiator
            .subscribe_state()
            .wait_for(|s| *s == ChannelState::Connected)
            .await
            .unwrap();

        let (tx, rx) = mpsc::channel(8);
        let pipeline = tokio::spawn(run_hotkey_pipeline(
            rx,
            cache,
            Arc::new(ActionResolver::new(audio)),
            initiator,
            cancel.clone(),
        ));
        tx.send(1).await.unwrap();
        tx.send(1).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        // Act
        cancel.cancel();

        // Assert
        tokio::time::timeout(std::time::Duration::from_secs(1), pipeline)
            .await
            .expect("pipeline did not stop")
            .unwrap();
        channel_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_pipeline_ends_when_source_closes() {
        let initiator = Arc::new(CommandInitiator::new(
            Arc::new(MockConnector::new()),
            InitiatorConfig::default(),
        ));
        let audio = Arc::new(AudioStateSynchronizer::new(None, None, Arc::new(LoggingLedController)));
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        run_hotkey_pipeline(
            rx,
            Arc::new(ConfigCache::new()),
            Arc::new(ActionResolver::new(audio)),
            initiator,
            CancellationToken::new(),
        )
        .await;
    }
}
