use dev_ready::{
    AssetsManifest, DevConfig, DevNotifier, DevReadyBroadcaster, DevReadyError, ServerBuild,
};
use httpmock::prelude::*;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Collects formatted log lines so tests can count them.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_errors() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::ERROR)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

fn build(version: &str) -> ServerBuild {
    ServerBuild::new(AssetsManifest::new(version))
}

#[tokio::test]
async fn test_ping_carries_manifest_version() {
    let server = MockServer::start();
    let ping = server.mock(|when, then| {
        when.method(POST)
            .path("/ping")
            .header("content-type", "application/json")
            .json_body(serde_json::json!({"buildHash": "7e1f0c2d"}));
        then.status(200);
    });

    let mut manifest_file = NamedTempFile::new().unwrap();
    manifest_file
        .write_all(br#"{"version": "7e1f0c2d", "url": "/build/manifest-7e1f0c2d.js"}"#)
        .unwrap();
    let build = ServerBuild::new(AssetsManifest::from_file(manifest_file.path()).unwrap());

    let broadcaster = DevReadyBroadcaster::new(DevConfig::new(server.base_url()));
    broadcaster.broadcast_and_wait(&build, None).await.unwrap();

    ping.assert_hits(1);
}

#[tokio::test]
async fn test_origin_with_trailing_slash() {
    let server = MockServer::start();
    let ping = server.mock(|when, then| {
        when.method(POST).path("/ping");
        then.status(204);
    });

    let broadcaster = DevReadyBroadcaster::new(DevConfig::default());
    let origin = format!("{}/", server.base_url());
    broadcaster
        .broadcast_and_wait(&build("v2"), Some(origin.as_str()))
        .await
        .unwrap();

    ping.assert_hits(1);
}

#[tokio::test]
async fn test_no_origin_means_no_request() {
    let server = MockServer::start();
    let any_request = server.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let broadcaster = DevReadyBroadcaster::new(DevConfig::default());
    let err = broadcaster.broadcast(&build("v1"), None).unwrap_err();

    assert!(matches!(err, DevReadyError::Config { .. }));
    assert_eq!(err.exit_code(), 1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(any_request.hits(), 0);
}

#[tokio::test]
async fn test_invalid_origin_is_config_error() {
    let broadcaster = DevReadyBroadcaster::new(DevConfig::new("localhost:3001"));
    let err = broadcaster.broadcast(&build("v1"), None).unwrap_err();

    assert!(matches!(err, DevReadyError::InvalidConfigValue { .. }));
}

#[tokio::test]
async fn test_unreachable_origin_logs_once_and_returns_transport_error() {
    let (logs, _guard) = capture_errors();
    let origin = "http://127.0.0.1:1";

    let broadcaster = DevReadyBroadcaster::new(
        DevConfig::new(origin).with_timeout(Duration::from_secs(5)),
    );
    let pending = broadcaster.broadcast(&build("v1"), None).unwrap();
    let err = pending.wait().await.unwrap_err();

    match &err {
        DevReadyError::Transport { origin: reported, .. } => assert_eq!(reported, origin),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 2);

    let needle = format!("Could not reach dev server at {}", origin);
    assert_eq!(logs.contents().matches(&needle).count(), 1);
}

#[tokio::test]
async fn test_broadcast_returns_before_response() {
    let server = MockServer::start();
    let ping = server.mock(|when, then| {
        when.method(POST).path("/ping");
        then.status(200).delay(Duration::from_millis(300));
    });

    let broadcaster = DevReadyBroadcaster::new(DevConfig::new(server.base_url()));
    let pending = broadcaster.broadcast(&build("slow"), None).unwrap();
    assert!(!pending.is_finished());

    pending.wait().await.unwrap();
    ping.assert_hits(1);
}

#[tokio::test]
async fn test_each_build_gets_its_own_ping() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(POST)
            .path("/ping")
            .json_body(serde_json::json!({"buildHash": "first"}));
        then.status(200);
    });
    let second = server.mock(|when, then| {
        when.method(POST)
            .path("/ping")
            .json_body(serde_json::json!({"buildHash": "second"}));
        then.status(200);
    });

    let broadcaster = DevReadyBroadcaster::new(DevConfig::new(server.base_url()));
    let a = broadcaster.broadcast(&build("first"), None).unwrap();
    let b = broadcaster.broadcast(&build("second"), None).unwrap();
    a.wait().await.unwrap();
    b.wait().await.unwrap();

    first.assert_hits(1);
    second.assert_hits(1);
}

#[tokio::test]
async fn test_same_hash_twice_sends_twice() {
    let server = MockServer::start();
    let ping = server.mock(|when, then| {
        when.method(POST)
            .path("/ping")
            .json_body(serde_json::json!({"buildHash": "same"}));
        then.status(200);
    });

    let broadcaster = DevReadyBroadcaster::new(DevConfig::new(server.base_url()));
    broadcaster.broadcast_and_wait(&build("same"), None).await.unwrap();
    broadcaster.broadcast_and_wait(&build("same"), None).await.unwrap();

    ping.assert_hits(2);
}

#[tokio::test]
async fn test_notifier_trait_object() {
    let server = MockServer::start();
    let ping = server.mock(|when, then| {
        when.method(POST)
            .path("/ping")
            .json_body(serde_json::json!({"buildHash": "dyn"}));
        then.status(200);
    });

    let notifier: Box<dyn DevNotifier> =
        Box::new(DevReadyBroadcaster::new(DevConfig::new(server.base_url())));
    notifier.notify(&build("dyn")).await.unwrap();

    ping.assert();
}
