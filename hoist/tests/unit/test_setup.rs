//! Setup workflow tests

use serde_json::json;

use hoist::deploy::fsm::SetupStage;
use hoist::deploy::setup::Setup;
use hoist::errors::AgentError;

use crate::common::{executor, remote_config, RecordingTransport, REMOTE_CONFIG};

#[tokio::test]
async fn test_setup_runs_stages_in_order() {
    let transport = RecordingTransport::new();
    let config = remote_config(json!({
        "ref": "origin/main",
        "post-setup": "cp config.example config"
    }));
    let (executor, _dir) = executor(&config, &transport);

    Setup::new(&executor).run().await.unwrap();

    assert_eq!(
        transport.commands(),
        vec![
            "mkdir -p /srv/shop /srv/shop/app_shared/logs /srv/shop/app_shared/pids /srv/shop/app"
                .to_string(),
            "git clone --branch main git@example.com:acme/shop.git /srv/shop/app".to_string(),
            "ln -sfn /srv/shop/app /srv/shop/app_current.tmp && mv -Tf /srv/shop/app_current.tmp /srv/shop/app_current"
                .to_string(),
            "cd /srv/shop/app_current; export SHARED=\"/srv/shop/app_shared\"; (\ncp config.example config\n) 2>&1"
                .to_string(),
        ]
    );
}

#[tokio::test]
async fn test_setup_fast_fetch_clones_shallow() {
    let transport = RecordingTransport::new();
    let config = remote_config(json!({ "fetch": "fast" }));
    let (executor, _dir) = executor(&config, &transport);

    Setup::new(&executor).run().await.unwrap();

    assert!(transport.ran("git clone --depth=5 git@example.com:acme/shop.git /srv/shop/app"));
}

#[tokio::test]
async fn test_setup_stops_at_failed_clone() {
    let transport = RecordingTransport::new();
    transport.fail("git clone", 128);
    let config = remote_config(json!({ "post-setup": "echo done" }));
    let (executor, _dir) = executor(&config, &transport);

    let err = Setup::new(&executor).run().await.unwrap_err();

    assert!(matches!(
        err,
        AgentError::SetupFailed {
            stage: SetupStage::Clone,
            ..
        }
    ));
    assert!(!transport.ran("ln -sfn"));
    assert!(!transport.ran("echo done"));
}

#[tokio::test]
async fn test_setup_failed_pre_hook_stops_everything() {
    let transport = RecordingTransport::new();
    transport.fail("check-disk", 1);
    let config = remote_config(json!({ "pre-setup": "check-disk" }));
    let (executor, _dir) = executor(&config, &transport);

    let err = Setup::new(&executor).run().await.unwrap_err();

    assert!(matches!(
        err,
        AgentError::SetupFailed {
            stage: SetupStage::PreSetupHook,
            ..
        }
    ));
    assert_eq!(transport.commands().len(), 1);
    assert!(!transport.ran("mkdir -p"));
}

#[tokio::test]
async fn test_setup_repeated_paths_and_link_are_idempotent() {
    let transport = RecordingTransport::new();
    let (executor, _dir) = executor(REMOTE_CONFIG, &transport);

    Setup::new(&executor).run().await.unwrap();
    let first = transport.commands();
    Setup::new(&executor).run().await.unwrap();
    let second: Vec<String> = transport.commands().split_off(first.len());

    // directory creation and the link swap never depend on prior state
    assert_eq!(first, second);
    assert!(first[0].starts_with("mkdir -p "));
    assert!(first[2].contains("ln -sfn") && first[2].contains("mv -Tf"));
}
