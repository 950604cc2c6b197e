//! Verb dispatch tests

use serde_json::json;

use hoist::app::options::AppOptions;
use hoist::app::run::{dispatch, Outcome, Verb};
use hoist::errors::AgentError;
use hoist::exec::transport::OutputMode;

use crate::common::{executor, local_executor, remote_config, RecordingTransport, REMOTE_CONFIG};

#[tokio::test]
async fn test_config_get() {
    let transport = RecordingTransport::new();
    let config = remote_config(json!({ "port": 2222, "forward-agent": false }));
    let (executor, _dir) = executor(&config, &transport);
    let options = AppOptions::default();

    let get = |key: &str| Verb::ConfigGet(key.to_string());

    assert_eq!(
        dispatch(&options, &executor, get("host")).await.unwrap(),
        Outcome::Print("web1.example.com".to_string())
    );
    assert_eq!(
        dispatch(&options, &executor, get("port")).await.unwrap(),
        Outcome::Print("2222".to_string())
    );
    assert_eq!(
        dispatch(&options, &executor, get("forward-agent")).await.unwrap(),
        Outcome::Print(String::new())
    );
    assert_eq!(
        dispatch(&options, &executor, get("no-such-key")).await.unwrap(),
        Outcome::Print(String::new())
    );
    assert!(transport.invocations().is_empty());
}

#[tokio::test]
async fn test_deploy_falls_back_to_configured_ref() {
    let transport = RecordingTransport::new();
    let config = remote_config(json!({ "ref": "origin/stable" }));
    let (executor, _dir) = executor(&config, &transport);
    let options = AppOptions {
        force: true,
        ..AppOptions::default()
    };

    let verb = Verb::Deploy {
        git_ref: None,
        branch: None,
    };
    assert_eq!(
        dispatch(&options, &executor, verb).await.unwrap(),
        Outcome::Silent
    );

    assert!(transport.ran("git reset --hard origin/stable"));
    assert!(!transport.ran("git for-each-ref"));
}

#[tokio::test]
async fn test_deploy_checks_local_repository_unless_forced() {
    let transport = RecordingTransport::new();
    transport.fail("git diff-files", 1);
    let (executor, _dir) = executor(REMOTE_CONFIG, &transport);
    let verb = || Verb::Deploy {
        git_ref: Some("origin/main".to_string()),
        branch: None,
    };

    let err = dispatch(&AppOptions::default(), &executor, verb())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::DeployFailed { .. }));
    assert!(!transport.ran("git fetch"));

    let forced = AppOptions {
        force: true,
        ..AppOptions::default()
    };
    dispatch(&forced, &executor, verb()).await.unwrap();
    assert!(transport.ran("git fetch"));
}

#[tokio::test]
async fn test_previous_and_list() {
    let transport = RecordingTransport::new();
    transport.respond("then cat", "abc111\nabc222\n");
    let (executor, _dir) = executor(REMOTE_CONFIG, &transport);
    let options = AppOptions::default();

    assert_eq!(
        dispatch(&options, &executor, Verb::Previous).await.unwrap(),
        Outcome::Print("abc111".to_string())
    );
    assert_eq!(
        dispatch(&options, &executor, Verb::List).await.unwrap(),
        Outcome::Print("0 abc222\n1 abc111".to_string())
    );
}

#[tokio::test]
async fn test_empty_list_is_silent() {
    let transport = RecordingTransport::new();
    let (executor, _dir) = executor(REMOTE_CONFIG, &transport);

    let outcome = dispatch(&AppOptions::default(), &executor, Verb::List)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Silent);
}

#[tokio::test]
async fn test_run_in_working_copy() {
    let transport = RecordingTransport::new();
    let (executor, _dir) = executor(REMOTE_CONFIG, &transport);

    dispatch(
        &AppOptions::default(),
        &executor,
        Verb::Run("tail -n 50 log/production.log".to_string()),
    )
    .await
    .unwrap();

    let calls = transport.invocations();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].command,
        "cd /srv/shop/app && (\ntail -n 50 log/production.log\n) 2>&1"
    );
    assert_eq!(calls[0].mode, OutputMode::Stream);
}

#[tokio::test]
async fn test_run_reports_command_status() {
    let transport = RecordingTransport::new();
    transport.fail("rake db:migrate", 5);
    let (executor, _dir) = executor(REMOTE_CONFIG, &transport);

    let err = dispatch(
        &AppOptions::default(),
        &executor,
        Verb::Run("rake db:migrate".to_string()),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        AgentError::CommandFailed {
            status: Some(5),
            ..
        }
    ));
}

#[tokio::test]
async fn test_console_is_interactive() {
    let transport = RecordingTransport::new();
    let (executor, _dir) = executor(REMOTE_CONFIG, &transport);

    dispatch(&AppOptions::default(), &executor, Verb::Console)
        .await
        .unwrap();

    let calls = transport.invocations();
    assert_eq!(calls[0].mode, OutputMode::Interactive);
    assert_eq!(calls[0].command, "cd /srv/shop/app && exec $SHELL --login");
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_with_trailing_comment_in_real_shell() {
    let (executor, _dir) = local_executor(json!({}));
    let options = AppOptions::default();

    let outcome = dispatch(&options, &executor, Verb::Run("pwd # where am i".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Silent);

    let err = dispatch(&options, &executor, Verb::Run("exit 7".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::CommandFailed {
            status: Some(7),
            ..
        }
    ));
}
