//! Hook runner tests

use serde_json::json;

use hoist::deploy::hooks::{HookPoint, HookRunner};
use hoist::errors::AgentError;
use hoist::exec::target::Target;
use hoist::exec::transport::OutputMode;
use hoist::storage::layout::RemoteLayout;

use crate::common::{executor, local_executor, remote_config, RecordingTransport, REMOTE_CONFIG};

#[tokio::test]
async fn test_absent_hook_runs_nothing() {
    let transport = RecordingTransport::new();
    let (executor, _dir) = executor(REMOTE_CONFIG, &transport);
    let layout = RemoteLayout::from_config(executor.config());
    let hooks = HookRunner::new(&executor, &layout);

    for point in HookPoint::ALL {
        hooks.run(point).await.unwrap();
    }

    assert!(transport.invocations().is_empty());
}

#[tokio::test]
async fn test_blank_hook_is_absent() {
    let transport = RecordingTransport::new();
    let config = remote_config(json!({ "post-deploy": "   " }));
    let (executor, _dir) = executor(&config, &transport);
    let layout = RemoteLayout::from_config(executor.config());

    HookRunner::new(&executor, &layout)
        .run(HookPoint::PostDeploy)
        .await
        .unwrap();

    assert!(transport.invocations().is_empty());
}

#[tokio::test]
async fn test_remote_hook_runs_in_current_with_shared() {
    let transport = RecordingTransport::new();
    let config = remote_config(json!({ "post-deploy": "npm install" }));
    let (executor, _dir) = executor(&config, &transport);
    let layout = RemoteLayout::from_config(executor.config());

    HookRunner::new(&executor, &layout)
        .run(HookPoint::PostDeploy)
        .await
        .unwrap();

    let calls = transport.invocations();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].command,
        "cd /srv/shop/app_current; export SHARED=\"/srv/shop/app_shared\"; (\nnpm install\n) 2>&1"
    );
    assert_eq!(calls[0].mode, OutputMode::Stream);
    assert!(!calls[0].target.is_local());
}

#[tokio::test]
async fn test_pre_deploy_local_runs_locally() {
    let transport = RecordingTransport::new();
    let config = remote_config(json!({ "pre-deploy-local": "make assets" }));
    let (executor, _dir) = executor(&config, &transport);
    let layout = RemoteLayout::from_config(executor.config());

    HookRunner::new(&executor, &layout)
        .run(HookPoint::PreDeployLocal)
        .await
        .unwrap();

    let calls = transport.invocations();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, Target::Local);
    assert_eq!(calls[0].command, "(\nmake assets\n) 2>&1");
}

#[tokio::test]
async fn test_failing_hook_reports_its_status() {
    let transport = RecordingTransport::new();
    transport.fail("npm test", 3);
    let config = remote_config(json!({ "pre-deploy": "npm test" }));
    let (executor, _dir) = executor(&config, &transport);
    let layout = RemoteLayout::from_config(executor.config());

    let err = HookRunner::new(&executor, &layout)
        .run(HookPoint::PreDeploy)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AgentError::HookFailed {
            hook: HookPoint::PreDeploy,
            status: Some(3),
        }
    ));
}

#[tokio::test]
async fn test_hook_output_is_teed_into_audit_log() {
    let transport = RecordingTransport::new();
    transport.respond("bundle exec rake", "migrated 2 tables");
    let config = remote_config(json!({ "post-deploy": "bundle exec rake db:migrate" }));
    let (executor, _dir) = executor(&config, &transport);
    let layout = RemoteLayout::from_config(executor.config());

    HookRunner::new(&executor, &layout)
        .run(HookPoint::PostDeploy)
        .await
        .unwrap();

    let log = tokio::fs::read_to_string(executor.audit().path())
        .await
        .unwrap();
    assert!(log.contains("[deploy@web1.example.com] cd /srv/shop/app_current"));
    assert!(log.contains("migrated 2 tables\n"));
}

#[tokio::test]
async fn test_pre_setup_streams_local_script() {
    let scripts = tempfile::tempdir().unwrap();
    let script = scripts.path().join("bootstrap.sh");
    tokio::fs::write(&script, "apt-get install -y git\n")
        .await
        .unwrap();

    let transport = RecordingTransport::new();
    let config = remote_config(json!({
        "pre-setup": format!("{} staging eu", script.display())
    }));
    let (executor, _dir) = executor(&config, &transport);
    let layout = RemoteLayout::from_config(executor.config());

    HookRunner::new(&executor, &layout)
        .run(HookPoint::PreSetup)
        .await
        .unwrap();

    let calls = transport.invocations();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].command, "bash -s -- staging eu 2>&1");
    assert_eq!(calls[0].stdin_file.as_deref(), Some(script.as_path()));
}

#[tokio::test]
async fn test_pre_setup_without_script_runs_as_command() {
    let transport = RecordingTransport::new();
    let config = remote_config(json!({ "pre-setup": "sudo mkdir -p /srv/shop" }));
    let (executor, _dir) = executor(&config, &transport);
    let layout = RemoteLayout::from_config(executor.config());

    HookRunner::new(&executor, &layout)
        .run(HookPoint::PreSetup)
        .await
        .unwrap();

    let calls = transport.invocations();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].stdin_file.is_none());
    assert!(calls[0].command.ends_with("(\nsudo mkdir -p /srv/shop\n) 2>&1"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_trailing_comment_keeps_hook_status() {
    let (executor, _dir) = local_executor(json!({
        "pre-deploy-local": "true # build assets",
        "post-deploy": "true # restart app"
    }));
    let layout = RemoteLayout::from_config(executor.config());
    let hooks = HookRunner::new(&executor, &layout);

    hooks.run(HookPoint::PreDeployLocal).await.unwrap();
    hooks.run(HookPoint::PostDeploy).await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_shell_hook_exit_status() {
    let (executor, _dir) = local_executor(json!({ "post-deploy": "echo restarting; exit 7" }));
    let layout = RemoteLayout::from_config(executor.config());

    let err = HookRunner::new(&executor, &layout)
        .run(HookPoint::PostDeploy)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AgentError::HookFailed {
            hook: HookPoint::PostDeploy,
            status: Some(7),
        }
    ));
    let log = tokio::fs::read_to_string(executor.audit().path())
        .await
        .unwrap();
    assert!(log.contains("restarting\n"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_script_errors_reach_audit_log() {
    let scripts = tempfile::tempdir().unwrap();
    let script = scripts.path().join("bootstrap.sh");
    tokio::fs::write(&script, "echo \"missing $1\" >&2\nexit 4\n")
        .await
        .unwrap();

    let (executor, _dir) = local_executor(json!({
        "pre-setup": format!("{} nginx", script.display())
    }));
    let layout = RemoteLayout::from_config(executor.config());

    let err = HookRunner::new(&executor, &layout)
        .run(HookPoint::PreSetup)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AgentError::HookFailed {
            hook: HookPoint::PreSetup,
            status: Some(4),
        }
    ));
    let log = tokio::fs::read_to_string(executor.audit().path())
        .await
        .unwrap();
    assert!(log.contains("missing nginx\n"));
}
