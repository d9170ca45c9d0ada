//! End-to-end tests over a real listener.

use consolepanel_core::config::ToolsConfig;
use consolepanel_core::process::ScriptedRunner;
use consolepanel_core::tools::ToolAdapter;
use consolepanel_server::{AppState, serve};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

async fn start(runner: ScriptedRunner) -> (String, CancellationToken, tempfile::TempDir) {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = ToolsConfig {
        capture_dir: Some(tmp.path().to_path_buf()),
        ..Default::default()
    };
    let state = AppState::new(ToolAdapter::with_runner(config, runner));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let shutdown = CancellationToken::new();
    tokio::spawn(serve(listener, state, shutdown.clone()));
    (base, shutdown, tmp)
}

#[tokio::test]
async fn test_list_over_http() {
    let (base, shutdown, _tmp) = start(ScriptedRunner::always(
        0,
        r#"[{"handle":"0x10","title":"cmd","processId":4}]"#,
    ))
    .await;

    let body: serde_json::Value = tokio::task::spawn_blocking(move || {
        ureq::get(&format!("{base}/list"))
            .call()
            .unwrap()
            .into_json()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(body[0]["handle"], "0x10");
    assert_eq!(body[0]["processId"], 4);
    shutdown.cancel();
}

#[tokio::test]
async fn test_validation_failure_status_over_http() {
    let (base, shutdown, _tmp) = start(ScriptedRunner::always(0, r#"{"ok":true}"#)).await;

    let status = tokio::task::spawn_blocking(move || {
        match ureq::post(&format!("{base}/text"))
            .send_json(serde_json::json!({"handle": "0xAB", "text": ""}))
        {
            Err(ureq::Error::Status(code, response)) => {
                let body: serde_json::Value = response.into_json().unwrap();
                assert_eq!(body["code"], "CLIENT_VALIDATION_MISSING_FIELD");
                code
            }
            other => panic!("expected an error status, got {other:?}"),
        }
    })
    .await
    .unwrap();

    assert_eq!(status, 400);
    shutdown.cancel();
}

#[tokio::test]
async fn test_cors_preflight_and_headers() {
    let (base, shutdown, _tmp) = start(ScriptedRunner::always(0, r#"{"ok":true}"#)).await;

    let (preflight_status, origin, post_origin) = tokio::task::spawn_blocking(move || {
        let preflight = ureq::request("OPTIONS", &format!("{base}/kill"))
            .set("Origin", "http://panel.local")
            .call()
            .unwrap();
        let status = preflight.status();
        let origin = preflight
            .header("access-control-allow-origin")
            .map(str::to_string);

        let post = ureq::post(&format!("{base}/kill"))
            .send_json(serde_json::json!({"handle": "0xAB"}))
            .unwrap();
        let post_origin = post
            .header("access-control-allow-origin")
            .map(str::to_string);
        (status, origin, post_origin)
    })
    .await
    .unwrap();

    assert_eq!(preflight_status, 204);
    assert_eq!(origin.as_deref(), Some("*"));
    assert_eq!(post_origin.as_deref(), Some("*"));
    shutdown.cancel();
}
