use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use consolepanel_core::process::ProcessRunner;
use consolepanel_core::tools::{NewConsoleRequest, require_handle, require_key, require_text};
use consolepanel_core::windows::{ActionStatus, DirectoryListing, WindowDescriptor};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::ApiError;
use crate::state::AppState;

pub const CAPTURE_JSON_HEADER: &str = "x-capture-json";

/// Build the router. Every route makes exactly one adapter call.
pub fn router<R: ProcessRunner + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/list", get(list_windows::<R>))
        .route("/capture/:handle", get(capture_window::<R>))
        .route("/foreground", post(foreground_window::<R>))
        .route("/text", post(type_text::<R>))
        .route("/key", post(press_key::<R>))
        .route("/kill", post(kill_window::<R>))
        .route("/new", post(new_console::<R>))
        .route("/ls", get(list_directory::<R>))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct HandleRequest {
    pub handle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextRequest {
    pub handle: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeyRequest {
    pub handle: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LsQuery {
    pub path: Option<String>,
}

fn rejected(route: &'static str, error: ApiError) -> ApiError {
    warn!(
        event = "server.route.request_rejected",
        route = route,
        code = error.code(),
        error = error.message()
    );
    error
}

fn failed(route: &'static str, error: impl Into<ApiError>) -> ApiError {
    let error = error.into();
    warn!(
        event = "server.route.request_failed",
        route = route,
        code = error.code(),
        error = error.message()
    );
    error
}

pub async fn list_windows<R: ProcessRunner>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<WindowDescriptor>>, ApiError> {
    let windows = state
        .adapter
        .list_windows()
        .await
        .map_err(|e| failed("/list", e))?;
    Ok(Json(windows))
}

/// Respond with the PNG bytes and the tool's result array in `X-Capture-JSON`.
pub async fn capture_window<R: ProcessRunner>(
    State(state): State<AppState<R>>,
    Path(handle): Path<String>,
) -> Result<Response, ApiError> {
    let handle =
        require_handle(Some(handle.as_str())).map_err(|e| rejected("/capture", e.into()))?;

    let result = state
        .adapter
        .capture_window(&handle)
        .await
        .map_err(|e| failed("/capture", e))?;

    let Some(image) = result.image else {
        let message = result
            .error
            .unwrap_or_else(|| "capture produced no image".to_string());
        return Err(failed(
            "/capture",
            ApiError::capture_failed(message, result.records),
        ));
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    match serde_json::to_string(&result.records)
        .ok()
        .and_then(|json| HeaderValue::from_str(&escape_non_ascii(&json)).ok())
    {
        Some(value) => {
            headers.insert(CAPTURE_JSON_HEADER, value);
        }
        None => warn!(event = "server.route.capture_header_skipped", handle = handle),
    }

    info!(
        event = "server.route.capture_completed",
        handle = handle,
        bytes = image.len()
    );
    Ok((StatusCode::OK, headers, image).into_response())
}

pub async fn foreground_window<R: ProcessRunner>(
    State(state): State<AppState<R>>,
    body: Result<Json<HandleRequest>, JsonRejection>,
) -> Result<Json<ActionStatus>, ApiError> {
    let Json(body) = body.map_err(|e| rejected("/foreground", e.into()))?;
    let handle =
        require_handle(body.handle.as_deref()).map_err(|e| rejected("/foreground", e.into()))?;

    let status = state
        .adapter
        .foreground_window(&handle)
        .await
        .map_err(|e| failed("/foreground", e))?;
    Ok(Json(status))
}

pub async fn type_text<R: ProcessRunner>(
    State(state): State<AppState<R>>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<ActionStatus>, ApiError> {
    let Json(body) = body.map_err(|e| rejected("/text", e.into()))?;
    let handle =
        require_handle(body.handle.as_deref()).map_err(|e| rejected("/text", e.into()))?;
    let text = require_text(body.text.as_deref()).map_err(|e| rejected("/text", e.into()))?;

    let status = state
        .adapter
        .type_text(&handle, text)
        .await
        .map_err(|e| failed("/text", e))?;
    Ok(Json(status))
}

pub async fn press_key<R: ProcessRunner>(
    State(state): State<AppState<R>>,
    body: Result<Json<KeyRequest>, JsonRejection>,
) -> Result<Json<ActionStatus>, ApiError> {
    let Json(body) = body.map_err(|e| rejected("/key", e.into()))?;
    let handle =
        require_handle(body.handle.as_deref()).map_err(|e| rejected("/key", e.into()))?;
    let key = require_key(body.key.as_deref()).map_err(|e| rejected("/key", e.into()))?;

    let status = state
        .adapter
        .press_key(&handle, &key)
        .await
        .map_err(|e| failed("/key", e))?;
    Ok(Json(status))
}

pub async fn kill_window<R: ProcessRunner>(
    State(state): State<AppState<R>>,
    body: Result<Json<HandleRequest>, JsonRejection>,
) -> Result<Json<ActionStatus>, ApiError> {
    let Json(body) = body.map_err(|e| rejected("/kill", e.into()))?;
    let handle =
        require_handle(body.handle.as_deref()).map_err(|e| rejected("/kill", e.into()))?;

    let status = state
        .adapter
        .kill_window(&handle)
        .await
        .map_err(|e| failed("/kill", e))?;
    Ok(Json(status))
}

/// Every field is optional, so an empty body is accepted.
pub async fn new_console<R: ProcessRunner>(
    State(state): State<AppState<R>>,
    body: Bytes,
) -> Result<Json<ActionStatus>, ApiError> {
    let request: NewConsoleRequest = if body.iter().all(u8::is_ascii_whitespace) {
        NewConsoleRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| rejected("/new", e.into()))?
    };

    let status = state
        .adapter
        .spawn_console(&request)
        .await
        .map_err(|e| failed("/new", e))?;
    Ok(Json(status))
}

pub async fn list_directory<R: ProcessRunner>(
    State(state): State<AppState<R>>,
    Query(query): Query<LsQuery>,
) -> Result<Json<DirectoryListing>, ApiError> {
    let listing = state
        .adapter
        .list_directory(query.path.as_deref())
        .await
        .map_err(|e| failed("/ls", ApiError::from(e).with_empty_listing()))?;
    Ok(Json(listing))
}

/// Allow every origin, method and header. Preflight requests are answered here.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("X-Capture-JSON"),
    );
    response
}

/// Escape every non-ASCII character as `\uXXXX` so the JSON is a legal
/// header value. Only valid for JSON text, where non-ASCII can occur only
/// inside strings.
pub fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use consolepanel_core::config::ToolsConfig;
    use consolepanel_core::process::{ProcessOutput, ScriptedRunner, ToolCommand};
    use consolepanel_core::tools::ToolAdapter;
    use std::path::{Path as FsPath, PathBuf};
    use tempfile::TempDir;

    fn state(runner: ScriptedRunner, capture_dir: &FsPath) -> AppState<ScriptedRunner> {
        let config = ToolsConfig {
            capture_dir: Some(capture_dir.to_path_buf()),
            ..Default::default()
        };
        AppState::new(ToolAdapter::with_runner(config, runner))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn out_dir(command: &ToolCommand) -> PathBuf {
        let args = command.get_args();
        let pos = args.iter().position(|a| a == "--out").unwrap();
        PathBuf::from(&args[pos + 1])
    }

    fn capture_tool(code: i32, body: &'static str, write_png: bool) -> ScriptedRunner {
        ScriptedRunner::new(move |command| {
            if write_png {
                std::fs::write(out_dir(command).join("0xAB.png"), b"\x89PNG").unwrap();
            }
            Ok(ProcessOutput::completed(code, body))
        })
    }

    const CAPTURE_OK: &str = r#"[{"handle":"0xAB","title":"café","width":10,"height":10,"ok":true,"png":"0xAB.png","method":"PrintWindow"}]"#;

    fn text_request(handle: &str, text: &str) -> Result<Json<TextRequest>, JsonRejection> {
        Ok(Json(TextRequest {
            handle: Some(handle.to_string()),
            text: Some(text.to_string()),
        }))
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_the_tool() {
        let tmp = TempDir::new().unwrap();
        let state = state(ScriptedRunner::always(0, r#"{"ok":true}"#), tmp.path());

        let response = type_text(State(state.clone()), text_request("0xAB", ""))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "missing text");
        assert_eq!(body["code"], "CLIENT_VALIDATION_MISSING_FIELD");
        assert_eq!(state.adapter.runner().call_count(), 0);
    }

    #[tokio::test]
    async fn test_type_text_forwards_text_verbatim() {
        let tmp = TempDir::new().unwrap();
        let state = state(ScriptedRunner::always(0, r#"{"ok":true}"#), tmp.path());

        let response = type_text(State(state.clone()), text_request("0xAB", " git status "))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let call = &state.adapter.runner().calls()[0];
        assert!(call.get_args()[0].ends_with("TypeText.py"));
        assert_eq!(&call.get_args()[1..], ["0xAB", " git status "]);
    }

    #[tokio::test]
    async fn test_missing_key_and_handle_are_client_errors() {
        let tmp = TempDir::new().unwrap();
        let state = state(ScriptedRunner::always(0, r#"{"ok":true}"#), tmp.path());

        let response = press_key(
            State(state.clone()),
            Ok(Json(KeyRequest {
                handle: Some("0xAB".to_string()),
                key: Some(" + ".to_string()),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = kill_window(State(state.clone()), Ok(Json(HandleRequest::default())))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "missing handle");

        assert_eq!(state.adapter.runner().call_count(), 0);
    }

    #[tokio::test]
    async fn test_key_is_normalized() {
        let tmp = TempDir::new().unwrap();
        let state = state(ScriptedRunner::always(0, r#"{"ok":true}"#), tmp.path());

        press_key(
            State(state.clone()),
            Ok(Json(KeyRequest {
                handle: Some("0xAB".to_string()),
                key: Some("Ctrl + C".to_string()),
            })),
        )
        .await
        .unwrap();

        assert_eq!(state.adapter.runner().calls()[0].get_args()[2], "ctrl+c");
    }

    #[tokio::test]
    async fn test_logical_failure_is_a_successful_exchange() {
        let tmp = TempDir::new().unwrap();
        let state = state(
            ScriptedRunner::always(1, r#"{"ok":false,"error":"Window not found: 0xAB"}"#),
            tmp.path(),
        );

        let response = foreground_window(
            State(state),
            Ok(Json(HandleRequest {
                handle: Some("0xAB".to_string()),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Window not found: 0xAB");
    }

    #[tokio::test]
    async fn test_capture_returns_png_and_result_header() {
        let tmp = TempDir::new().unwrap();
        let state = state(capture_tool(0, CAPTURE_OK, true), tmp.path());

        let response = capture_window(State(state), Path("0xAB".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let raw = response.headers()[CAPTURE_JSON_HEADER].to_str().unwrap().to_string();
        assert!(raw.contains("caf\\u00e9"));
        let records: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(records[0]["title"], "café");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_capture_partial_success_exit_code() {
        let tmp = TempDir::new().unwrap();
        let state = state(capture_tool(1, CAPTURE_OK, true), tmp.path());

        let response = capture_window(State(state), Path("0xAB".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_capture_unexpected_exit_code_is_server_error() {
        let tmp = TempDir::new().unwrap();
        let state = state(capture_tool(2, CAPTURE_OK, true), tmp.path());

        let response = capture_window(State(state), Path("0xAB".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["code"], "TOOL_INVOCATION_ERROR");
    }

    #[tokio::test]
    async fn test_capture_missing_file_is_integrity_error() {
        let tmp = TempDir::new().unwrap();
        let state = state(capture_tool(0, CAPTURE_OK, false), tmp.path());

        let response = capture_window(State(state), Path("0xAB".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["code"], "CAPTURE_INTEGRITY_ERROR");
    }

    #[tokio::test]
    async fn test_capture_without_image_reports_results() {
        let tmp = TempDir::new().unwrap();
        let state = state(
            ScriptedRunner::always(1, r#"[{"handle":"0xAB","ok":false,"error":"minimized"}]"#),
            tmp.path(),
        );

        let response = capture_window(State(state), Path("0xAB".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["code"], "CAPTURE_FAILED");
        assert_eq!(body["error"], "minimized");
        assert_eq!(body["results"][0]["handle"], "0xAB");
    }

    #[tokio::test]
    async fn test_capture_rejects_unusable_handle() {
        let tmp = TempDir::new().unwrap();
        let state = state(ScriptedRunner::always(0, CAPTURE_OK), tmp.path());

        let response = capture_window(State(state.clone()), Path("<script>".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.adapter.runner().call_count(), 0);
    }

    #[tokio::test]
    async fn test_list_malformed_output_is_server_error() {
        let tmp = TempDir::new().unwrap();
        let state = state(ScriptedRunner::always(0, "not json"), tmp.path());

        let response = list_windows(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["code"], "MALFORMED_OUTPUT_ERROR");
    }

    #[tokio::test]
    async fn test_new_console_accepts_empty_body() {
        let tmp = TempDir::new().unwrap();
        let state = state(ScriptedRunner::always(0, r#"{"ok":true}"#), tmp.path());

        let response = new_console(State(state.clone()), Bytes::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.adapter.runner().calls()[0].get_args().len(), 1);

        let response = new_console(State(state.clone()), Bytes::from_static(b"{nope"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.adapter.runner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_ls_passes_path() {
        let tmp = TempDir::new().unwrap();
        let state = state(
            ScriptedRunner::always(0, r#"{"ok":true,"path":"C:\\","dirs":["Users"]}"#),
            tmp.path(),
        );

        let Json(listing) = list_directory(
            State(state.clone()),
            Query(LsQuery {
                path: Some("C:\\".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(listing.dirs, ["Users"]);
        assert_eq!(
            &state.adapter.runner().calls()[0].get_args()[1..],
            ["--path", "C:\\"]
        );
    }

    #[tokio::test]
    async fn test_ls_failure_returns_empty_listing() {
        let tmp = TempDir::new().unwrap();
        let state = state(ScriptedRunner::always(2, "Traceback"), tmp.path());

        let response = list_directory(State(state), Query(LsQuery::default()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["path"], "");
        assert_eq!(body["dirs"], serde_json::json!([]));
    }

    #[test]
    fn test_escape_non_ascii() {
        assert_eq!(escape_non_ascii(r#"{"t":"abc"}"#), r#"{"t":"abc"}"#);
        assert_eq!(escape_non_ascii("é"), "\\u00e9");
        assert_eq!(escape_non_ascii("😀"), "\\ud83d\\ude00");
    }
}
