//! HTTP surface: one request = one sequential fetch → parse → chart/export
//! pipeline run. All state in `AppState` is immutable after startup.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::collectors::remote::ReportSource;
use crate::models::chart::PieFigure;
use crate::models::usage::TableRow;
use crate::report;
use crate::util::export::{export_chart_png, export_table_csv};
use crate::util::slack::Notifier;

const REMINDER_COMMAND: &str = "send_reminder";

pub struct AppState {
    pub source: Arc<dyn ReportSource>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub export_dir: PathBuf,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/", post(handle_report))
        .route("/command", post(handle_command))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Request / response shapes ─────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    ip: Option<String>,
}

#[derive(Serialize)]
struct ReportResponse {
    ok: bool,
    /// Raw df output, echoed back for display alongside the figures.
    message: String,
    figure_pie: PieFigure,
    figure_table: Vec<TableRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    png_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    table_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CommandRequest {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    payload: Option<CommandPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct CommandPayload {
    #[serde(default)]
    png_path: Option<String>,
    #[serde(default)]
    table_path: Option<String>,
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "ok": false, "message": message.into() }))).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn handle_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let (Some(username), Some(password), Some(ip)) = (
        req.username.filter(|s| !s.is_empty()),
        req.password.filter(|s| !s.is_empty()),
        req.ip.filter(|s| !s.is_empty()),
    ) else {
        return fail(StatusCode::BAD_REQUEST, "Username, password and ip required");
    };

    let raw = match state.source.fetch_report(&username, &password, &ip).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(%username, %ip, "login attempt failed");
            return fail(StatusCode::UNAUTHORIZED, e.to_string());
        }
    };
    info!(%username, %ip, "login attempt succeeded");

    let (chart, table) = match report::build_tables(&raw) {
        Ok(t) => t,
        Err(e) => {
            warn!(%ip, error = %e, "remote df output did not parse");
            return fail(StatusCode::BAD_GATEWAY, format!("malformed df output: {e}"));
        }
    };

    // Artifact export is best-effort and blocking (image encode + fs), so it
    // runs off the async worker.
    let export_dir = state.export_dir.clone();
    let (chart2, table2) = (chart.clone(), table.clone());
    let (png_path, table_path) = tokio::task::spawn_blocking(move || {
        (
            export_chart_png(&chart2, &export_dir),
            export_table_csv(&table2, &export_dir),
        )
    })
    .await
    .unwrap_or((None, None));

    let figure_pie = PieFigure::from_slices(&chart);
    Json(ReportResponse {
        ok: true,
        message: raw,
        figure_pie,
        figure_table: table,
        png_path: png_path.map(|p| p.display().to_string()),
        table_path: table_path.map(|p| p.display().to_string()),
    })
    .into_response()
}

async fn handle_command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> Response {
    if req.command.as_deref() != Some(REMINDER_COMMAND) {
        return fail(StatusCode::BAD_REQUEST, "unrecognized command");
    }
    let payload = req.payload.unwrap_or_default();
    let (Some(png_path), Some(table_path)) = (payload.png_path, payload.table_path) else {
        return fail(StatusCode::BAD_REQUEST, "payload.png_path and payload.table_path required");
    };
    let Some(notifier) = state.notifier.as_ref() else {
        return fail(StatusCode::SERVICE_UNAVAILABLE, "slack uploads not configured");
    };

    let uploads = [
        (png_path, "Disk usage chart", Some("Disk usage reminder")),
        (table_path, "Disk usage table", None),
    ];
    for (path, title, comment) in uploads {
        if let Err(e) = notifier.upload_file(path.as_ref(), title, comment).await {
            warn!(path, error = %e, "artifact upload failed");
            return fail(StatusCode::BAD_GATEWAY, format!("upload failed: {e}"));
        }
    }

    Json(json!({ "ok": true, "message": "reminder sent" })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::collectors::remote::FetchError;

    const SAMPLE: &str = "\
Filesystem Size Used Avail Use% Mounted on
/dev/xvda1 20G 10G 10G 50% /
svm-1.fsx.eu-west-1.amazonaws.com:/home/home/clasci01 20G 14G 6.5G 68% /home/clasci01
";

    struct FakeSource {
        result: Result<String, String>,
    }

    #[async_trait]
    impl ReportSource for FakeSource {
        async fn fetch_report(&self, _u: &str, _p: &str, _h: &str) -> Result<String, FetchError> {
            self.result
                .clone()
                .map_err(|reason| FetchError { reason })
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        uploads: Mutex<Vec<(String, String)>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn upload_file(&self, path: &Path, title: &str, _c: Option<&str>) -> Result<()> {
            if let Some(msg) = &self.fail_with {
                anyhow::bail!("{msg}");
            }
            self.uploads
                .lock()
                .unwrap()
                .push((path.display().to_string(), title.to_string()));
            Ok(())
        }
    }

    fn test_router(
        result: Result<String, String>,
        notifier: Option<Arc<dyn Notifier>>,
        export_dir: &Path,
    ) -> Router {
        router(Arc::new(AppState {
            source: Arc::new(FakeSource { result }),
            notifier,
            export_dir: export_dir.to_path_buf(),
        }))
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(Ok(SAMPLE.into()), None, dir.path());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn report_requires_all_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(Ok(SAMPLE.into()), None, dir.path());
        let resp = app
            .oneshot(post_json("/", r#"{"username":"u","ip":"1.2.3.4"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["message"], "Username, password and ip required");
    }

    #[tokio::test]
    async fn fetch_failure_maps_to_401() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(Err("Permission denied".into()), None, dir.path());
        let resp = app
            .oneshot(post_json("/", r#"{"username":"u","password":"p","ip":"1.2.3.4"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let v = body_json(resp).await;
        assert_eq!(v["ok"], false);
        assert_eq!(v["message"], "Login Failed: Permission denied");
    }

    #[tokio::test]
    async fn successful_run_returns_figures_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(Ok(SAMPLE.into()), None, dir.path());
        let resp = app
            .oneshot(post_json("/", r#"{"username":"u","password":"p","ip":"1.2.3.4"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["message"], SAMPLE);
        assert_eq!(v["figure_pie"]["data"][0]["type"], "pie");
        // amazonaws prefix stripped, table sorted by share descending
        let table = v["figure_table"].as_array().unwrap();
        assert_eq!(table[0]["filesystem"], "/home/home/clasci01");
        assert_eq!(table[1]["filesystem"], "/dev/xvda1");
        // CSV export lands in the temp dir; its path is echoed back
        assert!(v["table_path"].as_str().unwrap().ends_with(".csv"));
    }

    #[tokio::test]
    async fn malformed_remote_output_maps_to_502() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(Ok("bash: df: command not found\n".into()), None, dir.path());
        let resp = app
            .oneshot(post_json("/", r#"{"username":"u","password":"p","ip":"1.2.3.4"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn command_rejects_unknown_literal() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(Ok(SAMPLE.into()), None, dir.path());
        let resp = app
            .oneshot(post_json("/command", r#"{"command":"send_everything"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn command_without_notifier_is_503() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(Ok(SAMPLE.into()), None, dir.path());
        let body = r#"{"command":"send_reminder","payload":{"png_path":"a.png","table_path":"b.csv"}}"#;
        let resp = app.oneshot(post_json("/command", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn command_uploads_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(FakeNotifier::default());
        let app = test_router(Ok(SAMPLE.into()), Some(notifier.clone() as Arc<dyn Notifier>), dir.path());
        let body = r#"{"command":"send_reminder","payload":{"png_path":"a.png","table_path":"b.csv"}}"#;
        let resp = app.oneshot(post_json("/command", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let uploads = notifier.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0, "a.png");
        assert_eq!(uploads[1].1, "Disk usage table");
    }

    #[tokio::test]
    async fn upload_failure_fails_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(FakeNotifier {
            uploads: Mutex::new(Vec::new()),
            fail_with: Some("channel_not_found".into()),
        });
        let app = test_router(Ok(SAMPLE.into()), Some(notifier as Arc<dyn Notifier>), dir.path());
        let body = r#"{"command":"send_reminder","payload":{"png_path":"a.png","table_path":"b.csv"}}"#;
        let resp = app.oneshot(post_json("/command", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let v = body_json(resp).await;
        assert!(v["message"].as_str().unwrap().contains("channel_not_found"));
    }
}
