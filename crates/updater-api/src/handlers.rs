//! HTTP handlers.
//!
//! The update check never fails: a malformed query is treated as an
//! empty client descriptor and answered with an empty body.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use tracing::{debug, warn};

use updater_core::ClientDescriptor;

use crate::ApiState;

/// Content type of update check responses.
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Response wrapper for JSON endpoints.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    data: T,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Query parameters of an update check.
#[derive(Debug, Default, serde::Deserialize)]
pub struct CheckQuery {
    #[serde(default)]
    pub version: String,
}

/// GET /?version=…
pub async fn check_update(
    State(state): State<ApiState>,
    query: Result<Query<CheckQuery>, QueryRejection>,
) -> impl IntoResponse {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            warn!(error = %e, "unreadable update check query");
            CheckQuery::default()
        }
    };

    let descriptor = ClientDescriptor::from_version_param(&query.version);
    debug!(version = %query.version, "update check");
    let body = state.engine.decide(&descriptor, &state.catalog).render();

    ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body)
}

/// Health payload.
#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    pub channels: Vec<String>,
}

/// GET /healthz
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let channels = state
        .catalog
        .channels()
        .iter()
        .map(|c| c.as_str().to_string())
        .collect();
    ApiResponse::ok(HealthStatus { channels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use chrono::{TimeZone, Utc};
    use updater_core::ReleaseCatalog;
    use updater_rollout::{EnginePolicy, FixedClock, UpdateEngine};

    fn test_state() -> ApiState {
        let catalog = ReleaseCatalog::from_toml_str(
            r#"
[stable."8.0"]
latest = "8.0.10"
web = "https://doc.owncloud.org/server/8.0/admin_manual/maintenance/upgrade.html"
"#,
        )
        .unwrap();
        let engine = UpdateEngine::new(EnginePolicy::default()).with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2016, 6, 1, 0, 0, 0).unwrap(),
        )));
        ApiState {
            catalog: Arc::new(catalog),
            engine,
        }
    }

    async fn body_of(resp: axum::response::Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn check_offers_update() {
        let query = Query(CheckQuery {
            version: "8x0x9x0x1448709225x1448709281xstable".to_string(),
        });
        let resp = check_update(State(test_state()), Ok(query))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], XML_CONTENT_TYPE);
        let body = body_of(resp).await;
        assert!(body.contains("<version>8.0.10</version>"));
    }

    #[tokio::test]
    async fn check_current_client_gets_empty_body() {
        let query = Query(CheckQuery {
            version: "8x0x10x0x1448709225x1448709281xstable".to_string(),
        });
        let resp = check_update(State(test_state()), Ok(query))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, "");
    }

    #[tokio::test]
    async fn missing_version_gets_empty_body() {
        let resp = check_update(State(test_state()), Ok(Query(CheckQuery::default())))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, "");
    }

    #[tokio::test]
    async fn health_lists_channels() {
        let resp = health(State(test_state())).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_of(resp).await).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["channels"], serde_json::json!(["stable"]));
    }
}
