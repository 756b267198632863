//! Local developer service: inspect and switch the active environment and
//! proxy GET requests to it.

use crate::{
    client::{ApiClient, ApiError, RequestOptions},
    models::{EnvironmentInfoResponse, EnvironmentOption, HealthResponse, SwitchRequest},
    resolver::EnvError,
};
use axum::{
    error_handling::HandleErrorLayer,
    extract::{OriginalUri, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::time::Duration;
use tower::{timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(health, get_environment, put_environment, reset_environment, list_environments, proxy),
    components(schemas(
        HealthResponse,
        EnvironmentInfoResponse,
        EnvironmentOption,
        SwitchRequest,
        crate::environment::EnvironmentName
    )),
    tags((name = "environment", description = "Backend environment switcher"))
)]
struct ApiDoc;

type HandlerError = (StatusCode, String);

pub fn build_router(client: ApiClient) -> Router {
    // Layer order matters: the timeout layer can fail, HandleErrorLayer sits
    // outside it to turn the failure into a response, CORS is outermost.
    let middleware = ServiceBuilder::new()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(HandleErrorLayer::new(|e: BoxError| async move {
            if e.is::<tower::timeout::error::Elapsed>() {
                (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {e}"))
            }
        }))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .into_inner();

    Router::new()
        .route("/health", get(health))
        .route(
            "/environment",
            get(get_environment).put(put_environment).delete(reset_environment),
        )
        .route("/environments", get(list_environments))
        .route("/proxy/*endpoint", get(proxy))
        .with_state(client)
        .layer(middleware)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Healthcheck
#[utoipa::path(get, path = "/health", tag = "meta",
    responses((status = 200, description = "Service is up", body = HealthResponse)))]
pub async fn health(State(client): State<ApiClient>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        environment: client.resolver.active(),
        api_base_url: client.resolver.api_base_url(),
    })
}

/// Active environment details
#[utoipa::path(get, path = "/environment", tag = "environment",
    responses((status = 200, description = "Active environment", body = EnvironmentInfoResponse)))]
pub async fn get_environment(State(client): State<ApiClient>) -> Json<EnvironmentInfoResponse> {
    Json(info(&client))
}

/// Switch the active environment
#[utoipa::path(
    put,
    path = "/environment",
    tag = "environment",
    request_body = SwitchRequest,
    responses(
        (status = 200, description = "Switched", body = EnvironmentInfoResponse),
        (status = 400, description = "Unknown environment"),
        (status = 403, description = "Switching disabled"),
        (status = 500, description = "Could not persist"),
    )
)]
pub async fn put_environment(
    State(client): State<ApiClient>,
    Json(req): Json<SwitchRequest>,
) -> Result<Json<EnvironmentInfoResponse>, HandlerError> {
    if !client.resolver.can_switch_environment() {
        return Err((StatusCode::FORBIDDEN, "environment switching is disabled".into()));
    }
    client.resolver.set_environment(&req.environment).map_err(map_env_err)?;
    Ok(Json(info(&client)))
}

/// Reset to the default (production) environment
#[utoipa::path(delete, path = "/environment", tag = "environment",
    responses(
        (status = 200, description = "Reset", body = EnvironmentInfoResponse),
        (status = 500, description = "Could not persist"),
    ))]
pub async fn reset_environment(
    State(client): State<ApiClient>,
) -> Result<Json<EnvironmentInfoResponse>, HandlerError> {
    client.resolver.reset_to_default().map_err(map_env_err)?;
    Ok(Json(info(&client)))
}

/// Environments available for switching
#[utoipa::path(get, path = "/environments", tag = "environment",
    responses((status = 200, description = "Known environments", body = [EnvironmentOption])))]
pub async fn list_environments(State(client): State<ApiClient>) -> Json<Vec<EnvironmentOption>> {
    let active = client.resolver.active();
    let options = client
        .resolver
        .available_environments()
        .into_iter()
        .map(|cfg| EnvironmentOption::new(cfg, active))
        .collect();
    Json(options)
}

/// Forward a GET to the active backend
#[utoipa::path(
    get,
    path = "/proxy/{endpoint}",
    tag = "environment",
    params(("endpoint" = String, Path, description = "Backend path, e.g. app/activity/list")),
    responses(
        (status = 200, description = "Upstream JSON"),
        (status = 4XX, description = "Client error"),
        (status = 5XX, description = "Upstream error or timeout"),
    )
)]
pub async fn proxy(
    State(client): State<ApiClient>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Value>, HandlerError> {
    let endpoint = proxied_endpoint(&uri);
    let value = client
        .api_call(&endpoint, RequestOptions::get())
        .await
        .map_err(|e| {
            tracing::warn!(%endpoint, error = %e, "proxied call failed");
            map_api_err(e)
        })?;
    Ok(Json(value))
}

/// Backend path and query exactly as the caller encoded them, minus `/proxy`.
fn proxied_endpoint(uri: &axum::http::Uri) -> String {
    let path = uri.path().strip_prefix("/proxy").unwrap_or(uri.path());
    match uri.query() {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    }
}

fn info(client: &ApiClient) -> EnvironmentInfoResponse {
    EnvironmentInfoResponse::new(
        client.resolver.environment_info(),
        client.resolver.can_switch_environment(),
    )
}

fn map_env_err(err: EnvError) -> HandlerError {
    match err {
        EnvError::InvalidEnvironment(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        EnvError::Persist(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("persist: {e}")),
    }
}

fn map_api_err(err: ApiError) -> HandlerError {
    match err {
        ApiError::Timeout { after_ms } => {
            (StatusCode::GATEWAY_TIMEOUT, format!("upstream timed out after {after_ms} ms"))
        }
        ApiError::Network(e) => (StatusCode::BAD_GATEWAY, format!("request error: {e}")),
        ApiError::Http { status, body } => (status, body),
        ApiError::Parse(_) => (StatusCode::BAD_GATEWAY, "invalid JSON from upstream".into()),
        ApiError::InvalidHeader(h) => (StatusCode::BAD_REQUEST, format!("invalid header {h}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxied_endpoint_keeps_percent_encoding() {
        let uri: axum::http::Uri = "/proxy/app%2F..%2Fx/a%3Fb?pageNum=1".parse().unwrap();
        assert_eq!(proxied_endpoint(&uri), "/app%2F..%2Fx/a%3Fb?pageNum=1");

        let uri: axum::http::Uri = "/proxy/app/list?".parse().unwrap();
        assert_eq!(proxied_endpoint(&uri), "/app/list");
    }
}
