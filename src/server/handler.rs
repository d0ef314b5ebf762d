use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{json, Value};

use crate::ai::LlmGateway;
use crate::auth::{bearer_token, IdentityProvider};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::AnalyzeRequest;

pub const ANALYZE_PATH: &str = "/api/analyze-idea";
pub const HEALTH_PATH: &str = "/health";

/// Largest analysis request body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Everything a request handler needs, built once by the server bootstrap.
pub struct AppState {
    pub repository: Repository,
    pub gateway: LlmGateway,
    pub identity: IdentityProvider,
    pub require_classification: bool,
}

pub async fn handle<B>(req: Request<B>, state: Arc<AppState>) -> std::result::Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::POST, ANALYZE_PATH) => match analyze_idea(req, &state).await {
            Ok(idea_id) => json_response(StatusCode::OK, json!({ "success": true, "ideaId": idea_id })),
            Err(e) => error_response(&e),
        },
        (_, ANALYZE_PATH) => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "Method not allowed" }),
        ),
        (&Method::GET, HEALTH_PATH) => json_response(StatusCode::OK, json!({ "status": "ok" })),
        _ => json_response(StatusCode::NOT_FOUND, json!({ "error": "Not found" })),
    };

    tracing::info!("{} {} -> {}", method, path, response.status().as_u16());
    Ok(response)
}

/// Verifies the caller, validates the body, runs the analysis and stores it.
/// Returns the idea id on success.
async fn analyze_idea<B>(req: Request<B>, state: &AppState) -> Result<String>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = bearer_token(header).ok_or(AppError::Unauthorized)?;
    let claims = state.identity.verify(token)?;
    let user_id = claims.sub;

    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                AppError::Validation("Request body too large".to_string())
            } else {
                AppError::Validation(format!("Invalid request body: {}", e))
            }
        })?
        .to_bytes();
    let request: AnalyzeRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("Invalid request body".to_string()))?;

    if request.idea_id.trim().is_empty()
        || !request.fields.has_required(state.require_classification)
    {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }

    // nothing to update, so don't spend a completion on it
    if state
        .repository
        .get_idea(&user_id, &request.idea_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Idea not found".to_string()));
    }

    tracing::info!(
        "Analyzing idea {} for {} with {}",
        request.idea_id,
        user_id,
        state.gateway.model()
    );
    let output = state.gateway.analyze(&request.fields).await?;

    if !state
        .repository
        .set_analysis(&user_id, &request.idea_id, &output)
        .await?
    {
        return Err(AppError::NotFound("Idea not found".to_string()));
    }

    Ok(request.idea_id)
}

fn error_response(err: &AppError) -> Response<Full<Bytes>> {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!("Error analyzing idea: {}", err);
    } else {
        tracing::warn!("Rejected analysis request: {}", err);
    }
    json_response(status, json!({ "error": err.to_string() }))
}

fn json_response(status: StatusCode, body: Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
