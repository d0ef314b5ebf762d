use reqwest::Client;
use url::Url;

use crate::auth::Session;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{AnalyzeRequest, AnalyzeResponse, ErrorBody, IdeaFields};
use crate::server::ANALYZE_PATH;

/// Caller side of `POST /api/analyze-idea`.
pub struct AnalyzeClient {
    client: Client,
    endpoint: Url,
}

impl AnalyzeClient {
    pub fn new(server_url: &str) -> Result<Self> {
        let base = Url::parse(server_url)
            .map_err(|e| AppError::Config(format!("invalid server_url {:?}: {}", server_url, e)))?;
        let endpoint = base
            .join(ANALYZE_PATH.trim_start_matches('/'))
            .map_err(|e| AppError::Config(format!("invalid server_url {:?}: {}", server_url, e)))?;
        let client = Client::builder().build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the analyzed idea id, or the server's error message as `AppError::Api`.
    pub async fn analyze(&self, token: &str, request: &AnalyzeRequest) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("Failed to analyze idea ({})", status));
            return Err(AppError::Api(message));
        }

        let body: AnalyzeResponse = response.json().await?;
        Ok(body.idea_id)
    }
}

/// Creates the pending record, then asks the server to analyze it.
///
/// On failure the record is left as written: pending, without analysis.
pub async fn submit_idea(
    repository: &Repository,
    client: &AnalyzeClient,
    session: &Session,
    fields: IdeaFields,
    require_classification: bool,
) -> Result<String> {
    if !fields.has_required(require_classification) {
        return Err(AppError::Validation(
            required_message(require_classification).to_string(),
        ));
    }

    let idea_id = repository.create_idea(&session.user_id, fields.clone()).await?;
    tracing::info!("Created idea {} for {}", idea_id, session.user_id);

    let request = AnalyzeRequest {
        idea_id: idea_id.clone(),
        fields,
    };
    match client.analyze(&session.token, &request).await {
        Ok(id) => Ok(id),
        Err(e) => {
            tracing::error!("Error submitting idea {}: {}", idea_id, e);
            Err(e)
        }
    }
}

pub fn required_message(require_classification: bool) -> &'static str {
    if require_classification {
        "Title, description, type and target users are required"
    } else {
        "Title and description are required"
    }
}
