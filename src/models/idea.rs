use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::Analysis;

/// Fields a user supplies when submitting an idea.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub idea_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_users: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack_pref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_tools: Option<String>,
}

impl IdeaFields {
    /// Presence checks only; blank strings count as missing.
    pub fn has_required(&self, require_classification: bool) -> bool {
        let present = |s: &str| !s.trim().is_empty();
        let present_opt = |s: &Option<String>| s.as_deref().is_some_and(present);

        present(&self.title)
            && present(&self.description)
            && (!require_classification
                || (present_opt(&self.idea_type) && present_opt(&self.target_users)))
    }
}

/// Body of `POST /api/analyze-idea`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub idea_id: String,
    #[serde(flatten)]
    pub fields: IdeaFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub idea_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Lifecycle marker written when a record is created.
pub const STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone)]
pub struct Idea {
    pub id: String,
    pub fields: IdeaFields,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub gpt_output: Option<serde_json::Value>,
}

impl Idea {
    pub fn is_analyzed(&self) -> bool {
        self.gpt_output.is_some()
    }

    pub fn analysis(&self) -> Option<Analysis> {
        self.gpt_output.as_ref().map(Analysis::from_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
