use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{IdeaFields, BLUEPRINT_KEYS};

use super::CompletionBackend;

const SYSTEM_PROMPT: &str = "You are a helpful assistant skilled in full-stack software planning, \
AI project design, and technical architecture. Generate structured, JSON-formatted development \
plans with practical implementation steps.";

/// Turns idea fields into a structured blueprint via one JSON-mode completion.
#[derive(Clone)]
pub struct LlmGateway {
    backend: Arc<dyn CompletionBackend>,
}

impl LlmGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Returns the parsed JSON object. Nothing is repaired or retried: a
    /// transport error, empty reply, or non-object JSON fails the call.
    pub async fn analyze(&self, fields: &IdeaFields) -> Result<Value> {
        let prompt = build_prompt(fields);
        let content = self.backend.complete_json(SYSTEM_PROMPT, &prompt).await?;
        parse_output(&content)
    }
}

pub fn build_prompt(fields: &IdeaFields) -> String {
    let or_none = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("None")
            .to_string()
    };

    let mut details = vec![
        format!("- Title: {}", fields.title.trim()),
        format!("- Description: {}", fields.description.trim()),
    ];
    if let Some(idea_type) = fields.idea_type.as_deref().filter(|s| !s.trim().is_empty()) {
        details.push(format!("- Type: {}", idea_type.trim()));
    }
    if let Some(users) = fields.target_users.as_deref().filter(|s| !s.trim().is_empty()) {
        details.push(format!("- Target Users: {}", users.trim()));
    }
    details.push(format!("- Tech Stack Preferences: {}", or_none(&fields.tech_stack_pref)));
    details.push(format!("- AI Tools Used: {}", or_none(&fields.ai_tools)));

    format!(
        r#"You are an expert full-stack developer and AI project architect. Your job is to take raw app ideas and convert them into structured development blueprints for real-world implementation.

Given this app idea:
{details}

Analyze and output the following as JSON:

1. summary: A clear 1-2 sentence explanation of the app's goal
2. mvpScope: A concise bullet list of the minimum viable product features
3. techStack: A detailed list of recommended technologies (frontend, backend, database, auth, AI, hosting)
4. userFlow: A list of main screens/pages and their purpose
5. databaseSchema: A suggested database schema (collections and key fields)
6. aiUsage: How AI can be used in this project
7. githubInspiration: List of 2-5 relevant public GitHub repos or projects
8. apis: Helpful third-party APIs, SDKs, or libraries to integrate
9. roadmap: A linear, step-by-step list of development tasks from setup to launch

Format the response strictly as JSON using this structure:
{{
  "summary": "App summary",
  "mvpScope": ["Feature 1", "Feature 2"],
  "techStack": ["Frontend", "Backend", "Database", "Auth", "AI", "Hosting"],
  "userFlow": ["Screen 1", "Screen 2"],
  "databaseSchema": {{ "collection1": ["field1", "field2"] }},
  "aiUsage": "How AI is used",
  "githubInspiration": ["repo1", "repo2"],
  "apis": ["API 1", "API 2"],
  "roadmap": ["Step 1", "Step 2"]
}}
Make sure to keep values relevant to the app description and user preferences."#,
        details = details.join("\n")
    )
}

pub fn parse_output(content: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(content.trim()).map_err(|e| AppError::Parse(e.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(AppError::Parse("expected a JSON object".to_string()));
    };

    let missing: Vec<&str> = BLUEPRINT_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        tracing::debug!("Model output is missing keys: {}", missing.join(", "));
    }
    Ok(value)
}
