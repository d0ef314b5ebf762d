//! Read-time view of the `gptOutput` document.
//!
//! The stored JSON is whatever the model returned, later patched by the
//! roadmap editor. Two shapes exist in the wild: the original one with
//! `modules`/`coreModules`/`steps`, and the blueprint shape with `mvpScope`,
//! `roadmap` and friends. Both are classified into [`AnalysisDocument`] and
//! then normalized into a single [`Analysis`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Keys the model is asked to produce.
pub const BLUEPRINT_KEYS: [&str; 9] = [
    "summary",
    "mvpScope",
    "techStack",
    "userFlow",
    "databaseSchema",
    "aiUsage",
    "githubInspiration",
    "apis",
    "roadmap",
];

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisDocument {
    /// v1: `summary`, `techStack`, `modules`/`coreModules`, `apis`, `steps`.
    Legacy(Map<String, Value>),
    /// v2: the full blueprint, optionally carrying `roadmapStatus`.
    Blueprint(Map<String, Value>),
}

impl AnalysisDocument {
    pub fn classify(value: &Value) -> Self {
        let map = value.as_object().cloned().unwrap_or_default();
        let is_blueprint = ["roadmap", "mvpScope", "userFlow", "databaseSchema"]
            .iter()
            .any(|k| map.contains_key(*k));
        let is_legacy = ["modules", "coreModules", "steps"]
            .iter()
            .any(|k| map.contains_key(*k));

        if is_legacy && !is_blueprint {
            AnalysisDocument::Legacy(map)
        } else {
            AnalysisDocument::Blueprint(map)
        }
    }

    pub fn normalize(&self) -> Analysis {
        match self {
            AnalysisDocument::Legacy(map) => {
                let roadmap = string_list(map.get("steps"));
                let roadmap_status = vec![false; roadmap.len()];
                Analysis {
                    version: 1,
                    summary: text(map.get("summary")),
                    tech_stack: string_list(map.get("techStack")),
                    core_modules: core_modules(map),
                    apis: string_list(map.get("apis")),
                    roadmap,
                    roadmap_status,
                    ..Analysis::default()
                }
            }
            AnalysisDocument::Blueprint(map) => {
                let roadmap = if map.contains_key("roadmap") {
                    string_list(map.get("roadmap"))
                } else {
                    string_list(map.get("steps"))
                };
                let roadmap_status = align_status(map.get("roadmapStatus"), roadmap.len());
                Analysis {
                    version: 2,
                    summary: text(map.get("summary")),
                    mvp_scope: string_list(map.get("mvpScope")),
                    tech_stack: string_list(map.get("techStack")),
                    user_flow: string_list(map.get("userFlow")),
                    database_schema: schema(map.get("databaseSchema")),
                    ai_usage: text(map.get("aiUsage")),
                    github_inspiration: string_list(map.get("githubInspiration")),
                    apis: string_list(map.get("apis")),
                    core_modules: core_modules(map),
                    roadmap,
                    roadmap_status,
                }
            }
        }
    }
}

/// Normalized analysis. Empty collections and `None` mean the section is
/// absent and should not be rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub version: u8,
    pub summary: Option<String>,
    pub mvp_scope: Vec<String>,
    pub tech_stack: Vec<String>,
    pub user_flow: Vec<String>,
    pub database_schema: BTreeMap<String, Vec<String>>,
    pub ai_usage: Option<String>,
    pub github_inspiration: Vec<String>,
    pub apis: Vec<String>,
    pub core_modules: Vec<String>,
    pub roadmap: Vec<String>,
    /// Always the same length as `roadmap`.
    pub roadmap_status: Vec<bool>,
}

impl Analysis {
    pub fn from_value(value: &Value) -> Self {
        AnalysisDocument::classify(value).normalize()
    }
}

fn core_modules(map: &Map<String, Value>) -> Vec<String> {
    let core = string_list(map.get("coreModules"));
    if core.is_empty() {
        string_list(map.get("modules"))
    } else {
        core
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join("\n"),
        other => scalar_text(other),
    };
    (!s.is_empty()).then_some(s)
}

/// Coerces a loosely typed value into a list of display lines.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let lines = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, scalar_text(v)))
            .collect(),
        Some(other) => vec![scalar_text(other)],
    };
    lines
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, scalar_text(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn schema(value: Option<&Value>) -> BTreeMap<String, Vec<String>> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(collection, fields)| (collection.clone(), string_list(Some(fields))))
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn align_status(value: Option<&Value>, len: usize) -> Vec<bool> {
    let mut status: Vec<bool> = match value {
        Some(Value::Array(items)) => items.iter().map(|v| v.as_bool().unwrap_or(false)).collect(),
        _ => Vec::new(),
    };
    status.resize(len, false);
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blueprint_is_normalized() {
        let value = json!({
            "summary": "A todo app for students",
            "mvpScope": ["Create tasks", "Mark done"],
            "techStack": ["Next.js", "Firebase"],
            "userFlow": ["Login", "Dashboard"],
            "databaseSchema": { "tasks": ["title", "done"], "users": ["email"] },
            "aiUsage": "Suggest due dates",
            "githubInspiration": ["todomvc"],
            "apis": ["OpenAI"],
            "roadmap": ["Set up repo", "Build UI"]
        });

        let analysis = Analysis::from_value(&value);

        assert_eq!(analysis.version, 2);
        assert_eq!(analysis.summary.as_deref(), Some("A todo app for students"));
        assert_eq!(analysis.mvp_scope, vec!["Create tasks", "Mark done"]);
        assert_eq!(analysis.database_schema["tasks"], vec!["title", "done"]);
        assert_eq!(analysis.roadmap, vec!["Set up repo", "Build UI"]);
        assert_eq!(analysis.roadmap_status, vec![false, false]);
        assert!(analysis.core_modules.is_empty());
    }

    #[test]
    fn legacy_steps_become_roadmap() {
        let value = json!({
            "summary": "Old shape",
            "techStack": ["React"],
            "modules": ["Auth"],
            "coreModules": ["Tasks", "Reminders"],
            "apis": [],
            "steps": ["Design", "Ship"]
        });

        let doc = AnalysisDocument::classify(&value);
        assert!(matches!(doc, AnalysisDocument::Legacy(_)));

        let analysis = doc.normalize();
        assert_eq!(analysis.version, 1);
        assert_eq!(analysis.core_modules, vec!["Tasks", "Reminders"]);
        assert_eq!(analysis.roadmap, vec!["Design", "Ship"]);
        assert!(analysis.apis.is_empty());
        assert!(analysis.mvp_scope.is_empty());
    }

    #[test]
    fn legacy_modules_used_when_core_modules_missing() {
        let analysis = Analysis::from_value(&json!({ "modules": ["Auth", "Billing"] }));
        assert_eq!(analysis.core_modules, vec!["Auth", "Billing"]);
    }

    #[test]
    fn roadmap_status_is_aligned_with_roadmap() {
        let longer = Analysis::from_value(&json!({
            "roadmap": ["a", "b"],
            "roadmapStatus": [true, false, true]
        }));
        assert_eq!(longer.roadmap_status, vec![true, false]);

        let shorter = Analysis::from_value(&json!({
            "roadmap": ["a", "b", "c"],
            "roadmapStatus": [true]
        }));
        assert_eq!(shorter.roadmap_status, vec![true, false, false]);
    }

    #[test]
    fn loose_values_are_coerced() {
        let analysis = Analysis::from_value(&json!({
            "summary": "s",
            "techStack": { "frontend": "React", "backend": ["Axum", "Postgres"] },
            "mvpScope": "Just one feature",
            "apis": [{ "name": "Stripe" }, 42, null, "  "],
            "aiUsage": null
        }));

        assert_eq!(
            analysis.tech_stack,
            vec!["backend: Axum, Postgres", "frontend: React"]
        );
        assert_eq!(analysis.mvp_scope, vec!["Just one feature"]);
        assert_eq!(analysis.apis, vec!["name: Stripe", "42"]);
        assert!(analysis.ai_usage.is_none());
    }

    #[test]
    fn non_object_output_normalizes_to_empty() {
        let analysis = Analysis::from_value(&json!("just text"));
        assert_eq!(analysis.version, 2);
        assert!(analysis.summary.is_none());
        assert!(analysis.roadmap.is_empty());
    }
}
