use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Idea, IdeaFields, UserProfile, STATUS_PENDING};

use super::schema::SCHEMA;

const IDEA_COLUMNS: &str = "id, title, description, idea_type, target_users, \
     tech_stack_pref, ai_tools, created_at, status, gpt_output";

/// Per-user document store. Every idea query is scoped by `user_id`.
#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // User operations

    /// Creates the profile unless one already exists, then returns the stored profile.
    pub async fn ensure_user(&self, user_id: &str, name: &str, email: &str) -> Result<UserProfile> {
        let user_id = user_id.to_string();
        let name = name.to_string();
        let email = email.to_string();
        let profile = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO users (user_id, name, email) VALUES (?1, ?2, ?3)",
                    params![user_id, name, email],
                )?;
                let profile = conn.query_row(
                    "SELECT user_id, name, email, created_at FROM users WHERE user_id = ?1",
                    params![user_id],
                    user_from_row,
                )?;
                Ok(profile)
            })
            .await?;
        Ok(profile)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let user_id = user_id.to_string();
        let profile = self
            .conn
            .call(move |conn| {
                let profile = conn
                    .query_row(
                        "SELECT user_id, name, email, created_at FROM users WHERE user_id = ?1",
                        params![user_id],
                        user_from_row,
                    )
                    .optional()?;
                Ok(profile)
            })
            .await?;
        Ok(profile)
    }

    // Idea operations

    /// Inserts a pending idea without analysis and returns its generated id.
    pub async fn create_idea(&self, user_id: &str, fields: IdeaFields) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let user_id = user_id.to_string();
        let idea_id = id.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO ideas (id, user_id, title, description, idea_type, target_users,
                                          tech_stack_pref, ai_tools, status)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                    params![
                        idea_id,
                        user_id,
                        fields.title,
                        fields.description,
                        fields.idea_type,
                        fields.target_users,
                        fields.tech_stack_pref,
                        fields.ai_tools,
                        STATUS_PENDING,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_idea(&self, user_id: &str, id: &str) -> Result<Option<Idea>> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        let idea = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {IDEA_COLUMNS} FROM ideas WHERE user_id = ?1 AND id = ?2"
                ))?;
                let idea = stmt
                    .query_row(params![user_id, id], idea_from_row)
                    .optional()?;
                Ok(idea)
            })
            .await?;
        Ok(idea)
    }

    /// Newest first.
    pub async fn list_ideas(&self, user_id: &str) -> Result<Vec<Idea>> {
        let user_id = user_id.to_string();
        let ideas = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {IDEA_COLUMNS} FROM ideas WHERE user_id = ?1 \
                     ORDER BY created_at DESC, rowid DESC"
                ))?;
                let ideas = stmt
                    .query_map(params![user_id], idea_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(ideas)
            })
            .await?;
        Ok(ideas)
    }

    /// Writes `gptOutput` only. Returns `false` when no such idea exists for the user.
    pub async fn set_analysis(
        &self,
        user_id: &str,
        id: &str,
        output: &serde_json::Value,
    ) -> Result<bool> {
        let output = serde_json::to_string(output)?;
        let user_id = user_id.to_string();
        let id = id.to_string();
        let updated = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "UPDATE ideas SET gpt_output = ?3 WHERE user_id = ?1 AND id = ?2",
                    params![user_id, id, output],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(updated)
    }

    /// Replaces `gptOutput.roadmap` and `gptOutput.roadmapStatus`, leaving the
    /// rest of the analysis untouched.
    pub async fn save_roadmap(
        &self,
        user_id: &str,
        id: &str,
        roadmap: &[String],
        roadmap_status: &[bool],
    ) -> Result<bool> {
        let roadmap = serde_json::to_string(roadmap)?;
        let roadmap_status = serde_json::to_string(roadmap_status)?;
        let user_id = user_id.to_string();
        let id = id.to_string();
        let updated = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    r#"UPDATE ideas
                       SET gpt_output = json_set(COALESCE(gpt_output, '{}'),
                                                 '$.roadmap', json(?3),
                                                 '$.roadmapStatus', json(?4))
                       WHERE user_id = ?1 AND id = ?2"#,
                    params![user_id, id, roadmap, roadmap_status],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(updated)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn user_from_row(row: &Row) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        user_id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: timestamp(row, 3)?,
    })
}

fn idea_from_row(row: &Row) -> rusqlite::Result<Idea> {
    let id: String = row.get(0)?;
    let gpt_output = row
        .get::<_, Option<String>>(9)?
        .and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring unreadable gpt_output for idea {}: {}", id, e);
                None
            }
        });

    Ok(Idea {
        fields: IdeaFields {
            title: row.get(1)?,
            description: row.get(2)?,
            idea_type: row.get(3)?,
            target_users: row.get(4)?,
            tech_stack_pref: row.get(5)?,
            ai_tools: row.get(6)?,
        },
        created_at: timestamp(row, 7)?,
        status: row.get(8)?,
        gpt_output,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(title: &str) -> IdeaFields {
        IdeaFields {
            title: title.to_string(),
            description: "A simple todo app".to_string(),
            idea_type: Some("Web App".to_string()),
            target_users: Some("students".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn created_idea_is_pending_without_analysis() {
        let repo = Repository::in_memory().await.unwrap();
        let id = repo.create_idea("alice", fields("Task Manager")).await.unwrap();

        let idea = repo.get_idea("alice", &id).await.unwrap().unwrap();
        assert_eq!(idea.fields.title, "Task Manager");
        assert_eq!(idea.fields.target_users.as_deref(), Some("students"));
        assert_eq!(idea.status, "pending");
        assert!(idea.gpt_output.is_none());
        assert!(!idea.is_analyzed());
    }

    #[tokio::test]
    async fn ideas_are_scoped_to_their_owner() {
        let repo = Repository::in_memory().await.unwrap();
        let id = repo.create_idea("alice", fields("Task Manager")).await.unwrap();

        assert!(repo.get_idea("bob", &id).await.unwrap().is_none());
        assert!(repo.list_ideas("bob").await.unwrap().is_empty());
        assert!(!repo
            .set_analysis("bob", &id, &json!({ "summary": "hijack" }))
            .await
            .unwrap());

        let idea = repo.get_idea("alice", &id).await.unwrap().unwrap();
        assert!(idea.gpt_output.is_none());
    }

    #[tokio::test]
    async fn set_analysis_only_touches_gpt_output() {
        let repo = Repository::in_memory().await.unwrap();
        let id = repo.create_idea("alice", fields("Task Manager")).await.unwrap();
        let before = repo.get_idea("alice", &id).await.unwrap().unwrap();

        let output = json!({ "summary": "Todo app", "techStack": ["Rust"] });
        assert!(repo.set_analysis("alice", &id, &output).await.unwrap());

        let after = repo.get_idea("alice", &id).await.unwrap().unwrap();
        assert_eq!(after.gpt_output, Some(output));
        assert_eq!(after.status, "pending");
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.fields, before.fields);
    }

    #[tokio::test]
    async fn missing_idea_is_not_updated() {
        let repo = Repository::in_memory().await.unwrap();
        assert!(!repo
            .set_analysis("alice", "nope", &json!({}))
            .await
            .unwrap());
        assert!(!repo
            .save_roadmap("alice", "nope", &[], &[])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn save_roadmap_replaces_only_roadmap_fields() {
        let repo = Repository::in_memory().await.unwrap();
        let id = repo.create_idea("alice", fields("Task Manager")).await.unwrap();
        repo.set_analysis(
            "alice",
            &id,
            &json!({ "summary": "Todo app", "roadmap": ["a", "b", "c"] }),
        )
        .await
        .unwrap();

        let roadmap = vec!["Set up repo".to_string(), "Build UI".to_string()];
        repo.save_roadmap("alice", &id, &roadmap, &[true, false])
            .await
            .unwrap();

        let output = repo.get_idea("alice", &id).await.unwrap().unwrap().gpt_output.unwrap();
        assert_eq!(output["summary"], "Todo app");
        assert_eq!(output["roadmap"], json!(["Set up repo", "Build UI"]));
        assert_eq!(output["roadmapStatus"], json!([true, false]));
    }

    #[tokio::test]
    async fn save_roadmap_is_idempotent() {
        let repo = Repository::in_memory().await.unwrap();
        let id = repo.create_idea("alice", fields("Task Manager")).await.unwrap();
        repo.set_analysis("alice", &id, &json!({ "summary": "s" }))
            .await
            .unwrap();

        let roadmap = vec!["Set up repo".to_string(), "Build UI".to_string()];
        repo.save_roadmap("alice", &id, &roadmap, &[true, false]).await.unwrap();
        let first = repo.get_idea("alice", &id).await.unwrap().unwrap().gpt_output;
        repo.save_roadmap("alice", &id, &roadmap, &[true, false]).await.unwrap();
        let second = repo.get_idea("alice", &id).await.unwrap().unwrap().gpt_output;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn save_roadmap_before_analysis_creates_object() {
        let repo = Repository::in_memory().await.unwrap();
        let id = repo.create_idea("alice", fields("Task Manager")).await.unwrap();

        repo.save_roadmap("alice", &id, &["Only step".to_string()], &[false])
            .await
            .unwrap();

        let output = repo.get_idea("alice", &id).await.unwrap().unwrap().gpt_output.unwrap();
        assert_eq!(output, json!({ "roadmap": ["Only step"], "roadmapStatus": [false] }));
    }

    #[tokio::test]
    async fn list_contains_every_idea_of_the_user() {
        let repo = Repository::in_memory().await.unwrap();
        let first = repo.create_idea("alice", fields("First")).await.unwrap();
        let second = repo.create_idea("alice", fields("Second")).await.unwrap();
        repo.create_idea("bob", fields("Other")).await.unwrap();

        let ideas = repo.list_ideas("alice").await.unwrap();
        let ids: Vec<&str> = ideas.iter().map(|i| i.id.as_str()).collect();
        // same-second inserts fall back to insertion order, newest first
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    }

    #[tokio::test]
    async fn ensure_user_keeps_existing_profile() {
        let repo = Repository::in_memory().await.unwrap();
        let created = repo
            .ensure_user("alice@example.com", "Alice", "alice@example.com")
            .await
            .unwrap();
        let again = repo
            .ensure_user("alice@example.com", "Someone Else", "alice@example.com")
            .await
            .unwrap();

        assert_eq!(created, again);
        assert_eq!(again.name, "Alice");
        assert!(repo.get_user("bob@example.com").await.unwrap().is_none());
    }

    #[test]
    fn file_backed_store_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ideas.db");
        let path = path.to_str().unwrap();

        let id = tokio_test::block_on(async {
            let repo = Repository::new(path).await.unwrap();
            repo.create_idea("alice", fields("Task Manager")).await.unwrap()
        });

        let idea = tokio_test::block_on(async {
            let repo = Repository::new(path).await.unwrap();
            repo.get_idea("alice", &id).await.unwrap()
        });
        assert!(idea.is_some());
    }
}
