use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::Analysis;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapTask {
    pub text: String,
    pub done: bool,
}

/// In-memory checklist. Nothing reaches the store until [`RoadmapEditor::save`].
#[derive(Debug, Clone, Default)]
pub struct RoadmapEditor {
    tasks: Vec<RoadmapTask>,
    dirty: bool,
}

impl RoadmapEditor {
    /// Every task starts incomplete, whatever was saved before.
    pub fn seed(roadmap: &[String]) -> Self {
        Self {
            tasks: roadmap
                .iter()
                .map(|text| RoadmapTask {
                    text: text.clone(),
                    done: false,
                })
                .collect(),
            dirty: false,
        }
    }

    /// Seeds from stored text and flags; missing flags count as incomplete.
    pub fn restore(roadmap: &[String], status: &[bool]) -> Self {
        Self {
            tasks: roadmap
                .iter()
                .enumerate()
                .map(|(i, text)| RoadmapTask {
                    text: text.clone(),
                    done: status.get(i).copied().unwrap_or(false),
                })
                .collect(),
            dirty: false,
        }
    }

    pub fn from_analysis(analysis: &Analysis, restore_status: bool) -> Self {
        if restore_status {
            Self::restore(&analysis.roadmap, &analysis.roadmap_status)
        } else {
            Self::seed(&analysis.roadmap)
        }
    }

    pub fn tasks(&self) -> &[RoadmapTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn completed(&self) -> usize {
        self.tasks.iter().filter(|t| t.done).count()
    }

    pub fn toggle(&mut self, idx: usize) -> bool {
        match self.tasks.get_mut(idx) {
            Some(task) => {
                task.done = !task.done;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn edit(&mut self, idx: usize, text: &str) -> bool {
        match self.tasks.get_mut(idx) {
            Some(task) => {
                task.text = text.to_string();
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Appends a trimmed, incomplete task. Blank input is ignored.
    pub fn add(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.tasks.push(RoadmapTask {
            text: text.to_string(),
            done: false,
        });
        self.dirty = true;
        true
    }

    pub fn remove(&mut self, idx: usize) -> Option<RoadmapTask> {
        if idx >= self.tasks.len() {
            return None;
        }
        self.dirty = true;
        Some(self.tasks.remove(idx))
    }

    /// Index-aligned `(roadmap, roadmapStatus)` arrays.
    pub fn to_arrays(&self) -> (Vec<String>, Vec<bool>) {
        self.tasks
            .iter()
            .map(|t| (t.text.clone(), t.done))
            .unzip()
    }

    /// Replaces the stored roadmap wholesale. Last writer wins.
    pub async fn save(&mut self, repository: &Repository, user_id: &str, idea_id: &str) -> Result<()> {
        let (roadmap, status) = self.to_arrays();
        if !repository
            .save_roadmap(user_id, idea_id, &roadmap, &status)
            .await?
        {
            return Err(AppError::NotFound("Idea not found".to_string()));
        }
        self.dirty = false;
        tracing::debug!("Saved {} roadmap tasks for idea {}", roadmap.len(), idea_id);
        Ok(())
    }
}
