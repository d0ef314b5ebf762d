use std::sync::Arc;

use tokio::sync::mpsc;

use crate::auth::Session;
use crate::client::{required_message, submit_idea, AnalyzeClient};
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{Idea, IdeaFields, UserProfile};
use crate::present::{row_count, sections, IdeaView};
use crate::roadmap::RoadmapEditor;
use crate::tui::{AppAction, InputMode};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Rows moved by one page of analysis scrolling.
pub const PAGE_ROWS: usize = 10;

// Message for a finished submission
pub struct SubmitResult {
    pub result: std::result::Result<String, String>, // idea id or error message
}

/// Requests only the terminal shell can carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRequest {
    Quit,
    SignIn(String),
    SignOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    Dashboard,
    Wizard,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Basics,
    Details,
}

pub const WIZARD_LABELS: [&str; 6] = [
    "Title",
    "Description",
    "Type",
    "Target Users",
    "Tech Stack Preference",
    "AI Tools",
];

/// Two-step idea form. Step one holds fields 0..2, step two fields 2..6.
#[derive(Debug, Clone)]
pub struct WizardForm {
    pub step: WizardStep,
    pub values: [String; 6],
    pub focus: usize,
}

impl Default for WizardForm {
    fn default() -> Self {
        Self {
            step: WizardStep::Basics,
            values: Default::default(),
            focus: 0,
        }
    }
}

impl WizardForm {
    pub fn field_range(&self) -> std::ops::Range<usize> {
        match self.step {
            WizardStep::Basics => 0..2,
            WizardStep::Details => 2..6,
        }
    }

    fn next_field(&mut self) {
        let range = self.field_range();
        self.focus = if self.focus + 1 >= range.end { range.start } else { self.focus + 1 };
    }

    fn prev_field(&mut self) {
        let range = self.field_range();
        self.focus = if self.focus <= range.start { range.end - 1 } else { self.focus - 1 };
    }

    pub fn fields(&self) -> IdeaFields {
        let optional = |s: &String| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        IdeaFields {
            title: self.values[0].trim().to_string(),
            description: self.values[1].trim().to_string(),
            idea_type: optional(&self.values[2]),
            target_users: optional(&self.values[3]),
            tech_stack_pref: optional(&self.values[4]),
            ai_tools: optional(&self.values[5]),
        }
    }
}

/// Inline roadmap text entry: editing an existing task or appending one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub index: Option<usize>,
    pub text: String,
}

pub struct App {
    // Data
    pub session: Option<Session>,
    pub profile: Option<UserProfile>,
    pub ideas: Vec<Idea>,
    pub current_idea_id: Option<String>,
    pub view: Option<IdeaView>,
    pub editor: RoadmapEditor,

    // UI State
    pub screen: Screen,
    pub selected_index: usize,
    pub task_index: usize,
    pub analysis_scroll: usize,
    pub show_help: bool,
    pub message: Option<String>,
    pub token_input: String,
    pub wizard: WizardForm,
    pub task_input: Option<TaskInput>,
    spinner_frame: usize,

    // Async state
    pub is_submitting: bool,
    submit_rx: mpsc::Receiver<SubmitResult>,
    submit_tx: mpsc::Sender<SubmitResult>,

    // Services
    repository: Repository,
    client: Arc<AnalyzeClient>,
    restore_roadmap_status: bool,
    require_classification: bool,
}

impl App {
    pub fn new(repository: Repository, client: AnalyzeClient, config: &Config) -> Self {
        let (submit_tx, submit_rx) = mpsc::channel(1);

        Self {
            session: None,
            profile: None,
            ideas: Vec::new(),
            current_idea_id: None,
            view: None,
            editor: RoadmapEditor::default(),
            screen: Screen::SignIn,
            selected_index: 0,
            task_index: 0,
            analysis_scroll: 0,
            show_help: false,
            message: None,
            token_input: String::new(),
            wizard: WizardForm::default(),
            task_input: None,
            spinner_frame: 0,
            is_submitting: false,
            submit_rx,
            submit_tx,
            repository,
            client: Arc::new(client),
            restore_roadmap_status: config.restore_roadmap_status,
            require_classification: config.require_classification,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.show_help {
            InputMode::Help
        } else if self.task_input.is_some()
            || matches!(self.screen, Screen::SignIn | Screen::Wizard)
        {
            InputMode::Text
        } else {
            InputMode::Normal
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    pub fn tick_spinner(&mut self) {
        if self.is_submitting {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    pub fn selected_idea(&self) -> Option<&Idea> {
        self.ideas.get(self.selected_index)
    }

    /// Called by the shell whenever the session changes.
    pub async fn set_session(&mut self, session: Option<Session>) -> Result<()> {
        self.current_idea_id = None;
        self.view = None;
        self.editor = RoadmapEditor::default();
        self.wizard = WizardForm::default();
        self.task_input = None;
        self.selected_index = 0;
        self.analysis_scroll = 0;
        self.token_input.clear();

        match session {
            Some(session) => {
                self.profile = self.repository.get_user(&session.user_id).await?;
                self.ideas = self.repository.list_ideas(&session.user_id).await?;
                self.session = Some(session);
                self.screen = Screen::Dashboard;
                self.message = None;
            }
            None => {
                self.session = None;
                self.profile = None;
                self.ideas.clear();
                self.screen = Screen::SignIn;
            }
        }
        Ok(())
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<Option<ShellRequest>> {
        match action {
            AppAction::Quit => return Ok(Some(ShellRequest::Quit)),

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::InputChar(c) => self.input_char(c),
            AppAction::InputBackspace => self.input_backspace(),
            AppAction::NextField => {
                if self.screen == Screen::Wizard && self.task_input.is_none() {
                    self.wizard.next_field();
                }
            }
            AppAction::PrevField => {
                if self.screen == Screen::Wizard && self.task_input.is_none() {
                    self.wizard.prev_field();
                }
            }
            AppAction::InputConfirm => return self.input_confirm(),
            AppAction::InputCancel => return Ok(self.input_cancel()),

            AppAction::MoveUp => match self.screen {
                Screen::Dashboard => self.selected_index = self.selected_index.saturating_sub(1),
                Screen::Result => self.task_index = self.task_index.saturating_sub(1),
                _ => {}
            },

            AppAction::MoveDown => match self.screen {
                Screen::Dashboard => {
                    if self.selected_index + 1 < self.ideas.len() {
                        self.selected_index += 1;
                    }
                }
                Screen::Result => {
                    if self.task_index + 1 < self.editor.len() {
                        self.task_index += 1;
                    }
                }
                _ => {}
            },

            AppAction::ScrollDown(rows) => {
                if self.screen == Screen::Result {
                    let last = self.analysis_rows().saturating_sub(1);
                    self.analysis_scroll = (self.analysis_scroll + rows).min(last);
                }
            }

            AppAction::ScrollUp(rows) => {
                if self.screen == Screen::Result {
                    self.analysis_scroll = self.analysis_scroll.saturating_sub(rows);
                }
            }

            AppAction::Open => {
                if self.screen == Screen::Dashboard {
                    if let Some(id) = self.selected_idea().map(|i| i.id.clone()) {
                        self.open_idea(&id).await?;
                    }
                }
            }

            AppAction::NewIdea => {
                if self.screen == Screen::Dashboard {
                    self.screen = Screen::Wizard;
                    self.message = None;
                }
            }

            AppAction::Reload => match self.screen {
                Screen::Dashboard => self.reload_ideas().await?,
                Screen::Result => {
                    if let Some(id) = self.current_idea_id.clone() {
                        self.open_idea(&id).await?;
                    }
                }
                _ => {}
            },

            AppAction::Back => {
                if self.screen == Screen::Result {
                    self.screen = Screen::Dashboard;
                    self.reload_ideas().await?;
                }
            }

            AppAction::SignOut => {
                if self.screen == Screen::Dashboard {
                    return Ok(Some(ShellRequest::SignOut));
                }
            }

            AppAction::ToggleTask => {
                if self.screen == Screen::Result {
                    self.editor.toggle(self.task_index);
                }
            }

            AppAction::EditTask => {
                if self.screen == Screen::Result {
                    if let Some(task) = self.editor.tasks().get(self.task_index) {
                        self.task_input = Some(TaskInput {
                            index: Some(self.task_index),
                            text: task.text.clone(),
                        });
                    }
                }
            }

            AppAction::AddTask => {
                if self.is_ready() {
                    self.task_input = Some(TaskInput {
                        index: None,
                        text: String::new(),
                    });
                }
            }

            AppAction::RemoveTask => {
                if self.screen == Screen::Result && self.editor.remove(self.task_index).is_some() {
                    self.task_index = self.task_index.min(self.editor.len().saturating_sub(1));
                }
            }

            AppAction::SaveRoadmap => self.save_roadmap().await?,
        }

        Ok(None)
    }

    /// Unwrapped rows in the analysis pane; the renderer clamps further to the viewport.
    fn analysis_rows(&self) -> usize {
        match &self.view {
            Some(IdeaView::Ready { analysis, .. }) => row_count(&sections(analysis)),
            _ => 0,
        }
    }

    fn is_ready(&self) -> bool {
        self.screen == Screen::Result && matches!(self.view, Some(IdeaView::Ready { .. }))
    }

    fn input_char(&mut self, c: char) {
        if let Some(input) = &mut self.task_input {
            input.text.push(c);
            return;
        }
        match self.screen {
            Screen::SignIn => self.token_input.push(c),
            Screen::Wizard if !self.is_submitting => self.wizard.values[self.wizard.focus].push(c),
            _ => {}
        }
    }

    fn input_backspace(&mut self) {
        if let Some(input) = &mut self.task_input {
            input.text.pop();
            return;
        }
        match self.screen {
            Screen::SignIn => {
                self.token_input.pop();
            }
            Screen::Wizard if !self.is_submitting => {
                self.wizard.values[self.wizard.focus].pop();
            }
            _ => {}
        }
    }

    fn input_confirm(&mut self) -> Result<Option<ShellRequest>> {
        if let Some(input) = self.task_input.take() {
            match input.index {
                Some(idx) => {
                    self.editor.edit(idx, &input.text);
                }
                None => {
                    if self.editor.add(&input.text) {
                        self.task_index = self.editor.len() - 1;
                    }
                }
            }
            return Ok(None);
        }

        match self.screen {
            Screen::SignIn => {
                let token = self.token_input.trim().to_string();
                if token.is_empty() {
                    return Ok(None);
                }
                Ok(Some(ShellRequest::SignIn(token)))
            }
            Screen::Wizard => {
                if self.is_submitting {
                    return Ok(None);
                }
                match self.wizard.step {
                    WizardStep::Basics => {
                        if self.wizard.fields().has_required(false) {
                            self.wizard.step = WizardStep::Details;
                            self.wizard.focus = 2;
                            self.message = None;
                        } else {
                            self.message = Some("Title and description are required".to_string());
                        }
                    }
                    WizardStep::Details => {
                        if self.wizard.fields().has_required(self.require_classification) {
                            self.start_submission();
                        } else {
                            self.message =
                                Some(required_message(self.require_classification).to_string());
                        }
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn input_cancel(&mut self) -> Option<ShellRequest> {
        if self.task_input.take().is_some() {
            return None;
        }
        match self.screen {
            Screen::SignIn => Some(ShellRequest::Quit),
            Screen::Wizard if !self.is_submitting => {
                match self.wizard.step {
                    WizardStep::Details => {
                        self.wizard.step = WizardStep::Basics;
                        self.wizard.focus = 0;
                    }
                    WizardStep::Basics => self.screen = Screen::Dashboard,
                }
                None
            }
            _ => None,
        }
    }

    fn start_submission(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };

        let fields = self.wizard.fields();
        let require_classification = self.require_classification;
        let repository = self.repository.clone();
        let client = Arc::clone(&self.client);
        let tx = self.submit_tx.clone();

        self.is_submitting = true;
        self.message = None;

        // Spawn background task for the create + analyze round trip
        tokio::spawn(async move {
            let result = submit_idea(&repository, &client, &session, fields, require_classification)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(SubmitResult { result }).await;
        });
    }

    /// Poll for a finished submission (non-blocking)
    pub async fn poll_submit_result(&mut self) -> Result<()> {
        if let Ok(submitted) = self.submit_rx.try_recv() {
            self.is_submitting = false;
            match submitted.result {
                Ok(idea_id) => {
                    self.wizard = WizardForm::default();
                    self.reload_ideas().await?;
                    self.open_idea(&idea_id).await?;
                }
                Err(e) => {
                    tracing::error!("Failed to submit idea: {}", e);
                    self.message = Some(e);
                }
            }
        }
        Ok(())
    }

    /// Reads the record and resets the checklist from it. Unsaved edits are dropped.
    pub async fn open_idea(&mut self, idea_id: &str) -> Result<()> {
        let Some(session) = &self.session else {
            return Ok(());
        };

        let idea = self.repository.get_idea(&session.user_id, idea_id).await?;
        let view = IdeaView::from_record(idea.as_ref());
        self.editor = match &view {
            IdeaView::Ready { analysis, .. } => {
                RoadmapEditor::from_analysis(analysis, self.restore_roadmap_status)
            }
            _ => RoadmapEditor::default(),
        };
        self.view = Some(view);
        self.current_idea_id = Some(idea_id.to_string());
        self.task_index = 0;
        self.analysis_scroll = 0;
        self.task_input = None;
        self.screen = Screen::Result;
        Ok(())
    }

    async fn reload_ideas(&mut self) -> Result<()> {
        if let Some(session) = &self.session {
            self.ideas = self.repository.list_ideas(&session.user_id).await?;
            if self.selected_index >= self.ideas.len() {
                self.selected_index = self.ideas.len().saturating_sub(1);
            }
        }
        Ok(())
    }

    async fn save_roadmap(&mut self) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        let (Some(session), Some(idea_id)) = (&self.session, &self.current_idea_id) else {
            return Ok(());
        };

        self.editor
            .save(&self.repository, &session.user_id, idea_id)
            .await?;
        self.message = Some("Roadmap saved".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;
    use crate::ai::{LlmGateway, StubBackend};
    use crate::auth::IdentityProvider;
    use crate::server::{run, AppState};

    fn session() -> Session {
        Session {
            user_id: "alice@example.com".into(),
            email: "alice@example.com".into(),
            token: "t".into(),
        }
    }

    async fn signed_in(repository: Repository, client: AnalyzeClient) -> App {
        signed_in_with(repository, client, &Config::default()).await
    }

    async fn signed_in_with(repository: Repository, client: AnalyzeClient, config: &Config) -> App {
        repository
            .ensure_user("alice@example.com", "Alice", "alice@example.com")
            .await
            .unwrap();
        let mut app = App::new(repository, client, config);
        app.set_session(Some(session())).await.unwrap();
        app
    }

    async fn offline_app() -> (App, Repository) {
        let repository = Repository::in_memory().await.unwrap();
        let client = AnalyzeClient::new("http://127.0.0.1:9/").unwrap();
        (signed_in(repository.clone(), client).await, repository)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(AppAction::InputChar(c)).await.unwrap();
        }
    }

    async fn analyzed_idea(repository: &Repository) -> String {
        let id = repository
            .create_idea(
                "alice@example.com",
                IdeaFields {
                    title: "Task Manager".into(),
                    description: "A simple todo app".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        repository
            .set_analysis(
                "alice@example.com",
                &id,
                &json!({ "summary": "s", "roadmap": ["Set up repo", "Build UI"] }),
            )
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn session_changes_switch_screens() {
        let (mut app, _) = offline_app().await;
        assert_eq!(app.screen, Screen::Dashboard);
        assert_eq!(app.profile.as_ref().map(|p| p.name.as_str()), Some("Alice"));
        assert_eq!(app.input_mode(), InputMode::Normal);

        let request = app.handle_action(AppAction::SignOut).await.unwrap();
        assert_eq!(request, Some(ShellRequest::SignOut));

        app.set_session(None).await.unwrap();
        assert_eq!(app.screen, Screen::SignIn);
        assert!(app.session.is_none());
        assert_eq!(app.input_mode(), InputMode::Text);

        type_text(&mut app, " abc ").await;
        let request = app.handle_action(AppAction::InputConfirm).await.unwrap();
        assert_eq!(request, Some(ShellRequest::SignIn("abc".into())));
    }

    #[tokio::test]
    async fn wizard_requires_basics_before_details() {
        let (mut app, _) = offline_app().await;
        app.handle_action(AppAction::NewIdea).await.unwrap();
        assert_eq!(app.screen, Screen::Wizard);

        type_text(&mut app, "Task Manager").await;
        app.handle_action(AppAction::InputConfirm).await.unwrap();
        assert_eq!(app.wizard.step, WizardStep::Basics);
        assert!(app.message.is_some());

        app.handle_action(AppAction::NextField).await.unwrap();
        type_text(&mut app, "A simple todo app").await;
        app.handle_action(AppAction::InputConfirm).await.unwrap();
        assert_eq!(app.wizard.step, WizardStep::Details);
        assert_eq!(app.wizard.focus, 2);

        type_text(&mut app, "Web App").await;
        app.handle_action(AppAction::PrevField).await.unwrap();
        assert_eq!(app.wizard.focus, 5);

        let fields = app.wizard.fields();
        assert_eq!(fields.title, "Task Manager");
        assert_eq!(fields.idea_type.as_deref(), Some("Web App"));
        assert!(fields.target_users.is_none());

        app.handle_action(AppAction::InputCancel).await.unwrap();
        assert_eq!(app.wizard.step, WizardStep::Basics);
        app.handle_action(AppAction::InputCancel).await.unwrap();
        assert_eq!(app.screen, Screen::Dashboard);
    }

    #[tokio::test]
    async fn details_step_requires_classification_when_configured() {
        let repository = Repository::in_memory().await.unwrap();
        let client = AnalyzeClient::new("http://127.0.0.1:9/").unwrap();
        let config = Config {
            require_classification: true,
            ..Config::default()
        };
        let mut app = signed_in_with(repository.clone(), client, &config).await;

        app.handle_action(AppAction::NewIdea).await.unwrap();
        type_text(&mut app, "Task Manager").await;
        app.handle_action(AppAction::NextField).await.unwrap();
        type_text(&mut app, "A simple todo app").await;
        app.handle_action(AppAction::InputConfirm).await.unwrap();
        assert_eq!(app.wizard.step, WizardStep::Details);

        type_text(&mut app, "Web App").await;
        app.handle_action(AppAction::InputConfirm).await.unwrap();
        assert!(!app.is_submitting);
        assert_eq!(app.screen, Screen::Wizard);
        assert_eq!(app.message.as_deref(), Some(required_message(true)));
        assert!(repository.list_ideas("alice@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn analysis_scroll_stays_within_content() {
        let (mut app, repository) = offline_app().await;
        let id = analyzed_idea(&repository).await;
        app.open_idea(&id).await.unwrap();
        // "Summary" heading plus its text
        assert_eq!(app.analysis_rows(), 2);

        app.handle_action(AppAction::ScrollDown(PAGE_ROWS)).await.unwrap();
        assert_eq!(app.analysis_scroll, 1);
        app.handle_action(AppAction::ScrollUp(1)).await.unwrap();
        app.handle_action(AppAction::ScrollUp(1)).await.unwrap();
        assert_eq!(app.analysis_scroll, 0);

        app.handle_action(AppAction::ScrollDown(1)).await.unwrap();
        app.handle_action(AppAction::Reload).await.unwrap();
        assert_eq!(app.analysis_scroll, 0);
    }

    #[tokio::test]
    async fn checklist_edits_are_saved_on_request() {
        let (mut app, repository) = offline_app().await;
        let id = analyzed_idea(&repository).await;
        app.handle_action(AppAction::Reload).await.unwrap();
        assert_eq!(app.ideas.len(), 1);

        app.handle_action(AppAction::Open).await.unwrap();
        assert_eq!(app.screen, Screen::Result);
        assert_eq!(app.editor.len(), 2);

        app.handle_action(AppAction::ToggleTask).await.unwrap();
        app.handle_action(AppAction::AddTask).await.unwrap();
        assert_eq!(app.input_mode(), InputMode::Text);
        type_text(&mut app, "Deploy").await;
        app.handle_action(AppAction::InputConfirm).await.unwrap();
        assert_eq!(app.task_index, 2);

        app.handle_action(AppAction::MoveUp).await.unwrap();
        app.handle_action(AppAction::RemoveTask).await.unwrap();
        app.handle_action(AppAction::SaveRoadmap).await.unwrap();
        assert_eq!(app.message.as_deref(), Some("Roadmap saved"));

        let output = repository
            .get_idea("alice@example.com", &id)
            .await
            .unwrap()
            .unwrap()
            .gpt_output
            .unwrap();
        assert_eq!(output["roadmap"], json!(["Set up repo", "Deploy"]));
        assert_eq!(output["roadmapStatus"], json!([true, false]));
    }

    #[tokio::test]
    async fn reload_discards_unsaved_edits() {
        let (mut app, repository) = offline_app().await;
        let id = analyzed_idea(&repository).await;
        app.open_idea(&id).await.unwrap();

        app.handle_action(AppAction::RemoveTask).await.unwrap();
        assert_eq!(app.editor.len(), 1);
        app.handle_action(AppAction::Reload).await.unwrap();
        assert_eq!(app.editor.len(), 2);
        assert!(!app.editor.is_dirty());
    }

    #[tokio::test]
    async fn unknown_idea_opens_not_found_view() {
        let (mut app, _) = offline_app().await;
        app.open_idea("missing").await.unwrap();
        assert_eq!(app.view, Some(IdeaView::NotFound));

        app.handle_action(AppAction::AddTask).await.unwrap();
        assert!(app.task_input.is_none());
    }

    async fn submit_and_wait(app: &mut App) {
        app.handle_action(AppAction::NewIdea).await.unwrap();
        type_text(app, "Task Manager").await;
        app.handle_action(AppAction::NextField).await.unwrap();
        type_text(app, "A simple todo app").await;
        app.handle_action(AppAction::InputConfirm).await.unwrap();
        app.handle_action(AppAction::InputConfirm).await.unwrap();
        assert!(app.is_submitting);

        for _ in 0..200 {
            app.poll_submit_result().await.unwrap();
            if !app.is_submitting {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("submission never finished");
    }

    async fn serving(reply: &str) -> (App, Repository) {
        let repository = Repository::in_memory().await.unwrap();
        let identity = IdentityProvider::new("test_secret", 1);
        let state = Arc::new(AppState {
            repository: repository.clone(),
            gateway: LlmGateway::new(Arc::new(StubBackend::replying(reply))),
            identity: identity.clone(),
            require_classification: false,
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        tokio::spawn(run(listener, state));

        let token = identity.issue("alice@example.com", "alice@example.com").unwrap();
        let client = AnalyzeClient::new(&url).unwrap();
        let mut app = signed_in(repository.clone(), client).await;
        app.session = Some(Session { token, ..session() });
        (app, repository)
    }

    #[tokio::test]
    async fn successful_submission_shows_result() {
        let (mut app, _) = serving(r#"{"summary":"A todo app","roadmap":["Set up repo"]}"#).await;
        submit_and_wait(&mut app).await;

        assert_eq!(app.screen, Screen::Result);
        assert!(matches!(app.view, Some(IdeaView::Ready { .. })));
        assert_eq!(app.editor.len(), 1);
        assert!(app.wizard.values.iter().all(|v| v.is_empty()));
        assert_eq!(app.ideas.len(), 1);
    }

    #[tokio::test]
    async fn failed_submission_keeps_form_and_reports() {
        let (mut app, repository) = serving("not json").await;
        submit_and_wait(&mut app).await;

        assert_eq!(app.screen, Screen::Wizard);
        assert!(app.message.is_some());
        assert_eq!(app.wizard.values[0], "Task Manager");

        let ideas = repository.list_ideas("alice@example.com").await.unwrap();
        assert_eq!(ideas.len(), 1);
        assert!(ideas[0].gpt_output.is_none());
    }
}
