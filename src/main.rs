use std::io;
use std::time::Duration;

use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::watch;

mod ai;
mod app;
mod auth;
mod client;
mod config;
mod db;
mod error;
mod models;
mod present;
mod roadmap;
mod server;
mod tui;

use app::{App, ShellRequest};
use auth::{user_id_for_email, IdentityProvider, Session, SessionHandle};
use client::AnalyzeClient;
use config::Config;
use db::Repository;
use error::{AppError, Result};
use present::{render_text, IdeaView};
use tui::{draw, handle_key_event};

const USAGE: &str = "Usage:
  vibebuild                      start the terminal client
  vibebuild serve                start the analysis server
  vibebuild signup <email> [name] create a profile and print a token
  vibebuild signin <email>       print a fresh token for a profile
  vibebuild show <idea-id>       print an idea for the configured token";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Tui,
    Serve,
    Signup { email: String, name: Option<String> },
    Signin { email: String },
    Show { idea_id: String },
}

fn parse_args(args: &[String]) -> Result<Command> {
    let usage = || AppError::Validation(USAGE.to_string());
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] => Ok(Command::Tui),
        ["serve"] => Ok(Command::Serve),
        ["signup", email] => Ok(Command::Signup {
            email: email.to_string(),
            name: None,
        }),
        ["signup", email, name @ ..] if !name.is_empty() => Ok(Command::Signup {
            email: email.to_string(),
            name: Some(name.join(" ")),
        }),
        ["signin", email] => Ok(Command::Signin {
            email: email.to_string(),
        }),
        ["show", idea_id] => Ok(Command::Show {
            idea_id: idea_id.to_string(),
        }),
        _ => Err(usage()),
    }
}

/// Profile name when none is given: the email's local part, then "User".
fn default_name(email: &str) -> String {
    email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("User")
        .to_string()
}

fn validate_email(email: &str) -> Result<&str> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::Validation(format!("Invalid email address: {:?}", email))),
    }
}

fn init_logging(default_level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    // The terminal client keeps stderr quiet so the alternate screen stays clean
    init_logging(match command {
        Command::Tui => tracing::Level::WARN,
        _ => tracing::Level::INFO,
    });

    let config = Config::load()?;

    match command {
        Command::Serve => server::serve(&config).await,
        Command::Signup { email, name } => {
            let token = signup(&config, &email, name.as_deref()).await?;
            println!("{}", token);
            Ok(())
        }
        Command::Signin { email } => {
            let token = signin(&config, &email).await?;
            println!("{}", token);
            Ok(())
        }
        Command::Show { idea_id } => {
            let width = crossterm::terminal::size()
                .map(|(w, _)| w as usize)
                .unwrap_or(80);
            print!("{}", show(&config, &idea_id, width).await?);
            Ok(())
        }
        Command::Tui => run_tui(&config).await,
    }
}

async fn signup(config: &Config, email: &str, name: Option<&str>) -> Result<String> {
    let identity = IdentityProvider::new(config.require_auth_secret()?, config.token_ttl_hours);
    let email = validate_email(email)?;
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_name(email));

    let repository = Repository::new(&config.db_path).await?;
    let profile = repository
        .ensure_user(&user_id_for_email(email), &name, email)
        .await?;
    tracing::info!("Signed up {} as {}", profile.email, profile.user_id);

    identity.issue(&profile.user_id, &profile.email)
}

async fn signin(config: &Config, email: &str) -> Result<String> {
    let identity = IdentityProvider::new(config.require_auth_secret()?, config.token_ttl_hours);
    let email = validate_email(email)?;

    let repository = Repository::new(&config.db_path).await?;
    let profile = repository
        .get_user(&user_id_for_email(email))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for {}; run signup first", email)))?;

    identity.issue(&profile.user_id, &profile.email)
}

async fn show(config: &Config, idea_id: &str, width: usize) -> Result<String> {
    let session = configured_session(config)?;
    let repository = Repository::new(&config.db_path).await?;
    let idea = repository.get_idea(&session.user_id, idea_id).await?;

    Ok(render_text(
        &IdeaView::from_record(idea.as_ref()),
        config.restore_roadmap_status,
        width,
    ))
}

fn configured_session(config: &Config) -> Result<Session> {
    let identity = IdentityProvider::new(config.require_auth_secret()?, config.token_ttl_hours);
    let token = config
        .auth_token
        .as_deref()
        .ok_or_else(|| AppError::Config("auth_token is not set (see `vibebuild signin`)".into()))?;
    SessionHandle::new().sign_in(&identity, token)
}

async fn run_tui(config: &Config) -> Result<()> {
    let identity = IdentityProvider::new(config.require_auth_secret()?, config.token_ttl_hours);
    let repository = Repository::new(&config.db_path).await?;
    let client = AnalyzeClient::new(&config.server_url)?;

    let sessions = SessionHandle::new();
    let mut session_rx = sessions.subscribe();
    if let Some(token) = &config.auth_token {
        if let Err(e) = sessions.sign_in(&identity, token) {
            tracing::warn!("Configured auth_token rejected: {}", e);
        }
    }

    tracing::info!("Submitting ideas to {}", client.endpoint());

    let mut app = App::new(repository, client, config);
    session_rx.mark_unchanged();
    app.set_session(sessions.current()).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &sessions, session_rx, &identity).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    sessions: &SessionHandle,
    mut session_rx: watch::Receiver<Option<Session>>,
    identity: &IdentityProvider,
) -> Result<()> {
    loop {
        if session_rx.has_changed().unwrap_or(false) {
            let current = session_rx.borrow_and_update().clone();
            app.set_session(current).await?;
        }

        terminal.draw(|frame| draw(frame, app))?;

        // Advance spinner animation
        app.tick_spinner();

        // Poll for a finished submission
        app.poll_submit_result().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.input_mode()) {
                        match app.handle_action(action).await {
                            Ok(None) => {}
                            Ok(Some(ShellRequest::Quit)) => return Ok(()),
                            Ok(Some(ShellRequest::SignIn(token))) => {
                                if let Err(e) = sessions.sign_in(identity, &token) {
                                    tracing::warn!("Sign-in failed: {}", e);
                                    app.message = Some("Invalid or expired token".to_string());
                                }
                            }
                            Ok(Some(ShellRequest::SignOut)) => sessions.sign_out(),
                            Err(e) => {
                                tracing::error!("Action failed: {}", e);
                                app.message = Some(e.to_string());
                            }
                        }
                    }
                }
            }
        }
    }
}
