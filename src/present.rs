//! What the result view shows for an idea record, independent of the terminal.

use crate::models::{Analysis, Idea};
use crate::roadmap::RoadmapEditor;

pub const NOT_FOUND: &str = "Idea not found";
pub const ANALYZING: &str = "Analyzing your idea with AI...";

#[derive(Debug, Clone, PartialEq)]
pub enum IdeaView {
    NotFound,
    /// Record exists, analysis not written yet.
    Analyzing { title: String },
    Ready { title: String, analysis: Analysis },
}

impl IdeaView {
    pub fn from_record(idea: Option<&Idea>) -> Self {
        match idea {
            None => IdeaView::NotFound,
            Some(idea) => match idea.analysis() {
                None => IdeaView::Analyzing {
                    title: idea.fields.title.clone(),
                },
                Some(analysis) => IdeaView::Ready {
                    title: idea.fields.title.clone(),
                    analysis,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Text(String),
    Bullets(Vec<String>),
    Numbered(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: &'static str,
    pub body: SectionBody,
}

/// Non-empty sections in display order. The roadmap is not included; it is
/// rendered as a checklist.
pub fn sections(analysis: &Analysis) -> Vec<Section> {
    let mut out = Vec::new();

    if let Some(summary) = &analysis.summary {
        out.push(Section {
            title: "Summary",
            body: SectionBody::Text(summary.clone()),
        });
    }

    let lists: [(&'static str, &Vec<String>); 6] = [
        ("MVP Scope", &analysis.mvp_scope),
        ("Recommended Tech Stack", &analysis.tech_stack),
        ("Key Features/Modules", &analysis.core_modules),
        ("User Flow", &analysis.user_flow),
        ("GitHub Inspiration", &analysis.github_inspiration),
        ("Suggested APIs/Tools", &analysis.apis),
    ];
    for (title, items) in lists {
        if !items.is_empty() {
            let body = if title == "User Flow" {
                SectionBody::Numbered(items.clone())
            } else {
                SectionBody::Bullets(items.clone())
            };
            out.push(Section { title, body });
        }
    }

    if !analysis.database_schema.is_empty() {
        let lines = analysis
            .database_schema
            .iter()
            .map(|(collection, fields)| format!("{}: {}", collection, fields.join(", ")))
            .collect();
        out.push(Section {
            title: "Database Schema",
            body: SectionBody::Bullets(lines),
        });
    }

    if let Some(ai_usage) = &analysis.ai_usage {
        out.push(Section {
            title: "AI Usage",
            body: SectionBody::Text(ai_usage.clone()),
        });
    }

    out
}

/// Unwrapped rows the sections take on screen: a heading, the body, and a
/// blank line between sections.
pub fn row_count(sections: &[Section]) -> usize {
    let rows: usize = sections
        .iter()
        .map(|section| {
            1 + match &section.body {
                SectionBody::Text(_) => 1,
                SectionBody::Bullets(items) | SectionBody::Numbered(items) => items.len(),
            }
        })
        .sum();
    rows + sections.len().saturating_sub(1)
}

/// Plain-text rendering used by the `show` command.
pub fn render_text(view: &IdeaView, restore_status: bool, width: usize) -> String {
    let width = width.max(20);
    let mut out = String::new();

    let (title, analysis) = match view {
        IdeaView::NotFound => return format!("{}\n", NOT_FOUND),
        IdeaView::Analyzing { title } => {
            return format!("{}\n{}\n\n{}\n", title, "=".repeat(title.chars().count()), ANALYZING)
        }
        IdeaView::Ready { title, analysis } => (title, analysis),
    };

    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push('\n');

    for section in sections(analysis) {
        out.push('\n');
        out.push_str(section.title);
        out.push('\n');
        match &section.body {
            SectionBody::Text(text) => push_wrapped(&mut out, text, "", "", width),
            SectionBody::Bullets(items) => {
                for item in items {
                    push_wrapped(&mut out, item, "  - ", "    ", width);
                }
            }
            SectionBody::Numbered(items) => {
                for (i, item) in items.iter().enumerate() {
                    let marker = format!("  {}. ", i + 1);
                    let indent = " ".repeat(marker.len());
                    push_wrapped(&mut out, item, &marker, &indent, width);
                }
            }
        }
    }

    let editor = RoadmapEditor::from_analysis(analysis, restore_status);
    if !editor.is_empty() {
        out.push('\n');
        out.push_str(&format!(
            "Development Roadmap ({}/{})\n",
            editor.completed(),
            editor.len()
        ));
        for task in editor.tasks() {
            let marker = if task.done { "  [x] " } else { "  [ ] " };
            push_wrapped(&mut out, &task.text, marker, "      ", width);
        }
    }

    out
}

fn push_wrapped(out: &mut String, text: &str, first: &str, rest: &str, width: usize) {
    let options = textwrap::Options::new(width)
        .initial_indent(first)
        .subsequent_indent(rest);
    for line in textwrap::wrap(text, options) {
        out.push_str(&line);
        out.push('\n');
    }
}
