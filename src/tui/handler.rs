use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::PAGE_ROWS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    Open,
    NewIdea,
    Reload,
    Back,
    SignOut,
    ShowHelp,
    HideHelp,
    // Analysis pane, by rows
    ScrollDown(usize),
    ScrollUp(usize),
    // Roadmap checklist
    ToggleTask,
    EditTask,
    AddTask,
    RemoveTask,
    SaveRoadmap,
    // Text entry (sign-in token, wizard fields, task text)
    InputChar(char),
    InputBackspace,
    InputConfirm,
    InputCancel,
    NextField,
    PrevField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Text,
    Help,
}

pub fn handle_key_event(key: KeyEvent, mode: InputMode) -> Option<AppAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(AppAction::Quit);
    }

    match mode {
        // any key closes help
        InputMode::Help => Some(AppAction::HideHelp),

        InputMode::Text => match key.code {
            KeyCode::Enter => Some(AppAction::InputConfirm),
            KeyCode::Esc => Some(AppAction::InputCancel),
            KeyCode::Backspace => Some(AppAction::InputBackspace),
            KeyCode::Tab | KeyCode::Down => Some(AppAction::NextField),
            KeyCode::BackTab | KeyCode::Up => Some(AppAction::PrevField),
            KeyCode::Char(c) => Some(AppAction::InputChar(c)),
            _ => None,
        },

        InputMode::Normal => match key.code {
            KeyCode::Char('q') => Some(AppAction::Quit),

            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),

            KeyCode::Char('J') => Some(AppAction::ScrollDown(1)),
            KeyCode::Char('K') => Some(AppAction::ScrollUp(1)),
            KeyCode::PageDown => Some(AppAction::ScrollDown(PAGE_ROWS)),
            KeyCode::PageUp => Some(AppAction::ScrollUp(PAGE_ROWS)),

            KeyCode::Enter => Some(AppAction::Open),
            KeyCode::Esc | KeyCode::Char('b') => Some(AppAction::Back),

            KeyCode::Char('n') => Some(AppAction::NewIdea),
            KeyCode::Char('r') => Some(AppAction::Reload),
            KeyCode::Char('o') => Some(AppAction::SignOut),

            KeyCode::Char(' ') | KeyCode::Char('x') => Some(AppAction::ToggleTask),
            KeyCode::Char('e') => Some(AppAction::EditTask),
            KeyCode::Char('a') => Some(AppAction::AddTask),
            KeyCode::Char('d') => Some(AppAction::RemoveTask),
            KeyCode::Char('s') => Some(AppAction::SaveRoadmap),

            KeyCode::Char('?') => Some(AppAction::ShowHelp),

            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn letters_are_text_while_typing() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q')), InputMode::Text),
            Some(AppAction::InputChar('q'))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q')), InputMode::Normal),
            Some(AppAction::Quit)
        );
    }

    #[test]
    fn help_swallows_any_key() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('s')), InputMode::Help),
            Some(AppAction::HideHelp)
        );
    }

    #[test]
    fn ctrl_c_always_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in [InputMode::Normal, InputMode::Text, InputMode::Help] {
            assert_eq!(handle_key_event(ctrl_c, mode), Some(AppAction::Quit));
        }
    }

    #[test]
    fn checklist_keys() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char(' ')), InputMode::Normal),
            Some(AppAction::ToggleTask)
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('s')), InputMode::Normal),
            Some(AppAction::SaveRoadmap)
        );
        assert_eq!(handle_key_event(key(KeyCode::F(1)), InputMode::Normal), None);
    }

    #[test]
    fn analysis_scroll_keys() {
        let shifted = KeyEvent::new(KeyCode::Char('J'), KeyModifiers::SHIFT);
        assert_eq!(
            handle_key_event(shifted, InputMode::Normal),
            Some(AppAction::ScrollDown(1))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::PageUp), InputMode::Normal),
            Some(AppAction::ScrollUp(PAGE_ROWS))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('K')), InputMode::Text),
            Some(AppAction::InputChar('K'))
        );
    }
}
