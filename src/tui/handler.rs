use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::citation::CitationStyle;
use crate::nav::Modal;

use super::ui::modal_area;

/// Where keyboard input currently goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputContext {
    Help,
    Confirm,
    Prompt,
    TopicName,
    SourceForm,
    Citations,
    NotesEditor,
    Topics,
    TopicDetail,
    Sources,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    ShowHelp,
    HideHelp,
    CloseModal(Modal),
    // Topics page
    OpenAddTopic,
    SelectTopic,
    // Topic name input
    TopicInputChar(char),
    TopicInputBackspace,
    TopicInputConfirm,
    // Topic detail page
    ViewTopics,
    ViewSources,
    Summarize,
    Suggest,
    OpenPageStart,
    SelectTextStart,
    AddResultToSources,
    CapturePage,
    ClearResults,
    RequestDeleteTopic,
    EditNotes,
    SaveNotes,
    // Notes editor
    NotesChar(char),
    NotesNewline,
    NotesBackspace,
    StopEditingNotes,
    // Sources page
    BackToTopic,
    OpenAddSource,
    EditSource,
    RequestDeleteSource,
    GenerateCitations,
    OpenSourceInBrowser,
    // Source form
    FormNextField,
    FormPrevField,
    FormChar(char),
    FormBackspace,
    FormAdjust(bool),
    FormAutoFill,
    FormSave,
    // Citation modal
    CopyCitations(CitationStyle),
    // Prompt (page url / selected text)
    PromptChar(char),
    PromptBackspace,
    PromptConfirm,
    PromptCancel,
    // Confirmation dialog
    ConfirmYes,
    ConfirmNo,
    Paste(String),
}

fn text_input(
    key: KeyEvent,
    confirm: AppAction,
    cancel: AppAction,
    backspace: AppAction,
    char_action: fn(char) -> AppAction,
) -> Option<AppAction> {
    match key.code {
        KeyCode::Enter => Some(confirm),
        KeyCode::Esc => Some(cancel),
        KeyCode::Backspace => Some(backspace),
        KeyCode::Char(c) => Some(char_action(c)),
        _ => None,
    }
}

pub fn handle_key_event(key: KeyEvent, context: InputContext) -> Option<AppAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(AppAction::Quit);
    }

    match context {
        // If help is showing, any key closes it
        InputContext::Help => Some(AppAction::HideHelp),

        InputContext::Confirm => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(AppAction::ConfirmYes),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(AppAction::ConfirmNo),
            _ => None,
        },

        InputContext::Prompt => text_input(
            key,
            AppAction::PromptConfirm,
            AppAction::PromptCancel,
            AppAction::PromptBackspace,
            AppAction::PromptChar,
        ),

        InputContext::TopicName => text_input(
            key,
            AppAction::TopicInputConfirm,
            AppAction::CloseModal(Modal::AddTopic),
            AppAction::TopicInputBackspace,
            AppAction::TopicInputChar,
        ),

        InputContext::SourceForm => match (key.code, key.modifiers) {
            (KeyCode::Char('f'), m) if m.contains(KeyModifiers::CONTROL) => {
                Some(AppAction::FormAutoFill)
            }
            (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => {
                Some(AppAction::FormSave)
            }
            (KeyCode::Enter, _) => Some(AppAction::FormSave),
            (KeyCode::Esc, _) => Some(AppAction::CloseModal(Modal::AddSource)),
            (KeyCode::Tab, _) | (KeyCode::Down, _) => Some(AppAction::FormNextField),
            (KeyCode::BackTab, _) | (KeyCode::Up, _) => Some(AppAction::FormPrevField),
            (KeyCode::Left, _) => Some(AppAction::FormAdjust(false)),
            (KeyCode::Right, _) => Some(AppAction::FormAdjust(true)),
            (KeyCode::Backspace, _) => Some(AppAction::FormBackspace),
            (KeyCode::Char(c), _) => Some(AppAction::FormChar(c)),
            _ => None,
        },

        InputContext::Citations => match key.code {
            KeyCode::Char('a') => Some(AppAction::CopyCitations(CitationStyle::Apa)),
            KeyCode::Char('m') => Some(AppAction::CopyCitations(CitationStyle::Mla)),
            KeyCode::Char('c') => Some(AppAction::CopyCitations(CitationStyle::Chicago)),
            KeyCode::Esc | KeyCode::Char('q') => Some(AppAction::CloseModal(Modal::Citation)),
            _ => None,
        },

        InputContext::NotesEditor => match (key.code, key.modifiers) {
            (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => {
                Some(AppAction::SaveNotes)
            }
            (KeyCode::Esc, _) => Some(AppAction::StopEditingNotes),
            (KeyCode::Enter, _) => Some(AppAction::NotesNewline),
            (KeyCode::Backspace, _) => Some(AppAction::NotesBackspace),
            (KeyCode::Char(c), _) => Some(AppAction::NotesChar(c)),
            _ => None,
        },

        InputContext::Topics => match key.code {
            KeyCode::Char('q') => Some(AppAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),
            KeyCode::Enter => Some(AppAction::SelectTopic),
            KeyCode::Char('a') => Some(AppAction::OpenAddTopic),
            KeyCode::Char('?') => Some(AppAction::ShowHelp),
            _ => None,
        },

        InputContext::TopicDetail => match key.code {
            KeyCode::Char('q') => Some(AppAction::Quit),
            KeyCode::Esc | KeyCode::Char('b') => Some(AppAction::ViewTopics),
            KeyCode::Char('v') => Some(AppAction::ViewSources),
            KeyCode::Char('s') => Some(AppAction::Summarize),
            KeyCode::Char('t') => Some(AppAction::Suggest),
            KeyCode::Char('p') => Some(AppAction::OpenPageStart),
            KeyCode::Char('x') => Some(AppAction::SelectTextStart),
            KeyCode::Char('A') => Some(AppAction::AddResultToSources),
            KeyCode::Char('c') => Some(AppAction::CapturePage),
            KeyCode::Char('r') => Some(AppAction::ClearResults),
            KeyCode::Char('n') => Some(AppAction::EditNotes),
            KeyCode::Char('w') => Some(AppAction::SaveNotes),
            KeyCode::Char('D') => Some(AppAction::RequestDeleteTopic),
            KeyCode::Char('?') => Some(AppAction::ShowHelp),
            _ => None,
        },

        InputContext::Sources => match key.code {
            KeyCode::Char('q') => Some(AppAction::Quit),
            KeyCode::Esc | KeyCode::Char('b') => Some(AppAction::BackToTopic),
            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),
            KeyCode::Char('a') => Some(AppAction::OpenAddSource),
            KeyCode::Char('e') | KeyCode::Enter => Some(AppAction::EditSource),
            KeyCode::Char('d') => Some(AppAction::RequestDeleteSource),
            KeyCode::Char('g') => Some(AppAction::GenerateCitations),
            KeyCode::Char('o') => Some(AppAction::OpenSourceInBrowser),
            KeyCode::Char('?') => Some(AppAction::ShowHelp),
            _ => None,
        },
    }
}

/// A left click outside the topmost modal's box closes that modal.
pub fn handle_mouse_event(mouse: MouseEvent, screen: Rect, open: Option<Modal>) -> Option<AppAction> {
    let modal = open?;
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return None;
    }

    let inside = modal_area(modal, screen).contains(Position::new(mouse.column, mouse.row));
    (!inside).then_some(AppAction::CloseModal(modal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn same_key_means_different_things_per_context() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('a')), InputContext::Topics),
            Some(AppAction::OpenAddTopic)
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('a')), InputContext::TopicName),
            Some(AppAction::TopicInputChar('a'))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('a')), InputContext::Citations),
            Some(AppAction::CopyCitations(CitationStyle::Apa))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q')), InputContext::NotesEditor),
            Some(AppAction::NotesChar('q'))
        );
    }

    #[test]
    fn escape_closes_the_open_modal() {
        assert_eq!(
            handle_key_event(key(KeyCode::Esc), InputContext::TopicName),
            Some(AppAction::CloseModal(Modal::AddTopic))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Esc), InputContext::SourceForm),
            Some(AppAction::CloseModal(Modal::AddSource))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Esc), InputContext::Citations),
            Some(AppAction::CloseModal(Modal::Citation))
        );
    }

    #[test]
    fn control_shortcuts() {
        assert_eq!(handle_key_event(ctrl('c'), InputContext::SourceForm), Some(AppAction::Quit));
        assert_eq!(
            handle_key_event(ctrl('f'), InputContext::SourceForm),
            Some(AppAction::FormAutoFill)
        );
        assert_eq!(
            handle_key_event(ctrl('s'), InputContext::NotesEditor),
            Some(AppAction::SaveNotes)
        );
    }

    #[test]
    fn help_swallows_any_key() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('D')), InputContext::Help),
            Some(AppAction::HideHelp)
        );
    }

    #[test]
    fn clicks_outside_the_modal_close_it() {
        let screen = Rect::new(0, 0, 100, 40);
        let area = modal_area(Modal::AddTopic, screen);

        assert_eq!(
            handle_mouse_event(click(0, 0), screen, Some(Modal::AddTopic)),
            Some(AppAction::CloseModal(Modal::AddTopic))
        );
        assert_eq!(
            handle_mouse_event(click(area.x + 1, area.y + 1), screen, Some(Modal::AddTopic)),
            None
        );
        assert_eq!(handle_mouse_event(click(0, 0), screen, None), None);
    }
}
