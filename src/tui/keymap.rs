use crossterm::event::{KeyCode as TermCode, KeyEvent, KeyModifiers};

use crate::editor::{Key, KeyCode, Modifiers};

/// Translate a terminal key event. Keys the editor has no use for
/// (function keys, media keys, ...) map to `None`.
pub fn translate(event: KeyEvent) -> Option<Key> {
    let code = match event.code {
        TermCode::Char(c) => KeyCode::Char(c),
        TermCode::Enter => KeyCode::Enter,
        TermCode::Esc => KeyCode::Esc,
        TermCode::Backspace => KeyCode::Backspace,
        TermCode::Delete => KeyCode::Delete,
        TermCode::Tab => KeyCode::Tab,
        TermCode::BackTab => KeyCode::BackTab,
        TermCode::Up => KeyCode::Up,
        TermCode::Down => KeyCode::Down,
        TermCode::Left => KeyCode::Left,
        TermCode::Right => KeyCode::Right,
        TermCode::Home => KeyCode::Home,
        TermCode::End => KeyCode::End,
        _ => return None,
    };

    let mut modifiers = Modifiers::NONE;
    if event.modifiers.contains(KeyModifiers::SHIFT) {
        modifiers = modifiers | Modifiers::SHIFT;
    }
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        modifiers = modifiers | Modifiers::CTRL;
    }
    if event.modifiers.contains(KeyModifiers::ALT) {
        modifiers = modifiers | Modifiers::ALT;
    }
    Some(Key::new(code, modifiers))
}
