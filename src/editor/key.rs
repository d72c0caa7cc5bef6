use std::ops::BitOr;

/// Modifier keys held with a key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(0b001);
    pub const CTRL: Modifiers = Modifiers(0b010);
    pub const ALT: Modifiers = Modifiers(0b100);

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

/// A key press as the editor sees it, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl Key {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        // Shift+Tab arrives as Tab+SHIFT from some terminals and BackTab from others
        if code == KeyCode::Tab && modifiers.contains(Modifiers::SHIFT) {
            return Key {
                code: KeyCode::BackTab,
                modifiers: Modifiers(modifiers.0 & !Modifiers::SHIFT.0),
            };
        }
        Key { code, modifiers }
    }

    pub fn plain(code: KeyCode) -> Self {
        Key::new(code, Modifiers::NONE)
    }

    pub fn char(c: char) -> Self {
        Key::plain(KeyCode::Char(c))
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Key::new(code, Modifiers::CTRL)
    }

    pub fn shift(code: KeyCode) -> Self {
        Key::new(code, Modifiers::SHIFT)
    }

    pub fn has_ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    pub fn has_shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    pub fn has_alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// The character this key types, if any (Shift allowed, Ctrl/Alt not).
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.has_ctrl() && !self.has_alt() && !c.is_control() => Some(c),
            _ => None,
        }
    }

    pub fn is(&self, code: KeyCode) -> bool {
        self.code == code && self.modifiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_tab_normalizes_to_backtab() {
        let key = Key::shift(KeyCode::Tab);
        assert_eq!(key.code, KeyCode::BackTab);
        assert!(key.modifiers.is_empty());
    }

    #[test]
    fn printable_excludes_ctrl_chords() {
        assert_eq!(Key::char('a').printable(), Some('a'));
        assert_eq!(Key::shift(KeyCode::Char('A')).printable(), Some('A'));
        assert_eq!(Key::ctrl(KeyCode::Char('a')).printable(), None);
        assert_eq!(Key::plain(KeyCode::Enter).printable(), None);
    }

    #[test]
    fn modifiers_combine() {
        let m = Modifiers::SHIFT | Modifiers::CTRL;
        assert!(m.contains(Modifiers::SHIFT));
        assert!(m.contains(Modifiers::CTRL));
        assert!(!m.contains(Modifiers::ALT));
    }
}
