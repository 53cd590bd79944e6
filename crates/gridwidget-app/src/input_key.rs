//! Abstract keyboard input, independent of the hosting page.
//!
//! Keyboard events arrive from the host as DOM `KeyboardEvent.key` strings.
//! They are converted once at the boundary so the menu state machines only
//! ever match on [`InputKey`].

/// Abstract input key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKey {
    /// Regular character key (a-z, 0-9, symbols)
    Char(char),

    // Navigation
    /// Up arrow key
    Up,
    /// Down arrow key
    Down,
    /// Left arrow key
    Left,
    /// Right arrow key
    Right,

    // Action keys
    /// Enter/Return key
    Enter,
    /// Escape key
    Esc,
    /// Tab key
    Tab,

    /// Any other named key, kept verbatim
    Other(String),
}

impl InputKey {
    /// Convert a DOM `KeyboardEvent.key` value
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "ArrowUp" => Self::Up,
            "ArrowDown" => Self::Down,
            "ArrowLeft" => Self::Left,
            "ArrowRight" => Self::Right,
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Esc,
            "Tab" => Self::Tab,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Other(other.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dom_key_navigation() {
        assert_eq!(InputKey::from_dom_key("ArrowDown"), InputKey::Down);
        assert_eq!(InputKey::from_dom_key("ArrowUp"), InputKey::Up);
        assert_eq!(InputKey::from_dom_key("Enter"), InputKey::Enter);
        assert_eq!(InputKey::from_dom_key("Escape"), InputKey::Esc);
    }

    #[test]
    fn test_from_dom_key_characters() {
        assert_eq!(InputKey::from_dom_key("a"), InputKey::Char('a'));
        assert_eq!(InputKey::from_dom_key("é"), InputKey::Char('é'));
        assert_eq!(
            InputKey::from_dom_key("PageDown"),
            InputKey::Other("PageDown".to_string())
        );
    }
}
