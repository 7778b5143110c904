//! Backward-navigation interception
//!
//! A kiosk has no history to go back to. Any "back" gesture is turned into
//! `Event::BackNavigation`, which the session treats as a forced reset.

use crate::kiosk::Event;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationInterceptor;

impl NavigationInterceptor {
    /// `editing_text` is true while a text field owns Backspace.
    pub fn intercept(&self, key: &KeyEvent, editing_text: bool) -> Option<Event> {
        let is_back = match key.code {
            KeyCode::Left => key.modifiers.contains(KeyModifiers::ALT),
            KeyCode::Backspace => !editing_text,
            _ => false,
        };
        is_back.then_some(Event::BackNavigation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_alt_left_is_always_back() {
        let nav = NavigationInterceptor;
        let alt_left = key(KeyCode::Left, KeyModifiers::ALT);
        assert!(matches!(nav.intercept(&alt_left, false), Some(Event::BackNavigation)));
        assert!(matches!(nav.intercept(&alt_left, true), Some(Event::BackNavigation)));
    }

    #[test]
    fn test_backspace_belongs_to_text_entry() {
        let nav = NavigationInterceptor;
        let backspace = key(KeyCode::Backspace, KeyModifiers::NONE);
        assert!(matches!(nav.intercept(&backspace, false), Some(Event::BackNavigation)));
        assert!(nav.intercept(&backspace, true).is_none());
    }

    #[test]
    fn test_plain_arrows_pass_through() {
        let nav = NavigationInterceptor;
        assert!(nav.intercept(&key(KeyCode::Left, KeyModifiers::NONE), false).is_none());
        assert!(nav.intercept(&key(KeyCode::Enter, KeyModifiers::NONE), false).is_none());
    }
}
