use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
    NextTab,
    PrevTab,
}

/// Keys the dispatcher consumes before any panel sees them.
///
/// `q` is left to the panel while it is capturing text so it can be typed;
/// `ctrl+c` quits unconditionally.
pub fn map_global_key(key: KeyEvent, capturing_text: bool) -> Option<GlobalAction> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(GlobalAction::Quit)
        }
        KeyCode::Char('q') if key.modifiers.is_empty() && !capturing_text => {
            Some(GlobalAction::Quit)
        }
        KeyCode::BackTab => Some(GlobalAction::PrevTab),
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Some(GlobalAction::PrevTab),
        KeyCode::Tab => Some(GlobalAction::NextTab),
        _ => None,
    }
}

/// Normalized binding name such as `ctrl+s`, `shift+n`, `down`.
pub fn key_event_signature(key: KeyEvent) -> Option<String> {
    let key_name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char('+') => "plus".to_string(),
        KeyCode::Char(c) => c.to_ascii_lowercase().to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };

    let mut parts = Vec::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("ctrl".to_string());
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        parts.push("alt".to_string());
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("shift".to_string());
    }
    parts.push(key_name);
    Some(parts.join("+"))
}

#[cfg(test)]
mod tests {
    use super::{GlobalAction, key_event_signature, map_global_key};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn q_quits_outside_text_entry() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_global_key(key, false), Some(GlobalAction::Quit));
        assert_eq!(map_global_key(key, true), None);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_global_key(key, false), Some(GlobalAction::Quit));
        assert_eq!(map_global_key(key, true), Some(GlobalAction::Quit));
    }

    #[test]
    fn tab_and_backtab_cycle_panels() {
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        let backtab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(map_global_key(tab, true), Some(GlobalAction::NextTab));
        assert_eq!(map_global_key(backtab, false), Some(GlobalAction::PrevTab));
    }

    #[test]
    fn other_keys_are_not_global() {
        let key = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE);
        assert_eq!(map_global_key(key, false), None);
    }

    #[test]
    fn signature_normalizes_modifiers() {
        let key = KeyEvent::new(
            KeyCode::Char('S'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        );
        assert_eq!(key_event_signature(key), Some("ctrl+shift+s".to_string()));
        let plain = KeyEvent::new(KeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(key_event_signature(plain), Some("pagedown".to_string()));
    }
}
