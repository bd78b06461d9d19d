use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::text::Text;

const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Append-only text entry, single or multi line.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TextInput {
    value: String,
    multiline: bool,
}

impl TextInput {
    pub fn single_line() -> Self {
        Self::default()
    }

    pub fn multi_line() -> Self {
        Self {
            value: String::new(),
            multiline: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        if !self.multiline {
            self.value.retain(|ch| ch != '\n' && ch != '\r');
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Returns true when the key edited the value.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT)
        {
            if key.code == KeyCode::Char('u') && key.modifiers == KeyModifiers::CONTROL {
                self.value.clear();
                return true;
            }
            return false;
        }

        match key.code {
            KeyCode::Char(ch) => {
                self.value.push(ch);
                true
            }
            KeyCode::Backspace => self.value.pop().is_some(),
            KeyCode::Enter if self.multiline => {
                self.value.push('\n');
                true
            }
            _ => false,
        }
    }
}

/// Scrollable block of pre-styled text.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    text: Text<'static>,
    offset: u16,
    height: u16,
}

impl Viewport {
    pub fn set_text(&mut self, text: impl Into<Text<'static>>) {
        self.text = text.into();
        self.offset = 0;
    }

    pub fn clear(&mut self) {
        self.set_text(Text::default());
    }

    pub fn text(&self) -> &Text<'static> {
        &self.text
    }

    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn set_height(&mut self, height: u16) {
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn page(&self) -> isize {
        self.height.max(1) as isize
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let next = (self.offset as isize + delta).clamp(0, self.max_offset() as isize);
        self.offset = next as u16;
    }

    fn max_offset(&self) -> u16 {
        let lines = self.text.lines.len().min(u16::MAX as usize) as u16;
        lines.saturating_sub(self.height.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Spinner {
    frame: usize,
}

impl Spinner {
    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
    }

    pub fn glyph(&self) -> &'static str {
        SPINNER_FRAMES[self.frame]
    }
}

/// Moves a cursor within `len` items, clamping at both ends.
pub fn step_selection(selected: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (selected as isize + delta).clamp(0, len as isize - 1) as usize
}
