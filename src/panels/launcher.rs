use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use tracing::info;

use crate::command::Command;
use crate::message::Message;
use crate::panel::Panel;
use crate::ui::{ACCENT, ERROR, MUTED, centered_paragraph, pane_block};

/// Tab that hands the terminal to an interactive program on `enter`.
#[derive(Debug, Clone)]
pub struct LauncherPanel {
    name: String,
    binary: String,
    installed: bool,
    last_run: Option<Result<String, String>>,
}

impl LauncherPanel {
    pub fn new(name: impl Into<String>, binary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binary: binary.into(),
            installed: false,
            last_run: None,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn set_installed(&mut self, installed: bool) {
        self.installed = installed;
    }
}

#[cfg(test)]
impl LauncherPanel {
    pub fn installed(&self) -> bool {
        self.installed
    }

    pub fn last_run(&self) -> Option<&Result<String, String>> {
        self.last_run.as_ref()
    }
}

impl Panel for LauncherPanel {
    fn title(&self) -> &str {
        &self.name
    }

    fn update(&mut self, message: &Message) -> Vec<Command> {
        match message {
            Message::Key(key) if key.code == KeyCode::Enter && self.installed => {
                info!("launching {}", self.binary);
                vec![Command::Launch {
                    binary: self.binary.clone(),
                }]
            }
            Message::LaunchFinished { binary, result } if *binary == self.binary => {
                self.last_run = Some(result.clone());
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = pane_block(format!(" {} ", self.name), true);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = Vec::new();
        if self.installed {
            lines.push(Line::from(Span::styled(
                format!("{} is installed", self.binary),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("Press Enter to launch {}", self.binary),
                Style::default().fg(MUTED),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("{} binary not found in $PATH", self.binary),
                Style::default().fg(ERROR).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("Install {} to use this tab", self.binary),
                Style::default().fg(MUTED),
            )));
        }

        match &self.last_run {
            Some(Ok(status)) => {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    status.clone(),
                    Style::default().fg(MUTED),
                )));
            }
            Some(Err(error)) => {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(ERROR),
                )));
            }
            None => {}
        }

        centered_paragraph(frame, inner, Text::from(lines));
    }

    fn resize(&mut self, _width: u16, _height: u16) {}
}
