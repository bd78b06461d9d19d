use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Cell, Row, Table};
use tracing::{debug, warn};

use crate::command::Command;
use crate::message::Message;
use crate::model::SystemSnapshot;
use crate::panel::{Panel, PanelKind};
use crate::ui::{
    MUTED, PANEL, compact_text, format_bytes_compact, pane_block, percent_color,
    render_metric_gauge,
};

#[derive(Debug, Clone, Default)]
pub struct DashboardPanel {
    snapshot: Option<SystemSnapshot>,
    sampling: bool,
    last_error: Option<String>,
    height: u16,
}

impl DashboardPanel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl DashboardPanel {
    pub fn snapshot(&self) -> Option<&SystemSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn sampling(&self) -> bool {
        self.sampling
    }
}

impl Panel for DashboardPanel {
    fn title(&self) -> &str {
        "Dashboard"
    }

    fn init(&mut self) -> Vec<Command> {
        self.sampling = true;
        vec![Command::SampleSystem]
    }

    fn update(&mut self, message: &Message) -> Vec<Command> {
        match message {
            // A slow sample is not stacked under the next tick.
            Message::Tick if !self.sampling => {
                self.sampling = true;
                vec![Command::SampleSystem]
            }
            Message::SystemSampled(snapshot) => {
                debug!(
                    "system sampled cpu={:.1} mem={:.1} disk={:.1} processes={}",
                    snapshot.cpu_percent,
                    snapshot.memory_percent,
                    snapshot.disk_percent,
                    snapshot.processes.len()
                );
                self.snapshot = Some(snapshot.clone());
                self.sampling = false;
                self.last_error = None;
                Vec::new()
            }
            Message::Error {
                origin: PanelKind::Dashboard,
                message,
            } => {
                warn!("system sample failed: {message}");
                self.sampling = false;
                self.last_error = Some(message.clone());
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(3)])
            .split(area);

        let gauges = pane_block(" System ", false);
        let gauge_area = gauges.inner(sections[0]);
        frame.render_widget(gauges, sections[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(gauge_area);
        let snapshot = self.snapshot.clone().unwrap_or_default();
        for (row, (label, percent)) in rows.iter().zip([
            ("CPU", snapshot.cpu_percent),
            ("Memory", snapshot.memory_percent),
            ("Disk", snapshot.disk_percent),
        ]) {
            render_metric_gauge(frame, *row, label, percent, percent_color(percent));
        }

        let visible = self.height.saturating_sub(8).max(1) as usize;
        let table_rows = snapshot
            .processes
            .iter()
            .take(visible)
            .map(|process| {
                Row::new(vec![
                    Cell::from(compact_text(&process.name, 40)),
                    Cell::from(process.pid.to_string()),
                    Cell::from(format_bytes_compact(process.memory_bytes)),
                ])
            })
            .collect::<Vec<_>>();
        let title = match (&self.last_error, &self.snapshot) {
            (Some(error), _) => format!(" Processes ({}) ", compact_text(error, 60)),
            (None, None) => " Processes (sampling...) ".to_string(),
            (None, Some(_)) => " Processes ".to_string(),
        };
        let table = Table::new(
            table_rows,
            [
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(12),
            ],
        )
        .header(
            Row::new(vec!["NAME", "PID", "MEMORY"]).style(
                Style::default()
                    .fg(Color::Rgb(94, 234, 212))
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .style(Style::default().fg(MUTED).bg(PANEL))
        .block(pane_block(title, false));
        frame.render_widget(table, sections[1]);
    }

    fn resize(&mut self, _width: u16, height: u16) {
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::DashboardPanel;
    use crate::command::Command;
    use crate::message::Message;
    use crate::model::{ProcessRow, SystemSnapshot};
    use crate::panel::{Panel, PanelKind};

    fn snapshot() -> SystemSnapshot {
        SystemSnapshot {
            cpu_percent: 12.5,
            memory_percent: 40.0,
            disk_percent: 70.0,
            processes: vec![ProcessRow {
                name: "postgres".to_string(),
                pid: 42,
                memory_bytes: 1_048_576,
            }],
        }
    }

    #[test]
    fn init_requests_a_sample() {
        let mut panel = DashboardPanel::new();
        assert_eq!(panel.init(), vec![Command::SampleSystem]);
        assert!(panel.sampling());
    }

    #[test]
    fn tick_samples_only_when_idle() {
        let mut panel = DashboardPanel::new();
        let _ = panel.init();
        assert!(panel.update(&Message::Tick).is_empty());

        let _ = panel.update(&Message::SystemSampled(snapshot()));
        assert!(!panel.sampling());
        assert_eq!(panel.snapshot(), Some(&snapshot()));
        assert_eq!(
            panel.update(&Message::Tick),
            vec![Command::SampleSystem]
        );
    }

    #[test]
    fn failed_sample_releases_the_tick_latch() {
        let mut panel = DashboardPanel::new();
        let _ = panel.init();
        let _ = panel.update(&Message::Error {
            origin: PanelKind::Dashboard,
            message: "system sampling task failed: panicked".to_string(),
        });

        assert!(!panel.sampling());
        assert_eq!(
            panel.update(&Message::Tick),
            vec![Command::SampleSystem]
        );
    }

    #[test]
    fn errors_from_other_panels_keep_the_latch() {
        let mut panel = DashboardPanel::new();
        let _ = panel.init();
        let _ = panel.update(&Message::Error {
            origin: PanelKind::Http,
            message: "boom".to_string(),
        });

        assert!(panel.sampling());
        assert!(panel.update(&Message::Tick).is_empty());
    }

    #[test]
    fn keys_do_nothing() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
        let mut panel = DashboardPanel::new();
        let key = Message::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert!(panel.update(&key).is_empty());
    }
}
