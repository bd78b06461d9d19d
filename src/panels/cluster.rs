use chrono::Utc;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::external::KIND_BINARY;
use crate::input::key_event_signature;
use crate::message::Message;
use crate::model::{ClusterJob, ClusterJobKind};
use crate::panel::{Panel, PanelKind};
use crate::ui::{
    ACCENT, ERROR, MUTED, WARN, centered_paragraph, compact_text, help_line, pane_block,
};
use crate::widgets::{Spinner, TextInput, Viewport, step_selection};

/// Body, status line, help line and borders.
const DESCRIBE_CHROME_ROWS: u16 = 4;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClusterView {
    List,
    Describe,
}

/// The two steps of the create flow.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Prompt {
    Name,
    ConfigPath { name: String },
}

pub fn default_cluster_name() -> String {
    format!("dev-{}", Utc::now().timestamp().rem_euclid(10_000))
}

#[derive(Debug, Clone)]
pub struct ClusterPanel {
    installed: bool,
    clusters: Vec<String>,
    selected: usize,
    view: ClusterView,
    describe_name: String,
    describe: Viewport,
    prompt: Option<Prompt>,
    prompt_input: TextInput,
    job: Option<ClusterJob>,
    spinner: Spinner,
    last_error: Option<String>,
}

impl Default for ClusterPanel {
    fn default() -> Self {
        Self {
            installed: false,
            clusters: Vec::new(),
            selected: 0,
            view: ClusterView::List,
            describe_name: String::new(),
            describe: Viewport::default(),
            prompt: None,
            prompt_input: TextInput::single_line(),
            job: None,
            spinner: Spinner::default(),
            last_error: None,
        }
    }
}

impl ClusterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_installed(&mut self, installed: bool) {
        if !installed {
            warn!("{KIND_BINARY} not found, cluster tab disabled");
        }
        self.installed = installed;
    }

    fn selected_name(&self) -> Option<String> {
        self.clusters.get(self.selected).cloned()
    }

    fn start(&mut self, kind: ClusterJobKind, title: impl Into<String>) {
        let job = ClusterJob::new(kind, title);
        debug!("cluster job started kind={:?} title={}", job.kind, job.title);
        self.job = Some(job);
    }

    fn refresh(&mut self) -> Vec<Command> {
        self.start(ClusterJobKind::Refresh, "Loading clusters");
        vec![Command::ListClusters]
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        let signature = key_event_signature(key).unwrap_or_default();
        match self.view {
            ClusterView::List => self.handle_list_key(&signature),
            ClusterView::Describe => {
                self.handle_describe_key(&signature);
                Vec::new()
            }
        }
    }

    fn handle_list_key(&mut self, signature: &str) -> Vec<Command> {
        match signature {
            "r" => self.refresh(),
            "n" => {
                self.prompt = Some(Prompt::Name);
                self.prompt_input.clear();
                Vec::new()
            }
            "d" => {
                let Some(name) = self.selected_name() else {
                    return Vec::new();
                };
                info!("deleting kind cluster {name}");
                self.start(ClusterJobKind::Delete, format!("Deleting {name}"));
                vec![Command::DeleteCluster { name }]
            }
            "v" => {
                let Some(name) = self.selected_name() else {
                    return Vec::new();
                };
                self.view = ClusterView::Describe;
                self.describe_name = name.clone();
                self.describe.clear();
                self.start(ClusterJobKind::Describe, format!("Describing {name}"));
                vec![Command::DescribeCluster { name }]
            }
            "up" | "k" => {
                self.selected = step_selection(self.selected, -1, self.clusters.len());
                Vec::new()
            }
            "down" | "j" => {
                self.selected = step_selection(self.selected, 1, self.clusters.len());
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_describe_key(&mut self, signature: &str) {
        match signature {
            "esc" => self.view = ClusterView::List,
            "up" | "k" => self.describe.scroll_by(-1),
            "down" | "j" => self.describe.scroll_by(1),
            "pageup" => self.describe.scroll_by(-self.describe.page()),
            "pagedown" => self.describe.scroll_by(self.describe.page()),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key_event_signature(key).as_deref() {
            Some("esc") => {
                debug!("cluster create prompt cancelled");
                self.prompt = None;
                self.prompt_input.clear();
                Vec::new()
            }
            Some("enter") => {
                let answer = self.prompt_input.value().trim().to_string();
                self.prompt_input.clear();
                match self.prompt.take() {
                    Some(Prompt::Name) => {
                        let name = if answer.is_empty() {
                            default_cluster_name()
                        } else {
                            answer
                        };
                        self.prompt = Some(Prompt::ConfigPath { name });
                        Vec::new()
                    }
                    Some(Prompt::ConfigPath { name }) => {
                        let config = Some(answer).filter(|path| !path.is_empty());
                        info!("creating kind cluster {name} config={config:?}");
                        self.start(ClusterJobKind::Create, format!("Creating {name}"));
                        vec![Command::CreateCluster { name, config }]
                    }
                    None => Vec::new(),
                }
            }
            _ => {
                self.prompt_input.handle_key(key);
                Vec::new()
            }
        }
    }

    fn status_line(&self) -> Line<'static> {
        if let Some(prompt) = &self.prompt {
            let label = match prompt {
                Prompt::Name => "Cluster name (blank for default): ".to_string(),
                Prompt::ConfigPath { name } => format!("Config file for {name} (optional): "),
            };
            return Line::from(vec![
                Span::styled(label, Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                Span::raw(format!("{}▏", self.prompt_input.value())),
            ]);
        }
        if let Some(job) = &self.job {
            return Line::from(Span::styled(
                format!("{} {}...", self.spinner.glyph(), job.title),
                Style::default().fg(WARN),
            ));
        }
        if let Some(error) = &self.last_error {
            let first = error.lines().next().unwrap_or_default();
            return Line::from(Span::styled(
                format!("Error: {}", compact_text(first, 200)),
                Style::default().fg(ERROR),
            ));
        }
        Line::from(Span::styled(
            format!("{} kind clusters", self.clusters.len()),
            Style::default().fg(MUTED),
        ))
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let block = pane_block(" Kind Clusters ", true);
        if self.clusters.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let hint = if self.job.is_some() {
                "Loading clusters..."
            } else {
                "No kind clusters. Press n to create one."
            };
            centered_paragraph(
                frame,
                inner,
                Text::from(Span::styled(hint, Style::default().fg(MUTED))),
            );
            return;
        }

        let items = self
            .clusters
            .iter()
            .map(|name| ListItem::new(name.clone()))
            .collect::<Vec<_>>();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
impl ClusterPanel {
    pub fn installed(&self) -> bool {
        self.installed
    }

    pub fn clusters(&self) -> &[String] {
        &self.clusters
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn view(&self) -> ClusterView {
        self.view
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn job(&self) -> Option<&ClusterJob> {
        self.job.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl Panel for ClusterPanel {
    fn title(&self) -> &str {
        "Kind"
    }

    fn init(&mut self) -> Vec<Command> {
        self.refresh()
    }

    fn update(&mut self, message: &Message) -> Vec<Command> {
        match message {
            // Without kind every action would fail; the render shows why.
            Message::Key(_) if self.job.is_some() || !self.installed => Vec::new(),
            Message::Key(key) => self.handle_key(*key),
            Message::SpinnerTick if self.job.is_some() => {
                self.spinner.tick();
                Vec::new()
            }
            Message::ClusterListReady(names) => {
                let job = self.job.take();
                if job.is_none_or(|job| job.kind == ClusterJobKind::Refresh) {
                    self.last_error = None;
                }
                self.clusters = names.clone();
                self.selected = self.selected.min(self.clusters.len().saturating_sub(1));
                Vec::new()
            }
            Message::ClusterOpDone { kind, result } => {
                match result {
                    Ok(()) => {
                        info!("cluster {kind:?} finished");
                        self.last_error = None;
                    }
                    Err(error) => {
                        warn!("cluster {kind:?} failed: {error}");
                        self.last_error = Some(error.clone());
                    }
                }
                self.start(ClusterJobKind::Sync, "Syncing clusters");
                vec![Command::ListClusters]
            }
            Message::ClusterDescribeReady { name, text } => {
                self.describe_name = name.clone();
                self.describe.set_text(text.clone());
                self.job = None;
                Vec::new()
            }
            Message::Error {
                origin: PanelKind::Cluster,
                message,
            } => {
                warn!("cluster panel error: {message}");
                self.job = None;
                self.last_error = Some(message.clone());
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        if !self.installed {
            let block = pane_block(" Kind Clusters ", true);
            let inner = block.inner(sections[0]);
            frame.render_widget(block, sections[0]);
            centered_paragraph(
                frame,
                inner,
                Text::from(vec![
                    Line::from(Span::styled(
                        format!("{KIND_BINARY} binary not found in $PATH"),
                        Style::default().fg(ERROR).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        "Install kind to manage local clusters",
                        Style::default().fg(MUTED),
                    )),
                ]),
            );
            return;
        }

        match self.view {
            ClusterView::List => self.render_list(frame, sections[0]),
            ClusterView::Describe => frame.render_widget(
                Paragraph::new(self.describe.text().clone())
                    .block(pane_block(format!(" Describe {} ", self.describe_name), true))
                    .scroll((self.describe.offset(), 0)),
                sections[0],
            ),
        }

        frame.render_widget(Paragraph::new(self.status_line()), sections[1]);
        let help = match self.view {
            ClusterView::List => " r: refresh | n: new | d: delete | v: describe | j/k: move",
            ClusterView::Describe => " esc: back | j/k: scroll | pgup/pgdn: page",
        };
        frame.render_widget(help_line(help), sections[2]);
    }

    fn resize(&mut self, _width: u16, height: u16) {
        self.describe
            .set_height(height.saturating_sub(DESCRIBE_CHROME_ROWS));
    }

    fn captures_text(&self) -> bool {
        self.prompt.is_some()
    }
}
