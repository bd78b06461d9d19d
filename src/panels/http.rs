use std::collections::HashMap;
use std::sync::LazyLock;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};
use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::PhantomConfig;
use crate::input::key_event_signature;
use crate::message::Message;
use crate::model::{
    History, HttpMethod, HttpRequest, HttpResponse, RequestField, RequestItem, ResponseView,
};
use crate::panel::Panel;
use crate::ui::{
    ACCENT, ERROR, MUTED, PANEL, WARN, centered_paragraph, compact_text, help_line, pane_block,
    pretty_json, tab_strip,
};
use crate::widgets::{Spinner, TextInput, Viewport, step_selection};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([a-zA-Z0-9_]+)\}\}").expect("valid placeholder regex"));

/// Rows of the response pane not available to the body: help line, borders,
/// view tabs and the status line.
const RESPONSE_CHROME_ROWS: u16 = 5;

/// Replaces `{{name}}` with its environment value; unknown names stay verbatim.
pub fn substitute(input: &str, environment: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            environment
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HttpFocus {
    List,
    Request,
    Response,
}

impl HttpFocus {
    fn next(self) -> Self {
        match self {
            Self::List => Self::Request,
            Self::Request => Self::Response,
            Self::Response => Self::List,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpPanel {
    templates: Vec<RequestItem>,
    environment: HashMap<String, String>,
    history: History,
    list_cursor: usize,
    focus: HttpFocus,
    field: RequestField,
    method: HttpMethod,
    url: TextInput,
    headers: TextInput,
    body: TextInput,
    response: Option<HttpResponse>,
    response_view: ResponseView,
    viewport: Viewport,
    last_error: Option<String>,
    /// Request currently on the wire; doubles as the sending latch.
    in_flight: Option<RequestItem>,
    spinner: Spinner,
}

impl Default for HttpPanel {
    fn default() -> Self {
        Self {
            templates: Vec::new(),
            environment: HashMap::new(),
            history: History::default(),
            list_cursor: 0,
            focus: HttpFocus::Request,
            field: RequestField::Url,
            method: HttpMethod::default(),
            url: TextInput::single_line(),
            headers: TextInput::multi_line(),
            body: TextInput::multi_line(),
            response: None,
            response_view: ResponseView::default(),
            viewport: Viewport::default(),
            last_error: None,
            in_flight: None,
            spinner: Spinner::default(),
        }
    }
}

impl HttpPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_config(&mut self, config: PhantomConfig) {
        info!(
            "http panel seeded with {} templates from {}",
            config.templates.len(),
            config.source.as_deref().unwrap_or("defaults")
        );
        self.templates = config.templates;
        self.environment = config.environment;
        self.list_cursor = self.list_cursor.min(self.list_len().saturating_sub(1));
    }

    pub fn sending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Zero when there is no response, including after a failed send.
    pub fn status_code(&self) -> u16 {
        self.response.as_ref().map_or(0, |response| response.status)
    }

    fn list_len(&self) -> usize {
        self.templates.len() + self.history.len()
    }

    fn list_item(&self, index: usize) -> Option<&RequestItem> {
        match index.checked_sub(self.templates.len()) {
            None => self.templates.get(index),
            Some(history_index) => self.history.entries().get(history_index),
        }
    }

    fn load_item(&mut self, index: usize) {
        let Some(item) = self.list_item(index).cloned() else {
            return;
        };
        debug!("loading request item '{}' into draft", item.name);
        self.method = HttpMethod::from_token(&item.method).unwrap_or(HttpMethod::ALL[0]);
        self.url.set_value(item.url);
        self.headers.set_value(item.headers);
        self.body.set_value(item.body);
    }

    fn draft(&self) -> RequestItem {
        RequestItem {
            name: self.url.value().to_string(),
            method: self.method.as_str().to_string(),
            url: self.url.value().to_string(),
            headers: self.headers.value().to_string(),
            body: self.body.value().to_string(),
        }
    }

    fn send(&mut self) -> Vec<Command> {
        let draft = self.draft();
        if draft.url.trim().is_empty() {
            self.last_error = Some("URL is empty".to_string());
            return Vec::new();
        }

        let request = HttpRequest {
            method: self.method,
            url: substitute(&draft.url, &self.environment),
            headers: substitute(&draft.headers, &self.environment)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            body: Some(substitute(&draft.body, &self.environment))
                .filter(|body| !body.is_empty()),
        };
        info!("sending {} {}", request.method, request.url);

        self.response = None;
        self.last_error = None;
        self.viewport.clear();
        self.in_flight = Some(draft);
        vec![Command::SendHttp(request)]
    }

    fn finish(&mut self, result: &Result<HttpResponse, String>) {
        let Some(sent) = self.in_flight.take() else {
            return;
        };
        match result {
            Ok(response) => {
                info!("response {} for {}", response.status, sent.url);
                self.response = Some(response.clone());
                self.last_error = None;
                self.history.push(sent);
                self.refresh_view();
            }
            Err(error) => {
                warn!("request to {} failed: {error}", sent.url);
                self.response = None;
                self.last_error = Some(error.clone());
                self.viewport.set_text(Text::from(Span::styled(
                    error.clone(),
                    Style::default().fg(ERROR),
                )));
            }
        }
    }

    fn refresh_view(&mut self) {
        let Some(response) = &self.response else {
            return;
        };
        let text = match self.response_view {
            ResponseView::Pretty => {
                pretty_json(&response.body).unwrap_or_else(|| Text::raw(response.body.clone()))
            }
            ResponseView::Raw => Text::raw(response.body.clone()),
            ResponseView::Headers => Text::raw(response.headers.clone()),
        };
        self.viewport.set_text(text);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let signature = key_event_signature(key).unwrap_or_default();
        match signature.as_str() {
            "ctrl+l" => {
                self.focus = self.focus.next();
                return Vec::new();
            }
            "ctrl+s" => return self.send(),
            _ => {}
        }

        match self.focus {
            HttpFocus::List => self.handle_list_key(&signature),
            HttpFocus::Request => self.handle_request_key(&signature, key),
            HttpFocus::Response => self.handle_response_key(&signature),
        }
        Vec::new()
    }

    fn handle_list_key(&mut self, signature: &str) {
        match signature {
            "up" | "k" => {
                self.list_cursor = step_selection(self.list_cursor, -1, self.list_len());
            }
            "down" | "j" => {
                self.list_cursor = step_selection(self.list_cursor, 1, self.list_len());
            }
            "enter" => self.load_item(self.list_cursor),
            _ => {}
        }
    }

    fn handle_request_key(&mut self, signature: &str, key: KeyEvent) {
        match signature {
            "up" => {
                self.field = self.field.cycle(-1);
                return;
            }
            "down" => {
                self.field = self.field.cycle(1);
                return;
            }
            _ => {}
        }

        match self.field {
            RequestField::Method => match signature {
                "h" | "left" => self.method = self.method.cycle(-1),
                "l" | "right" => self.method = self.method.cycle(1),
                _ => {}
            },
            RequestField::Url => {
                self.url.handle_key(key);
            }
            RequestField::Headers => {
                self.headers.handle_key(key);
            }
            RequestField::Body => {
                self.body.handle_key(key);
            }
        }
    }

    fn handle_response_key(&mut self, signature: &str) {
        match signature {
            "h" | "left" => {
                self.response_view = self.response_view.cycle(-1);
                self.refresh_view();
            }
            "l" | "right" => {
                self.response_view = self.response_view.cycle(1);
                self.refresh_view();
            }
            "up" | "k" => self.viewport.scroll_by(-1),
            "down" | "j" => self.viewport.scroll_by(1),
            "pageup" => self.viewport.scroll_by(-self.viewport.page()),
            "pagedown" => self.viewport.scroll_by(self.viewport.page()),
            _ => {}
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(4) as usize;
        let templates = self.templates.iter().map(|item| ("◆", item));
        let history = self.history.entries().iter().map(|item| ("↺", item));
        let items = templates
            .chain(history)
            .map(|(marker, item)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{marker} "), Style::default().fg(MUTED)),
                    Span::raw(compact_text(&item.title(), width.saturating_sub(2))),
                ]))
            })
            .collect::<Vec<_>>();

        let title = format!(
            " Requests ({} saved, {} recent) ",
            self.templates.len(),
            self.history.len()
        );
        if self.templates.is_empty() && self.history.is_empty() {
            let block = pane_block(title, self.focus == HttpFocus::List);
            let inner = block.inner(area);
            frame.render_widget(block, area);
            centered_paragraph(
                frame,
                inner,
                Text::from(Span::styled(
                    "No saved or recent requests",
                    Style::default().fg(MUTED),
                )),
            );
            return;
        }
        let list = List::new(items)
            .block(pane_block(title, self.focus == HttpFocus::List))
            .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.list_cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_request(&self, frame: &mut Frame, area: Rect) {
        let block = pane_block(" Request ", self.focus == HttpFocus::Request);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Percentage(40),
                Constraint::Min(3),
            ])
            .split(inner);

        let editing = |field: RequestField| self.focus == HttpFocus::Request && self.field == field;
        let method_titles = HttpMethod::ALL.map(HttpMethod::as_str);
        frame.render_widget(
            Paragraph::new(tab_strip(
                &method_titles,
                self.method.index(),
                editing(RequestField::Method),
            ))
            .block(pane_block(" Method ", editing(RequestField::Method))),
            rows[0],
        );

        for (row, field, title, input) in [
            (rows[1], RequestField::Url, " URL ", &self.url),
            (rows[2], RequestField::Headers, " Headers ", &self.headers),
            (rows[3], RequestField::Body, " Body ", &self.body),
        ] {
            let mut value = input.value().to_string();
            if editing(field) {
                value.push('▏');
            }
            frame.render_widget(
                Paragraph::new(value)
                    .wrap(Wrap { trim: false })
                    .block(pane_block(title, editing(field))),
                row,
            );
        }
    }

    fn render_response(&self, frame: &mut Frame, area: Rect) {
        let block = pane_block(" Response ", self.focus == HttpFocus::Response);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let view_titles = ResponseView::ALL.map(ResponseView::title);
        let active_view = ResponseView::ALL
            .iter()
            .position(|view| *view == self.response_view)
            .unwrap_or(0);
        frame.render_widget(
            Paragraph::new(tab_strip(
                &view_titles,
                active_view,
                self.focus == HttpFocus::Response,
            )),
            rows[0],
        );

        let status = if self.sending() {
            Line::from(Span::styled(
                format!("{} Sending...", self.spinner.glyph()),
                Style::default().fg(WARN),
            ))
        } else if self.last_error.is_some() || self.response.is_some() {
            let status = self.status_code();
            let color = match status {
                200..=299 => ACCENT,
                300..=399 => WARN,
                _ => ERROR,
            };
            Line::from(Span::styled(
                format!("Status: {status}"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                "No response yet",
                Style::default().fg(MUTED),
            ))
        };
        frame.render_widget(Paragraph::new(status), rows[1]);

        frame.render_widget(
            Paragraph::new(self.viewport.text().clone())
                .style(Style::default().bg(PANEL))
                .scroll((self.viewport.offset(), 0)),
            rows[2],
        );
    }
}

#[cfg(test)]
impl HttpPanel {
    pub fn focus(&self) -> HttpFocus {
        self.focus
    }

    pub fn field(&self) -> RequestField {
        self.field
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        self.url.value()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl Panel for HttpPanel {
    fn title(&self) -> &str {
        "HTTP"
    }

    fn update(&mut self, message: &Message) -> Vec<Command> {
        match message {
            Message::Key(_) if self.sending() => Vec::new(),
            Message::Key(key) => self.handle_key(*key),
            Message::SpinnerTick if self.sending() => {
                self.spinner.tick();
                Vec::new()
            }
            Message::HttpResponseReady(result) => {
                self.finish(result);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(50),
                Constraint::Percentage(25),
            ])
            .split(sections[0]);

        self.render_list(frame, panes[0]);
        self.render_request(frame, panes[1]);
        self.render_response(frame, panes[2]);
        frame.render_widget(
            help_line(
                " ctrl+l: focus | ctrl+s: send | up/down: field | h/l: method or view | enter: load",
            ),
            sections[1],
        );
    }

    fn resize(&mut self, _width: u16, height: u16) {
        self.viewport
            .set_height(height.saturating_sub(RESPONSE_CHROME_ROWS));
    }

    fn captures_text(&self) -> bool {
        self.focus == HttpFocus::Request && self.field.is_text()
    }
}
