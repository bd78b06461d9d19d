use chrono::Local;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use serde_json::Value;

use crate::app::App;

pub const BG: Color = Color::Rgb(9, 15, 25);
pub const PANEL: Color = Color::Rgb(16, 27, 44);
pub const ACCENT: Color = Color::Rgb(52, 211, 153);
pub const MUTED: Color = Color::Rgb(140, 156, 178);
pub const WARN: Color = Color::Rgb(251, 191, 36);
pub const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);

/// Rows taken by the tab header and the status bar.
pub const CHROME_ROWS: u16 = 2;

pub fn render(frame: &mut Frame, app: &App) {
    if !app.ready() {
        frame.render_widget(
            Paragraph::new("Initializing...").style(Style::default().fg(MUTED)),
            frame.area(),
        );
        return;
    }

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tab_header(frame, root[0], app);
    app.active_panel().render(frame, root[1]);
    render_status_bar(frame, root[2], app);
}

fn render_tab_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    for (index, title) in app.tab_titles().into_iter().enumerate() {
        let style = if index == app.active_tab_index() {
            Style::default()
                .fg(Color::White)
                .bg(PL_B)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        spans.push(Span::styled(format!(" {title} "), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " PHANTOM ", Color::Black, ACCENT, PL_A);
    push_powerline_segment(
        &mut spans,
        " Tab/Shift+Tab: Switch | q: Quit ",
        Color::White,
        PL_A,
        PL_C,
    );
    push_powerline_segment(
        &mut spans,
        format!(" {} ", Local::now().format("%H:%M:%S")),
        Color::White,
        PL_C,
        BG,
    );
    if !app.status().is_empty() {
        spans.push(Span::styled(
            format!(" {}", compact_text(app.status(), area.width as usize / 2)),
            Style::default().fg(MUTED),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

pub fn pane_block(title: impl Into<Line<'static>>, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL))
}

pub fn help_line(text: &str) -> Paragraph<'static> {
    Paragraph::new(text.to_string()).style(Style::default().fg(MUTED).bg(BG))
}

pub fn tab_strip(titles: &[&str], active: usize, highlight: bool) -> Line<'static> {
    let spans = titles
        .iter()
        .enumerate()
        .flat_map(|(index, title)| {
            let style = if index == active && highlight {
                Style::default()
                    .fg(Color::White)
                    .bg(PL_B)
                    .add_modifier(Modifier::BOLD)
            } else if index == active {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(MUTED)
            };
            [Span::styled(format!(" {title} "), style), Span::raw(" ")]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

/// Pretty-printed, highlighted JSON, or `None` if `input` is not JSON.
pub fn pretty_json(input: &str) -> Option<Text<'static>> {
    let value = serde_json::from_str::<Value>(input.trim()).ok()?;
    let pretty = serde_json::to_string_pretty(&value).ok()?;
    let lines = pretty
        .lines()
        .map(highlight_json_line)
        .collect::<Vec<Line<'static>>>();
    Some(Text::from(lines))
}

fn highlight_json_line(line: &str) -> Line<'static> {
    let chars = line.chars().collect::<Vec<_>>();
    let mut index = 0usize;
    let mut spans = Vec::new();

    while index < chars.len() {
        let ch = chars[index];
        if ch.is_ascii_whitespace() {
            spans.push(Span::raw(ch.to_string()));
            index += 1;
            continue;
        }

        if matches!(ch, '{' | '}' | '[' | ']' | ':' | ',') {
            spans.push(Span::styled(ch.to_string(), Style::default().fg(MUTED)));
            index += 1;
            continue;
        }

        if ch == '"' {
            let (token, next_index) = read_json_string(&chars, index);
            let mut look_ahead = next_index;
            while look_ahead < chars.len() && chars[look_ahead].is_ascii_whitespace() {
                look_ahead += 1;
            }
            let color = if look_ahead < chars.len() && chars[look_ahead] == ':' {
                Color::Rgb(103, 232, 249)
            } else {
                Color::Rgb(134, 239, 172)
            };
            spans.push(Span::styled(token, Style::default().fg(color)));
            index = next_index;
            continue;
        }

        if ch.is_ascii_digit() || ch == '-' {
            let start = index;
            while index < chars.len()
                && (chars[index].is_ascii_digit()
                    || matches!(chars[index], '-' | '+' | '.' | 'e' | 'E'))
            {
                index += 1;
            }
            spans.push(Span::styled(
                chars[start..index].iter().collect::<String>(),
                Style::default().fg(Color::Rgb(251, 146, 60)),
            ));
            continue;
        }

        if chars[index..].starts_with(&['t', 'r', 'u', 'e'])
            || chars[index..].starts_with(&['f', 'a', 'l', 's', 'e'])
        {
            let start = index;
            while index < chars.len() && chars[index].is_ascii_alphabetic() {
                index += 1;
            }
            spans.push(Span::styled(
                chars[start..index].iter().collect::<String>(),
                Style::default().fg(WARN),
            ));
            continue;
        }

        if chars[index..].starts_with(&['n', 'u', 'l', 'l']) {
            index += 4;
            spans.push(Span::styled("null", Style::default().fg(MUTED)));
            continue;
        }

        spans.push(Span::styled(
            ch.to_string(),
            Style::default().fg(Color::White),
        ));
        index += 1;
    }

    Line::from(spans)
}

fn read_json_string(chars: &[char], start: usize) -> (String, usize) {
    let mut index = start;
    let mut escaped = false;
    let mut token = String::new();
    while index < chars.len() {
        let ch = chars[index];
        token.push(ch);
        if index > start {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                return (token, index + 1);
            }
        }
        index += 1;
    }
    (token, chars.len())
}

pub fn render_metric_gauge(frame: &mut Frame, area: Rect, label: &str, percent: f32, color: Color) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let split = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(10), Constraint::Min(1)])
        .split(area);
    frame.render_widget(
        Paragraph::new(label.to_string()).style(
            Style::default()
                .fg(Color::Rgb(94, 234, 212))
                .add_modifier(Modifier::BOLD),
        ),
        split[0],
    );

    let bar_width = split[1].width as usize;
    if bar_width == 0 {
        return;
    }

    let percent = percent.clamp(0.0, 100.0);
    let mut filled = (bar_width as f32 * percent / 100.0) as usize;
    if percent > 0.0 && filled == 0 {
        filled = 1;
    }
    let meter_text = format!("{percent:>6.2}%");
    let meter_chars = meter_text.chars().collect::<Vec<_>>();
    let text_start = bar_width.saturating_sub(meter_chars.len()) / 2;
    let text_end = text_start.saturating_add(meter_chars.len());

    let mut spans = Vec::with_capacity(bar_width);
    for idx in 0..bar_width {
        let is_filled = idx < filled;
        let bg = if is_filled {
            color
        } else {
            Color::Rgb(30, 41, 59)
        };
        let is_text_cell = idx >= text_start && idx < text_end;
        let ch = if is_text_cell {
            meter_chars[idx - text_start]
        } else {
            ' '
        };
        let fg = if is_filled {
            Color::Rgb(9, 15, 25)
        } else {
            Color::Rgb(148, 163, 184)
        };
        let mut style = Style::default().fg(fg).bg(bg);
        if is_text_cell {
            style = style.add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(ch.to_string(), style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(PANEL)),
        split[1],
    );
}

pub fn percent_color(percent: f32) -> Color {
    if percent >= 90.0 {
        ERROR
    } else if percent >= 70.0 {
        WARN
    } else {
        ACCENT
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

pub fn centered_paragraph(frame: &mut Frame, area: Rect, text: Text<'static>) {
    let height = (text.lines.len() as u16).min(area.height);
    let top = area.height.saturating_sub(height) / 2;
    let target = Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height,
    };
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        target,
    );
}

pub fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

pub fn format_bytes_compact(bytes: u64) -> String {
    const UNITS: [(&str, u64); 6] = [
        ("Ei", 1_152_921_504_606_846_976),
        ("Pi", 1_125_899_906_842_624),
        ("Ti", 1_099_511_627_776),
        ("Gi", 1_073_741_824),
        ("Mi", 1_048_576),
        ("Ki", 1_024),
    ];

    if bytes == 0 {
        return "0B".to_string();
    }

    for (suffix, unit) in UNITS {
        if bytes >= unit {
            let whole = bytes / unit;
            let decimal = ((bytes % unit) * 10) / unit;
            if decimal == 0 {
                return format!("{whole}{suffix}");
            }
            return format!("{whole}.{decimal}{suffix}");
        }
    }

    format!("{bytes}B")
}

#[cfg(test)]
mod tests {
    use super::{compact_text, format_bytes_compact, pretty_json, render};
    use crate::app::App;
    use crate::message::Message;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn shows_placeholder_until_first_resize() {
        let app = App::new();
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).expect("test terminal");
        terminal
            .draw(|frame| render(frame, &app))
            .expect("draw should succeed");
        assert!(buffer_text(&terminal).contains("Initializing..."));
    }

    #[test]
    fn renders_tab_header_after_resize() {
        let mut app = App::new();
        let _ = app.update(Message::Resize {
            width: 120,
            height: 30,
        });
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).expect("test terminal");
        terminal
            .draw(|frame| render(frame, &app))
            .expect("draw should succeed");
        let text = buffer_text(&terminal);
        for title in ["Dashboard", "HTTP", "Git", "Docker", "Kind", "Nvim"] {
            assert!(text.contains(title), "missing tab {title}");
        }
        assert!(text.contains("PHANTOM"));
    }

    #[test]
    fn pretty_json_reindents_and_rejects_plain_text() {
        let text = pretty_json("{\"a\":1,\"b\":[true,null]}").expect("valid json");
        let rendered = text
            .lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>();
        assert_eq!(rendered[0], "{");
        assert_eq!(rendered[1], "  \"a\": 1,");
        assert!(rendered.iter().any(|line| line.contains("null")));
        assert!(pretty_json("not json").is_none());
    }

    #[test]
    fn compact_text_truncates_with_ellipsis() {
        assert_eq!(compact_text("abcdef", 4), "abc…");
        assert_eq!(compact_text("abc", 4), "abc");
    }

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(format_bytes_compact(0), "0B");
        assert_eq!(format_bytes_compact(1536), "1.5Ki");
        assert_eq!(format_bytes_compact(3 * 1_073_741_824), "3Gi");
    }
}
