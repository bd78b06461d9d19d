use anyhow::{Result, bail};
use std::fmt::{Display, Formatter};

pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Exact match against the method names; anything else is `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == token)
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|method| *method == self)
            .unwrap_or(0)
    }

    pub fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let next = (self.index() as isize + delta).rem_euclid(len) as usize;
        Self::ALL[next]
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A saved request: either a template from the config file or a history entry.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RequestItem {
    pub name: String,
    pub method: String,
    pub url: String,
    pub headers: String,
    pub body: String,
}

impl RequestItem {
    pub fn title(&self) -> String {
        format!("{} {}", self.method, self.name)
    }
}

/// The request handed to curl, after placeholder substitution.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RequestField {
    Method,
    Url,
    Headers,
    Body,
}

impl RequestField {
    pub const ALL: [Self; 4] = [Self::Method, Self::Url, Self::Headers, Self::Body];

    pub fn index(self) -> usize {
        match self {
            Self::Method => 0,
            Self::Url => 1,
            Self::Headers => 2,
            Self::Body => 3,
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        Self::ALL[(self.index() as isize + delta).rem_euclid(len) as usize]
    }

    pub fn is_text(self) -> bool {
        !matches!(self, Self::Method)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ResponseView {
    #[default]
    Pretty,
    Raw,
    Headers,
}

impl ResponseView {
    pub const ALL: [Self; 3] = [Self::Pretty, Self::Raw, Self::Headers];

    pub fn title(self) -> &'static str {
        match self {
            Self::Pretty => "Pretty",
            Self::Raw => "Raw",
            Self::Headers => "Headers",
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let index = Self::ALL.iter().position(|view| *view == self).unwrap_or(0);
        let len = Self::ALL.len() as isize;
        Self::ALL[(index as isize + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: String,
    pub body: String,
}

impl HttpResponse {
    /// Splits `curl -i` output into the last header block and the body.
    ///
    /// With `-L` or a `100 Continue` preamble curl prints several status
    /// blocks back to back; only the final one describes the body. Schemes
    /// without a status line (`file://`, `ftp://`) split on the first blank
    /// line and report 200.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(mut start) = find_status_line(raw) else {
            let Some((header_end, body_start)) = find_blank_line(raw) else {
                bail!("failed to parse HTTP response: missing header terminator\n{raw}");
            };
            return Ok(Self {
                status: 200,
                headers: raw[..header_end].to_string(),
                body: raw[body_start..].to_string(),
            });
        };

        let Some((mut header_end, mut body_start)) = find_blank_line(&raw[start..]) else {
            bail!("failed to parse HTTP response: missing header terminator\n{raw}");
        };
        loop {
            let next = start + body_start;
            if is_status_line(&raw[next..])
                && let Some((next_header_end, next_body_start)) = find_blank_line(&raw[next..])
            {
                start = next;
                header_end = next_header_end;
                body_start = next_body_start;
                continue;
            }

            let headers = &raw[start..start + header_end];
            return Ok(Self {
                status: parse_status_code(headers).unwrap_or(200),
                headers: headers.to_string(),
                body: raw[next..].to_string(),
            });
        }
    }
}

/// `HTTP/<version> <three digit code>` at the start of `text`.
fn is_status_line(text: &str) -> bool {
    let Some(line) = text.lines().next() else {
        return false;
    };
    let mut parts = line.split_whitespace();
    let version_ok = parts
        .next()
        .is_some_and(|version| version.starts_with("HTTP/"));
    let code_ok = parts
        .next()
        .is_some_and(|code| code.len() == 3 && code.bytes().all(|byte| byte.is_ascii_digit()));
    version_ok && code_ok
}

fn find_status_line(raw: &str) -> Option<usize> {
    std::iter::once(0)
        .chain(raw.match_indices('\n').map(|(index, _)| index + 1))
        .find(|index| is_status_line(&raw[*index..]))
}

/// Returns (end of headers, start of body) relative to `block`.
fn find_blank_line(block: &str) -> Option<(usize, usize)> {
    let crlf = block.find("\r\n\r\n").map(|index| (index, index + 4));
    let lf = block.find("\n\n").map(|index| (index, index + 2));
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_status_code(headers: &str) -> Option<u16> {
    let status_line = headers.lines().next()?;
    let mut parts = status_line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Newest-first, bounded request history.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<RequestItem>,
}

impl History {
    pub fn push(&mut self, item: RequestItem) {
        self.entries.insert(0, item);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn entries(&self) -> &[RequestItem] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClusterJobKind {
    Refresh,
    /// Automatic list refresh after a create or delete.
    Sync,
    Create,
    Delete,
    Describe,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClusterJob {
    pub kind: ClusterJobKind,
    pub title: String,
}

impl ClusterJob {
    pub fn new(kind: ClusterJobKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSnapshot {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    pub processes: Vec<ProcessRow>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProcessRow {
    pub name: String,
    pub pid: u32,
    pub memory_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::{HISTORY_LIMIT, History, HttpMethod, HttpResponse, RequestField, RequestItem};

    fn item(name: &str) -> RequestItem {
        RequestItem {
            name: name.to_string(),
            method: "GET".to_string(),
            url: format!("https://example.com/{name}"),
            ..RequestItem::default()
        }
    }

    #[test]
    fn parses_single_response() {
        let parsed = HttpResponse::parse(
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\n\r\nnot found",
        )
        .expect("response should parse");
        assert_eq!(parsed.status, 404);
        assert_eq!(
            parsed.headers,
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain"
        );
        assert_eq!(parsed.body, "not found");
    }

    #[test]
    fn keeps_only_final_status_block() {
        let raw = "HTTP/1.1 100 Continue\r\n\r\n\
                   HTTP/1.1 301 Moved Permanently\r\nLocation: /next\r\n\r\n\
                   HTTP/2 201\r\ncontent-type: application/json\r\n\r\n{\"ok\":true}";
        let parsed = HttpResponse::parse(raw).expect("response should parse");
        assert_eq!(parsed.status, 201);
        assert_eq!(parsed.headers, "HTTP/2 201\r\ncontent-type: application/json");
        assert_eq!(parsed.body, "{\"ok\":true}");
    }

    #[test]
    fn body_lines_starting_with_http_are_not_status_blocks() {
        let raw = "HTTP/1.1 200 OK\r\n\r\nline one\r\n\r\nHTTP/ is text here";
        let parsed = HttpResponse::parse(raw).expect("response should parse");
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.body, "line one\r\n\r\nHTTP/ is text here");
    }

    #[test]
    fn body_starting_with_http_version_stays_in_body() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nHTTP/1.1 is a protocol";
        let parsed = HttpResponse::parse(raw).expect("response should parse");
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.headers, "HTTP/1.1 200 OK\r\nContent-Type: text/plain");
        assert_eq!(parsed.body, "HTTP/1.1 is a protocol");
    }

    #[test]
    fn status_like_body_without_terminator_stays_in_body() {
        let raw = "HTTP/1.1 200 OK\r\n\r\nHTTP/1.1 404 Not Found";
        let parsed = HttpResponse::parse(raw).expect("response should parse");
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.body, "HTTP/1.1 404 Not Found");
    }

    #[test]
    fn output_without_status_line_defaults_to_200() {
        let parsed =
            HttpResponse::parse("Content-Length: 5\r\nAccept-ranges: bytes\r\n\r\nhello")
                .expect("response should parse");
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.headers, "Content-Length: 5\r\nAccept-ranges: bytes");
        assert_eq!(parsed.body, "hello");
    }

    #[test]
    fn unparsable_status_defaults_to_200() {
        let parsed =
            HttpResponse::parse("HTTP/weird\r\nX: y\r\n\r\nbody").expect("response should parse");
        assert_eq!(parsed.status, 200);
    }

    #[test]
    fn missing_terminator_is_an_error() {
        assert!(HttpResponse::parse("HTTP/1.1 200 OK\r\nX: y").is_err());
        assert!(HttpResponse::parse("no blank line anywhere").is_err());
    }

    #[test]
    fn history_is_bounded_and_newest_first() {
        let mut history = History::default();
        for index in 0..HISTORY_LIMIT {
            history.push(item(&format!("r{index}")));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[HISTORY_LIMIT - 1].name, "r0");

        history.push(item("newest"));
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].name, "newest");
        assert_eq!(history.entries()[HISTORY_LIMIT - 1].name, "r1");
        assert!(history.entries().iter().all(|entry| entry.name != "r0"));
    }

    #[test]
    fn method_lookup_is_exact() {
        assert_eq!(HttpMethod::from_token("PATCH"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::from_token("patch"), None);
        assert_eq!(HttpMethod::Get.cycle(-1), HttpMethod::Options);
        assert_eq!(HttpMethod::Options.cycle(1), HttpMethod::Get);
    }

    #[test]
    fn request_field_cycles_within_four_slots() {
        assert_eq!(RequestField::Body.cycle(1), RequestField::Method);
        assert_eq!(RequestField::Method.cycle(-1), RequestField::Body);
        assert!(RequestField::ALL.iter().all(|field| field.index() < 4));
    }
}
