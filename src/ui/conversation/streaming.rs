use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::time::{Duration, Instant};

const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Status line: a thinking indicator while a reply streams, otherwise
/// transient notices and the backend settings
#[derive(Debug, Clone)]
pub struct StreamingIndicator {
    started_at: Option<Instant>,
    notice: Option<(String, Instant)>,
}

impl StreamingIndicator {
    pub fn new() -> Self {
        Self {
            started_at: None,
            notice: None,
        }
    }

    /// Start the thinking animation
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Show a short-lived message, e.g. "please wait"
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some((message.into(), Instant::now()));
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|(_, at)| at.elapsed() < NOTICE_TTL)
            .map(|(message, _)| message.as_str())
    }

    /// Widget for the current frame
    pub fn line<'a>(&'a self, backend_url: &'a str, use_rag: bool) -> StatusLine<'a> {
        StatusLine {
            indicator: self,
            backend_url,
            use_rag,
        }
    }
}

impl Default for StreamingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StatusLine<'a> {
    indicator: &'a StreamingIndicator,
    backend_url: &'a str,
    use_rag: bool,
}

impl Widget for StatusLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let line = if let Some(started_at) = self.indicator.started_at {
            let elapsed = started_at.elapsed();
            let dots = match (elapsed.as_millis() / 300) % 4 {
                0 => ".",
                1 => "..",
                2 => "...",
                _ => "   ",
            };
            let mut spans = vec![
                Span::styled("🤖 CollegeGPT is thinking", Style::default().fg(Color::Green)),
                Span::styled(dots, Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("  {}s", elapsed.as_secs()),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if let Some(notice) = self.indicator.notice() {
                spans.push(Span::styled(format!("  ⚠️ {notice}"), Style::default().fg(Color::Yellow)));
            }
            Line::from(spans)
        } else if let Some(notice) = self.indicator.notice() {
            Line::from(vec![Span::styled(format!("ℹ️ {notice}"), Style::default().fg(Color::Yellow))])
        } else {
            let rag = if self.use_rag { "on" } else { "off" };
            Line::from(vec![
                Span::styled(format!("🔗 {}", self.backend_url), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("  📚 RAG {rag}"), Style::default().fg(Color::DarkGray)),
                Span::styled("  /help for commands", Style::default().fg(Color::DarkGray)),
            ])
        };

        buf.set_line(area.x, area.y, &line, area.width);
    }
}
