//! Transcript display component

use crate::conversation::{Conversation, Message, Role};
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};

/// Transcript of one conversation, bottom-anchored with an optional scroll offset
pub struct ConversationHistory<'a> {
    conversation: &'a Conversation,
    streaming: bool,
    show_timestamps: bool,
    /// Lines scrolled up from the bottom
    scroll_offset: usize,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(conversation: &'a Conversation) -> Self {
        Self {
            conversation,
            streaming: false,
            show_timestamps: true,
            scroll_offset: 0,
        }
    }

    /// Mark the trailing assistant message as still streaming
    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn show_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    pub fn scroll_offset(mut self, offset: usize) -> Self {
        self.scroll_offset = offset;
        self
    }

    /// All rendered lines for `width` columns
    pub fn lines(&self, width: u16) -> Vec<Line<'a>> {
        let mut all_lines = Vec::new();
        let count = self.conversation.messages.len();

        for (index, message) in self.conversation.messages.iter().enumerate() {
            let in_progress = self.streaming && index + 1 == count && message.role == Role::Assistant;
            all_lines.extend(self.render_message(message, width, in_progress));
            all_lines.push(Line::default());
        }

        all_lines
    }

    /// Render a single message into lines
    fn render_message(&self, message: &'a Message, width: u16, in_progress: bool) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        let (icon, header_style) = match message.role {
            Role::User => ("👤", Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)),
            Role::Assistant => ("🤖", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        };

        let mut header = vec![Span::styled(format!("{icon} {}", message.role.display_name()), header_style)];
        if self.show_timestamps {
            let timestamp = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
            header.push(Span::styled(format!("  {timestamp}"), Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(header));

        let style = content_style(message.role);
        let content_lines = wrap_text(&message.content, width.saturating_sub(2) as usize);
        let last = content_lines.len().saturating_sub(1);
        for (i, content_line) in content_lines.into_iter().enumerate() {
            let mut spans = vec![Span::raw("  "), Span::styled(content_line, style)];
            if in_progress && i == last {
                spans.push(Span::styled("▋", Style::default().fg(Color::Yellow)));
            }
            lines.push(Line::from(spans));
        }

        lines
    }
}

/// Get content style based on role
fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::White),
        Role::Assistant => Style::default().fg(Color::Green),
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }

            // words longer than the line are hard-split
            let mut rest: Vec<char> = word.chars().collect();
            while rest.len() > width {
                if current_width > 0 {
                    lines.push(std::mem::take(&mut current_line));
                    current_width = 0;
                }
                let tail = rest.split_off(width);
                lines.push(rest.into_iter().collect());
                rest = tail;
            }

            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_width += rest.len();
            current_line.extend(rest);
        }

        lines.push(current_line);
    }

    lines
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("💬 {}", self.conversation.title));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.conversation.messages.is_empty() {
            let welcome_lines = [
                Line::from(vec![Span::styled("Welcome to CollegeGPT! 🎓", Style::default().fg(Color::Green))]),
                Line::default(),
                Line::from(vec![Span::styled(
                    "Ask about admissions, courses, deadlines or campus life.",
                    Style::default().fg(Color::Gray),
                )]),
                Line::default(),
                Line::from(vec![Span::styled(
                    "Press Enter to send, Shift+Enter for a new line, /help for commands.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let all_lines = self.lines(inner_area.width.saturating_sub(1));
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);
        let offset = self.scroll_offset.min(max_offset);
        let start = max_offset - offset;

        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }

        if max_offset > 0 {
            let mut state = ScrollbarState::new(max_offset).position(start);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(area, buf, &mut state);
        }
    }
}
