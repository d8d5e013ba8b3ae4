use crate::conversation::{Conversation, ConversationId};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

/// Conversation list, newest first, with the active entry highlighted
pub struct ConversationSidebar<'a> {
    conversations: &'a [Conversation],
    active_index: usize,
    streaming: Option<&'a ConversationId>,
}

impl<'a> ConversationSidebar<'a> {
    pub fn new(conversations: &'a [Conversation], active_index: usize) -> Self {
        Self {
            conversations,
            active_index,
            streaming: None,
        }
    }

    /// Conversation currently receiving a reply, marked with a dot
    pub fn streaming(mut self, id: Option<&'a ConversationId>) -> Self {
        self.streaming = id;
        self
    }
}

impl Widget for ConversationSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let items: Vec<ListItem> = self
            .conversations
            .iter()
            .enumerate()
            .map(|(index, conversation)| {
                let marker = if Some(&conversation.id) == self.streaming { "● " } else { "  " };
                let count = conversation.messages.len();
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>2}", index + 1), Style::default().fg(Color::DarkGray)),
                    Span::styled(marker, Style::default().fg(Color::Yellow)),
                    Span::raw(conversation.title.clone()),
                    Span::styled(format!(" ({count})"), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("🗂  Chats"))
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );

        let mut state = ListState::default().with_selected(Some(self.active_index));
        StatefulWidget::render(list, area, buf, &mut state);
    }
}
