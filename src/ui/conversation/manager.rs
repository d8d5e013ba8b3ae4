use crate::config::UiConfig;
use crate::conversation::ConversationId;
use crate::events::{Action, StateChange};
use crate::session::{SendRejected, SessionManager};
use crate::streaming::PendingReply;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, ConversationSidebar,
    ParsedCommand, SlashCommand, StreamingIndicator,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tokio::sync::broadcast::{self, error::TryRecvError};

const SCROLL_STEP: usize = 5;

/// Actions that can be requested by the conversation manager
pub enum ConversationAction {
    None,
    /// A send was accepted; the caller feeds this reply back into the session
    StartReply(PendingReply),
    Exit,
}

/// Presentation state around the session: composer, scrollback, status line
pub struct ConversationManager {
    composer: ConversationComposer,
    indicator: StreamingIndicator,
    ui: UiConfig,
    scroll_offset: usize,
    show_help: bool,
}

impl ConversationManager {
    pub fn new(ui: UiConfig) -> Self {
        Self {
            composer: ConversationComposer::new("Ask a question about your college..."),
            indicator: StreamingIndicator::new(),
            ui,
            scroll_offset: 0,
            show_help: false,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent, session: &mut SessionManager) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return ConversationAction::Exit,
            KeyCode::Char('n') if ctrl => {
                session.dispatch(Action::NewConversation);
                return ConversationAction::None;
            }
            KeyCode::Up if ctrl => {
                let id = session.neighbour_id(-1).clone();
                session.dispatch(Action::SelectConversation(id));
                return ConversationAction::None;
            }
            KeyCode::Down if ctrl => {
                let id = session.neighbour_id(1).clone();
                session.dispatch(Action::SelectConversation(id));
                return ConversationAction::None;
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(SCROLL_STEP);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
                return ConversationAction::None;
            }
            _ => {}
        }

        // Any key dismisses the help overlay; Esc only dismisses
        if self.show_help {
            self.set_help(false);
            if key.code == KeyCode::Esc {
                return ConversationAction::None;
            }
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => self.handle_input(&input, session),
            ComposerResult::Command(command) => self.handle_slash_command(command, session),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// Try to send; the composer keeps its text when the send is rejected
    fn handle_input(&mut self, input: &str, session: &mut SessionManager) -> ConversationAction {
        match session.begin_send(input) {
            Ok(reply) => {
                self.composer.clear();
                self.scroll_offset = 0;
                ConversationAction::StartReply(reply)
            }
            Err(SendRejected::Busy) => {
                self.indicator.notify("Still answering the previous question, please wait");
                ConversationAction::None
            }
            Err(SendRejected::EmptyInput) => ConversationAction::None,
        }
    }

    fn set_help(&mut self, visible: bool) {
        self.show_help = visible;
        self.composer.set_focus(!visible);
    }

    /// Drain pending session changes into the view
    pub fn process_changes(
        &mut self,
        changes: &mut broadcast::Receiver<StateChange>,
        session: &SessionManager,
    ) {
        loop {
            match changes.try_recv() {
                Ok(change) => self.apply_change(&change),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "state change feed lagged, resyncing view");
                    self.resync(session);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn apply_change(&mut self, change: &StateChange) {
        match change {
            StateChange::ActiveChanged(_) => self.scroll_offset = 0,
            StateChange::LoadingChanged(true) => self.indicator.start(),
            StateChange::LoadingChanged(false) => self.indicator.stop(),
            StateChange::UseRagChanged(enabled) => {
                let state = if *enabled { "on" } else { "off" };
                self.indicator.notify(format!("Document retrieval {state}"));
            }
            StateChange::ConversationCreated(_)
            | StateChange::ConversationDeleted(_)
            | StateChange::MessagesChanged(_)
            | StateChange::TitleChanged(_) => {}
        }
    }

    /// Rebuild view state from the session after missed changes
    fn resync(&mut self, session: &SessionManager) {
        self.scroll_offset = 0;
        match (session.is_loading(), self.indicator.is_active()) {
            (true, false) => self.indicator.start(),
            (false, true) => self.indicator.stop(),
            _ => {}
        }
    }

    /// Handle slash commands
    fn handle_slash_command(
        &mut self,
        command: ParsedCommand,
        session: &mut SessionManager,
    ) -> ConversationAction {
        if session.is_loading() && !command.command.available_during_streaming() {
            self.indicator
                .notify(format!("/{} is unavailable while a reply is streaming", command.command.command()));
            return ConversationAction::None;
        }

        match command.command {
            SlashCommand::New => {
                session.dispatch(Action::NewConversation);
            }
            SlashCommand::Switch => match Self::target_id(&command, session) {
                Some(id) => {
                    session.dispatch(Action::SelectConversation(id));
                }
                None => self.indicator.notify("Usage: /switch <n> with n from the chat list"),
            },
            SlashCommand::Delete => {
                let target = match command.argument() {
                    None => Some(session.active_id().clone()),
                    Some(_) => Self::target_id(&command, session),
                };
                match target {
                    Some(id) => {
                        if !session.dispatch(Action::DeleteConversation(id)) {
                            self.indicator.notify("The last conversation can't be deleted");
                        }
                    }
                    None => self.indicator.notify("Usage: /delete [n]"),
                }
            }
            SlashCommand::Rag => {
                let enabled = match (command.argument(), command.toggle_target()) {
                    (None, _) => Some(!session.use_rag()),
                    (Some(_), target) => target,
                };
                match enabled {
                    Some(enabled) => {
                        if !session.dispatch(Action::SetUseRag(enabled)) {
                            let state = if enabled { "on" } else { "off" };
                            self.indicator.notify(format!("Document retrieval is already {state}"));
                        }
                    }
                    None => self.indicator.notify("Usage: /rag [on|off]"),
                }
            }
            SlashCommand::Help => self.set_help(true),
            SlashCommand::Quit => return ConversationAction::Exit,
        }

        ConversationAction::None
    }

    /// Sidebar position given as the command argument, resolved to an id
    fn target_id(command: &ParsedCommand, session: &SessionManager) -> Option<ConversationId> {
        command
            .index_target()
            .and_then(|index| session.id_at(index))
            .cloned()
    }

    /// Render the conversation UI components
    pub fn render(&self, frame: &mut Frame, session: &SessionManager) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(self.ui.sidebar_width),
                Constraint::Min(20),
            ])
            .split(frame.size());

        frame.render_widget(
            ConversationSidebar::new(session.conversations(), session.active_index())
                .streaming(session.streaming_conversation()),
            columns[0],
        );

        let composer_height = self.composer.desired_height(8);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(composer_height),
            ])
            .split(columns[1]);

        let active = session.active();
        let streaming_here = session.streaming_conversation() == Some(&active.id);

        if self.show_help {
            let help = Paragraph::new(get_help_text())
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title("❓ Help (Esc to close)"));
            frame.render_widget(help, rows[0]);
        } else {
            frame.render_widget(
                ConversationHistory::new(active)
                    .streaming(streaming_here)
                    .show_timestamps(self.ui.show_timestamps)
                    .scroll_offset(self.scroll_offset),
                rows[0],
            );
        }

        frame.render_widget(
            self.indicator.line(session.backend_url(), session.use_rag()),
            rows[1],
        );
        frame.render_widget(&self.composer, rows[2]);
    }

    pub fn is_thinking(&self) -> bool {
        self.indicator.is_active()
    }
}
