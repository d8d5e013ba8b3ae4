use crate::backend::BackendClient;
use crate::config::Config;
use crate::events::StreamEvent;
use crate::session::SessionManager;
use crate::streaming::PendingReply;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::time::{interval, Duration};

const TICK_RATE: Duration = Duration::from_millis(250);

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive chat until the user quits
pub async fn run(config: Config) -> Result<()> {
    let backend = BackendClient::new(&config).context("Failed to create backend client")?;
    let mut session = SessionManager::new(Arc::new(backend), config.use_rag);
    let mut manager = ConversationManager::new(config.ui.clone());

    tracing::info!(backend = %config.backend_url, use_rag = config.use_rag, "starting chat ui");

    // setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err).context("Failed to enter alternate screen");
    }

    let result = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(mut terminal) => {
            let result = event_loop(&mut terminal, &mut session, &mut manager).await;
            restore_terminal(&mut terminal);
            result
        }
        Err(err) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            Err(err).context("Failed to initialize terminal")
        }
    };

    tracing::info!("chat ui closed");
    result
}

fn restore_terminal(terminal: &mut Term) {
    if let Err(err) = disable_raw_mode() {
        tracing::warn!(error = %err, "failed to disable raw mode");
    }
    if let Err(err) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
        tracing::warn!(error = %err, "failed to leave alternate screen");
    }
    let _ = terminal.show_cursor();
}

async fn event_loop(
    terminal: &mut Term,
    session: &mut SessionManager,
    manager: &mut ConversationManager,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = interval(TICK_RATE);
    let mut changes = session.subscribe();
    let mut reply: Option<PendingReply> = None;

    loop {
        manager.process_changes(&mut changes, session);
        terminal
            .draw(|frame| manager.render(frame, session))
            .context("Failed to draw frame")?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => match manager.handle_key(key, session) {
                    ConversationAction::Exit => break,
                    ConversationAction::StartReply(pending) => reply = Some(pending),
                    ConversationAction::None => {}
                },
                // resizes are picked up by the next draw
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    abort(session, reply.take());
                    return Err(err).context("Failed to read terminal event");
                }
                None => break,
            },
            event = next_reply_event(&mut reply) => {
                match event {
                    Some(event) => {
                        let terminal_event = event.is_terminal();
                        session.apply_stream_event(event);
                        if terminal_event {
                            reply = None;
                        }
                    }
                    None => {
                        if session.is_loading() {
                            session.apply_stream_event(StreamEvent::Failed(
                                "reply task ended without closing the stream".to_string(),
                            ));
                        }
                        reply = None;
                    }
                }
            },
            _ = tick.tick() => {}
        }
    }

    abort(session, reply.take());
    Ok(())
}

async fn next_reply_event(reply: &mut Option<PendingReply>) -> Option<StreamEvent> {
    match reply {
        Some(reply) => reply.next_event().await,
        None => std::future::pending().await,
    }
}

fn abort(session: &mut SessionManager, reply: Option<PendingReply>) {
    if let Some(reply) = reply {
        session.abort_reply(&reply);
    }
}
