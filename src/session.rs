use crate::backend::{ChatBackend, ChatRequest};
use crate::conversation::{Conversation, ConversationId, Message};
use crate::events::{Action, StateChange, StreamEvent};
use crate::streaming::{spawn_reply, PendingReply, ReplyAccumulator};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

const CHANGE_BUFFER: usize = 128;

/// Text written in place of a reply when the backend cannot be reached
pub fn connection_error_message(base_url: &str) -> String {
    format!(
        "Sorry, I couldn't connect to the backend. Please make sure the server is running on {base_url}"
    )
}

/// Why a send was not started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyInput,
    #[error("a reply is still streaming, please wait")]
    Busy,
}

/// Reply currently being streamed into a conversation
#[derive(Debug)]
struct InFlight {
    conversation_id: ConversationId,
    accumulator: ReplyAccumulator,
    opened: bool,
}

/// Owns the conversation collection and drives one chat request at a time.
///
/// Invariants: the collection is never empty, `active_id` always names an
/// entry in it, and while a reply streams its assistant message is the last
/// message of the conversation it was sent from.
pub struct SessionManager {
    backend: Arc<dyn ChatBackend>,
    conversations: Vec<Conversation>,
    active_id: ConversationId,
    loading: bool,
    use_rag: bool,
    in_flight: Option<InFlight>,
    changes: broadcast::Sender<StateChange>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ChatBackend>, use_rag: bool) -> Self {
        let first = Conversation::new();
        let active_id = first.id.clone();
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);

        Self {
            backend,
            conversations: vec![first],
            active_id,
            loading: false,
            use_rag,
            in_flight: None,
            changes,
        }
    }

    /// Conversations, newest first
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn active_id(&self) -> &ConversationId {
        &self.active_id
    }

    pub fn active_index(&self) -> usize {
        self.conversations
            .iter()
            .position(|c| c.id == self.active_id)
            .unwrap_or(0)
    }

    pub fn active(&self) -> &Conversation {
        &self.conversations[self.active_index()]
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn use_rag(&self) -> bool {
        self.use_rag
    }

    pub fn backend_url(&self) -> &str {
        self.backend.base_url()
    }

    /// Conversation the in-flight reply is being written into
    pub fn streaming_conversation(&self) -> Option<&ConversationId> {
        self.in_flight.as_ref().map(|f| &f.conversation_id)
    }

    /// Change notifications; lagging receivers lose the oldest entries
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: StateChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    /// Apply a state-changing request; returns whether anything changed
    pub fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::NewConversation => {
                self.create_conversation();
                true
            }
            Action::SelectConversation(id) => self.select_conversation(&id),
            Action::DeleteConversation(id) => self.delete_conversation(&id),
            Action::SetUseRag(enabled) => self.set_use_rag(enabled),
        }
    }

    /// Insert an empty conversation at the front and make it active
    pub fn create_conversation(&mut self) -> ConversationId {
        let conversation = Conversation::new();
        let id = conversation.id.clone();
        self.conversations.insert(0, conversation);
        self.active_id = id.clone();

        tracing::debug!(conversation = %id, "created conversation");
        self.notify(StateChange::ConversationCreated(id.clone()));
        self.notify(StateChange::ActiveChanged(id.clone()));
        id
    }

    pub fn select_conversation(&mut self, id: &ConversationId) -> bool {
        if self.conversation(id).is_none() {
            return false;
        }
        if &self.active_id != id {
            self.active_id = id.clone();
            self.notify(StateChange::ActiveChanged(id.clone()));
        }
        true
    }

    /// Id at a position in the newest-first list
    pub fn id_at(&self, index: usize) -> Option<&ConversationId> {
        self.conversations.get(index).map(|c| &c.id)
    }

    /// Id `offset` entries away from the active one, clamped to the list bounds
    pub fn neighbour_id(&self, offset: isize) -> &ConversationId {
        let last = self.conversations.len() as isize - 1;
        let target = (self.active_index() as isize + offset).clamp(0, last);
        &self.conversations[target as usize].id
    }

    /// Remove a conversation; the last remaining one is never removed
    pub fn delete_conversation(&mut self, id: &ConversationId) -> bool {
        if self.conversations.len() <= 1 {
            tracing::debug!("refusing to delete the only conversation");
            return false;
        }
        let Some(position) = self.conversations.iter().position(|c| &c.id == id) else {
            return false;
        };

        self.conversations.remove(position);
        tracing::debug!(conversation = %id, "deleted conversation");
        self.notify(StateChange::ConversationDeleted(id.clone()));

        if &self.active_id == id {
            self.active_id = self.conversations[0].id.clone();
            self.notify(StateChange::ActiveChanged(self.active_id.clone()));
        }
        true
    }

    pub fn set_use_rag(&mut self, enabled: bool) -> bool {
        if self.use_rag == enabled {
            return false;
        }
        self.use_rag = enabled;
        self.notify(StateChange::UseRagChanged(enabled));
        true
    }

    /// Start sending `text` from the active conversation.
    ///
    /// Appends the user message, raises the loading flag and spawns the
    /// streaming request. Feed the returned reply's events back through
    /// [`apply_stream_event`](Self::apply_stream_event).
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime; the request runs on a
    /// task started with `tokio::spawn`.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingReply, SendRejected> {
        let query = text.trim();
        if query.is_empty() {
            tracing::debug!("ignoring empty message");
            return Err(SendRejected::EmptyInput);
        }
        if self.loading {
            tracing::debug!("ignoring message while a reply is streaming");
            return Err(SendRejected::Busy);
        }

        let index = self.active_index();
        let conversation = &mut self.conversations[index];
        let id = conversation.id.clone();
        let first_message = conversation.is_empty();
        conversation.push_user_message(query);

        self.notify(StateChange::MessagesChanged(id.clone()));
        if first_message {
            self.notify(StateChange::TitleChanged(id.clone()));
        }

        self.loading = true;
        self.in_flight = Some(InFlight {
            conversation_id: id.clone(),
            accumulator: ReplyAccumulator::new(),
            opened: false,
        });
        self.notify(StateChange::LoadingChanged(true));

        tracing::info!(conversation = %id, use_rag = self.use_rag, "sending message");
        let request = ChatRequest::new(query, Some(id.to_string()), self.use_rag);
        Ok(spawn_reply(Arc::clone(&self.backend), request, id))
    }

    /// Apply one reply event to the transcript
    pub fn apply_stream_event(&mut self, event: StreamEvent) {
        let Some(in_flight) = self.in_flight.as_mut() else {
            tracing::debug!(?event, "stream event with no reply in flight");
            return;
        };
        let id = in_flight.conversation_id.clone();
        let conversation = self.conversations.iter_mut().find(|c| c.id == id);

        match event {
            StreamEvent::Opened => {
                in_flight.opened = true;
                if let Some(conversation) = conversation {
                    conversation.messages.push(Message::assistant(""));
                    self.notify(StateChange::MessagesChanged(id));
                }
            }
            StreamEvent::Chunk(text) => {
                let current = in_flight.accumulator.push(&text);
                // Replace rather than append so the message always mirrors the accumulator
                let updated = match conversation.and_then(|c| c.last_assistant_mut()) {
                    Some(message) => {
                        message.content.clear();
                        message.content.push_str(current);
                        true
                    }
                    None => false,
                };
                if updated {
                    self.notify(StateChange::MessagesChanged(id));
                }
            }
            StreamEvent::Closed => {
                tracing::info!(
                    conversation = %id,
                    chunks = in_flight.accumulator.chunk_count(),
                    chars = in_flight.accumulator.text().chars().count(),
                    "reply complete"
                );
                self.finish_reply();
            }
            StreamEvent::Failed(detail) => {
                tracing::warn!(conversation = %id, %detail, "reply failed");
                let error = connection_error_message(self.backend.base_url());
                let opened = in_flight.opened;
                if let Some(conversation) = conversation {
                    match conversation.last_assistant_mut().filter(|_| opened) {
                        Some(message) => message.content = error,
                        None => conversation.messages.push(Message::assistant(error)),
                    }
                    self.notify(StateChange::MessagesChanged(id));
                }
                self.finish_reply();
            }
        }
    }

    fn finish_reply(&mut self) {
        self.in_flight = None;
        if self.loading {
            self.loading = false;
            self.notify(StateChange::LoadingChanged(false));
        }
    }

    /// Stop the in-flight reply, keeping whatever text already arrived
    pub fn abort_reply(&mut self, reply: &PendingReply) {
        reply.abort();
        if self.in_flight.is_some() {
            tracing::info!(conversation = %reply.conversation_id(), "reply aborted");
        }
        self.finish_reply();
    }

    /// Send `text` and stream the whole reply into the active conversation
    pub async fn send_message(&mut self, text: &str) -> Result<(), SendRejected> {
        let mut reply = self.begin_send(text)?;
        self.drive_reply(&mut reply).await;
        Ok(())
    }

    /// Apply events from `reply` until the stream closes or fails
    pub async fn drive_reply(&mut self, reply: &mut PendingReply) {
        while let Some(event) = reply.next_event().await {
            let terminal = event.is_terminal();
            self.apply_stream_event(event);
            if terminal {
                return;
            }
        }

        if self.loading {
            self.apply_stream_event(StreamEvent::Failed(
                "reply task ended without closing the stream".to_string(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatResponse, ChunkStream};
    use crate::conversation::{Role, DEFAULT_TITLE};
    use crate::error::BackendError;
    use async_trait::async_trait;
    use futures::StreamExt;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    const BASE_URL: &str = "http://localhost:8000";

    type Chunk = Result<Vec<u8>, BackendError>;

    enum Script {
        Chunks(Vec<Chunk>),
        Reject,
        Held(mpsc::UnboundedReceiver<Chunk>),
    }

    #[derive(Default)]
    struct FakeBackend {
        requests: Mutex<Vec<ChatRequest>>,
        scripts: Mutex<VecDeque<Script>>,
    }

    impl FakeBackend {
        fn with(scripts: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                scripts: Mutex::new(scripts.into()),
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        fn base_url(&self) -> &str {
            BASE_URL
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(ChatResponse {
                response: "ok".to_string(),
                context_used: None,
                session_id: request.session_id.clone().unwrap_or_default(),
            })
        }

        async fn chat_stream(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError> {
            self.requests.lock().unwrap().push(request.clone());
            let script = self.scripts.lock().unwrap().pop_front();
            match script {
                Some(Script::Chunks(chunks)) => Ok(futures::stream::iter(chunks).boxed()),
                Some(Script::Held(rx)) => Ok(futures::stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                })
                .boxed()),
                Some(Script::Reject) | None => Err(BackendError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: "connection refused".to_string(),
                }),
            }
        }
    }

    fn chunks(parts: &[&str]) -> Script {
        Script::Chunks(parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect())
    }

    fn manager(backend: &Arc<FakeBackend>) -> SessionManager {
        SessionManager::new(backend.clone(), true)
    }

    fn assert_active_exists(session: &SessionManager) {
        assert!(session.conversation(session.active_id()).is_some());
    }

    #[test]
    #[should_panic]
    fn begin_send_needs_a_runtime() {
        let mut session = manager(&FakeBackend::with(vec![chunks(&["never"])]));
        let _ = session.begin_send("hello");
    }

    #[test]
    fn starts_with_one_active_conversation() {
        let session = manager(&FakeBackend::with(vec![]));
        assert_eq!(session.conversations().len(), 1);
        assert_eq!(session.active().title, DEFAULT_TITLE);
        assert!(session.active().messages.is_empty());
        assert!(!session.is_loading());
    }

    #[test]
    fn create_inserts_at_front_and_activates() {
        let mut session = manager(&FakeBackend::with(vec![]));
        let first = session.active_id().clone();
        let second = session.create_conversation();

        assert_eq!(session.conversations()[0].id, second);
        assert_eq!(session.conversations()[1].id, first);
        assert_eq!(session.active_id(), &second);
    }

    #[test]
    fn select_unknown_is_noop() {
        let mut session = manager(&FakeBackend::with(vec![]));
        let first = session.active_id().clone();
        session.create_conversation();

        assert!(!session.select_conversation(&ConversationId::from("missing")));
        assert!(session.select_conversation(&first));
        assert_eq!(session.active_id(), &first);
    }

    #[test]
    fn deleting_only_conversation_is_noop() {
        let mut session = manager(&FakeBackend::with(vec![]));
        let only = session.active_id().clone();

        assert!(!session.delete_conversation(&only));
        assert_eq!(session.conversations().len(), 1);
        assert_eq!(session.active_id(), &only);
    }

    #[test]
    fn deleting_active_falls_back_to_first() {
        let mut session = manager(&FakeBackend::with(vec![]));
        let oldest = session.active_id().clone();
        let middle = session.create_conversation();
        let newest = session.create_conversation();
        session.select_conversation(&middle);

        assert!(session.delete_conversation(&middle));
        assert_eq!(session.active_id(), &newest);
        assert_eq!(session.conversations().len(), 2);

        // deleting a non-active entry leaves the selection alone
        assert!(session.delete_conversation(&oldest));
        assert_eq!(session.active_id(), &newest);
        assert!(!session.delete_conversation(&ConversationId::from("missing")));
    }

    #[test]
    fn active_always_exists_across_operations() {
        let mut session = manager(&FakeBackend::with(vec![]));
        for round in 0..20 {
            match round % 4 {
                0 | 1 => {
                    session.create_conversation();
                }
                2 => {
                    let id = session.active_id().clone();
                    session.delete_conversation(&id);
                }
                _ => {
                    let next = session.neighbour_id(1).clone();
                    assert!(session.select_conversation(&next));
                }
            }
            assert_active_exists(&session);
            assert!(!session.conversations().is_empty());
        }

        while session.conversations().len() > 1 {
            let id = session.conversations()[0].id.clone();
            assert!(session.delete_conversation(&id));
            assert_active_exists(&session);
        }
        let last = session.active_id().clone();
        assert!(!session.delete_conversation(&last));
    }

    #[test]
    fn position_lookups_clamp_to_the_list() {
        let mut session = manager(&FakeBackend::with(vec![]));
        session.create_conversation();
        session.create_conversation();
        let ids: Vec<ConversationId> = session.conversations().iter().map(|c| c.id.clone()).collect();

        assert_eq!(session.neighbour_id(-5), &ids[0]);
        assert_eq!(session.neighbour_id(10), &ids[2]);
        assert_eq!(session.id_at(1), Some(&ids[1]));
        assert_eq!(session.id_at(3), None);
    }

    #[tokio::test]
    async fn blank_input_never_mutates() {
        let backend = FakeBackend::with(vec![]);
        let mut session = manager(&backend);

        for text in ["", "   ", "\n\t "] {
            assert_eq!(session.send_message(text).await, Err(SendRejected::EmptyInput));
        }
        assert!(session.active().messages.is_empty());
        assert_eq!(session.active().title, DEFAULT_TITLE);
        assert!(backend.requests().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn streamed_reply_builds_assistant_message() {
        let backend = FakeBackend::with(vec![chunks(&["Hello", " world"])]);
        let mut session = manager(&backend);

        session.send_message("Hi there").await.unwrap();

        let messages = &session.active().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hi there");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hello world");
        assert!(!session.is_loading());

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "Hi there");
        assert_eq!(requests[0].session_id.as_deref(), Some(session.active_id().as_str()));
        assert!(requests[0].use_rag);
    }

    #[tokio::test]
    async fn rejected_request_leaves_single_error_message() {
        let backend = FakeBackend::with(vec![Script::Reject]);
        let mut session = manager(&backend);

        session.send_message("Is the registrar open?").await.unwrap();

        let messages = &session.active().messages;
        assert_eq!(messages.len(), 2);
        let assistants: Vec<_> = messages.iter().filter(|m| m.role == Role::Assistant).collect();
        assert_eq!(assistants.len(), 1);
        assert_eq!(assistants[0].content, connection_error_message(BASE_URL));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn mid_stream_failure_overwrites_partial_reply() {
        let backend = FakeBackend::with(vec![Script::Chunks(vec![
            Ok(b"Partial".to_vec()),
            Err(BackendError::Decode("connection reset".to_string())),
        ])]);
        let mut session = manager(&backend);

        session.send_message("Tell me about dorms").await.unwrap();

        let messages = &session.active().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, connection_error_message(BASE_URL));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn session_stays_usable_after_failure() {
        let backend = FakeBackend::with(vec![Script::Reject, chunks(&["Second try"])]);
        let mut session = manager(&backend);

        session.send_message("first").await.unwrap();
        session.send_message("second").await.unwrap();

        let messages = &session.active().messages;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3].content, "Second try");
    }

    #[tokio::test]
    async fn first_message_sets_title_once() {
        let backend = FakeBackend::with(vec![chunks(&["a"]), chunks(&["b"])]);
        let mut session = manager(&backend);
        let question = "What is the admission deadline for 2024?";

        session.send_message(question).await.unwrap();
        assert_eq!(session.active().title, question.chars().take(40).collect::<String>());

        session.send_message("And for transfer students applying later?").await.unwrap();
        assert_eq!(session.active().title, question);
    }

    #[tokio::test]
    async fn long_first_message_is_truncated_for_title() {
        let backend = FakeBackend::with(vec![chunks(&["ok"])]);
        let mut session = manager(&backend);
        let question = "Which scholarships are available for international graduate students?";

        session.send_message(question).await.unwrap();
        assert_eq!(session.active().title, &question[..40]);
    }

    #[tokio::test]
    async fn second_send_while_streaming_is_rejected() {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = FakeBackend::with(vec![Script::Held(rx)]);
        let mut session = manager(&backend);

        let mut reply = session.begin_send("first question").unwrap();
        assert!(session.is_loading());

        // the user switches chats and tries again; the guard is global
        session.create_conversation();
        assert_eq!(session.begin_send("second question").err(), Some(SendRejected::Busy));

        tx.send(Ok(b"answer".to_vec())).unwrap();
        drop(tx);
        session.drive_reply(&mut reply).await;

        assert_eq!(backend.requests().len(), 1);
        assert!(session.active().messages.is_empty());
        let original = &session.conversations()[1];
        let users = original.messages.iter().filter(|m| m.role == Role::User).count();
        assert_eq!(users, 1);
        assert_eq!(original.messages[1].content, "answer");
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn reply_lands_in_originating_conversation() {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = FakeBackend::with(vec![Script::Held(rx)]);
        let mut session = manager(&backend);
        let origin = session.active_id().clone();

        let mut reply = session.begin_send("question").unwrap();
        let other = session.create_conversation();
        assert_eq!(session.streaming_conversation(), Some(&origin));

        tx.send(Ok(b"reply".to_vec())).unwrap();
        drop(tx);
        session.drive_reply(&mut reply).await;

        assert!(session.conversation(&other).unwrap().messages.is_empty());
        let messages = &session.conversation(&origin).unwrap().messages;
        assert_eq!(messages.last().unwrap().content, "reply");
    }

    #[tokio::test]
    async fn deleting_streaming_conversation_drops_chunks() {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = FakeBackend::with(vec![Script::Held(rx)]);
        let mut session = manager(&backend);
        let origin = session.active_id().clone();

        let mut reply = session.begin_send("question").unwrap();
        session.create_conversation();
        assert!(session.delete_conversation(&origin));

        tx.send(Ok(b"lost".to_vec())).unwrap();
        drop(tx);
        session.drive_reply(&mut reply).await;

        assert_eq!(session.conversations().len(), 1);
        assert!(session.active().messages.is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn chunks_replace_content_with_running_text() {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = FakeBackend::with(vec![Script::Held(rx)]);
        let mut session = manager(&backend);

        let reply = session.begin_send("q").unwrap();
        session.apply_stream_event(StreamEvent::Opened);
        session.apply_stream_event(StreamEvent::Chunk("Hel".to_string()));
        session.apply_stream_event(StreamEvent::Chunk("lo".to_string()));
        assert_eq!(session.active().messages[1].content, "Hello");
        assert_eq!(session.active().messages.len(), 2);

        session.abort_reply(&reply);
        drop(tx);
        assert!(!session.is_loading());
        assert_eq!(session.active().messages[1].content, "Hello");
    }

    #[tokio::test]
    async fn split_utf8_chunks_reassemble() {
        let bytes = "Café ☕ hours".as_bytes().to_vec();
        let (head, tail) = bytes.split_at(4);
        let backend = FakeBackend::with(vec![Script::Chunks(vec![
            Ok(head.to_vec()),
            Ok(tail.to_vec()),
        ])]);
        let mut session = manager(&backend);

        session.send_message("coffee?").await.unwrap();
        assert_eq!(session.active().messages[1].content, "Café ☕ hours");
    }

    #[tokio::test]
    async fn use_rag_toggle_reaches_request() {
        let backend = FakeBackend::with(vec![chunks(&["ok"])]);
        let mut session = manager(&backend);

        assert!(session.dispatch(Action::SetUseRag(false)));
        assert!(!session.dispatch(Action::SetUseRag(false)));
        session.send_message("no context please").await.unwrap();

        assert!(!backend.requests()[0].use_rag);
    }

    #[tokio::test]
    async fn subscribers_observe_send_lifecycle() {
        let backend = FakeBackend::with(vec![chunks(&["done"])]);
        let mut session = manager(&backend);
        let mut changes = session.subscribe();
        let id = session.active_id().clone();

        session.send_message("hello").await.unwrap();

        let mut seen = Vec::new();
        while let Ok(change) = changes.try_recv() {
            seen.push(change);
        }
        assert_eq!(seen.first(), Some(&StateChange::MessagesChanged(id.clone())));
        assert!(seen.contains(&StateChange::TitleChanged(id.clone())));
        assert!(seen.contains(&StateChange::LoadingChanged(true)));
        assert_eq!(seen.last(), Some(&StateChange::LoadingChanged(false)));
    }

    #[tokio::test]
    async fn dispatch_routes_conversation_actions() {
        let mut session = manager(&FakeBackend::with(vec![]));
        let first = session.active_id().clone();

        assert!(session.dispatch(Action::NewConversation));
        assert_eq!(session.conversations().len(), 2);
        assert!(session.dispatch(Action::SelectConversation(first.clone())));
        assert!(session.dispatch(Action::DeleteConversation(first)));
        assert_eq!(session.conversations().len(), 1);
    }
}
