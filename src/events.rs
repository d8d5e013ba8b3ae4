use crate::conversation::ConversationId;

/// Requests the presentation layer can dispatch to the session manager
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Start a fresh conversation and make it active
    NewConversation,

    /// Make an existing conversation active
    SelectConversation(ConversationId),

    /// Remove a conversation (ignored for the last remaining one)
    DeleteConversation(ConversationId),

    /// Toggle retrieval-augmented context for subsequent requests
    SetUseRag(bool),
}

/// Events emitted by a reply stream, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Backend accepted the request and the body started
    Opened,

    /// Decoded text from the body
    Chunk(String),

    /// Body finished
    Closed,

    /// Request or body read failed; carries the diagnostic detail
    Failed(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Closed | StreamEvent::Failed(_))
    }
}

/// Change notifications broadcast to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    ConversationCreated(ConversationId),
    ConversationDeleted(ConversationId),
    ActiveChanged(ConversationId),
    MessagesChanged(ConversationId),
    TitleChanged(ConversationId),
    LoadingChanged(bool),
    UseRagChanged(bool),
}
