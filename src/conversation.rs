pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Normal,
    /// Transient placeholder, removed when its owning request resolves.
    Typing,
    Error,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub kind: MessageKind,
    pub text: String,
}

/// Append-only chat log. Insertion order is display order; transient
/// entries are addressed by id so removal stays idempotent.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: MessageId,
    typing_id: Option<MessageId>,
}

/// Strip control characters so remote text cannot emit terminal escapes.
/// Newlines and tabs survive; everything else in the control range is dropped.
pub(crate) fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, role: Role, kind: MessageKind, text: &str) -> MessageId {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            kind,
            text: sanitize(text),
        });
        id
    }

    pub fn push_user(&mut self, text: &str) -> MessageId {
        self.push(Role::User, MessageKind::Normal, text)
    }

    pub fn push_assistant(&mut self, text: &str) -> MessageId {
        self.push(Role::Assistant, MessageKind::Normal, text)
    }

    pub fn push_error(&mut self, text: &str) -> MessageId {
        self.push(Role::Assistant, MessageKind::Error, text)
    }

    /// Append a transient placeholder entry. The caller keeps the id and
    /// removes it when the work it stands for resolves.
    pub fn push_placeholder(&mut self, label: &str) -> MessageId {
        self.push(Role::Assistant, MessageKind::Typing, label)
    }

    /// Show the typing indicator for an in-flight question. At most one
    /// exists at a time; calling again while present is a no-op.
    pub fn begin_typing(&mut self) {
        if self.typing_id.is_none() {
            let id = self.push_placeholder("Thinking");
            self.typing_id = Some(id);
        }
    }

    /// Remove the typing indicator. Safe to call on every resolution path;
    /// does nothing when the indicator is already gone.
    pub fn clear_typing(&mut self) {
        if let Some(id) = self.typing_id.take() {
            self.remove(id);
        }
    }

    pub fn has_typing(&self) -> bool {
        self.typing_id.is_some()
    }

    /// Remove a message by id. Returns false when no such message exists,
    /// which callers treat as an already-handled removal.
    pub fn remove(&mut self, id: MessageId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// Start a fresh conversation. Any live placeholder entry is dropped
    /// with the rest of the log; later removals of its id are no-ops.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.typing_id = None;
    }
}
