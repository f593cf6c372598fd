use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::api::{Backend, ChatRequest, Language};
use crate::guard::ResponseGuard;

/// Shown in place of a reply when the backend cannot be reached.
pub const CONNECTION_TROUBLE: &str = "Sorry, I'm having trouble connecting.";

/// Greeting that opens every transcript.
#[must_use]
pub fn welcome_message(language: Language) -> &'static str {
    match language {
        Language::En => "Hello! I'm SolveBot. How can I help you today?",
        Language::Hi => "नमस्ते! मैं सॉल्वबॉट हूँ। मैं आज आपकी कैसे मदद कर सकता हूँ?",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub is_definition: bool,
    pub word: Option<String>,
    pub videos: Vec<serde_json::Value>,
}

impl ChatMessage {
    fn user(text: impl Into<String>) -> Self {
        Self::plain(Sender::User, text)
    }

    fn bot(text: impl Into<String>) -> Self {
        Self::plain(Sender::Bot, text)
    }

    fn plain(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            is_definition: false,
            word: None,
            videos: Vec::new(),
        }
    }
}

/// What happened to a message passed to `ChatService::send`.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Replied(ChatMessage),
    /// The backend failed; the apology was appended instead.
    Failed(ChatMessage),
    /// Blank input, or a reply is still pending.
    Ignored,
    /// The language changed while waiting; the reply was dropped.
    Stale,
}

struct Transcript {
    language: Language,
    messages: Vec<ChatMessage>,
}

impl Transcript {
    fn fresh(language: Language) -> Self {
        Self {
            language,
            messages: vec![ChatMessage::bot(welcome_message(language))],
        }
    }
}

/// Chatbot transcript for one language at a time.
pub struct ChatService {
    backend: Arc<dyn Backend>,
    transcript: Mutex<Transcript>,
    guard: ResponseGuard,
    pending: AtomicBool,
}

impl ChatService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, language: Language) -> Self {
        Self {
            backend,
            transcript: Mutex::new(Transcript::fresh(language)),
            guard: ResponseGuard::new(),
            pending: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.transcript().language
    }

    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript().messages.clone()
    }

    /// Switch language, starting a new transcript. Pending replies are dropped.
    pub fn set_language(&self, language: Language) {
        self.guard.invalidate();
        *self.transcript() = Transcript::fresh(language);
        debug!(language = language.code(), "chat transcript reset");
    }

    /// Send `text` and append the bot's reply.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() || self.pending.swap(true, Ordering::AcqRel) {
            return SendOutcome::Ignored;
        }
        let _pending = PendingReset(&self.pending);

        let ticket = self.guard.ticket();
        let request = {
            let mut transcript = self.transcript();
            transcript.messages.push(ChatMessage::user(text));
            ChatRequest {
                message: text.to_owned(),
                language: transcript.language,
            }
        };

        let result = self.backend.chat(&request).await;

        if !self.guard.is_current(ticket) {
            debug!("dropping chat reply for a previous transcript");
            return SendOutcome::Stale;
        }

        let (message, failed) = match result {
            Ok(reply) => (
                ChatMessage {
                    sender: Sender::Bot,
                    text: reply.reply,
                    is_definition: reply.is_definition,
                    word: reply.word,
                    videos: reply.videos,
                },
                false,
            ),
            Err(err) => {
                warn!(error = %err, "chat request failed");
                (ChatMessage::bot(CONNECTION_TROUBLE), true)
            }
        };
        self.transcript().messages.push(message.clone());

        if failed {
            SendOutcome::Failed(message)
        } else {
            SendOutcome::Replied(message)
        }
    }

    fn transcript(&self) -> std::sync::MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the pending flag even if the send future is dropped mid-request.
struct PendingReset<'a>(&'a AtomicBool);

impl Drop for PendingReset<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
