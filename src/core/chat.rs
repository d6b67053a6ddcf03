//! Advisor chat session
//!
//! A session owns the conversation history and the chat transcript, and runs one
//! exchange at a time:
//! 1. `begin` checks the session is idle, snapshots the outgoing context and
//!    records the user's turn
//! 2. `request_completion` calls the completion client without touching the
//!    session, so callers can release any lock around it
//! 3. `finish` records the reply, or drops it if the session was reset meanwhile

use serde::Serialize;
use uuid::Uuid;

use crate::config::{routine_prompt, Config, PromptTemplate};
use crate::conversation::{EntryKind, History, Message, TranscriptEntry};
use crate::providers::CompletionClient;
use crate::selection::Selection;

/// Shown in place of a reply when the completion call fails
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// Replies longer than this many characters are flagged as possibly cut off
pub const TRUNCATION_THRESHOLD: usize = 800;

pub const EMPTY_SELECTION_NOTICE: &str =
    "Please select some products first before generating a routine!";

/// Errors that reject an exchange before anything is sent
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("A response is already pending for this session")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    Idle,
    AwaitingResponse,
}

/// Request parameters shared by every exchange in a session
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub history_window: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatSettings {
    pub fn new(config: &Config, persona: &PromptTemplate) -> Self {
        Self {
            system_prompt: persona.system_prompt.content.clone(),
            history_window: config.history_window,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::new(&Config::default(), &PromptTemplate::builtin())
    }
}

/// An exchange that has been started and is waiting for its reply
#[derive(Debug, Clone)]
pub struct PendingExchange {
    epoch: u64,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// What came back from the completion client
#[derive(Debug)]
pub enum Reply {
    Answer(String),
    Fallback,
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer(text) => text,
            Reply::Fallback => FALLBACK_REPLY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(String),
    Failed,
    /// The session was reset while the request was in flight
    Discarded,
}

/// Send one exchange. Failures are logged and mapped to [`Reply::Fallback`].
pub async fn request_completion(client: &dyn CompletionClient, exchange: &PendingExchange) -> Reply {
    match client
        .send(&exchange.messages, exchange.max_tokens, exchange.temperature)
        .await
    {
        Ok(text) => Reply::Answer(text),
        Err(e) => {
            tracing::error!("Error sending message to advisor: {}", e);
            Reply::Fallback
        }
    }
}

/// Heuristic for replies that were cut off by the token limit
pub fn looks_truncated(text: &str) -> bool {
    let text = text.trim_end();
    text.ends_with("...")
        || !text.ends_with(['.', '!', '?'])
        || text.chars().count() > TRUNCATION_THRESHOLD
}

pub struct ChatSession {
    id: Uuid,
    settings: ChatSettings,
    history: History,
    transcript: Vec<TranscriptEntry>,
    state: ExchangeState,
    epoch: u64,
}

impl ChatSession {
    pub fn new(settings: ChatSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            history: History::new(),
            transcript: Vec::new(),
            state: ExchangeState::Idle,
            epoch: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.state == ExchangeState::AwaitingResponse
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn append_user_turn(&mut self, text: &str) {
        self.history.add_user(text);
    }

    pub fn append_assistant_turn(&mut self, text: &str) {
        self.history.add_assistant(text);
    }

    /// Add an informational line to the transcript only
    pub fn add_notice(&mut self, text: &str) {
        self.transcript
            .push(TranscriptEntry::new(EntryKind::Notice, text));
    }

    /// Messages for one request: the system prompt (with the current selection),
    /// the most recent history window, then `new_message`.
    pub fn build_outgoing_context(&self, selection: &Selection, new_message: &str) -> Vec<Message> {
        let mut system_prompt = self.settings.system_prompt.clone();
        if let Some(summary) = selection.describe() {
            system_prompt.push_str("\n\nCurrent selected products: ");
            system_prompt.push_str(&summary);
        }

        let recent = self.history.recent(self.settings.history_window);

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend_from_slice(recent);
        messages.push(Message::user(new_message));
        messages
    }

    /// Start an exchange for a message typed by the user
    pub fn begin_message(
        &mut self,
        selection: &Selection,
        text: &str,
    ) -> Result<PendingExchange, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.begin(selection, text, text)
    }

    /// Start a routine-generation exchange.
    ///
    /// Returns `Ok(None)` when nothing is selected; a notice is added instead.
    pub fn begin_routine(
        &mut self,
        selection: &Selection,
    ) -> Result<Option<PendingExchange>, ChatError> {
        if self.is_busy() {
            return Err(ChatError::Busy);
        }
        if selection.is_empty() {
            self.add_notice(EMPTY_SELECTION_NOTICE);
            return Ok(None);
        }

        let shown = format!(
            "Generate a routine using my {} selected products",
            selection.len()
        );
        let request = routine_prompt(selection.products());
        self.begin(selection, &shown, &request).map(Some)
    }

    fn begin(
        &mut self,
        selection: &Selection,
        shown: &str,
        request: &str,
    ) -> Result<PendingExchange, ChatError> {
        if self.is_busy() {
            return Err(ChatError::Busy);
        }

        let messages = self.build_outgoing_context(selection, request);
        self.append_user_turn(request);
        self.transcript
            .push(TranscriptEntry::new(EntryKind::User, shown));
        self.state = ExchangeState::AwaitingResponse;

        Ok(PendingExchange {
            epoch: self.epoch,
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        })
    }

    /// Record the reply for an exchange started by this session
    pub fn finish(&mut self, exchange: PendingExchange, reply: Reply) -> Outcome {
        if exchange.epoch != self.epoch {
            tracing::debug!(
                "Discarding reply for superseded exchange (epoch {} != {})",
                exchange.epoch,
                self.epoch
            );
            return Outcome::Discarded;
        }

        self.state = ExchangeState::Idle;

        let mut entry = TranscriptEntry::new(EntryKind::Assistant, reply.text());
        entry.possibly_truncated = looks_truncated(reply.text());
        self.transcript.push(entry);

        match reply {
            Reply::Answer(text) => {
                self.append_assistant_turn(&text);
                Outcome::Completed(text)
            }
            Reply::Fallback => Outcome::Failed,
        }
    }

    /// Start over: forget history and transcript; in-flight replies are dropped
    pub fn reset(&mut self) {
        self.id = Uuid::new_v4();
        self.epoch += 1;
        self.history = History::new();
        self.transcript.clear();
        self.state = ExchangeState::Idle;
        tracing::info!("Chat session reset ({})", self.id);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::conversation::Role;
    use crate::providers::CompletionError;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Completion client that replays scripted replies and records requests
    pub(crate) struct ScriptedClient {
        replies: Mutex<Vec<Result<String, CompletionError>>>,
        pub requests: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(mut replies: Vec<Result<String, CompletionError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn answering(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn send(
            &self,
            messages: &[Message],
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, CompletionError> {
            self.requests.lock().await.push(messages.to_vec());
            self.replies
                .lock()
                .await
                .pop()
                .unwrap_or_else(|| Err(CompletionError::InvalidResponse("script exhausted".into())))
        }
    }

    /// Begin, send and finish one exchange on a session owned by the test
    async fn send_message(
        chat: &mut ChatSession,
        client: &dyn CompletionClient,
        selection: &Selection,
        text: &str,
    ) -> Result<String, ChatError> {
        let exchange = chat.begin_message(selection, text)?;
        let reply = request_completion(client, &exchange).await;
        let shown = reply.text().to_string();
        chat.finish(exchange, reply);
        Ok(shown)
    }

    fn session() -> ChatSession {
        ChatSession::new(ChatSettings {
            system_prompt: "You are an advisor.".to_string(),
            history_window: 20,
            max_tokens: 1500,
            temperature: 0.7,
        })
    }

    #[test]
    fn test_context_includes_selection_summary() {
        let catalog = sample_catalog();
        let mut selection = Selection::new();
        selection.toggle(catalog.get(1).unwrap());

        let context = session().build_outgoing_context(&selection, "What next?");
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].role, Role::System);
        assert_eq!(
            context[0].content,
            "You are an advisor.\n\nCurrent selected products: Hydrating Facial Cleanser by CeraVe (cleanser)"
        );
        assert_eq!(context[1], Message::user("What next?"));
    }

    #[test]
    fn test_context_without_selection_is_bare_prompt() {
        let context = session().build_outgoing_context(&Selection::new(), "hi");
        assert_eq!(context[0].content, "You are an advisor.");
    }

    #[test]
    fn test_context_window_is_capped() {
        let mut chat = session();
        for i in 0..40 {
            chat.append_user_turn(&format!("q{}", i));
            chat.append_assistant_turn(&format!("a{}", i));
        }

        let context = chat.build_outgoing_context(&Selection::new(), "latest");
        // system + 20 prior + new message
        assert_eq!(context.len(), 22);
        assert_eq!(context[1].content, "q30");
        assert_eq!(context[20].content, "a39");
        assert_eq!(context[21].content, "latest");
        assert_eq!(chat.history().len(), 80);
    }

    #[tokio::test]
    async fn test_successful_exchange_records_both_turns() {
        let client = ScriptedClient::answering("Use the cleanser first.");
        let mut chat = session();

        let reply = send_message(&mut chat, &client, &Selection::new(), "  Where do I start?  ")
            .await
            .unwrap();

        assert_eq!(reply, "Use the cleanser first.");
        assert_eq!(chat.history().messages()[0], Message::user("Where do I start?"));
        assert_eq!(chat.history().messages()[1], Message::assistant("Use the cleanser first."));
        assert!(!chat.is_busy());

        let requests = client.requests.lock().await;
        assert_eq!(requests[0].len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_returns_fallback_and_keeps_user_turn() {
        let failing = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        let client = ScriptedClient::new(vec![Err(CompletionError::Transport(failing))]);
        let mut chat = session();

        let reply = send_message(&mut chat, &client, &Selection::new(), "Hello?")
            .await
            .unwrap();

        assert_eq!(
            reply,
            "Sorry, I'm having trouble connecting right now. Please try again in a moment."
        );
        assert_eq!(chat.history().messages(), &[Message::user("Hello?")]);
        assert!(!chat.is_busy());
        assert_eq!(chat.transcript().last().unwrap().text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_added_to_history() {
        let client = ScriptedClient::new(vec![Err(CompletionError::Upstream {
            status: 500,
            body: String::new(),
        })]);
        let mut chat = session();
        send_message(&mut chat, &client, &Selection::new(), "Hi").await.unwrap();
        assert!(chat.history().messages().iter().all(|m| m.role == Role::User));
    }

    #[test]
    fn test_second_exchange_rejected_while_awaiting() {
        let mut chat = session();
        let _pending = chat.begin_message(&Selection::new(), "first").unwrap();
        assert!(chat.is_busy());
        assert!(matches!(
            chat.begin_message(&Selection::new(), "second"),
            Err(ChatError::Busy)
        ));
        assert!(matches!(chat.begin_routine(&Selection::new()), Err(ChatError::Busy)));
        assert_eq!(chat.history().len(), 1);
    }

    #[test]
    fn test_empty_message_rejected() {
        let mut chat = session();
        assert!(matches!(
            chat.begin_message(&Selection::new(), "   "),
            Err(ChatError::EmptyMessage)
        ));
        assert!(!chat.is_busy());
    }

    #[test]
    fn test_reply_after_reset_is_discarded() {
        let mut chat = session();
        let pending = chat.begin_message(&Selection::new(), "hello").unwrap();
        chat.reset();

        let outcome = chat.finish(pending, Reply::Answer("late reply.".to_string()));
        assert_eq!(outcome, Outcome::Discarded);
        assert!(chat.history().is_empty());
        assert!(chat.transcript().is_empty());
        assert!(!chat.is_busy());
    }

    #[test]
    fn test_routine_requires_selection() {
        let mut chat = session();
        let pending = chat.begin_routine(&Selection::new()).unwrap();
        assert!(pending.is_none());
        assert_eq!(chat.transcript()[0].kind, EntryKind::Notice);
        assert_eq!(chat.transcript()[0].text, EMPTY_SELECTION_NOTICE);
        assert!(chat.history().is_empty());
    }

    #[test]
    fn test_routine_exchange_shows_summary_and_sends_prompt() {
        let catalog = sample_catalog();
        let mut selection = Selection::new();
        selection.toggle(catalog.get(1).unwrap());
        selection.toggle(catalog.get(3).unwrap());

        let mut chat = session();
        let pending = chat.begin_routine(&selection).unwrap().unwrap();

        assert_eq!(
            chat.transcript()[0].text,
            "Generate a routine using my 2 selected products"
        );
        let request = &pending.messages.last().unwrap().content;
        assert!(request.starts_with("Create a concise but complete beauty routine"));
        assert_eq!(&chat.history().messages()[0].content, request);
    }

    #[test]
    fn test_truncation_heuristic() {
        assert!(!looks_truncated("Apply sunscreen every morning."));
        assert!(!looks_truncated("Routine complete!\n"));
        assert!(looks_truncated("Then apply the serum and"));
        assert!(looks_truncated("Step 3..."));
        assert!(looks_truncated(&format!("{}.", "a".repeat(TRUNCATION_THRESHOLD))));
        assert!(!looks_truncated(FALLBACK_REPLY));
    }

    #[test]
    fn test_trailing_whitespace_ignored_by_truncation_check() {
        assert!(looks_truncated("Step 3...\n"));
        assert!(looks_truncated("Then apply the serum and \n"));
        assert!(!looks_truncated("Pat dry with a towel.\n\n"));
        assert!(!looks_truncated("Is that clear?  "));
    }

    #[test]
    fn test_truncated_reply_is_flagged_in_transcript() {
        let mut chat = session();
        let pending = chat.begin_message(&Selection::new(), "routine?").unwrap();
        chat.finish(pending, Reply::Answer("Morning: cleanse, then".to_string()));
        assert!(chat.transcript().last().unwrap().possibly_truncated);
    }
}
