//! Session-level state machinery: the advisor chat and search debouncing

pub mod chat;
pub mod debounce;

pub use chat::{
    request_completion, ChatError, ChatSession, ChatSettings, Outcome, PendingExchange, Reply,
};
pub use debounce::Debouncer;
