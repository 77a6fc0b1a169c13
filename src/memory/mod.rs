//! Conversation memory
//!
//! Ordered question/answer exchanges for display. The matcher never reads
//! this back.

pub mod store;

pub use store::{ConversationHistory, QaExchange};
