//! Conversation state management module

pub mod context;

pub use context::{ConversationState, StateStorage};
