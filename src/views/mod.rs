// src/views/mod.rs
pub mod chat_session;
pub mod markdown;
pub mod templates;
