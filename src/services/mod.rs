// src/services/mod.rs
pub mod error;
pub mod openai;
pub mod relay;
pub mod replicate;
