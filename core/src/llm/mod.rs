//! LLM module: Gemini client and the medaka reply composer
//!
//! This module provides:
//! - `TextGenerator`, the seam between the composer and a text-generation backend
//! - `GeminiClient` talking to the Gemini `generateContent` endpoint
//! - `ReplyComposer` building the persona prompt and truncating replies

mod client;
mod composer;

pub use client::{GeminiClient, TextGenerator};
pub use composer::{build_prompt, truncate_reply, Reply, ReplyComposer, FALLBACK_REPLY, MAX_REPLY_CHARS};
