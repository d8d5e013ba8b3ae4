//! Terminal chat client for the CollegeGPT RAG backend

pub mod backend;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod logging;
pub mod session;
pub mod streaming;
pub mod ui;
