//! Terminal interface

pub mod app;
pub mod conversation;

pub use app::run;
