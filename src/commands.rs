use crate::backend::{BackendClient, ChatBackend, ChatRequest};
use crate::config::Config;
use crate::events::StreamEvent;
use crate::session::SessionManager;
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

fn client(config: &Config) -> Result<BackendClient> {
    BackendClient::new(config).context("Failed to create backend client")
}

/// Ask a single question and print the answer
pub async fn ask(config: &Config, query: &str, stream: bool, show_context: bool) -> Result<()> {
    let backend = client(config)?;

    if !stream {
        let request = ChatRequest::new(query, None, config.use_rag);
        let response = backend
            .chat(&request)
            .await
            .with_context(|| format!("Chat request to {} failed", backend.base_url()))?;

        println!("{}", response.response);
        if show_context {
            if let Some(context) = response.context_used {
                println!();
                println!("📚 Context used:");
                println!("{context}");
            }
        }
        println!();
        println!("🔖 Session: {}", response.session_id);
        return Ok(());
    }

    let mut session = SessionManager::new(Arc::new(backend), config.use_rag);
    let mut reply = session
        .begin_send(query)
        .context("Nothing to send")?;

    let mut stdout = io::stdout();
    let mut failed = false;
    while let Some(event) = reply.next_event().await {
        match &event {
            StreamEvent::Chunk(text) => {
                print!("{text}");
                stdout.flush()?;
            }
            StreamEvent::Failed(_) => failed = true,
            _ => {}
        }
        let terminal = event.is_terminal();
        session.apply_stream_event(event);
        if terminal {
            break;
        }
    }
    if session.is_loading() {
        session.abort_reply(&reply);
    }

    if failed {
        if let Some(message) = session.active().last_message() {
            println!();
            println!("❌ {}", message.content);
        }
    }
    println!();
    println!("🔖 Session: {}", session.active_id());
    Ok(())
}

pub async fn health(config: &Config) -> Result<()> {
    let backend = client(config)?;
    let health = backend.health().await.context("Health check failed")?;

    // the root banner is informational; older backends may not serve it
    if let Ok(root) = backend.root().await {
        if let Some(message) = root.get("message").and_then(|m| m.as_str()) {
            println!("👋 {message}");
        }
    }

    println!("🩺 Backend status: {}", health.status);
    for (name, value) in &health.services {
        let rendered = match value {
            serde_json::Value::Bool(true) => "✅".to_string(),
            serde_json::Value::Bool(false) => "❌".to_string(),
            other => other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
        };
        println!("   {name}: {rendered}");
    }
    if let Some(timestamp) = health.timestamp {
        println!("   🕒 {timestamp}");
    }
    Ok(())
}

pub async fn model_info(config: &Config) -> Result<()> {
    let info = client(config)?
        .model_info()
        .await
        .context("Failed to fetch model info")?;

    println!("🤖 Model type: {}", info.model_type);
    println!("   Status: {}", info.status);
    if let Some(name) = info.model_name {
        println!("   Model: {name}");
    }
    if let Some(device) = info.device {
        println!("   Device: {device}");
    }
    if let Some(path) = info.model_path {
        println!("   Path: {path}");
    }
    Ok(())
}

pub async fn sessions(config: &Config) -> Result<()> {
    let list = client(config)?
        .sessions()
        .await
        .context("Failed to list sessions")?;

    if list.sessions.is_empty() {
        println!("📭 No sessions stored on the backend.");
        return Ok(());
    }

    println!("📋 {} session(s):", list.count);
    for session in &list.sessions {
        let label = session
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| session.to_string());
        println!("  • {label}");
    }
    Ok(())
}

pub async fn clear_session(config: &Config, session_id: &str) -> Result<()> {
    let status = client(config)?
        .clear_session(session_id)
        .await
        .with_context(|| format!("Failed to clear session {session_id}"))?;
    println!("🧹 {}", status.message);
    Ok(())
}

pub async fn search(config: &Config, query: &str, k: usize) -> Result<()> {
    let results = client(config)?
        .search(query, k)
        .await
        .context("Search failed")?;

    if results.results.is_empty() {
        println!("🔍 No documents matched \"{}\".", results.query);
        return Ok(());
    }

    println!("🔍 {} result(s) for \"{}\":", results.count, results.query);
    println!("{}", "=".repeat(50));
    for (index, result) in results.results.iter().enumerate() {
        let rendered = serde_json::to_string_pretty(result)?;
        println!("{}. {}", index + 1, rendered);
        println!();
    }
    Ok(())
}

pub async fn ingest(config: &Config, data_path: Option<&str>) -> Result<()> {
    let response = client(config)?
        .ingest(data_path)
        .await
        .context("Ingestion failed")?;
    println!("📥 {}", response.message);
    println!("   Documents processed: {}", response.documents_processed);
    Ok(())
}

pub async fn clear_vector_store(config: &Config) -> Result<()> {
    let status = client(config)?
        .clear_vector_store()
        .await
        .context("Failed to clear vector store")?;
    println!("🧹 {}", status.message);
    Ok(())
}

pub async fn switch_model(config: &Config, use_local: bool) -> Result<()> {
    let response = client(config)?
        .switch_model(use_local)
        .await
        .context("Failed to switch model")?;
    println!("🔁 {}", response.message);
    println!("   Active model type: {}", response.model_type);
    Ok(())
}

/// Print the effective configuration, optionally writing it to `path`
pub fn show_config(config: &Config, path: &Path, save: bool) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("⚙️  Configuration ({})", path.display());
    println!("{rendered}");

    if save {
        config.save(path)?;
        println!("💾 Saved to {}", path.display());
    }
    Ok(())
}
