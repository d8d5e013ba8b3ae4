use std::str::FromStr;

use once_cell::sync::Lazy;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start a new conversation
    New,
    /// Switch to a conversation by its number in the sidebar
    Switch,
    /// Delete a conversation (the current one by default)
    Delete,
    /// Turn document retrieval on or off
    Rag,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

static COMMAND_ENTRIES: Lazy<Vec<CommandEntry>> = Lazy::new(|| {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
});

pub fn command_entries() -> &'static [CommandEntry] {
    &COMMAND_ENTRIES
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// 1-based sidebar position given to `/switch` or `/delete`, as a 0-based index
    pub fn index_target(&self) -> Option<usize> {
        let position: usize = self.argument()?.trim().parse().ok()?;
        position.checked_sub(1)
    }

    /// `on`/`off` argument of `/rag`; no argument toggles
    pub fn toggle_target(&self) -> Option<bool> {
        if self.command != SlashCommand::Rag {
            return None;
        }

        let arg = self.argument()?.trim().to_lowercase();
        match arg.as_str() {
            "on" | "true" | "yes" | "1" => Some(true),
            "off" | "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "start a new conversation",
            SlashCommand::Switch => "switch to conversation <n> from the sidebar",
            SlashCommand::Delete => "delete conversation <n>, or the current one",
            SlashCommand::Rag => "turn document retrieval on or off",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command can be run while a reply is streaming.
    pub fn available_during_streaming(self) -> bool {
        match self {
            SlashCommand::New
            | SlashCommand::Switch
            | SlashCommand::Delete
            | SlashCommand::Help
            | SlashCommand::Quit => true,
            // the flag is read when the request is built; flipping it mid-reply is misleading
            SlashCommand::Rag => false,
        }
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let body = input.trim_start().strip_prefix('/')?;

    let mut parts = body.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head).ok().or_else(|| match head.as_str() {
        "q" | "exit" | "bye" => Some(SlashCommand::Quit),
        "n" => Some(SlashCommand::New),
        "s" | "open" => Some(SlashCommand::Switch),
        "d" | "rm" => Some(SlashCommand::Delete),
        "h" | "?" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for entry in command_entries() {
        help.push_str(&format!("/{} - {}\n", entry.keyword, entry.description));
    }

    help.push_str("\nKeys: Enter send, Shift+Enter newline, Ctrl+N new chat,");
    help.push_str(" Ctrl+Up/Down switch chat, PageUp/PageDown scroll, Ctrl+C quit.");
    help
}
