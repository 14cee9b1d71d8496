/// Detection of the router's own slash commands.

/// A router command recognized ahead of model routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    /// Route the rest of the message regardless of wake state.
    Parse,
    /// Rebuild the catalog and report plugin changes.
    Sync,
}

const ALIASES: &[(&str, SlashCommand)] = &[
    ("/解析", SlashCommand::Parse),
    ("/parse", SlashCommand::Parse),
    ("/同步", SlashCommand::Sync),
    ("/更新", SlashCommand::Sync),
];

/// A detected slash command and the text that followed its alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashInvocation<'a> {
    pub command: SlashCommand,
    pub alias: &'a str,
    pub rest: &'a str,
}

/// Detect a router slash command at the start of a message.
/// Returns `None` for anything else, including unknown slash commands,
/// which belong to other plugins.
pub fn detect_command(text: &str) -> Option<SlashInvocation<'_>> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (alias, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(a, r)| (a, r.trim()))
        .unwrap_or((trimmed, ""));

    let lower = alias.to_lowercase();
    let (_, command) = ALIASES.iter().find(|(a, _)| *a == lower)?;
    Some(SlashInvocation { command: *command, alias, rest })
}
