//! Slash commands: /player, /timezone

pub mod player;
pub mod timezone;

use serenity::all::{
    CommandInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
    ResolvedOption, ResolvedValue, User,
};

/// Discord rejects messages over 2000 characters
pub const MESSAGE_CHUNK_LIMIT: usize = 1900;

pub type CommandResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Helper to send a response
pub async fn respond(
    ctx: &Context,
    command: &CommandInteraction,
    content: &str,
    ephemeral: bool,
) -> Result<(), serenity::Error> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(ephemeral),
            ),
        )
        .await
}

/// Name and options of the invoked subcommand
pub fn subcommand<'a>(
    options: &'a [ResolvedOption<'a>],
) -> Option<(&'a str, &'a [ResolvedOption<'a>])> {
    let first = options.first()?;
    match &first.value {
        ResolvedValue::SubCommand(sub_options) => Some((first.name, sub_options.as_slice())),
        _ => None,
    }
}

pub fn string_option<'a>(options: &[ResolvedOption<'a>], name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| match &o.value {
            ResolvedValue::String(s) => Some(*s),
            _ => None,
        })
}

pub fn integer_option(options: &[ResolvedOption<'_>], name: &str) -> Option<i64> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| match &o.value {
            ResolvedValue::Integer(n) => Some(*n),
            _ => None,
        })
}

pub fn user_option<'a>(options: &[ResolvedOption<'a>], name: &str) -> Option<&'a User> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| match &o.value {
            ResolvedValue::User(user, _) => Some(*user),
            _ => None,
        })
}

/// Name to store for the invoking user when they have not given one
pub fn display_name(command: &CommandInteraction) -> String {
    command
        .member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| command.user.global_name.clone())
        .unwrap_or_else(|| command.user.name.clone())
}

/// Split text into messages of at most `limit` characters, breaking on lines
/// where possible.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let mut line = line;

        // A single line longer than the limit is cut on char boundaries
        while line.chars().count() > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let cut = line
                .char_indices()
                .nth(limit)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            chunks.push(line[..cut].to_string());
            line = &line[cut..];
        }

        let needed = if current.is_empty() {
            line.chars().count()
        } else {
            current.chars().count() + 1 + line.chars().count()
        };
        if needed > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_message("a\nb\nc", 100), vec!["a\nb\nc"]);
        assert!(split_message("", 100).is_empty());
    }

    #[test]
    fn test_splits_on_line_boundaries() {
        let chunks = split_message("aaaa\nbbbb\ncccc", 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_long_line_is_cut() {
        let chunks = split_message("🌍🌍🌍🌍🌍\nok", 2);
        assert_eq!(chunks, vec!["🌍🌍", "🌍🌍", "🌍", "ok"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 2));
    }
}
