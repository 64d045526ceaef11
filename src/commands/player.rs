//! Player commands: /player record, /player show

use chrono::Utc;
use serde_json::json;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
};
use std::sync::Arc;
use tracing::info;

use super::{
    display_name, integer_option, respond, string_option, subcommand, user_option,
    CommandResult,
};
use crate::database::{Database, PlayerRecord};
use crate::timezone::normalize_timezone;

/// Register player commands
pub fn register() -> Vec<CreateCommand> {
    vec![CreateCommand::new("player")
        .description("Record and view alliance player statistics")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "record",
                "Record your current stats",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::String, "name", "In-game name")
                    .required(true)
                    .max_length(64),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::Integer, "power", "Total power")
                    .min_int_value(0),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::Integer, "level", "Town level")
                    .min_int_value(1),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "timezone",
                    "Your timezone (e.g. EST, UTC+2)",
                )
                .max_length(32),
            ),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "show",
                "Show a player's latest stats",
            )
            .add_sub_option(CreateCommandOption::new(
                CommandOptionType::User,
                "user",
                "Player to show (defaults to you)",
            )),
        )]
}

/// Handle /player command
pub async fn handle(
    ctx: &Context,
    command: &CommandInteraction,
    db: Arc<Database>,
) -> CommandResult {
    let guild_id = command.guild_id.ok_or("Must be used in a guild")?;

    let options = command.data.options();
    let Some((name, sub_options)) = subcommand(&options) else {
        respond(ctx, command, "Please choose a subcommand.", true).await?;
        return Ok(());
    };

    match name {
        "record" => {
            let player_name = string_option(sub_options, "name")
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| display_name(command));

            let previous = db.latest_record(guild_id.get(), command.user.id.get())?;
            let (mut stats, previous_zone) = match previous {
                Some(p) => (p.stats, p.time_zone),
                None => (Default::default(), None),
            };

            if let Some(power) = integer_option(sub_options, "power") {
                stats.insert("power".to_string(), json!(power));
            }
            if let Some(level) = integer_option(sub_options, "level") {
                stats.insert("level".to_string(), json!(level));
            }

            let time_zone = string_option(sub_options, "timezone")
                .map(str::trim)
                .filter(|z| !z.is_empty())
                .map(str::to_string)
                .or(previous_zone);

            let record = PlayerRecord {
                guild_id: guild_id.get(),
                user_id: command.user.id.get(),
                player_name,
                time_zone,
                stats,
                recorded_at: Utc::now(),
            };
            db.insert_record(&record)?;

            let reply = format!("✅ Recorded\n{}", format_player_summary(&record, None));
            respond(ctx, command, &reply, true).await?;
            info!(
                "Guild {} user {} recorded stats as {}",
                guild_id, command.user.id, record.player_name
            );
        }
        "show" => {
            let user = user_option(sub_options, "user").unwrap_or(&command.user);
            let history = db.player_history(guild_id.get(), user.id.get(), 2)?;

            let reply = match history.first() {
                Some(latest) => format_player_summary(latest, history.get(1)),
                None => format!("No stats on file for <@{}>.", user.id),
            };
            respond(ctx, command, &reply, false).await?;
        }
        _ => {
            respond(ctx, command, "Unknown subcommand.", true).await?;
        }
    }

    Ok(())
}

/// Summarize a snapshot, with the power change since `previous` when known
pub fn format_player_summary(record: &PlayerRecord, previous: Option<&PlayerRecord>) -> String {
    let mut lines = vec![format!("**{}**", record.player_name)];

    if let Some(power) = record.stat_i64("power") {
        let change = previous
            .and_then(|p| p.stat_i64("power"))
            .map(|before| power - before)
            .filter(|delta| *delta != 0)
            .map(|delta| format!(" ({:+})", delta))
            .unwrap_or_default();
        lines.push(format!("Power: {}{}", power, change));
    }
    if let Some(level) = record.stat_i64("level") {
        lines.push(format!("Level: {}", level));
    }

    let zone = match record.time_zone.as_deref() {
        Some(raw) if !raw.trim().is_empty() => normalize_timezone(raw),
        _ => "Unknown".to_string(),
    };
    lines.push(format!("Timezone: {}", zone));
    lines.push(format!(
        "Updated: {}",
        record.recorded_at.format("%Y-%m-%d %H:%M UTC")
    ));

    lines.join("\n")
}
