//! Timezone commands: /timezone set, /timezone analyze

use chrono::Utc;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    CreateInteractionResponseFollowup, EditInteractionResponse,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    display_name, respond, split_message, string_option, subcommand, CommandResult,
    MESSAGE_CHUNK_LIMIT,
};
use crate::database::{Database, PlayerRecord};
use crate::timezone::{analyze, normalize_timezone, parse_offset_hours, AnalysisResult};

/// Register timezone commands
pub fn register() -> Vec<CreateCommand> {
    vec![CreateCommand::new("timezone")
        .description("Alliance timezone tools")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "set",
                "Set your timezone (e.g. EST, UTC+2, GMT-3:30)",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::String, "zone", "Your timezone")
                    .required(true)
                    .max_length(32),
            ),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "analyze",
            "Find the best times for alliance-wide activity",
        ))]
}

/// Handle /timezone command
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
        "set" => {
            let zone = string_option(sub_options, "zone").unwrap_or_default().trim();
            if zone.is_empty() {
                respond(ctx, command, "❌ Please provide a timezone.", true).await?;
                return Ok(());
            }

            let previous = db.latest_record(guild_id.get(), command.user.id.get())?;
            let (player_name, stats) = match previous {
                Some(p) => (p.player_name, p.stats),
                None => (display_name(command), Default::default()),
            };

            db.insert_record(&PlayerRecord {
                guild_id: guild_id.get(),
                user_id: command.user.id.get(),
                player_name,
                time_zone: Some(zone.to_string()),
                stats,
                recorded_at: Utc::now(),
            })?;

            respond(ctx, command, &set_reply(zone), true).await?;
            info!("Guild {} user {} set timezone {}", guild_id, command.user.id, zone);
        }
        "analyze" => {
            command.defer(&ctx.http).await?;

            let records = db.latest_records(guild_id.get())?;
            let result = analyze(records.iter().map(|r| r.time_zone.as_deref()));
            debug!(
                "Guild {}: {} players, {} with timezone, {} buckets",
                guild_id,
                result.total_players,
                result.players_with_timezone,
                result.distribution.len()
            );
            match serde_json::to_string(&result) {
                Ok(json) => debug!("Guild {} analysis: {}", guild_id, json),
                Err(e) => warn!("Failed to serialize analysis for guild {}: {}", guild_id, e),
            }

            let report = format_report(&result);
            let mut chunks = split_message(&report, MESSAGE_CHUNK_LIMIT).into_iter();
            let first = chunks.next().unwrap_or_default();
            command
                .edit_response(&ctx.http, EditInteractionResponse::new().content(first))
                .await?;
            for chunk in chunks {
                let followup = CreateInteractionResponseFollowup::new().content(chunk);
                command.create_followup(&ctx.http, followup).await?;
            }

            info!("Posted timezone analysis for guild {}", guild_id);
        }
        _ => {
            respond(ctx, command, "Unknown subcommand.", true).await?;
        }
    }

    Ok(())
}

fn set_reply(zone: &str) -> String {
    let canonical = normalize_timezone(zone);
    if parse_offset_hours(&canonical).is_some() {
        format!("✅ Timezone saved as **{}**.", canonical)
    } else {
        format!(
            "⚠️ Timezone saved as **{}**, but it is not a recognised UTC offset and will not count toward coordination times. Try something like `UTC+2` or `EST`.",
            canonical
        )
    }
}

/// Render an analysis as a chat message
pub fn format_report(result: &AnalysisResult) -> String {
    let mut lines = vec![
        "🌍 **Alliance Timezone Analysis**".to_string(),
        format!(
            "Players: {} ({} with timezone)",
            result.total_players, result.players_with_timezone
        ),
    ];

    if !result.top_timezones.is_empty() {
        lines.push("\n**Top timezones**".to_string());
        for (i, bucket) in result.top_timezones.iter().enumerate() {
            let share = bucket.count as f64 / result.players_with_timezone as f64 * 100.0;
            lines.push(format!(
                "{}. {} - {} player{} ({:.0}%)",
                i + 1,
                bucket.offset,
                bucket.count,
                if bucket.count == 1 { "" } else { "s" },
                share
            ));
        }
    }

    if !result.optimal_times.is_empty() {
        lines.push("\n**Best coordination times**".to_string());
        for (i, window) in result.optimal_times.iter().enumerate() {
            lines.push(format!(
                "{}. {:02}:00 UTC - {} active",
                i + 1,
                window.utc_hour,
                window.active_player_count
            ));
            if !window.local_times.is_empty() {
                lines.push(format!("   {}", window.local_times.join(", ")));
            }
        }
    }

    lines.push("\n**Recommendations**".to_string());
    for recommendation in &result.recommendations {
        lines.push(format!("• {}", recommendation));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_without_data() {
        let report = format_report(&analyze(vec![None, Some("Unknown")]));
        assert!(report.contains("Players: 2 (0 with timezone)"));
        assert!(!report.contains("Top timezones"));
        assert!(!report.contains("Best coordination times"));
        assert!(report.contains("• No timezone data available for analysis."));
    }

    #[test]
    fn test_report_lists_windows_and_local_times() {
        let zones = vec![
            Some("UTC+0"),
            Some("UTC+0"),
            Some("UTC+0"),
            Some("JST"),
            Some("JST"),
        ];
        let report = format_report(&analyze(zones));

        assert!(report.contains("1. UTC+0 - 3 players (60%)"));
        assert!(report.contains("2. UTC+9 - 2 players (40%)"));
        assert!(report.contains("1. 18:00 UTC - 3 active"));
        assert!(report.contains("   03:00 UTC+9, 18:00 UTC+0"));
        assert!(report.contains("• Majority timezone: UTC+0 (60% of players)"));
        assert!(report.contains("\n\n**Best coordination times**\n"));
        assert!(!report.ends_with('\n'));
    }

    #[test]
    fn test_set_reply_warns_on_unknown_zone() {
        assert_eq!(set_reply("est"), "✅ Timezone saved as **UTC-5**.");
        assert!(set_reply("Mars/OlympusMons")
            .starts_with("⚠️ Timezone saved as **MARS/OLYMPUSMONS**"));
    }
}
