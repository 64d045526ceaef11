//! Discord Bot event handler

use crate::commands;
use crate::config::Config;
use crate::database::Database;
use serenity::all::{
    Client, Context, EventHandler, GatewayIntents, GuildId, Interaction, Ready,
};
use serenity::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Bot state shared across handlers
pub struct BotState {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
}

/// Main event handler for the bot
pub struct Handler {
    pub state: Arc<BotState>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}", ready.user.name);

        // Register commands
        let commands = vec![commands::player::register(), commands::timezone::register()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        // If guild ID is set, register to specific guild (faster for dev)
        if let Some(guild_id) = self.state.config.guild_id {
            let guild = GuildId::new(guild_id);
            match guild.set_commands(&ctx.http, commands).await {
                Ok(cmds) => info!("Registered {} guild commands", cmds.len()),
                Err(e) => error!("Failed to register guild commands: {}", e),
            }
        } else {
            // Register globally
            match serenity::all::Command::set_global_commands(&ctx.http, commands).await {
                Ok(cmds) => info!("Registered {} global commands", cmds.len()),
                Err(e) => error!("Failed to register global commands: {}", e),
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            let result = match command.data.name.as_str() {
                "player" => commands::player::handle(&ctx, &command, self.state.db.clone()).await,
                "timezone" => {
                    commands::timezone::handle(&ctx, &command, self.state.db.clone()).await
                }
                other => {
                    warn!("Received unknown command: {}", other);
                    Ok(())
                }
            };

            if let Err(e) = result {
                error!("Command /{} failed: {}", command.data.name, e);
            }
        }
    }
}

/// Create and run the Discord bot
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Arc::new(config);

    // Initialize database
    let db = Arc::new(Database::open(&config.database_path)?);
    info!("Opened player database at {}", config.database_path.display());

    let state = Arc::new(BotState {
        config: config.clone(),
        db,
    });

    let handler = Handler { state };

    // Slash commands only, no privileged intents needed
    let intents = GatewayIntents::non_privileged();

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await?;

    // Start the client
    info!("Starting bot...");
    client.start().await?;

    Ok(())
}
