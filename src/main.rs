mod commands;
mod config;
mod db;
mod handlers;
mod models;
mod penalty;

use async_trait::async_trait;
use config::Config;
use db::Database;
use handlers::BotState;
use log::{error, info};
use penalty::VoteRegistry;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

struct Bot {
    state: Arc<BotState>,
}

#[async_trait]
impl EventHandler for Bot {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let state = Arc::clone(&self.state);

        // Each interaction runs in its own task; votes on the same incident
        // are serialized by the registry
        tokio::spawn(async move {
            handlers::handle_interaction(&state, &ctx, interaction).await;
        });
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let commands = Command::set_global_application_commands(&ctx.http, |commands_builder| {
            commands::register_commands(commands_builder)
        })
        .await;

        if let Err(why) = commands {
            error!("Failed to register slash commands: {:?}", why);
        } else {
            info!("Successfully registered global slash commands.");
        }
    }
}

#[tokio::main]
async fn main() {
    // .env.local wins over .env for local development
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    info!("Environment: {}", config.environment);

    let database = match Database::new(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let registry = VoteRegistry::new(config.penalty_choices.clone());
    info!("Penalty choices: {}", registry.choices().labels().join(", "));

    let token = config.discord_token.clone();
    let state = Arc::new(BotState {
        config,
        database,
        registry,
    });

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES;

    let mut client = match Client::builder(&token, intents)
        .event_handler(Bot { state })
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Err creating client: {:?}", e);
            return;
        }
    };

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
