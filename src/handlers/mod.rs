pub mod render;
mod vote;

use crate::config::Config;
use crate::db::Database;
use crate::penalty::VoteRegistry;
use lazy_static::lazy_static;
use log::{error, info, warn};
use regex::Regex;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::Interaction;
use serenity::prelude::*;

/// Everything an interaction handler needs, shared across spawned tasks.
pub struct BotState {
    pub config: Config,
    pub database: Database,
    pub registry: VoteRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    Vote(String),
    RemoveVote,
    ShowSummary,
}

lazy_static! {
    static ref VOTE_ID: Regex = Regex::new(&format!("^{}(.+)$", render::VOTE_PREFIX))
        .expect("vote custom_id pattern is valid");
}

pub fn parse_component_id(custom_id: &str) -> Option<ComponentAction> {
    if custom_id == render::REMOVE_ID {
        return Some(ComponentAction::RemoveVote);
    }
    if custom_id == render::SUMMARY_ID {
        return Some(ComponentAction::ShowSummary);
    }
    VOTE_ID
        .captures(custom_id)
        .and_then(|caps| caps.get(1))
        .map(|choice| ComponentAction::Vote(choice.as_str().to_string()))
}

// Handle slash commands
pub async fn handle_command(
    state: &BotState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Received command: {}", command.data.name);
    match command.data.name.as_str() {
        "submit_pen" => crate::commands::submit_pen::handle_submit_pen(state, ctx, command).await?,
        "pen_status" => crate::commands::pen_status::handle_pen_status(state, ctx, command).await?,
        "create-new-war" => crate::commands::war::handle_create_new_war(state, ctx, command).await?,
        "billboard" => crate::commands::war::handle_billboard(state, ctx, command).await?,
        _ => {
            crate::commands::send_ephemeral(ctx, command, "Unknown command").await?;
        }
    }
    Ok(())
}

// Route button clicks on penalty messages. The incident key is the id of the
// message the buttons are attached to.
pub async fn handle_component(
    state: &BotState,
    ctx: &Context,
    component: &MessageComponentInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let custom_id = &component.data.custom_id;
    let incident_key = component.message.id.0.to_string();
    info!("Received component interaction {} on message {}", custom_id, incident_key);

    let action = match parse_component_id(custom_id) {
        Some(action) => action,
        None => {
            warn!("Unhandled component custom_id: {}", custom_id);
            vote::send_ephemeral(ctx, component, "Unknown button action.").await?;
            return Ok(());
        }
    };

    match action {
        ComponentAction::Vote(choice) => {
            vote::handle_pen_vote(state, ctx, component, &incident_key, &choice).await?
        }
        ComponentAction::RemoveVote => {
            vote::handle_remove_vote(state, ctx, component, &incident_key).await?
        }
        ComponentAction::ShowSummary => {
            vote::handle_show_summary(state, ctx, component, &incident_key).await?
        }
    }

    Ok(())
}

pub async fn handle_interaction(state: &BotState, ctx: &Context, interaction: Interaction) {
    let result = match interaction {
        Interaction::ApplicationCommand(command) => handle_command(state, ctx, &command).await,
        Interaction::MessageComponent(component) => handle_component(state, ctx, &component).await,
        Interaction::Ping(_) => Ok(()),
        _ => {
            warn!("Unhandled interaction type: {:?}", interaction.kind());
            Ok(())
        }
    };

    if let Err(why) = result {
        error!("Interaction handler error: {:?}", why);
    }
}
