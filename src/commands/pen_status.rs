use crate::commands::{send_ephemeral, string_option};
use crate::handlers::render::{fit_message, snapshot_text, summary_text, vote_error_message};
use crate::handlers::BotState;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::*;

pub fn create_pen_status_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("pen_status")
        .description("Show the referee vote on a penalty (defaults to the most recent one)")
        .create_option(|option| {
            option
                .name("message_id")
                .description("ID of the penalty message")
                .kind(CommandOptionType::String)
                .required(false)
        })
}

pub async fn handle_pen_status(
    state: &BotState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let role_ids = command
        .member
        .as_ref()
        .map(|member| member.roles.iter().map(|role| role.0).collect::<Vec<_>>())
        .unwrap_or_default();
    if !state.config.is_referee(role_ids) {
        send_ephemeral(ctx, command, "Only referees can view penalty votes.").await?;
        return Ok(());
    }

    let snapshot = match string_option(command, "message_id") {
        Some(key) => state.registry.get(key.trim()),
        None => state.registry.most_recent(),
    };
    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => {
            send_ephemeral(ctx, command, "No open penalty vote found.").await?;
            return Ok(());
        }
    };

    info!("Penalty status requested for incident {}", snapshot.incident_key);
    let content = match state.registry.status(&snapshot.incident_key) {
        Ok((snapshot, summary)) => fit_message(&format!(
            "{}\n\n{}",
            snapshot_text(&snapshot),
            summary_text(&summary)
        )),
        Err(e) => vote_error_message(&e),
    };

    send_ephemeral(ctx, command, &content).await?;
    Ok(())
}
