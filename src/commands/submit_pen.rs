use crate::commands::{send_ephemeral, string_option};
use crate::handlers::render::{tally_embed, vote_components};
use crate::handlers::BotState;
use log::{error, info, warn};
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::id::ChannelId;
use serenity::prelude::*;

pub fn create_submit_pen_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("submit_pen")
        .description("Pings GSC Referees with a provided possible Penalty")
        .create_option(|option| {
            option
                .name("type")
                .description("Match Type")
                .kind(CommandOptionType::String)
                .add_string_choice("Scrim", "scrim")
                .add_string_choice("Match", "gsc_match")
                .required(true)
        })
        .create_option(|option| {
            option
                .name("title")
                .description("Match Header (e.g., Cy v RS - Pen on RS)")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("link")
                .description("GIF/Video link")
                .kind(CommandOptionType::String)
                .required(true)
        })
}

pub async fn handle_submit_pen(
    state: &BotState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let route = match command.guild_id.and_then(|guild| state.config.route_for(guild.0)) {
        Some(route) => route,
        None => {
            warn!("submit_pen used outside a routed guild: {:?}", command.guild_id);
            send_ephemeral(ctx, command, "You are not allowed to use this command!").await?;
            return Ok(());
        }
    };

    let (match_type, title, link) = match (
        string_option(command, "type"),
        string_option(command, "title"),
        string_option(command, "link"),
    ) {
        (Some(match_type), Some(title), Some(link)) => (match_type, title, link),
        _ => {
            send_ephemeral(ctx, command, "Please provide a type, title and link.").await?;
            return Ok(());
        }
    };

    let submitter = command.user.id.to_string();
    let preview = state.registry.preview(title, link, &submitter);
    let channel = ChannelId(route.channel_for(match_type));

    // Discord auto-embeds the link above the tally embed
    let posted = channel
        .send_message(&ctx.http, |message| {
            message
                .content(format!("<@&{}>\n{}", route.ping_role_id, link))
                .embed(|embed| tally_embed(embed, &preview))
                .components(|components| vote_components(components, state.registry.choices()))
        })
        .await;

    let message = match posted {
        Ok(message) => message,
        Err(e) => {
            error!("Failed to post penalty to channel {}: {:?}", channel.0, e);
            send_ephemeral(ctx, command, "Something went wrong when submitting your penalty!").await?;
            return Ok(());
        }
    };

    let incident_key = message.id.0.to_string();
    if let Err(e) = state
        .registry
        .open_incident(&incident_key, title, link, &submitter)
    {
        error!("Could not open penalty incident {}: {}", incident_key, e);
        send_ephemeral(ctx, command, "Something went wrong when submitting your penalty!").await?;
        return Ok(());
    }

    info!(
        "Penalty '{}' submitted by {} to channel {} as incident {}",
        title, submitter, channel.0, incident_key
    );
    send_ephemeral(ctx, command, "Penalty submitted successfully!").await?;
    Ok(())
}
