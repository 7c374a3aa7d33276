use crate::commands::{send_ephemeral, string_option};
use crate::handlers::BotState;
use crate::models::{Player, TrackType, War};
use log::{error, info};
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::id::ChannelId;
use serenity::prelude::*;

// How many wars /billboard lists
const BILLBOARD_LIMIT: usize = 10;

pub fn create_new_war_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("create-new-war")
        .description("Starts a new war and posts it on the billboard. Default is RT.")
        .create_option(|option| track_type_option(option))
}

pub fn create_billboard_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("billboard")
        .description("List the wars on the billboard. Default is RT.")
        .create_option(|option| track_type_option(option))
}

fn track_type_option(
    option: &mut serenity::builder::CreateApplicationCommandOption,
) -> &mut serenity::builder::CreateApplicationCommandOption {
    option
        .name("track_type")
        .description("Track type (RT or CT). If omitted, defaults to RT.")
        .kind(CommandOptionType::String)
        .add_string_choice("RT", "RT")
        .add_string_choice("CT", "CT")
        .required(false)
}

pub fn war_announcement(war: &War, user_id: &str) -> String {
    format!(
        "New **{}** war started in **{}** by <@{}>!",
        war.war_type, war.team_name, user_id
    )
}

pub fn billboard_text(track: TrackType, wars: &[War]) -> String {
    if wars.is_empty() {
        return format!("No **{}** wars on the billboard.", track);
    }

    let mut text = format!("**{} billboard**\n", track);
    for war in wars.iter().take(BILLBOARD_LIMIT) {
        let lineup = war
            .lineup
            .iter()
            .map(|player| player.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!(
            "**{}** since {} | {} player(s): {}\n",
            war.team_name,
            war.start_time.format("%Y-%m-%d %H:%M UTC"),
            war.lineup.len(),
            lineup
        ));
    }
    text
}

pub async fn handle_create_new_war(
    state: &BotState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let track = TrackType::parse_or_default(string_option(command, "track_type"));
    let team_name = command
        .guild_id
        .and_then(|guild| guild.name(ctx))
        .unwrap_or_else(|| "Unknown Server".to_string());
    let user_id = command.user.id.to_string();
    let display_name = command
        .member
        .as_ref()
        .and_then(|member| member.nick.clone())
        .unwrap_or_else(|| command.user.name.clone());

    let war = War::new(track, team_name, Player::runner(display_name));
    if let Err(e) = state.database.save_war(&war).await {
        error!("Failed to save war {} to the billboard: {}", war.id, e);
        send_ephemeral(ctx, command, "Could not save the war to the billboard.").await?;
        return Ok(());
    }
    info!("Added {} war {} for {}", war.war_type, war.id, war.team_name);

    send_ephemeral(
        ctx,
        command,
        &format!(
            "Command received in **{}**.\nTrack type: **{}**\nYour user ID is `{}`.",
            war.team_name, war.war_type, user_id
        ),
    )
    .await?;

    let channel_id = match track {
        TrackType::Rt => state.config.rt_war_channel_id,
        TrackType::Ct => state.config.ct_war_channel_id,
    };
    if let Some(channel_id) = channel_id {
        let channel = ChannelId(channel_id);
        if let Err(e) = channel.say(&ctx.http, war_announcement(&war, &user_id)).await {
            error!("Error sending to target channel {}: {:?}", channel_id, e);
        }
    }

    Ok(())
}

pub async fn handle_billboard(
    state: &BotState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let track = TrackType::parse_or_default(string_option(command, "track_type"));
    let wars = state.database.get_wars_by_track(track).await?;
    send_ephemeral(ctx, command, &billboard_text(track, &wars)).await?;
    Ok(())
}
