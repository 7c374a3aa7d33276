use crate::handlers::render::{fit_message, summary_text, tally_embed, vote_error_message};
use crate::handlers::BotState;
use crate::penalty::{Snapshot, VoteError};
use log::{info, warn};
use serenity::model::application::interaction::{
    message_component::MessageComponentInteraction, InteractionResponseType,
};
use serenity::prelude::*;

pub async fn send_ephemeral(
    ctx: &Context,
    component: &MessageComponentInteraction,
    content: &str,
) -> Result<(), serenity::Error> {
    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await
}

// Only members holding a referee role may vote or see who voted
async fn ensure_referee(
    state: &BotState,
    ctx: &Context,
    component: &MessageComponentInteraction,
) -> Result<bool, serenity::Error> {
    let member = match &component.member {
        Some(member) => member,
        None => {
            send_ephemeral(ctx, component, "Unable to verify your roles. Please try again or contact an admin.").await?;
            return Ok(false);
        }
    };

    if !state.config.is_referee(member.roles.iter().map(|role| role.0)) {
        info!("Rejected penalty action from non-referee {}", component.user.id);
        send_ephemeral(ctx, component, "Only referees can vote on penalties.").await?;
        return Ok(false);
    }

    Ok(true)
}

// Replace the tally embed on the penalty message; buttons are left as they are
async fn update_tally(
    ctx: &Context,
    component: &MessageComponentInteraction,
    snapshot: &Snapshot,
) -> Result<(), serenity::Error> {
    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::UpdateMessage)
                .interaction_response_data(|message| message.embed(|embed| tally_embed(embed, snapshot)))
        })
        .await
}

async fn report_vote_result(
    ctx: &Context,
    component: &MessageComponentInteraction,
    incident_key: &str,
    result: Result<Snapshot, VoteError>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match result {
        Ok(snapshot) => {
            update_tally(ctx, component, &snapshot).await?;
            info!(
                "Incident {} now has {} vote(s)",
                incident_key,
                snapshot.total_votes()
            );
        }
        Err(e) => {
            info!("Vote action on incident {} rejected: {}", incident_key, e);
            send_ephemeral(ctx, component, &vote_error_message(&e)).await?;
        }
    }
    Ok(())
}

pub async fn handle_pen_vote(
    state: &BotState,
    ctx: &Context,
    component: &MessageComponentInteraction,
    incident_key: &str,
    choice: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !ensure_referee(state, ctx, component).await? {
        return Ok(());
    }

    let voter_id = component.user.id.to_string();
    info!("Recording penalty vote: incident={}, voter={}, choice={}", incident_key, voter_id, choice);

    let result = state.registry.add_vote(incident_key, &voter_id, choice);
    report_vote_result(ctx, component, incident_key, result).await
}

pub async fn handle_remove_vote(
    state: &BotState,
    ctx: &Context,
    component: &MessageComponentInteraction,
    incident_key: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !ensure_referee(state, ctx, component).await? {
        return Ok(());
    }

    let voter_id = component.user.id.to_string();
    info!("Removing penalty vote: incident={}, voter={}", incident_key, voter_id);

    let result = state.registry.remove_vote(incident_key, &voter_id);
    report_vote_result(ctx, component, incident_key, result).await
}

pub async fn handle_show_summary(
    state: &BotState,
    ctx: &Context,
    component: &MessageComponentInteraction,
    incident_key: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !ensure_referee(state, ctx, component).await? {
        return Ok(());
    }

    let content = match state.registry.summary(incident_key) {
        Ok(summary) => fit_message(&summary_text(&summary)),
        Err(e) => {
            warn!("Summary requested for unknown incident {}: {}", incident_key, e);
            vote_error_message(&e)
        }
    };

    send_ephemeral(ctx, component, &content).await?;
    Ok(())
}
