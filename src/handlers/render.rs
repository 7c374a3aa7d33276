use crate::penalty::{ChoiceSet, Snapshot, Summary, VoteError, NO_VOTES_PLACEHOLDER};
use serenity::builder::{CreateComponents, CreateEmbed};
use serenity::model::application::component::ButtonStyle;

pub const VOTE_PREFIX: &str = "penVote_";
pub const REMOVE_ID: &str = "penRemove";
pub const SUMMARY_ID: &str = "penSummary";

const EMBED_COLOUR: u32 = 0x00FF00;
// Discord rejects message content over 2000 characters
pub const MAX_MESSAGE_LEN: usize = 2000;
const TRUNCATED_SUFFIX: &str = "\n…(truncated)";
// Discord allows five buttons per action row
const BUTTONS_PER_ROW: usize = 5;

pub fn tally_fields(snapshot: &Snapshot) -> Vec<(String, String, bool)> {
    snapshot
        .tallies
        .iter()
        .map(|tally| {
            let noun = if tally.count == 1 { "vote" } else { "votes" };
            (tally.choice.clone(), format!("{} {}", tally.count, noun), true)
        })
        .collect()
}

pub fn incident_description(snapshot: &Snapshot) -> String {
    format!("{}\nSubmitted by: <@{}>", snapshot.description, snapshot.submitter)
}

pub fn tally_embed<'a>(embed: &'a mut CreateEmbed, snapshot: &Snapshot) -> &'a mut CreateEmbed {
    embed
        .title(&snapshot.title)
        .description(incident_description(snapshot))
        .colour(EMBED_COLOUR)
        .fields(tally_fields(snapshot))
        .footer(|footer| footer.text(format!("Total votes: {}", snapshot.total_votes())))
}

pub fn vote_components<'a>(
    components: &'a mut CreateComponents,
    choices: &ChoiceSet,
) -> &'a mut CreateComponents {
    for chunk in choices.labels().chunks(BUTTONS_PER_ROW) {
        components.create_action_row(|row| {
            for label in chunk {
                row.create_button(|btn| {
                    btn.custom_id(format!("{}{}", VOTE_PREFIX, label))
                        .label(label)
                        .style(ButtonStyle::Primary)
                });
            }
            row
        });
    }

    components.create_action_row(|row| {
        row.create_button(|btn| {
            btn.custom_id(REMOVE_ID)
                .label("Remove my vote")
                .style(ButtonStyle::Danger)
        })
        .create_button(|btn| {
            btn.custom_id(SUMMARY_ID)
                .label("Show votes")
                .style(ButtonStyle::Secondary)
        })
    })
}

pub fn summary_text(summary: &Summary) -> String {
    let mut text = format!("**{}**\n", summary.title);
    for row in &summary.rows {
        let voters = if row.voters.is_empty() {
            NO_VOTES_PLACEHOLDER.to_string()
        } else {
            row.voters
                .iter()
                .map(|voter| format!("<@{}>", voter))
                .collect::<Vec<_>>()
                .join(", ")
        };
        text.push_str(&format!("**{}**: {}\n", row.choice, voters));
    }
    text
}

/// Cut `text` down to what fits in one Discord message.
pub fn fit_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        return text.to_string();
    }

    let keep = MAX_MESSAGE_LEN - TRUNCATED_SUFFIX.chars().count();
    let mut fitted: String = text.chars().take(keep).collect();
    fitted.push_str(TRUNCATED_SUFFIX);
    fitted
}

pub fn snapshot_text(snapshot: &Snapshot) -> String {
    let mut text = format!("**{}**\n{}\n", snapshot.title, incident_description(snapshot));
    for (choice, count, _) in tally_fields(snapshot) {
        text.push_str(&format!("{}: {}\n", choice, count));
    }
    text.push_str(&format!("Total votes: {}", snapshot.total_votes()));
    text
}

// What a referee sees when a vote action is rejected
pub fn vote_error_message(error: &VoteError) -> String {
    match error {
        VoteError::AlreadyVoted(_) => {
            "You have already voted on this penalty. Remove your vote first to change it.".to_string()
        }
        VoteError::NoExistingVote(_) => "You haven't voted on this penalty yet.".to_string(),
        VoteError::InvalidChoice(choice) => format!("`{}` is not a valid penalty.", choice),
        VoteError::IncidentNotFound(_) => {
            "This penalty vote isn't open yet or is no longer being tracked. Try again in a moment.".to_string()
        }
        VoteError::DuplicateIncident(_) => "This penalty is already open for voting.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::penalty::VoteRegistry;

    fn registry_with_votes() -> VoteRegistry {
        let registry = VoteRegistry::default();
        registry
            .open_incident("msg-1", "Cy v RS - Pen on RS", "https://clip", "42")
            .unwrap();
        registry.add_vote("msg-1", "u1", "10").unwrap();
        registry.add_vote("msg-1", "u2", "10").unwrap();
        registry.add_vote("msg-1", "u3", "0").unwrap();
        registry
    }

    #[test]
    fn test_tally_fields_follow_choice_order() {
        let snapshot = registry_with_votes().snapshot("msg-1").unwrap();
        let fields = tally_fields(&snapshot);
        assert_eq!(
            fields,
            vec![
                ("0".to_string(), "1 vote".to_string(), true),
                ("5".to_string(), "0 votes".to_string(), true),
                ("10".to_string(), "2 votes".to_string(), true),
                ("20".to_string(), "0 votes".to_string(), true),
            ]
        );
        assert_eq!(incident_description(&snapshot), "https://clip\nSubmitted by: <@42>");
    }

    #[test]
    fn test_summary_text_mentions_voters() {
        let summary = registry_with_votes().summary("msg-1").unwrap();
        assert_eq!(
            summary_text(&summary),
            "**Cy v RS - Pen on RS**\n**0**: <@u3>\n**5**: No votes\n**10**: <@u1>, <@u2>\n**20**: No votes\n"
        );
    }

    #[test]
    fn test_snapshot_text_has_total() {
        let snapshot = registry_with_votes().snapshot("msg-1").unwrap();
        let text = snapshot_text(&snapshot);
        assert!(text.starts_with("**Cy v RS - Pen on RS**\n"));
        assert!(text.contains("10: 2 votes\n"));
        assert!(text.ends_with("Total votes: 3"));
    }

    #[test]
    fn test_error_messages() {
        let already = vote_error_message(&VoteError::AlreadyVoted("u1".to_string()));
        assert!(already.contains("Remove your vote first"));
        assert_eq!(
            vote_error_message(&VoteError::InvalidChoice("15".to_string())),
            "`15` is not a valid penalty."
        );

        let missing = vote_error_message(&VoteError::IncidentNotFound("msg-1".to_string()));
        assert!(missing.contains("isn't open yet"));
        assert!(missing.contains("no longer being tracked"));
    }

    #[test]
    fn test_fit_message_leaves_short_text() {
        assert_eq!(fit_message("short"), "short");
        let exact = "a".repeat(MAX_MESSAGE_LEN);
        assert_eq!(fit_message(&exact), exact);
    }

    #[test]
    fn test_large_summary_fits_one_message() {
        let registry = VoteRegistry::default();
        let title = "T".repeat(300);
        registry.open_incident("msg-1", &title, "link", "42").unwrap();
        for i in 0..150 {
            registry
                .add_vote("msg-1", &format!("{}", 100_000_000_000_000_000u64 + i), "10")
                .unwrap();
        }

        let full = summary_text(&registry.summary("msg-1").unwrap());
        assert!(full.chars().count() > MAX_MESSAGE_LEN);

        let fitted = fit_message(&full);
        assert_eq!(fitted.chars().count(), MAX_MESSAGE_LEN);
        assert!(fitted.ends_with("…(truncated)"));
        assert!(full.starts_with(fitted.trim_end_matches(TRUNCATED_SUFFIX)));
    }
}
