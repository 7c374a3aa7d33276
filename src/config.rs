use crate::penalty::{ChoiceSet, ChoiceSetError};
use serde::Deserialize;
use std::env;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite:penalty_vote.db";
const DEFAULT_CHOICES: &str = "0,5,10,20";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("{var} contains an invalid Discord id: {value:?}")]
    InvalidId { var: &'static str, value: String },
    #[error("PEN_ROUTES is not valid JSON: {0}")]
    InvalidRoutes(#[from] serde_json::Error),
    #[error("PENALTY_CHOICES is invalid: {0}")]
    Choices(#[from] ChoiceSetError),
}

/// Where `/submit_pen` posts for one guild.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PenRoute {
    pub guild_id: u64,
    pub ping_role_id: u64,
    pub scrim_channel_id: u64,
    pub match_channel_id: u64,
}

impl PenRoute {
    pub fn channel_for(&self, match_type: &str) -> u64 {
        if match_type == "scrim" {
            self.scrim_channel_id
        } else {
            self.match_channel_id
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub discord_token: String,
    pub database_url: String,
    pub penalty_choices: ChoiceSet,
    pub referee_role_ids: Vec<u64>,
    pub pen_routes: Vec<PenRoute>,
    pub rt_war_channel_id: Option<u64>,
    pub ct_war_channel_id: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("PROJECT_ENVIRONMENT").unwrap_or_else(|| "local".to_string());
        let key_var = if environment == "local" {
            "DISCORD_KEY_LOCAL"
        } else {
            "DISCORD_KEY_PROD"
        };
        let discord_token = var("DISCORD_TOKEN")
            .or_else(|| var(key_var))
            .ok_or(ConfigError::MissingVar("DISCORD_TOKEN"))?;

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let choices_raw = var("PENALTY_CHOICES").unwrap_or_else(|| DEFAULT_CHOICES.to_string());
        let penalty_choices = ChoiceSet::new(choices_raw.split(',').filter(|c| !c.trim().is_empty()))?;

        let pen_routes: Vec<PenRoute> = match var("PEN_ROUTES") {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        let mut referee_role_ids = match var("REFEREE_ROLE_IDS") {
            Some(raw) => parse_id_list("REFEREE_ROLE_IDS", &raw)?,
            None => Vec::new(),
        };
        for route in &pen_routes {
            if !referee_role_ids.contains(&route.ping_role_id) {
                referee_role_ids.push(route.ping_role_id);
            }
        }

        let rt_war_channel_id = var("RT_WAR_CHANNEL_ID")
            .map(|v| parse_id("RT_WAR_CHANNEL_ID", &v))
            .transpose()?;
        let ct_war_channel_id = var("CT_WAR_CHANNEL_ID")
            .map(|v| parse_id("CT_WAR_CHANNEL_ID", &v))
            .transpose()?;

        Ok(Self {
            environment,
            discord_token,
            database_url,
            penalty_choices,
            referee_role_ids,
            pen_routes,
            rt_war_channel_id,
            ct_war_channel_id,
        })
    }

    /// Routing for a guild; `None` means penalties can't be submitted there.
    pub fn route_for(&self, guild_id: u64) -> Option<&PenRoute> {
        self.pen_routes.iter().find(|r| r.guild_id == guild_id)
    }

    pub fn is_referee<I>(&self, role_ids: I) -> bool
    where
        I: IntoIterator<Item = u64>,
    {
        role_ids
            .into_iter()
            .any(|role| self.referee_role_ids.contains(&role))
    }
}

fn parse_id(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidId {
        var,
        value: value.to_string(),
    })
}

fn parse_id_list(var: &'static str, raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_id(var, part))
        .collect()
}
