use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::{Observation, Target};
use crate::monitoring::types::SiteStatus;

const DOWN_COLOR: u32 = 0xFF0000;
const RECOVERY_COLOR: u32 = 0x00FF00;

/// Direction of a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Down,
    Recovery,
}

impl AlertKind {
    pub fn for_status(status: SiteStatus) -> Self {
        match status {
            SiteStatus::Down => AlertKind::Down,
            SiteStatus::Up => AlertKind::Recovery,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::Down => "🔴 Website Down Alert",
            AlertKind::Recovery => "🟢 Website Recovery Alert",
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            AlertKind::Down => DOWN_COLOR,
            AlertKind::Recovery => RECOVERY_COLOR,
        }
    }
}

/// Alert document posted to every sink, in Discord's webhook format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self { name: name.to_string(), value: value.into(), inline }
    }
}

impl AlertPayload {
    pub fn for_transition(
        target: &Target,
        observation: &Observation,
        previous_status: Option<SiteStatus>,
    ) -> Self {
        Self::build(target, observation, previous_status, Utc::now())
    }

    fn build(
        target: &Target,
        observation: &Observation,
        previous_status: Option<SiteStatus>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        let kind = AlertKind::for_status(observation.status);

        let mut fields = vec![
            EmbedField::new("Site", format!("{} ({})", target.display_name(), target.url), false),
            EmbedField::new("Status", observation.status.as_str().to_uppercase(), true),
            EmbedField::new(
                "Time",
                observation.checked_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                true,
            ),
        ];

        if let Some(previous) = previous_status {
            fields.push(EmbedField::new("Previous Status", previous.as_str().to_uppercase(), true));
        }

        if let Some(error) = &observation.error_message {
            fields.push(EmbedField::new("Error", error.clone(), false));
        }

        if let Some(latency) = observation.latency_ms {
            fields.push(EmbedField::new("Response Time", format!("{latency}ms"), true));
        }

        Self {
            embeds: vec![Embed {
                title: kind.title().to_string(),
                color: kind.color(),
                fields,
                timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            }],
        }
    }

    pub fn kind(&self) -> Option<AlertKind> {
        let color = self.embeds.first()?.color;
        match color {
            DOWN_COLOR => Some(AlertKind::Down),
            RECOVERY_COLOR => Some(AlertKind::Recovery),
            _ => None,
        }
    }
}
