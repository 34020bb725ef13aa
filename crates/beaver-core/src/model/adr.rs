//! Architectural Decision Records and their associations.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BeaverError;

/// A catalogue user (ADR participant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
}

/// ADR status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdrStatus {
    #[default]
    Draft,
    Accepted,
    Superseded,
    Rejected,
}

impl AdrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Accepted => "ACCEPTED",
            Self::Superseded => "SUPERSEDED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for AdrStatus {
    type Err = BeaverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "ACCEPTED" => Ok(Self::Accepted),
            "SUPERSEDED" => Ok(Self::Superseded),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(BeaverError::invalid_enum("ADR status", s)),
        }
    }
}

/// An Architectural Decision Record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adr {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: AdrStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrInput {
    pub title: String,
    pub description: Option<String>,
    pub status: AdrStatus,
}

impl AdrInput {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Role of a user on an ADR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Owner,
    Reviewer,
    Consumer,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Reviewer => "REVIEWER",
            Self::Consumer => "CONSUMER",
        }
    }
}

impl FromStr for ParticipantRole {
    type Err = BeaverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OWNER" => Ok(Self::Owner),
            "REVIEWER" => Ok(Self::Reviewer),
            "CONSUMER" => Ok(Self::Consumer),
            _ => Err(BeaverError::invalid_enum("participant role", s)),
        }
    }
}

/// A user's participation in an ADR. Every ADR keeps at least one OWNER.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrParticipant {
    pub id: i64,
    pub adr_id: i64,
    pub user_id: i64,
    pub role: ParticipantRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrParticipantInput {
    pub adr_id: i64,
    pub user_id: i64,
    pub role: ParticipantRole,
}

/// Impact of an ADR on a component instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ImpactLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl FromStr for ImpactLevel {
    type Err = BeaverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => Err(BeaverError::invalid_enum("impact level", s)),
        }
    }
}

/// An ADR affecting a specific deployed instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrComponentInstance {
    pub id: i64,
    pub adr_id: i64,
    pub instance_id: i64,
    pub impact_level: ImpactLevel,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrComponentInstanceInput {
    pub adr_id: i64,
    pub instance_id: i64,
    pub impact_level: ImpactLevel,
    pub notes: Option<String>,
}

impl AdrComponentInstanceInput {
    pub fn new(adr_id: i64, instance_id: i64) -> Self {
        Self {
            adr_id,
            instance_id,
            impact_level: ImpactLevel::default(),
            notes: None,
        }
    }
}

/// An ADR affecting a component as a whole. Derived from
/// [`AdrComponentInstance`] rows when missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdrComponent {
    pub adr_id: i64,
    pub component_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [
            ParticipantRole::Owner,
            ParticipantRole::Reviewer,
            ParticipantRole::Consumer,
        ] {
            assert_eq!(role.as_str().parse::<ParticipantRole>().unwrap(), role);
        }
        assert!("APPROVER".parse::<ParticipantRole>().is_err());
    }

    #[test]
    fn test_parsing_is_case_insensitive() {
        assert_eq!("accepted".parse::<AdrStatus>().unwrap(), AdrStatus::Accepted);
        assert_eq!("High".parse::<ImpactLevel>().unwrap(), ImpactLevel::High);
    }
}
