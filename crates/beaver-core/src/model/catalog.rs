//! Environments, teams, categories, components and their deployed instances.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BeaverError;

/// Environments every installation starts with.
pub const SEEDED_ENVIRONMENTS: &[(&str, &str)] = &[
    ("development", "Development environment"),
    ("homologation", "Homologation / staging environment"),
    ("production", "Production environment"),
];

/// A deployment environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInput {
    pub name: String,
    pub description: Option<String>,
}

impl EnvironmentInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// A team owning components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInput {
    pub name: String,
    pub description: Option<String>,
}

impl TeamInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Component category (not mirrored in the graph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Component lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentStatus {
    #[default]
    Active,
    Planned,
    Deprecated,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Planned => "PLANNED",
            Self::Deprecated => "DEPRECATED",
        }
    }

    /// True for values written by older call sites that the data migration
    /// rewrites.
    pub fn is_legacy(raw: &str) -> bool {
        raw.eq_ignore_ascii_case("INACTIVE")
    }
}

impl FromStr for ComponentStatus {
    type Err = BeaverError;

    /// `INACTIVE` is a legacy alias of `DEPRECATED`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "PLANNED" => Ok(Self::Planned),
            "DEPRECATED" | "INACTIVE" => Ok(Self::Deprecated),
            _ => Err(BeaverError::invalid_enum("component status", s)),
        }
    }
}

/// A catalogued software component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ComponentStatus,
    pub category_id: Option<i64>,
    pub team_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInput {
    pub name: String,
    pub description: Option<String>,
    pub status: ComponentStatus,
    pub category_id: Option<i64>,
    pub team_id: Option<i64>,
}

impl ComponentInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn managed_by(mut self, team_id: i64) -> Self {
        self.team_id = Some(team_id);
        self
    }
}

/// A component deployed into an environment. Unique per
/// (component, environment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub id: i64,
    pub component_id: i64,
    pub environment_id: i64,
    pub hostname: Option<String>,
    /// Opaque hardware/spec blob (cpu, memory, disk, ...).
    pub specs: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstanceInput {
    pub component_id: i64,
    pub environment_id: i64,
    pub hostname: Option<String>,
    pub specs: Option<serde_json::Value>,
}

impl ComponentInstanceInput {
    pub fn new(component_id: i64, environment_id: i64) -> Self {
        Self {
            component_id,
            environment_id,
            ..Self::default()
        }
    }
}
