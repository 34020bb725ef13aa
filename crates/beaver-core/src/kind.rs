//! Entity kinds tracked by the synchronizer and the integrity validator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BeaverError;

/// A synchronized entity type.
///
/// Node kinds map to one graph node per relational row; relationship kinds
/// (participants, affected instances, affected components) map to one graph
/// edge per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Environments,
    Components,
    Teams,
    ComponentInstances,
    Users,
    Adrs,
    AdrParticipants,
    AdrComponentInstances,
    AdrComponents,
}

impl EntityKind {
    /// Every kind, in full-sync dependency order.
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Environments,
        EntityKind::Components,
        EntityKind::Teams,
        EntityKind::ComponentInstances,
        EntityKind::Users,
        EntityKind::Adrs,
        EntityKind::AdrParticipants,
        EntityKind::AdrComponentInstances,
        EntityKind::AdrComponents,
    ];

    /// Stable report name (e.g. `componentInstances`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environments => "environments",
            Self::Components => "components",
            Self::Teams => "teams",
            Self::ComponentInstances => "componentInstances",
            Self::Users => "users",
            Self::Adrs => "adrs",
            Self::AdrParticipants => "adrParticipants",
            Self::AdrComponentInstances => "adrComponentInstances",
            Self::AdrComponents => "adrComponents",
        }
    }

    /// True when the kind is stored as a graph relationship rather than a node.
    pub fn is_relationship(&self) -> bool {
        matches!(
            self,
            Self::AdrParticipants | Self::AdrComponentInstances | Self::AdrComponents
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = BeaverError;

    /// Accepts the report name, snake_case and the singular entity name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        let kind = match normalized.as_str() {
            "environments" | "environment" => Self::Environments,
            "components" | "component" => Self::Components,
            "teams" | "team" => Self::Teams,
            "componentinstances" | "componentinstance" | "instances" | "instance" => {
                Self::ComponentInstances
            }
            "users" | "user" => Self::Users,
            "adrs" | "adr" => Self::Adrs,
            "adrparticipants" | "adrparticipant" | "participants" | "participant" => {
                Self::AdrParticipants
            }
            "adrcomponentinstances" | "adrcomponentinstance" => Self::AdrComponentInstances,
            "adrcomponents" | "adrcomponent" => Self::AdrComponents,
            _ => return Err(BeaverError::UnknownEntityKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// Structural anomaly classes detected in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrphanKind {
    /// ComponentInstance nodes missing INSTANTIATES or DEPLOYED_IN.
    #[serde(rename = "orphanedInstances")]
    Instances,
    /// Component nodes with a team but no MANAGED_BY edge.
    UnmanagedComponents,
    /// Component nodes with several MANAGED_BY edges or one to the wrong team.
    MislinkedComponents,
    /// ComponentInstance nodes with several INSTANTIATES/DEPLOYED_IN edges or
    /// one to the wrong component or environment.
    MislinkedInstances,
}

impl OrphanKind {
    pub const ALL: [OrphanKind; 4] = [
        OrphanKind::Instances,
        OrphanKind::UnmanagedComponents,
        OrphanKind::MislinkedComponents,
        OrphanKind::MislinkedInstances,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instances => "orphanedInstances",
            Self::UnmanagedComponents => "unmanagedComponents",
            Self::MislinkedComponents => "mislinkedComponents",
            Self::MislinkedInstances => "mislinkedInstances",
        }
    }
}

impl fmt::Display for OrphanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
