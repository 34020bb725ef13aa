//! Relational row to graph upsert mapping.
//!
//! Immutable fields (`created_at`, `valid_from`) are create-only; everything
//! else is rewritten on every sync so the graph follows relational updates.

use beaver_core::model::*;

use crate::store::{NodeLabel, NodeUpsert, RelType, RelationshipUpsert};

pub fn environment_node(env: &Environment) -> NodeUpsert {
    NodeUpsert::new(NodeLabel::Environment, env.id)
        .set_on_create("created_at", env.created_at.as_str())
        .set("name", env.name.as_str())
        .set("description", env.description.clone())
}

pub fn team_node(team: &Team) -> NodeUpsert {
    NodeUpsert::new(NodeLabel::Team, team.id)
        .set_on_create("created_at", team.created_at.as_str())
        .set("name", team.name.as_str())
        .set("description", team.description.clone())
}

pub fn component_node(component: &Component) -> NodeUpsert {
    NodeUpsert::new(NodeLabel::Component, component.id)
        .set_on_create("created_at", component.created_at.as_str())
        .set_on_create("valid_from", component.created_at.as_str())
        .set("name", component.name.as_str())
        .set("description", component.description.clone())
        .set("status", component.status.as_str())
        .set("team_id", component.team_id)
        .set("category_id", component.category_id)
}

pub fn instance_node(instance: &ComponentInstance) -> NodeUpsert {
    NodeUpsert::new(NodeLabel::ComponentInstance, instance.id)
        .set_on_create("created_at", instance.created_at.as_str())
        .set("component_id", instance.component_id)
        .set("environment_id", instance.environment_id)
        .set("hostname", instance.hostname.clone())
        .set("specs", instance.specs.as_ref().map(|s| s.to_string()))
}

pub fn user_node(user: &User) -> NodeUpsert {
    NodeUpsert::new(NodeLabel::User, user.id)
        .set("name", user.name.as_str())
        .set("email", user.email.as_str())
}

pub fn adr_node(adr: &Adr) -> NodeUpsert {
    NodeUpsert::new(NodeLabel::Adr, adr.id)
        .set_on_create("created_at", adr.created_at.as_str())
        .set("title", adr.title.as_str())
        .set("description", adr.description.clone())
        .set("status", adr.status.as_str())
}

pub fn instantiates(instance: &ComponentInstance) -> RelationshipUpsert {
    RelationshipUpsert::new(RelType::Instantiates, instance.component_id, instance.id)
}

pub fn deployed_in(instance: &ComponentInstance) -> RelationshipUpsert {
    RelationshipUpsert::new(RelType::DeployedIn, instance.id, instance.environment_id)
}

pub fn managed_by(component_id: i64, team_id: i64) -> RelationshipUpsert {
    RelationshipUpsert::new(RelType::ManagedBy, component_id, team_id)
}

pub fn participates_in(participant: &AdrParticipant) -> RelationshipUpsert {
    RelationshipUpsert::new(RelType::ParticipatesIn, participant.user_id, participant.adr_id)
        .set("role", participant.role.as_str())
}

pub fn affects_instance(impact: &AdrComponentInstance) -> RelationshipUpsert {
    RelationshipUpsert::new(RelType::AffectsInstance, impact.adr_id, impact.instance_id)
        .set("impact_level", impact.impact_level.as_str())
        .set("notes", impact.notes.clone())
}

pub fn affects(link: &AdrComponent) -> RelationshipUpsert {
    RelationshipUpsert::new(RelType::Affects, link.adr_id, link.component_id)
}
