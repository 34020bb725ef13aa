//! Shared test fixtures: an in-memory SQLite record store wired to the mock
//! graph store.

use std::sync::Arc;

use beaver_core::model::*;
use beaver_db::{migrations, DbPool, RecordStore};

use crate::mock::MockGraphStore;
use crate::sync::Synchronizer;

pub struct Fixture {
    pub db: Arc<DbPool>,
    pub graph: MockGraphStore,
    pub sync: Synchronizer,
}

impl Fixture {
    pub fn new() -> Self {
        let pool = DbPool::in_memory().unwrap();
        migrations::run_migrations(&pool).unwrap();
        let db = Arc::new(pool);
        let graph = MockGraphStore::new();
        let sync = Synchronizer::new(db.clone(), Arc::new(graph.clone()));
        Self { db, graph, sync }
    }
}

/// Ids of the rows created by [`seed_catalog`].
pub struct Catalog {
    pub development: i64,
    pub production: i64,
    pub team: i64,
    pub component: i64,
    pub instance: i64,
    pub owner: i64,
    pub reviewer: i64,
    pub adr: i64,
    pub impact: i64,
}

/// A small catalogue touching every entity kind except ADRComponent, which
/// is left for the sync to derive.
pub async fn seed_catalog(fx: &Fixture) -> Catalog {
    let db = &fx.db;
    let development = db.create_environment(&EnvironmentInput::named("development")).await.unwrap();
    let production = db.create_environment(&EnvironmentInput::named("production")).await.unwrap();
    let team = db.create_team(&TeamInput::named("payments")).await.unwrap();
    let component = db
        .create_component(&ComponentInput::named("ledger").managed_by(team.id))
        .await
        .unwrap();
    let instance = db
        .create_component_instance(&ComponentInstanceInput::new(component.id, production.id))
        .await
        .unwrap();
    let owner = db
        .create_user(&UserInput {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        })
        .await
        .unwrap();
    let reviewer = db
        .create_user(&UserInput {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
        })
        .await
        .unwrap();
    let adr = db
        .create_adr(&AdrInput::titled("Adopt event sourcing for ledger"), owner.id)
        .await
        .unwrap();
    db.add_adr_participant(&AdrParticipantInput {
        adr_id: adr.id,
        user_id: reviewer.id,
        role: ParticipantRole::Reviewer,
    })
    .await
    .unwrap();
    let impact = db
        .create_adr_component_instance(&AdrComponentInstanceInput::new(adr.id, instance.id))
        .await
        .unwrap();

    Catalog {
        development: development.id,
        production: production.id,
        team: team.id,
        component: component.id,
        instance: instance.id,
        owner: owner.id,
        reviewer: reviewer.id,
        adr: adr.id,
        impact: impact.id,
    }
}
