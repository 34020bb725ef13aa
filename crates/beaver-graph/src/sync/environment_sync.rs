//! Environment synchronization.
//!
//! Creates `(:Environment)` nodes. Environments have no outbound
//! relationships; instances link to them through DEPLOYED_IN.

use anyhow::{Context, Result};
use tracing::debug;

use beaver_core::model::Environment;

use super::{mapping, SyncResult, Synchronizer};
use crate::store::GraphSession;

impl Synchronizer {
    /// Sync all environments.
    pub async fn sync_environments(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let environments = self
            .records
            .list_environments()
            .await
            .context("Failed to list environments")?;

        let mut result = SyncResult::default();
        for env in &environments {
            result.merge(&push_environment(session.as_mut(), env).await?);
        }

        debug!(count = environments.len(), "Environments pushed");
        Ok(result)
    }
}

pub(crate) async fn push_environment(
    session: &mut dyn GraphSession,
    env: &Environment,
) -> Result<SyncResult> {
    session.upsert_node(&mapping::environment_node(env)).await?;
    Ok(SyncResult::node())
}

#[cfg(test)]
mod tests {
    use beaver_core::model::EnvironmentInput;
    use beaver_db::RecordStore;

    use crate::fixtures::Fixture;
    use crate::store::{NodeLabel, PropValue};

    #[tokio::test]
    async fn test_sync_environments_is_idempotent() {
        let fx = Fixture::new();
        fx.db.create_environment(&EnvironmentInput::named("staging")).await.unwrap();
        fx.db.create_environment(&EnvironmentInput::named("qa")).await.unwrap();

        let first = fx.sync.sync_environments().await.unwrap();
        let second = fx.sync.sync_environments().await.unwrap();

        assert_eq!(first.nodes_upserted, 2);
        assert_eq!(first, second);
        assert_eq!(fx.graph.node_ids(NodeLabel::Environment).len(), 2);
        assert_eq!(fx.graph.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_sync_environments_follows_renames() {
        let fx = Fixture::new();
        let env = fx.db.create_environment(&EnvironmentInput::named("stage")).await.unwrap();
        fx.sync.sync_environments().await.unwrap();

        fx.db
            .update_environment(env.id, &EnvironmentInput::named("staging"))
            .await
            .unwrap();
        fx.sync.sync_environments().await.unwrap();

        let props = fx.graph.node(NodeLabel::Environment, env.id).unwrap();
        assert_eq!(props["name"], PropValue::Str("staging".into()));
        assert_eq!(props["created_at"], PropValue::Str(env.created_at.clone()));
    }

    #[tokio::test]
    async fn test_session_released_on_graph_error() {
        let fx = Fixture::new();
        fx.db.create_environment(&EnvironmentInput::named("staging")).await.unwrap();
        fx.graph.fail_upserts_of(Some(NodeLabel::Environment));

        assert!(fx.sync.sync_environments().await.is_err());
        assert_eq!(fx.graph.sessions_opened(), 1);
        assert_eq!(fx.graph.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_sync_aborts_when_session_unavailable() {
        let fx = Fixture::new();
        fx.graph.fail_sessions(true);
        assert!(fx.sync.sync_environments().await.is_err());
        assert_eq!(fx.graph.open_sessions(), 0);
    }
}
