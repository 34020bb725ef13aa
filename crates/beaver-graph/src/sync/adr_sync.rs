//! User, ADR and ADR participant synchronization.
//!
//! Creates nodes and relationships:
//! - (:User)
//! - (:ADR)
//! - (:User)-[:PARTICIPATES_IN {role}]->(:ADR)

use anyhow::{Context, Result};
use tracing::debug;

use beaver_core::model::{Adr, AdrParticipant, User};

use super::{mapping, SyncResult, Synchronizer};
use crate::store::GraphSession;

impl Synchronizer {
    pub async fn sync_users(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let users = self.records.list_users().await.context("Failed to list users")?;

        let mut result = SyncResult::default();
        for user in &users {
            result.merge(&push_user(session.as_mut(), user).await?);
        }

        debug!(count = users.len(), "Users pushed");
        Ok(result)
    }

    pub async fn sync_adrs(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let adrs = self.records.list_adrs().await.context("Failed to list ADRs")?;

        let mut result = SyncResult::default();
        for adr in &adrs {
            result.merge(&push_adr(session.as_mut(), adr).await?);
        }

        debug!(count = adrs.len(), "ADRs pushed");
        Ok(result)
    }

    /// Sync every participation as a PARTICIPATES_IN relationship carrying
    /// the role.
    pub async fn sync_adr_participants(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let participants = self
            .records
            .list_adr_participants()
            .await
            .context("Failed to list ADR participants")?;

        let mut result = SyncResult::default();
        for participant in &participants {
            result.merge(&push_participant(session.as_mut(), participant).await?);
        }

        debug!(count = participants.len(), "ADR participants pushed");
        Ok(result)
    }
}

pub(crate) async fn push_user(session: &mut dyn GraphSession, user: &User) -> Result<SyncResult> {
    session.upsert_node(&mapping::user_node(user)).await?;
    Ok(SyncResult::node())
}

pub(crate) async fn push_adr(session: &mut dyn GraphSession, adr: &Adr) -> Result<SyncResult> {
    session.upsert_node(&mapping::adr_node(adr)).await?;
    Ok(SyncResult::node())
}

pub(crate) async fn push_participant(
    session: &mut dyn GraphSession,
    participant: &AdrParticipant,
) -> Result<SyncResult> {
    let mut result = SyncResult::default();
    result.link(
        session
            .merge_relationship(&mapping::participates_in(participant))
            .await?,
    );
    Ok(result)
}
