//! Database query implementations.

pub mod adrs;
pub mod components;
pub mod environments;
pub mod impacts;
pub mod instances;
pub mod participants;
pub mod teams;
pub mod users;

use beaver_core::EntityKind;
use rusqlite::types::Type;

use crate::pool::{DbPool, DbResult};

/// Current UTC timestamp in RFC 3339, as stored in `created_at` columns.
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Parse an enum column, surfacing bad values as a conversion error.
pub(crate) fn parse_column<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = beaver_core::BeaverError>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Table backing an entity kind.
fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Environments => "environments",
        EntityKind::Teams => "teams",
        EntityKind::Components => "components",
        EntityKind::ComponentInstances => "component_instances",
        EntityKind::Users => "users",
        EntityKind::Adrs => "adrs",
        EntityKind::AdrParticipants => "adr_participants",
        EntityKind::AdrComponentInstances => "adr_component_instances",
        EntityKind::AdrComponents => "adr_components",
    }
}

/// Row count for an entity kind.
pub fn count(pool: &DbPool, kind: EntityKind) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT COUNT(*) FROM {}", table_for(kind));
        let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n)
    })
}
