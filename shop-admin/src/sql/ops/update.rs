//! Compilation of updates into `UPDATE` statements.

use super::{
    super::db::{CmpOp, Connection, Update, Value},
    select, Error,
};
use crate::graphql::type_system::{Id, Table};

/// Assign new values to the row of `table` with primary key `id`.
///
/// Returns whether the row exists.
pub async fn execute<C: Connection>(
    conn: &C,
    table: Table,
    id: Id,
    assignments: Vec<(&'static str, Value)>,
) -> Result<bool, Error> {
    if assignments.is_empty() && table.touch.is_none() {
        return select::exists(conn, table, id).await;
    }

    let mut update = conn.update(table.name);
    for (column, value) in assignments {
        update = update.set(column, value);
    }
    if let Some(column) = table.touch {
        update = update.touch(column);
    }
    let updated = update
        .cmp(table.id, CmpOp::Eq, id)
        .execute()
        .await
        .map_err(Error::sql)?;
    Ok(updated > 0)
}
