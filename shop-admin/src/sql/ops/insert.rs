//! Compilation of inserts into `INSERT` statements.

use super::{
    super::db::{Connection, Insert, Value},
    parse_id, Error,
};
use crate::graphql::type_system::{Id, Table};

/// Insert a row into `table`, returning its primary key.
///
/// Only the assigned columns are written; the rest take their defaults.
pub async fn execute<C: Connection>(
    conn: &C,
    table: Table,
    assignments: Vec<(&'static str, Value)>,
) -> Result<Id, Error> {
    let (columns, values): (Vec<_>, Vec<_>) = assignments.into_iter().unzip();
    let rows = conn
        .insert(table.name, columns)
        .rows([values])
        .returning(table.id)
        .execute()
        .await
        .map_err(Error::sql)?;
    match rows.as_slice() {
        [row] => parse_id(&table, row),
        _ => Err(Error::sql(format!(
            "insert into {} returned {} rows",
            table.name,
            rows.len()
        ))),
    }
}
