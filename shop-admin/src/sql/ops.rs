//! Compilation of record operations into low-level SQL statements.
//!
//! Each operation takes the static [`Table`](crate::graphql::type_system::Table) description of a
//! record and builds the corresponding statement with the [`Connection`](super::db::Connection)
//! builders. Database errors are wrapped into the data source [`Error`].

use crate::graphql::backend::Error;
use crate::graphql::type_system::{Id, Table};
use super::db::{FromValue, Row, Value};

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

/// Read the primary key from the first column of `row`.
fn parse_id<R: Row>(table: &Table, row: &R) -> Result<Id, Error> {
    let value: Value = row.column(0).map_err(Error::sql)?;
    Id::from_value(value).map_err(|err| Error::decode(table, table.id, err))
}
