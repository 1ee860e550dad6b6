//! Compilation of deletes into `DELETE` statements.

use super::{
    super::db::{CmpOp, Connection, Delete},
    Error,
};
use crate::graphql::type_system::{Id, Table};

/// Delete the row of `table` with primary key `id`, returning whether it existed.
pub async fn execute<C: Connection>(conn: &C, table: Table, id: Id) -> Result<bool, Error> {
    let deleted = conn
        .delete(table.name)
        .cmp(table.id, CmpOp::Eq, id)
        .execute()
        .await
        .map_err(Error::sql)?;
    tracing::debug!("deleted {deleted} rows from {}", table.name);
    Ok(deleted > 0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        init_logging,
        sql::{
            db::{mock, CreateTable, Insert, SchemaColumn, Type, Value},
            ops::select,
        },
    };

    const NOTES: Table = Table {
        name: "notes",
        id: "note_id",
        columns: &["note_id", "body"],
        touch: None,
    };

    #[async_std::test]
    async fn test_delete() {
        init_logging();

        let db = mock::Connection::create();
        db.create_table(
            "notes",
            vec![
                SchemaColumn::new("note_id", Type::Serial),
                SchemaColumn::new("body", Type::Text),
            ],
        )
        .execute()
        .await
        .unwrap();
        db.insert("notes", ["body"])
            .rows([vec!["first".into()], vec!["second".into()]])
            .execute()
            .await
            .unwrap();

        assert!(execute(&db, NOTES, 1).await.unwrap());
        let rows = select::execute(&db, NOTES, None, None).await.unwrap();
        let expected: Vec<Vec<Value>> = vec![vec![2.into(), "second".into()]];
        assert_eq!(rows, expected);

        // Already gone.
        assert!(!execute(&db, NOTES, 1).await.unwrap());
    }
}
