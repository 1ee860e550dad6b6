//! Compilation of selects into `SELECT` queries.

use super::{
    super::db::{CmpOp, Column, Connection, Order, Row, SelectColumn, SelectExt, Value},
    Error,
};
use crate::graphql::type_system::{Id, Table};

/// Load the rows of `table` whose `filter` column equals the given value, ordered by primary key.
///
/// Each row contains the values of [`table.columns`](Table::columns), in order.
pub async fn execute<C: Connection>(
    conn: &C,
    table: Table,
    filter: Option<(&'static str, Value)>,
    limit: Option<usize>,
) -> Result<Vec<Vec<Value>>, Error> {
    let columns = table
        .columns
        .iter()
        .map(|column| SelectColumn::Column(Column::named(*column)))
        .collect::<Vec<_>>();
    let mut query = conn.select(&columns, table.name);
    if let Some((column, value)) = filter {
        query = query.cmp(column, CmpOp::Eq, value);
    }
    query = query.order_by(table.id, Order::Asc);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    let rows = query.many().await.map_err(Error::sql)?;
    rows.iter()
        .map(|row| {
            (0..columns.len())
                .map(|i| row.column(i).map_err(Error::sql))
                .collect()
        })
        .collect()
}

/// Whether `table` has a row with primary key `id`.
pub async fn exists<C: Connection>(conn: &C, table: Table, id: Id) -> Result<bool, Error> {
    let columns = [SelectColumn::Column(Column::named(table.id))];
    let row = conn
        .select(&columns, table.name)
        .cmp(table.id, CmpOp::Eq, id)
        .opt()
        .await
        .map_err(Error::sql)?;
    Ok(row.is_some())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        init_logging,
        sql::db::{mock, CreateTable, Insert, SchemaColumn, Type},
    };

    const WIDGETS: Table = Table {
        name: "widgets",
        id: "widget_id",
        columns: &["widget_id", "label", "size"],
        touch: None,
    };

    async fn widgets() -> mock::Connection {
        let db = mock::Connection::create();
        db.create_table(
            "widgets",
            vec![
                SchemaColumn::new("widget_id", Type::Serial),
                SchemaColumn::new("label", Type::Text).not_null(),
                SchemaColumn::new("size", Type::Int4),
            ],
        )
        .execute()
        .await
        .unwrap();
        db.insert("widgets", ["label", "size"])
            .rows([
                vec!["gear".into(), 3.into()],
                vec!["cog".into(), Value::Null],
                vec!["gear".into(), 1.into()],
            ])
            .execute()
            .await
            .unwrap();
        db
    }

    #[async_std::test]
    async fn test_select() {
        init_logging();
        let db = widgets().await;

        let gear1: Vec<Value> = vec![1.into(), "gear".into(), 3.into()];
        let cog: Vec<Value> = vec![2.into(), "cog".into(), Value::Null];
        let gear3: Vec<Value> = vec![3.into(), "gear".into(), 1.into()];

        assert_eq!(
            execute(&db, WIDGETS, None, None).await.unwrap(),
            [gear1.clone(), cog, gear3.clone()]
        );
        assert_eq!(
            execute(&db, WIDGETS, Some(("label", "gear".into())), None)
                .await
                .unwrap(),
            [gear1.clone(), gear3]
        );
        assert_eq!(
            execute(&db, WIDGETS, Some(("label", "gear".into())), Some(1))
                .await
                .unwrap(),
            [gear1]
        );
        assert!(execute(&db, WIDGETS, Some(("size", 7.into())), None)
            .await
            .unwrap()
            .is_empty());
    }

    #[async_std::test]
    async fn test_exists() {
        init_logging();
        let db = widgets().await;
        assert!(exists(&db, WIDGETS, 2).await.unwrap());
        assert!(!exists(&db, WIDGETS, 4).await.unwrap());
    }

    #[async_std::test]
    async fn test_missing_table() {
        init_logging();
        let db = mock::Connection::create();
        let err = execute(&db, WIDGETS, None, None).await.unwrap_err();
        assert!(matches!(err, Error::Sql { .. }), "{err}");
    }
}
