//! Instantiation of a GraphQL [`DataSource`](gql::DataSource) for a SQL database.

use super::{db, ops};
use crate::graphql::{
    backend::{self as gql, Error},
    type_system::{Id, Table},
};
use crate::sql::db::Value;
use async_trait::async_trait;
use derive_more::From;

/// A data source implemented using a PostgreSQL database.
pub type PostgresDataSource = SqlDataSource<db::postgres::Connection>;

/// A data source implemented using a SQL database.
#[derive(Clone, Debug, From)]
pub struct SqlDataSource<Db>(Db);

impl<Db: db::Connection> SqlDataSource<Db> {
    /// The underlying connection to the database.
    pub fn inner(&self) -> &Db {
        &self.0
    }

    /// Unwrap this data source to get at the underlying connection.
    pub fn into_inner(self) -> Db {
        self.0
    }
}

#[async_trait]
impl<Db: 'static + db::Connection> gql::DataSource for SqlDataSource<Db> {
    async fn select_rows(
        &self,
        table: Table,
        filter: Option<(&'static str, Value)>,
        limit: Option<usize>,
    ) -> Result<Vec<Vec<Value>>, Error> {
        ops::select::execute(&self.0, table, filter, limit).await
    }

    async fn insert_row(
        &self,
        table: Table,
        assignments: Vec<(&'static str, Value)>,
    ) -> Result<Id, Error> {
        ops::insert::execute(&self.0, table, assignments).await
    }

    async fn update_row(
        &self,
        table: Table,
        id: Id,
        assignments: Vec<(&'static str, Value)>,
    ) -> Result<bool, Error> {
        ops::update::execute(&self.0, table, id, assignments).await
    }

    async fn delete_row(&self, table: Table, id: Id) -> Result<bool, Error> {
        ops::delete::execute(&self.0, table, id).await
    }

    async fn ping(&self) -> Result<(), Error> {
        self.0.ping().await.map_err(Error::sql)
    }
}
