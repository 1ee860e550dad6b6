//! A temporary database which is dropped on [`Drop`].

use super::{
    postgres::{self, Config},
    Connection, Error, SchemaColumn, SelectColumn,
};
use async_trait::async_trait;
use rand::RngCore;
use std::borrow::Cow;

/// A PostgreSQL [`Connection`] to a temporary database in a database cluster.
///
/// The database is created with a random name when this struct is created, and dropped when this
/// struct is dropped.
pub struct TempDatabase {
    admin: postgres::Connection,
    db: postgres::Connection,
    name: String,
}

impl TempDatabase {
    /// Create a temporary database in the cluster described by `config`.
    ///
    /// `config` is used to connect to the cluster in order to create and later drop the temporary
    /// database, so it should name an existing database (or none, to use the default database of
    /// the user).
    pub async fn new(config: Config) -> Result<Self, postgres::Error> {
        let mut admin = postgres::Connection::new(config.clone()).await?;
        let name = format!("tempdb{}", rand::thread_rng().next_u64());
        tracing::info!("creating temp DB {name}");
        admin.create_db(&name).await?;

        let mut config = config;
        config.dbname(&name);
        let db = postgres::Connection::new(config).await?;
        Ok(Self { admin, db, name })
    }

    /// The name of the temporary database.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        tracing::info!("dropping temp DB {}", self.name);
        if let Err(err) = async_std::task::block_on(self.admin.drop_db(&self.name)) {
            tracing::error!("error dropping temp DB {}: {err}", self.name);
        }
    }
}

#[async_trait]
impl Connection for TempDatabase {
    type Error = postgres::Error;

    type CreateTable<'a> = <postgres::Connection as Connection>::CreateTable<'a>;
    type Select<'a> = <postgres::Connection as Connection>::Select<'a>;
    type Insert<'a> = <postgres::Connection as Connection>::Insert<'a>;
    type Update<'a> = <postgres::Connection as Connection>::Update<'a>;
    type Delete<'a> = <postgres::Connection as Connection>::Delete<'a>;

    async fn create_db(&mut self, _name: &str) -> Result<(), Self::Error> {
        Err(Self::Error::custom(
            "TempDatabase does not support creating more databases",
        ))
    }

    async fn drop_db(&mut self, _name: &str) -> Result<(), Self::Error> {
        Err(Self::Error::custom(
            "TempDatabase does not support dropping databases",
        ))
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        self.db.ping().await
    }

    async fn drop_table(&self, table: &str) -> Result<(), Self::Error> {
        self.db.drop_table(table).await
    }

    async fn truncate(&self, tables: &[&str]) -> Result<(), Self::Error> {
        self.db.truncate(tables).await
    }

    fn create_table<'a>(
        &'a self,
        table: impl Into<Cow<'a, str>> + Send,
        columns: Vec<SchemaColumn<'a>>,
    ) -> Self::CreateTable<'a> {
        self.db.create_table(table, columns)
    }

    fn select<'a>(
        &'a self,
        columns: &'a [SelectColumn<'a>],
        table: impl Into<Cow<'a, str>> + Send,
    ) -> Self::Select<'a> {
        self.db.select(columns, table)
    }

    fn insert<'a, C>(
        &'a self,
        table: impl Into<Cow<'a, str>> + Send,
        columns: impl IntoIterator<Item = C>,
    ) -> Self::Insert<'a>
    where
        C: Into<String>,
    {
        self.db.insert(table, columns)
    }

    fn update<'a>(&'a self, table: impl Into<Cow<'a, str>> + Send) -> Self::Update<'a> {
        self.db.update(table)
    }

    fn delete<'a>(&'a self, table: impl Into<Cow<'a, str>> + Send) -> Self::Delete<'a> {
        self.db.delete(table)
    }
}
