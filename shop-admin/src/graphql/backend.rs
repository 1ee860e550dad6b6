//! Interfaces provided by a backend data source consumed by a GraphQL API.
//!
//! The entrypoint to this module is [`DataSource`], which describes the interface by which the
//! GraphQL API interacts with the backend data provider. This is the glue between the GraphQL and
//! SQL views of the data model: the SQL layer implements [`DataSource`] and the resolvers interact
//! with the SQL layer exclusively through this trait.
//!
//! [`DataSource`] is deliberately untyped, working in terms of [`Table`] descriptions and rows of
//! [`Value`]s, so that it can be used as a trait object. The typed operations the resolvers call,
//! like [`all`](DataSourceExt::all) and [`create`](DataSourceExt::create), are provided for every
//! data source by [`DataSourceExt`].

use super::type_system::{Id, Record, RecordInput, Table};
use crate::sql::db::Value;
use async_trait::async_trait;
use derive_more::From;
use snafu::Snafu;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

/// Errors reported while loading or storing records.
#[derive(Clone, Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The database rejected a statement, for example because of a constraint violation.
    #[snafu(display("{message}"))]
    Sql { message: String },
    /// A row could not be decoded into a record.
    #[snafu(display("error decoding {table}.{column}: {message}"))]
    Decode {
        table: &'static str,
        column: &'static str,
        message: String,
    },
    /// A record being updated does not exist.
    #[snafu(display("no row in {table} with {column} {id}"))]
    NotFound {
        table: &'static str,
        column: &'static str,
        id: Id,
    },
}

impl Error {
    /// Wrap a database error.
    pub fn sql(err: impl Display) -> Self {
        Self::Sql {
            message: err.to_string(),
        }
    }

    /// A column of `table` could not be decoded.
    pub fn decode(table: &Table, column: &'static str, message: impl Display) -> Self {
        Self::Decode {
            table: table.name,
            column,
            message: message.to_string(),
        }
    }

    /// No row of `table` has primary key `id`.
    pub fn not_found(table: &Table, id: Id) -> Self {
        Self::NotFound {
            table: table.name,
            column: table.id,
            id,
        }
    }
}

/// A source of data which can be served by the GraphQL API.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Load the rows of `table`, ordered by primary key.
    ///
    /// Each row has a value for each of [`table.columns`](Table::columns), in order. If `filter` is
    /// given, only rows whose column equals the given value are returned.
    async fn select_rows(
        &self,
        table: Table,
        filter: Option<(&'static str, Value)>,
        limit: Option<usize>,
    ) -> Result<Vec<Vec<Value>>, Error>;

    /// Insert a row into `table` and return its primary key.
    ///
    /// Columns which are not assigned take their default values.
    async fn insert_row(
        &self,
        table: Table,
        assignments: Vec<(&'static str, Value)>,
    ) -> Result<Id, Error>;

    /// Assign new values to the row of `table` with primary key `id`.
    ///
    /// Returns whether the row exists. If `table` has a [`touch`](Table::touch) column, it is set
    /// to the current time.
    async fn update_row(
        &self,
        table: Table,
        id: Id,
        assignments: Vec<(&'static str, Value)>,
    ) -> Result<bool, Error>;

    /// Delete the row of `table` with primary key `id`, returning whether it existed.
    async fn delete_row(&self, table: Table, id: Id) -> Result<bool, Error>;

    /// Check that the data source is reachable.
    async fn ping(&self) -> Result<(), Error>;
}

/// Typed operations on [`Record`]s, available for every [`DataSource`].
#[async_trait]
pub trait DataSourceExt: DataSource {
    /// Every record of type `T`.
    async fn all<T: Record>(&self) -> Result<Vec<T>, Error>;

    /// The record of type `T` with primary key `id`, if there is one.
    async fn find<T: Record>(&self, id: Id) -> Result<Option<T>, Error>;

    /// Every record of type `T` whose `column` equals `value`.
    async fn all_by<T: Record>(&self, column: &'static str, value: Value) -> Result<Vec<T>, Error>;

    /// The first record of type `T` whose `column` equals `value`, if there is one.
    async fn first_by<T: Record>(
        &self,
        column: &'static str,
        value: Value,
    ) -> Result<Option<T>, Error>;

    /// Insert a record and read it back.
    async fn create<I: RecordInput>(&self, input: &I) -> Result<I::Record, Error>;

    /// Update the record with primary key `id` and read it back.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if there is no such record.
    async fn update<I: RecordInput>(&self, id: Id, input: &I) -> Result<I::Record, Error>;

    /// Delete the record of type `T` with primary key `id`, returning whether it existed.
    async fn delete<T: Record>(&self, id: Id) -> Result<bool, Error>;
}

#[async_trait]
impl<D: DataSource + ?Sized> DataSourceExt for D {
    async fn all<T: Record>(&self) -> Result<Vec<T>, Error> {
        self.select_rows(T::TABLE, None, None)
            .await?
            .into_iter()
            .map(T::from_row)
            .collect()
    }

    async fn find<T: Record>(&self, id: Id) -> Result<Option<T>, Error> {
        self.first_by(T::TABLE.id, id.into()).await
    }

    async fn all_by<T: Record>(&self, column: &'static str, value: Value) -> Result<Vec<T>, Error> {
        self.select_rows(T::TABLE, Some((column, value)), None)
            .await?
            .into_iter()
            .map(T::from_row)
            .collect()
    }

    async fn first_by<T: Record>(
        &self,
        column: &'static str,
        value: Value,
    ) -> Result<Option<T>, Error> {
        self.select_rows(T::TABLE, Some((column, value)), Some(1))
            .await?
            .into_iter()
            .next()
            .map(T::from_row)
            .transpose()
    }

    async fn create<I: RecordInput>(&self, input: &I) -> Result<I::Record, Error> {
        let table = I::Record::TABLE;
        let id = self.insert_row(table, input.assignments()).await?;
        self.find(id)
            .await?
            .ok_or_else(|| Error::not_found(&table, id))
    }

    async fn update<I: RecordInput>(&self, id: Id, input: &I) -> Result<I::Record, Error> {
        let table = I::Record::TABLE;
        if !self.update_row(table, id, input.assignments()).await? {
            return Err(Error::not_found(&table, id));
        }
        self.find(id)
            .await?
            .ok_or_else(|| Error::not_found(&table, id))
    }

    async fn delete<T: Record>(&self, id: Id) -> Result<bool, Error> {
        self.delete_row(T::TABLE, id).await
    }
}

/// A shared, type-erased [`DataSource`], stored in the GraphQL schema data.
///
/// Resolvers get the store with `ctx.data::<Store>()` and call [`DataSourceExt`] methods on it.
#[derive(Clone, From)]
pub struct Store(Arc<dyn DataSource>);

impl Store {
    pub fn new(data_source: impl DataSource + 'static) -> Self {
        Self(Arc::new(data_source))
    }
}

impl Deref for Store {
    type Target = dyn DataSource;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
