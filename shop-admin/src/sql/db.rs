//! Abstract interface to a SQL database.

use crate::money::Money;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use futures::{Stream, StreamExt, TryStreamExt};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

pub mod mock;
pub mod postgres;
pub mod temp;

/// Errors returned by the database.
pub trait Error: Sized + Send + Sync + std::error::Error + 'static {
    /// Wrap a custom message into this error type.
    fn custom(msg: impl Display) -> Self;

    /// An error indicating that a query returned more than the `expected` number of rows.
    fn too_many_rows(expected: usize) -> Self {
        Self::custom(format!(
            "query result has more rows than the expected {expected}"
        ))
    }

    /// An error indicating that a query which was expected to return some rows did not.
    fn empty_rows() -> Self {
        Self::custom("query result is empty")
    }
}

/// A column in a list of columns selected from a query.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum SelectColumn<'a> {
    /// A single named column.
    #[display(fmt = "{}", _0)]
    Column(Column<'a>),
    /// Select all columns.
    #[display(fmt = "*")]
    All,
}

/// The value a column takes when an inserted row does not specify one.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum ColumnDefault {
    /// The time at which the row is inserted.
    #[display(fmt = "now()")]
    Now,
    /// A constant.
    #[display(fmt = "{}", _0)]
    Value(Value),
}

/// A column in a schema.
///
/// This describes the structure and format of each entry in the column, along with column-level
/// metadata like the name, nullability and default value.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display(fmt = "{name} {ty}")]
pub struct SchemaColumn<'a> {
    name: Cow<'a, str>,
    ty: Type,
    nullable: bool,
    default: Option<ColumnDefault>,
}

impl<'a> SchemaColumn<'a> {
    /// Create a nullable column with no default given a name and type.
    pub fn new(name: impl Into<Cow<'a, str>>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: ty != Type::Serial,
            default: None,
        }
    }

    /// Forbid `NULL` in this column.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Give this column a default value.
    pub fn default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// The name of this column
    pub fn name(&self) -> Cow<'a, str> {
        self.name.clone()
    }

    /// The type of this column
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// Whether this column accepts `NULL`.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The default value of this column, if any.
    pub fn default_value(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }

    /// Remove the lifetime requirement from `self` by cloning and taking ownership of borrowed
    /// data.
    pub fn into_static(self) -> SchemaColumn<'static> {
        SchemaColumn {
            name: Cow::Owned(self.name.into_owned()),
            ty: self.ty,
            nullable: self.nullable,
            default: self.default,
        }
    }
}

/// A connection to the database.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Errors returned from queries.
    type Error: Error;

    /// A `CREATE TABLE` statement which can be executed against the database.
    type CreateTable<'a>: CreateTable<Error = Self::Error>
    where
        Self: 'a;

    /// A `SELECT` query which can be executed against the database.
    type Select<'a>: Select<'a, Error = Self::Error>
    where
        Self: 'a;

    /// An `INSERT` statement which can be executed against the database.
    type Insert<'a>: Insert<Error = Self::Error>
    where
        Self: 'a;

    /// An `UPDATE` statement which can be executed against the database.
    type Update<'a>: Update<'a, Error = Self::Error>
    where
        Self: 'a;

    /// A `DELETE` statement which can be executed against the database.
    type Delete<'a>: Delete<'a, Error = Self::Error>
    where
        Self: 'a;

    /// Create a new database in the same cluster as this connection.
    async fn create_db(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Drop the named database.
    async fn drop_db(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Check that the database is reachable.
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Drop `table` if it exists.
    ///
    /// # Errors
    ///
    /// This method will fail if another table has a foreign key referencing `table`.
    async fn drop_table(&self, table: &str) -> Result<(), Self::Error>;

    /// Delete every row of `tables` and restart their identity counters.
    ///
    /// Tables with foreign keys referencing any of `tables` are emptied as well.
    async fn truncate(&self, tables: &[&str]) -> Result<(), Self::Error>;

    /// Start a `CREATE TABLE` statement.
    ///
    /// `table` and `columns` describe the name and the basic structure of the table. More
    /// fine-grained control over the table (such as adding constraints) is available via the
    /// methods on the [`CreateTable`] object.
    fn create_table<'a>(
        &'a self,
        table: impl Into<Cow<'a, str>> + Send,
        columns: Vec<SchemaColumn<'a>>,
    ) -> Self::CreateTable<'a>;

    /// Start a `SELECT` query.
    ///
    /// `columns` indicates the columns to include in the query results. The resulting [`Select`]
    /// represents a statement of the form `SELECT columns FROM table`. The query can be refined,
    /// for example by adding a `WHERE` clause, using the approriate methods on the [`Select`]
    /// object before running it.
    fn select<'a>(
        &'a self,
        columns: &'a [SelectColumn<'a>],
        table: impl Into<Cow<'a, str>> + Send,
    ) -> Self::Select<'a>;

    /// Start an `INSERT` query.
    ///
    /// `table` indicates the table to insert into and `columns` the names of the columns in that
    /// table into which values should be inserted. Columns which are not named take their
    /// default values.
    fn insert<'a, C>(
        &'a self,
        table: impl Into<Cow<'a, str>> + Send,
        columns: impl IntoIterator<Item = C>,
    ) -> Self::Insert<'a>
    where
        C: Into<String>;

    /// Start an `UPDATE` statement.
    ///
    /// `table` indicates the table to update. You can set the values of columns and refine the
    /// statement with a `WHERE` clause using the methods on the [`Update`] object.
    fn update<'a>(&'a self, table: impl Into<Cow<'a, str>> + Send) -> Self::Update<'a>;

    /// Start a `DELETE` statement.
    fn delete<'a>(&'a self, table: impl Into<Cow<'a, str>> + Send) -> Self::Delete<'a>;
}

/// A SQL primitive data type.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Type {
    #[display(fmt = "text")]
    Text,
    #[display(fmt = "varchar({})", _0)]
    Varchar(u16),
    #[display(fmt = "int4")]
    Int4,
    #[display(fmt = "serial")]
    Serial,
    /// A fixed-point number with the given precision and scale.
    #[display(fmt = "numeric({precision},{scale})")]
    Numeric { precision: u8, scale: u8 },
    /// A timestamp with time zone.
    #[display(fmt = "timestamptz")]
    Timestamp,
}

/// A primitive value supported by a SQL database.
#[derive(Clone, Debug, Display, PartialEq, Eq, From)]
pub enum Value {
    /// `NULL`.
    #[display(fmt = "NULL")]
    #[from(ignore)]
    Null,
    /// A text string.
    #[display(fmt = "{}", _0)]
    Text(String),
    /// A 4-byte signed integer.
    #[display(fmt = "{}", _0)]
    Int4(i32),
    /// An amount of money, stored as `numeric` with two decimal places.
    #[display(fmt = "{}", _0)]
    Money(Money),
    /// A timestamp in UTC.
    #[display(fmt = "{}", _0)]
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// A short description of the type of this value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Int4(_) => "int4",
            Self::Money(_) => "numeric",
            Self::Timestamp(_) => "timestamptz",
        }
    }

    /// Whether this value is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}

/// Conversion out of a [`Value`] read from the database.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch<T>(expected: &str, got: &Value) -> Result<T, String> {
    Err(format!("type mismatch (expected {expected}, got {})", got.kind()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            v => mismatch("text", &v),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Int4(x) => Ok(x),
            v => mismatch("int4", &v),
        }
    }
}

impl FromValue for Money {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Money(x) => Ok(x),
            v => mismatch("numeric", &v),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(t) => Ok(t),
            v => mismatch("timestamptz", &v),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

/// An identifier of a column in a SQL query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Column<'a> {
    name: Cow<'a, str>,
}

impl<'a> Column<'a> {
    /// A named column.
    pub fn named(name: impl Into<Cow<'a, str>>) -> Self {
        Self { name: name.into() }
    }

    /// The name of this column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Escape this column name for interpolation into a SQL query.
    pub fn escape(&self) -> String {
        escape_ident(&self.name)
    }
}

impl<'a> Display for Column<'a> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<'a> From<Cow<'a, str>> for Column<'a> {
    fn from(name: Cow<'a, str>) -> Self {
        Self::named(name)
    }
}

impl<'a> From<&'a str> for Column<'a> {
    fn from(name: &'a str) -> Self {
        Self::named(name)
    }
}

impl<'a> From<String> for Column<'a> {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

/// A comparison operator in a `WHERE` clause.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum CmpOp {
    #[display(fmt = "=")]
    Eq,
    #[display(fmt = "<>")]
    Ne,
    #[display(fmt = "<")]
    Lt,
    #[display(fmt = "<=")]
    Le,
    #[display(fmt = ">")]
    Gt,
    #[display(fmt = ">=")]
    Ge,
}

/// Sort direction in an `ORDER BY` clause.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum Order {
    #[default]
    #[display(fmt = "ASC")]
    Asc,
    #[display(fmt = "DESC")]
    Desc,
}

/// A clause modifying a SQL query.
#[derive(Clone, Debug, PartialEq, Eq, From)]
pub enum Clause<'a> {
    /// A `WHERE` clause. Multiple `WHERE` clauses on one query are combined with `AND`.
    Where(WhereClause<'a>),
    /// An `ORDER BY` clause. Multiple clauses sort lexicographically in the order given.
    OrderBy(Column<'a>, Order),
    /// A `LIMIT` clause.
    Limit(usize),
}

/// A `WHERE` clause comparing a column to a constant.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display(fmt = "{column} {op} {param}")]
pub struct WhereClause<'a> {
    /// The column to filter.
    pub column: Column<'a>,
    /// The operation used to filter values of `column`.
    pub op: CmpOp,
    /// Parameter to `op`.
    pub param: Value,
}

impl<'a> WhereClause<'a> {
    pub fn new(column: impl Into<Column<'a>>, op: CmpOp, param: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            param: param.into(),
        }
    }
}

/// What happens to referencing rows when a referenced row is deleted or its key is updated.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum ReferentialAction {
    #[default]
    #[display(fmt = "NO ACTION")]
    NoAction,
    #[display(fmt = "RESTRICT")]
    Restrict,
    #[display(fmt = "CASCADE")]
    Cascade,
    #[display(fmt = "SET NULL")]
    SetNull,
}

/// A `CHECK` constraint on a single column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Check {
    /// The column lies in the inclusive range `min..=max`.
    Between { min: i32, max: i32 },
    /// The column is one of a list of constants.
    OneOf(Vec<Value>),
}

impl Check {
    /// A check that a text column is one of `options`.
    pub fn one_of<I>(options: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::OneOf(options.into_iter().map(Into::into).collect())
    }

    /// Whether `value` satisfies the check. `NULL` satisfies every check.
    pub fn holds(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Between { min, max }, Value::Int4(x)) => min <= x && x <= max,
            (Self::Between { .. }, _) => false,
            (Self::OneOf(options), value) => options.contains(value),
        }
    }
}

/// A constraint on a set of columns in a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey {
        /// The referenced table.
        table: String,
        /// The referenced column, which must be unique in `table`.
        column: String,
        on_delete: ReferentialAction,
        on_update: ReferentialAction,
    },
    Check(Check),
}

impl ConstraintKind {
    /// A foreign key referencing `column` in `table` with the given actions.
    pub fn foreign_key(
        table: impl Into<String>,
        column: impl Into<String>,
        on_delete: ReferentialAction,
        on_update: ReferentialAction,
    ) -> Self {
        Self::ForeignKey {
            table: table.into(),
            column: column.into(),
            on_delete,
            on_update,
        }
    }
}

/// A `CREATE TABLE` statement which can be executed against the database.
#[async_trait]
pub trait CreateTable: Send {
    /// Errors returned by this statement.
    type Error: Error;

    /// Add a constraint to the table.
    fn constraint<I>(self, kind: ConstraintKind, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>;

    /// Add a (non-unique) index over `columns`, created along with the table.
    fn index<I>(self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>;

    /// Create the table.
    ///
    /// This will execute a statement of the form
    /// `CREATE TABLE IF NOT EXISTS table (columns constraints)`, followed by a
    /// `CREATE INDEX IF NOT EXISTS` statement for each index.
    ///
    /// # Errors
    ///
    /// This method will fail if any of the specified constraints were invalid, for example if a
    /// foreign key references a table which does not exist.
    async fn execute(self) -> Result<(), Self::Error>;
}

/// An extension trait for [`CreateTable`] that provides some higher-level functions.
pub trait CreateTableExt: CreateTable {
    /// Add a list of constraints to the table.
    fn constraints<I, C>(self, constraints: I) -> Self
    where
        I: IntoIterator<Item = (ConstraintKind, C)>,
        C: IntoIterator,
        C::Item: Into<String>;

    /// Add a list of indexes to the table.
    fn indexes<I, C>(self, indexes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>;
}

impl<T: CreateTable> CreateTableExt for T {
    fn constraints<I, C>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = (ConstraintKind, C)>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        for (kind, columns) in constraints {
            self = self.constraint(kind, columns);
        }
        self
    }

    fn indexes<I, C>(mut self, indexes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        for columns in indexes {
            self = self.index(columns);
        }
        self
    }
}

/// A `SELECT` query which can be executed against the database.
pub trait Select<'a>: Send {
    /// Errors returned by this query.
    type Error: Error;
    /// Rows returned by this query.
    type Row: Row<Error = Self::Error>;
    /// An asynchronous stream of rows.
    type Stream: Stream<Item = Result<Self::Row, Self::Error>> + Unpin + Send;

    /// Add a clause to the query.
    fn clause(self, clause: Clause<'a>) -> Self;

    /// Run the query and get a stream of results.
    fn stream(self) -> Self::Stream;
}

/// An extension trait for [`Select`] that provides some higher-level functions.
#[async_trait]
pub trait SelectExt<'a>: Select<'a> {
    /// Add a `WHERE` clause to the query.
    fn filter(self, clause: WhereClause<'a>) -> Self;

    /// Add a `WHERE` clause based on a column comparison.
    fn cmp(self, column: impl Into<Column<'a>>, op: CmpOp, param: impl Into<Value>) -> Self;

    /// Sort the results by `column`.
    fn order_by(self, column: impl Into<Column<'a>>, order: Order) -> Self;

    /// Return at most `limit` rows.
    fn limit(self, limit: usize) -> Self;

    /// Add multiple clauses to the query.
    fn clauses<I>(self, clauses: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Clause<'a>>;

    /// Run a query which is expected to return a single row.
    ///
    /// # Errors
    ///
    /// This method will fail if the query does not return exactly one row.
    async fn one(self) -> Result<Self::Row, Self::Error>;

    /// Run a query and collect the results.
    async fn many(self) -> Result<Vec<Self::Row>, Self::Error>;

    /// Run a query which is expected to return either 0 or 1 rows.
    ///
    /// # Errors
    ///
    /// This method will fail if the query does not return exactly 0 or 1 rows.
    async fn opt(self) -> Result<Option<Self::Row>, Self::Error>;

    /// Run a query and take the first row, if there is one.
    async fn first(self) -> Result<Option<Self::Row>, Self::Error>;
}

#[async_trait]
impl<'a, T: Select<'a>> SelectExt<'a> for T {
    fn filter(self, clause: WhereClause<'a>) -> Self {
        self.clause(clause.into())
    }

    fn cmp(self, column: impl Into<Column<'a>>, op: CmpOp, param: impl Into<Value>) -> Self {
        self.filter(WhereClause::new(column, op, param))
    }

    fn order_by(self, column: impl Into<Column<'a>>, order: Order) -> Self {
        self.clause(Clause::OrderBy(column.into(), order))
    }

    fn limit(self, limit: usize) -> Self {
        self.clause(Clause::Limit(limit))
    }

    fn clauses<I>(mut self, clauses: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Clause<'a>>,
    {
        for clause in clauses {
            self = self.clause(clause.into());
        }
        self
    }

    async fn opt(self) -> Result<Option<Self::Row>, Self::Error> {
        let mut rows = self.stream();
        let Some(row) = rows.next().await else { return Ok(None); };
        if rows.next().await.is_some() {
            return Err(Self::Error::too_many_rows(1));
        }
        row.map(Some)
    }

    async fn one(self) -> Result<Self::Row, Self::Error> {
        self.opt().await?.ok_or_else(Self::Error::empty_rows)
    }

    async fn many(self) -> Result<Vec<Self::Row>, Self::Error> {
        self.stream().try_collect().await
    }

    async fn first(self) -> Result<Option<Self::Row>, Self::Error> {
        self.limit(1).stream().next().await.transpose()
    }
}

/// An `INSERT` statement which can be executed against the database.
#[async_trait]
pub trait Insert: Send {
    /// Errors returned by this statement.
    type Error: Error;
    /// Rows returned from a `RETURNING` clause.
    type Row: Row<Error = Self::Error>;

    /// Add rows to insert.
    ///
    /// Each row must have one value for each of the columns named when the statement was
    /// created, in the same order.
    fn rows<R>(self, rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<Value>>;

    /// Return the value of `column` for each inserted row.
    fn returning(self, column: impl Into<String>) -> Self;

    /// Do the insertion.
    ///
    /// This will execute a statement of the form
    /// `INSERT INTO table (columns) VALUES (rows) RETURNING column`. If no `RETURNING` column
    /// was requested, the result is empty.
    ///
    /// # Errors
    ///
    /// This method will fail if any of the items in `rows` violates a constraint on `table`: a
    /// missing value for a `NOT NULL` column, a duplicate unique or primary key, a failed check
    /// or a foreign key with no referenced row. In that case no rows are inserted.
    async fn execute(self) -> Result<Vec<Self::Row>, Self::Error>;
}

/// An `UPDATE` statement which can be executed against the database.
#[async_trait]
pub trait Update<'a>: Send {
    /// Errors returned by this statement.
    type Error: Error;

    /// Set the value of a column in each affected row.
    fn set(self, column: impl Into<Cow<'a, str>>, value: Value) -> Self;

    /// Set a column to the time of the update.
    fn touch(self, column: impl Into<Cow<'a, str>>) -> Self;

    /// Add a `WHERE` clause to the statement.
    fn filter(self, clause: WhereClause<'a>) -> Self;

    /// Add a `WHERE` clause based on a column comparison.
    fn cmp(self, column: impl Into<Column<'a>>, op: CmpOp, param: impl Into<Value>) -> Self
    where
        Self: Sized,
    {
        self.filter(WhereClause::new(column, op, param))
    }

    /// Do the update, returning the number of affected rows.
    ///
    /// This will execute a statement of the form `UPDATE table SET column = value WHERE filter`.
    async fn execute(self) -> Result<u64, Self::Error>;
}

/// A `DELETE` statement which can be executed against the database.
#[async_trait]
pub trait Delete<'a>: Send {
    /// Errors returned by this statement.
    type Error: Error;

    /// Add a `WHERE` clause to the statement.
    fn filter(self, clause: WhereClause<'a>) -> Self;

    /// Add a `WHERE` clause based on a column comparison.
    fn cmp(self, column: impl Into<Column<'a>>, op: CmpOp, param: impl Into<Value>) -> Self
    where
        Self: Sized,
    {
        self.filter(WhereClause::new(column, op, param))
    }

    /// Do the deletion, returning the number of deleted rows.
    ///
    /// Rows in other tables which reference a deleted row are cascaded, nulled out or cause an
    /// error, according to the `ON DELETE` action of the foreign key.
    async fn execute(self) -> Result<u64, Self::Error>;
}

/// A row in a database table.
pub trait Row: Sized + Send {
    /// Errors returned by row operations.
    type Error: Error;

    /// Get the value of `column` in this row.
    ///
    /// `column` is an index corresponding to the order in which columns were requested in the
    /// `SELECT` statement.
    ///
    /// # Errors
    ///
    /// This method will fail if the specified column does not exist.
    fn column(&self, column: usize) -> Result<Value, Self::Error>;
}

/// Escape an identifier (table name, column name, etc.) for inclusion in a SQL query.
pub fn escape_ident(s: impl AsRef<str>) -> String {
    format!("\"{}\"", s.as_ref().replace('"', "\"\""))
}

/// Render a constant as a SQL literal, for use in DDL where parameters are not allowed.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".into(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Int4(x) => x.to_string(),
        Value::Money(m) => m.to_string(),
        Value::Timestamp(t) => format!("'{}'", t.to_rfc3339()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_escape_ident() {
        assert_eq!(escape_ident("orders"), "\"orders\"");
        assert_eq!(escape_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_literal() {
        assert_eq!(literal(&Value::from("O'Brien")), "'O''Brien'");
        assert_eq!(literal(&Value::from(5)), "5");
        assert_eq!(literal(&Value::Money(Money::from_cents(-105))), "-1.05");
        assert_eq!(literal(&Value::Null), "NULL");
    }

    #[test]
    fn test_check() {
        let rating = Check::Between { min: 1, max: 5 };
        assert!(rating.holds(&1.into()));
        assert!(rating.holds(&5.into()));
        assert!(!rating.holds(&0.into()));
        assert!(!rating.holds(&6.into()));
        assert!(rating.holds(&Value::Null));

        let status = Check::one_of(["pending", "completed"]);
        assert!(status.holds(&"pending".into()));
        assert!(!status.holds(&"lost".into()));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(i32::from_value(Value::Int4(3)), Ok(3));
        assert_eq!(Option::<i32>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<String>::from_value("x".into()), Ok(Some("x".into())));
        assert!(String::from_value(Value::Int4(3)).is_err());
        assert!(i32::from_value(Value::Null).is_err());
    }
}
