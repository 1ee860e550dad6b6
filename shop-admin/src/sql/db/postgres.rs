//! Instantiation of the abstract [`db`](super) interface for PostgreSQL.
//!
//! This instantiation is built on [`async-postgres`].

use super::{
    escape_ident, literal, Check, Clause, ColumnDefault, ConstraintKind, SchemaColumn,
    SelectColumn, Value, WhereClause,
};
use crate::money::Money;
use async_std::{sync::Mutex, task::spawn};
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use derive_more::From;
use futures::{
    future,
    stream::{self, BoxStream},
    StreamExt, TryFutureExt, TryStreamExt,
};
use itertools::Itertools;
use snafu::Snafu;
use std::borrow::Cow;
use std::fmt::{Debug, Display};
use std::sync::Arc;
use tokio_postgres::types::{accepts, to_sql_checked, FromSql, IsNull, ToSql, Type};

pub use async_postgres::{Config, Row};

/// Errors returned by a PostgreSQL database.
#[derive(Debug, Snafu, From)]
pub enum Error {
    #[from]
    #[snafu(display("{source}"))]
    Sql { source: async_postgres::Error },
    #[snafu(display("error connecting to PostgreSQL: {source}"))]
    Connect { source: std::io::Error },
    #[snafu(display("malformed numeric value: {message}"))]
    Numeric { message: String },
    #[snafu(display("unsupported column type {ty}"))]
    UnsupportedType { ty: Type },
    #[snafu(display("{message}"))]
    Custom { message: String },
}

impl super::Error for Error {
    fn custom(msg: impl Display) -> Self {
        Self::Custom {
            message: msg.to_string(),
        }
    }
}

/// A connection to a PostgreSQL database.
///
/// The underlying session is opened on first use and reopened whenever it has been closed, so a
/// [`Connection`] outlives restarts and outages of the database server. Statements issued while
/// the server is unreachable fail with [`Error::Connect`].
pub struct Connection {
    config: Config,
    client: Mutex<Option<Arc<tokio_postgres::Client>>>,
}

impl Connection {
    /// Establish a new connection with the given [`Config`].
    pub async fn new(config: Config) -> Result<Self, Error> {
        let conn = Self::lazy(config);
        conn.client().await?;
        Ok(conn)
    }

    /// A connection which does not contact the server until the first statement.
    pub fn lazy(config: Config) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    async fn client(&self) -> Result<Arc<tokio_postgres::Client>, Error> {
        let mut client = self.client.lock().await;
        if let Some(client) = &*client {
            if !client.is_closed() {
                return Ok(client.clone());
            }
            tracing::warn!("PostgreSQL connection lost, reconnecting");
        }

        let (new_client, conn) = async_postgres::connect(self.config.clone())
            .await
            .map_err(|source| Error::Connect { source })?;
        spawn(async move {
            if let Err(err) = conn.await {
                tracing::error!("PostgreSQL connection closed: {err}");
            }
        });
        let new_client = Arc::new(new_client);
        *client = Some(new_client.clone());
        Ok(new_client)
    }

    async fn query<'a, I>(
        &self,
        statement: &str,
        params: I,
    ) -> Result<BoxStream<'static, Result<Row, Error>>, Error>
    where
        I: Debug + IntoIterator<Item = &'a Value>,
        I::IntoIter: ExactSizeIterator,
    {
        tracing::debug!(?params, "{}", statement);
        let params = params.into_iter().map(|param| {
            let param: &dyn ToSql = param;
            param
        });
        let stream = self
            .client()
            .await?
            .query_raw(statement, params)
            .await
            .map_err(Error::from)?;
        Ok(stream.map_err(Error::from).boxed())
    }

    /// Run a statement and count the rows it returns.
    async fn count<'a, I>(&self, statement: &str, params: I) -> Result<u64, Error>
    where
        I: Debug + IntoIterator<Item = &'a Value>,
        I::IntoIter: ExactSizeIterator,
    {
        self.query(statement, params)
            .await?
            .try_fold(0, |n, _| future::ready(Ok(n + 1)))
            .await
    }

    /// Run one or more statements which take no parameters.
    async fn batch(&self, statements: &str) -> Result<(), Error> {
        tracing::debug!("{}", statements);
        self.client().await?.batch_execute(statements).await?;
        Ok(())
    }
}

#[async_trait]
impl super::Connection for Connection {
    type Error = Error;
    type CreateTable<'a> = CreateTable<'a>;
    type Select<'a> = Select<'a>;
    type Insert<'a> = Insert<'a>;
    type Update<'a> = Update<'a>;
    type Delete<'a> = Delete<'a>;

    async fn create_db(&mut self, name: &str) -> Result<(), Self::Error> {
        self.batch(&format!("CREATE DATABASE {}", escape_ident(name)))
            .await
    }

    async fn drop_db(&mut self, name: &str) -> Result<(), Self::Error> {
        self.batch(&format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            escape_ident(name)
        ))
        .await
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        self.batch("SELECT 1").await
    }

    async fn drop_table(&self, table: &str) -> Result<(), Self::Error> {
        self.batch(&format!("DROP TABLE IF EXISTS {}", escape_ident(table)))
            .await
    }

    async fn truncate(&self, tables: &[&str]) -> Result<(), Self::Error> {
        if tables.is_empty() {
            return Ok(());
        }
        self.batch(&format!(
            "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
            tables.iter().map(escape_ident).join(", ")
        ))
        .await
    }

    fn create_table<'a>(
        &'a self,
        table: impl Into<Cow<'a, str>> + Send,
        columns: Vec<SchemaColumn<'a>>,
    ) -> Self::CreateTable<'a> {
        CreateTable::new(self, table.into(), columns)
    }

    fn select<'a>(
        &'a self,
        select: &'a [SelectColumn<'a>],
        table: impl Into<Cow<'a, str>> + Send,
    ) -> Self::Select<'a> {
        Select::new(self, select, table.into())
    }

    fn insert<'a, C>(
        &'a self,
        table: impl Into<Cow<'a, str>> + Send,
        columns: impl IntoIterator<Item = C>,
    ) -> Self::Insert<'a>
    where
        C: Into<String>,
    {
        Insert {
            conn: self,
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            num_rows: 0,
            params: vec![],
            returning: None,
        }
    }

    fn update<'a>(&'a self, table: impl Into<Cow<'a, str>> + Send) -> Self::Update<'a> {
        Update {
            conn: self,
            table: table.into(),
            assignments: vec![],
            filters: vec![],
            params: vec![],
        }
    }

    fn delete<'a>(&'a self, table: impl Into<Cow<'a, str>> + Send) -> Self::Delete<'a> {
        Delete {
            conn: self,
            table: table.into(),
            filters: vec![],
            params: vec![],
        }
    }
}

/// Format a `WHERE` clause, moving its parameter into `params`.
fn format_filter(filter: WhereClause, params: &mut Vec<Value>) -> String {
    let WhereClause { column, op, param } = filter;
    params.push(param);
    format!("{} {op} ${}", column.escape(), params.len())
}

fn format_where(filters: &[String]) -> String {
    if filters.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", filters.join(" AND "))
    }
}

/// A query against a PostgreSQL database.
pub struct Select<'a>(Result<SelectInner<'a>, Error>);

struct SelectInner<'a> {
    conn: &'a Connection,
    select: &'a [SelectColumn<'a>],
    table: Cow<'a, str>,
    filters: Vec<String>,
    order: Vec<String>,
    limit: Option<usize>,
    params: Vec<Value>,
}

impl<'a> Select<'a> {
    fn new(conn: &'a Connection, select: &'a [SelectColumn<'a>], table: Cow<'a, str>) -> Self {
        Self(Ok(SelectInner {
            conn,
            select,
            table,
            filters: Default::default(),
            order: Default::default(),
            limit: None,
            params: Default::default(),
        }))
    }
}

impl<'a> super::Select<'a> for Select<'a> {
    type Error = Error;
    type Row = Row;
    type Stream = BoxStream<'a, Result<Self::Row, Self::Error>>;

    fn clause(self, clause: Clause<'a>) -> Self {
        let Ok(mut query) = self.0 else { return self; };
        match clause {
            Clause::Where(filter) => {
                let filter = format_filter(filter, &mut query.params);
                query.filters.push(filter);
            }
            Clause::OrderBy(column, order) => {
                query.order.push(format!("{} {order}", column.escape()));
            }
            Clause::Limit(limit) => {
                query.limit = Some(query.limit.map_or(limit, |prev| prev.min(limit)));
            }
        }
        Self(Ok(query))
    }

    fn stream(self) -> Self::Stream {
        let query = match self.0 {
            Ok(query) => query,
            Err(err) => return stream::once(future::ready(Err(err))).boxed(),
        };

        // The async block is necessary to move data owned by `query` into the future, so we can
        // return the future without returning a reference to the local `query`.
        async move {
            // Format the `SELECT` part of the query.
            let columns = query
                .select
                .iter()
                .map(|col| match col {
                    SelectColumn::Column(col) => col.escape(),
                    SelectColumn::All => "*".to_string(),
                })
                .join(", ");
            let table = escape_ident(query.table);

            // Construct the SQL statement.
            let mut statement = format!(
                "SELECT {columns} FROM {table}{}",
                format_where(&query.filters)
            );
            if !query.order.is_empty() {
                statement = format!("{statement} ORDER BY {}", query.order.join(", "));
            }
            if let Some(limit) = query.limit {
                statement = format!("{statement} LIMIT {limit}");
            }

            // Run the query.
            let rows = query.conn.query(statement.as_str(), &query.params).await?;
            Ok(rows)
        }
        .try_flatten_stream()
        .boxed()
    }
}

/// An `INSERT` statement for a PostgreSQL database.
pub struct Insert<'a> {
    conn: &'a Connection,
    table: Cow<'a, str>,
    columns: Vec<String>,
    num_rows: usize,
    params: Vec<Value>,
    returning: Option<String>,
}

#[async_trait]
impl<'a> super::Insert for Insert<'a> {
    type Error = Error;
    type Row = Row;

    fn rows<R>(mut self, rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<Value>>,
    {
        for row in rows {
            self.params.extend(row);
            self.num_rows += 1;
        }
        self
    }

    fn returning(mut self, column: impl Into<String>) -> Self {
        self.returning = Some(column.into());
        self
    }

    async fn execute(self) -> Result<Vec<Row>, Error> {
        let width = self.columns.len();
        if width * self.num_rows != self.params.len() {
            return Err(Error::Custom {
                message: format!(
                    "incorrect width for table {} (expected {width} values per row)",
                    self.table
                ),
            });
        }

        let table = escape_ident(&self.table);
        let mut statement = if width == 0 {
            // Every column takes its default.
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let columns = self.columns.iter().map(escape_ident).join(",");
            let rows = (0..self.num_rows)
                .map(|i| {
                    let values = (0..width)
                        .map(|j| {
                            // In the query itself, just reference a parameter by number. We will
                            // pass the value itself into the query as a parameter to prevent SQL
                            // injection. Params are 1-indexed.
                            format!("${}", i * width + j + 1)
                        })
                        .join(",");
                    format!("({values})")
                })
                .join(",");
            format!("INSERT INTO {table} ({columns}) VALUES {rows}")
        };
        if let Some(column) = &self.returning {
            statement = format!("{statement} RETURNING {}", escape_ident(column));
        }

        let rows = self
            .conn
            .query(statement.as_str(), &self.params)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        Ok(if self.returning.is_some() {
            rows
        } else {
            vec![]
        })
    }
}

/// An `UPDATE` statement for a PostgreSQL database.
pub struct Update<'a> {
    conn: &'a Connection,
    table: Cow<'a, str>,
    assignments: Vec<String>,
    filters: Vec<String>,
    params: Vec<Value>,
}

#[async_trait]
impl<'a> super::Update<'a> for Update<'a> {
    type Error = Error;

    fn set(mut self, column: impl Into<Cow<'a, str>>, value: Value) -> Self {
        self.params.push(value);
        self.assignments.push(format!(
            "{} = ${}",
            escape_ident(column.into()),
            self.params.len()
        ));
        self
    }

    fn touch(mut self, column: impl Into<Cow<'a, str>>) -> Self {
        self.assignments
            .push(format!("{} = now()", escape_ident(column.into())));
        self
    }

    fn filter(mut self, clause: WhereClause<'a>) -> Self {
        let filter = format_filter(clause, &mut self.params);
        self.filters.push(filter);
        self
    }

    async fn execute(self) -> Result<u64, Error> {
        if self.assignments.is_empty() {
            return Err(Error::Custom {
                message: format!("UPDATE of {} has no assignments", self.table),
            });
        }
        let statement = format!(
            "UPDATE {} SET {}{} RETURNING 1",
            escape_ident(&self.table),
            self.assignments.join(", "),
            format_where(&self.filters)
        );
        self.conn.count(&statement, &self.params).await
    }
}

/// A `DELETE` statement for a PostgreSQL database.
pub struct Delete<'a> {
    conn: &'a Connection,
    table: Cow<'a, str>,
    filters: Vec<String>,
    params: Vec<Value>,
}

#[async_trait]
impl<'a> super::Delete<'a> for Delete<'a> {
    type Error = Error;

    fn filter(mut self, clause: WhereClause<'a>) -> Self {
        let filter = format_filter(clause, &mut self.params);
        self.filters.push(filter);
        self
    }

    async fn execute(self) -> Result<u64, Error> {
        let statement = format!(
            "DELETE FROM {}{} RETURNING 1",
            escape_ident(&self.table),
            format_where(&self.filters)
        );
        self.conn.count(&statement, &self.params).await
    }
}

/// A `CREATE TABLE` statement for a PostgreSQL database.
pub struct CreateTable<'a> {
    conn: &'a Connection,
    table: Cow<'a, str>,
    columns: Vec<SchemaColumn<'a>>,
    constraints: Vec<(ConstraintKind, Vec<String>)>,
    indexes: Vec<Vec<String>>,
}

impl<'a> CreateTable<'a> {
    fn new(conn: &'a Connection, table: Cow<'a, str>, columns: Vec<SchemaColumn<'a>>) -> Self {
        Self {
            conn,
            table,
            columns,
            constraints: vec![],
            indexes: vec![],
        }
    }
}

#[async_trait]
impl<'a> super::CreateTable for CreateTable<'a> {
    type Error = Error;

    fn constraint<I>(mut self, kind: ConstraintKind, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.constraints
            .push((kind, columns.into_iter().map(|col| col.into()).collect()));
        self
    }

    fn index<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.indexes
            .push(columns.into_iter().map(|col| col.into()).collect());
        self
    }

    async fn execute(self) -> Result<(), Self::Error> {
        let table = escape_ident(&self.table);
        let columns = self.columns.iter().map(format_column).join(",");
        let constraints = self
            .constraints
            .iter()
            .map(|(kind, cols)| format_constraint(&self.table, kind, cols))
            .join(",");
        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS {table} ({columns}{}{constraints})",
            if constraints.is_empty() { "" } else { "," }
        )];
        for cols in &self.indexes {
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS {} ON {table} ({})",
                escape_ident(format!("{}-idx-{}", self.table, cols.join("-"))),
                cols.iter().map(escape_ident).join(",")
            ));
        }
        self.conn.batch(&statements.join(";\n")).await
    }
}

fn format_column(col: &SchemaColumn) -> String {
    let mut def = format!("{} {}", escape_ident(col.name()), col.ty());
    if !col.is_nullable() {
        def.push_str(" NOT NULL");
    }
    match col.default_value() {
        Some(ColumnDefault::Now) => def.push_str(" DEFAULT now()"),
        Some(ColumnDefault::Value(value)) => {
            def.push_str(" DEFAULT ");
            def.push_str(&literal(value));
        }
        None => {}
    }
    def
}

fn format_constraint(table: &str, kind: &ConstraintKind, cols: &[String]) -> String {
    let cols_ident = cols.iter().join("-");
    let cols = cols.iter().map(escape_ident).join(",");
    match kind {
        ConstraintKind::PrimaryKey => {
            format!(
                "CONSTRAINT {} PRIMARY KEY ({cols})",
                escape_ident(format!("{table}-pk-{cols_ident}"))
            )
        }
        ConstraintKind::Unique => {
            format!(
                "CONSTRAINT {} UNIQUE ({cols})",
                escape_ident(format!("{table}-uq-{cols_ident}"))
            )
        }
        ConstraintKind::ForeignKey {
            table: parent,
            column,
            on_delete,
            on_update,
        } => {
            format!(
                "CONSTRAINT {} FOREIGN KEY ({cols}) REFERENCES {} ({}) ON DELETE {on_delete} ON UPDATE {on_update}",
                escape_ident(format!("{table}-fk-{cols_ident}")),
                escape_ident(parent),
                escape_ident(column),
            )
        }
        ConstraintKind::Check(check) => {
            let condition = match check {
                Check::Between { min, max } => format!("{cols} BETWEEN {min} AND {max}"),
                Check::OneOf(options) => {
                    format!("{cols} IN ({})", options.iter().map(literal).join(", "))
                }
            };
            format!(
                "CONSTRAINT {} CHECK ({condition})",
                escape_ident(format!("{table}-ck-{cols_ident}"))
            )
        }
    }
}

impl super::Row for Row {
    type Error = Error;

    fn column(&self, column: usize) -> Result<Value, Self::Error> {
        Ok(self.try_get(column)?)
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>
    where
        Self: Sized,
    {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Text(x) => x.to_sql(ty, out),
            Self::Int4(x) => x.to_sql(ty, out),
            Self::Money(x) => x.to_sql(ty, out),
            Self::Timestamp(x) => x.to_sql(ty, out),
        }
    }

    accepts!(INT4, TEXT, VARCHAR, BPCHAR, NUMERIC, TIMESTAMPTZ);
    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        match ty {
            &Type::INT4 => Ok(Self::Int4(i32::from_sql(ty, raw)?)),
            &Type::TEXT | &Type::VARCHAR | &Type::BPCHAR => {
                Ok(Self::Text(String::from_sql(ty, raw)?))
            }
            &Type::NUMERIC => Ok(Self::Money(Money::from_sql(ty, raw)?)),
            &Type::TIMESTAMPTZ => Ok(Self::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?)),
            ty => Err(Box::new(Error::UnsupportedType { ty: ty.clone() })),
        }
    }

    fn from_sql_null(
        _ty: &Type,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        Ok(Self::Null)
    }

    accepts!(INT4, TEXT, VARCHAR, BPCHAR, NUMERIC, TIMESTAMPTZ);
}

// The binary `numeric` wire format is a header of four 16-bit words (number of digits, weight of
// the first digit, sign, display scale) followed by the digits in base 10000, most significant
// first. The value is `sum(digit[i] * 10000^(weight - i))`.
const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NBASE: u64 = 10_000;

impl ToSql for Money {
    fn to_sql(
        &self,
        _ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>
    where
        Self: Sized,
    {
        encode_numeric(*self, out);
        Ok(IsNull::No)
    }

    accepts!(NUMERIC);
    to_sql_checked!();
}

impl<'a> FromSql<'a> for Money {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        decode_numeric(raw).map_err(|message| Box::new(Error::Numeric { message }).into())
    }

    accepts!(NUMERIC);
}

fn encode_numeric(money: Money, out: &mut BytesMut) {
    let cents = money.cents().unsigned_abs();
    let (mut whole, frac) = (cents / 100, cents % 100);

    // Base-10000 digits of the integer part, least significant first.
    let mut digits = vec![];
    while whole > 0 {
        digits.push((whole % NBASE) as i16);
        whole /= NBASE;
    }
    digits.reverse();
    let mut weight = digits.len() as i16 - 1;

    // The fractional part is a single base-10000 digit whose leading two decimal digits are the
    // cents.
    if frac > 0 {
        digits.push((frac * 100) as i16);
    }
    // Postgres strips trailing zero digits.
    while digits.last() == Some(&0) {
        digits.pop();
    }
    if digits.is_empty() {
        weight = 0;
    }

    out.put_i16(digits.len() as i16);
    out.put_i16(weight);
    out.put_u16(if money.cents() < 0 {
        NUMERIC_NEG
    } else {
        NUMERIC_POS
    });
    out.put_u16(2);
    for digit in digits {
        out.put_i16(digit);
    }
}

fn decode_numeric(raw: &[u8]) -> Result<Money, String> {
    let word = |i: usize| -> Result<[u8; 2], String> {
        raw.get(2 * i..2 * i + 2)
            .map(|b| [b[0], b[1]])
            .ok_or_else(|| format!("truncated numeric value ({} bytes)", raw.len()))
    };
    let ndigits = i16::from_be_bytes(word(0)?);
    let weight = i16::from_be_bytes(word(1)?);
    let sign = u16::from_be_bytes(word(2)?);
    if sign == NUMERIC_NAN {
        return Err("NaN is not an amount of money".into());
    }
    if ndigits < 0 {
        return Err(format!("negative digit count {ndigits}"));
    }

    // Accumulate the value in units of 1/10000 (the weight -1 digit), then round to cents.
    let mut units: i128 = 0;
    for i in 0..ndigits as usize {
        let digit = i16::from_be_bytes(word(4 + i)?);
        if !(0..NBASE as i16).contains(&digit) {
            return Err(format!("invalid base-10000 digit {digit}"));
        }
        let exponent = i32::from(weight) - i as i32 + 1;
        if exponent < 0 {
            // Precision beyond 1/10000 cannot change the rounded number of cents unless the
            // weight -1 digit is exactly 50; numeric(_, 2) columns never carry it.
            continue;
        }
        units = 10_000i128
            .checked_pow(exponent as u32)
            .and_then(|scale| i128::from(digit).checked_mul(scale))
            .and_then(|term| units.checked_add(term))
            .ok_or_else(|| "numeric value out of range".to_string())?;
    }
    let cents = (units + 50) / 100;
    let cents = i64::try_from(cents).map_err(|_| "numeric value out of range".to_string())?;
    Ok(Money::from_cents(if sign == NUMERIC_NEG {
        -cents
    } else {
        cents
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        graphql::{backend::DataSourceExt, Store},
        init_logging,
        model::{Category, CategoryInput, Customer, Order, OrderItem, Product, Review},
        sql::{data_source::SqlDataSource, migrations::Migrator, seed},
    };
    use async_graphql::MaybeUndefined;
    use proptest::prelude::*;
    use std::env;

    fn encode(money: Money) -> Vec<u8> {
        let mut out = BytesMut::new();
        encode_numeric(money, &mut out);
        out.to_vec()
    }

    fn words(words: &[i16]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    #[test]
    fn test_numeric_encoding() {
        // 1299.99 = 1299 + 9900 * 10000^-1
        assert_eq!(
            encode(Money::from_cents(129999)),
            words(&[2, 0, 0, 2, 1299, 9900])
        );
        // 10000.50 = 1 * 10000^1 + 5000 * 10000^-1
        assert_eq!(
            encode(Money::from_cents(1000050)),
            words(&[3, 1, 0, 2, 1, 0, 5000])
        );
        // 20000.00 = 2 * 10000^1, trailing zero digits stripped
        assert_eq!(encode(Money::from_cents(2000000)), words(&[1, 1, 0, 2, 2]));
        // -0.05 = 500 * 10000^-1
        assert_eq!(
            encode(Money::from_cents(-5)),
            words(&[1, -1, 0x4000, 2, 500])
        );
        assert_eq!(encode(Money::ZERO), words(&[0, 0, 0, 2]));
    }

    #[test]
    fn test_numeric_decoding() {
        assert_eq!(
            decode_numeric(&words(&[2, 0, 0, 2, 1299, 9900])),
            Ok(Money::from_cents(129999))
        );
        // 0.125 with a scale of 3 rounds to 0.13.
        assert_eq!(
            decode_numeric(&words(&[1, -1, 0, 3, 1250])),
            Ok(Money::from_cents(13))
        );
        assert_eq!(decode_numeric(&words(&[0, 0, 0, 0])), Ok(Money::ZERO));
        assert!(decode_numeric(&words(&[0, 0, 0xC000u16 as i16, 0])).is_err());
        assert!(decode_numeric(&words(&[2, 0, 0, 2, 1299])).is_err());
    }

    proptest! {
        #[test]
        fn proptest_numeric_codec(cents in -1_000_000_000_000i64..1_000_000_000_000i64) {
            let money = Money::from_cents(cents);
            prop_assert_eq!(decode_numeric(&encode(money)), Ok(money));
        }
    }

    #[async_std::test]
    async fn test_lazy_unreachable() {
        use crate::sql::db::Connection as _;
        init_logging();

        // Nothing listens on port 1.
        let mut config = Config::default();
        config.host("localhost").port(1).user("postgres");
        let conn = Connection::lazy(config);

        // Every statement retries the connection and reports the failure.
        for _ in 0..2 {
            let err = conn.ping().await.unwrap_err();
            assert!(matches!(err, Error::Connect { .. }), "{err}");
        }
    }

    /// Connect to a PostgreSQL cluster for testing, if enabled by `POSTGRES_TESTS`.
    fn config() -> Option<Config> {
        if env::var("POSTGRES_TESTS").is_err() {
            tracing::warn!("skipping postgres test since POSTGRES_TESTS are not enabled");
            return None;
        }
        let port = env::var("POSTGRES_TESTS_PORT")
            .map(|port| port.parse().unwrap())
            .unwrap_or(5432);
        let password = env::var("POSTGRES_TESTS_PASSWORD").unwrap_or("password".to_string());

        let mut config = Config::default();
        config
            .host("localhost")
            .port(port)
            .user("postgres")
            .password(&password);
        Some(config)
    }

    macro_rules! postgres_test {
        () => {
            match config() {
                Some(config) => crate::sql::db::temp::TempDatabase::new(config)
                    .await
                    .unwrap(),
                None => return,
            }
        };
    }

    #[async_std::test]
    async fn test_postgres_migrate_and_seed() {
        init_logging();
        let db = postgres_test!();
        let db = SqlDataSource::from(db);

        Migrator::new(db.inner()).latest().await.unwrap();
        assert!(Migrator::new(db.inner())
            .status()
            .await
            .unwrap()
            .iter()
            .all(|status| status.applied));
        seed::run(&db).await.unwrap();

        let products = db.all::<Product>().await.unwrap();
        assert_eq!(products.len(), 7);
        assert_eq!(products[0].product_name, "Laptop Pro 15");
        assert_eq!(products[0].price, Money::from_cents(129999));
        assert_eq!(products[0].category_id, Some(1));

        // Seeding again starts from identifier 1.
        seed::run(&db).await.unwrap();
        let categories = db.all::<Category>().await.unwrap();
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[0].category_id, 1);

        // Rolling everything back leaves only the ledger.
        Migrator::new(db.inner()).rollback(true).await.unwrap();
        assert!(Migrator::new(db.inner())
            .status()
            .await
            .unwrap()
            .iter()
            .all(|status| !status.applied));
    }

    #[async_std::test]
    async fn test_postgres_referential_actions() {
        init_logging();
        let db = postgres_test!();
        let db = SqlDataSource::from(db);
        Migrator::new(db.inner()).latest().await.unwrap();
        seed::run(&db).await.unwrap();
        let store = Store::new(db);

        // Deleting a customer cascades to orders, their items and payments, and reviews.
        assert!(store.delete::<Customer>(1).await.unwrap());
        assert!(store.all::<Order>().await.unwrap().iter().all(|o| o.customer_id != 1));
        assert!(store.find::<Order>(1).await.unwrap().is_none());
        assert!(store
            .all_by::<OrderItem>("order_id", 1.into())
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .all_by::<Review>("customer_id", 1.into())
            .await
            .unwrap()
            .is_empty());

        // Deleting a category nulls out its products.
        assert!(store.delete::<Category>(2).await.unwrap());
        let product = store.find::<Product>(3).await.unwrap().unwrap();
        assert_eq!(product.category_id, None);

        // Deleting again reports nothing was deleted.
        assert!(!store.delete::<Category>(2).await.unwrap());

        // Foreign keys must reference existing rows.
        let err = store
            .create(&crate::model::ProductInput {
                product_name: "Ghost".into(),
                description: MaybeUndefined::Undefined,
                price: Money::from_cents(100),
                stock_quantity: Some(1),
                category_id: MaybeUndefined::Value(999),
            })
            .await
            .unwrap_err();
        tracing::info!("expected error: {err}");

        // Unique email.
        let customer = store.find::<Customer>(2).await.unwrap().unwrap();
        let err = store
            .create(&crate::model::CustomerInput {
                email: customer.email,
                first_name: "Jane".into(),
                last_name: "Again".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        tracing::info!("expected error: {err}");

        // Updates keep unspecified columns.
        let before = store.find::<Category>(1).await.unwrap().unwrap();
        let after = store
            .update(
                1,
                &CategoryInput {
                    category_name: "Gadgets".into(),
                    description: MaybeUndefined::Undefined,
                },
            )
            .await
            .unwrap();
        assert_eq!(after.category_name, "Gadgets");
        assert_eq!(after.description, before.description);
    }
}
