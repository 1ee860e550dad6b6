//! Mock instantiation of the abstract [`db`](super) interface.
//!
//! This instantiation is built on a simple in-memory database. It is useful for testing in
//! isolation from an actual database, and it enforces the same constraints a PostgreSQL database
//! would for the schemas this crate creates: column types, `NOT NULL`, defaults, primary and unique
//! keys, checks, and single-column foreign keys with their `ON DELETE` and `ON UPDATE` actions.
//!
//! Every statement runs against a private copy of the database which replaces the shared one only
//! if the statement succeeds, so a failed statement has no effect.
#![cfg(any(test, feature = "mocks"))]

use super::{
    Clause, CmpOp, Column, ColumnDefault, ConstraintKind, Order, ReferentialAction,
    SchemaColumn, SelectColumn, Type, Value, WhereClause,
};
use async_std::sync::{Arc, RwLock};
use async_trait::async_trait;
use chrono::Utc;
use derive_more::From;
use futures::{
    stream::{self, BoxStream},
    StreamExt, TryFutureExt,
};
use itertools::Itertools;
use snafu::Snafu;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

/// Errors returned by the in-memory database.
#[derive(Debug, Snafu, From)]
#[snafu(display("mock DB error: {}", message))]
pub struct Error {
    message: String,
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

impl super::Error for Error {
    fn custom(msg: impl Display) -> Self {
        Self {
            message: msg.to_string(),
        }
    }
}

/// The in-memory database.
#[derive(Clone, Debug, Default)]
struct Db {
    tables: HashMap<String, Table>,
}

/// A foreign key from `child.column` to `parent.parent_column`, seen from the parent.
#[derive(Clone, Debug)]
struct Reference {
    name: String,
    child: String,
    column: usize,
    parent_column: usize,
    on_delete: ReferentialAction,
    on_update: ReferentialAction,
}

/// A constraint with its columns resolved to positions in the table.
#[derive(Clone, Debug)]
struct Constraint {
    name: String,
    kind: ConstraintKind,
    columns: Vec<usize>,
}

/// An in-memory table.
#[derive(Clone, Debug)]
struct Table {
    name: String,
    columns: Vec<SchemaColumn<'static>>,
    constraints: Vec<Constraint>,
    indexes: Vec<Vec<String>>,
    rows: Vec<Row>,
    /// The last value issued by the serial columns of this table.
    serial: i32,
}

impl Table {
    fn column(&self, name: &str) -> Result<usize, Error> {
        self.columns
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| Error::from(format!("table {} has no column {name}", self.name)))
    }

    /// Build a new row from values for some of the columns, filling in the rest with defaults.
    fn new_row(&mut self, columns: &[usize], values: Vec<Value>) -> Result<Row, Error> {
        if values.len() != columns.len() {
            return Err(Error::from(format!(
                "incorrect width for table {} (found {}, expected {})",
                self.name,
                values.len(),
                columns.len()
            )));
        }

        let mut row = vec![None; self.columns.len()];
        for (&i, value) in columns.iter().zip(values) {
            row[i] = Some(value);
        }

        let mut filled = Vec::with_capacity(row.len());
        for (value, col) in row.into_iter().zip(&self.columns) {
            let value = match (value, col.default_value()) {
                (Some(value), _) => value,
                (None, _) if col.ty() == Type::Serial => {
                    self.serial += 1;
                    Value::Int4(self.serial)
                }
                (None, Some(ColumnDefault::Now)) => Value::Timestamp(Utc::now()),
                (None, Some(ColumnDefault::Value(value))) => value.clone(),
                (None, None) => Value::Null,
            };
            filled.push(value);
        }
        Ok(Row::new(filled))
    }

    /// Test if `row` satisfies all of the `filters`.
    fn matches(&self, row: &Row, filters: &[WhereClause]) -> Result<bool, Error> {
        for WhereClause { column, op, param } in filters {
            let value = &row.columns[self.column(column.name())?];
            if !compare(value, *op, param)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The positions of the rows which satisfy all of the `filters`.
    fn find(&self, filters: &[WhereClause]) -> Result<Vec<usize>, Error> {
        let mut found = vec![];
        for (i, row) in self.rows.iter().enumerate() {
            if self.matches(row, filters)? {
                found.push(i);
            }
        }
        Ok(found)
    }
}

impl Db {
    fn table(&self, name: &str) -> Result<&Table, Error> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::from(format!("relation \"{name}\" does not exist")))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table, Error> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::from(format!("relation \"{name}\" does not exist")))
    }

    fn create_table(
        &mut self,
        name: String,
        columns: Vec<SchemaColumn<'static>>,
        constraints: Vec<(ConstraintKind, Vec<String>)>,
        indexes: Vec<Vec<String>>,
    ) -> Result<(), Error> {
        if self.tables.contains_key(&name) {
            return Ok(());
        }

        let mut table = Table {
            name: name.clone(),
            columns,
            constraints: vec![],
            indexes: vec![],
            rows: vec![],
            serial: 0,
        };
        for (kind, cols) in constraints {
            let columns = cols
                .iter()
                .map(|col| table.column(col))
                .collect::<Result<Vec<_>, _>>()?;
            let suffix = match &kind {
                ConstraintKind::PrimaryKey => "pk",
                ConstraintKind::Unique => "uq",
                ConstraintKind::ForeignKey { .. } => "fk",
                ConstraintKind::Check(_) => "ck",
            };
            let constraint_name = format!("{name}-{suffix}-{}", cols.iter().join("-"));
            match &kind {
                ConstraintKind::PrimaryKey => {
                    // Primary key columns are implicitly `NOT NULL`.
                    for &i in &columns {
                        table.columns[i] = table.columns[i].clone().not_null();
                    }
                }
                ConstraintKind::ForeignKey { table: parent, column, .. } => {
                    if columns.len() != 1 {
                        return Err(Error::from(format!(
                            "{constraint_name}: the mock database only supports single-column foreign keys"
                        )));
                    }
                    // The referenced column must exist.
                    if *parent == name {
                        table.column(column)?;
                    } else {
                        self.table(parent)?.column(column)?;
                    }
                }
                ConstraintKind::Check(_) if columns.len() != 1 => {
                    return Err(Error::from(format!(
                        "{constraint_name}: the mock database only supports single-column checks"
                    )));
                }
                _ => {}
            }
            table.constraints.push(Constraint {
                name: constraint_name,
                kind,
                columns,
            });
        }
        for cols in &indexes {
            for col in cols {
                table.column(col)?;
            }
        }
        table.indexes = indexes;

        self.tables.insert(name, table);
        Ok(())
    }

    /// All foreign keys referencing `parent`.
    fn references_to(&self, parent: &str) -> Result<Vec<Reference>, Error> {
        let mut refs = vec![];
        for child in self.tables.values() {
            for constraint in &child.constraints {
                let ConstraintKind::ForeignKey { table, column, on_delete, on_update } = &constraint.kind else {
                    continue;
                };
                if table != parent {
                    continue;
                }
                refs.push(Reference {
                    name: constraint.name.clone(),
                    child: child.name.clone(),
                    column: constraint.columns[0],
                    parent_column: self.table(parent)?.column(column)?,
                    on_delete: *on_delete,
                    on_update: *on_update,
                });
            }
        }
        // Deterministic order makes error messages reproducible.
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(refs)
    }

    /// Check that `row` could be stored in `table`.
    ///
    /// The row is compared against every existing row except the one at position `skip`, which
    /// is the row being replaced in an update.
    fn check_row(&self, table: &str, row: &Row, skip: Option<usize>) -> Result<(), Error> {
        let t = self.table(table)?;

        for (col, value) in t.columns.iter().zip(&row.columns) {
            if value.is_null() && !col.is_nullable() {
                return Err(Error::from(format!(
                    "null value in column \"{}\" of relation \"{table}\" violates not-null constraint",
                    col.name()
                )));
            }
            check_type(col.ty(), value).map_err(Error::from)?;
        }

        for constraint in &t.constraints {
            let values = constraint
                .columns
                .iter()
                .map(|&i| &row.columns[i])
                .collect::<Vec<_>>();
            match &constraint.kind {
                ConstraintKind::PrimaryKey | ConstraintKind::Unique => {
                    if values.iter().any(|v| v.is_null()) {
                        continue;
                    }
                    let duplicate = t.rows.iter().enumerate().any(|(i, other)| {
                        Some(i) != skip
                            && constraint
                                .columns
                                .iter()
                                .zip(&values)
                                .all(|(&c, v)| other.columns[c] == **v)
                    });
                    if duplicate {
                        return Err(Error::from(format!(
                            "duplicate key value violates unique constraint \"{}\"",
                            constraint.name
                        )));
                    }
                }
                ConstraintKind::Check(check) => {
                    if !check.holds(values[0]) {
                        return Err(Error::from(format!(
                            "new row for relation \"{table}\" violates check constraint \"{}\"",
                            constraint.name
                        )));
                    }
                }
                ConstraintKind::ForeignKey {
                    table: parent,
                    column,
                    ..
                } => {
                    if values[0].is_null() {
                        continue;
                    }
                    let parent_table = self.table(parent)?;
                    let parent_column = parent_table.column(column)?;
                    let exists = parent_table
                        .rows
                        .iter()
                        .any(|p| p.columns[parent_column] == *values[0]);
                    // A self-reference may point at the row itself.
                    let exists = exists
                        || (parent == table && row.columns[parent_column] == *values[0]);
                    if !exists {
                        return Err(Error::from(format!(
                            "insert or update on table \"{table}\" violates foreign key constraint \"{}\": key ({})=({}) is not present in table \"{parent}\"",
                            constraint.name,
                            t.columns[constraint.columns[0]].name(),
                            values[0],
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn insert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<Value>>,
        returning: Option<&str>,
    ) -> Result<Vec<Row>, Error> {
        let (columns, returning) = {
            let t = self.table(table)?;
            let columns = columns
                .iter()
                .map(|col| t.column(col))
                .collect::<Result<Vec<_>, _>>()?;
            let returning = returning.map(|col| t.column(col)).transpose()?;
            (columns, returning)
        };

        let mut returned = vec![];
        for values in rows {
            let row = self.table_mut(table)?.new_row(&columns, values)?;
            self.check_row(table, &row, None)?;
            if let Some(i) = returning {
                returned.push(Row::new(vec![row.columns[i].clone()]));
            }
            self.table_mut(table)?.rows.push(row);
        }
        Ok(returned)
    }

    fn update(
        &mut self,
        table: &str,
        assignments: &[(String, Option<Value>)],
        filters: &[WhereClause],
    ) -> Result<u64, Error> {
        let now = Utc::now();
        let t = self.table(table)?;
        let assignments = assignments
            .iter()
            .map(|(col, value)| {
                let value = value.clone().unwrap_or(Value::Timestamp(now));
                Ok((t.column(col)?, value))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let targets = t.find(filters)?;

        let mut changes = vec![];
        for &i in &targets {
            let t = self.table_mut(table)?;
            let old = t.rows[i].clone();
            for (col, value) in &assignments {
                t.rows[i].columns[*col] = value.clone();
            }
            changes.push((old, t.rows[i].clone()));
        }
        for &i in &targets {
            let row = self.table(table)?.rows[i].clone();
            self.check_row(table, &row, Some(i))?;
        }

        // Propagate changed keys to referencing rows.
        for reference in self.references_to(table)? {
            for (old, new) in &changes {
                let (old_key, new_key) =
                    (&old.columns[reference.parent_column], &new.columns[reference.parent_column]);
                if old_key == new_key || old_key.is_null() {
                    continue;
                }
                let child = self.table(&reference.child)?;
                let hits = child
                    .rows
                    .iter()
                    .positions(|r| r.columns[reference.column] == *old_key)
                    .collect::<Vec<_>>();
                if hits.is_empty() {
                    continue;
                }
                let replacement = match reference.on_update {
                    ReferentialAction::Cascade => new_key.clone(),
                    ReferentialAction::SetNull => Value::Null,
                    ReferentialAction::NoAction | ReferentialAction::Restrict => {
                        return Err(violation(table, &reference));
                    }
                };
                self.replace_keys(&reference, hits, replacement)?;
            }
        }

        Ok(targets.len() as u64)
    }

    /// Set the referencing column of some rows of `reference.child`.
    fn replace_keys(
        &mut self,
        reference: &Reference,
        rows: Vec<usize>,
        value: Value,
    ) -> Result<(), Error> {
        let child = self.table_mut(&reference.child)?;
        let col = &child.columns[reference.column];
        if value.is_null() && !col.is_nullable() {
            return Err(Error::from(format!(
                "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                col.name(),
                child.name
            )));
        }
        for i in rows {
            child.rows[i].columns[reference.column] = value.clone();
        }
        Ok(())
    }

    /// Delete the rows at positions `doomed` from `table`, applying `ON DELETE` actions.
    fn delete_rows(&mut self, table: &str, mut doomed: Vec<usize>) -> Result<u64, Error> {
        doomed.sort_unstable();
        doomed.dedup();
        let t = self.table_mut(table)?;
        let removed = doomed
            .iter()
            .rev()
            .map(|&i| t.rows.remove(i))
            .collect::<Vec<_>>();

        for reference in self.references_to(table)? {
            let keys = removed
                .iter()
                .map(|row| &row.columns[reference.parent_column])
                .filter(|key| !key.is_null())
                .collect::<Vec<_>>();
            let hits = self
                .table(&reference.child)?
                .rows
                .iter()
                .positions(|r| keys.contains(&&r.columns[reference.column]))
                .collect::<Vec<_>>();
            if hits.is_empty() {
                continue;
            }
            match reference.on_delete {
                ReferentialAction::Cascade => {
                    self.delete_rows(&reference.child, hits)?;
                }
                ReferentialAction::SetNull => {
                    self.replace_keys(&reference, hits, Value::Null)?;
                }
                ReferentialAction::NoAction | ReferentialAction::Restrict => {
                    return Err(violation(table, &reference));
                }
            }
        }

        Ok(removed.len() as u64)
    }

    fn truncate(&mut self, tables: &[&str]) -> Result<(), Error> {
        // Truncating a table also truncates every table referencing it.
        let mut pending = tables.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        let mut all = BTreeSet::new();
        while let Some(table) = pending.pop() {
            self.table(&table)?;
            if all.insert(table.clone()) {
                pending.extend(
                    self.references_to(&table)?
                        .into_iter()
                        .map(|reference| reference.child),
                );
            }
        }
        for table in all {
            let t = self.table_mut(&table)?;
            t.rows.clear();
            t.serial = 0;
        }
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<(), Error> {
        if !self.tables.contains_key(table) {
            return Ok(());
        }
        if let Some(reference) = self
            .references_to(table)?
            .into_iter()
            .find(|reference| reference.child != table)
        {
            return Err(Error::from(format!(
                "cannot drop table {table} because constraint {} on table {} depends on it",
                reference.name, reference.child
            )));
        }
        self.tables.remove(table);
        Ok(())
    }
}

fn violation(table: &str, reference: &Reference) -> Error {
    Error::from(format!(
        "update or delete on table \"{table}\" violates foreign key constraint \"{}\" on table \"{}\"",
        reference.name, reference.child
    ))
}

/// Check that `value` can be stored in a column of type `ty`.
fn check_type(ty: Type, value: &Value) -> Result<(), String> {
    match (ty, value) {
        (_, Value::Null) => Ok(()),
        (Type::Text, Value::Text(_)) => Ok(()),
        (Type::Varchar(len), Value::Text(s)) => {
            if s.chars().count() > usize::from(len) {
                Err(format!("value too long for type character varying({len})"))
            } else {
                Ok(())
            }
        }
        (Type::Int4 | Type::Serial, Value::Int4(_)) => Ok(()),
        (Type::Numeric { precision, scale }, Value::Money(m)) => {
            // Money always has two decimal places, so only the integer digits can overflow.
            let int_digits = u32::from(precision.saturating_sub(scale));
            let limit = 10i64.checked_pow(int_digits).and_then(|l| l.checked_mul(100));
            match limit {
                Some(limit) if m.cents().abs() >= limit => Err(format!(
                    "numeric field overflow: {m} does not fit in numeric({precision},{scale})"
                )),
                _ => Ok(()),
            }
        }
        (Type::Timestamp, Value::Timestamp(_)) => Ok(()),
        (ty, value) => Err(format!(
            "column of type {ty} cannot hold a value of type {}",
            value.kind()
        )),
    }
}

/// Order two values of the same type.
fn partial_cmp(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        (Value::Int4(l), Value::Int4(r)) => Some(l.cmp(r)),
        (Value::Money(l), Value::Money(r)) => Some(l.cmp(r)),
        (Value::Timestamp(l), Value::Timestamp(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Evaluate `lhs op rhs` with SQL semantics: any comparison involving `NULL` is false.
fn compare(lhs: &Value, op: CmpOp, rhs: &Value) -> Result<bool, Error> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(false);
    }
    let ord = partial_cmp(lhs, rhs).ok_or_else(|| {
        Error::from(format!(
            "operator does not exist: {} {op} {}",
            lhs.kind(),
            rhs.kind()
        ))
    })?;
    Ok(match op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Ne => ord != Ordering::Equal,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Le => ord != Ordering::Greater,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Ge => ord != Ordering::Less,
    })
}

/// Sort order for `ORDER BY ... ASC`, with `NULL` last as in PostgreSQL.
fn sort_key_cmp(lhs: &Value, rhs: &Value) -> Ordering {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => partial_cmp(lhs, rhs).unwrap_or(Ordering::Equal),
    }
}

/// A connection to the in-memory database.
#[derive(Clone, Debug)]
pub struct Connection(Arc<RwLock<Db>>);

impl Connection {
    /// Create a new database and connect to it.
    ///
    /// This will create a connection to a fresh, empty database. It will not be connected or
    /// related to any previous connection or database. Once the database is created, this
    /// connection can be [cloned](Clone) in order to create multiple simultaneous connections to
    /// the same database.
    pub fn create() -> Self {
        Self(Default::default())
    }

    /// The schema of this database.
    ///
    /// The schema maps table names to the schema for each table. Each table schema consists of a
    /// list of column schemas.
    pub async fn schema(&self) -> HashMap<String, Vec<SchemaColumn<'static>>> {
        self.0
            .read()
            .await
            .tables
            .iter()
            .map(|(name, table)| (name.clone(), table.columns.clone()))
            .collect()
    }

    /// The indexes on `table`, each given as a list of column names.
    pub async fn indexes(&self, table: &str) -> Result<Vec<Vec<String>>, Error> {
        Ok(self.0.read().await.table(table)?.indexes.clone())
    }

    /// Run `f` against a copy of the database, keeping the copy only if `f` succeeds.
    async fn atomically<T>(
        &self,
        f: impl FnOnce(&mut Db) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut db = self.0.write().await;
        let mut copy = db.clone();
        let res = f(&mut copy)?;
        *db = copy;
        Ok(res)
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

    async fn create_db(&mut self, _name: &str) -> Result<(), Self::Error> {
        Err(Error::from(
            "Mock database does not support creating more databases",
        ))
    }

    async fn drop_db(&mut self, _name: &str) -> Result<(), Self::Error> {
        Err(Error::from(
            "Mock database does not support dropping databases",
        ))
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<(), Self::Error> {
        tracing::debug!("DROP TABLE IF EXISTS {table}");
        self.atomically(|db| db.drop_table(table)).await
    }

    async fn truncate(&self, tables: &[&str]) -> Result<(), Self::Error> {
        tracing::debug!("TRUNCATE {tables:?}");
        self.atomically(|db| db.truncate(tables)).await
    }

    fn create_table<'a>(
        &'a self,
        table: impl Into<Cow<'a, str>> + Send,
        columns: Vec<SchemaColumn<'a>>,
    ) -> Self::CreateTable<'a> {
        CreateTable {
            db: self,
            table: table.into(),
            columns,
            constraints: vec![],
            indexes: vec![],
        }
    }

    fn select<'a>(
        &'a self,
        select: &'a [SelectColumn<'a>],
        table: impl Into<Cow<'a, str>> + Send,
    ) -> Self::Select<'a> {
        Select {
            db: &self.0,
            table: table.into(),
            columns: select,
            filters: vec![],
            order: vec![],
            limit: None,
        }
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
            db: self,
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: vec![],
            returning: None,
        }
    }

    fn update<'a>(&'a self, table: impl Into<Cow<'a, str>> + Send) -> Self::Update<'a> {
        Update {
            db: self,
            table: table.into(),
            assignments: vec![],
            filters: vec![],
        }
    }

    fn delete<'a>(&'a self, table: impl Into<Cow<'a, str>> + Send) -> Self::Delete<'a> {
        Delete {
            db: self,
            table: table.into(),
            filters: vec![],
        }
    }
}

/// A query against an in-memory database.
pub struct Select<'a> {
    db: &'a RwLock<Db>,
    table: Cow<'a, str>,
    columns: &'a [SelectColumn<'a>],
    filters: Vec<WhereClause<'a>>,
    order: Vec<(Column<'a>, Order)>,
    limit: Option<usize>,
}

impl<'a> super::Select<'a> for Select<'a> {
    type Error = Error;
    type Row = Row;
    type Stream = BoxStream<'a, Result<Self::Row, Self::Error>>;

    fn clause(mut self, clause: Clause<'a>) -> Self {
        match clause {
            Clause::Where(filter) => self.filters.push(filter),
            Clause::OrderBy(column, order) => self.order.push((column, order)),
            Clause::Limit(limit) => {
                self.limit = Some(self.limit.map_or(limit, |prev| prev.min(limit)));
            }
        }
        self
    }

    fn stream(self) -> Self::Stream {
        async move {
            let db = self.db.read().await;
            let table = db.table(&self.table)?;

            tracing::debug!(
                "SELECT {} FROM {} WHERE {} ORDER BY {:?} LIMIT {:?}",
                self.columns.iter().join(", "),
                self.table,
                self.filters.iter().join(" AND "),
                self.order,
                self.limit,
            );
            let mut rows = table
                .find(&self.filters)?
                .into_iter()
                .map(|i| table.rows[i].clone())
                .collect::<Vec<_>>();

            let order = self
                .order
                .iter()
                .map(|(col, order)| Ok((table.column(col.name())?, *order)))
                .collect::<Result<Vec<_>, Error>>()?;
            rows.sort_by(|l, r| {
                order
                    .iter()
                    .map(|&(i, order)| {
                        let ord = sort_key_cmp(&l.columns[i], &r.columns[i]);
                        match order {
                            Order::Asc => ord,
                            Order::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
            if let Some(limit) = self.limit {
                rows.truncate(limit);
            }

            let rows = rows
                .into_iter()
                .map(|row| row.select(table, self.columns))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(stream::iter(rows).map(Ok))
        }
        .try_flatten_stream()
        .boxed()
    }
}

/// An insert statement for an in-memory database.
pub struct Insert<'a> {
    db: &'a Connection,
    table: Cow<'a, str>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
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
        self.rows.extend(rows);
        self
    }

    fn returning(mut self, column: impl Into<String>) -> Self {
        self.returning = Some(column.into());
        self
    }

    async fn execute(self) -> Result<Vec<Row>, Error> {
        tracing::debug!(
            "INSERT INTO {} ({}) VALUES {:?}",
            self.table,
            self.columns.iter().join(", "),
            self.rows
        );
        let Self {
            db,
            table,
            columns,
            rows,
            returning,
        } = self;
        db.atomically(|db| db.insert(&table, &columns, rows, returning.as_deref()))
            .await
    }
}

/// An update statement for an in-memory database.
pub struct Update<'a> {
    db: &'a Connection,
    table: Cow<'a, str>,
    /// Columns to set, with `None` meaning the time of the update.
    assignments: Vec<(String, Option<Value>)>,
    filters: Vec<WhereClause<'a>>,
}

#[async_trait]
impl<'a> super::Update<'a> for Update<'a> {
    type Error = Error;

    fn set(mut self, column: impl Into<Cow<'a, str>>, value: Value) -> Self {
        self.assignments
            .push((column.into().into_owned(), Some(value)));
        self
    }

    fn touch(mut self, column: impl Into<Cow<'a, str>>) -> Self {
        self.assignments.push((column.into().into_owned(), None));
        self
    }

    fn filter(mut self, clause: WhereClause<'a>) -> Self {
        self.filters.push(clause);
        self
    }

    async fn execute(self) -> Result<u64, Error> {
        tracing::debug!(
            "UPDATE {} SET {:?} WHERE {}",
            self.table,
            self.assignments,
            self.filters.iter().join(" AND ")
        );
        if self.assignments.is_empty() {
            return Err(Error::from(format!(
                "UPDATE of {} has no assignments",
                self.table
            )));
        }
        let Self {
            db,
            table,
            assignments,
            filters,
        } = self;
        db.atomically(|db| db.update(&table, &assignments, &filters))
            .await
    }
}

/// A delete statement for an in-memory database.
pub struct Delete<'a> {
    db: &'a Connection,
    table: Cow<'a, str>,
    filters: Vec<WhereClause<'a>>,
}

#[async_trait]
impl<'a> super::Delete<'a> for Delete<'a> {
    type Error = Error;

    fn filter(mut self, clause: WhereClause<'a>) -> Self {
        self.filters.push(clause);
        self
    }

    async fn execute(self) -> Result<u64, Error> {
        tracing::debug!(
            "DELETE FROM {} WHERE {}",
            self.table,
            self.filters.iter().join(" AND ")
        );
        let Self { db, table, filters } = self;
        db.atomically(|db| {
            let doomed = db.table(&table)?.find(&filters)?;
            db.delete_rows(&table, doomed)
        })
        .await
    }
}

/// A create table statement for an in-memory database.
pub struct CreateTable<'a> {
    db: &'a Connection,
    table: Cow<'a, str>,
    columns: Vec<SchemaColumn<'a>>,
    constraints: Vec<(ConstraintKind, Vec<String>)>,
    indexes: Vec<Vec<String>>,
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
            .push((kind, columns.into_iter().map(Into::into).collect()));
        self
    }

    fn index<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.indexes
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    async fn execute(self) -> Result<(), Self::Error> {
        tracing::debug!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            self.columns.iter().join(", ")
        );
        let Self {
            db,
            table,
            columns,
            constraints,
            indexes,
        } = self;
        let columns = columns
            .into_iter()
            .map(SchemaColumn::into_static)
            .collect::<Vec<_>>();
        db.atomically(|db| db.create_table(table.into_owned(), columns, constraints, indexes))
            .await
    }
}

/// A row in an in-memory table.
#[derive(Clone, Debug, Default)]
pub struct Row {
    columns: Vec<Value>,
}

impl Row {
    /// Create a row with the given entries.
    fn new(columns: Vec<Value>) -> Self {
        Self { columns }
    }

    /// Create a new row with just the specified columns, in the specified order.
    fn select(self, table: &Table, columns: &[SelectColumn]) -> Result<Self, Error> {
        let mut selected = vec![];
        for col in columns {
            match col {
                SelectColumn::All => selected.extend(self.columns.iter().cloned()),
                SelectColumn::Column(col) => {
                    selected.push(self.columns[table.column(col.name())?].clone());
                }
            }
        }
        Ok(Self { columns: selected })
    }
}

impl super::Row for Row {
    type Error = Error;

    fn column(&self, column: usize) -> Result<Value, Self::Error> {
        self.columns
            .get(column)
            .cloned()
            .ok_or_else(|| format!("column index {column} out of range").into())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        init_logging,
        money::Money,
        sql::db::{
            Check, Connection as _, CreateTable as _, CreateTableExt, Delete as _, Insert as _,
            Row as _, SelectExt, Update as _,
        },
    };
    use std::iter;

    fn rows(rows: Vec<Row>) -> Vec<Vec<Value>> {
        rows.into_iter().map(|row| row.columns).collect()
    }

    /// A parent table `authors` and a child table `books` with the given `ON DELETE` action.
    async fn library(on_delete: ReferentialAction) -> Connection {
        let db = Connection::create();
        db.create_table(
            "authors",
            vec![
                SchemaColumn::new("id", Type::Serial),
                SchemaColumn::new("email", Type::Varchar(20)).not_null(),
            ],
        )
        .constraint(ConstraintKind::PrimaryKey, ["id"])
        .constraint(ConstraintKind::Unique, ["email"])
        .execute()
        .await
        .unwrap();
        db.create_table(
            "books",
            vec![
                SchemaColumn::new("id", Type::Serial),
                SchemaColumn::new("author", Type::Int4),
                SchemaColumn::new("rating", Type::Int4).not_null(),
                SchemaColumn::new("price", Type::Numeric { precision: 4, scale: 2 })
                    .not_null()
                    .default(ColumnDefault::Value(Money::ZERO.into())),
                SchemaColumn::new("added", Type::Timestamp).default(ColumnDefault::Now),
            ],
        )
        .constraints([
            (ConstraintKind::PrimaryKey, vec!["id"]),
            (
                ConstraintKind::foreign_key(
                    "authors",
                    "id",
                    on_delete,
                    ReferentialAction::Cascade,
                ),
                vec!["author"],
            ),
            (
                ConstraintKind::Check(Check::Between { min: 1, max: 5 }),
                vec!["rating"],
            ),
        ])
        .indexes([["author"]])
        .execute()
        .await
        .unwrap();

        db.insert("authors", ["email"])
            .rows([vec!["a@x".into()], vec!["b@x".into()]])
            .execute()
            .await
            .unwrap();
        db.insert("books", ["author", "rating"])
            .rows([
                vec![1.into(), 5.into()],
                vec![1.into(), 4.into()],
                vec![2.into(), 3.into()],
            ])
            .execute()
            .await
            .unwrap();
        db
    }

    async fn books(db: &Connection) -> Vec<Vec<Value>> {
        let columns = [
            SelectColumn::Column("id".into()),
            SelectColumn::Column("author".into()),
        ];
        rows(
            db.select(&columns, "books")
                .order_by("id", Order::Asc)
                .many()
                .await
                .unwrap(),
        )
    }

    #[async_std::test]
    async fn test_defaults_and_serial() {
        init_logging();
        let db = library(ReferentialAction::Cascade).await;

        let ids = db
            .insert("books", ["author", "rating"])
            .rows([vec![2.into(), 1.into()]])
            .returning("id")
            .execute()
            .await
            .unwrap();
        assert_eq!(rows(ids), [[Value::Int4(4)]]);

        let row = db
            .select(&[SelectColumn::All], "books")
            .cmp("id", CmpOp::Eq, 4)
            .one()
            .await
            .unwrap();
        assert_eq!(row.column(3).unwrap(), Value::Money(Money::ZERO));
        assert!(matches!(row.column(4).unwrap(), Value::Timestamp(_)));
        assert!(row.column(5).is_err());
    }

    #[async_std::test]
    async fn test_constraint_violations() {
        init_logging();
        let db = library(ReferentialAction::Cascade).await;

        // Unique.
        let err = db
            .insert("authors", ["email"])
            .rows([vec!["a@x".into()]])
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("authors-uq-email"), "{err}");

        // Not null.
        let err = db
            .insert("books", ["author"])
            .rows([vec![1.into()]])
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not-null"), "{err}");

        // Check.
        let err = db
            .insert("books", ["author", "rating"])
            .rows([vec![1.into(), 6.into()]])
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("books-ck-rating"), "{err}");

        // Foreign key.
        let err = db
            .insert("books", ["author", "rating"])
            .rows([vec![9.into(), 3.into()]])
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("books-fk-author"), "{err}");

        // Type and length.
        let err = db
            .insert("authors", ["email"])
            .rows([vec!["much-too-long@example.com".into()]])
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("character varying(20)"), "{err}");
        let err = db
            .insert("books", ["author", "rating", "price"])
            .rows([vec![1.into(), 3.into(), Money::from_cents(100_00).into()]])
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("overflow"), "{err}");

        // A failing multi-row insert inserts nothing.
        db.insert("books", ["author", "rating"])
            .rows([vec![2.into(), 2.into()], vec![2.into(), 0.into()]])
            .execute()
            .await
            .unwrap_err();
        assert_eq!(books(&db).await.len(), 3);

        // Updates are checked too.
        let err = db
            .update("books")
            .set("rating", 0.into())
            .cmp("id", CmpOp::Eq, 1)
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("books-ck-rating"), "{err}");
    }

    #[async_std::test]
    async fn test_delete_cascade() {
        init_logging();
        let db = library(ReferentialAction::Cascade).await;
        let deleted = db
            .delete("authors")
            .cmp("id", CmpOp::Eq, 1)
            .execute()
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(books(&db).await, [[Value::Int4(3), Value::Int4(2)]]);

        let deleted = db
            .delete("authors")
            .cmp("id", CmpOp::Eq, 1)
            .execute()
            .await
            .unwrap();
        assert_eq!(deleted, 0);
    }

    #[async_std::test]
    async fn test_delete_set_null() {
        init_logging();
        let db = library(ReferentialAction::SetNull).await;
        db.delete("authors")
            .cmp("id", CmpOp::Eq, 1)
            .execute()
            .await
            .unwrap();
        assert_eq!(
            books(&db).await,
            [
                [Value::Int4(1), Value::Null],
                [Value::Int4(2), Value::Null],
                [Value::Int4(3), Value::Int4(2)],
            ]
        );
    }

    #[async_std::test]
    async fn test_delete_restrict() {
        init_logging();
        let db = library(ReferentialAction::NoAction).await;
        let err = db
            .delete("authors")
            .cmp("id", CmpOp::Eq, 2)
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("books-fk-author"), "{err}");
        assert_eq!(books(&db).await.len(), 3);
    }

    #[async_std::test]
    async fn test_update_cascade() {
        init_logging();
        let db = library(ReferentialAction::Cascade).await;
        let updated = db
            .update("authors")
            .set("id", 7.into())
            .cmp("id", CmpOp::Eq, 2)
            .execute()
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(books(&db).await[2], [Value::Int4(3), Value::Int4(7)]);
    }

    #[async_std::test]
    async fn test_update_touch() {
        init_logging();
        let db = library(ReferentialAction::Cascade).await;
        let columns = [SelectColumn::Column("added".into())];
        let before = db
            .select(&columns, "books")
            .cmp("id", CmpOp::Eq, 1)
            .one()
            .await
            .unwrap()
            .column(0)
            .unwrap();
        let updated = db
            .update("books")
            .touch("added")
            .cmp("author", CmpOp::Eq, 1)
            .execute()
            .await
            .unwrap();
        assert_eq!(updated, 2);
        let after = db
            .select(&columns, "books")
            .cmp("id", CmpOp::Eq, 1)
            .one()
            .await
            .unwrap()
            .column(0)
            .unwrap();
        assert!(sort_key_cmp(&before, &after) != Ordering::Greater);
    }

    #[async_std::test]
    async fn test_select_clauses() {
        init_logging();
        let db = library(ReferentialAction::Cascade).await;
        let columns = [SelectColumn::Column("rating".into())];
        let ratings = db
            .select(&columns, "books")
            .cmp("rating", CmpOp::Ge, 4)
            .order_by("rating", Order::Asc)
            .many()
            .await
            .unwrap();
        assert_eq!(rows(ratings), [[Value::Int4(4)], [Value::Int4(5)]]);

        let first = db
            .select(&columns, "books")
            .order_by("rating", Order::Desc)
            .first()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.column(0).unwrap(), Value::Int4(5));

        // `one` requires exactly one row.
        db.select(&columns, "books").one().await.unwrap_err();
        assert!(db
            .select(&columns, "books")
            .cmp("rating", CmpOp::Gt, 5)
            .opt()
            .await
            .unwrap()
            .is_none());

        // Comparisons with mismatched types are errors.
        db.select(&columns, "books")
            .cmp("rating", CmpOp::Eq, "five")
            .many()
            .await
            .unwrap_err();
    }

    #[async_std::test]
    async fn test_truncate_and_drop() {
        init_logging();
        let db = library(ReferentialAction::Cascade).await;
        assert_eq!(db.indexes("books").await.unwrap(), [["author"]]);

        // Dropping a referenced table fails.
        db.drop_table("authors").await.unwrap_err();

        // Truncating the parent empties the child and restarts identities.
        db.truncate(&["authors"]).await.unwrap();
        assert!(books(&db).await.is_empty());
        let ids = db
            .insert("authors", ["email"])
            .rows(iter::once(vec!["c@x".into()]))
            .returning("id")
            .execute()
            .await
            .unwrap();
        assert_eq!(rows(ids), [[Value::Int4(1)]]);

        db.drop_table("books").await.unwrap();
        db.drop_table("authors").await.unwrap();
        db.drop_table("authors").await.unwrap();
        assert!(db.schema().await.is_empty());
    }
}
