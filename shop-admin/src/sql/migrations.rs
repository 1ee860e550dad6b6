//! Versioned creation of the shop schema.
//!
//! Each [`Migration`] creates one table, with its constraints and indexes, and reverting it drops
//! the table again. Applied migrations are recorded in a ledger table, [`LEDGER`], so that
//! [`Migrator::latest`] only applies what is pending and [`Migrator::rollback`] knows what to
//! revert.

use super::db::{
    Check, ColumnDefault, Connection, ConstraintKind, CreateTable, CreateTableExt, Delete, Error,
    FromValue, Insert, ReferentialAction, Row, SchemaColumn, SelectColumn, SelectExt, Type, CmpOp,
    Column,
};
use crate::model::{OrderStatus, PaymentMethod, PaymentStatus};
use std::collections::HashSet;

/// The table recording applied migrations.
pub const LEDGER: &str = "schema_migrations";

const MONEY: Type = Type::Numeric {
    precision: 10,
    scale: 2,
};

/// The structure of a table created by a migration.
#[derive(Clone, Debug)]
pub struct TableSchema {
    pub columns: Vec<SchemaColumn<'static>>,
    pub constraints: Vec<(ConstraintKind, Vec<&'static str>)>,
    pub indexes: Vec<Vec<&'static str>>,
}

/// A versioned schema change creating a single table.
#[derive(Clone, Copy, Debug)]
pub struct Migration {
    /// A timestamp-like version; migrations are applied in increasing version order.
    pub version: &'static str,
    pub name: &'static str,
    /// The table created by this migration.
    pub table: &'static str,
    schema: fn() -> TableSchema,
}

impl Migration {
    /// The table created by this migration.
    pub fn schema(&self) -> TableSchema {
        (self.schema)()
    }

    async fn up<C: Connection>(&self, conn: &C) -> Result<(), C::Error> {
        let schema = self.schema();
        conn.create_table(self.table, schema.columns)
            .constraints(schema.constraints)
            .indexes(schema.indexes)
            .execute()
            .await
    }

    async fn down<C: Connection>(&self, conn: &C) -> Result<(), C::Error> {
        conn.drop_table(self.table).await
    }
}

/// Every migration of the shop schema, in version order.
pub static MIGRATIONS: [Migration; 7] = [
    Migration {
        version: "20250101000001",
        name: "create_categories_table",
        table: "categories",
        schema: categories,
    },
    Migration {
        version: "20250101000002",
        name: "create_products_table",
        table: "products",
        schema: products,
    },
    Migration {
        version: "20250101000003",
        name: "create_customers_table",
        table: "customers",
        schema: customers,
    },
    Migration {
        version: "20250101000004",
        name: "create_orders_table",
        table: "orders",
        schema: orders,
    },
    Migration {
        version: "20250101000005",
        name: "create_order_items_table",
        table: "order_items",
        schema: order_items,
    },
    Migration {
        version: "20250101000006",
        name: "create_payments_table",
        table: "payments",
        schema: payments,
    },
    Migration {
        version: "20250101000007",
        name: "create_reviews_table",
        table: "reviews",
        schema: reviews,
    },
];

fn id(name: &'static str) -> SchemaColumn<'static> {
    SchemaColumn::new(name, Type::Serial)
}

fn timestamp(name: &'static str) -> SchemaColumn<'static> {
    SchemaColumn::new(name, Type::Timestamp)
        .not_null()
        .default(ColumnDefault::Now)
}

fn references(table: &str, column: &str, on_delete: ReferentialAction) -> ConstraintKind {
    ConstraintKind::foreign_key(table, column, on_delete, ReferentialAction::Cascade)
}

fn categories() -> TableSchema {
    TableSchema {
        columns: vec![
            id("category_id"),
            SchemaColumn::new("category_name", Type::Varchar(100)).not_null(),
            SchemaColumn::new("description", Type::Text),
            timestamp("created_at"),
        ],
        constraints: vec![(ConstraintKind::PrimaryKey, vec!["category_id"])],
        indexes: vec![],
    }
}

fn products() -> TableSchema {
    TableSchema {
        columns: vec![
            id("product_id"),
            SchemaColumn::new("product_name", Type::Varchar(200)).not_null(),
            SchemaColumn::new("description", Type::Text),
            SchemaColumn::new("price", MONEY).not_null(),
            SchemaColumn::new("stock_quantity", Type::Int4)
                .not_null()
                .default(ColumnDefault::Value(0.into())),
            SchemaColumn::new("category_id", Type::Int4),
            timestamp("created_at"),
            timestamp("updated_at"),
        ],
        constraints: vec![
            (ConstraintKind::PrimaryKey, vec!["product_id"]),
            (
                references("categories", "category_id", ReferentialAction::SetNull),
                vec!["category_id"],
            ),
        ],
        indexes: vec![vec!["category_id"], vec!["product_name"]],
    }
}

fn customers() -> TableSchema {
    TableSchema {
        columns: vec![
            id("customer_id"),
            SchemaColumn::new("first_name", Type::Varchar(50)).not_null(),
            SchemaColumn::new("last_name", Type::Varchar(50)).not_null(),
            SchemaColumn::new("email", Type::Varchar(100)).not_null(),
            SchemaColumn::new("phone", Type::Varchar(20)),
            SchemaColumn::new("address", Type::Text),
            SchemaColumn::new("city", Type::Varchar(50)),
            SchemaColumn::new("state", Type::Varchar(50)),
            SchemaColumn::new("zip_code", Type::Varchar(10)),
            SchemaColumn::new("country", Type::Varchar(50))
                .not_null()
                .default(ColumnDefault::Value("USA".into())),
            timestamp("registration_date"),
        ],
        constraints: vec![
            (ConstraintKind::PrimaryKey, vec!["customer_id"]),
            (ConstraintKind::Unique, vec!["email"]),
        ],
        indexes: vec![vec!["email"], vec!["last_name", "first_name"]],
    }
}

fn orders() -> TableSchema {
    TableSchema {
        columns: vec![
            id("order_id"),
            SchemaColumn::new("customer_id", Type::Int4).not_null(),
            timestamp("order_date"),
            SchemaColumn::new("status", Type::Text)
                .not_null()
                .default(ColumnDefault::Value(OrderStatus::Pending.into())),
            SchemaColumn::new("total_amount", MONEY)
                .not_null()
                .default(ColumnDefault::Value(crate::money::Money::ZERO.into())),
            SchemaColumn::new("shipping_address", Type::Text),
        ],
        constraints: vec![
            (ConstraintKind::PrimaryKey, vec!["order_id"]),
            (
                references("customers", "customer_id", ReferentialAction::Cascade),
                vec!["customer_id"],
            ),
            (
                ConstraintKind::Check(Check::one_of(OrderStatus::ALL.iter().copied())),
                vec!["status"],
            ),
        ],
        indexes: vec![vec!["customer_id"], vec!["order_date"], vec!["status"]],
    }
}

fn order_items() -> TableSchema {
    TableSchema {
        columns: vec![
            id("order_item_id"),
            SchemaColumn::new("order_id", Type::Int4).not_null(),
            SchemaColumn::new("product_id", Type::Int4).not_null(),
            SchemaColumn::new("quantity", Type::Int4).not_null(),
            SchemaColumn::new("unit_price", MONEY).not_null(),
            SchemaColumn::new("subtotal", MONEY).not_null(),
        ],
        constraints: vec![
            (ConstraintKind::PrimaryKey, vec!["order_item_id"]),
            (
                references("orders", "order_id", ReferentialAction::Cascade),
                vec!["order_id"],
            ),
            (
                references("products", "product_id", ReferentialAction::Cascade),
                vec!["product_id"],
            ),
        ],
        indexes: vec![vec!["order_id"], vec!["product_id"]],
    }
}

fn payments() -> TableSchema {
    TableSchema {
        columns: vec![
            id("payment_id"),
            SchemaColumn::new("order_id", Type::Int4).not_null(),
            timestamp("payment_date"),
            SchemaColumn::new("payment_method", Type::Text).not_null(),
            SchemaColumn::new("amount", MONEY).not_null(),
            SchemaColumn::new("status", Type::Text)
                .not_null()
                .default(ColumnDefault::Value(PaymentStatus::Pending.into())),
        ],
        constraints: vec![
            (ConstraintKind::PrimaryKey, vec!["payment_id"]),
            (
                references("orders", "order_id", ReferentialAction::Cascade),
                vec!["order_id"],
            ),
            (
                ConstraintKind::Check(Check::one_of(PaymentMethod::ALL.iter().copied())),
                vec!["payment_method"],
            ),
            (
                ConstraintKind::Check(Check::one_of(PaymentStatus::ALL.iter().copied())),
                vec!["status"],
            ),
        ],
        indexes: vec![vec!["order_id"], vec!["status"]],
    }
}

fn reviews() -> TableSchema {
    TableSchema {
        columns: vec![
            id("review_id"),
            SchemaColumn::new("product_id", Type::Int4).not_null(),
            SchemaColumn::new("customer_id", Type::Int4).not_null(),
            SchemaColumn::new("rating", Type::Int4).not_null(),
            SchemaColumn::new("review_text", Type::Text),
            timestamp("review_date"),
        ],
        constraints: vec![
            (ConstraintKind::PrimaryKey, vec!["review_id"]),
            (
                references("products", "product_id", ReferentialAction::Cascade),
                vec!["product_id"],
            ),
            (
                references("customers", "customer_id", ReferentialAction::Cascade),
                vec!["customer_id"],
            ),
            (
                ConstraintKind::Check(Check::Between { min: 1, max: 5 }),
                vec!["rating"],
            ),
        ],
        indexes: vec![vec!["product_id"], vec!["customer_id"], vec!["rating"]],
    }
}

/// Whether a migration has been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: &'static str,
    pub name: &'static str,
    pub applied: bool,
}

/// Applies and reverts [`MIGRATIONS`] on a database.
pub struct Migrator<'a, C> {
    conn: &'a C,
    migrations: &'a [Migration],
}

impl<'a, C: Connection> Migrator<'a, C> {
    /// A migrator for the shop schema.
    pub fn new(conn: &'a C) -> Self {
        Self::with_migrations(conn, &MIGRATIONS)
    }

    /// A migrator for a custom list of migrations, which must be sorted by version.
    pub fn with_migrations(conn: &'a C, migrations: &'a [Migration]) -> Self {
        Self { conn, migrations }
    }

    /// Apply every pending migration, returning the ones applied.
    pub async fn latest(&self) -> Result<Vec<Migration>, C::Error> {
        let applied = self.applied().await?;
        let mut done = vec![];
        for migration in self.migrations {
            if applied.contains(migration.version) {
                continue;
            }
            tracing::info!("applying migration {} {}", migration.version, migration.name);
            migration.up(self.conn).await?;
            self.conn
                .insert(LEDGER, ["version", "name"])
                .rows([vec![migration.version.into(), migration.name.into()]])
                .execute()
                .await?;
            done.push(*migration);
        }
        if done.is_empty() {
            tracing::info!("schema is up to date");
        }
        Ok(done)
    }

    /// Revert the most recently applied migration, or all of them, returning the ones reverted.
    ///
    /// Migrations are reverted in decreasing version order.
    pub async fn rollback(&self, all: bool) -> Result<Vec<Migration>, C::Error> {
        let applied = self.applied().await?;
        let mut done = vec![];
        for migration in self.migrations.iter().rev() {
            if !applied.contains(migration.version) {
                continue;
            }
            tracing::info!("reverting migration {} {}", migration.version, migration.name);
            migration.down(self.conn).await?;
            self.conn
                .delete(LEDGER)
                .cmp("version", CmpOp::Eq, migration.version)
                .execute()
                .await?;
            done.push(*migration);
            if !all {
                break;
            }
        }
        if done.is_empty() {
            tracing::info!("no migrations to revert");
        }
        Ok(done)
    }

    /// Every known migration and whether it is applied.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>, C::Error> {
        let applied = self.applied().await?;
        Ok(self
            .migrations
            .iter()
            .map(|migration| MigrationStatus {
                version: migration.version,
                name: migration.name,
                applied: applied.contains(migration.version),
            })
            .collect())
    }

    /// The versions recorded in the ledger, which is created if necessary.
    async fn applied(&self) -> Result<HashSet<String>, C::Error> {
        self.conn
            .create_table(
                LEDGER,
                vec![
                    SchemaColumn::new("version", Type::Varchar(14)),
                    SchemaColumn::new("name", Type::Varchar(255)).not_null(),
                    timestamp("applied_at"),
                ],
            )
            .constraint(ConstraintKind::PrimaryKey, ["version"])
            .execute()
            .await?;

        let columns = [SelectColumn::Column(Column::named("version"))];
        let rows = self.conn.select(&columns, LEDGER).many().await?;
        rows.iter()
            .map(|row| String::from_value(row.column(0)?).map_err(C::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{init_logging, sql::db::mock};

    #[async_std::test]
    async fn test_latest() {
        init_logging();
        let db = mock::Connection::create();
        let migrator = Migrator::new(&db);

        let applied = migrator.latest().await.unwrap();
        assert_eq!(
            applied.iter().map(|m| m.table).collect::<Vec<_>>(),
            [
                "categories",
                "products",
                "customers",
                "orders",
                "order_items",
                "payments",
                "reviews"
            ]
        );
        let schema = db.schema().await;
        assert_eq!(schema.len(), 8);
        assert_eq!(
            schema["products"]
                .iter()
                .map(|col| col.name().into_owned())
                .collect::<Vec<_>>(),
            [
                "product_id",
                "product_name",
                "description",
                "price",
                "stock_quantity",
                "category_id",
                "created_at",
                "updated_at"
            ]
        );
        assert_eq!(
            db.indexes("customers").await.unwrap(),
            [vec!["email"], vec!["last_name", "first_name"]]
        );

        // Applying again is a no-op.
        assert!(migrator.latest().await.unwrap().is_empty());
        assert!(migrator
            .status()
            .await
            .unwrap()
            .iter()
            .all(|status| status.applied));
    }

    #[async_std::test]
    async fn test_rollback() {
        init_logging();
        let db = mock::Connection::create();
        let migrator = Migrator::new(&db);
        migrator.latest().await.unwrap();

        let reverted = migrator.rollback(false).await.unwrap();
        assert_eq!(reverted.len(), 1);
        assert_eq!(reverted[0].name, "create_reviews_table");
        let status = migrator.status().await.unwrap();
        assert_eq!(
            status.iter().filter(|status| status.applied).count(),
            MIGRATIONS.len() - 1
        );
        assert_eq!(
            status.last(),
            Some(&MigrationStatus {
                version: "20250101000007",
                name: "create_reviews_table",
                applied: false,
            })
        );
        assert!(!db.schema().await.contains_key("reviews"));

        // Re-applying only creates what was reverted.
        let applied = migrator.latest().await.unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].table, "reviews");

        let reverted = migrator.rollback(true).await.unwrap();
        assert_eq!(
            reverted.iter().map(|m| m.version).collect::<Vec<_>>(),
            MIGRATIONS.iter().rev().map(|m| m.version).collect::<Vec<_>>()
        );
        assert_eq!(db.schema().await.keys().collect::<Vec<_>>(), [LEDGER]);
        assert!(migrator.rollback(true).await.unwrap().is_empty());
    }

    #[async_std::test]
    async fn test_status_fresh() {
        init_logging();
        let db = mock::Connection::create();
        let status = Migrator::new(&db).status().await.unwrap();
        assert_eq!(status.len(), 7);
        assert_eq!(status[0].version, "20250101000001");
        assert_eq!(status[0].name, "create_categories_table");
        assert!(status.iter().all(|status| !status.applied));
    }

    #[test]
    fn test_versions_sorted() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
    }
}
