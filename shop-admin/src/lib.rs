//! Back-office GraphQL service for a small online shop.
//!
//! The shop keeps its data in seven PostgreSQL tables: categories, products, customers, orders,
//! order items, payments and reviews. This crate exposes create, read, update and delete operations
//! on all of them through a single GraphQL endpoint. It consists of:
//!
//! * The [model], which declares one record type and one input type per table. The GraphQL object
//!   types and the mapping to and from database rows are derived from these declarations.
//! * The [graphql] API: the schema roots and the typed [backend](graphql::backend) interface the
//!   resolvers use to load and store records.
//! * The [sql] layer, which implements the backend on top of an abstract
//!   [database connection](sql::db::Connection), together with the schema
//!   [migrations](sql::migrations) and [sample data](sql::seed). A PostgreSQL connection is provided,
//!   as well as an in-memory mock database which is useful for lightweight testing.
//! * The [HTTP server](server) and its [configuration](config).

// Lets the derive macros refer to this crate by name from inside it.
extern crate self as shop_admin;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod graphql;
pub mod model;
pub mod money;
pub mod prelude;
pub mod server;
pub mod sql;

/// Initialize tracing.
pub fn init_logging() {
    static ONCE: Once = Once::new();

    ONCE.call_once(|| {
        color_eyre::install().unwrap();
        tracing_subscriber::fmt()
            .with_ansi(true)
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    });
}
