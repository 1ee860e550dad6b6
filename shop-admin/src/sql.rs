//! Relational backend based on a SQL database (specifically PostgreSQL).
//!
//! The [`db`] module abstracts over the database, with PostgreSQL and in-memory instantiations.
//! [`migrations`] creates the shop schema and [`seed`] fills it with sample data. The GraphQL API
//! reaches the database through [`SqlDataSource`].

pub mod data_source;
pub mod db;
pub mod migrations;
mod ops;
pub mod seed;

pub use data_source::*;
