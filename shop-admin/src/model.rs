//! The records of the shop and their GraphQL inputs.
//!
//! Each record mirrors one table of the schema created by [`migrations`](crate::sql::migrations),
//! field for field, and each input is the payload of the create and update mutations for that
//! record. Relations between records are declared on the record types and resolved on demand.

mod category;
mod customer;
mod order;
mod order_item;
mod payment;
mod product;
mod review;

pub use category::*;
pub use customer::*;
pub use order::*;
pub use order_item::*;
pub use payment::*;
pub use product::*;
pub use review::*;
