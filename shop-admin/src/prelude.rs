//! Common items that you will always want in scope when working with the shop API.

pub use crate::graphql::{
    async_graphql::{self, value},
    schema,
    type_system::{Id, Record, RecordInput},
    DataSource, DataSourceExt, MaybeUndefined, ShopSchema, Store,
};
pub use crate::model::*;
pub use crate::money::Money;
