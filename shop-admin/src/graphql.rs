//! The GraphQL API of the shop.
//!
//! The schema has a [`Query`] root with list and lookup queries for every table and a [`Mutation`]
//! root with create, update and delete mutations for every table. The object types themselves are
//! generated from the [model](crate::model) by `#[derive(Record)]`. Resolvers reach the database
//! through the [`Store`] attached to the schema as context data.

pub mod backend;
mod mutation;
mod query;
pub mod type_system;

// Re-export commonly used `async_graphql` types.
pub use async_graphql::{
    value, Context, EmptySubscription, Enum, Error, InputObject, MaybeUndefined, Object, Result,
    Schema, ID,
};
pub use backend::{DataSource, DataSourceExt, Store};
pub use mutation::Mutation;
pub use query::Query;

// Re-export `async_graphql` directly as an escape hatch.
pub extern crate async_graphql;

/// The executable schema of the shop API.
pub type ShopSchema = Schema<Query, Mutation, EmptySubscription>;

/// Build the schema, serving data from `store`.
pub fn schema(store: Store) -> ShopSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(store)
        .finish()
}

/// The schema in GraphQL SDL.
pub fn sdl() -> String {
    Schema::build(Query, Mutation, EmptySubscription)
        .finish()
        .sdl()
}

fn store<'a>(ctx: &Context<'a>) -> Result<&'a Store> {
    ctx.data::<Store>()
}

fn parse_id(id: &ID) -> Result<type_system::Id> {
    id.parse()
        .map_err(|_| Error::new(format!("invalid id {:?}", id.as_str())))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sdl() {
        let sdl = sdl();
        for ty in [
            "type Category",
            "type Product",
            "type Customer",
            "type Order",
            "type OrderItem",
            "type Payment",
            "type Review",
            "input ProductInput",
            "enum OrderStatus",
            "scalar Money",
        ] {
            assert!(sdl.contains(ty), "missing {ty}");
        }
        assert!(sdl.contains("productsByCategory("));
        assert!(sdl.contains("deleteOrderItem("));
        assert!(sdl.contains("order_item_id: ID!"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(&ID::from("42")).unwrap(), 42);
        assert!(parse_id(&ID::from("forty-two")).is_err());
    }
}
