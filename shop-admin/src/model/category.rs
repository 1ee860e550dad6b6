use super::Product;
use crate::graphql::{
    type_system::{Id, Record, RecordInput},
    InputObject, MaybeUndefined,
};
use chrono::{DateTime, Utc};

/// A group of related products.
#[derive(Clone, Debug, PartialEq, Eq, Record)]
#[record(table(categories), has_many(products: Product = category_id))]
pub struct Category {
    pub category_id: Id,
    pub category_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, InputObject, RecordInput)]
#[graphql(rename_fields = "snake_case")]
pub struct CategoryInput {
    pub category_name: String,
    pub description: MaybeUndefined<String>,
}
