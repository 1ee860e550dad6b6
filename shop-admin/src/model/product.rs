use super::{Category, Review};
use crate::graphql::{
    type_system::{Id, Record, RecordInput},
    InputObject, MaybeUndefined,
};
use crate::money::Money;
use chrono::{DateTime, Utc};

/// An item for sale.
#[derive(Clone, Debug, PartialEq, Eq, Record)]
#[record(touch(updated_at))]
#[record(belongs_to(category: Category = category_id))]
#[record(has_many(reviews: Review = product_id))]
pub struct Product {
    pub product_id: Id,
    pub product_name: String,
    pub description: Option<String>,
    /// Unit price.
    pub price: Money,
    /// Units in stock.
    pub stock_quantity: i32,
    /// Set to `null` when the category is deleted.
    pub category_id: Option<Id>,
    pub created_at: DateTime<Utc>,
    /// The time of the last update.
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, InputObject, RecordInput)]
#[graphql(rename_fields = "snake_case")]
pub struct ProductInput {
    pub product_name: String,
    pub description: MaybeUndefined<String>,
    pub price: Money,
    /// Defaults to 0 for new products.
    pub stock_quantity: Option<i32>,
    pub category_id: MaybeUndefined<Id>,
}
