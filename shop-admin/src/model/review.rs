use super::{Customer, Product};
use crate::graphql::{
    type_system::{Id, Record, RecordInput},
    InputObject, MaybeUndefined,
};
use chrono::{DateTime, Utc};

/// A customer's rating of a product.
#[derive(Clone, Debug, PartialEq, Eq, Record)]
#[record(belongs_to(product: Product = product_id))]
#[record(belongs_to(customer: Customer = customer_id))]
pub struct Review {
    pub review_id: Id,
    pub product_id: Id,
    pub customer_id: Id,
    /// From 1 to 5.
    pub rating: i32,
    pub review_text: Option<String>,
    pub review_date: DateTime<Utc>,
}

#[derive(Clone, Debug, InputObject, RecordInput)]
#[graphql(rename_fields = "snake_case")]
pub struct ReviewInput {
    pub product_id: Id,
    pub customer_id: Id,
    pub rating: i32,
    pub review_text: MaybeUndefined<String>,
}
