use super::{Order, Review};
use crate::graphql::{
    type_system::{Id, Record, RecordInput},
    InputObject, MaybeUndefined,
};
use chrono::{DateTime, Utc};

/// A registered customer of the shop.
#[derive(Clone, Debug, PartialEq, Eq, Record)]
#[record(has_many(orders: Order = customer_id), has_many(reviews: Review = customer_id))]
pub struct Customer {
    pub customer_id: Id,
    pub first_name: String,
    pub last_name: String,
    /// Unique among customers.
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: String,
    pub registration_date: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, InputObject, RecordInput)]
#[graphql(rename_fields = "snake_case")]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: MaybeUndefined<String>,
    pub address: MaybeUndefined<String>,
    pub city: MaybeUndefined<String>,
    pub state: MaybeUndefined<String>,
    pub zip_code: MaybeUndefined<String>,
    /// Defaults to `USA` for new customers.
    pub country: Option<String>,
}
