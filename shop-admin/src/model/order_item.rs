use super::{Order, Product};
use crate::graphql::{
    type_system::{Id, Record, RecordInput},
    InputObject,
};
use crate::money::Money;

/// A line of an order.
#[derive(Clone, Debug, PartialEq, Eq, Record)]
#[record(belongs_to(product: Product = product_id), belongs_to(order: Order = order_id))]
pub struct OrderItem {
    pub order_item_id: Id,
    pub order_id: Id,
    pub product_id: Id,
    pub quantity: i32,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Clone, Debug, InputObject, RecordInput)]
#[graphql(rename_fields = "snake_case")]
pub struct OrderItemInput {
    pub order_id: Id,
    pub product_id: Id,
    pub quantity: i32,
    pub unit_price: Money,
    pub subtotal: Money,
}
