use super::{Customer, OrderItem, Payment};
use crate::graphql::{
    type_system::{Id, Record, RecordInput},
    InputObject, MaybeUndefined,
};
use crate::money::Money;
use chrono::{DateTime, Utc};

crate::text_enum! {
    /// The fulfillment stage of an order.
    pub enum OrderStatus {
        Pending = "pending",
        Processing = "processing",
        Shipped = "shipped",
        Delivered = "delivered",
        Cancelled = "cancelled",
    }
}

/// An order placed by a customer.
///
/// The total is stored as given; it is not derived from the order items.
#[derive(Clone, Debug, PartialEq, Eq, Record)]
#[record(belongs_to(customer: Customer = customer_id))]
#[record(has_many(order_items: OrderItem = order_id), has_one(payment: Payment = order_id))]
pub struct Order {
    pub order_id: Id,
    pub customer_id: Id,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: Option<String>,
}

#[derive(Clone, Debug, InputObject, RecordInput)]
#[graphql(rename_fields = "snake_case")]
pub struct OrderInput {
    pub customer_id: Id,
    /// Defaults to `pending` for new orders.
    pub status: Option<OrderStatus>,
    pub total_amount: Money,
    pub shipping_address: MaybeUndefined<String>,
}
