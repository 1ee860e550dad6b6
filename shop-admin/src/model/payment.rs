use super::Order;
use crate::graphql::{
    type_system::{Id, Record, RecordInput},
    InputObject,
};
use crate::money::Money;
use chrono::{DateTime, Utc};

crate::text_enum! {
    pub enum PaymentMethod {
        CreditCard = "credit_card",
        DebitCard = "debit_card",
        Paypal = "paypal",
        BankTransfer = "bank_transfer",
        Cash = "cash",
    }
}

crate::text_enum! {
    pub enum PaymentStatus {
        Pending = "pending",
        Completed = "completed",
        Failed = "failed",
        Refunded = "refunded",
    }
}

/// A payment towards an order.
#[derive(Clone, Debug, PartialEq, Eq, Record)]
#[record(belongs_to(order: Order = order_id))]
pub struct Payment {
    pub payment_id: Id,
    pub order_id: Id,
    pub payment_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentStatus,
}

#[derive(Clone, Debug, InputObject, RecordInput)]
#[graphql(rename_fields = "snake_case")]
pub struct PaymentInput {
    pub order_id: Id,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    pub status: Option<PaymentStatus>,
}
