use super::{parse_id, store, Context, DataSourceExt, Object, Result, ID};
use crate::model::*;

/// Root query object.
///
/// Every list is ordered by primary key. Lookups by primary key return `null` for a missing row.
#[derive(Clone, Copy, Debug, Default)]
pub struct Query;

#[Object(rename_args = "snake_case")]
impl Query {
    async fn categories(&self, ctx: &Context<'_>) -> Result<Vec<Category>> {
        Ok(store(ctx)?.all::<Category>().await?)
    }

    async fn category(&self, ctx: &Context<'_>, category_id: ID) -> Result<Option<Category>> {
        Ok(store(ctx)?.find::<Category>(parse_id(&category_id)?).await?)
    }

    async fn products(&self, ctx: &Context<'_>) -> Result<Vec<Product>> {
        Ok(store(ctx)?.all::<Product>().await?)
    }

    async fn product(&self, ctx: &Context<'_>, product_id: ID) -> Result<Option<Product>> {
        Ok(store(ctx)?.find::<Product>(parse_id(&product_id)?).await?)
    }

    async fn products_by_category(
        &self,
        ctx: &Context<'_>,
        category_id: ID,
    ) -> Result<Vec<Product>> {
        let id = parse_id(&category_id)?;
        Ok(store(ctx)?
            .all_by::<Product>("category_id", id.into())
            .await?)
    }

    async fn customers(&self, ctx: &Context<'_>) -> Result<Vec<Customer>> {
        Ok(store(ctx)?.all::<Customer>().await?)
    }

    async fn customer(&self, ctx: &Context<'_>, customer_id: ID) -> Result<Option<Customer>> {
        Ok(store(ctx)?.find::<Customer>(parse_id(&customer_id)?).await?)
    }

    /// Look up a customer by email address. Emails are unique and matched exactly.
    async fn customer_by_email(&self, ctx: &Context<'_>, email: String) -> Result<Option<Customer>> {
        Ok(store(ctx)?
            .first_by::<Customer>("email", email.into())
            .await?)
    }

    async fn orders(&self, ctx: &Context<'_>) -> Result<Vec<Order>> {
        Ok(store(ctx)?.all::<Order>().await?)
    }

    async fn order(&self, ctx: &Context<'_>, order_id: ID) -> Result<Option<Order>> {
        Ok(store(ctx)?.find::<Order>(parse_id(&order_id)?).await?)
    }

    async fn orders_by_customer(&self, ctx: &Context<'_>, customer_id: ID) -> Result<Vec<Order>> {
        let id = parse_id(&customer_id)?;
        Ok(store(ctx)?.all_by::<Order>("customer_id", id.into()).await?)
    }

    async fn order_items(&self, ctx: &Context<'_>) -> Result<Vec<OrderItem>> {
        Ok(store(ctx)?.all::<OrderItem>().await?)
    }

    async fn order_item(&self, ctx: &Context<'_>, order_item_id: ID) -> Result<Option<OrderItem>> {
        Ok(store(ctx)?
            .find::<OrderItem>(parse_id(&order_item_id)?)
            .await?)
    }

    async fn order_items_by_order(
        &self,
        ctx: &Context<'_>,
        order_id: ID,
    ) -> Result<Vec<OrderItem>> {
        let id = parse_id(&order_id)?;
        Ok(store(ctx)?.all_by::<OrderItem>("order_id", id.into()).await?)
    }

    async fn payments(&self, ctx: &Context<'_>) -> Result<Vec<Payment>> {
        Ok(store(ctx)?.all::<Payment>().await?)
    }

    async fn payment(&self, ctx: &Context<'_>, payment_id: ID) -> Result<Option<Payment>> {
        Ok(store(ctx)?.find::<Payment>(parse_id(&payment_id)?).await?)
    }

    /// The payment for an order, if one has been recorded.
    async fn payment_by_order(&self, ctx: &Context<'_>, order_id: ID) -> Result<Option<Payment>> {
        let id = parse_id(&order_id)?;
        Ok(store(ctx)?.first_by::<Payment>("order_id", id.into()).await?)
    }

    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        Ok(store(ctx)?.all::<Review>().await?)
    }

    async fn review(&self, ctx: &Context<'_>, review_id: ID) -> Result<Option<Review>> {
        Ok(store(ctx)?.find::<Review>(parse_id(&review_id)?).await?)
    }

    async fn reviews_by_product(&self, ctx: &Context<'_>, product_id: ID) -> Result<Vec<Review>> {
        let id = parse_id(&product_id)?;
        Ok(store(ctx)?.all_by::<Review>("product_id", id.into()).await?)
    }

    async fn reviews_by_customer(&self, ctx: &Context<'_>, customer_id: ID) -> Result<Vec<Review>> {
        let id = parse_id(&customer_id)?;
        Ok(store(ctx)?.all_by::<Review>("customer_id", id.into()).await?)
    }
}
