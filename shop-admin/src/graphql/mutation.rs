use super::{parse_id, store, Context, DataSourceExt, Object, Result, ID};
use crate::model::*;

/// Root mutation object.
///
/// Updates only touch the fields present in the input: an omitted field keeps its value, and an
/// explicit `null` clears a nullable column. Constraint violations are reported as errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mutation;

#[Object(rename_args = "snake_case")]
impl Mutation {
    async fn create_category(&self, ctx: &Context<'_>, input: CategoryInput) -> Result<Category> {
        Ok(store(ctx)?.create(&input).await?)
    }

    async fn update_category(
        &self,
        ctx: &Context<'_>,
        category_id: ID,
        input: CategoryInput,
    ) -> Result<Category> {
        Ok(store(ctx)?.update(parse_id(&category_id)?, &input).await?)
    }

    /// Products in the category are kept, with their category cleared.
    async fn delete_category(&self, ctx: &Context<'_>, category_id: ID) -> Result<bool> {
        Ok(store(ctx)?.delete::<Category>(parse_id(&category_id)?).await?)
    }

    async fn create_product(&self, ctx: &Context<'_>, input: ProductInput) -> Result<Product> {
        Ok(store(ctx)?.create(&input).await?)
    }

    async fn update_product(
        &self,
        ctx: &Context<'_>,
        product_id: ID,
        input: ProductInput,
    ) -> Result<Product> {
        Ok(store(ctx)?.update(parse_id(&product_id)?, &input).await?)
    }

    async fn delete_product(&self, ctx: &Context<'_>, product_id: ID) -> Result<bool> {
        Ok(store(ctx)?.delete::<Product>(parse_id(&product_id)?).await?)
    }

    async fn create_customer(&self, ctx: &Context<'_>, input: CustomerInput) -> Result<Customer> {
        Ok(store(ctx)?.create(&input).await?)
    }

    async fn update_customer(
        &self,
        ctx: &Context<'_>,
        customer_id: ID,
        input: CustomerInput,
    ) -> Result<Customer> {
        Ok(store(ctx)?.update(parse_id(&customer_id)?, &input).await?)
    }

    /// Deletes the customer's orders and reviews along with it.
    async fn delete_customer(&self, ctx: &Context<'_>, customer_id: ID) -> Result<bool> {
        Ok(store(ctx)?.delete::<Customer>(parse_id(&customer_id)?).await?)
    }

    async fn create_order(&self, ctx: &Context<'_>, input: OrderInput) -> Result<Order> {
        Ok(store(ctx)?.create(&input).await?)
    }

    async fn update_order(&self, ctx: &Context<'_>, order_id: ID, input: OrderInput) -> Result<Order> {
        Ok(store(ctx)?.update(parse_id(&order_id)?, &input).await?)
    }

    /// Deletes the order's items and payment along with it.
    async fn delete_order(&self, ctx: &Context<'_>, order_id: ID) -> Result<bool> {
        Ok(store(ctx)?.delete::<Order>(parse_id(&order_id)?).await?)
    }

    async fn create_order_item(
        &self,
        ctx: &Context<'_>,
        input: OrderItemInput,
    ) -> Result<OrderItem> {
        Ok(store(ctx)?.create(&input).await?)
    }

    async fn update_order_item(
        &self,
        ctx: &Context<'_>,
        order_item_id: ID,
        input: OrderItemInput,
    ) -> Result<OrderItem> {
        Ok(store(ctx)?
            .update(parse_id(&order_item_id)?, &input)
            .await?)
    }

    async fn delete_order_item(&self, ctx: &Context<'_>, order_item_id: ID) -> Result<bool> {
        Ok(store(ctx)?
            .delete::<OrderItem>(parse_id(&order_item_id)?)
            .await?)
    }

    async fn create_payment(&self, ctx: &Context<'_>, input: PaymentInput) -> Result<Payment> {
        Ok(store(ctx)?.create(&input).await?)
    }

    async fn update_payment(
        &self,
        ctx: &Context<'_>,
        payment_id: ID,
        input: PaymentInput,
    ) -> Result<Payment> {
        Ok(store(ctx)?.update(parse_id(&payment_id)?, &input).await?)
    }

    async fn delete_payment(&self, ctx: &Context<'_>, payment_id: ID) -> Result<bool> {
        Ok(store(ctx)?.delete::<Payment>(parse_id(&payment_id)?).await?)
    }

    async fn create_review(&self, ctx: &Context<'_>, input: ReviewInput) -> Result<Review> {
        Ok(store(ctx)?.create(&input).await?)
    }

    async fn update_review(
        &self,
        ctx: &Context<'_>,
        review_id: ID,
        input: ReviewInput,
    ) -> Result<Review> {
        Ok(store(ctx)?.update(parse_id(&review_id)?, &input).await?)
    }

    async fn delete_review(&self, ctx: &Context<'_>, review_id: ID) -> Result<bool> {
        Ok(store(ctx)?.delete::<Review>(parse_id(&review_id)?).await?)
    }
}

#[cfg(test)]
mod test {
    use crate::graphql::{schema, value, ShopSchema, Store};
    use crate::init_logging;
    use crate::sql::seed;

    async fn seeded() -> ShopSchema {
        init_logging();
        schema(Store::new(seed::in_memory().await.unwrap()))
    }

    #[async_std::test]
    async fn test_create_with_defaults() {
        let schema = seeded().await;

        let res = schema
            .execute(
                r#"mutation {
                    createCustomer(input: {
                        first_name: "Ada", last_name: "Lovelace", email: "ada@email.com"
                    }) { customer_id country phone }
                    createProduct(input: { product_name: "Kettle", price: 35.5 }) {
                        product_id stock_quantity category { category_id }
                    }
                    createOrder(input: { customer_id: 2, total_amount: 10 }) {
                        status total_amount shipping_address
                    }
                }"#,
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data,
            value!({
                "createCustomer": {"customer_id": "6", "country": "USA", "phone": null},
                "createProduct": {"product_id": "8", "stock_quantity": 0, "category": null},
                "createOrder": {"status": "pending", "total_amount": 10.0, "shipping_address": null},
            })
        );
    }

    #[async_std::test]
    async fn test_partial_update() {
        let schema = seeded().await;

        let res = schema
            .execute(
                r#"mutation {
                    updateProduct(product_id: "2", input: {
                        product_name: "Wireless Mouse", price: 24.99, description: null
                    }) { price description stock_quantity category_id }
                }"#,
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data,
            value!({
                "updateProduct": {
                    "price": 24.99,
                    "description": null,
                    "stock_quantity": 200,
                    "category_id": 1,
                }
            })
        );

        let res = schema
            .execute(
                r#"mutation {
                    updatePayment(payment_id: "3", input: {
                        order_id: 3, payment_method: bank_transfer, amount: 89.99, status: completed
                    }) { payment_method status }
                }"#,
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data,
            value!({"updatePayment": {"payment_method": "bank_transfer", "status": "completed"}})
        );
    }

    #[async_std::test]
    async fn test_update_missing() {
        let schema = seeded().await;
        let res = schema
            .execute(
                r#"mutation {
                    updateCategory(category_id: "42", input: { category_name: "Toys" }) {
                        category_id
                    }
                }"#,
            )
            .await;
        assert_eq!(res.errors.len(), 1);
        assert!(res.errors[0].message.contains("no row in categories"));
    }

    #[async_std::test]
    async fn test_delete_cascades() {
        let schema = seeded().await;

        let res = schema
            .execute(
                r#"mutation {
                    deleteCategory(category_id: "1")
                    again: deleteCategory(category_id: "1")
                    deleteOrder(order_id: "1")
                }"#,
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data,
            value!({"deleteCategory": true, "again": false, "deleteOrder": true})
        );

        let res = schema
            .execute(
                r#"{
                    product(product_id: "1") { category_id }
                    orderItemsByOrder(order_id: "1") { order_item_id }
                    paymentByOrder(order_id: "1") { payment_id }
                }"#,
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data,
            value!({
                "product": {"category_id": null},
                "orderItemsByOrder": [],
                "paymentByOrder": null,
            })
        );
    }

    #[async_std::test]
    async fn test_delete_customer_cascades() {
        let schema = seeded().await;

        let res = schema
            .execute(r#"mutation { deleteCustomer(customer_id: "1") }"#)
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(res.data, value!({"deleteCustomer": true}));

        // Orders 1 and 4 go with the customer, and so do their items and payment.
        let res = schema
            .execute(
                r#"{
                    customer(customer_id: "1") { email }
                    orders { order_id customer_id }
                    orderItems { order_item_id order_id }
                    payments { payment_id order_id }
                    reviews { review_id customer_id }
                }"#,
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data,
            value!({
                "customer": null,
                "orders": [
                    {"order_id": "2", "customer_id": 2},
                    {"order_id": "3", "customer_id": 3},
                    {"order_id": "5", "customer_id": 4},
                ],
                "orderItems": [
                    {"order_item_id": "3", "order_id": 2},
                    {"order_item_id": "4", "order_id": 2},
                    {"order_item_id": "5", "order_id": 3},
                    {"order_item_id": "8", "order_id": 5},
                ],
                "payments": [
                    {"payment_id": "2", "order_id": 2},
                    {"payment_id": "3", "order_id": 3},
                    {"payment_id": "4", "order_id": 5},
                ],
                "reviews": [
                    {"review_id": "3", "customer_id": 2},
                    {"review_id": "4", "customer_id": 4},
                    {"review_id": "5", "customer_id": 3},
                ],
            })
        );
    }

    #[async_std::test]
    async fn test_delete_product_cascades() {
        let schema = seeded().await;

        let res = schema
            .execute(r#"mutation { deleteProduct(product_id: "1") }"#)
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(res.data, value!({"deleteProduct": true}));

        // The order itself is kept; only the line for the product goes.
        let res = schema
            .execute(
                r#"{
                    order(order_id: "1") { order_items { product_id } }
                    orderItems { product_id }
                    reviews { product_id }
                    category(category_id: "1") { products { product_id } }
                }"#,
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data,
            value!({
                "order": {"order_items": [{"product_id": 2}]},
                "orderItems": [
                    {"product_id": 2},
                    {"product_id": 3},
                    {"product_id": 2},
                    {"product_id": 6},
                    {"product_id": 4},
                    {"product_id": 3},
                    {"product_id": 5},
                ],
                "reviews": [
                    {"product_id": 2},
                    {"product_id": 3},
                    {"product_id": 5},
                    {"product_id": 6},
                ],
                "category": {"products": [{"product_id": "2"}]},
            })
        );
    }

    #[async_std::test]
    async fn test_constraint_violations() {
        let schema = seeded().await;

        for mutation in [
            // Duplicate email.
            r#"mutation {
                createCustomer(input: {
                    first_name: "J", last_name: "D", email: "john.doe@email.com"
                }) { customer_id }
            }"#,
            // Rating out of range.
            r#"mutation {
                createReview(input: { product_id: 1, customer_id: 1, rating: 6 }) { review_id }
            }"#,
            // Unknown order.
            r#"mutation {
                createOrderItem(input: {
                    order_id: 99, product_id: 1, quantity: 1, unit_price: 1, subtotal: 1
                }) { order_item_id }
            }"#,
        ] {
            let res = schema.execute(mutation).await;
            assert_eq!(res.errors.len(), 1, "{mutation}");
        }

        // Nothing was written.
        let res = schema
            .execute("{ customers { customer_id } reviews { review_id } orderItems { order_item_id } }")
            .await;
        let value = res.data.into_json().unwrap();
        assert_eq!(value["customers"].as_array().unwrap().len(), 5);
        assert_eq!(value["reviews"].as_array().unwrap().len(), 5);
        assert_eq!(value["orderItems"].as_array().unwrap().len(), 8);
    }
}
