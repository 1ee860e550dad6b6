//! Sample data for development.
//!
//! [`run`] empties every table of the shop and fills it with a small, fixed data set. Identity
//! counters are restarted, so the sample rows always get the identifiers `1..=n` in the order they
//! are listed here, and seeding can be repeated at will.

use super::{db::Connection, SqlDataSource};
use crate::graphql::backend::{DataSourceExt, Error};
use crate::graphql::type_system::RecordInput;
use crate::model::*;
use crate::money::Money;
use async_graphql::MaybeUndefined;

/// The seeded tables, parents first.
pub const TABLES: [&str; 7] = [
    "categories",
    "products",
    "customers",
    "orders",
    "order_items",
    "payments",
    "reviews",
];

fn text(s: &str) -> MaybeUndefined<String> {
    MaybeUndefined::Value(s.into())
}

fn categories() -> Vec<CategoryInput> {
    [
        ("Electronics", "Electronic devices and accessories"),
        ("Clothing", "Men and women clothing"),
        ("Books", "Books and publications"),
        ("Home & Garden", "Home improvement and garden supplies"),
        ("Sports", "Sports equipment and accessories"),
    ]
    .into_iter()
    .map(|(name, description)| CategoryInput {
        category_name: name.into(),
        description: text(description),
    })
    .collect()
}

fn products() -> Vec<ProductInput> {
    [
        ("Laptop Pro 15", "High-performance laptop with 16GB RAM", 129999, 50, 1),
        ("Wireless Mouse", "Ergonomic wireless mouse", 2999, 200, 1),
        ("Cotton T-Shirt", "Comfortable cotton t-shirt", 1999, 150, 2),
        ("Denim Jeans", "Classic blue denim jeans", 4999, 100, 2),
        ("Python Programming", "Learn Python from scratch", 3999, 75, 3),
        ("Garden Tools Set", "Complete set of garden tools", 8999, 30, 4),
        ("Yoga Mat", "Non-slip yoga mat", 2499, 80, 5),
    ]
    .into_iter()
    .map(|(name, description, price, stock, category)| ProductInput {
        product_name: name.into(),
        description: text(description),
        price: Money::from_cents(price),
        stock_quantity: Some(stock),
        category_id: MaybeUndefined::Value(category),
    })
    .collect()
}

fn customers() -> Vec<CustomerInput> {
    [
        ("John", "Doe", "john.doe@email.com", "555-0101", "123 Main St", "New York", "NY", "10001"),
        ("Jane", "Smith", "jane.smith@email.com", "555-0102", "456 Oak Ave", "Los Angeles", "CA", "90001"),
        ("Mike", "Johnson", "mike.j@email.com", "555-0103", "789 Pine Rd", "Chicago", "IL", "60601"),
        ("Emily", "Brown", "emily.b@email.com", "555-0104", "321 Elm St", "Houston", "TX", "77001"),
        ("David", "Wilson", "david.w@email.com", "555-0105", "654 Maple Dr", "Phoenix", "AZ", "85001"),
    ]
    .into_iter()
    .map(
        |(first, last, email, phone, address, city, state, zip)| CustomerInput {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: text(phone),
            address: text(address),
            city: text(city),
            state: text(state),
            zip_code: text(zip),
            country: None,
        },
    )
    .collect()
}

fn orders() -> Vec<OrderInput> {
    use OrderStatus::*;
    [
        (1, Delivered, 132998, "123 Main St, New York, NY 10001"),
        (2, Shipped, 6998, "456 Oak Ave, Los Angeles, CA 90001"),
        (3, Processing, 8999, "789 Pine Rd, Chicago, IL 60601"),
        (1, Pending, 6998, "123 Main St, New York, NY 10001"),
        (4, Delivered, 3999, "321 Elm St, Houston, TX 77001"),
    ]
    .into_iter()
    .map(|(customer, status, total, address)| OrderInput {
        customer_id: customer,
        status: Some(status),
        total_amount: Money::from_cents(total),
        shipping_address: text(address),
    })
    .collect()
}

fn order_items() -> Vec<OrderItemInput> {
    [
        (1, 1, 1, 129999, 129999),
        (1, 2, 1, 2999, 2999),
        (2, 3, 2, 1999, 3998),
        (2, 2, 1, 2999, 2999),
        (3, 6, 1, 8999, 8999),
        (4, 4, 1, 4999, 4999),
        (4, 3, 1, 1999, 1999),
        (5, 5, 1, 3999, 3999),
    ]
    .into_iter()
    .map(
        |(order, product, quantity, unit_price, subtotal)| OrderItemInput {
            order_id: order,
            product_id: product,
            quantity,
            unit_price: Money::from_cents(unit_price),
            subtotal: Money::from_cents(subtotal),
        },
    )
    .collect()
}

fn payments() -> Vec<PaymentInput> {
    use PaymentMethod::*;
    use PaymentStatus::*;
    [
        (1, CreditCard, 132998, Completed),
        (2, Paypal, 6998, Completed),
        (3, DebitCard, 8999, Pending),
        (5, CreditCard, 3999, Completed),
    ]
    .into_iter()
    .map(|(order, method, amount, status)| PaymentInput {
        order_id: order,
        payment_method: method,
        amount: Money::from_cents(amount),
        status: Some(status),
    })
    .collect()
}

fn reviews() -> Vec<ReviewInput> {
    [
        (1, 1, 5, "Excellent laptop! Fast and reliable."),
        (2, 1, 4, "Good mouse, comfortable to use."),
        (3, 2, 5, "Great quality t-shirt, fits perfectly!"),
        (5, 4, 5, "Best programming book I have read!"),
        (6, 3, 4, "Quality tools, good value for money."),
    ]
    .into_iter()
    .map(|(product, customer, rating, review)| ReviewInput {
        product_id: product,
        customer_id: customer,
        rating,
        review_text: text(review),
    })
    .collect()
}

async fn create_all<Db, I>(db: &SqlDataSource<Db>, inputs: Vec<I>) -> Result<(), Error>
where
    Db: Connection + 'static,
    I: RecordInput,
{
    for input in &inputs {
        db.create(input).await?;
    }
    tracing::info!("seeded {} rows", inputs.len());
    Ok(())
}

/// Replace the contents of every table with the sample data.
pub async fn run<Db: Connection + 'static>(db: &SqlDataSource<Db>) -> Result<(), Error> {
    db.inner().truncate(&TABLES).await.map_err(Error::sql)?;
    create_all(db, categories()).await?;
    create_all(db, products()).await?;
    create_all(db, customers()).await?;
    create_all(db, orders()).await?;
    create_all(db, order_items()).await?;
    create_all(db, payments()).await?;
    create_all(db, reviews()).await?;
    Ok(())
}

/// An in-memory database with the shop schema and the sample data.
#[cfg(any(test, feature = "mocks"))]
pub async fn in_memory() -> Result<SqlDataSource<super::db::mock::Connection>, Error> {
    let db = super::db::mock::Connection::create();
    super::migrations::Migrator::new(&db)
        .latest()
        .await
        .map_err(Error::sql)?;
    let db = SqlDataSource::from(db);
    run(&db).await?;
    Ok(db)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::init_logging;

    #[test]
    fn test_sample_money() {
        assert!(products().iter().all(|p| p.price > Money::ZERO));
        assert!(order_items()
            .iter()
            .all(|item| item.subtotal.cents() == item.unit_price.cents() * i64::from(item.quantity)));
    }

    #[async_std::test]
    async fn test_seed() {
        init_logging();
        let db = in_memory().await.unwrap();

        assert_eq!(db.all::<Category>().await.unwrap().len(), 5);
        assert_eq!(db.all::<Product>().await.unwrap().len(), 7);
        assert_eq!(db.all::<Customer>().await.unwrap().len(), 5);
        assert_eq!(db.all::<Order>().await.unwrap().len(), 5);
        assert_eq!(db.all::<OrderItem>().await.unwrap().len(), 8);
        assert_eq!(db.all::<Payment>().await.unwrap().len(), 4);
        assert_eq!(db.all::<Review>().await.unwrap().len(), 5);

        let jane = db.find::<Customer>(2).await.unwrap().unwrap();
        assert_eq!(jane.email, "jane.smith@email.com");
        assert_eq!(jane.city.as_deref(), Some("Los Angeles"));
        assert_eq!(jane.country, "USA");

        let order = db.find::<Order>(3).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total_amount, Money::from_cents(8999));

        let payment = db.find::<Payment>(4).await.unwrap().unwrap();
        assert_eq!(payment.order_id, 5);
        assert_eq!(payment.payment_method, PaymentMethod::CreditCard);
    }

    #[async_std::test]
    async fn test_reseed() {
        init_logging();
        let db = in_memory().await.unwrap();

        assert!(db.delete::<Category>(1).await.unwrap());
        db.create(&CategoryInput {
            category_name: "Toys".into(),
            ..Default::default()
        })
        .await
        .unwrap();

        run(&db).await.unwrap();
        let categories = db.all::<Category>().await.unwrap();
        assert_eq!(
            categories
                .iter()
                .map(|c| (c.category_id, c.category_name.as_str()))
                .collect::<Vec<_>>(),
            [
                (1, "Electronics"),
                (2, "Clothing"),
                (3, "Books"),
                (4, "Home & Garden"),
                (5, "Sports")
            ]
        );
        assert_eq!(
            db.find::<Product>(1).await.unwrap().unwrap().category_id,
            Some(1)
        );
    }
}
