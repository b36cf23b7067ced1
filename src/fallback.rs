//! Static catalogue served while no database is connected.
//!
//! Shapes match the live tables so clients cannot tell the two apart beyond
//! `Order::persisted`.

use chrono::{DateTime, Utc};
use shopfront_schema::{Order, OrderItem, Product, PublicUser, StoreStats};
use std::sync::LazyLock;

static FALLBACK: LazyLock<FallbackData> = LazyLock::new(FallbackData::build);

pub struct FallbackData {
    users: Vec<PublicUser>,
    products: Vec<Product>,
    orders: Vec<Order>,
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn product(
    id: i64,
    name: &str,
    description: &str,
    category: &str,
    price_cents: i64,
    stock: i64,
) -> Product {
    Product {
        id,
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        price_cents,
        stock,
        image_url: Some(format!("/images/products/{id}.jpg")),
    }
}

fn user(id: i64, name: &str, email: &str, is_admin: bool, created: i64) -> PublicUser {
    PublicUser {
        id,
        name: name.to_string(),
        email: email.to_string(),
        is_admin,
        created_at: at(created),
    }
}

impl FallbackData {
    pub fn get() -> &'static FallbackData {
        &FALLBACK
    }

    fn build() -> Self {
        let users = vec![
            user(1, "Store Admin", "admin@shopfront.dev", true, 1_704_067_200),
            user(2, "Jamie Doe", "jamie@example.com", false, 1_705_309_200),
            user(3, "Alex Roe", "alex@example.com", false, 1_706_745_600),
        ];

        let products = vec![
            product(
                1,
                "Wireless Headphones",
                "Over-ear headphones with 30 hours of battery life.",
                "electronics",
                12_999,
                25,
            ),
            product(
                2,
                "Mechanical Keyboard",
                "Tenkeyless keyboard with hot-swappable switches.",
                "electronics",
                8_950,
                40,
            ),
            product(
                3,
                "Cotton T-Shirt",
                "Heavyweight organic cotton tee.",
                "clothing",
                2_400,
                120,
            ),
            product(
                4,
                "Running Shoes",
                "Lightweight trainers for daily mileage.",
                "clothing",
                11_000,
                18,
            ),
            product(
                5,
                "Pour-Over Coffee Set",
                "Glass dripper, carafe and 100 paper filters.",
                "home",
                3_499,
                60,
            ),
            product(
                6,
                "Desk Lamp",
                "Dimmable LED lamp with USB-C charging port.",
                "home",
                4_599,
                0,
            ),
        ];

        let first_items = vec![
            OrderItem {
                product_id: 1,
                quantity: 1,
                unit_price_cents: 12_999,
            },
            OrderItem {
                product_id: 3,
                quantity: 2,
                unit_price_cents: 2_400,
            },
        ];
        let second_items = vec![OrderItem {
            product_id: 5,
            quantity: 1,
            unit_price_cents: 3_499,
        }];
        let orders = vec![
            Order {
                id: 1,
                user_id: 2,
                status: "delivered".to_string(),
                total_cents: 12_999 + 2 * 2_400,
                items: first_items,
                created_at: at(1_707_955_200),
                persisted: false,
            },
            Order {
                id: 2,
                user_id: 3,
                status: "pending".to_string(),
                total_cents: 3_499,
                items: second_items,
                created_at: at(1_709_251_200),
                persisted: false,
            },
        ];

        Self {
            users,
            products,
            orders,
        }
    }

    pub fn users(&self) -> &[PublicUser] {
        &self.users
    }

    pub fn user(&self, id: i64) -> Option<&PublicUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&PublicUser> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn products_in(&self, category: Option<&str>) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| category.is_none_or(|c| p.in_category(c)))
            .cloned()
            .collect()
    }

    pub fn product(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, id: i64) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            users: self.users.len() as i64,
            products: self.products.len() as i64,
            orders: self.orders.len() as i64,
            connected: false,
        }
    }
}
