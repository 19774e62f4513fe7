use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_id = ensure_user(&pool, "customer@example.com", "customer123").await?;
    seed_products(&pool).await?;
    seed_payment_methods(&pool).await?;
    seed_coupons(&pool).await?;

    println!("Seed completed. Customer ID: {user_id}");
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, phone)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind("555-0100")
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email}");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("Canvas Tote", "Everyday carry-all", 550, 50, 20),
        ("Ceramic Mug", "Holds 350ml of coffee", 120, 0, 100),
        ("Desk Lamp", "Warm-white LED", 900, 100, 35),
        ("Notebook Set", "Three dotted notebooks", 250, 0, 75),
    ];

    for (name, desc, price, discount, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, discount, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(discount)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_payment_methods(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let methods = vec![
        ("cod", "Cash on delivery", true),
        ("card", "Credit or debit card", true),
        ("wallet", "Mobile wallet", false),
    ];

    for (name, desc, enabled) in methods {
        sqlx::query(
            r#"
            INSERT INTO payment_methods (id, name, description, enabled)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE SET enabled = EXCLUDED.enabled
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(enabled)
        .execute(pool)
        .await?;
    }

    println!("Seeded payment methods");
    Ok(())
}

async fn seed_coupons(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let next_month = Utc::now() + Duration::days(30);
    let coupons = vec![
        ("WELCOME10", "percentage", 10i64, Some(50i64), 0i64),
        ("SAVE50", "direct", 50, None, 100),
    ];

    for (code, kind, discount, max_discount, min_order) in coupons {
        sqlx::query(
            r#"
            INSERT INTO coupons (id, code, discount_type, discount, max_discount, min_order, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(kind)
        .bind(discount)
        .bind(max_discount)
        .bind(min_order)
        .bind(next_month)
        .execute(pool)
        .await?;
    }

    println!("Seeded coupons");
    Ok(())
}
