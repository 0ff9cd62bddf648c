use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use axum_pos_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_role = ensure_role(&pool, "Admin", "Full administrative access").await?;
    ensure_role(&pool, "Manager", "Product and feedback management").await?;
    ensure_role(&pool, "Cashier", "Point-of-sale access").await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", admin_role).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_role(
    pool: &sqlx::PgPool,
    name: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO roles (id, name, description)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .execute(pool)
    .await?;

    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM roles WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;

    println!("Ensured role {name}");
    Ok(id)
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role_id: Uuid,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, first_name, last_name, age, gender, contact, address,
                           role_id, email, password_hash)
        VALUES ($1, 'System', 'Administrator', 30, 'others', '-', '-', $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role_id = EXCLUDED.role_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(role_id)
    .bind(email)
    .bind(password_hash)
    .execute(pool)
    .await?;

    let (user_id,): (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await?;

    println!("Ensured user {email}");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("Iced Coffee", 9_000, 80),
        ("Cheese Sandwich", 12_500, 40),
        ("Banana Muffin", 6_000, 60),
        ("Bottled Water", 2_500, 200),
    ];

    for (name, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price as i64)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
