//! Common test fixtures: a small users/orders schema and its seeds.
//!
//! [`sample_server`] registers everything under the default base path (and
//! the backend's fallback sources), so `Config::default()` works against it.

use common::{Criteria, DbResult, config::DEFAULT_BASE_PATH};
use memdb::{
    ColumnDef, DEFAULT_MIGRATIONS_PATH, DEFAULT_SEEDS_PATH, MemoryServer, Migration,
    SchemaChange, SeedContext,
};
use std::path::PathBuf;
use types::SqlType;

/// Version of the newest migration in [`schemas::all`].
pub const LATEST_VERSION: u64 = 3;

/// Migrations for the sample schema.
pub mod schemas {
    use super::*;

    /// `users(id INT PK, name TEXT, email TEXT NULL)`
    pub fn create_users() -> Migration {
        Migration::new(1, "create_users")
            .up(SchemaChange::create_table_with_key(
                "users",
                vec![
                    ColumnDef::new("id", SqlType::Int),
                    ColumnDef::new("name", SqlType::Text),
                    ColumnDef::new("email", SqlType::Text).nullable(),
                ],
                &["id"],
            ))
            .down(SchemaChange::drop_table("users"))
    }

    /// `orders(id INT PK, user_id INT NULL, status TEXT)`
    pub fn create_orders() -> Migration {
        Migration::new(2, "create_orders")
            .up(SchemaChange::create_table_with_key(
                "orders",
                vec![
                    ColumnDef::new("id", SqlType::Int),
                    ColumnDef::new("user_id", SqlType::Int).nullable(),
                    ColumnDef::new("status", SqlType::Text),
                ],
                &["id"],
            ))
            .down(SchemaChange::drop_table("orders"))
    }

    /// Adds `users.age INT NULL`. Its rollback is covered by dropping `users`.
    pub fn add_user_age() -> Migration {
        Migration::new(LATEST_VERSION, "add_user_age").up(SchemaChange::add_column(
            "users",
            ColumnDef::new("age", SqlType::Int).nullable(),
        ))
    }

    pub fn all() -> Vec<Migration> {
        vec![create_users(), create_orders(), add_user_age()]
    }
}

/// Sample rows used by the seeds.
pub mod data {
    use super::*;

    /// Rows for:
    /// - (1, "Alice", 30)
    /// - (2, "Bob", 25)
    /// - (3, "Charlie", 35)
    pub fn sample_users() -> Vec<Criteria> {
        [(1, "Alice", 30), (2, "Bob", 25), (3, "Charlie", 35)]
            .into_iter()
            .map(|(id, name, age)| {
                Criteria::new()
                    .with("id", id)
                    .with("name", name)
                    .with("email", format!("{}@example.com", name.to_lowercase()))
                    .with("age", age)
            })
            .collect()
    }

    /// Rows for:
    /// - (1, user 1, "paid")
    /// - (2, user 1, "shipped")
    /// - (3, user 2, "paid")
    pub fn sample_orders() -> Vec<Criteria> {
        [(1, 1, "paid"), (2, 1, "shipped"), (3, 2, "paid")]
            .into_iter()
            .map(|(id, user_id, status)| {
                Criteria::new()
                    .with("id", id)
                    .with("user_id", user_id)
                    .with("status", status)
            })
            .collect()
    }
}

pub fn user_seeder(ctx: &mut SeedContext<'_>) -> DbResult<()> {
    for row in data::sample_users() {
        ctx.insert("users", row)?;
    }
    Ok(())
}

pub fn order_seeder(ctx: &mut SeedContext<'_>) -> DbResult<()> {
    for row in data::sample_orders() {
        ctx.insert("orders", row)?;
    }
    Ok(())
}

pub fn database_seeder(ctx: &mut SeedContext<'_>) -> DbResult<()> {
    ctx.call("UserSeeder")?;
    ctx.call("OrderSeeder")
}

/// Register the sample schema and seeds on `server`.
pub fn register_samples(server: &MemoryServer) {
    let base = PathBuf::from(DEFAULT_BASE_PATH);
    let sources = [
        (base.join("migrations"), base.join("seeds")),
        (
            PathBuf::from(DEFAULT_MIGRATIONS_PATH),
            PathBuf::from(DEFAULT_SEEDS_PATH),
        ),
    ];
    for (migrations, seeds) in sources {
        server.register_migrations(&migrations, schemas::all());
        server.register_seed(&seeds, "UserSeeder", user_seeder);
        server.register_seed(&seeds, "OrderSeeder", order_seeder);
        server.register_seed(&seeds, "DatabaseSeeder", database_seeder);
    }
}

/// A server with the `tests` group and the sample schema and seeds.
pub fn sample_server() -> MemoryServer {
    let server = MemoryServer::new();
    register_samples(&server);
    server
}
