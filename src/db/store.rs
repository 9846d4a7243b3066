// Storage seam used by the startup seeder, with its PostgreSQL implementation

use async_trait::async_trait;
use sqlx::{migrate::Migrator, PgPool};
use std::fmt;

use super::retry::RetryPolicy;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Schema of the current model, created directly when no migration history
/// is tracked
const MODEL_SCHEMA: &str = include_str!("schema.sql");

/// How the schema is brought up to date at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStrategy {
    /// Create missing tables straight from the current model
    CreateFromModel,
    /// Apply pending migrations in order
    ApplyMigrations,
}

impl fmt::Display for SchemaStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaStrategy::CreateFromModel => write!(f, "create from model"),
            SchemaStrategy::ApplyMigrations => write!(f, "apply migrations"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub employee_id: i64,
}

/// Operations the bootstrap seeder needs from the database.
/// Every write commits on its own except `insert_roles`, which commits
/// all of its rows together.
#[async_trait]
pub trait SeedStore: Send + Sync {
    async fn prepare_schema(&self, strategy: SchemaStrategy) -> Result<(), sqlx::Error>;

    /// Exact, case-sensitive name match
    async fn role_exists(&self, name: &str) -> Result<bool, sqlx::Error>;

    async fn insert_roles(&self, roles: &[RoleDefinition]) -> Result<(), sqlx::Error>;

    async fn count_users(&self) -> Result<i64, sqlx::Error>;

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<i64, sqlx::Error>;

    async fn insert_user(&self, user: &NewUser) -> Result<i64, sqlx::Error>;

    async fn find_role_id(&self, name: &str) -> Result<Option<i64>, sqlx::Error>;

    async fn insert_user_role(&self, user_id: i64, role_id: i64) -> Result<(), sqlx::Error>;
}

/// `SeedStore` over a sqlx pool; each operation runs under the retry policy.
///
/// A retried write may replay one that committed before its reply was lost.
/// Role and role-link inserts skip rows that already exist. A replayed
/// employee insert adds a second employee row, and a replayed user insert
/// fails on the unique login.
pub struct PgSeedStore<'a> {
    pool: &'a PgPool,
    retry: RetryPolicy,
}

impl<'a> PgSeedStore<'a> {
    pub fn new(pool: &'a PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl SeedStore for PgSeedStore<'_> {
    async fn prepare_schema(&self, strategy: SchemaStrategy) -> Result<(), sqlx::Error> {
        let pool = self.pool;
        match strategy {
            SchemaStrategy::CreateFromModel => {
                self.retry
                    .run("create schema", move || async move {
                        sqlx::raw_sql(MODEL_SCHEMA).execute(pool).await.map(|_| ())
                    })
                    .await
            }
            SchemaStrategy::ApplyMigrations => {
                self.retry
                    .run("apply migrations", move || async move {
                        MIGRATOR.run(pool).await.map_err(sqlx::Error::from)
                    })
                    .await
            }
        }
    }

    async fn role_exists(&self, name: &str) -> Result<bool, sqlx::Error> {
        let pool = self.pool;
        self.retry
            .run("check role", move || {
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1)")
                    .bind(name)
                    .fetch_one(pool)
            })
            .await
    }

    async fn insert_roles(&self, roles: &[RoleDefinition]) -> Result<(), sqlx::Error> {
        let pool = self.pool;
        self.retry
            .run("insert roles", move || async move {
                let mut tx = pool.begin().await?;
                for role in roles {
                    sqlx::query(
                        "INSERT INTO roles (name, description) VALUES ($1, $2)
                         ON CONFLICT (name) DO NOTHING",
                    )
                    .bind(role.name)
                    .bind(role.description)
                    .execute(&mut *tx)
                    .await?;
                }
                tx.commit().await
            })
            .await
    }

    async fn count_users(&self) -> Result<i64, sqlx::Error> {
        let pool = self.pool;
        self.retry
            .run("count users", move || {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(pool)
            })
            .await
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<i64, sqlx::Error> {
        let pool = self.pool;
        self.retry
            .run("insert employee", move || {
                sqlx::query_scalar::<_, i64>(
                    "INSERT INTO employees (first_name, last_name, national_id, email, phone)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING id",
                )
                .bind(employee.first_name.as_str())
                .bind(employee.last_name.as_str())
                .bind(employee.national_id.as_str())
                .bind(employee.email.as_str())
                .bind(employee.phone.as_str())
                .fetch_one(pool)
            })
            .await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<i64, sqlx::Error> {
        let pool = self.pool;
        self.retry
            .run("insert user", move || {
                sqlx::query_scalar::<_, i64>(
                    "INSERT INTO users (login, password_hash, employee_id)
                     VALUES ($1, $2, $3)
                     RETURNING id",
                )
                .bind(user.login.as_str())
                .bind(user.password_hash.as_str())
                .bind(user.employee_id)
                .fetch_one(pool)
            })
            .await
    }

    async fn find_role_id(&self, name: &str) -> Result<Option<i64>, sqlx::Error> {
        let pool = self.pool;
        self.retry
            .run("find role", move || {
                sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = $1")
                    .bind(name)
                    .fetch_optional(pool)
            })
            .await
    }

    async fn insert_user_role(&self, user_id: i64, role_id: i64) -> Result<(), sqlx::Error> {
        let pool = self.pool;
        self.retry
            .run("link user role", move || async move {
                sqlx::query(
                    "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)
                     ON CONFLICT DO NOTHING",
                )
                .bind(user_id)
                .bind(role_id)
                .execute(pool)
                .await
                .map(|_| ())
            })
            .await
    }
}
