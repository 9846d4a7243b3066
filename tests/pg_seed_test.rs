// Seeding against a live PostgreSQL server
//
// DATABASE_URL=postgres://... cargo test --test pg_seed_test -- --ignored
//
// Each test works in a throwaway schema so the strategies never share tables.

use emsi::auth;
use emsi::db::{
    retry::RetryPolicy,
    seed::{self, AdminBootstrap, ADMINISTRATOR_ROLE, BOOTSTRAP_LOGIN, BOOTSTRAP_PASSWORD, FIXED_ROLES},
    store::{PgSeedStore, SchemaStrategy, SeedStore},
};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;

struct TestSchema {
    admin: PgPool,
    pool: PgPool,
    name: String,
}

impl TestSchema {
    async fn create(label: &str) -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let base = PgConnectOptions::from_str(&url).expect("Invalid DATABASE_URL");
        let name = format!("emsi_{}_{}", label, uuid::Uuid::new_v4().simple());

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(base.clone())
            .await
            .expect("Failed to connect");
        sqlx::query(&format!("CREATE SCHEMA {}", name))
            .execute(&admin)
            .await
            .expect("Failed to create test schema");

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_with(base.options([("search_path", name.as_str())]))
            .await
            .expect("Failed to connect to test schema");

        Self { admin, pool, name }
    }

    fn store(&self) -> PgSeedStore<'_> {
        PgSeedStore::new(&self.pool, RetryPolicy::disabled())
    }

    async fn drop_schema(self) {
        self.pool.close().await;
        let _ = sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.name))
            .execute(&self.admin)
            .await;
    }
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn assert_seeded(pool: &PgPool) {
    let roles = sqlx::query_scalar::<_, String>("SELECT name FROM roles ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap();
    let expected: Vec<String> = FIXED_ROLES.iter().map(|r| r.name.to_string()).collect();
    assert_eq!(roles, expected);

    assert_eq!(count(pool, "employees").await, 1);
    assert_eq!(count(pool, "users").await, 1);
    assert_eq!(count(pool, "user_roles").await, 1);

    let (login, password_hash) =
        sqlx::query_as::<_, (String, String)>("SELECT login, password_hash FROM users")
            .fetch_one(pool)
            .await
            .unwrap();
    assert_eq!(login, BOOTSTRAP_LOGIN);
    assert!(auth::verify_password(BOOTSTRAP_PASSWORD, &password_hash).unwrap());

    let linked = sqlx::query_scalar::<_, String>(
        "SELECT r.name
         FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         JOIN users u ON u.id = ur.user_id
         WHERE u.login = $1",
    )
    .bind(BOOTSTRAP_LOGIN)
    .fetch_all(pool)
    .await
    .unwrap();
    assert_eq!(linked, vec![ADMINISTRATOR_ROLE.to_string()]);

    let employee = sqlx::query_as::<_, (String, String, String, String, String)>(
        "SELECT first_name, last_name, national_id, email, phone FROM employees",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    assert_eq!(
        employee,
        (
            "Admin".to_string(),
            "Sistema".to_string(),
            "12345678".to_string(),
            "admin@correo.com".to_string(),
            "999999999".to_string(),
        )
    );
}

async fn seed_twice(strategy: SchemaStrategy, label: &str) -> TestSchema {
    let schema = TestSchema::create(label).await;

    let first = seed::run(&schema.store(), strategy).await.unwrap();
    assert_eq!(first.roles_created.len(), 4);
    assert!(matches!(first.admin, AdminBootstrap::Created { .. }));

    let second = seed::run(&schema.store(), strategy).await.unwrap();
    assert!(second.roles_created.is_empty());
    assert_eq!(second.admin, AdminBootstrap::Skipped { existing_users: 1 });

    schema
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_create_from_model_seeds_once() {
    let schema = seed_twice(SchemaStrategy::CreateFromModel, "model").await;

    assert_seeded(&schema.pool).await;

    schema.drop_schema().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_apply_migrations_seeds_once() {
    let schema = seed_twice(SchemaStrategy::ApplyMigrations, "migrate").await;

    assert_seeded(&schema.pool).await;
    let applied = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(&schema.pool)
        .await
        .unwrap();
    assert_eq!(applied, 2);

    schema.drop_schema().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_model_schema_matches_migrations() {
    let model = TestSchema::create("model_shape").await;
    let migrated = TestSchema::create("migrate_shape").await;
    model
        .store()
        .prepare_schema(SchemaStrategy::CreateFromModel)
        .await
        .unwrap();
    migrated
        .store()
        .prepare_schema(SchemaStrategy::ApplyMigrations)
        .await
        .unwrap();

    async fn columns(schema: &TestSchema) -> Vec<(String, String, String, String)> {
        sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT table_name::text, column_name::text, data_type::text, is_nullable::text
             FROM information_schema.columns
             WHERE table_schema = $1 AND table_name <> '_sqlx_migrations'
             ORDER BY table_name, column_name",
        )
        .bind(&schema.name)
        .fetch_all(&schema.admin)
        .await
        .unwrap()
    }

    async fn indexes(schema: &TestSchema) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT indexname::text
             FROM pg_indexes
             WHERE schemaname = $1 AND tablename <> '_sqlx_migrations'
             ORDER BY indexname",
        )
        .bind(&schema.name)
        .fetch_all(&schema.admin)
        .await
        .unwrap()
    }

    let model_columns = columns(&model).await;
    assert!(!model_columns.is_empty());
    assert_eq!(model_columns, columns(&migrated).await);
    assert_eq!(indexes(&model).await, indexes(&migrated).await);

    model.drop_schema().await;
    migrated.drop_schema().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_replayed_role_writes_are_harmless() {
    let schema = TestSchema::create("replay").await;
    let store = schema.store();
    seed::run(&store, SchemaStrategy::CreateFromModel).await.unwrap();

    // A retry after a lost commit reply sends the same rows again
    store.insert_roles(&FIXED_ROLES).await.unwrap();
    assert_eq!(count(&schema.pool, "roles").await, 4);

    let (user_id, role_id) = sqlx::query_as::<_, (i64, i64)>("SELECT user_id, role_id FROM user_roles")
        .fetch_one(&schema.pool)
        .await
        .unwrap();
    store.insert_user_role(user_id, role_id).await.unwrap();
    assert_eq!(count(&schema.pool, "user_roles").await, 1);

    drop(store);
    schema.drop_schema().await;
}
