// Startup seeding: schema readiness, fixed roles and the bootstrap administrator

use crate::auth;
use crate::error::StartupError;

use super::store::{NewEmployee, NewUser, RoleDefinition, SchemaStrategy, SeedStore};

pub const ADMINISTRATOR_ROLE: &str = "Administrator";
pub const SUPERVISOR_ROLE: &str = "Supervisor";

pub const FIXED_ROLES: [RoleDefinition; 4] = [
    RoleDefinition {
        name: ADMINISTRATOR_ROLE,
        description: "Full access",
    },
    RoleDefinition {
        name: SUPERVISOR_ROLE,
        description: "Same functions as administrator",
    },
    RoleDefinition {
        name: "Customer-Service",
        description: "Access to sales, suppliers, calendar, products and clients",
    },
    RoleDefinition {
        name: "Warehouse",
        description: "Access to operations, maintenance log and calendar",
    },
];

pub const BOOTSTRAP_LOGIN: &str = "admin";
pub const BOOTSTRAP_PASSWORD: &str = "Admin123";

pub fn bootstrap_employee() -> NewEmployee {
    NewEmployee {
        first_name: "Admin".to_string(),
        last_name: "Sistema".to_string(),
        national_id: "12345678".to_string(),
        email: "admin@correo.com".to_string(),
        phone: "999999999".to_string(),
    }
}

/// Outcome of the administrator bootstrap step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminBootstrap {
    Skipped { existing_users: i64 },
    Created { employee_id: i64, user_id: i64, role_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub roles_created: Vec<&'static str>,
    pub admin: AdminBootstrap,
}

/// Bring the database to a minimally usable state. Runs once per process,
/// before the listener is bound; any failure is fatal.
pub async fn run<S>(store: &S, strategy: SchemaStrategy) -> Result<SeedReport, StartupError>
where
    S: SeedStore + ?Sized,
{
    prepare_schema(store, strategy).await?;
    let roles_created = provision_roles(store).await?;
    let admin = bootstrap_admin(store).await?;

    Ok(SeedReport { roles_created, admin })
}

pub async fn prepare_schema<S>(store: &S, strategy: SchemaStrategy) -> Result<(), StartupError>
where
    S: SeedStore + ?Sized,
{
    match strategy {
        SchemaStrategy::ApplyMigrations => tracing::info!("Applying database migrations..."),
        SchemaStrategy::CreateFromModel => {
            tracing::info!("Development environment - ensuring database schema exists")
        }
    }

    store.prepare_schema(strategy).await.map_err(|source| {
        tracing::error!(error = ?source, %strategy, "An error occurred during schema initialization");
        StartupError::SchemaInitialization { strategy, source }
    })?;

    tracing::info!(%strategy, "Database schema ready");
    Ok(())
}

/// Ensure each fixed role exists exactly once. Missing roles are inserted
/// together in a single commit; returns the names that were created.
pub async fn provision_roles<S>(store: &S) -> Result<Vec<&'static str>, StartupError>
where
    S: SeedStore + ?Sized,
{
    let mut missing = Vec::new();
    for role in FIXED_ROLES {
        let exists = store
            .role_exists(role.name)
            .await
            .map_err(|e| seed_failure(format!("checking role '{}'", role.name), e))?;
        if !exists {
            missing.push(role);
        }
    }

    if missing.is_empty() {
        tracing::debug!("All fixed roles already present");
        return Ok(Vec::new());
    }

    store
        .insert_roles(&missing)
        .await
        .map_err(|e| seed_failure("inserting fixed roles".to_string(), e))?;

    let created: Vec<&'static str> = missing.iter().map(|role| role.name).collect();
    tracing::info!(roles = ?created, "Seeded roles");
    Ok(created)
}

/// Create the default administrator when the user table is empty.
///
/// Employee, user and role link are committed one after another. A failure
/// part way through leaves the earlier rows in place; the error names them so
/// an operator can clean up, and the next start skips the bootstrap because
/// the user table is no longer empty once the user row exists.
pub async fn bootstrap_admin<S>(store: &S) -> Result<AdminBootstrap, StartupError>
where
    S: SeedStore + ?Sized,
{
    let existing_users = store
        .count_users()
        .await
        .map_err(|e| seed_failure("counting users".to_string(), e))?;

    if existing_users > 0 {
        tracing::debug!(existing_users, "Users present, skipping administrator bootstrap");
        return Ok(AdminBootstrap::Skipped { existing_users });
    }

    let password_hash = auth::hash_password(BOOTSTRAP_PASSWORD).map_err(|e| {
        tracing::error!(error = ?e, "Failed to hash bootstrap administrator password");
        StartupError::AdminCredential(e.to_string())
    })?;

    let employee_id = store
        .insert_employee(&bootstrap_employee())
        .await
        .map_err(|e| seed_failure("creating the bootstrap employee".to_string(), e))?;

    let user = NewUser {
        login: BOOTSTRAP_LOGIN.to_string(),
        password_hash,
        employee_id,
    };
    let user_id = store.insert_user(&user).await.map_err(|e| {
        tracing::error!(employee_id, "Employee committed without a user account");
        seed_failure("creating the bootstrap user".to_string(), e)
    })?;

    let role_id = store
        .find_role_id(ADMINISTRATOR_ROLE)
        .await
        .map_err(|e| seed_failure(format!("looking up role '{}'", ADMINISTRATOR_ROLE), e))
        .and_then(|found| {
            found.ok_or_else(|| {
                seed_failure(
                    format!("looking up role '{}'", ADMINISTRATOR_ROLE),
                    sqlx::Error::RowNotFound,
                )
            })
        })
        .inspect_err(|_| tracing::error!(user_id, "User committed without a role link"))?;

    store.insert_user_role(user_id, role_id).await.map_err(|e| {
        tracing::error!(user_id, "User committed without a role link");
        seed_failure("linking the bootstrap user to its role".to_string(), e)
    })?;

    tracing::info!(user_id, login = BOOTSTRAP_LOGIN, "Created bootstrap administrator");
    Ok(AdminBootstrap::Created {
        employee_id,
        user_id,
        role_id,
    })
}

fn seed_failure(context: String, source: sqlx::Error) -> StartupError {
    tracing::error!(error = ?source, %context, "An error occurred during database initialization");
    StartupError::SeedData { context, source }
}
