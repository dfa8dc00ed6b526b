use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::models::{ProfileUpdateRequest, Role, User};

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone_number, password_hash, \
     account_balance, is_active, passport_number, national_id";

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, so handlers
/// and the service layer never touch SQL directly. Errors are propagated to
/// the caller; mapping a unique violation to a 409 or a missing row to a 404
/// is service business, not repository business.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error>;
    // Feeds the enumeration oracle.
    async fn user_exists(&self, id: i64) -> Result<bool, sqlx::Error>;
    async fn count_users(&self) -> Result<i64, sqlx::Error>;
    // Inserts a new row; the id on the input is ignored and the stored row
    // (fresh sequential id included) is returned.
    async fn create_user(&self, user: &User) -> Result<User, sqlx::Error>;
    // Full-row overwrite by id. This is the write the mass-assignment demo
    // rides on; the secure path never calls it.
    async fn save_user(&self, user: &User) -> Result<Option<User>, sqlx::Error>;
    // Whitelisted update: exactly email, first_name, last_name, phone_number.
    async fn update_user_profile(
        &self,
        id: i64,
        update: &ProfileUpdateRequest,
    ) -> Result<Option<User>, sqlx::Error>;

    // --- Roles ---
    async fn get_role_by_id(&self, id: i64) -> Result<Option<Role>, sqlx::Error>;
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, sqlx::Error>;
    async fn create_role(&self, name: &str, description: Option<&str>)
    -> Result<Role, sqlx::Error>;
    async fn count_roles(&self) -> Result<i64, sqlx::Error>;
    // Membership is always read through the join table, never cached.
    async fn get_user_roles(&self, user_id: i64) -> Result<Vec<Role>, sqlx::Error>;
    // Idempotent: granting a role twice leaves a single join row.
    async fn add_user_role(&self, user_id: i64, role_id: i64) -> Result<(), sqlx::Error>;
    // Wholesale replacement inside one transaction.
    async fn replace_user_roles(&self, user_id: i64, role_ids: &[i64])
    -> Result<(), sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// connect
///
/// Builds the SQLite pool and runs the embedded migrations. In-memory
/// databases live and die with their connection, so the pool is pinned to a
/// single connection that never expires; otherwise a second acquire would
/// see an empty schema.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let mut pool_options = SqlitePoolOptions::new();
    if in_memory {
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        pool_options = pool_options.max_connections(5);
    }

    let pool = pool_options.connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
    }

    async fn user_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    async fn count_users(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    /// create_user
    ///
    /// Inserts a new user and returns the stored row. The database assigns
    /// the next sequential id.
    async fn create_user(&self, user: &User) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, first_name, last_name, phone_number, password_hash, \
             account_balance, is_active, passport_number, national_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.account_balance)
        .bind(user.is_active)
        .bind(&user.passport_number)
        .bind(&user.national_id)
        .fetch_one(&self.pool)
        .await
    }

    /// save_user
    ///
    /// Overwrites every column of the row identified by `user.id`. Returns
    /// `None` when no such row exists.
    async fn save_user(&self, user: &User) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email = ?, first_name = ?, last_name = ?, phone_number = ?, \
             password_hash = ?, account_balance = ?, is_active = ?, passport_number = ?, \
             national_id = ? \
             WHERE id = ? \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.account_balance)
        .bind(user.is_active)
        .bind(&user.passport_number)
        .bind(&user.national_id)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await
    }

    /// update_user_profile
    ///
    /// Touches only the four whitelisted columns. Everything else on the row
    /// is untouchable from this statement, by construction.
    async fn update_user_profile(
        &self,
        id: i64,
        update: &ProfileUpdateRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email = ?, first_name = ?, last_name = ?, phone_number = ? \
             WHERE id = ? \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&update.email)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone_number)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_role_by_id(&self, id: i64) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_role(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name, description) VALUES (?, ?) \
             RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
    }

    async fn count_roles(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool)
            .await
    }

    /// get_user_roles
    ///
    /// The explicit join. Role membership has exactly one source of truth,
    /// the `user_roles` table, and this is the only read path to it.
    async fn get_user_roles(&self, user_id: i64) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT r.id, r.name, r.description \
             FROM roles r \
             INNER JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = ? \
             ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// add_user_role
    ///
    /// `INSERT OR IGNORE` keeps the grant idempotent: promoting an admin a
    /// second time succeeds without duplicating the join row.
    async fn add_user_role(&self, user_id: i64, role_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// replace_user_roles
    ///
    /// Deletes and re-inserts the membership rows inside one transaction, so
    /// a failed replacement never leaves a user role-less.
    async fn replace_user_roles(
        &self,
        user_id: i64,
        role_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role_id in role_ids {
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
