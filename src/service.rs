use crate::error::{ApiError, is_unique_violation};
use crate::models::{ProfileUpdateRequest, Role, User};
use crate::password::{self, MIN_PASSWORD_LENGTH};
use crate::repository::RepositoryState;

/// Balance credited to newly created accounts.
pub const DEFAULT_ACCOUNT_BALANCE: f64 = 1000.0;

/// NewUser
///
/// Input for account creation. Only seeding uses it in this lab; there is
/// no public registration surface.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Name of the initial role to attach, usually `ROLE_USER`.
    pub role: String,
}

/// UserService
///
/// Business rules over the repository: email uniqueness, password hashing,
/// account defaults, role grants, and the mapping from missing rows to 404s.
/// Holds the repository trait object, so tests can run it against any
/// `Repository` implementation.
#[derive(Clone)]
pub struct UserService {
    repo: RepositoryState,
}

impl UserService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<User, ApiError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or(ApiError::NotFound("User"))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, ApiError> {
        self.repo
            .get_user_by_email(email)
            .await?
            .ok_or(ApiError::NotFound("User"))
    }

    pub async fn find_all(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.repo.get_users().await?)
    }

    pub async fn roles_of(&self, user_id: i64) -> Result<Vec<Role>, ApiError> {
        Ok(self.repo.get_user_roles(user_id).await?)
    }

    /// create_user
    ///
    /// Creates an account with the lab defaults: hashed password, starting
    /// balance, active flag set, one initial role. A taken email answers
    /// 409, whether caught by the pre-check or by losing the race to the
    /// unique index.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, ApiError> {
        if new_user.password.len() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        if self
            .repo
            .get_user_by_email(&new_user.email)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(format!(
                "Email already in use: {}",
                new_user.email
            )));
        }

        let role = self
            .repo
            .get_role_by_name(&new_user.role)
            .await?
            .ok_or(ApiError::NotFound("Role"))?;

        let user = User {
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: password::hash_password(&new_user.password)?,
            account_balance: Some(DEFAULT_ACCOUNT_BALANCE),
            is_active: true,
            ..User::default()
        };

        let created = match self.repo.create_user(&user).await {
            Ok(created) => created,
            Err(err) if is_unique_violation(&err) => {
                return Err(ApiError::Conflict(format!(
                    "Email already in use: {}",
                    user.email
                )));
            }
            Err(err) => return Err(err.into()),
        };

        self.repo.add_user_role(created.id, role.id).await?;
        Ok(created)
    }

    /// update_profile
    ///
    /// The whitelisted update. Everything outside the four DTO fields is
    /// untouched by construction; see `Repository::update_user_profile`.
    pub async fn update_profile(
        &self,
        id: i64,
        update: &ProfileUpdateRequest,
    ) -> Result<User, ApiError> {
        match self.repo.update_user_profile(id, update).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ApiError::NotFound("User")),
            Err(err) if is_unique_violation(&err) => Err(ApiError::Conflict(format!(
                "Email already in use: {}",
                update.email
            ))),
            Err(err) => Err(err.into()),
        }
    }

    /// grant_role
    ///
    /// Attaches a role by name. Idempotent: granting a role the user
    /// already holds succeeds without side effects.
    pub async fn grant_role(&self, user_id: i64, role_name: &str) -> Result<User, ApiError> {
        let user = self.find_by_id(user_id).await?;
        let role = self
            .repo
            .get_role_by_name(role_name)
            .await?
            .ok_or(ApiError::NotFound("Role"))?;

        self.repo.add_user_role(user.id, role.id).await?;
        Ok(user)
    }
}
