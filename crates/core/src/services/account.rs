//! Account service: registration, sign-in and token authentication.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::Set;
use serde::Deserialize;
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{profile, user},
    repositories::{ProfileRepository, UserRepository},
};
use validator::Validate;

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(custom(function = "universe_common::validation::validate_username"))]
    pub username: String,

    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(
        length(max = 128),
        custom(function = "universe_common::validation::validate_password")
    )]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirm: String,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    #[serde(default)]
    pub accept_terms: bool,
}

/// Input for signing in.
#[derive(Debug, Deserialize, Validate)]
pub struct SignInInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, profile_repo: ProfileRepository) -> Self {
        Self {
            user_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account and its empty profile.
    ///
    /// The returned user carries a fresh API token.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if !input.accept_terms {
            return Err(AppError::BadRequest(
                "You must accept the terms and conditions".to_string(),
            ));
        }

        let email = input.email.trim().to_lowercase();

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(email),
            first_name: Set(input.first_name.filter(|s| !s.trim().is_empty())),
            last_name: Set(input.last_name.filter(|s| !s.trim().is_empty())),
            password_hash: Set(password_hash),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(user_model).await?;

        let profile_model = profile::ActiveModel {
            user_id: Set(user_id),
            bio: Set(None),
            avatar_url: Set(None),
            cover_url: Set(None),
            location: Set(None),
            website: Set(None),
            birth_date: Set(None),
            updated_at: Set(None),
        };
        self.profile_repo.create(profile_model).await?;

        tracing::info!(user = %user.id, username = %user.username, "Account registered");
        Ok(user)
    }

    /// Check credentials and return the user with a usable token.
    pub async fn sign_in(&self, input: SignInInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if user.token.is_some() {
            return Ok(user);
        }

        // Signed out earlier: issue a new token.
        self.rotate_token(user).await
    }

    /// Invalidate the current token by replacing it.
    pub async fn sign_out(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.rotate_token(user).await?;
        Ok(())
    }

    /// Authenticate a user by API token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    async fn rotate_token(&self, user: user::Model) -> AppResult<user::Model> {
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await
    }
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
