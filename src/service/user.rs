use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::password::hash_password;
use crate::store::DbHandle;
use crate::store::models::{Role, User};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    db: DbHandle,
}

fn normalize_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ServiceError::InvalidInput(format!("invalid email address '{}'", email))),
    }
}

/// Hash on the blocking pool; argon2 is deliberately slow.
pub(crate) async fn hash_off_thread(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::PasswordHash(format!("hashing task failed: {}", e)))?
}

impl UserService {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    /// Register a new account with role `user`.
    ///
    /// The email is trimmed and lowercased before the uniqueness check; the
    /// check and the insert run under the same database lock.
    pub async fn register(&self, req: RegisterUser) -> Result<User, ServiceError> {
        let name = super::clean_title("name", &req.name)?;
        let email = normalize_email(&req.email)?;
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let hash = hash_off_thread(req.password).await?;
        let user = self
            .db
            .call(move |db| {
                if db.find_user_by_email(&email)?.is_some() {
                    return Err(ServiceError::EmailAlreadyRegistered { email }.into());
                }
                db.create_user(Uuid::new_v4(), &name, &email, &hash, &Role::User)
            })
            .await
            .map_err(ServiceError::from_db)?;

        tracing::info!(user_id = %user.public_id, "user registered");
        Ok(user)
    }

    pub async fn delete(&self, public_id: Uuid) -> Result<(), ServiceError> {
        let deleted = self
            .db
            .call(move |db| db.soft_delete_user(public_id))
            .await
            .map_err(ServiceError::from_db)?;
        if !deleted {
            return Err(ServiceError::UserNotFound { id: public_id });
        }
        tracing::info!(user_id = %public_id, "user deleted");
        Ok(())
    }
}
