use anyhow::{Context, Result};
use uuid::Uuid;

use crate::config::AdminSeed;
use crate::store::DbHandle;
use crate::store::models::{Role, User};

/// Ensure the configured admin account exists.
///
/// Looks the admin up by email and creates it with role `admin` when absent.
/// Returns the user and whether it was created by this call. An existing
/// account is left untouched, including its password.
pub async fn seed_admin(db: &DbHandle, admin: &AdminSeed) -> Result<(User, bool)> {
    let email = admin.email.trim().to_lowercase();
    if email.is_empty() {
        anyhow::bail!("ADMIN_EMAIL must not be empty");
    }

    let lookup = email.clone();
    if let Some(existing) = db.call(move |db| db.find_user_by_email(&lookup)).await? {
        tracing::info!(email = %existing.email, "admin user already present");
        return Ok((existing, false));
    }

    let hash = crate::service::user::hash_off_thread(admin.password.clone())
        .await
        .context("Failed to hash admin password")?;
    let name = admin.name.clone();
    let (user, created) = db
        .call(move |db| {
            if let Some(existing) = db.find_user_by_email(&email)? {
                return Ok((existing, false));
            }
            let user = db.create_user(Uuid::new_v4(), &name, &email, &hash, &Role::Admin)?;
            Ok((user, true))
        })
        .await
        .context("Failed to seed admin user")?;

    if created {
        tracing::info!(email = %user.email, user_id = %user.public_id, "admin user created");
    } else {
        tracing::info!(email = %user.email, "admin user already present");
    }
    Ok((user, created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::verify_password;
    use crate::store::BoardDb;

    fn admin() -> AdminSeed {
        AdminSeed {
            name: "Super admin".into(),
            email: "Admin@Example.com".into(),
            password: "admin123".into(),
        }
    }

    #[tokio::test]
    async fn test_seed_admin_creates_once() -> Result<()> {
        let db = DbHandle::new(BoardDb::new_in_memory()?);

        let (first, created) = seed_admin(&db, &admin()).await?;
        assert!(created);
        assert_eq!(first.role, Role::Admin);
        assert_eq!(first.email, "admin@example.com");
        assert!(verify_password("admin123", &first.password)?);

        let (second, created) = seed_admin(&db, &admin()).await?;
        assert!(!created);
        assert_eq!(second.public_id, first.public_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_admin_keeps_existing_password() -> Result<()> {
        let db = DbHandle::new(BoardDb::new_in_memory()?);
        seed_admin(&db, &admin()).await?;

        let mut changed = admin();
        changed.password = "something-else".into();
        let (user, created) = seed_admin(&db, &changed).await?;
        assert!(!created);
        assert!(verify_password("admin123", &user.password)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_admin_rejects_blank_email() {
        let db = DbHandle::new(BoardDb::new_in_memory().unwrap());
        let mut blank = admin();
        blank.email = "  ".into();
        assert!(seed_admin(&db, &blank).await.is_err());
    }
}
