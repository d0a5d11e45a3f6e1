use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::admin::AdminUser;
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use std::sync::LazyLock;

/// A real Argon2 hash generated once at startup, used as a timing decoy
/// so that login requests for non-existent accounts take the same time as
/// requests for existing ones.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", Salt::from(&salt))
        .expect("failed to generate dummy hash")
        .to_string()
});

impl PostgresRepository {
    /// Credential lookup for the login flow; inactive accounts are invisible.
    pub async fn get_active_admin_by_user_name(&self, user_name: &str) -> Result<Option<AdminUser>, AppError> {
        let admin = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, user_name, password_hash, full_name, is_active, created_at
            FROM admin_users
            WHERE user_name = $1
              AND is_active
            "#,
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    pub async fn verify_password(&self, admin: &AdminUser, password: &str) -> Result<(), AppError> {
        let password_hash =
            PasswordHash::new(&admin.password_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &password_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        Ok(())
    }

    /// Perform a throwaway Argon2 verification to equalize response timing
    /// regardless of whether the target account exists.
    pub fn dummy_verify(password: &str) {
        let hash = PasswordHash::new(&DUMMY_HASH).expect("invalid dummy hash");
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }

    /// Create the admin account, or refresh an existing one. Used by the
    /// bootstrap binary; returns true when the account was newly created.
    pub async fn ensure_admin(
        &self,
        user_name: &str,
        password: Option<&str>,
        full_name: Option<&str>,
    ) -> Result<(AdminUser, bool), AppError> {
        let existing = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, user_name, password_hash, full_name, is_active, created_at
            FROM admin_users
            WHERE user_name = $1
            "#,
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(admin) = existing {
            let password_hash = password.map(hash_password).transpose()?;
            let updated = sqlx::query_as::<_, AdminUser>(
                r#"
                UPDATE admin_users
                SET full_name = COALESCE($1, full_name),
                    password_hash = COALESCE($2, password_hash),
                    updated_at = now()
                WHERE id = $3
                RETURNING id, user_name, password_hash, full_name, is_active, created_at
                "#,
            )
            .bind(full_name)
            .bind(password_hash)
            .bind(admin.id)
            .fetch_one(&self.pool)
            .await?;

            return Ok((updated, false));
        }

        let password = password.ok_or_else(|| AppError::BadRequest("A password is required when creating a new admin account".to_string()))?;
        let password_hash = hash_password(password)?;

        let admin = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (user_name, password_hash, full_name)
            VALUES ($1, $2, $3)
            RETURNING id, user_name, password_hash, full_name, is_active, created_at
            "#,
        )
        .bind(user_name)
        .bind(&password_hash)
        .bind(full_name)
        .fetch_one(&self.pool)
        .await?;

        Ok((admin, true))
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, AppError> {
    let salt_string = SaltString::generate(&mut OsRng);
    let salt = Salt::from(&salt_string);
    let password_hash = PasswordHash::generate(Argon2::default(), password.as_bytes(), salt)?;

    Ok(password_hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_dummy_are_parseable_argon2() {
        let hash = hash_password("hunter2-but-longer").expect("hash");
        assert!(PasswordHash::new(&hash).is_ok());
        // Decoy path must never panic on arbitrary input
        PostgresRepository::dummy_verify("anything at all");
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").expect("hash");
        let b = hash_password("same-password").expect("hash");
        assert_ne!(a, b);
    }
}
