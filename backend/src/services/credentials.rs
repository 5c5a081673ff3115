//! Credential store: user registration and email/password verification.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::{
    error::{AuthError, StoreError},
    models::user::{NewUser, SignInInput, SignUpInput, User},
    repositories::UserRepository,
    utils::{Clock, PasswordHasher},
};

/// Verified against when the email is unknown.
const DUMMY_PASSWORD: &str = "not-a-real-password";

#[derive(Clone)]
pub struct Credentials {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    dummy_hash: Arc<OnceCell<String>>,
}

impl Credentials {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            clock,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Hashes the password and stores the user. Nothing is written until the
    /// hash is ready, so a cancelled call leaves no partial user behind.
    pub async fn create(&self, input: SignUpInput) -> Result<User, AuthError> {
        let password_hash = self.hash_password(input.password).await?;
        let new_user = NewUser {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password_hash,
        };

        match self.users.create(new_user, self.clock.now()).await {
            Ok(user) => Ok(user),
            Err(StoreError::Conflict) => Err(AuthError::UserAlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    /// Unknown email and wrong password are both `UserNotFound`, and both
    /// pay for one password verification.
    pub async fn get_by_credentials(&self, input: &SignInInput) -> Result<User, AuthError> {
        let Some(user) = self.users.find_by_email(&input.email).await? else {
            let dummy = self.dummy_hash().await?;
            self.verify_password(input.password.clone(), dummy).await?;
            return Err(AuthError::UserNotFound);
        };

        if !self
            .verify_password(input.password.clone(), user.password_hash.clone())
            .await?
        {
            return Err(AuthError::UserNotFound);
        }
        Ok(user)
    }

    async fn dummy_hash(&self) -> Result<String, AuthError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD.to_string()))
            .await?;
        Ok(hash.clone())
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockUserRepository;
    use crate::types::UserId;
    use crate::utils::{Argon2Hasher, SystemClock};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHasher {
        hashes: AtomicUsize,
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, _password: &str) -> anyhow::Result<String> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            Ok("$counting$hash".to_string())
        }

        fn verify(&self, _password: &str, _hash: &str) -> anyhow::Result<bool> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }
    }

    fn sign_up() -> SignUpInput {
        SignUpInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "password1".into(),
        }
    }

    fn credentials(repo: MockUserRepository) -> Credentials {
        Credentials::new(
            Arc::new(repo),
            Arc::new(Argon2Hasher::new()),
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_user_already_exists() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .returning(|_, _| Err(StoreError::Conflict));

        let result = credentials(repo).create(sign_up()).await;
        assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn create_stores_a_hash_not_the_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .withf(|user, _| user.password_hash != "password1" && user.password_hash.starts_with("$argon2"))
            .returning(|user, registered_at| {
                Ok(User {
                    id: UserId::new(1),
                    first_name: user.first_name,
                    last_name: user.last_name,
                    email: user.email,
                    password_hash: user.password_hash,
                    registered_at,
                })
            });

        let user = credentials(repo).create(sign_up()).await.expect("create");
        assert_eq!(user.id, UserId::new(1));
    }

    #[tokio::test]
    async fn wrong_password_is_user_not_found() {
        let hash = Argon2Hasher::new().hash("password1").unwrap();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(move |email| {
            Ok(Some(User {
                id: UserId::new(3),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: email.to_string(),
                password_hash: hash.clone(),
                registered_at: Utc::now(),
            }))
        });
        let credentials = credentials(repo);

        let wrong = SignInInput {
            email: "ada@example.com".into(),
            password: "password2".into(),
        };
        assert!(matches!(
            credentials.get_by_credentials(&wrong).await,
            Err(AuthError::UserNotFound)
        ));

        let right = SignInInput {
            password: "password1".into(),
            ..wrong
        };
        let user = credentials.get_by_credentials(&right).await.expect("match");
        assert_eq!(user.id, UserId::new(3));
    }

    #[tokio::test]
    async fn storage_failure_is_internal() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(|_| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        let input = SignInInput {
            email: "ada@example.com".into(),
            password: "password1".into(),
        };
        let err = credentials(repo).get_by_credentials(&input).await.unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn unknown_email_still_verifies_a_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        let hasher = Arc::new(CountingHasher::default());
        let credentials = Credentials::new(Arc::new(repo), hasher.clone(), Arc::new(SystemClock));

        let input = SignInInput {
            email: "nobody@example.com".into(),
            password: "password1".into(),
        };
        for _ in 0..2 {
            assert!(matches!(
                credentials.get_by_credentials(&input).await,
                Err(AuthError::UserNotFound)
            ));
        }
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 2);
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);
    }
}
