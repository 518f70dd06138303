use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, ProfilePatch, User};
use crate::db::{classify, StoreResult};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn create(&self, new: NewUser) -> StoreResult<User>;
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, avatar_url, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, avatar_url, is_admin, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, avatar_url, is_admin, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(classify)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username   = COALESCE($2, username),
                   avatar_url = COALESCE($3, avatar_url)
             WHERE id = $1
            RETURNING id, username, email, password_hash, avatar_url, is_admin, created_at
            "#,
        )
        .bind(id)
        .bind(patch.username)
        .bind(patch.avatar_url)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)
    }
}
