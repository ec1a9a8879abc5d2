use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use staynest_core::repository::{RepoError, UserRepository};
use staynest_core::user::{Role, User};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    phone_number: Option<String>,
    profile_image: Option<String>,
    saved_properties: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn to_user(row: UserRow) -> Result<User, RepoError> {
    Ok(User {
        id: row.id,
        name: row.name,
        email: row.email,
        role: Role::parse(&row.role)?,
        phone_number: row.phone_number,
        profile_image: row.profile_image,
        saved_properties: row.saved_properties,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

const USER_COLS: &str = "id, name, email, role, phone_number, profile_image, \
     saved_properties, created_at, updated_at";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_user).transpose()
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone_number: Option<&str>,
        profile_image: Option<&str>,
    ) -> Result<Option<User>, RepoError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET \
             name = COALESCE($2, name), \
             phone_number = COALESCE($3, phone_number), \
             profile_image = COALESCE($4, profile_image), \
             updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            USER_COLS
        ))
        .bind(id)
        .bind(name)
        .bind(phone_number)
        .bind(profile_image)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_user).transpose()
    }

    async fn set_saved_properties(&self, id: Uuid, saved: &[Uuid]) -> Result<(), RepoError> {
        sqlx::query("UPDATE users SET saved_properties = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(saved.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
