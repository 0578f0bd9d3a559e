use anyhow::Result;
use async_trait::async_trait;
use shared::Profile;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::ProfileStorage;

/// Repository for profile operations
#[derive(Clone)]
pub struct ProfileRepository {
    db: DbConnection,
}

impl ProfileRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStorage for ProfileRepository {
    /// Store a profile in the database
    async fn store_profile(&self, profile: &Profile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, global_xp, last_consolidated)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&profile.id)
        .bind(profile.global_xp)
        .bind(&profile.last_consolidated)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get a profile by user ID
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT id, global_xp, last_consolidated
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(Profile {
                id: r.get("id"),
                global_xp: r.get("global_xp"),
                last_consolidated: r.get("last_consolidated"),
            })),
            None => Ok(None),
        }
    }

    /// Update a profile in the database
    async fn update_profile(&self, profile: &Profile) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE profiles
            SET global_xp = ?, last_consolidated = ?
            WHERE id = ?
            "#,
        )
        .bind(profile.global_xp)
        .bind(&profile.last_consolidated)
        .bind(&profile.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
