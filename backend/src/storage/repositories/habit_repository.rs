use anyhow::Result;
use async_trait::async_trait;
use shared::{Habit, HabitType, TargetPeriod};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::HabitStorage;

/// Repository for habit operations
#[derive(Clone)]
pub struct HabitRepository {
    db: DbConnection,
}

impl HabitRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Map a database row back into a habit
    fn habit_from_row(row: &SqliteRow) -> Result<Habit> {
        let habit_type_str: String = row.get("habit_type");
        let habit_type = HabitType::from_str(&habit_type_str)
            .ok_or_else(|| anyhow::anyhow!("Unknown habit type: {}", habit_type_str))?;

        let target_period_str: String = row.get("target_period");
        let target_period = TargetPeriod::from_str(&target_period_str)
            .ok_or_else(|| anyhow::anyhow!("Unknown target period: {}", target_period_str))?;

        let history_json: String = row.get("completion_history");
        let completion_history: Vec<String> = serde_json::from_str(&history_json)?;

        Ok(Habit {
            id: row.get("id"),
            name: row.get("name"),
            icon: row.get("icon"),
            habit_type,
            target_period,
            target_count: row.get::<i64, _>("target_count") as u32,
            streak: row.get::<i64, _>("streak") as u32,
            points: row.get("points"),
            last_completed: row.get("last_completed"),
            completion_history,
            created_at: row.get("created_at"),
            has_timer: row.get::<i64, _>("has_timer") != 0,
        })
    }
}

#[async_trait]
impl HabitStorage for HabitRepository {
    /// Store a habit in the database
    async fn store_habit(&self, user_id: &str, habit: &Habit) -> Result<()> {
        let history_json = serde_json::to_string(&habit.completion_history)?;

        sqlx::query(
            r#"
            INSERT INTO habits (id, user_id, name, icon, habit_type, target_period,
                                target_count, streak, points, last_completed,
                                completion_history, created_at, has_timer)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&habit.id)
        .bind(user_id)
        .bind(&habit.name)
        .bind(&habit.icon)
        .bind(habit.habit_type.as_str())
        .bind(habit.target_period.as_str())
        .bind(habit.target_count as i64)
        .bind(habit.streak as i64)
        .bind(habit.points)
        .bind(&habit.last_completed)
        .bind(&history_json)
        .bind(&habit.created_at)
        .bind(habit.has_timer as i64)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get a habit by ID
    async fn get_habit(&self, user_id: &str, habit_id: &str) -> Result<Option<Habit>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, icon, habit_type, target_period, target_count,
                   streak, points, last_completed, completion_history,
                   created_at, has_timer
            FROM habits
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(user_id)
        .bind(habit_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(Self::habit_from_row(&r)?)),
            None => Ok(None),
        }
    }

    /// List all habits for a user in creation order (oldest first)
    async fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, icon, habit_type, target_period, target_count,
                   streak, points, last_completed, completion_history,
                   created_at, has_timer
            FROM habits
            WHERE user_id = ?
            ORDER BY ROWID ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::habit_from_row).collect()
    }

    /// Update a habit in the database
    async fn update_habit(&self, user_id: &str, habit: &Habit) -> Result<()> {
        let history_json = serde_json::to_string(&habit.completion_history)?;

        sqlx::query(
            r#"
            UPDATE habits
            SET name = ?, icon = ?, target_period = ?, target_count = ?,
                streak = ?, points = ?, last_completed = ?,
                completion_history = ?, has_timer = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(&habit.name)
        .bind(&habit.icon)
        .bind(habit.target_period.as_str())
        .bind(habit.target_count as i64)
        .bind(habit.streak as i64)
        .bind(habit.points)
        .bind(&habit.last_completed)
        .bind(&history_json)
        .bind(habit.has_timer as i64)
        .bind(user_id)
        .bind(&habit.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Delete a habit by ID
    async fn delete_habit(&self, user_id: &str, habit_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM habits
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(user_id)
        .bind(habit_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_habit(id: &str) -> Habit {
        Habit {
            id: id.to_string(),
            name: "Meditate".to_string(),
            icon: "🧘".to_string(),
            habit_type: HabitType::Positive,
            target_period: TargetPeriod::Daily,
            target_count: 1,
            streak: 3,
            points: 30,
            last_completed: Some("2025-06-19".to_string()),
            completion_history: vec![
                "2025-06-17".to_string(),
                "2025-06-18".to_string(),
                "2025-06-19".to_string(),
            ],
            created_at: "2025-06-01T08:00:00+00:00".to_string(),
            has_timer: true,
        }
    }

    #[tokio::test]
    async fn test_store_and_get_habit() {
        let db = DbConnection::init_test().await.unwrap();
        let repo = HabitRepository::new(db);

        let habit = sample_habit("habit::1");
        repo.store_habit("user-1", &habit).await.unwrap();

        let loaded = repo.get_habit("user-1", "habit::1").await.unwrap().unwrap();
        assert_eq!(loaded, habit);

        // Scoped to the owning user
        let other = repo.get_habit("user-2", "habit::1").await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_list_habits_in_creation_order() {
        let db = DbConnection::init_test().await.unwrap();
        let repo = HabitRepository::new(db);

        repo.store_habit("user-1", &sample_habit("habit::1"))
            .await
            .unwrap();
        repo.store_habit("user-1", &sample_habit("habit::2"))
            .await
            .unwrap();
        repo.store_habit("user-1", &sample_habit("habit::3"))
            .await
            .unwrap();

        let habits = repo.list_habits("user-1").await.unwrap();
        let ids: Vec<&str> = habits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["habit::1", "habit::2", "habit::3"]);
    }

    #[tokio::test]
    async fn test_update_habit() {
        let db = DbConnection::init_test().await.unwrap();
        let repo = HabitRepository::new(db);

        let mut habit = sample_habit("habit::1");
        repo.store_habit("user-1", &habit).await.unwrap();

        habit.points = 0;
        habit.streak = 0;
        habit.last_completed = None;
        habit.completion_history.clear();
        repo.update_habit("user-1", &habit).await.unwrap();

        let loaded = repo.get_habit("user-1", "habit::1").await.unwrap().unwrap();
        assert_eq!(loaded, habit);
    }

    #[tokio::test]
    async fn test_delete_habit() {
        let db = DbConnection::init_test().await.unwrap();
        let repo = HabitRepository::new(db);

        repo.store_habit("user-1", &sample_habit("habit::1"))
            .await
            .unwrap();

        assert!(repo.delete_habit("user-1", "habit::1").await.unwrap());
        assert!(!repo.delete_habit("user-1", "habit::1").await.unwrap());
        assert!(repo
            .get_habit("user-1", "habit::1")
            .await
            .unwrap()
            .is_none());
    }
}
