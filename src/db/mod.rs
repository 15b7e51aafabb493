// Stub backend storage (SQLite via sqlx): used heroes, quizzes, daily challenges.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsedHero {
    pub hero: String,
    pub posted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredQuiz {
    pub id: i64,
    pub question: String,
    pub options_json: String,
    pub correct_index: i64,
    pub explanation: Option<String>,
    pub created_at: String,
}

impl StoredQuiz {
    pub fn options(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.options_json)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredDailyChallenge {
    pub date: String,
    pub text: String,
    pub created_at: String,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        // Each connection to `sqlite::memory:` is its own database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS used_heroes (
                hero TEXT PRIMARY KEY,
                posted_at TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                options_json TEXT NOT NULL,
                correct_index INTEGER NOT NULL,
                explanation TEXT,
                created_at TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_challenges (
                date TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Heroes ────────────────────────────────────────────────────────

    pub async fn used_heroes(&self) -> Result<Vec<UsedHero>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UsedHero>(
            "SELECT hero, posted_at FROM used_heroes ORDER BY posted_at, hero",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Returns false when the hero was already marked; the first timestamp wins.
    pub async fn mark_hero_used(&self, hero: &str, posted_at: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("INSERT OR IGNORE INTO used_heroes (hero, posted_at) VALUES (?, ?)")
            .bind(hero)
            .bind(posted_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn reset_heroes(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM used_heroes")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ── Quizzes ───────────────────────────────────────────────────────

    pub async fn save_quiz(
        &self,
        question: &str,
        options: &[String],
        correct_index: i64,
        explanation: Option<&str>,
        created_at: &str,
    ) -> Result<i64, sqlx::Error> {
        let options_json =
            serde_json::to_string(options).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let result = sqlx::query(
            "INSERT INTO quizzes (question, options_json, correct_index, explanation, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(question)
        .bind(options_json)
        .bind(correct_index)
        .bind(explanation)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_quiz(&self, id: i64) -> Result<Option<StoredQuiz>, sqlx::Error> {
        let row = sqlx::query_as::<_, StoredQuiz>(
            "SELECT id, question, options_json, correct_index, explanation, created_at FROM quizzes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ── Daily challenges ──────────────────────────────────────────────

    pub async fn get_daily_challenge(
        &self,
        date: &str,
    ) -> Result<Option<StoredDailyChallenge>, sqlx::Error> {
        let row = sqlx::query_as::<_, StoredDailyChallenge>(
            "SELECT date, text, created_at FROM daily_challenges WHERE date = ?",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Store the day's challenge unless one exists, and return whichever is
    /// stored afterwards.
    pub async fn save_daily_challenge(
        &self,
        date: &str,
        text: &str,
        created_at: &str,
    ) -> Result<StoredDailyChallenge, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO daily_challenges (date, text, created_at) VALUES (?, ?, ?)")
            .bind(date)
            .bind(text)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        self.get_daily_challenge(date)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_mark_hero_used_is_idempotent() {
        let db = test_db().await;

        assert!(db.mark_hero_used("Fanny", "2026-01-01T00:00:00Z").await.unwrap());
        assert!(!db.mark_hero_used("Fanny", "2026-01-02T00:00:00Z").await.unwrap());
        assert!(db.mark_hero_used("Ling", "2026-01-03T00:00:00Z").await.unwrap());

        let used = db.used_heroes().await.unwrap();
        assert_eq!(used.len(), 2);
        assert_eq!(used[0].hero, "Fanny");
        assert_eq!(used[0].posted_at, "2026-01-01T00:00:00Z");

        assert_eq!(db.reset_heroes().await.unwrap(), 2);
        assert!(db.used_heroes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quiz_round_trip() {
        let db = test_db().await;
        let options = vec!["Anti-heal".to_string(), "Shield".to_string()];
        let id = db
            .save_quiz("What does it do?", &options, 0, Some("Reduces healing"), "now")
            .await
            .unwrap();

        let quiz = db.get_quiz(id).await.unwrap().unwrap();
        assert_eq!(quiz.question, "What does it do?");
        assert_eq!(quiz.options().unwrap(), options);
        assert_eq!(quiz.correct_index, 0);
        assert_eq!(quiz.explanation.as_deref(), Some("Reduces healing"));

        assert!(db.get_quiz(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_daily_challenge_first_write_wins() {
        let db = test_db().await;
        assert!(db.get_daily_challenge("2026-10-17").await.unwrap().is_none());

        let first = db
            .save_daily_challenge("2026-10-17", "Win without dying twice", "t1")
            .await
            .unwrap();
        let second = db
            .save_daily_challenge("2026-10-17", "Something else", "t2")
            .await
            .unwrap();
        assert_eq!(first.text, "Win without dying twice");
        assert_eq!(second.text, first.text);
        assert_eq!(second.created_at, "t1");
    }
}
