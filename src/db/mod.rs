use sqlx::{migrate::MigrateDatabase, sqlite::{SqlitePool, SqlitePoolOptions}, Sqlite, Row};
use chrono::{DateTime, Utc};
use crate::models::{Player, TrackType, War};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // In-memory databases are private to one connection
        let in_memory = db_url.contains(":memory:");

        if !in_memory && !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect(db_url)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wars (
                id TEXT PRIMARY KEY,
                war_type TEXT NOT NULL,
                team_name TEXT NOT NULL,
                gathered BOOLEAN NOT NULL DEFAULT FALSE,
                search_in_advance BOOLEAN NOT NULL DEFAULT FALSE,
                start_time TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                ally_count INTEGER NOT NULL DEFAULT 0,
                lineup TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    // Add a war to its track's billboard
    pub async fn save_war(
        &self,
        war: &War,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let lineup = serde_json::to_string(&war.lineup)?;

        sqlx::query(
            r#"
            INSERT INTO wars (id, war_type, team_name, gathered, search_in_advance, start_time, last_updated, ally_count, lineup)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&war.id)
        .bind(war.war_type.as_str())
        .bind(&war.team_name)
        .bind(war.gathered)
        .bind(war.search_in_advance)
        .bind(war.start_time.to_rfc3339())
        .bind(war.last_updated.to_rfc3339())
        .bind(war.ally_count)
        .bind(lineup)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[cfg(test)]
    pub async fn get_war(
        &self,
        war_id: &str,
    ) -> Result<Option<War>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query(
            r#"
            SELECT id, war_type, team_name, gathered, search_in_advance, start_time, last_updated, ally_count, lineup
            FROM wars
            WHERE id = ?
            "#,
        )
        .bind(war_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(war_from_row(&row)?)),
            None => Ok(None),
        }
    }

    // Wars for one track, newest first
    pub async fn get_wars_by_track(
        &self,
        war_type: TrackType,
    ) -> Result<Vec<War>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query(
            r#"
            SELECT id, war_type, team_name, gathered, search_in_advance, start_time, last_updated, ally_count, lineup
            FROM wars
            WHERE war_type = ?
            ORDER BY start_time DESC, rowid DESC
            "#,
        )
        .bind(war_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(war_from_row).collect()
    }
}

fn war_from_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<War, Box<dyn std::error::Error + Send + Sync>> {
    let war_type = match row.get::<String, _>("war_type").as_str() {
        "RT" => TrackType::Rt,
        "CT" => TrackType::Ct,
        other => return Err(format!("Unknown war type: {}", other).into()),
    };

    let start_time = parse_timestamp(&row.get::<String, _>("start_time"), "start_time")?;
    let last_updated = parse_timestamp(&row.get::<String, _>("last_updated"), "last_updated")?;
    let lineup: Vec<Player> = serde_json::from_str(&row.get::<String, _>("lineup"))?;

    Ok(War {
        id: row.get::<String, _>("id"),
        war_type,
        team_name: row.get::<String, _>("team_name"),
        gathered: row.get::<bool, _>("gathered"),
        search_in_advance: row.get::<bool, _>("search_in_advance"),
        start_time,
        last_updated,
        ally_count: row.get::<i64, _>("ally_count"),
        lineup,
    })
}

fn parse_timestamp(
    value: &str,
    column: &str,
) -> Result<DateTime<Utc>, Box<dyn std::error::Error + Send + Sync>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| format!("Failed to parse {}: {}", column, e))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn database() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_save_and_get_war() {
        let db = database().await;
        let war = War::new(TrackType::Rt, "Team A".to_string(), Player::runner("p1".to_string()));
        db.save_war(&war).await.unwrap();

        let stored = db.get_war(&war.id).await.unwrap().unwrap();
        assert_eq!(stored.team_name, "Team A");
        assert_eq!(stored.war_type, TrackType::Rt);
        assert_eq!(stored.lineup, war.lineup);
        assert_eq!(stored.start_time.timestamp(), war.start_time.timestamp());

        assert!(db.get_war("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wars_listed_per_track() {
        let db = database().await;
        let first = War::new(TrackType::Rt, "One".to_string(), Player::runner("a".to_string()));
        let second = War::new(TrackType::Rt, "Two".to_string(), Player::runner("b".to_string()));
        let custom = War::new(TrackType::Ct, "Three".to_string(), Player::runner("c".to_string()));
        for war in [&first, &second, &custom] {
            db.save_war(war).await.unwrap();
        }

        let rt: Vec<String> = db
            .get_wars_by_track(TrackType::Rt)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.team_name)
            .collect();
        assert_eq!(rt, vec!["Two", "One"]);

        let ct = db.get_wars_by_track(TrackType::Ct).await.unwrap();
        assert_eq!(ct.len(), 1);
        assert_eq!(ct[0].team_name, "Three");
    }

    #[tokio::test]
    async fn test_duplicate_war_id_rejected() {
        let db = database().await;
        let war = War::new(TrackType::Ct, "Dup".to_string(), Player::runner("a".to_string()));
        db.save_war(&war).await.unwrap();
        assert!(db.save_war(&war).await.is_err());
    }
}
