use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{Message, NewMessage};
use crate::error::AppError;

/// Timestamp format with microsecond precision; lexicographic order matches
/// chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub struct MessageRepository;

impl MessageRepository {
    /// Append one message record. `id` and `timestamp` are assigned here, at
    /// write time; each call creates a new record, duplicate submissions
    /// produce duplicate records.
    pub async fn append(pool: &Pool<Sqlite>, new: NewMessage) -> Result<Message, AppError> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            sender: new.sender,
            text: new.text,
            image_url: new.image_url,
            timestamp: chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            user_id: new.user_id,
        };

        sqlx::query(
            r#"
INSERT INTO messages (id, user_id, sender, text, image_url, timestamp)
VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.user_id)
        .bind(&message.sender)
        .bind(&message.text)
        .bind(&message.image_url)
        .bind(&message.timestamp)
        .execute(pool)
        .await?;

        Ok(message)
    }

    /// The most recent `limit` records for `owner`, oldest first.
    ///
    /// The table has no owner index: this scans everything, filters by owner
    /// in the application layer, sorts newest-first, truncates, then reverses.
    /// Changing this to an indexed query would alter tie-breaking across
    /// concurrent writers, so the scan shape stays.
    pub async fn list_by_owner(
        pool: &Pool<Sqlite>,
        owner: &str,
        limit: usize,
    ) -> Result<Vec<Message>, AppError> {
        let all = sqlx::query_as::<_, Message>(
            "SELECT id, sender, text, image_url, timestamp, user_id FROM messages",
        )
        .fetch_all(pool)
        .await?;

        let mut mine: Vec<Message> = all
            .into_iter()
            .filter(|m| m.user_id == owner)
            .collect();
        mine.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        mine.truncate(limit);
        mine.reverse();

        Ok(mine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MIGRATOR;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> Pool<Sqlite> {
        // A single connection keeps every query on the same in-memory db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    fn text_msg(sender: &str, text: &str, user: &str) -> NewMessage {
        NewMessage::new(sender.into(), text.into(), String::new(), user.into()).unwrap()
    }

    #[tokio::test]
    async fn append_then_list_round_trips() {
        let pool = test_pool().await;

        MessageRepository::append(&pool, text_msg("iPhone", "hello", "u1"))
            .await
            .unwrap();

        let messages = MessageRepository::list_by_owner(&pool, "u1", 100)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "iPhone");
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[0].image_url, "");
        assert_eq!(messages[0].user_id, "u1");
        assert!(!messages[0].id.is_empty());
    }

    #[tokio::test]
    async fn list_is_chronological_and_filtered_by_owner() {
        let pool = test_pool().await;

        for text in ["m1", "m2", "m3"] {
            MessageRepository::append(&pool, text_msg("PC", text, "u1"))
                .await
                .unwrap();
        }
        MessageRepository::append(&pool, text_msg("Android", "other", "u2"))
            .await
            .unwrap();

        let messages = MessageRepository::list_by_owner(&pool, "u1", 100)
            .await
            .unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m1", "m2", "m3"]);
        assert!(messages.iter().all(|m| m.user_id == "u1"));

        let others = MessageRepository::list_by_owner(&pool, "u2", 100)
            .await
            .unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].text, "other");
    }

    #[tokio::test]
    async fn list_truncates_to_most_recent_limit() {
        let pool = test_pool().await;

        for i in 0..7 {
            MessageRepository::append(&pool, text_msg("PC", &format!("m{}", i), "u1"))
                .await
                .unwrap();
        }

        let messages = MessageRepository::list_by_owner(&pool, "u1", 5)
            .await
            .unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        // Most recent five, oldest first.
        assert_eq!(texts, vec!["m2", "m3", "m4", "m5", "m6"]);
    }

    #[tokio::test]
    async fn unknown_owner_gets_empty_list() {
        let pool = test_pool().await;
        MessageRepository::append(&pool, text_msg("PC", "hi", "u1"))
            .await
            .unwrap();

        let messages = MessageRepository::list_by_owner(&pool, "nobody", 100)
            .await
            .unwrap();
        assert!(messages.is_empty());
    }
}
