//! CRUD operations for [`ChatMessage`] records.

use rusqlite::params;
use sheep_shared::{ChatMessage, UserId};
use uuid::Uuid;

use crate::database::{conversion_err, parse_ts, Database};
use crate::error::Result;

impl Database {
    /// Insert a new chat message. Messages are never edited afterwards.
    pub fn insert_chat_message(&self, msg: &ChatMessage) -> Result<()> {
        self.conn().execute(
            "INSERT INTO chat_messages (id, user_id, nickname, message, tier, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                msg.id.to_string(),
                msg.user_id.to_string(),
                msg.nickname,
                msg.message,
                msg.tier,
                msg.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// The `limit` most recent messages, newest first.
    pub fn recent_chat_messages(&self, limit: usize) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, nickname, message, tier, created_at
             FROM chat_messages
             ORDER BY created_at DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let id_str: String = row.get(0)?;
    let user_str: String = row.get(1)?;
    let created_str: String = row.get(5)?;

    Ok(ChatMessage {
        id: Uuid::parse_str(&id_str).map_err(|e| conversion_err(0, e))?,
        user_id: UserId(Uuid::parse_str(&user_str).map_err(|e| conversion_err(1, e))?),
        nickname: row.get(2)?,
        message: row.get(3)?,
        tier: row.get(4)?,
        created_at: parse_ts(5, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn message(text: &str, offset_secs: i64) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            user_id: UserId::new(),
            nickname: "Sheep1".into(),
            message: text.into(),
            tier: 2,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn newest_first_with_limit() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..5 {
            db.insert_chat_message(&message(&format!("baa {i}"), i)).unwrap();
        }

        let recent = db.recent_chat_messages(3).unwrap();
        let texts: Vec<_> = recent.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["baa 4", "baa 3", "baa 2"]);
        assert_eq!(recent[0].tier, 2);
    }

    #[test]
    fn overlong_message_is_rejected_by_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_chat_message(&message(&"b".repeat(201), 0)).is_err());
        assert!(db.insert_chat_message(&message(&"🐑".repeat(200), 0)).is_ok());
    }
}
