//! Interaction audit log

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Intent, Interaction};

impl Database {
    /// Append one question and its answer to the log
    pub fn record_interaction(
        &self,
        user_id: i64,
        question: &str,
        intents: &[Intent],
        response: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO ai_interactions (user_id, question, intents, response) VALUES (?, ?, ?, ?)",
            params![user_id, question, serde_json::to_string(intents)?, response],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent interactions first
    pub fn list_interactions(&self, user_id: i64, limit: i64) -> Result<Vec<Interaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, question, intents, response, created_at
            FROM ai_interactions
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, user_id, question, intents, response, created_at)| {
                let names: Vec<String> = serde_json::from_str(&intents)?;
                Ok(Interaction {
                    id,
                    user_id,
                    question,
                    intents: names.iter().filter_map(|n| n.parse().ok()).collect(),
                    response,
                    created_at: parse_datetime(&created_at),
                })
            })
            .collect()
    }
}
