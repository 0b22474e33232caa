use crate::core::taste::{ElicitationSession, HistoryEntry, SessionState};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Error as SqlError, OptionalExtension, params, types::Type};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

/// Row-level view of a stored session, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub state: SessionState,
    pub answered: usize,
    pub created_at: String,
    pub updated_at: String,
}

pub trait SessionStore: Send + Sync {
    /// Writes the session row and replaces its stored history with
    /// `session.history`.
    fn save_session(&self, session: &ElicitationSession) -> Result<()>;
    /// Upserts the session row and appends every history entry the store
    /// does not have yet.
    fn record_step(&self, session: &ElicitationSession) -> Result<()>;
    fn load_session(&self, id: &str) -> Result<Option<ElicitationSession>>;
    fn list_sessions(&self) -> Result<Vec<SessionSummary>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
}

pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open session store {}", db_path.display()))?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE IF NOT EXISTS sessions (
                 id TEXT PRIMARY KEY,
                 state TEXT NOT NULL DEFAULT 'active',
                 beliefs TEXT NOT NULL,
                 asked TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             );

             CREATE TABLE IF NOT EXISTS answers (
                 session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                 seq INTEGER NOT NULL,
                 question_id TEXT NOT NULL,
                 raw_answer TEXT NOT NULL,
                 numeric_answer INTEGER NOT NULL,
                 beliefs_before TEXT NOT NULL,
                 beliefs_after TEXT NOT NULL,
                 answered_at TEXT NOT NULL,
                 PRIMARY KEY (session_id, seq)
             );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|error| anyhow::anyhow!("Lock error: {error}"))
    }

    fn state_to_str(state: SessionState) -> &'static str {
        match state {
            SessionState::Active => "active",
            SessionState::Complete => "complete",
        }
    }

    fn str_to_state(value: &str, column_index: usize) -> rusqlite::Result<SessionState> {
        match value {
            "active" => Ok(SessionState::Active),
            "complete" => Ok(SessionState::Complete),
            _ => Err(SqlError::FromSqlConversionFailure(
                column_index,
                Type::Text,
                format!("unknown session state: {value}").into(),
            )),
        }
    }

    fn json_column<T: serde::de::DeserializeOwned>(
        row: &rusqlite::Row<'_>,
        column_index: usize,
    ) -> rusqlite::Result<T> {
        let raw: String = row.get(column_index)?;
        serde_json::from_str(&raw).map_err(|error| {
            SqlError::FromSqlConversionFailure(column_index, Type::Text, Box::new(error))
        })
    }

    fn map_history_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryEntry> {
        let numeric: i64 = row.get(2)?;
        Ok(HistoryEntry {
            question_id: row.get(0)?,
            raw_answer: Self::json_column(row, 1)?,
            numeric_answer: i8::try_from(numeric).map_err(|error| {
                SqlError::FromSqlConversionFailure(2, Type::Integer, Box::new(error))
            })?,
            before: Self::json_column(row, 3)?,
            after: Self::json_column(row, 4)?,
            answered_at: row.get(5)?,
        })
    }

    fn upsert(conn: &Connection, session: &ElicitationSession, timestamp: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO sessions (id, state, beliefs, asked, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 state = excluded.state,
                 beliefs = excluded.beliefs,
                 asked = excluded.asked,
                 updated_at = excluded.updated_at",
            params![
                session.id,
                Self::state_to_str(session.state),
                serde_json::to_string(&session.beliefs)?,
                serde_json::to_string(&session.asked)?,
                timestamp
            ],
        )?;
        Ok(())
    }

    /// Inserts history entries by position; rows already stored are kept.
    fn insert_history(conn: &Connection, session: &ElicitationSession) -> Result<()> {
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO answers
                 (session_id, seq, question_id, raw_answer, numeric_answer, beliefs_before, beliefs_after, answered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (index, entry) in session.history.iter().enumerate() {
            let seq = i64::try_from(index + 1)?;
            stmt.execute(params![
                session.id,
                seq,
                entry.question_id,
                serde_json::to_string(&entry.raw_answer)?,
                i64::from(entry.numeric_answer),
                serde_json::to_string(&entry.before)?,
                serde_json::to_string(&entry.after)?,
                entry.answered_at
            ])?;
        }
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn save_session(&self, session: &ElicitationSession) -> Result<()> {
        let mut conn = self.lock_connection()?;
        let tx = conn.transaction()?;
        Self::upsert(&tx, session, &Utc::now().to_rfc3339())?;
        tx.execute(
            "DELETE FROM answers WHERE session_id = ?1",
            params![session.id],
        )?;
        Self::insert_history(&tx, session)?;
        tx.commit()?;
        Ok(())
    }

    fn record_step(&self, session: &ElicitationSession) -> Result<()> {
        let mut conn = self.lock_connection()?;
        let tx = conn.transaction()?;
        Self::upsert(&tx, session, &Utc::now().to_rfc3339())?;
        Self::insert_history(&tx, session)?;
        tx.commit()?;
        Ok(())
    }

    fn load_session(&self, id: &str) -> Result<Option<ElicitationSession>> {
        let conn = self.lock_connection()?;
        let row = conn
            .query_row(
                "SELECT state, beliefs, asked FROM sessions WHERE id = ?1",
                params![id],
                |row| {
                    let state_raw: String = row.get(0)?;
                    Ok((
                        Self::str_to_state(&state_raw, 0)?,
                        Self::json_column(row, 1)?,
                        Self::json_column::<Vec<String>>(row, 2)?,
                    ))
                },
            )
            .optional()?;

        let Some((state, beliefs, asked)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT question_id, raw_answer, numeric_answer, beliefs_before, beliefs_after, answered_at
             FROM answers
             WHERE session_id = ?1
             ORDER BY seq ASC",
        )?;
        let history = stmt
            .query_map(params![id], Self::map_history_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(ElicitationSession {
            id: id.to_string(),
            state,
            beliefs,
            asked,
            history,
        }))
    }

    fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let conn = self.lock_connection()?;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.state, COUNT(a.seq), s.created_at, s.updated_at
             FROM sessions s
             LEFT JOIN answers a ON a.session_id = s.id
             GROUP BY s.id
             ORDER BY s.updated_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let state_raw: String = row.get(1)?;
            let answered: i64 = row.get(2)?;
            Ok(SessionSummary {
                id: row.get(0)?,
                state: Self::str_to_state(&state_raw, 1)?,
                answered: usize::try_from(answered).unwrap_or(0),
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let conn = self.lock_connection()?;
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::taste::{Axis, AxisSpace, RawAnswer};
    use tempfile::NamedTempFile;

    fn store() -> (NamedTempFile, SqliteSessionStore) {
        let db_file = NamedTempFile::new().unwrap();
        let store = SqliteSessionStore::new(db_file.path()).unwrap();
        (db_file, store)
    }

    fn session() -> ElicitationSession {
        let space = AxisSpace::new(vec![Axis::Darkness, Axis::Humor]).unwrap();
        ElicitationSession::new(&space, 1.0)
    }

    fn answer(session: &mut ElicitationSession, qid: &str, raw: RawAnswer, value: i8) {
        let before = session.beliefs.clone();
        session.beliefs.get_mut(&Axis::Darkness).unwrap().mu += 0.1;
        session.asked.push(qid.to_string());
        session.history.push(HistoryEntry {
            question_id: qid.to_string(),
            raw_answer: raw,
            numeric_answer: value,
            before,
            after: session.beliefs.clone(),
            answered_at: Utc::now().to_rfc3339(),
        });
    }

    #[test]
    fn load_missing_session_returns_none() {
        let (_db_file, store) = store();
        assert!(store.load_session("nope").unwrap().is_none());
    }

    #[test]
    fn save_then_load_roundtrips_fresh_session() {
        let (_db_file, store) = store();
        let created = session();
        store.save_session(&created).unwrap();
        let loaded = store.load_session(&created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[test]
    fn record_step_appends_history_in_order() {
        let (_db_file, store) = store();
        let mut s = session();
        store.save_session(&s).unwrap();

        answer(&mut s, "q1", RawAnswer::from(2), 2);
        store.record_step(&s).unwrap();
        answer(&mut s, "q2", RawAnswer::from("скорее нет"), -1);
        s.state = SessionState::Complete;
        store.record_step(&s).unwrap();

        let loaded = store.load_session(&s.id).unwrap().unwrap();
        assert_eq!(loaded, s);
        assert_eq!(loaded.history[1].raw_answer, RawAnswer::from("скорее нет"));
    }

    #[test]
    fn record_step_backfills_entries_missed_earlier() {
        let (_db_file, store) = store();
        let mut s = session();
        answer(&mut s, "q1", RawAnswer::from(1), 1);
        answer(&mut s, "q2", RawAnswer::from(2), 2);
        // Only the row made it; both answer writes were lost.
        store
            .save_session(&ElicitationSession {
                history: Vec::new(),
                ..s.clone()
            })
            .unwrap();

        answer(&mut s, "q3", RawAnswer::from(-2), -2);
        store.record_step(&s).unwrap();

        let loaded = store.load_session(&s.id).unwrap().unwrap();
        assert_eq!(loaded.history.len(), 3);
        assert_eq!(loaded, s);
    }

    #[test]
    fn save_session_writes_and_replaces_history() {
        let (_db_file, store) = store();
        let mut s = session();
        answer(&mut s, "q1", RawAnswer::from(1), 1);
        answer(&mut s, "q2", RawAnswer::from(2), 2);
        store.save_session(&s).unwrap();
        assert_eq!(store.load_session(&s.id).unwrap().unwrap(), s);

        s.history.truncate(1);
        s.asked.truncate(1);
        store.save_session(&s).unwrap();
        let loaded = store.load_session(&s.id).unwrap().unwrap();
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(loaded, s);
    }

    #[test]
    fn list_sessions_counts_answers() {
        let (_db_file, store) = store();
        let mut s = session();
        answer(&mut s, "q1", RawAnswer::from(1), 1);
        store.record_step(&s).unwrap();
        store.save_session(&session()).unwrap();

        let listed = store.list_sessions().unwrap();
        assert_eq!(listed.len(), 2);
        let answered = listed.iter().find(|row| row.id == s.id).unwrap();
        assert_eq!(answered.answered, 1);
        assert_eq!(answered.state, SessionState::Active);
    }

    #[test]
    fn delete_session_returns_true_then_false_and_cascades() {
        let (_db_file, store) = store();
        let mut s = session();
        answer(&mut s, "q1", RawAnswer::from(0), 0);
        store.record_step(&s).unwrap();

        assert!(store.delete_session(&s.id).unwrap());
        assert!(!store.delete_session(&s.id).unwrap());
        assert!(store.load_session(&s.id).unwrap().is_none());

        let conn = store.lock_connection().unwrap();
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM answers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
