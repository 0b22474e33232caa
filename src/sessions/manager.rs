use super::store::{SessionStore, SessionSummary};
use crate::core::taste::{BeliefState, ElicitationEngine, ElicitationSession, RawAnswer, StepResponse};
use crate::error::{Result, SessionError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

type SessionSlot = Arc<Mutex<ElicitationSession>>;

/// Registry of live elicitation sessions.
///
/// Each session sits behind its own mutex so concurrent steps on one session
/// serialize while different sessions proceed independently. With a store
/// attached, every successful step is persisted and ids missing from memory
/// are resumed from disk.
pub struct SessionManager {
    engine: Arc<ElicitationEngine>,
    sessions: RwLock<HashMap<String, SessionSlot>>,
    store: Option<Arc<dyn SessionStore>>,
}

impl SessionManager {
    pub fn new(engine: Arc<ElicitationEngine>) -> Self {
        Self {
            engine,
            sessions: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    pub fn with_store(engine: Arc<ElicitationEngine>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::new(engine)
        }
    }

    pub fn engine(&self) -> &ElicitationEngine {
        &self.engine
    }

    /// Creates a neutral session and returns its first question.
    pub fn start(&self) -> Result<StepResponse> {
        let session = self.engine.new_session();
        let response = self.engine.start(&session);
        self.persist(|store| store.save_session(&session));
        tracing::info!(session_id = %session.id, "elicitation session started");
        self.insert(session)?;
        Ok(response)
    }

    pub fn step(
        &self,
        session_id: &str,
        question_id: &str,
        answer: &RawAnswer,
    ) -> Result<StepResponse> {
        let slot = self.slot(session_id)?;
        let mut session = slot
            .lock()
            .map_err(|_| SessionError::LockPoisoned(session_id.to_string()))?;
        let response = self.engine.step(&mut session, question_id, answer)?;
        self.persist(|store| store.record_step(&session));
        Ok(response)
    }

    /// Registers an externally supplied session after repairing it against
    /// the engine's axis space. Replaces any live session with the same id,
    /// and the stored copy along with its whole history.
    pub fn restore(&self, mut session: ElicitationSession) -> Result<StepResponse> {
        let cfg = self.engine.config();
        let repaired = session.repair(self.engine.schema().space(), cfg.sigma_min, cfg.sigma_max);
        if repaired > 0 {
            tracing::warn!(session_id = %session.id, repaired, "repaired restored session");
        }
        let response = self.engine.start(&session);
        self.persist(|store| store.save_session(&session));
        self.insert(session)?;
        Ok(response)
    }

    /// Current question for a known session, resuming it from the store if
    /// it is not live.
    pub fn resume(&self, session_id: &str) -> Result<StepResponse> {
        let slot = self.slot(session_id)?;
        let session = slot
            .lock()
            .map_err(|_| SessionError::LockPoisoned(session_id.to_string()))?;
        Ok(self.engine.start(&session))
    }

    pub fn beliefs(&self, session_id: &str) -> Result<BeliefState> {
        Ok(self.snapshot(session_id)?.beliefs)
    }

    /// Deep copy of the session; resuming from it continues identically.
    pub fn snapshot(&self, session_id: &str) -> Result<ElicitationSession> {
        let slot = self.slot(session_id)?;
        let session = slot
            .lock()
            .map_err(|_| SessionError::LockPoisoned(session_id.to_string()))?;
        Ok(session.clone())
    }

    /// Drops the session from memory. Stored copies stay resumable.
    pub fn end(&self, session_id: &str) -> Result<ElicitationSession> {
        let slot = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned("registry".into()))?
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        let session = slot
            .lock()
            .map_err(|_| SessionError::LockPoisoned(session_id.to_string()))?
            .clone();
        Ok(session)
    }

    /// Ids of live sessions, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .sessions
            .read()
            .map_err(|_| SessionError::LockPoisoned("registry".into()))?
            .keys()
            .cloned()
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub fn stored(&self) -> Result<Vec<SessionSummary>> {
        match &self.store {
            Some(store) => store
                .list_sessions()
                .map_err(|error| SessionError::Store(format!("{error:#}")).into()),
            None => Ok(Vec::new()),
        }
    }

    /// Removes the session from memory and from the store.
    pub fn delete(&self, session_id: &str) -> Result<bool> {
        let live = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned("registry".into()))?
            .remove(session_id)
            .is_some();
        let stored = match &self.store {
            Some(store) => store
                .delete_session(session_id)
                .map_err(|error| SessionError::Store(format!("{error:#}")))?,
            None => false,
        };
        Ok(live || stored)
    }

    fn insert(&self, session: ElicitationSession) -> Result<()> {
        self.sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned("registry".into()))?
            .insert(session.id.clone(), Arc::new(Mutex::new(session)));
        Ok(())
    }

    fn slot(&self, session_id: &str) -> Result<SessionSlot> {
        if let Some(slot) = self
            .sessions
            .read()
            .map_err(|_| SessionError::LockPoisoned("registry".into()))?
            .get(session_id)
        {
            return Ok(Arc::clone(slot));
        }

        let Some(store) = &self.store else {
            return Err(SessionError::NotFound(session_id.to_string()).into());
        };
        let mut session = store
            .load_session(session_id)
            .map_err(|error| SessionError::Store(format!("{error:#}")))?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        let cfg = self.engine.config();
        session.repair(self.engine.schema().space(), cfg.sigma_min, cfg.sigma_max);
        tracing::info!(session_id, answered = session.history.len(), "resumed stored session");

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned("registry".into()))?;
        // Another caller may have resumed it between the two locks.
        let slot = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(session)));
        Ok(Arc::clone(slot))
    }

    /// Store failures never fail the in-memory operation.
    fn persist(&self, op: impl FnOnce(&dyn SessionStore) -> anyhow::Result<()>) {
        if let Some(store) = &self.store
            && let Err(error) = op(store.as_ref())
        {
            tracing::warn!("failed to persist session: {error:#}");
        }
    }
}
