//! In-process session store.
//!
//! Backs the harness and the test suite. Roster entries are kept as JSON
//! documents under store-assigned ids, exactly as a remote document store
//! would hold them, so the controller's defensive parsing is exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tokio::sync::{watch, Mutex};

use survivor_logic::organism::Organism;
use survivor_logic::roster::to_document;
use survivor_logic::session::{generate_session_code, GameSettings, GameState, Player};

use crate::repository::{RepositoryError, SessionRepository, SessionRecord};

struct StoredSession {
    host_name: String,
    settings: GameSettings,
    players: Vec<Player>,
    /// (id, document) in submission order.
    documents: Vec<(String, Value)>,
    roster_tx: watch::Sender<Vec<Value>>,
    phase_tx: watch::Sender<GameState>,
}

impl StoredSession {
    fn publish_roster(&self) {
        let docs = self.documents.iter().map(|(_, d)| d.clone()).collect();
        self.roster_tx.send_replace(docs);
    }
}

/// Sessions held in memory behind a single async mutex.
pub struct InMemoryRepository {
    sessions: Mutex<HashMap<String, StoredSession>>,
    rng: Mutex<StdRng>,
    next_organism_id: AtomicU64,
    failing_reads: AtomicU32,
    failing_writes: AtomicU32,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic session codes, for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            rng: Mutex::new(rng),
            next_organism_id: AtomicU64::new(1),
            failing_reads: AtomicU32::new(0),
            failing_writes: AtomicU32::new(0),
        }
    }

    /// Make the next `n` session, roster or phase reads fail with a transient error.
    pub fn fail_next_reads(&self, n: u32) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` writes fail with a transient error.
    pub fn fail_next_writes(&self, n: u32) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Store a document without organism serialization. Lets tests plant
    /// the partial entries real clients sometimes leave. Object documents
    /// get the store id written under `"id"`, replacing any id they carried.
    pub async fn insert_raw_document(
        &self,
        code: &str,
        mut doc: Value,
    ) -> Result<String, RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        let session = lookup(&mut sessions, code)?;
        let id = self.next_id();
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("id".to_string(), Value::String(id.clone()));
        }
        session.documents.push((id.clone(), doc));
        session.publish_roster();
        Ok(id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn next_id(&self) -> String {
        format!("org-{}", self.next_organism_id.fetch_add(1, Ordering::SeqCst))
    }

    fn injected_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_read(&self, op: &str) -> Result<(), RepositoryError> {
        if Self::injected_failure(&self.failing_reads) {
            return Err(RepositoryError::Read(format!("{op}: injected failure")));
        }
        Ok(())
    }

    fn check_write(&self, op: &str) -> Result<(), RepositoryError> {
        if Self::injected_failure(&self.failing_writes) {
            return Err(RepositoryError::Write(format!("{op}: injected failure")));
        }
        Ok(())
    }
}

fn lookup<'a>(
    sessions: &'a mut HashMap<String, StoredSession>,
    code: &str,
) -> Result<&'a mut StoredSession, RepositoryError> {
    sessions
        .get_mut(code)
        .ok_or_else(|| RepositoryError::SessionNotFound(code.to_string()))
}

impl SessionRepository for InMemoryRepository {
    async fn create_session(
        &self,
        host_name: &str,
        settings: GameSettings,
    ) -> Result<String, RepositoryError> {
        self.check_write("create_session")?;
        let mut sessions = self.sessions.lock().await;
        let code = {
            let mut rng = self.rng.lock().await;
            loop {
                let code = generate_session_code(&mut *rng);
                if !sessions.contains_key(&code) {
                    break code;
                }
            }
        };

        let (roster_tx, _) = watch::channel(Vec::new());
        let (phase_tx, _) = watch::channel(GameState::Waiting);
        sessions.insert(
            code.clone(),
            StoredSession {
                host_name: host_name.to_string(),
                settings,
                players: Vec::new(),
                documents: Vec::new(),
                roster_tx,
                phase_tx,
            },
        );

        info!("Session {} created by {}", code, host_name);
        Ok(code)
    }

    async fn get_session(&self, code: &str) -> Result<SessionRecord, RepositoryError> {
        self.check_read("get_session")?;
        let mut sessions = self.sessions.lock().await;
        let session = lookup(&mut sessions, code)?;
        let state = *session.phase_tx.borrow();
        Ok(SessionRecord {
            code: code.to_string(),
            host_name: session.host_name.clone(),
            settings: session.settings,
            state,
            players: session.players.clone(),
        })
    }

    async fn join_session(&self, code: &str, player_name: &str) -> Result<(), RepositoryError> {
        self.check_write("join_session")?;
        let mut sessions = self.sessions.lock().await;
        let session = lookup(&mut sessions, code)?;
        if !session.players.iter().any(|p| p.name == player_name) {
            session.players.push(Player::new(player_name));
        }
        Ok(())
    }

    async fn get_roster(&self, code: &str) -> Result<Vec<Value>, RepositoryError> {
        self.check_read("get_roster")?;
        let mut sessions = self.sessions.lock().await;
        let session = lookup(&mut sessions, code)?;
        Ok(session.documents.iter().map(|(_, d)| d.clone()).collect())
    }

    async fn subscribe_roster(
        &self,
        code: &str,
    ) -> Result<watch::Receiver<Vec<Value>>, RepositoryError> {
        self.check_read("subscribe_roster")?;
        let mut sessions = self.sessions.lock().await;
        Ok(lookup(&mut sessions, code)?.roster_tx.subscribe())
    }

    async fn write_roster(&self, code: &str, organisms: &[Organism]) -> Result<(), RepositoryError> {
        self.check_write("write_roster")?;
        let mut sessions = self.sessions.lock().await;
        let session = lookup(&mut sessions, code)?;

        let mut updates = Vec::with_capacity(organisms.len());
        for org in organisms {
            let id = org
                .id
                .as_deref()
                .ok_or_else(|| RepositoryError::MissingDocumentId(org.name.clone()))?;
            let slot = session
                .documents
                .iter()
                .position(|(i, _)| i == id)
                .ok_or_else(|| RepositoryError::DocumentNotFound {
                    code: code.to_string(),
                    id: id.to_string(),
                })?;
            updates.push((slot, to_document(org)));
        }

        for (slot, doc) in updates {
            session.documents[slot].1 = doc;
        }
        session.publish_roster();
        Ok(())
    }

    async fn get_phase(&self, code: &str) -> Result<GameState, RepositoryError> {
        self.check_read("get_phase")?;
        let mut sessions = self.sessions.lock().await;
        let state = *lookup(&mut sessions, code)?.phase_tx.borrow();
        Ok(state)
    }

    async fn subscribe_phase(
        &self,
        code: &str,
    ) -> Result<watch::Receiver<GameState>, RepositoryError> {
        self.check_read("subscribe_phase")?;
        let mut sessions = self.sessions.lock().await;
        Ok(lookup(&mut sessions, code)?.phase_tx.subscribe())
    }

    async fn write_phase(&self, code: &str, state: GameState) -> Result<(), RepositoryError> {
        self.check_write("write_phase")?;
        let mut sessions = self.sessions.lock().await;
        lookup(&mut sessions, code)?.phase_tx.send_replace(state);
        Ok(())
    }

    async fn add_organism(&self, code: &str, organism: &Organism) -> Result<String, RepositoryError> {
        self.check_write("add_organism")?;
        let mut sessions = self.sessions.lock().await;
        let session = lookup(&mut sessions, code)?;

        let id = self.next_id();
        let mut stored = organism.clone();
        stored.id = Some(id.clone());
        session.documents.push((id.clone(), to_document(&stored)));

        if let Some(player) = organism.player_name.as_deref() {
            if let Some(p) = session.players.iter_mut().find(|p| p.name == player) {
                p.submitted = true;
            }
        }

        session.publish_roster();
        Ok(id)
    }

    async fn delete_session(&self, code: &str) -> Result<(), RepositoryError> {
        self.check_write("delete_session")?;
        let mut sessions = self.sessions.lock().await;
        if sessions.remove(code).is_none() {
            return Err(RepositoryError::SessionNotFound(code.to_string()));
        }
        info!("Session {} deleted", code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survivor_logic::catalog::{Environment, Kingdom};
    use survivor_logic::session::is_valid_session_code;

    fn organism(player: &str) -> Organism {
        let mut org = Organism::new(format!("{player}'s Moss"), Kingdom::Plant, Environment::Tundra);
        org.player_name = Some(player.to_string());
        org
    }

    #[tokio::test]
    async fn codes_are_valid_and_unique() {
        let repo = InMemoryRepository::seeded(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let code = repo
                .create_session("Host", GameSettings::default())
                .await
                .unwrap();
            assert!(is_valid_session_code(&code));
            assert!(seen.insert(code));
        }
        assert_eq!(repo.session_count().await, 50);
    }

    #[tokio::test]
    async fn concurrent_submissions_get_distinct_ids() {
        let repo = InMemoryRepository::new();
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();
        let (a, b, c) = (organism("Ana"), organism("Ben"), organism("Cy"));
        let (ia, ib, ic) = tokio::join!(
            repo.add_organism(&code, &a),
            repo.add_organism(&code, &b),
            repo.add_organism(&code, &c),
        );
        let ids = [ia.unwrap(), ib.unwrap(), ic.unwrap()];
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
        assert_eq!(repo.get_roster(&code).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn roster_subscription_sees_writes() {
        let repo = InMemoryRepository::new();
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();
        let mut rx = repo.subscribe_roster(&code).await.unwrap();
        assert!(rx.borrow().is_empty());

        repo.add_organism(&code, &organism("Ana")).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[tokio::test]
    async fn write_roster_matches_by_id_and_keeps_unknown_docs() {
        let repo = InMemoryRepository::new();
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();
        let id = repo.add_organism(&code, &organism("Ana")).await.unwrap();
        repo.insert_raw_document(&code, serde_json::json!({ "name": "broken" }))
            .await
            .unwrap();

        let mut updated = organism("Ana");
        updated.id = Some(id);
        updated.status = survivor_logic::organism::OrganismStatus::Extinct;
        repo.write_roster(&code, &[updated]).await.unwrap();

        let docs = repo.get_roster(&code).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["status"], "extinct");
        assert_eq!(docs[1]["name"], "broken");
    }

    #[tokio::test]
    async fn raw_documents_carry_their_store_id() {
        let repo = InMemoryRepository::new();
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();
        let doc = serde_json::json!({
            "id": "client-side",
            "name": "Cactus",
            "kingdom": "Plant",
            "environment": "Desert"
        });
        let id = repo.insert_raw_document(&code, doc).await.unwrap();
        repo.insert_raw_document(&code, serde_json::json!("not an object"))
            .await
            .unwrap();

        let docs = repo.get_roster(&code).await.unwrap();
        assert_eq!(docs[0]["id"], id.as_str());
        assert_eq!(docs[1], "not an object");
    }

    #[tokio::test]
    async fn write_roster_rejects_unidentified_organisms() {
        let repo = InMemoryRepository::new();
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();
        let id = repo.add_organism(&code, &organism("Ana")).await.unwrap();

        let mut known = organism("Ana");
        known.id = Some(id);
        known.status = survivor_logic::organism::OrganismStatus::Extinct;
        let anonymous = organism("Ben");
        assert_eq!(
            repo.write_roster(&code, &[known.clone(), anonymous]).await,
            Err(RepositoryError::MissingDocumentId("Ben's Moss".into()))
        );

        let mut stranger = organism("Cy");
        stranger.id = Some("org-999".into());
        assert_eq!(
            repo.write_roster(&code, &[known, stranger]).await,
            Err(RepositoryError::DocumentNotFound {
                code: code.clone(),
                id: "org-999".into(),
            })
        );

        // neither failed write touched the valid entry
        let docs = repo.get_roster(&code).await.unwrap();
        assert_eq!(docs[0]["status"], "alive");
    }

    #[tokio::test]
    async fn faults_reach_session_lifecycle_calls() {
        let repo = InMemoryRepository::new();
        repo.fail_next_writes(1);
        assert!(matches!(
            repo.create_session("Host", GameSettings::default()).await,
            Err(RepositoryError::Write(_))
        ));
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();

        repo.fail_next_reads(2);
        assert!(repo.subscribe_roster(&code).await.is_err());
        assert!(repo.subscribe_phase(&code).await.is_err());
        assert!(repo.subscribe_phase(&code).await.is_ok());

        repo.fail_next_writes(1);
        assert!(repo.delete_session(&code).await.is_err());
        assert_eq!(repo.session_count().await, 1);
        repo.delete_session(&code).await.unwrap();
        assert_eq!(repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn injected_failures_are_transient_and_counted() {
        let repo = InMemoryRepository::new();
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();
        repo.fail_next_writes(2);
        assert!(matches!(
            repo.write_phase(&code, GameState::City).await,
            Err(RepositoryError::Write(_))
        ));
        assert!(repo.write_phase(&code, GameState::City).await.is_err());
        repo.write_phase(&code, GameState::City).await.unwrap();
        assert_eq!(repo.get_phase(&code).await.unwrap(), GameState::City);
    }

    #[tokio::test]
    async fn joining_twice_is_idempotent() {
        let repo = InMemoryRepository::new();
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();
        repo.join_session(&code, "Ana").await.unwrap();
        repo.join_session(&code, "Ana").await.unwrap();
        assert_eq!(repo.get_session(&code).await.unwrap().players.len(), 1);
    }

    #[tokio::test]
    async fn deleted_session_is_gone() {
        let repo = InMemoryRepository::new();
        let code = repo.create_session("Host", GameSettings::default()).await.unwrap();
        let phase_rx = repo.subscribe_phase(&code).await.unwrap();
        repo.delete_session(&code).await.unwrap();
        assert_eq!(
            repo.get_phase(&code).await,
            Err(RepositoryError::SessionNotFound(code.clone()))
        );
        assert!(phase_rx.has_changed().is_err());
        assert!(repo.delete_session(&code).await.is_err());
    }
}
