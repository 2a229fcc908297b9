//! Conversations: transcript storage and turn handling.
//!
//! Turns of the same conversation are serialized by a per-conversation lock
//! held from parsing to transcript append, so concurrent messages are recorded
//! in the order they were answered. Different conversations never contend
//! beyond the short registry lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use nutribot_core::error::{Error, Result};
use nutribot_core::traits::{FoodRepository, FoodSearch, TranscriptStore};
use nutribot_core::types::{Transcript, Turn};
use tracing::{error, info};

use crate::pipeline::{sanitize_reply, Bot};

/// Reply sent when a turn fails for reasons outside the user's control.
pub const FAILURE_REPLY: &str = "Scusa, si è verificato un problema e non riesco a rispondere in questo momento. Riprova tra poco.";

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::Operation("transcript lock poisoned".to_string())
}

/// Transcripts kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTranscriptStore {
    conversations: RwLock<HashMap<String, Arc<Mutex<Transcript>>>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self { Self::default() }

    fn entry(&self, conversation_id: &str) -> Result<Arc<Mutex<Transcript>>> {
        if let Some(t) = self.conversations.read().map_err(poisoned)?.get(conversation_id) {
            return Ok(Arc::clone(t));
        }
        let mut conversations = self.conversations.write().map_err(poisoned)?;
        Ok(Arc::clone(conversations.entry(conversation_id.to_string()).or_default()))
    }

    pub fn conversation_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.conversations.read().map_err(poisoned)?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

impl TranscriptStore for InMemoryTranscriptStore {
    fn append(&self, conversation_id: &str, message: &str, reply: &str) -> Result<()> {
        let transcript = self.entry(conversation_id)?;
        let mut transcript = transcript.lock().map_err(poisoned)?;
        transcript.turns.push(Turn { message: message.to_string(), reply: reply.to_string() });
        Ok(())
    }

    fn get(&self, conversation_id: &str) -> Result<Transcript> {
        let Some(transcript) = self.conversations.read().map_err(poisoned)?.get(conversation_id).cloned() else {
            return Ok(Transcript::default());
        };
        let transcript = transcript.lock().map_err(poisoned)?;
        Ok(transcript.clone())
    }
}

/// Runs turns against a bot and records them in a transcript store.
pub struct Sessions<S, R>
where
    S: FoodSearch,
    R: FoodRepository,
{
    bot: Bot<S, R>,
    store: Arc<dyn TranscriptStore>,
    turn_locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl<S, R> Sessions<S, R>
where
    S: FoodSearch,
    R: FoodRepository,
{
    pub fn new(bot: Bot<S, R>, store: Arc<dyn TranscriptStore>) -> Self {
        Self { bot, store, turn_locks: Mutex::new(HashMap::new()) }
    }

    pub fn bot(&self) -> &Bot<S, R> { &self.bot }

    /// Lock shared by the turns currently running for `conversation_id`.
    /// Entries die with their last turn and are pruned on the next insert.
    fn turn_lock(&self, conversation_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.turn_locks.lock().map_err(poisoned)?;
        if let Some(lock) = locks.get(conversation_id).and_then(Weak::upgrade) {
            return Ok(lock);
        }
        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(conversation_id.to_string(), Arc::downgrade(&lock));
        Ok(lock)
    }

    /// Answers `message`, appends the exchange and returns the whole transcript.
    ///
    /// A failed turn still gets recorded, with the generic failure reply. Only
    /// transcript store errors are returned.
    pub fn converse(&self, conversation_id: &str, message: &str) -> Result<Transcript> {
        let lock = self.turn_lock(conversation_id)?;
        // The unit mutex guards no data, a panic in another turn leaves nothing inconsistent.
        let _turn = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let reply = match self.bot.answer(message) {
            Ok(reply) => sanitize_reply(&reply),
            Err(e) => {
                error!(conversation_id, error = %e, "turn failed");
                FAILURE_REPLY.to_string()
            }
        };
        self.store.append(conversation_id, message, &reply)?;
        info!(conversation_id, "turn recorded");
        self.store.get(conversation_id)
    }

    pub fn transcript(&self, conversation_id: &str) -> Result<Transcript> {
        self.store.get(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutribot_core::catalog::FoodCatalog;
    use nutribot_core::types::{QueryOptions, SearchHit, Variant};

    struct NoHits;

    impl FoodSearch for NoHits {
        fn query(&self, _text: &str, _variant: Variant, _options: QueryOptions) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn finished_conversations_release_their_turn_lock() {
        let sessions = Sessions::new(Bot::new(NoHits, FoodCatalog::default()), Arc::new(InMemoryTranscriptStore::new()));
        for i in 0..100 {
            let transcript = sessions.converse(&format!("conv-{i}"), "pane").expect("converse");
            assert_eq!(transcript.len(), 1);
        }
        assert!(sessions.turn_locks.lock().expect("locks").len() <= 1);

        sessions.converse("conv-7", "riso").expect("converse");
        assert_eq!(sessions.transcript("conv-7").expect("transcript").len(), 2);
    }

    #[test]
    fn unknown_conversation_is_empty() {
        let store = InMemoryTranscriptStore::new();
        assert!(store.get("nope").expect("get").is_empty());
        assert!(store.conversation_ids().expect("ids").is_empty());
    }

    #[test]
    fn appends_are_ordered_per_conversation() {
        let store = InMemoryTranscriptStore::new();
        store.append("a", "pane", "r1").expect("append");
        store.append("b", "riso", "r2").expect("append");
        store.append("a", "pasta", "r3").expect("append");

        let a = store.get("a").expect("get");
        assert_eq!(a.turns.iter().map(|t| t.message.as_str()).collect::<Vec<_>>(), vec!["pane", "pasta"]);
        assert_eq!(a.last_reply(), Some("r3"));
        assert_eq!(store.get("b").expect("get").len(), 1);
        assert_eq!(store.conversation_ids().expect("ids"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let store = Arc::new(InMemoryTranscriptStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        store.append("shared", &format!("{i}-{j}"), "ok").expect("append");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("join");
        }
        assert_eq!(store.get("shared").expect("get").len(), 200);
    }
}
