//! Bounded per-session conversation store

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use super::Turn;

/// Default maximum number of turns kept per session
pub const DEFAULT_MAX_TURNS: usize = 50;

/// Shortest interval between idle sweeps
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Session {
    turns: VecDeque<Turn>,
    last_active: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            turns: VecDeque::new(),
            last_active: Instant::now(),
        }
    }

    /// Append and drop from the front until the bound holds
    fn push(&mut self, turn: Turn, max_turns: usize) {
        self.turns.push_back(turn);
        while self.turns.len() > max_turns {
            self.turns.pop_front();
        }
        self.last_active = Instant::now();
    }
}

/// Keyed conversation histories with FIFO eviction per session
///
/// The map sits behind an `RwLock` and each session behind its own `Mutex`:
/// appends to one key are serialized, appends to different keys only share
/// the read lock. Creating and clearing sessions take the write lock, so an
/// append never lands in a session a concurrent `clear` already removed.
///
/// Session keys are compared by exact value. An empty key is never stored:
/// `append` and `clear` ignore it and reads return an empty history.
#[derive(Debug)]
pub struct ConversationStore {
    sessions: RwLock<HashMap<String, Mutex<Session>>>,
    max_turns: usize,
    idle_ttl: Option<Duration>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ConversationStore {
    /// Create a store keeping at most `max_turns` turns per session (minimum 1)
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns: max_turns.max(1),
            idle_ttl: None,
        }
    }

    /// Expire sessions that have not been appended to within `ttl`
    ///
    /// `None` keeps sessions for the life of the process.
    #[must_use]
    pub fn with_idle_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.idle_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Append a turn, creating the session on first use, then trim
    pub fn append(&self, key: &str, turn: Turn) {
        if key.is_empty() {
            tracing::debug!("ignoring append with empty session key");
            return;
        }

        {
            let sessions = self.read();
            if let Some(session) = sessions.get(key) {
                lock(session).push(turn, self.max_turns);
                return;
            }
        }

        let mut sessions = self.write();
        let session = sessions.entry(key.to_owned()).or_insert_with(|| {
            tracing::debug!("creating conversation session");
            Mutex::new(Session::new())
        });
        session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(turn, self.max_turns);
    }

    /// Append a turn only if the session still exists
    ///
    /// Returns `false` when the session was cleared or pruned in the
    /// meantime, so a reply never starts a new session on its own.
    pub fn append_if_present(&self, key: &str, turn: Turn) -> bool {
        let sessions = self.read();
        let Some(session) = sessions.get(key) else {
            return false;
        };
        lock(session).push(turn, self.max_turns);
        true
    }

    /// Copy of the session's history, oldest first; empty if unknown
    #[must_use]
    pub fn history(&self, key: &str) -> Vec<Turn> {
        self.recent(key, usize::MAX)
    }

    /// The last `n` turns of a session, oldest first
    #[must_use]
    pub fn recent(&self, key: &str, n: usize) -> Vec<Turn> {
        let sessions = self.read();
        let Some(session) = sessions.get(key) else {
            return Vec::new();
        };
        let session = lock(session);
        let skip = session.turns.len().saturating_sub(n);
        session.turns.iter().skip(skip).cloned().collect()
    }

    /// Number of turns currently held for a session
    #[must_use]
    pub fn turn_count(&self, key: &str) -> usize {
        self.read()
            .get(key)
            .map_or(0, |session| lock(session).turns.len())
    }

    /// Number of live sessions
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.read().len()
    }

    /// Remove a session entirely
    ///
    /// Returns whether a session was removed. Unknown keys are a no-op.
    pub fn clear(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        self.write().remove(key).is_some()
    }

    /// Drop sessions idle for longer than the configured TTL
    ///
    /// Returns the number of sessions removed; always 0 without a TTL.
    pub fn prune_idle(&self) -> usize {
        self.prune_idle_at(Instant::now())
    }

    fn prune_idle_at(&self, now: Instant) -> usize {
        let Some(ttl) = self.idle_ttl else {
            return 0;
        };

        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, session| {
            let session = session.get_mut().unwrap_or_else(PoisonError::into_inner);
            now.saturating_duration_since(session.last_active) < ttl
        });
        before - sessions.len()
    }

    /// Periodically prune idle sessions in the background
    ///
    /// Returns `None` when no idle TTL is configured.
    #[must_use]
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        let ttl = self.idle_ttl?;
        let period = (ttl / 2).max(MIN_SWEEP_INTERVAL);
        let store = Arc::clone(self);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = store.prune_idle();
                if removed > 0 {
                    tracing::info!(
                        removed,
                        remaining = store.session_count(),
                        "pruned idle sessions"
                    );
                }
            }
        }))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Mutex<Session>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Mutex<Session>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn contents(turns: &[Turn]) -> Vec<String> {
        turns.iter().map(|t| t.content.clone()).collect()
    }

    #[test]
    fn test_append_preserves_order() {
        let store = ConversationStore::default();
        store.append("s1", Turn::user("one"));
        store.append("s1", Turn::assistant("two"));
        store.append("s1", Turn::user("three"));

        let history = store.history("s1");
        assert_eq!(contents(&history), vec!["one", "two", "three"]);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[test]
    fn test_trim_keeps_most_recent() {
        let store = ConversationStore::default();
        for i in 0..120 {
            store.append("s1", Turn::user(format!("m{i}")));
            assert!(store.turn_count("s1") <= DEFAULT_MAX_TURNS);
        }

        let history = store.history("s1");
        assert_eq!(history.len(), DEFAULT_MAX_TURNS);
        let expected: Vec<String> = (70..120).map(|i| format!("m{i}")).collect();
        assert_eq!(contents(&history), expected);
    }

    #[test]
    fn test_trim_at_exact_bound() {
        let store = ConversationStore::new(3);
        for i in 0..3 {
            store.append("s", Turn::user(i.to_string()));
        }
        assert_eq!(contents(&store.history("s")), vec!["0", "1", "2"]);

        store.append("s", Turn::user("3"));
        assert_eq!(contents(&store.history("s")), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_zero_max_turns_is_clamped() {
        let store = ConversationStore::new(0);
        assert_eq!(store.max_turns(), 1);
        store.append("s", Turn::user("a"));
        store.append("s", Turn::user("b"));
        assert_eq!(contents(&store.history("s")), vec!["b"]);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = ConversationStore::default();
        store.append("a", Turn::user("for a"));
        store.append("b", Turn::user("for b"));

        assert_eq!(contents(&store.history("a")), vec!["for a"]);
        assert_eq!(contents(&store.history("b")), vec!["for b"]);
        assert_eq!(store.session_count(), 2);
    }

    #[test]
    fn test_keys_compare_exactly() {
        let store = ConversationStore::default();
        store.append("abc", Turn::user("lower"));
        store.append("ABC", Turn::user("upper"));
        store.append("abc ", Turn::user("padded"));

        assert_eq!(store.session_count(), 3);
        assert_eq!(contents(&store.history("abc")), vec!["lower"]);
        assert!(store.history("Abc").is_empty());
    }

    #[test]
    fn test_unknown_key_has_empty_history() {
        let store = ConversationStore::default();
        assert!(store.history("missing").is_empty());
        assert!(store.recent("missing", 10).is_empty());
        assert_eq!(store.turn_count("missing"), 0);
    }

    #[test]
    fn test_history_is_a_copy() {
        let store = ConversationStore::default();
        store.append("s", Turn::user("original"));

        let mut history = store.history("s");
        history.push(Turn::assistant("injected"));
        history[0].content.push_str(" edited");

        assert_eq!(contents(&store.history("s")), vec!["original"]);
    }

    #[test]
    fn test_clear_starts_fresh_session() {
        let store = ConversationStore::default();
        store.append("s", Turn::user("a"));
        store.append("s", Turn::assistant("b"));

        assert!(store.clear("s"));
        assert!(store.history("s").is_empty());
        assert_eq!(store.session_count(), 0);

        store.append("s", Turn::user("fresh"));
        assert_eq!(contents(&store.history("s")), vec!["fresh"]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = ConversationStore::default();
        assert!(!store.clear("never-seen"));

        store.append("s", Turn::user("a"));
        assert!(store.clear("s"));
        assert!(!store.clear("s"));
    }

    #[test]
    fn test_empty_key_is_ignored() {
        let store = ConversationStore::default();
        store.append("", Turn::user("nobody"));

        assert_eq!(store.session_count(), 0);
        assert!(store.history("").is_empty());
        assert!(!store.clear(""));
    }

    #[test]
    fn test_recent_returns_tail_chronologically() {
        let store = ConversationStore::default();
        for i in 0..15 {
            store.append("s", Turn::user(i.to_string()));
        }

        let recent = store.recent("s", 10);
        let expected: Vec<String> = (5..15).map(|i| i.to_string()).collect();
        assert_eq!(contents(&recent), expected);

        assert_eq!(store.recent("s", 100).len(), 15);
        assert!(store.recent("s", 0).is_empty());
    }

    #[test]
    fn test_concurrent_appends_to_distinct_keys() {
        let store = Arc::new(ConversationStore::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let key = format!("session-{t}");
                    for i in 0..40 {
                        store.append(&key, Turn::user(format!("{t}:{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.session_count(), 8);
        for t in 0..8 {
            let history = store.history(&format!("session-{t}"));
            let expected: Vec<String> = (0..40).map(|i| format!("{t}:{i}")).collect();
            assert_eq!(contents(&history), expected);
        }
    }

    #[test]
    fn test_concurrent_appends_to_one_key_stay_bounded_and_ordered() {
        let store = Arc::new(ConversationStore::new(64));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.append("shared", Turn::user(format!("{t}:{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = store.history("shared");
        assert_eq!(history.len(), 64);

        // Each writer's turns must keep their relative order
        for t in 0..4 {
            let prefix = format!("{t}:");
            let seq: Vec<usize> = history
                .iter()
                .filter_map(|turn| turn.content.strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert!(seq.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_prune_without_ttl_is_noop() {
        let store = ConversationStore::default();
        store.append("s", Turn::user("a"));
        assert_eq!(store.prune_idle(), 0);
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_prune_removes_only_idle_sessions() {
        let store = ConversationStore::default().with_idle_ttl(Some(Duration::from_secs(60)));
        store.append("old", Turn::user("a"));
        store.append("new", Turn::user("b"));

        // Nothing is stale yet
        assert_eq!(store.prune_idle(), 0);

        // Pretend 90s passed, then touch "new" relative to that clock
        let later = Instant::now() + Duration::from_secs(90);
        {
            let sessions = store.read();
            lock(&sessions["new"]).last_active = later;
        }
        assert_eq!(store.prune_idle_at(later), 1);
        assert!(store.history("old").is_empty());
        assert_eq!(contents(&store.history("new")), vec!["b"]);
    }

    #[test]
    fn test_reply_after_prune_does_not_start_session() {
        let store = ConversationStore::default().with_idle_ttl(Some(Duration::from_millis(1)));
        store.append("s", Turn::user("still there?"));

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.prune_idle(), 1);

        assert!(!store.append_if_present("s", Turn::assistant("late reply")));
        assert!(store.history("s").is_empty());
        assert_eq!(store.session_count(), 0);

        // The next message opens the session with a user turn
        store.append("s", Turn::user("hello again"));
        assert_eq!(store.history("s")[0].role, Role::User);
    }

    #[test]
    fn test_append_if_present() {
        let store = ConversationStore::new(2);
        assert!(!store.append_if_present("s", Turn::assistant("orphan")));
        assert!(!store.append_if_present("", Turn::assistant("orphan")));

        store.append("s", Turn::user("a"));
        assert!(store.append_if_present("s", Turn::assistant("b")));
        assert!(store.append_if_present("s", Turn::assistant("c")));
        assert_eq!(contents(&store.history("s")), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_sweeper_requires_ttl() {
        let store = Arc::new(ConversationStore::default());
        assert!(store.spawn_sweeper().is_none());

        let store = Arc::new(
            ConversationStore::default().with_idle_ttl(Some(Duration::from_secs(3600))),
        );
        let handle = store.spawn_sweeper().expect("sweeper should start");
        handle.abort();
    }
}
