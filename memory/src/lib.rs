//! Per-user rolling conversation memory.
//!
//! Each user gets a bounded ring of recent turns. Appends past the capacity
//! evict the oldest turn, so a chatty user holds a fixed amount of memory
//! instead of growing without bound. The capacity is deliberately larger than
//! the context window handed to completion providers, so eviction never
//! shortens a window that the reference behavior would have filled.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use kotik_types::{Turn, UserId};

/// Default ring capacity per user.
pub const DEFAULT_CAPACITY: usize = 64;

/// Shared rolling history of exchanged turns, keyed by user.
///
/// Cloning is cheap and clones observe the same state; the handle is meant to
/// be shared between the pipeline and anything else that inspects history.
/// Individual operations are atomic behind one lock, which is never held
/// across an await point.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    inner: Arc<Mutex<HashMap<UserId, VecDeque<Turn>>>>,
    capacity: usize,
}

impl ConversationMemory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Record one turn for `user`.
    ///
    /// System turns are not stored: the persona directive is injected at
    /// request-build time only and must never surface in a window.
    pub fn append(&self, user: UserId, turn: Turn) {
        if turn.role.is_system() {
            tracing::debug!(user_id = %user, "ignoring system turn at storage time");
            return;
        }
        let mut map = self.lock();
        let ring = map.entry(user).or_default();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(turn);
    }

    /// The last `limit` turns for `user`, oldest first.
    ///
    /// Unknown users get an empty window. Stored history is never mutated.
    #[must_use]
    pub fn window(&self, user: UserId, limit: usize) -> Vec<Turn> {
        let map = self.lock();
        let Some(ring) = map.get(&user) else {
            return Vec::new();
        };
        let skip = ring.len().saturating_sub(limit);
        ring.iter().skip(skip).cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, VecDeque<Turn>>> {
        // A poisoned lock only means another append panicked mid-way; the map
        // itself is still structurally sound, so keep serving.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kotik_types::Role;

    fn user(id: i64) -> UserId {
        UserId::new(id)
    }

    #[test]
    fn window_returns_last_turns_oldest_first() {
        let memory = ConversationMemory::new(8);
        for i in 0..5 {
            memory.append(user(1), Turn::user(format!("msg {i}")));
        }

        let window = memory.window(user(1), 3);
        let contents: Vec<&str> = window.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["msg 2", "msg 3", "msg 4"]);
    }

    #[test]
    fn window_is_empty_for_unknown_user() {
        let memory = ConversationMemory::default();
        assert!(memory.window(user(42), 10).is_empty());
    }

    #[test]
    fn window_with_zero_limit_is_empty() {
        let memory = ConversationMemory::default();
        memory.append(user(1), Turn::user("мяу"));
        assert!(memory.window(user(1), 0).is_empty());
    }

    #[test]
    fn system_turns_are_never_stored() {
        let memory = ConversationMemory::default();
        memory.append(user(1), Turn::system("persona"));
        memory.append(user(1), Turn::user("привет"));
        memory.append(user(1), Turn::assistant("мур"));

        let window = memory.window(user(1), 10);
        assert_eq!(window.len(), 2);
        assert!(window.iter().all(|t| !t.role.is_system()));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let memory = ConversationMemory::new(3);
        for i in 0..5 {
            memory.append(user(1), Turn::user(format!("msg {i}")));
        }

        let window = memory.window(user(1), 10);
        let contents: Vec<&str> = window.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["msg 2", "msg 3", "msg 4"]);
    }

    #[test]
    fn users_are_isolated() {
        let memory = ConversationMemory::default();
        memory.append(user(1), Turn::user("from one"));
        memory.append(user(2), Turn::user("from two"));

        assert_eq!(memory.window(user(1), 10).len(), 1);
        assert_eq!(memory.window(user(2), 10).len(), 1);
        assert_eq!(memory.window(user(1), 10)[0].content, "from one");
    }

    #[test]
    fn window_does_not_consume_history() {
        let memory = ConversationMemory::default();
        memory.append(user(1), Turn::user("раз"));
        memory.append(user(1), Turn::assistant("два"));

        let first = memory.window(user(1), 10);
        let second = memory.window(user(1), 10);
        assert_eq!(first, second);
    }

    #[test]
    fn interleaved_roles_keep_order() {
        let memory = ConversationMemory::default();
        memory.append(user(1), Turn::user("вопрос"));
        memory.append(user(1), Turn::assistant("ответ"));
        memory.append(user(1), Turn::user("ещё вопрос"));

        let window = memory.window(user(1), 10);
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[1].role, Role::Assistant);
        assert_eq!(window[2].role, Role::User);
    }

    #[test]
    fn clones_share_state() {
        let memory = ConversationMemory::default();
        let handle = memory.clone();
        handle.append(user(1), Turn::user("мяу"));
        assert_eq!(memory.window(user(1), 10).len(), 1);
    }
}
