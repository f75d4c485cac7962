use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::path::StorePath;
use super::tree::{get_at, resolve_server_values, set_at};
use super::StoreError;

pub type SubscriptionId = u64;
pub type ConnectionId = u64;

struct Subscriber {
    path: StorePath,
    last: Value,
    tx: mpsc::UnboundedSender<Value>,
}

#[derive(Default)]
struct StoreState {
    root: Value,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    connections: HashMap<ConnectionId, Vec<StorePath>>,
    next_id: u64,
    push_seq: u64,
    last_timestamp: i64,
}

impl StoreState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Server clock in milliseconds, never moving backwards.
    fn next_timestamp(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_timestamp = self.last_timestamp.max(now);
        self.last_timestamp
    }

    /// Apply a batch of writes atomically and notify overlapping subscribers once.
    fn apply(&mut self, writes: Vec<(StorePath, Value)>) {
        let timestamp = self.next_timestamp();
        let mut touched = Vec::with_capacity(writes.len());
        for (path, mut value) in writes {
            resolve_server_values(&mut value, timestamp);
            set_at(&mut self.root, &path, value);
            touched.push(path);
        }
        self.notify(&touched);
    }

    fn notify(&mut self, touched: &[StorePath]) {
        let root = &self.root;
        self.subscribers.retain(|id, sub| {
            if !touched.iter().any(|path| path.overlaps(&sub.path)) {
                return true;
            }
            let current = get_at(root, &sub.path).cloned().unwrap_or(Value::Null);
            if current == sub.last {
                return true;
            }
            sub.last = current.clone();
            if sub.tx.send(current).is_err() {
                debug!("Dropping closed subscription {} on {}", id, sub.path);
                return false;
            }
            true
        });
    }
}

struct Shared {
    state: Mutex<StoreState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Outcome of [`RealtimeStore::transaction`].
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub committed: bool,
    /// Value at the transaction path after the attempt.
    pub snapshot: Value,
}

/// Counters reported by the diagnostics endpoint.
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub subscriptions: usize,
    pub connections: usize,
    pub sessions: usize,
}

/// Path-addressed JSON tree with change subscriptions and per-connection
/// disconnect cleanup.
///
/// Every write runs under one lock, so subscribers observe writes in the
/// same order. Cloning is cheap and shares the tree.
#[derive(Clone)]
pub struct RealtimeStore {
    shared: Arc<Shared>,
}

impl Default for RealtimeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeStore {
    pub fn new() -> Self {
        info!("Realtime store initialized");
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState::default()),
            }),
        }
    }

    /// Read the value once. Absent paths read as `Value::Null`.
    pub fn get(&self, path: &StorePath) -> Value {
        let state = self.shared.lock();
        get_at(&state.root, path).cloned().unwrap_or(Value::Null)
    }

    /// Replace the value at `path`. Writing `Value::Null` removes it.
    pub fn set(&self, path: &StorePath, value: Value) {
        self.shared.lock().apply(vec![(path.clone(), value)]);
    }

    pub fn remove(&self, path: &StorePath) {
        self.set(path, Value::Null);
    }

    /// Merge `values` under `path`. Keys may be relative multi-segment paths
    /// (`"terminated/terminatedBy"`); all of them land in one atomic write.
    pub fn update(&self, path: &StorePath, values: Map<String, Value>) -> Result<(), StoreError> {
        let mut writes: Vec<(StorePath, Value)> = Vec::with_capacity(values.len());
        for (key, value) in values {
            let relative = StorePath::parse(&key)?;
            if relative.is_root() {
                return Err(StoreError::InvalidPath("Update key must not be empty".to_string()));
            }
            let target = path.join(&relative);
            if let Some((existing, _)) = writes.iter().find(|(p, _)| p.overlaps(&target)) {
                return Err(StoreError::OverlappingUpdate(format!("{} overlaps {}", target, existing)));
            }
            writes.push((target, value));
        }
        if writes.is_empty() {
            return Ok(());
        }
        self.shared.lock().apply(writes);
        Ok(())
    }

    /// Append `value` under `path` with a chronologically sortable key.
    pub fn push(&self, path: &StorePath, value: Value) -> Result<String, StoreError> {
        let mut state = self.shared.lock();
        let key = next_push_key(&mut state);
        let target = path.child(&key)?;
        state.apply(vec![(target, value)]);
        Ok(key)
    }

    /// Atomically read-modify-write the value at `path`.
    ///
    /// `update` receives the current value (`Null` when absent) and returns
    /// the replacement, or `None` to abort. It runs under the store lock and
    /// must not call back into the store.
    pub fn transaction<F>(&self, path: &StorePath, update: F) -> TransactionOutcome
    where
        F: FnOnce(&Value) -> Option<Value>,
    {
        let mut state = self.shared.lock();
        let current = get_at(&state.root, path).cloned().unwrap_or(Value::Null);
        match update(&current) {
            Some(next) => {
                state.apply(vec![(path.clone(), next)]);
                let snapshot = get_at(&state.root, path).cloned().unwrap_or(Value::Null);
                TransactionOutcome { committed: true, snapshot }
            }
            None => TransactionOutcome { committed: false, snapshot: current },
        }
    }

    /// Write `value` at `scope/relative` only if `check` accepts the current
    /// value at `scope`. Check and write happen under the same lock.
    pub fn set_if<E, F>(&self, scope: &StorePath, relative: &StorePath, value: Value, check: F) -> Result<(), E>
    where
        F: FnOnce(&Value) -> Result<(), E>,
    {
        let mut state = self.shared.lock();
        let current = get_at(&state.root, scope).unwrap_or(&Value::Null);
        check(current)?;
        state.apply(vec![(scope.join(relative), value)]);
        Ok(())
    }

    /// Read-modify-write `scope/relative` while also checking the value at `scope`.
    ///
    /// `update` gets the scope value and the current target value. It may
    /// fail, abort with `Ok(None)` or return the replacement. It runs under
    /// the store lock and must not call back into the store.
    pub fn scoped_transaction<E, F>(&self, scope: &StorePath, relative: &StorePath, update: F) -> Result<TransactionOutcome, E>
    where
        F: FnOnce(&Value, &Value) -> Result<Option<Value>, E>,
    {
        let mut state = self.shared.lock();
        let target = scope.join(relative);
        let scope_value = get_at(&state.root, scope).unwrap_or(&Value::Null);
        let current = get_at(scope_value, relative).cloned().unwrap_or(Value::Null);
        match update(scope_value, &current)? {
            Some(next) => {
                state.apply(vec![(target.clone(), next)]);
                let snapshot = get_at(&state.root, &target).cloned().unwrap_or(Value::Null);
                Ok(TransactionOutcome { committed: true, snapshot })
            }
            None => Ok(TransactionOutcome { committed: false, snapshot: current }),
        }
    }

    /// Reserve a chronologically sortable key without writing anything.
    pub fn push_key(&self) -> String {
        next_push_key(&mut self.shared.lock())
    }

    /// Listen for changes at `path`. The current value is delivered first.
    pub fn subscribe(&self, path: &StorePath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.shared.lock();
        let id = state.next_id();
        let current = get_at(&state.root, path).cloned().unwrap_or(Value::Null);
        // The receiver is still in scope, so the initial send cannot fail.
        let _ = tx.send(current.clone());
        state.subscribers.insert(
            id,
            Subscriber {
                path: path.clone(),
                last: current,
                tx,
            },
        );
        debug!("Subscription {} registered on {}", id, path);
        Subscription {
            id,
            path: path.clone(),
            rx,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Open a client connection. Dropping it runs its disconnect operations.
    pub fn connect(&self) -> Connection {
        let mut state = self.shared.lock();
        let id = state.next_id();
        state.connections.insert(id, Vec::new());
        debug!("Connection {} opened", id);
        Connection {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.shared.lock();
        let sessions = state
            .root
            .get("sessions")
            .and_then(Value::as_object)
            .map_or(0, |sessions| sessions.len());
        StoreStats {
            subscriptions: state.subscribers.len(),
            connections: state.connections.len(),
            sessions,
        }
    }
}

fn next_push_key(state: &mut StoreState) -> String {
    let timestamp = state.next_timestamp();
    state.push_seq += 1;
    format!("{:013}-{:020}", timestamp, state.push_seq)
}

/// A registered change listener. Dropping it unregisters the listener.
pub struct Subscription {
    id: SubscriptionId,
    path: StorePath,
    rx: mpsc::UnboundedReceiver<Value>,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Wait for the next snapshot. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    /// Take a pending snapshot without waiting.
    pub fn try_changed(&mut self) -> Option<Value> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().subscribers.remove(&self.id);
            debug!("Subscription {} on {} released", self.id, self.path);
        }
    }
}

/// One client's link to the store. Dropping it removes every registered
/// path in a single atomic write.
pub struct Connection {
    id: ConnectionId,
    shared: Weak<Shared>,
}

impl Connection {
    /// Remove `path` when this connection drops.
    pub fn on_disconnect_remove(&self, path: &StorePath) {
        if let Some(shared) = self.shared.upgrade() {
            if let Some(removals) = shared.lock().connections.get_mut(&self.id) {
                removals.push(path.clone());
            }
        }
    }

    /// Close the connection now.
    pub fn disconnect(self) {}
}

impl Drop for Connection {
    fn drop(&mut self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut state = shared.lock();
        let Some(removals) = state.connections.remove(&self.id) else {
            return;
        };
        debug!("Connection {} closed, removing {} path(s)", self.id, removals.len());
        if removals.is_empty() {
            return;
        }
        state.apply(removals.into_iter().map(|path| (path, Value::Null)).collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ServerValue;
    use serde_json::json;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn subscription_delivers_initial_and_changes() {
        let store = RealtimeStore::new();
        let mut sub = store.subscribe(&path("sessions/1/settings"));
        assert_eq!(sub.changed().await, Some(Value::Null));

        store.set(&path("sessions/1/settings/language"), json!("python"));
        assert_eq!(sub.changed().await, Some(json!({"language": "python"})));

        // Unrelated and identical writes do not notify.
        store.set(&path("sessions/2/settings/language"), json!("go"));
        store.set(&path("sessions/1/settings/language"), json!("python"));
        assert!(sub.try_changed().is_none());
    }

    #[tokio::test]
    async fn dropped_subscription_is_unregistered() {
        let store = RealtimeStore::new();
        let sub = store.subscribe(&path("a"));
        assert_eq!(store.stats().subscriptions, 1);
        drop(sub);
        assert_eq!(store.stats().subscriptions, 0);
    }

    #[test]
    fn disconnect_runs_registered_operations() {
        let store = RealtimeStore::new();
        let presence = path("sessions/1/users/u1");
        store.set(&presence, json!({"name": "Asha"}));

        let other = path("sessions/1/users/u2");
        store.set(&other, json!({"name": "Ravi"}));

        let conn = store.connect();
        conn.on_disconnect_remove(&presence);
        assert_eq!(store.stats().connections, 1);

        conn.disconnect();
        assert_eq!(store.stats().connections, 0);
        assert_eq!(store.get(&presence), Value::Null);
        assert_eq!(store.get(&other), json!({"name": "Ravi"}));
    }

    #[test]
    fn update_is_multi_path_and_rejects_overlaps() {
        let store = RealtimeStore::new();
        let session = path("sessions/1");
        let mut values = Map::new();
        values.insert("terminated/terminated".to_string(), json!(true));
        values.insert("finalCode/content".to_string(), json!("x"));
        store.update(&session, values).unwrap();
        assert_eq!(store.get(&session), json!({"terminated": {"terminated": true}, "finalCode": {"content": "x"}}));

        let mut overlapping = Map::new();
        overlapping.insert("a".to_string(), json!(1));
        overlapping.insert("a/b".to_string(), json!(2));
        assert!(matches!(store.update(&session, overlapping), Err(StoreError::OverlappingUpdate(_))));
    }

    #[test]
    fn transaction_can_abort() {
        let store = RealtimeStore::new();
        let flag = path("flag");
        let first = store.transaction(&flag, |current| current.is_null().then(|| json!(1)));
        assert!(first.committed);
        let second = store.transaction(&flag, |current| current.is_null().then(|| json!(2)));
        assert!(!second.committed);
        assert_eq!(second.snapshot, json!(1));
    }

    #[test]
    fn conditional_set_checks_the_scope_value() {
        let store = RealtimeStore::new();
        let session = path("sessions/1");
        store.set(&session.join(&path("status")), json!("active"));
        let content = path("firepad/content");

        let ok: Result<(), &str> = store.set_if(&session, &content, json!("a"), |_| Ok(()));
        assert!(ok.is_ok());
        let denied = store.set_if(&session, &content, json!("b"), |_| Err("locked"));
        assert_eq!(denied, Err("locked"));
        assert_eq!(store.get(&session.join(&content)), json!("a"));
    }

    #[test]
    fn scoped_transaction_sees_scope_and_target() {
        let store = RealtimeStore::new();
        let session = path("sessions/1");
        let notes = path("interviewerNotes");
        let missing: Result<TransactionOutcome, &str> =
            store.scoped_transaction(&session, &notes, |scope, _| if scope.is_null() { Err("missing") } else { Ok(None) });
        assert_eq!(missing.unwrap_err(), "missing");

        store.set(&session.join(&path("created")), json!(1));
        let outcome: Result<TransactionOutcome, &str> = store.scoped_transaction(&session, &notes, |scope, current| {
            assert_eq!(scope["created"], json!(1));
            assert!(current.is_null());
            Ok(Some(json!({"content": "ok"})))
        });
        assert_eq!(outcome.unwrap().snapshot, json!({"content": "ok"}));
    }

    #[test]
    fn server_timestamps_do_not_go_backwards() {
        let store = RealtimeStore::new();
        store.set(&path("a"), ServerValue::timestamp());
        store.set(&path("b"), ServerValue::timestamp());
        let a = store.get(&path("a")).as_i64().unwrap();
        let b = store.get(&path("b")).as_i64().unwrap();
        assert!(a > 0);
        assert!(b >= a);
    }

    #[test]
    fn push_keys_sort_in_insertion_order() {
        let store = RealtimeStore::new();
        let log = path("log");
        let first = store.push(&log, json!(1)).unwrap();
        let second = store.push(&log, json!(2)).unwrap();
        assert!(first < second);
        let keys: Vec<String> = store.get(&log).as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![first, second]);
    }

    #[test]
    fn push_keys_keep_order_past_a_million_pushes() {
        let store = RealtimeStore::new();
        store.shared.lock().push_seq = 999_998;
        let log = path("log");
        let before = store.push(&log, json!("a")).unwrap();
        let after = store.push(&log, json!("b")).unwrap();
        assert!(before < after, "{} should sort before {}", before, after);
    }
}
