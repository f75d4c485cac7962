use moka::sync::Cache;
use std::time::Duration;
use tracing::{info, warn};

/// One candidate's login to one session.
#[derive(Clone, Debug, PartialEq)]
pub struct LoginEntry {
    pub user_id: String,
    pub user_name: String,
    pub session_code: String,
    pub ip_hash: String,
    pub device: String,
    pub login_time: i64,
    pub last_activity: i64,
}

#[derive(Debug, PartialEq)]
pub enum LoginOutcome {
    Tracked,
    /// Another address was active recently; the new login is not recorded.
    DifferentLocation(LoginEntry),
}

pub fn login_key(session_code: &str, user_id: &str) -> String {
    format!("{}-{}", session_code, user_id)
}

/// Recently active candidate logins. Entries idle longer than the idle
/// timeout are evicted.
#[derive(Clone)]
pub struct LoginTracker {
    entries: Cache<String, LoginEntry>,
    window_millis: i64,
}

impl LoginTracker {
    pub fn new(window: Duration, idle: Duration) -> Self {
        let entries = Cache::builder().max_capacity(100_000).time_to_idle(idle).build();
        info!("Login tracker initialized");
        Self { entries, window_millis: window.as_millis() as i64 }
    }

    pub fn login(&self, entry: LoginEntry, now_millis: i64) -> LoginOutcome {
        let key = login_key(&entry.session_code, &entry.user_id);
        if let Some(existing) = self.entries.get(&key) {
            if existing.ip_hash != entry.ip_hash && now_millis - existing.last_activity < self.window_millis {
                warn!("Multiple login detected: candidate '{}' from a different address", entry.user_name);
                return LoginOutcome::DifferentLocation(existing);
            }
        }
        self.entries.insert(key, entry);
        LoginOutcome::Tracked
    }

    /// Refresh the activity time. Returns false for unknown logins.
    pub fn heartbeat(&self, key: &str, now_millis: i64) -> bool {
        match self.entries.get(key) {
            Some(mut entry) => {
                entry.last_activity = now_millis;
                self.entries.insert(key.to_string(), entry);
                true
            }
            None => false,
        }
    }

    pub fn logout(&self, key: &str) {
        self.entries.invalidate(key);
    }

    pub fn check(&self, key: &str) -> Option<LoginEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ip_hash: &str, at: i64) -> LoginEntry {
        LoginEntry {
            user_id: "asha".into(),
            user_name: "Asha".into(),
            session_code: "482913".into(),
            ip_hash: ip_hash.into(),
            device: "test".into(),
            login_time: at,
            last_activity: at,
        }
    }

    fn tracker() -> LoginTracker {
        LoginTracker::new(Duration::from_secs(300), Duration::from_secs(1800))
    }

    #[test]
    fn warns_on_recent_login_from_another_address() {
        let tracker = tracker();
        assert_eq!(tracker.login(entry("aaaa", 1_000), 1_000), LoginOutcome::Tracked);
        // Same address is always fine.
        assert_eq!(tracker.login(entry("aaaa", 2_000), 2_000), LoginOutcome::Tracked);
        let outcome = tracker.login(entry("bbbb", 3_000), 3_000);
        assert!(matches!(outcome, LoginOutcome::DifferentLocation(existing) if existing.ip_hash == "aaaa"));
        // The warning did not replace the first login.
        assert_eq!(tracker.check("482913-asha").unwrap().ip_hash, "aaaa");
    }

    #[test]
    fn stale_logins_are_replaced() {
        let tracker = tracker();
        tracker.login(entry("aaaa", 0), 0);
        let later = 5 * 60 * 1000 + 1;
        assert_eq!(tracker.login(entry("bbbb", later), later), LoginOutcome::Tracked);
        assert_eq!(tracker.check("482913-asha").unwrap().ip_hash, "bbbb");
    }

    #[test]
    fn heartbeat_and_logout() {
        let tracker = tracker();
        assert!(!tracker.heartbeat("482913-asha", 10));
        tracker.login(entry("aaaa", 0), 0);
        assert!(tracker.heartbeat("482913-asha", 10));
        assert_eq!(tracker.check("482913-asha").unwrap().last_activity, 10);
        assert_eq!(tracker.len(), 1);
        tracker.logout("482913-asha");
        assert!(tracker.check("482913-asha").is_none());
    }
}
