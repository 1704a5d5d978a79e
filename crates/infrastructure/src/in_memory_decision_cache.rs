use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sitebeam_application::{AccessDecision, Clock, DecisionCache};
use sitebeam_core::UserId;
use sitebeam_domain::{AccessResult, PermissionId, Scope};
use tokio::sync::RwLock;

struct DecisionCacheEntry {
    decision: AccessDecision,
    expires_at: DateTime<Utc>,
}

/// In-process decision cache with a time-to-live safety net.
///
/// Event-driven invalidation from the admin service is the primary freshness
/// mechanism; the TTL bounds the staleness of any mutation path that fails
/// to invalidate. Time comes from the injected clock.
pub struct InMemoryDecisionCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<UserId, HashMap<(PermissionId, Scope), DecisionCacheEntry>>>,
}

impl InMemoryDecisionCache {
    /// Creates an empty cache whose entries live for `ttl_seconds`.
    ///
    /// A zero TTL disables caching entirely.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ttl_seconds: u32) -> Self {
        Self {
            clock,
            ttl: Duration::seconds(i64::from(ttl_seconds)),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl DecisionCache for InMemoryDecisionCache {
    async fn get(
        &self,
        user_id: UserId,
        permission: &PermissionId,
        target: &Scope,
    ) -> AccessResult<Option<AccessDecision>> {
        let now = self.clock.now();
        let key = (permission.clone(), target.clone());

        {
            let entries = self.entries.read().await;
            match entries.get(&user_id).and_then(|rows| rows.get(&key)) {
                Some(entry) if entry.expires_at > now => {
                    return Ok(Some(entry.decision.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(rows) = entries.get_mut(&user_id) {
            if rows
                .get(&key)
                .is_some_and(|entry| entry.expires_at <= now)
            {
                rows.remove(&key);
            }
        }

        Ok(None)
    }

    async fn put(
        &self,
        user_id: UserId,
        permission: PermissionId,
        target: Scope,
        decision: AccessDecision,
    ) -> AccessResult<()> {
        if self.ttl.is_zero() {
            return Ok(());
        }

        let expires_at = self.clock.now() + self.ttl;
        self.entries
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert((permission, target), DecisionCacheEntry {
                decision,
                expires_at,
            });

        Ok(())
    }

    async fn invalidate_user(&self, user_id: UserId) -> AccessResult<()> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }

    async fn invalidate_all(&self) -> AccessResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};
    use sitebeam_application::{AccessDecision, Clock, DecisionCache};
    use sitebeam_core::UserId;
    use sitebeam_domain::{PermissionId, Scope};

    use super::InMemoryDecisionCache;

    struct ManualClock {
        now: std::sync::Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn starting_at(now: DateTime<Utc>) -> Self {
            Self {
                now: std::sync::Mutex::new(now),
            }
        }

        fn advance(&self, duration: Duration) {
            if let Ok(mut guard) = self.now.lock() {
                *guard = *guard + duration;
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            match self.now.lock() {
                Ok(guard) => *guard,
                Err(poisoned) => *poisoned.into_inner(),
            }
        }
    }

    fn permission() -> Option<PermissionId> {
        PermissionId::parse("projects:read").ok()
    }

    fn denied() -> AccessDecision {
        AccessDecision::Deny {
            reason: "test".to_owned(),
        }
    }

    #[tokio::test]
    async fn fresh_entries_are_returned() {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let cache = InMemoryDecisionCache::new(clock, 30);
        let user = UserId::new();
        let Some(read) = permission() else { return };

        let put = cache.put(user, read.clone(), Scope::Global, denied()).await;
        assert!(put.is_ok());

        let cached = cache.get(user, &read, &Scope::Global).await;
        assert!(cached.is_ok_and(|cached| cached == Some(denied())));
    }

    #[tokio::test]
    async fn entries_expire_after_the_ttl() {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let cache = InMemoryDecisionCache::new(clock.clone(), 30);
        let user = UserId::new();
        let Some(read) = permission() else { return };

        let put = cache.put(user, read.clone(), Scope::Global, denied()).await;
        assert!(put.is_ok());

        clock.advance(Duration::seconds(31));

        let cached = cache.get(user, &read, &Scope::Global).await;
        assert!(cached.is_ok_and(|cached| cached.is_none()));
    }

    #[tokio::test]
    async fn invalidate_user_targets_one_principal() {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let cache = InMemoryDecisionCache::new(clock, 30);
        let first = UserId::new();
        let second = UserId::new();
        let Some(read) = permission() else { return };

        for user in [first, second] {
            let put = cache.put(user, read.clone(), Scope::Global, denied()).await;
            assert!(put.is_ok());
        }

        assert!(cache.invalidate_user(first).await.is_ok());

        let first_cached = cache.get(first, &read, &Scope::Global).await;
        assert!(first_cached.is_ok_and(|cached| cached.is_none()));
        let second_cached = cache.get(second, &read, &Scope::Global).await;
        assert!(second_cached.is_ok_and(|cached| cached.is_some()));
    }

    #[tokio::test]
    async fn invalidate_all_clears_every_entry() {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let cache = InMemoryDecisionCache::new(clock, 30);
        let user = UserId::new();
        let Some(read) = permission() else { return };

        let put = cache.put(user, read.clone(), Scope::Global, denied()).await;
        assert!(put.is_ok());
        assert!(cache.invalidate_all().await.is_ok());

        let cached = cache.get(user, &read, &Scope::Global).await;
        assert!(cached.is_ok_and(|cached| cached.is_none()));
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let cache = InMemoryDecisionCache::new(clock, 0);
        let user = UserId::new();
        let Some(read) = permission() else { return };

        let put = cache.put(user, read.clone(), Scope::Global, denied()).await;
        assert!(put.is_ok());

        let cached = cache.get(user, &read, &Scope::Global).await;
        assert!(cached.is_ok_and(|cached| cached.is_none()));
    }
}
