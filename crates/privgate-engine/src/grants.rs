//! "Allow once" grants
//!
//! Grants live in memory only and expire lazily: every read compares the
//! expiry with the clock, so a grant is never observed as valid at or after
//! its expiry instant even if nothing has evicted it yet. There is no
//! background sweep.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use privgate_types::Scope;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{EngineError, Result};

/// Longest lifetime an "allow once" grant may be given
pub const MAX_ASK_GRANT_TIMEFRAME: std::time::Duration =
    std::time::Duration::from_secs(30 * 24 * 60 * 60);

/// A grant timeframe must be positive and at most [`MAX_ASK_GRANT_TIMEFRAME`]
pub fn validate_timeframe(timeframe: std::time::Duration) -> Result<()> {
    if timeframe.is_zero() {
        return Err(EngineError::InvalidRequest(
            "ask grant timeframe must be positive".into(),
        ));
    }
    if timeframe > MAX_ASK_GRANT_TIMEFRAME {
        return Err(EngineError::InvalidRequest(format!(
            "ask grant timeframe of {}s exceeds the maximum of {}s",
            timeframe.as_secs(),
            MAX_ASK_GRANT_TIMEFRAME.as_secs()
        )));
    }
    Ok(())
}

/// A temporary Allow for one exact scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskGrant {
    pub scope: Scope,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AskGrant {
    /// Valid on `[granted_at, expires_at)`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Concurrent map of scope identity to grant
#[derive(Debug)]
pub struct AskGrantCache {
    grants: DashMap<String, AskGrant>,
    timeframe_ms: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl AskGrantCache {
    /// `timeframe` is capped at [`MAX_ASK_GRANT_TIMEFRAME`]
    pub fn new(clock: Arc<dyn Clock>, timeframe: std::time::Duration) -> Self {
        Self {
            grants: DashMap::new(),
            timeframe_ms: AtomicI64::new(to_millis(timeframe.min(MAX_ASK_GRANT_TIMEFRAME))),
            clock,
        }
    }

    /// Lifetime given to grants created from now on
    pub fn timeframe(&self) -> std::time::Duration {
        let ms = self.timeframe_ms.load(Ordering::Acquire);
        std::time::Duration::from_millis(ms.max(0) as u64)
    }

    /// Change the lifetime of future grants; issued grants keep theirs
    pub fn set_timeframe(&self, timeframe: std::time::Duration) -> Result<()> {
        validate_timeframe(timeframe)?;
        self.timeframe_ms
            .store(to_millis(timeframe), Ordering::Release);
        Ok(())
    }

    /// Insert or replace the grant for `scope`, expiring one timeframe from now
    pub fn grant(&self, scope: &Scope) -> Result<AskGrant> {
        let now = self.clock.now();
        let expires_at = Duration::try_milliseconds(self.timeframe_ms.load(Ordering::Acquire))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                EngineError::InvalidRequest(format!("grant expiry for {scope} is out of range"))
            })?;
        let grant = AskGrant {
            scope: scope.clone(),
            granted_at: now,
            expires_at,
        };
        self.grants.insert(scope.key(), grant.clone());
        Ok(grant)
    }

    /// The unexpired grant for exactly `scope`
    ///
    /// An expired grant found on the way is evicted.
    pub fn lookup(&self, scope: &Scope) -> Option<AskGrant> {
        let key = scope.key();
        let now = self.clock.now();
        // The shard guard must be released before any removal on the same key.
        let found = self.grants.get(&key).map(|g| g.clone())?;
        if found.is_valid_at(now) {
            return Some(found);
        }
        self.grants.remove_if(&key, |_, g| !g.is_valid_at(now));
        None
    }

    /// Drop the grant for `scope`; returns whether one was present
    pub fn revoke(&self, scope: &Scope) -> bool {
        self.grants.remove(&scope.key()).is_some()
    }

    /// Drop every grant whose app is `package`
    pub fn revoke_app(&self, package: &str) -> usize {
        let mut revoked = 0;
        self.grants.retain(|_, g| {
            let keep = !g.scope.app.is_package(package);
            if !keep {
                revoked += 1;
            }
            keep
        });
        revoked
    }

    /// Evict expired grants; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut purged = 0;
        self.grants.retain(|_, g| {
            let keep = g.is_valid_at(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }

    /// Grants still valid right now
    pub fn active_grants(&self) -> Vec<AskGrant> {
        let now = self.clock.now();
        self.grants
            .iter()
            .filter(|g| g.is_valid_at(now))
            .map(|g| g.value().clone())
            .collect()
    }

    /// Stored grants, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

fn to_millis(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
