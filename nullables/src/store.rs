//! Nullable store — thread-safe in-memory claim storage for testing.

use rewards_store::{ClaimStore, NewClaim, RewardClaim, StoreError};
use rewards_types::{ClaimId, RoundId, UserId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// Store operations that can be made to fail on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreFailure {
    Find,
    Insert,
    List,
}

#[derive(Default)]
struct Inner {
    claims: BTreeMap<u64, RewardClaim>,
    keys: HashMap<(UserId, RoundId), u64>,
    next_id: u64,
}

/// An in-memory claim store for testing.
/// Thread-safe; enforces the same `(user, round)` uniqueness as the LMDB backend.
pub struct NullClaimStore {
    inner: Mutex<Inner>,
    failing: Mutex<HashSet<StoreFailure>>,
    stale_reads: Mutex<bool>,
}

impl NullClaimStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
            failing: Mutex::new(HashSet::new()),
            stale_reads: Mutex::new(false),
        }
    }

    /// Make every subsequent call of `op` fail with a backend error.
    pub fn fail(&self, op: StoreFailure) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Make `find_claim` answer as if no claim had been committed yet.
    ///
    /// Reproduces the window where a concurrent claimer read before another
    /// request's insert landed.
    pub fn set_stale_reads(&self, stale: bool) {
        *self.stale_reads.lock().unwrap() = stale;
    }

    /// Number of stored claims across all users.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, op: StoreFailure) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(StoreError::Backend(format!("injected {:?} failure", op)));
        }
        Ok(())
    }
}

impl Default for NullClaimStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimStore for NullClaimStore {
    fn find_claim(
        &self,
        user_id: &UserId,
        round_id: &RoundId,
    ) -> Result<Option<RewardClaim>, StoreError> {
        self.check(StoreFailure::Find)?;
        if *self.stale_reads.lock().unwrap() {
            return Ok(None);
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .keys
            .get(&(user_id.clone(), round_id.clone()))
            .and_then(|id| inner.claims.get(id))
            .cloned())
    }

    fn insert_claim(&self, claim: NewClaim) -> Result<RewardClaim, StoreError> {
        self.check(StoreFailure::Insert)?;
        let mut inner = self.inner.lock().unwrap();
        let key = (claim.user_id.clone(), claim.round_id.clone());
        if inner.keys.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "claim for user '{}' in round '{}'",
                key.0, key.1
            )));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let stored = claim.into_claim(ClaimId::new(id));
        inner.keys.insert(key, id);
        inner.claims.insert(id, stored.clone());
        Ok(stored)
    }

    fn list_claims(&self, user_id: &UserId) -> Result<Vec<RewardClaim>, StoreError> {
        self.check(StoreFailure::List)?;
        let inner = self.inner.lock().unwrap();
        let mut claims: Vec<_> = inner
            .claims
            .values()
            .filter(|c| &c.user_id == user_id)
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(claims)
    }
}
