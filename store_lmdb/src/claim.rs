//! LMDB implementation of ClaimStore.
//!
//! Uniqueness of `(user, round)` is enforced with a `NO_OVERWRITE` put on
//! `claim_keys_db` inside the same write transaction that stores the row.
//! LMDB allows a single writer at a time, so two racing inserts serialize and
//! the loser sees `KeyExist`.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, MdbError, PutFlags, RoTxn};

use rewards_store::{ClaimStore, NewClaim, RewardClaim, StoreError};
use rewards_types::{ClaimId, RoundId, Timestamp, UserId};

use crate::LmdbError;

const NEXT_CLAIM_ID_KEY: &[u8] = b"next_claim_id";

/// Separates the user component from the rest of a composite key.
/// User ids never contain control characters, so it cannot collide.
const KEY_SEPARATOR: u8 = 0x00;

pub struct LmdbClaimStore {
    pub(crate) env: Arc<Env>,
    pub(crate) claims_db: Database<Bytes, Bytes>,
    pub(crate) claim_keys_db: Database<Bytes, Bytes>,
    pub(crate) user_claims_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

/// `user ++ 0x00`, the prefix shared by all of a user's composite keys.
fn user_prefix(user_id: &UserId) -> Vec<u8> {
    let u = user_id.as_str().as_bytes();
    let mut key = Vec::with_capacity(u.len() + 1);
    key.extend_from_slice(u);
    key.push(KEY_SEPARATOR);
    key
}

/// Build the uniqueness key `user ++ 0x00 ++ round`.
fn claim_key(user_id: &UserId, round_id: &RoundId) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(round_id.as_str().as_bytes());
    key
}

/// Build the history key `user ++ 0x00 ++ created_be(8) ++ id_be(8)`.
///
/// Big-endian integers sort lexicographically, so a prefix scan yields the
/// user's claims oldest first.
fn history_key(user_id: &UserId, created_at: Timestamp, id: ClaimId) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(&created_at.as_secs().to_be_bytes());
    key.extend_from_slice(&id.get().to_be_bytes());
    key
}

fn decode_id(bytes: &[u8]) -> Result<ClaimId, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Corruption(format!("claim id has {} bytes", bytes.len())))?;
    Ok(ClaimId::new(u64::from_be_bytes(arr)))
}

impl LmdbClaimStore {
    fn load(&self, rtxn: &RoTxn, id: ClaimId) -> Result<RewardClaim, LmdbError> {
        let bytes = self
            .claims_db
            .get(rtxn, &id.get().to_be_bytes())?
            .ok_or_else(|| LmdbError::Corruption(format!("index references missing claim {id}")))?;
        Ok(bincode::deserialize(bytes)?)
    }

    fn next_id(&self, rtxn: &RoTxn) -> Result<u64, LmdbError> {
        match self.meta_db.get(rtxn, NEXT_CLAIM_ID_KEY)? {
            Some(bytes) => Ok(decode_id(bytes)?.get()),
            None => Ok(1),
        }
    }
}

impl ClaimStore for LmdbClaimStore {
    fn find_claim(
        &self,
        user_id: &UserId,
        round_id: &RoundId,
    ) -> Result<Option<RewardClaim>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = claim_key(user_id, round_id);
        let id = match self.claim_keys_db.get(&rtxn, &key).map_err(LmdbError::from)? {
            Some(bytes) => decode_id(bytes)?,
            None => return Ok(None),
        };
        Ok(Some(self.load(&rtxn, id)?))
    }

    fn insert_claim(&self, claim: NewClaim) -> Result<RewardClaim, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let id = self.next_id(&wtxn)?;
        let key = claim_key(&claim.user_id, &claim.round_id);
        match self.claim_keys_db.put_with_flags(
            &mut wtxn,
            PutFlags::NO_OVERWRITE,
            &key,
            &id.to_be_bytes(),
        ) {
            Ok(()) => {}
            Err(heed::Error::Mdb(MdbError::KeyExist)) => {
                // Dropping the transaction aborts it; nothing was written.
                return Err(StoreError::Duplicate(format!(
                    "claim for user '{}' in round '{}'",
                    claim.user_id, claim.round_id
                )));
            }
            Err(e) => return Err(LmdbError::from(e).into()),
        }

        let stored = claim.into_claim(ClaimId::new(id));
        let bytes = bincode::serialize(&stored).map_err(LmdbError::from)?;
        self.claims_db
            .put(&mut wtxn, &id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.user_claims_db
            .put(
                &mut wtxn,
                &history_key(&stored.user_id, stored.created_at, stored.id),
                &[],
            )
            .map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, NEXT_CLAIM_ID_KEY, &(id + 1).to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(claim_id = id, user = %stored.user_id, round = %stored.round_id, "stored claim");
        Ok(stored)
    }

    fn list_claims(&self, user_id: &UserId) -> Result<Vec<RewardClaim>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = user_prefix(user_id);
        let mut upper = prefix.clone();
        if let Some(last) = upper.last_mut() {
            *last = KEY_SEPARATOR + 1;
        }
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );

        let mut ids = Vec::new();
        for result in self
            .user_claims_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?
        {
            let (key, _) = result.map_err(LmdbError::from)?;
            if key.len() < prefix.len() + 16 {
                return Err(LmdbError::Corruption(format!(
                    "history key for '{user_id}' is {} bytes",
                    key.len()
                ))
                .into());
            }
            ids.push(decode_id(&key[key.len() - 8..])?);
        }

        let mut claims = Vec::with_capacity(ids.len());
        for id in ids.into_iter().rev() {
            claims.push(self.load(&rtxn, id)?);
        }
        Ok(claims)
    }
}
