//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::claim::LmdbClaimStore;
use crate::LmdbError;

/// The schema version that the current code writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub(crate) const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Named databases in the environment.
pub(crate) const CLAIMS_DB: &str = "claims";
pub(crate) const CLAIM_KEYS_DB: &str = "claim_keys";
pub(crate) const USER_CLAIMS_DB: &str = "user_claims";
pub(crate) const META_DB: &str = "meta";

const MAX_DBS: u32 = 4;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    path: PathBuf,
    env: Arc<Env>,
    /// `claim_id_be(8)` → bincode `RewardClaim`.
    pub(crate) claims_db: Database<Bytes, Bytes>,
    /// `user ++ 0x00 ++ round` → `claim_id_be(8)`. Enforces one claim per round.
    pub(crate) claim_keys_db: Database<Bytes, Bytes>,
    /// `user ++ 0x00 ++ created_be(8) ++ claim_id_be(8)` → empty.
    pub(crate) user_claims_db: Database<Bytes, Bytes>,
    /// Schema version and the claim id sequence.
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates the directory if needed and refuses databases written by a
    /// newer schema.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: each data directory is opened once per process; the service
        // holds the single `LmdbEnvironment` for it.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let claims_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(CLAIMS_DB))?;
        let claim_keys_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(CLAIM_KEYS_DB))?;
        let user_claims_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(USER_CLAIMS_DB))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(META_DB))?;

        let stored = match meta_db.get(&wtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => Some(decode_u32(bytes)?),
            None => None,
        };
        match stored {
            Some(found) if found > CURRENT_SCHEMA_VERSION => {
                return Err(LmdbError::UnsupportedSchema {
                    found,
                    supported: CURRENT_SCHEMA_VERSION,
                });
            }
            Some(found) if found == CURRENT_SCHEMA_VERSION => {
                tracing::debug!(version = found, "database schema is up to date");
            }
            _ => {
                meta_db.put(
                    &mut wtxn,
                    SCHEMA_VERSION_KEY,
                    &CURRENT_SCHEMA_VERSION.to_le_bytes(),
                )?;
                tracing::info!(version = CURRENT_SCHEMA_VERSION, "initialised database schema");
            }
        }
        wtxn.commit()?;

        tracing::info!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            path: path.to_path_buf(),
            env: Arc::new(env),
            claims_db,
            claim_keys_db,
            user_claims_db,
            meta_db,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// A claim store sharing this environment.
    pub fn claim_store(&self) -> LmdbClaimStore {
        LmdbClaimStore {
            env: Arc::clone(&self.env),
            claims_db: self.claims_db,
            claim_keys_db: self.claim_keys_db,
            user_claims_db: self.user_claims_db,
            meta_db: self.meta_db,
        }
    }

    /// The schema version recorded in the meta database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => decode_u32(bytes),
            None => Ok(0),
        }
    }
}

fn decode_u32(bytes: &[u8]) -> Result<u32, LmdbError> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| {
        LmdbError::Corruption("schema_version has unexpected byte length".to_string())
    })?;
    Ok(u32::from_le_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP_SIZE: usize = 10 * 1024 * 1024;

    #[test]
    fn fresh_environment_records_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        assert_eq!(env.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(env.path(), dir.path());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        LmdbEnvironment::open(&nested, MAP_SIZE).unwrap();
        assert!(nested.join("data.mdb").exists());
    }

    #[test]
    fn refuses_newer_schema() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
            let mut wtxn = env.env().write_txn().unwrap();
            env.meta_db
                .put(
                    &mut wtxn,
                    SCHEMA_VERSION_KEY,
                    &(CURRENT_SCHEMA_VERSION + 1).to_le_bytes(),
                )
                .unwrap();
            wtxn.commit().unwrap();
        }
        let err = LmdbEnvironment::open(dir.path(), MAP_SIZE).err().unwrap();
        assert!(matches!(err, LmdbError::UnsupportedSchema { .. }));
    }
}
