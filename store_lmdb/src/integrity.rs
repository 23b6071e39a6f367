//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before any claim is issued.
//! Every uniqueness-index entry must point at a stored claim whose user and
//! round match the key it was indexed under.

use crate::environment::{LmdbEnvironment, CLAIMS_DB, CLAIM_KEYS_DB, META_DB, USER_CLAIMS_DB};
use crate::LmdbError;
use rewards_store::RewardClaim;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check LMDB database integrity.
///
/// Read failures and dangling index entries are recorded in the report rather
/// than causing a hard error; only failing to start a read transaction does.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.env().read_txn()?;

    for (name, db) in [
        (CLAIMS_DB, env.claims_db),
        (CLAIM_KEYS_DB, env.claim_keys_db),
        (USER_CLAIMS_DB, env.user_claims_db),
        (META_DB, env.meta_db),
    ] {
        report.databases_checked += 1;
        match db.len(&rtxn) {
            Ok(count) => report.total_entries += count,
            Err(e) => report
                .errors
                .push(format!("failed to read database '{}': {}", name, e)),
        }
    }

    let iter = match env.claim_keys_db.iter(&rtxn) {
        Ok(iter) => iter,
        Err(e) => {
            report
                .errors
                .push(format!("failed to scan '{}': {}", CLAIM_KEYS_DB, e));
            return Ok(report);
        }
    };
    for entry in iter {
        let (key, id_bytes) = match entry {
            Ok(kv) => kv,
            Err(e) => {
                report.errors.push(format!("unreadable index entry: {}", e));
                continue;
            }
        };
        let row = match env.claims_db.get(&rtxn, id_bytes) {
            Ok(Some(row)) => row,
            Ok(None) => {
                report
                    .errors
                    .push(format!("index entry {:?} references a missing claim", key));
                continue;
            }
            Err(e) => {
                report.errors.push(format!("failed to read claim: {}", e));
                continue;
            }
        };
        match bincode::deserialize::<RewardClaim>(row) {
            Ok(claim) => {
                let mut expected = claim.user_id.as_str().as_bytes().to_vec();
                expected.push(0x00);
                expected.extend_from_slice(claim.round_id.as_str().as_bytes());
                if expected != key {
                    report.errors.push(format!(
                        "claim {} is indexed under the wrong (user, round) key",
                        claim.id
                    ));
                }
            }
            Err(e) => report
                .errors
                .push(format!("claim row does not decode: {}", e)),
        }
    }

    if report.is_healthy() {
        tracing::debug!(entries = report.total_entries, "integrity check passed");
    } else {
        tracing::warn!(errors = report.errors.len(), "integrity check found problems");
    }
    Ok(report)
}
