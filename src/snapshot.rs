use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::grants::TokenGrant;
use crate::ledger::{AccountId, Amount, LedgerEvent, LedgerState, SnapshotMetadata};

/// Serializable copy of the committed ledger state plus a commitment root
/// over every balance and grant record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub meta: SnapshotMetadata,
    pub accounts: BTreeMap<AccountId, Amount>,
    pub grants: BTreeMap<AccountId, Vec<TokenGrant>>,
    pub events: Vec<LedgerEvent>,
    pub merkle_root: [u8; 32],
}

impl LedgerSnapshot {
    /// Render the commitment root for external consumers.
    pub fn root_hex(&self) -> String {
        hex::encode(self.merkle_root)
    }
}

impl LedgerState {
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            meta: self.meta.clone(),
            accounts: self.accounts.clone(),
            grants: self.grants.clone(),
            events: self.events.clone(),
            merkle_root: compute_merkle_root(&self.accounts, &self.grants),
        }
    }
}

fn compute_merkle_root(
    accounts: &BTreeMap<AccountId, Amount>,
    grants: &BTreeMap<AccountId, Vec<TokenGrant>>,
) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();
    for (account, balance) in accounts {
        let mut hasher = Sha256::new();
        hasher.update(b"acct");
        hasher.update(account.as_bytes());
        hasher.update(balance.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    for (beneficiary, slots) in grants {
        for grant in slots {
            let mut hasher = Sha256::new();
            hasher.update(b"grant");
            hasher.update(beneficiary.as_bytes());
            hasher.update(grant.granter.as_bytes());
            hasher.update(grant.value.to_le_bytes());
            hasher.update(grant.start.to_le_bytes());
            hasher.update(grant.cliff.to_le_bytes());
            hasher.update(grant.vesting.to_le_bytes());
            hasher.update(grant.transferred.to_le_bytes());
            hasher.update([grant.revocable as u8, grant.revoked as u8]);
            leaves.push(hasher.finalize().into());
        }
    }
    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"grant-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            if chunk.len() == 2 {
                hasher.update(chunk[1]);
            } else {
                hasher.update(chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Timestamp;

    const T0: Timestamp = 1_000;

    fn populated() -> LedgerState {
        let mut ledger = LedgerState::new();
        ledger.mint("granter", 100, T0);
        ledger
            .grant_vested_tokens("granter", "receiver", 50, T0, T0 + 1, T0 + 2, true, T0)
            .unwrap();
        ledger
    }

    #[test]
    fn roots_are_deterministic() {
        let ledger = populated();
        assert_eq!(ledger.snapshot().merkle_root, ledger.snapshot().merkle_root);
    }

    #[test]
    fn roots_change_when_state_changes() {
        let mut ledger = populated();
        let before = ledger.snapshot().merkle_root;
        ledger.transfer("granter", "other", 10, T0).unwrap();
        assert_ne!(before, ledger.snapshot().merkle_root);
    }

    #[test]
    fn empty_ledger_has_a_fixed_root() {
        let a = LedgerState::new().snapshot();
        let b = LedgerState::new().snapshot();
        assert_eq!(a.merkle_root, b.merkle_root);
        assert_eq!(a.root_hex().len(), 64);
    }

    #[test]
    fn snapshots_round_trip_through_json() {
        let snapshot = populated().snapshot();
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: LedgerSnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }
}
