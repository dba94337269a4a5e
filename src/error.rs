use thiserror::Error;

use crate::ledger::{AccountId, Amount, Timestamp};

/// Canonical error type for rejected ledger operations.
///
/// Every precondition is checked before the first write, so a caller that
/// sees an error may assume the ledger is unchanged.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unknown account {account}")]
    UnknownAccount { account: AccountId },

    #[error("insufficient funds in account {account}")]
    InsufficientFunds { account: AccountId },

    #[error("transfer of {requested} exceeds transferrable balance {transferrable} of {account}")]
    InsufficientTransferrable {
        account: AccountId,
        requested: Amount,
        transferrable: Amount,
    },

    #[error("grant of {requested} exceeds transferrable balance {transferrable} of granter {granter}")]
    InsufficientGranterBalance {
        granter: AccountId,
        requested: Amount,
        transferrable: Amount,
    },

    #[error("grant schedule out of order: start {start}, cliff {cliff}, vesting {vesting}")]
    InvalidSchedule {
        start: Timestamp,
        cliff: Timestamp,
        vesting: Timestamp,
    },

    #[error("account {beneficiary} already holds the maximum number of active grants")]
    GrantLimitReached { beneficiary: AccountId },

    #[error("no active grant {index} for account {beneficiary}")]
    UnknownGrant { beneficiary: AccountId, index: usize },

    #[error("grant {index} for {beneficiary} was not issued by {caller}")]
    NotGranter {
        caller: AccountId,
        beneficiary: AccountId,
        index: usize,
    },

    #[error("grant {index} for {beneficiary} is not revocable")]
    NotRevocable { beneficiary: AccountId, index: usize },
}
