use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::grants::{TokenGrant, MAX_GRANTS_PER_ACCOUNT};

pub type AccountId = String;
pub type Amount = u64;
pub type Timestamp = u64;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SnapshotMetadata {
    /// Count of mutations applied so far.
    pub height: u64,
    /// Timestamp of the last applied mutation.
    pub timestamp: Timestamp,
}

/// Append-only journal entry, one per committed mutation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    Minted {
        to: AccountId,
        amount: Amount,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    GrantIssued {
        granter: AccountId,
        beneficiary: AccountId,
        index: usize,
        value: Amount,
        start: Timestamp,
        cliff: Timestamp,
        vesting: Timestamp,
        revocable: bool,
    },
    GrantRevoked {
        granter: AccountId,
        beneficiary: AccountId,
        index: usize,
        vested: Amount,
        returned: Amount,
    },
}

/// Owned, in-memory ledger state: total balances per account plus the grant
/// records that time-lock portions of them.
///
/// Mutations are all-or-nothing: every precondition is checked before the
/// first write.
#[derive(Default)]
pub struct LedgerState {
    pub meta: SnapshotMetadata,
    pub accounts: BTreeMap<AccountId, Amount>,
    pub grants: BTreeMap<AccountId, Vec<TokenGrant>>,
    pub events: Vec<LedgerEvent>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total balance of `account`, locked portion included.
    pub fn balance_of(&self, account: &str) -> Amount {
        self.accounts.get(account).copied().unwrap_or(0)
    }

    /// All grants ever issued to `account`, tombstones included, so that
    /// indices stay stable.
    pub fn grants_of(&self, account: &str) -> &[TokenGrant] {
        self.grants.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn grant(&self, account: &str, index: usize) -> Option<&TokenGrant> {
        self.grants_of(account).get(index)
    }

    /// Number of active grants held by `account`.
    pub fn grant_count(&self, account: &str) -> usize {
        self.grants_of(account)
            .iter()
            .filter(|g| g.is_active())
            .count()
    }

    /// Portion of the balance allowed to move at `at`: the total balance
    /// minus the locked remainder of every active grant, floored at zero.
    pub fn transferrable_tokens(&self, account: &str, at: Timestamp) -> Amount {
        let locked: Amount = self
            .grants_of(account)
            .iter()
            .filter(|g| g.is_active())
            .map(|g| g.locked(at))
            .sum();
        self.balance_of(account).saturating_sub(locked)
    }

    /// Issue fresh supply to `to`.
    pub fn mint(&mut self, to: &str, amount: Amount, at: Timestamp) {
        self.credit_account(to, amount);
        self.commit(
            LedgerEvent::Minted {
                to: to.to_owned(),
                amount,
            },
            at,
        );
    }

    /// Move `amount` from `from` to `to`, rejecting anything beyond the
    /// transferrable balance at `at`.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Amount,
        at: Timestamp,
    ) -> Result<(), LedgerError> {
        let transferrable = self.transferrable_tokens(from, at);
        if amount > transferrable {
            return Err(LedgerError::InsufficientTransferrable {
                account: from.to_owned(),
                requested: amount,
                transferrable,
            });
        }
        self.debit_account(from, amount)?;
        self.attribute_spend(from, amount, at);
        self.credit_account(to, amount);
        self.commit(
            LedgerEvent::Transfer {
                from: from.to_owned(),
                to: to.to_owned(),
                amount,
            },
            at,
        );
        Ok(())
    }

    /// Issue a grant that is fully vested from the first instant.
    pub fn grant_tokens(
        &mut self,
        granter: &str,
        beneficiary: &str,
        value: Amount,
        at: Timestamp,
    ) -> Result<usize, LedgerError> {
        self.grant_vested_tokens(granter, beneficiary, value, at, at, at, false, at)
    }

    /// Issue a grant releasing `value` between `cliff` and `vesting`, and
    /// return its stable index. The granted amount moves to the beneficiary
    /// immediately; the grant record restricts it from there on.
    #[allow(clippy::too_many_arguments)]
    pub fn grant_vested_tokens(
        &mut self,
        granter: &str,
        beneficiary: &str,
        value: Amount,
        start: Timestamp,
        cliff: Timestamp,
        vesting: Timestamp,
        revocable: bool,
        at: Timestamp,
    ) -> Result<usize, LedgerError> {
        let grant = TokenGrant::new(granter.to_owned(), value, start, cliff, vesting, revocable)?;
        if self.grant_count(beneficiary) >= MAX_GRANTS_PER_ACCOUNT {
            return Err(LedgerError::GrantLimitReached {
                beneficiary: beneficiary.to_owned(),
            });
        }
        // Issuance spends the granter's transferrable balance, like a
        // transfer: locked tokens cannot be re-granted onward.
        let transferrable = self.transferrable_tokens(granter, at);
        if value > transferrable {
            return Err(LedgerError::InsufficientGranterBalance {
                granter: granter.to_owned(),
                requested: value,
                transferrable,
            });
        }
        self.debit_account(granter, value)?;
        self.attribute_spend(granter, value, at);
        self.credit_account(beneficiary, value);
        let slots = self.grants.entry(beneficiary.to_owned()).or_default();
        slots.push(grant);
        let index = slots.len() - 1;
        self.commit(
            LedgerEvent::GrantIssued {
                granter: granter.to_owned(),
                beneficiary: beneficiary.to_owned(),
                index,
                value,
                start,
                cliff,
                vesting,
                revocable,
            },
            at,
        );
        Ok(index)
    }

    /// Revoke the grant at `(beneficiary, index)`. The vested portion stays
    /// with the beneficiary; the unvested remainder returns to the granter
    /// and the grant stops restricting transfers.
    pub fn revoke_token_grant(
        &mut self,
        caller: &str,
        beneficiary: &str,
        index: usize,
        at: Timestamp,
    ) -> Result<(), LedgerError> {
        let (granter, vested, returned) = {
            let grant = self
                .grants
                .get(beneficiary)
                .and_then(|slots| slots.get(index))
                .filter(|g| g.is_active())
                .ok_or_else(|| LedgerError::UnknownGrant {
                    beneficiary: beneficiary.to_owned(),
                    index,
                })?;
            if grant.granter != caller {
                return Err(LedgerError::NotGranter {
                    caller: caller.to_owned(),
                    beneficiary: beneficiary.to_owned(),
                    index,
                });
            }
            if !grant.revocable {
                return Err(LedgerError::NotRevocable {
                    beneficiary: beneficiary.to_owned(),
                    index,
                });
            }
            let vested = grant.vested(at);
            (grant.granter.clone(), vested, grant.value - vested)
        };
        // The unvested remainder never left the beneficiary's balance.
        self.debit_account(beneficiary, returned)?;
        self.credit_account(&granter, returned);
        if let Some(grant) = self
            .grants
            .get_mut(beneficiary)
            .and_then(|slots| slots.get_mut(index))
        {
            grant.revoked = true;
        }
        self.commit(
            LedgerEvent::GrantRevoked {
                granter,
                beneficiary: beneficiary.to_owned(),
                index,
                vested,
                returned,
            },
            at,
        );
        Ok(())
    }

    fn credit_account(&mut self, account: &str, amount: Amount) {
        *self.accounts.entry(account.to_owned()).or_default() += amount;
    }

    fn debit_account(&mut self, account: &str, amount: Amount) -> Result<(), LedgerError> {
        let balance = self
            .accounts
            .get_mut(account)
            .ok_or_else(|| LedgerError::UnknownAccount {
                account: account.to_owned(),
            })?;
        if *balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: account.to_owned(),
            });
        }
        *balance -= amount;
        Ok(())
    }

    /// Book an outgoing spend against the account's grants, oldest first, up
    /// to each grant's vested-but-untransferred capacity. Whatever is left
    /// was ordinary non-grant balance.
    fn attribute_spend(&mut self, account: &str, amount: Amount, at: Timestamp) {
        let mut remaining = amount;
        if let Some(slots) = self.grants.get_mut(account) {
            for grant in slots.iter_mut().filter(|g| g.is_active()) {
                if remaining == 0 {
                    break;
                }
                let take = grant.spendable(at).min(remaining);
                grant.transferred += take;
                remaining -= take;
            }
        }
    }

    fn commit(&mut self, event: LedgerEvent, at: Timestamp) {
        self.events.push(event);
        self.meta.height += 1;
        self.meta.timestamp = at;
    }
}
