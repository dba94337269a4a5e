//! Vesting-aware token ledger.
//!
//! This crate exposes the accounting core for token grants: account balances
//! where a sub-portion of a balance is time-locked by per-grant release
//! schedules, and only the unlocked portion may move.
//!
//! * [`ledger`] — account balances, vesting-restricted transfers, and the
//!   grant lifecycle (issuance and revocation), with an append-only event
//!   journal.
//! * [`grants`] — the grant record and its cliff + linear release arithmetic.
//! * [`snapshot`] — serializable copies of the committed state carrying a
//!   Sha256 commitment root.
//!
//! Every time-sensitive operation takes an explicit timestamp parameter; the
//! ledger never reads a wall clock, so the caller owns the notion of "now"
//! and the core stays deterministic under test.

pub mod grants;
pub mod ledger;
pub mod snapshot;

mod error;

pub use error::LedgerError;
