//! The host-ledger capability the contract runs against.
//!
//! Entry points receive the ledger the way the contract would receive its
//! execution environment on-chain: identity of the current caller, identity
//! of the deployer, the contract's own account, protocol parameters, balance
//! queries, and the verification/transfer primitives. Implementations must
//! keep each primitive all-or-nothing; the contract orders its checks so
//! that no primitive runs until every precondition has passed.

use crate::types::{
    AccountId, AssetId, AssetTransfer, Error, Event, PayTxn, Payment, PaymentSpec,
};

pub trait Ledger {
    /// Sender of the current application call.
    fn caller(&self) -> AccountId;

    /// Identity that deployed the contract instance.
    fn creator(&self) -> AccountId;

    /// The contract instance's own ledger account.
    fn current_contract_address(&self) -> AccountId;

    /// Base minimum currency reserve every account must keep.
    fn min_balance(&self) -> u64;

    /// Additional reserve required per asset type an account holds.
    fn asset_opt_in_min_balance(&self) -> u64;

    /// Currency balance of `account` (zero for unknown accounts).
    fn balance(&self, account: AccountId) -> u64;

    /// Units of `asset` held by `account` (zero when not opted in).
    fn asset_balance(&self, account: AccountId, asset: AssetId) -> u64;

    /// Check `txn` against `expected` and settle it. A proof settles at most
    /// once; verifying it again, or failing any field constraint, rejects
    /// the call with [`Error::PaymentVerificationFailed`] and moves nothing.
    fn verify_payment(&mut self, txn: &PayTxn, expected: &PaymentSpec) -> Result<(), Error>;

    /// Execute an asset transfer. Rejects rather than partially executes.
    fn send_asset_transfer(&mut self, transfer: AssetTransfer) -> Result<(), Error>;

    /// Execute a currency payment. Rejects rather than partially executes.
    fn send_payment(&mut self, payment: Payment) -> Result<(), Error>;

    /// Record a contract event for off-chain consumers.
    fn publish(&mut self, event: Event);
}
