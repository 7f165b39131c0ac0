//! In-memory host ledger for exercising the contract without a chain.
//!
//! Reproduces the platform behavior the contract relies on: accounts carry a
//! currency balance; an account can hold an asset only after opting in (a
//! zero-amount self-transfer registers the holding); payment proofs settle
//! exactly once, at verification time; `close_to` sweeps remainders and
//! removes the slot being closed. Fees are not charged.
//!
//! Transactions the harness submits around a call (funding transfers,
//! payments) are applied directly. To get the platform's group-commit
//! behavior for a whole application call, wrap it in [`TestLedger::atomic`].

use std::collections::HashMap;

use serde::Deserialize;

use crate::ledger::Ledger;
use crate::types::{
    AccountId, AssetId, AssetTransfer, Error, Event, PayTxn, Payment, PaymentSpec, TxnId,
};

/// Protocol parameters of the simulated ledger, in microcurrency.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LedgerParams {
    pub min_balance: u64,
    pub asset_opt_in_min_balance: u64,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self { min_balance: 100_000, asset_opt_in_min_balance: 100_000 }
    }
}

#[derive(Copy, Clone, Debug)]
struct SubmittedPayment {
    txn: PayTxn,
    settled: bool,
}

/// Mutable bookkeeping, snapshotted by [`TestLedger::atomic`].
#[derive(Clone, Debug, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, u64>,
    // Presence of a key means the account is opted into the asset.
    holdings: HashMap<(AccountId, AssetId), u64>,
    payments: HashMap<TxnId, SubmittedPayment>,
    events: Vec<Event>,
}

/// An in-memory ledger hosting a single deployed contract instance.
#[derive(Debug)]
pub struct TestLedger {
    params: LedgerParams,
    state: LedgerState,
    caller: AccountId,
    creator: AccountId,
    contract_address: AccountId,
    next_account: u64,
    next_asset: u64,
    next_txn: u64,
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedger {
    pub fn new() -> Self {
        Self::with_params(LedgerParams::default())
    }

    pub fn with_params(params: LedgerParams) -> Self {
        Self {
            params,
            state: LedgerState::default(),
            caller: AccountId(0),
            creator: AccountId(0),
            contract_address: AccountId(0),
            next_account: 0,
            next_asset: 0,
            next_txn: 0,
        }
    }

    /// Create an account funded with `funding` microcurrency.
    pub fn generate_account(&mut self, funding: u64) -> AccountId {
        self.next_account += 1;
        let account = AccountId(self.next_account);
        self.state.accounts.insert(account, funding);
        account
    }

    /// Create a fungible asset, crediting the entire supply to `creator`
    /// (who is thereby opted in).
    pub fn create_asset(&mut self, creator: AccountId, total: u64) -> AssetId {
        self.next_asset += 1;
        let asset = AssetId(self.next_asset);
        self.state.holdings.insert((creator, asset), total);
        asset
    }

    /// Deploy the contract instance: allocate its account, record `creator`
    /// as its deployer, and make the deployer the current caller. Returns
    /// the contract's address.
    pub fn deploy(&mut self, creator: AccountId) -> AccountId {
        let address = self.generate_account(0);
        self.creator = creator;
        self.contract_address = address;
        self.caller = creator;
        address
    }

    /// Set the sender of subsequent application calls.
    pub fn set_caller(&mut self, caller: AccountId) {
        self.caller = caller;
    }

    /// Register `account` as a holder of `asset`. No-op when already held.
    pub fn opt_in(&mut self, account: AccountId, asset: AssetId) {
        self.state.holdings.entry((account, asset)).or_insert(0);
    }

    pub fn is_opted_in(&self, account: AccountId, asset: AssetId) -> bool {
        self.state.holdings.contains_key(&(account, asset))
    }

    pub fn account_exists(&self, account: AccountId) -> bool {
        self.state.accounts.contains_key(&account)
    }

    /// Move asset units between accounts outside the contract, e.g. funding
    /// the sale from the seller's supply.
    pub fn transfer_asset(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: AssetId,
        amount: u64,
    ) -> Result<(), Error> {
        self.apply_asset_transfer(AssetTransfer { asset, amount, from, to, close_to: None })
    }

    /// Submit a payment from `from` to `to`. The transfer settles when the
    /// contract verifies the returned proof; an unverified proof moves
    /// nothing.
    pub fn pay(&mut self, from: AccountId, to: AccountId, amount: u64) -> PayTxn {
        self.next_txn += 1;
        let txn = PayTxn { id: TxnId(self.next_txn), sender: from, receiver: to, amount };
        self.state.payments.insert(txn.id, SubmittedPayment { txn, settled: false });
        txn
    }

    /// Run `f` as one transaction group: every ledger effect it made is
    /// rolled back if it fails, the way the platform unwinds a failed group.
    pub fn atomic<T>(
        &mut self,
        f: impl FnOnce(&mut TestLedger) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let checkpoint = self.state.clone();
        let result = f(self);
        if result.is_err() {
            self.state = checkpoint;
        }
        result
    }

    /// Events published by the contract so far.
    pub fn events(&self) -> &[Event] {
        &self.state.events
    }

    fn asset_exists(&self, asset: AssetId) -> bool {
        asset.is_set() && asset.0 <= self.next_asset
    }

    fn apply_asset_transfer(&mut self, transfer: AssetTransfer) -> Result<(), Error> {
        if !self.asset_exists(transfer.asset) {
            return Err(Error::NotOptedIn);
        }
        let slot = (transfer.from, transfer.asset);

        // Opt-in: a zero-amount self-transfer registers the holding (and is
        // a no-op for an existing holder).
        if transfer.from == transfer.to && transfer.amount == 0 && transfer.close_to.is_none() {
            self.state.holdings.entry(slot).or_insert(0);
            return Ok(());
        }

        // All checks before any mutation.
        let held = *self.state.holdings.get(&slot).ok_or(Error::NotOptedIn)?;
        if held < transfer.amount {
            log::debug!(
                "asset transfer rejected: {:?} holds {held}, needs {}",
                transfer.from,
                transfer.amount
            );
            return Err(Error::InsufficientBalance);
        }
        if !self.state.holdings.contains_key(&(transfer.to, transfer.asset)) {
            return Err(Error::NotOptedIn);
        }
        if let Some(close_to) = transfer.close_to {
            if close_to != transfer.to
                && !self.state.holdings.contains_key(&(close_to, transfer.asset))
            {
                return Err(Error::NotOptedIn);
            }
        }

        self.state.holdings.insert(slot, held - transfer.amount);
        *self.state.holdings.get_mut(&(transfer.to, transfer.asset)).unwrap() += transfer.amount;
        if let Some(close_to) = transfer.close_to {
            let remainder = self.state.holdings.remove(&slot).unwrap_or(0);
            *self.state.holdings.entry((close_to, transfer.asset)).or_insert(0) += remainder;
        }
        Ok(())
    }
}

impl Ledger for TestLedger {
    fn caller(&self) -> AccountId {
        self.caller
    }

    fn creator(&self) -> AccountId {
        self.creator
    }

    fn current_contract_address(&self) -> AccountId {
        self.contract_address
    }

    fn min_balance(&self) -> u64 {
        self.params.min_balance
    }

    fn asset_opt_in_min_balance(&self) -> u64 {
        self.params.asset_opt_in_min_balance
    }

    fn balance(&self, account: AccountId) -> u64 {
        self.state.accounts.get(&account).copied().unwrap_or(0)
    }

    fn asset_balance(&self, account: AccountId, asset: AssetId) -> u64 {
        self.state.holdings.get(&(account, asset)).copied().unwrap_or(0)
    }

    fn verify_payment(&mut self, txn: &PayTxn, expected: &PaymentSpec) -> Result<(), Error> {
        let submitted = self
            .state
            .payments
            .get(&txn.id)
            .ok_or(Error::PaymentVerificationFailed)?;
        if submitted.settled {
            log::debug!("payment {:?} already settled", txn.id);
            return Err(Error::PaymentVerificationFailed);
        }
        // The proof handed to the contract must be the transaction that was
        // actually submitted; forged fields fail here.
        let declared = submitted.txn;
        if declared != *txn {
            return Err(Error::PaymentVerificationFailed);
        }

        if let Some(sender) = expected.sender {
            if declared.sender != sender {
                return Err(Error::PaymentVerificationFailed);
            }
        }
        if declared.receiver != expected.receiver || declared.amount != expected.amount {
            log::debug!(
                "payment {:?} mismatch: declared {}/{:?}, expected {}/{:?}",
                txn.id,
                declared.amount,
                declared.receiver,
                expected.amount,
                expected.receiver
            );
            return Err(Error::PaymentVerificationFailed);
        }

        let funds = self.balance(declared.sender);
        if funds < declared.amount {
            return Err(Error::InsufficientBalance);
        }
        self.state.accounts.insert(declared.sender, funds - declared.amount);
        *self.state.accounts.entry(declared.receiver).or_insert(0) += declared.amount;
        self.state.payments.get_mut(&txn.id).unwrap().settled = true;
        Ok(())
    }

    fn send_asset_transfer(&mut self, transfer: AssetTransfer) -> Result<(), Error> {
        self.apply_asset_transfer(transfer)
    }

    fn send_payment(&mut self, payment: Payment) -> Result<(), Error> {
        let funds = self.balance(payment.from);
        if funds < payment.amount {
            return Err(Error::InsufficientBalance);
        }
        self.state.accounts.insert(payment.from, funds - payment.amount);
        *self.state.accounts.entry(payment.to).or_insert(0) += payment.amount;
        if let Some(close_to) = payment.close_remainder_to {
            let remainder = self.state.accounts.remove(&payment.from).unwrap_or(0);
            *self.state.accounts.entry(close_to).or_insert(0) += remainder;
        }
        Ok(())
    }

    fn publish(&mut self, event: Event) {
        self.state.events.push(event);
    }
}
