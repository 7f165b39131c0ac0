//! Digital marketplace contract.
//!
//! A seller lists a fungible asset at a unit price. Buyers purchase units by
//! attaching a payment of exactly `unitary_price * quantity`; the creator can
//! reprice the listing at any time and finally wind the sale down, sweeping
//! unsold units and accumulated proceeds back to themselves.
//!
//! The contract itself is two global values and five guarded entry points.
//! Cryptographic verification, fee handling, and atomic transfer execution
//! belong to the host, reached through the [`Ledger`] capability; the
//! in-memory implementation in [`testutils`] drives the whole lifecycle in
//! tests without a chain.

mod ledger;
mod types;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;


pub use ledger::Ledger;
pub use types::{
    AccountId, AssetId, AssetTransfer, Error, Event, GlobalState, PayTxn, Payment, PaymentSpec,
    TxnId,
};

/// The deployed marketplace instance.
///
/// State is two scalars; everything else (custody, proceeds, identities) is
/// a ledger fact. Lifecycle: configured at [`create`](Self::create), able to
/// hold the asset after [`opt_into_asset`](Self::opt_into_asset), selling
/// while `unitary_price` is non-zero, gone after [`delete`](Self::delete)
/// consumes the value.
#[derive(Debug)]
pub struct DigitalMarketplace {
    asset_id: AssetId,
    unitary_price: u64,
}

impl DigitalMarketplace {
    /// Deploy the contract, recording the asset on sale and its unit price.
    ///
    /// Runs exactly once per instance; who gets to deploy is the host's
    /// business. No transfer side effects.
    pub fn create(ledger: &mut impl Ledger, asset_id: AssetId, unitary_price: u64) -> Self {
        ledger.publish(Event::Created { asset_id, unitary_price });
        Self { asset_id, unitary_price }
    }

    /// Current `{asset_id, unitary_price}` snapshot for read-only callers.
    pub fn global_state(&self) -> GlobalState {
        GlobalState { asset_id: self.asset_id, unitary_price: self.unitary_price }
    }

    /// Set a new unit price. Zero suspends purchasing.
    ///
    /// # Errors
    /// [`Error::Unauthorized`] when the caller is not the creator; the price
    /// is left unchanged.
    pub fn set_price(&mut self, ledger: &mut impl Ledger, unitary_price: u64) -> Result<(), Error> {
        Self::require_creator(ledger)?;
        self.unitary_price = unitary_price;
        ledger.publish(Event::PriceSet { unitary_price });
        Ok(())
    }

    /// Register the contract account as a holder of the asset on sale.
    ///
    /// `mbr_txn` must pay the contract address exactly the minimum-balance
    /// increase the new holding causes. Calling this again is permitted and
    /// harmless: the zero-amount self-transfer is a no-op once the holding
    /// exists, though each call consumes a fresh reserve payment.
    ///
    /// # Errors
    /// [`Error::Unauthorized`] for non-creator callers;
    /// [`Error::PaymentVerificationFailed`] when the reserve payment does
    /// not name the contract as receiver or misses the required amount.
    pub fn opt_into_asset(
        &mut self,
        ledger: &mut impl Ledger,
        mbr_txn: &PayTxn,
    ) -> Result<(), Error> {
        Self::require_creator(ledger)?;
        let address = ledger.current_contract_address();
        let required = ledger.min_balance() + ledger.asset_opt_in_min_balance();
        ledger.verify_payment(
            mbr_txn,
            &PaymentSpec { sender: None, receiver: address, amount: required },
        )?;
        ledger.send_asset_transfer(AssetTransfer {
            asset: self.asset_id,
            amount: 0,
            from: address,
            to: address,
            close_to: None,
        })?;
        ledger.publish(Event::OptedIn { asset_id: self.asset_id });
        Ok(())
    }

    /// Buy `quantity` units against `buyer_txn`, a payment from the caller
    /// to the contract of exactly `unitary_price * quantity`.
    ///
    /// # Errors
    /// [`Error::NotConfigured`] while the asset or the price is unset;
    /// [`Error::ArithmeticOverflow`] when the total does not fit in 64 bits;
    /// [`Error::PaymentVerificationFailed`] on any payment-field mismatch;
    /// [`Error::InsufficientBalance`] when the contract's custody cannot
    /// cover `quantity`; [`Error::NotOptedIn`] when the buyer cannot hold
    /// the asset.
    pub fn buy(
        &mut self,
        ledger: &mut impl Ledger,
        buyer_txn: &PayTxn,
        quantity: u64,
    ) -> Result<(), Error> {
        if !self.asset_id.is_set() {
            log::debug!("rejecting buy: asset not set");
            return Err(Error::NotConfigured);
        }
        if self.unitary_price == 0 {
            log::debug!("rejecting buy: unitary price not set");
            return Err(Error::NotConfigured);
        }
        let total = self
            .unitary_price
            .checked_mul(quantity)
            .ok_or(Error::ArithmeticOverflow)?;

        let buyer = ledger.caller();
        let address = ledger.current_contract_address();
        ledger.verify_payment(
            buyer_txn,
            &PaymentSpec { sender: Some(buyer), receiver: address, amount: total },
        )?;
        ledger.send_asset_transfer(AssetTransfer {
            asset: self.asset_id,
            amount: quantity,
            from: address,
            to: buyer,
            close_to: None,
        })?;
        ledger.publish(Event::Sale { buyer, quantity, paid: total });
        Ok(())
    }

    /// Wind the sale down: close the contract's remaining asset holding out
    /// to the creator, then close its currency account the same way.
    ///
    /// Consumes the instance, so nothing can be called on it afterwards. On
    /// failure the untouched instance comes back with the error and the sale
    /// continues.
    pub fn delete(self, ledger: &mut impl Ledger) -> Result<(), (Self, Error)> {
        if let Err(err) = Self::require_creator(ledger) {
            return Err((self, err));
        }
        let address = ledger.current_contract_address();
        let creator = ledger.creator();

        let remaining = ledger.asset_balance(address, self.asset_id);
        if let Err(err) = ledger.send_asset_transfer(AssetTransfer {
            asset: self.asset_id,
            amount: remaining,
            from: address,
            to: creator,
            close_to: Some(creator),
        }) {
            return Err((self, err));
        }

        let balance = ledger.balance(address);
        if let Err(err) = ledger.send_payment(Payment {
            from: address,
            to: creator,
            amount: balance,
            close_remainder_to: Some(creator),
        }) {
            return Err((self, err));
        }

        ledger.publish(Event::Deleted {
            creator,
            assets_returned: remaining,
            balance_returned: balance,
        });
        Ok(())
    }

    /// Authorization guard shared by every mutating entry point after
    /// deployment: the caller must be the instance's creator.
    fn require_creator(ledger: &impl Ledger) -> Result<(), Error> {
        let caller = ledger.caller();
        if caller != ledger.creator() {
            log::debug!("rejecting call from {caller:?}: not the creator");
            return Err(Error::Unauthorized);
        }
        Ok(())
    }
}
