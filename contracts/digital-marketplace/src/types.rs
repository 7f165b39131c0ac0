//! Identifiers, ledger-transaction parameter types, events, and the error
//! taxonomy shared by the contract and its host ledger.

use serde::{Deserialize, Serialize};

/// Ledger account identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

/// Fungible asset identifier. Zero means "no asset set".
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl AssetId {
    pub const UNSET: AssetId = AssetId(0);

    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

/// Identifier of a transaction submitted to the ledger.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TxnId(pub u64);

/// A payment submitted alongside an application call, handed to the contract
/// as proof of funding. The contract never trusts the declared fields
/// directly; it asks the ledger to verify them via [`PaymentSpec`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PayTxn {
    pub id: TxnId,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub amount: u64,
}

/// Constraints a payment proof must satisfy. `sender` is only checked when
/// present; `receiver` and `amount` always are.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PaymentSpec {
    pub sender: Option<AccountId>,
    pub receiver: AccountId,
    pub amount: u64,
}

/// Parameters of an asset transfer issued by the contract. A zero-amount
/// transfer to oneself registers the sender as a holder of the asset;
/// `close_to` sweeps the sender's remaining holding after the transfer and
/// removes the holding slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AssetTransfer {
    pub asset: AssetId,
    pub amount: u64,
    pub from: AccountId,
    pub to: AccountId,
    pub close_to: Option<AccountId>,
}

/// Parameters of a currency payment issued by the contract.
/// `close_remainder_to` sweeps whatever is left after the payment and closes
/// the paying account.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Payment {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: u64,
    pub close_remainder_to: Option<AccountId>,
}

/// Events published by the contract, one per mutating entry point.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Created { asset_id: AssetId, unitary_price: u64 },
    PriceSet { unitary_price: u64 },
    OptedIn { asset_id: AssetId },
    Sale { buyer: AccountId, quantity: u64, paid: u64 },
    Deleted { creator: AccountId, assets_returned: u64, balance_returned: u64 },
}

/// Read-only snapshot of the contract's global state, the view external
/// callers poll between transactions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GlobalState {
    pub asset_id: AssetId,
    pub unitary_price: u64,
}

/// Everything a call can fail with. Codes are stable; clients match on them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, thiserror::Error)]
#[repr(u32)]
pub enum Error {
    /// Caller is not the contract's creator.
    #[error("caller is not the contract creator")]
    Unauthorized = 1,

    /// A required global value is still zero-valued.
    #[error("a required global value is not set")]
    NotConfigured = 2,

    /// A supplied payment proof does not match the expected sender,
    /// receiver, or amount, or was already consumed.
    #[error("payment does not match the expected sender, receiver, or amount")]
    PaymentVerificationFailed = 3,

    /// `unitary_price * quantity` does not fit in 64 bits.
    #[error("total price does not fit in 64 bits")]
    ArithmeticOverflow = 4,

    /// A transfer primitive cannot satisfy the requested amount.
    #[error("balance is lower than the requested amount")]
    InsufficientBalance = 5,

    /// An asset transfer names an account that is not registered as a
    /// holder of the asset.
    #[error("account is not opted into the asset")]
    NotOptedIn = 6,
}

impl Error {
    /// Numeric code, as surfaced in rejected-transaction results.
    pub fn code(self) -> u32 {
        self as u32
    }
}
