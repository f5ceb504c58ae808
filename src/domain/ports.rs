use async_trait::async_trait;

use crate::domain::account::{Account, AccountId};
use crate::domain::gateway::PaymentIntent;
use crate::domain::transaction::LedgerEntry;
use crate::error::Result;

pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type AccountStoreBox = Box<dyn AccountStore>;
pub type ReviewGateBox = Box<dyn ReviewGate>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;

/// Durable, append-mostly home of ledger entries.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persists both halves of a balanced pair, all-or-nothing. A partially
    /// persisted pair must never be observable by any concurrent reader.
    async fn insert_pair(&self, outgoing: LedgerEntry, incoming: LedgerEntry) -> Result<()>;

    /// Point lookup of the payment entry recorded for a gateway charge.
    async fn find_payment_by_charge(&self, charge_id: &str) -> Result<Option<LedgerEntry>>;
}

/// Resolves seller accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, id: AccountId) -> Result<Option<Account>>;
}

/// Decides whether an account needs manual review after balance accrues.
///
/// Invoked post-commit as a side effect; the engine logs its error and
/// never lets it affect an already-committed transfer.
#[async_trait]
pub trait ReviewGate: Send + Sync {
    async fn check_review_threshold(&self, account: &Account) -> Result<()>;
}

/// Client for the payment gateway that settled the original charge.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent>;
}
