use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::account::{Account, AccountId};
use crate::domain::gateway::PaymentIntent;
use crate::domain::ports::{AccountStore, LedgerStore, PaymentGateway, ReviewGate};
use crate::domain::transaction::{
    CorrelationKey, LedgerEntry, TransactionId, TransactionKind,
};
use crate::error::{BalanceError, Result};

#[derive(Default)]
struct LedgerState {
    entries: HashMap<TransactionId, LedgerEntry>,
    committed_keys: HashSet<CorrelationKey>,
}

/// A thread-safe in-memory ledger store.
///
/// Uses `Arc<RwLock<..>>` for shared concurrent access. The pair write runs
/// under a single write lock, so a half-written pair is never observable.
/// Ideal for tests and small embedders where durability is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    inner: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a single entry outside the pair contract. This is how
    /// upstream payment entries reach the store in tests and embedders.
    pub async fn insert(&self, entry: LedgerEntry) {
        let mut state = self.inner.write().await;
        state.entries.insert(entry.id, entry);
    }

    pub async fn get(&self, id: TransactionId) -> Option<LedgerEntry> {
        let state = self.inner.read().await;
        state.entries.get(&id).cloned()
    }

    pub async fn entry_count(&self) -> usize {
        let state = self.inner.read().await;
        state.entries.len()
    }

    /// All entries sharing a correlation key.
    pub async fn pair_by_correlation_key(&self, key: CorrelationKey) -> Vec<LedgerEntry> {
        let state = self.inner.read().await;
        state
            .entries
            .values()
            .filter(|entry| entry.balance_correlation_key == Some(key))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_pair(&self, outgoing: LedgerEntry, incoming: LedgerEntry) -> Result<()> {
        let mut state = self.inner.write().await;

        let key = outgoing.balance_correlation_key.ok_or_else(|| {
            BalanceError::StoreFailure("pair entries carry no correlation key".to_owned())
        })?;
        if incoming.balance_correlation_key != Some(key) {
            return Err(BalanceError::StoreFailure(
                "pair entries do not share a correlation key".to_owned(),
            ));
        }
        if !state.committed_keys.insert(key) {
            return Err(BalanceError::StoreFailure(format!(
                "correlation key {key} already committed"
            )));
        }

        state.entries.insert(outgoing.id, outgoing);
        state.entries.insert(incoming.id, incoming);
        Ok(())
    }

    async fn find_payment_by_charge(&self, charge_id: &str) -> Result<Option<LedgerEntry>> {
        let state = self.inner.read().await;
        Ok(state
            .entries
            .values()
            .find(|entry| {
                entry.kind == TransactionKind::Payment
                    && entry.charge_id.as_deref() == Some(charge_id)
            })
            .cloned())
    }
}

/// A thread-safe in-memory account store.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, account: Account) {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id, account);
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }
}

/// Review gate for embedders with no review policy. Never flags anything.
#[derive(Default, Clone)]
pub struct NoopReviewGate;

#[async_trait]
impl ReviewGate for NoopReviewGate {
    async fn check_review_threshold(&self, _account: &Account) -> Result<()> {
        Ok(())
    }
}

/// A payment gateway backed by pre-registered intents. Unknown identifiers
/// surface as gateway errors, like an upstream 404 would.
#[derive(Default, Clone)]
pub struct InMemoryPaymentGateway {
    intents: Arc<RwLock<HashMap<String, PaymentIntent>>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, intent: PaymentIntent) {
        let mut intents = self.intents.write().await;
        intents.insert(intent.id.clone(), intent);
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent> {
        let intents = self.intents.read().await;
        intents.get(payment_intent_id).cloned().ok_or_else(|| {
            BalanceError::Gateway(format!("no such payment intent {payment_intent_id}"))
        })
    }
}
