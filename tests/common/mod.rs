use balance_ledger::application::engine::BalanceEngine;
use balance_ledger::domain::account::{Account, AccountId, Currency};
use balance_ledger::domain::transaction::{LedgerEntry, TransactionId, TransactionKind};
use balance_ledger::infrastructure::in_memory::{
    InMemoryAccountStore, InMemoryLedgerStore, InMemoryPaymentGateway, NoopReviewGate,
};
use chrono::Utc;

/// An engine wired to in-memory adapters, with handles kept so tests can
/// seed and inspect the stores behind it.
#[allow(dead_code)]
pub struct Harness {
    pub engine: BalanceEngine,
    pub ledger: InMemoryLedgerStore,
    pub accounts: InMemoryAccountStore,
    pub gateway: InMemoryPaymentGateway,
}

pub fn harness() -> Harness {
    let ledger = InMemoryLedgerStore::new();
    let accounts = InMemoryAccountStore::new();
    let gateway = InMemoryPaymentGateway::new();
    let engine = BalanceEngine::new(
        Box::new(ledger.clone()),
        Box::new(accounts.clone()),
        Box::new(NoopReviewGate),
        Box::new(gateway.clone()),
    );
    Harness {
        engine,
        ledger,
        accounts,
        gateway,
    }
}

/// A payment entry as the upstream payment pipeline would have recorded it.
pub fn payment_entry(charge_id: &str, currency: &str, amount: i64) -> LedgerEntry {
    LedgerEntry {
        id: TransactionId::generate(),
        kind: TransactionKind::Payment,
        account: None,
        currency: Currency::new(currency),
        amount,
        account_currency: Currency::new(currency),
        account_amount: amount,
        tax_amount: 0,
        charge_id: Some(charge_id.to_owned()),
        balance_correlation_key: None,
        pledge_id: None,
        subscription_id: None,
        issue_reward_id: None,
        payment_transaction_id: None,
        balance_reversal_transaction_id: None,
        created_at: Utc::now(),
    }
}

pub fn seller(currency: &str) -> Account {
    Account::new(AccountId::generate(), Currency::new(currency))
}
