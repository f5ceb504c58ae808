use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};

use crate::domain::account::{Account, AccountId};
use crate::domain::ports::{AccountStore, LedgerStore};
use crate::domain::transaction::{LedgerEntry, TransactionId, TransactionKind};
use crate::error::{BalanceError, Result};

/// Column Family for ledger entries, keyed by entry id.
pub const CF_ENTRIES: &str = "entries";
/// Column Family mapping gateway charge ids to payment entry ids.
pub const CF_CHARGE_INDEX: &str = "charge_index";
/// Column Family recording committed correlation keys.
pub const CF_CORRELATION_KEYS: &str = "correlation_keys";
/// Column Family for seller accounts, keyed by account id.
pub const CF_ACCOUNTS: &str = "accounts";

/// A durable store implementation using RocksDB.
///
/// Entries and accounts are stored as JSON in separate Column Families. The
/// pair write goes through a single `WriteBatch`, so both halves commit or
/// neither does.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_ENTRIES, Options::default()),
            ColumnFamilyDescriptor::new(CF_CHARGE_INDEX, Options::default()),
            ColumnFamilyDescriptor::new(CF_CORRELATION_KEYS, Options::default()),
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs)
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| BalanceError::StoreFailure(format!("column family {name} not found")))
    }

    /// Records a single entry outside the pair contract. This is how
    /// upstream payment entries reach the store; payment entries with a
    /// charge id are indexed for charge-based lookup.
    pub fn insert(&self, entry: &LedgerEntry) -> Result<()> {
        let entries = self.cf(CF_ENTRIES)?;
        let value = encode(entry)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&entries, entry.id.to_string(), value);
        if entry.kind == TransactionKind::Payment
            && let Some(charge_id) = &entry.charge_id
        {
            let charges = self.cf(CF_CHARGE_INDEX)?;
            batch.put_cf(&charges, charge_id, entry.id.to_string());
        }
        self.db
            .write(batch)
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))
    }

    pub fn get(&self, id: TransactionId) -> Result<Option<LedgerEntry>> {
        let entries = self.cf(CF_ENTRIES)?;
        let bytes = self
            .db
            .get_cf(&entries, id.to_string())
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    pub fn put_account(&self, account: &Account) -> Result<()> {
        let accounts = self.cf(CF_ACCOUNTS)?;
        let value = serde_json::to_vec(account)
            .map_err(|e| BalanceError::StoreFailure(format!("serialization error: {e}")))?;
        self.db
            .put_cf(&accounts, account.id.to_string(), value)
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))
    }
}

fn encode(entry: &LedgerEntry) -> Result<Vec<u8>> {
    serde_json::to_vec(entry)
        .map_err(|e| BalanceError::StoreFailure(format!("serialization error: {e}")))
}

fn decode(bytes: &[u8]) -> Result<LedgerEntry> {
    serde_json::from_slice(bytes)
        .map_err(|e| BalanceError::StoreFailure(format!("deserialization error: {e}")))
}

#[async_trait]
impl LedgerStore for RocksDbStore {
    async fn insert_pair(&self, outgoing: LedgerEntry, incoming: LedgerEntry) -> Result<()> {
        let key = outgoing.balance_correlation_key.ok_or_else(|| {
            BalanceError::StoreFailure("pair entries carry no correlation key".to_owned())
        })?;
        if incoming.balance_correlation_key != Some(key) {
            return Err(BalanceError::StoreFailure(
                "pair entries do not share a correlation key".to_owned(),
            ));
        }

        let correlation_keys = self.cf(CF_CORRELATION_KEYS)?;
        let committed = self
            .db
            .get_cf(&correlation_keys, key.to_string())
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))?;
        if committed.is_some() {
            return Err(BalanceError::StoreFailure(format!(
                "correlation key {key} already committed"
            )));
        }

        let entries = self.cf(CF_ENTRIES)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&entries, outgoing.id.to_string(), encode(&outgoing)?);
        batch.put_cf(&entries, incoming.id.to_string(), encode(&incoming)?);
        batch.put_cf(&correlation_keys, key.to_string(), b"");
        self.db
            .write(batch)
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))
    }

    async fn find_payment_by_charge(&self, charge_id: &str) -> Result<Option<LedgerEntry>> {
        let charges = self.cf(CF_CHARGE_INDEX)?;
        let entry_id = self
            .db
            .get_cf(&charges, charge_id)
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))?;
        let Some(entry_id) = entry_id else {
            return Ok(None);
        };

        let entries = self.cf(CF_ENTRIES)?;
        let bytes = self
            .db
            .get_cf(&entries, entry_id)
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let accounts = self.cf(CF_ACCOUNTS)?;
        let bytes = self
            .db
            .get_cf(&accounts, id.to_string())
            .map_err(|e| BalanceError::StoreFailure(e.to_string()))?;
        bytes
            .map(|bytes| {
                serde_json::from_slice(&bytes).map_err(|e| {
                    BalanceError::StoreFailure(format!("deserialization error: {e}"))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::account::Currency;
    use crate::domain::transaction::CorrelationKey;

    fn payment_entry(charge_id: &str) -> LedgerEntry {
        LedgerEntry {
            id: TransactionId::generate(),
            kind: TransactionKind::Payment,
            account: None,
            currency: Currency::new("usd"),
            amount: 1000,
            account_currency: Currency::new("usd"),
            account_amount: 1000,
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

    fn balance_entry(key: CorrelationKey, amount: i64) -> LedgerEntry {
        LedgerEntry {
            kind: TransactionKind::Balance,
            charge_id: None,
            balance_correlation_key: Some(key),
            amount,
            account_amount: amount,
            ..payment_entry("unused")
        }
    }

    #[tokio::test]
    async fn pair_round_trips_durably() {
        let dir = tempfile::tempdir().unwrap();
        let key = CorrelationKey::generate();
        let outgoing = balance_entry(key, -1000);
        let incoming = balance_entry(key, 1000);
        let ids = (outgoing.id, incoming.id);

        {
            let store = RocksDbStore::open(dir.path()).unwrap();
            store.insert_pair(outgoing, incoming).await.unwrap();
        }

        // Reopen to check the pair survived the process.
        let store = RocksDbStore::open(dir.path()).unwrap();
        assert!(store.get(ids.0).unwrap().is_some());
        assert!(store.get(ids.1).unwrap().is_some());
    }

    #[tokio::test]
    async fn charge_index_finds_payment_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let payment = payment_entry("ch_123");
        store.insert(&payment).unwrap();

        let found = store.find_payment_by_charge("ch_123").await.unwrap();
        assert_eq!(found.map(|entry| entry.id), Some(payment.id));
        assert!(
            store
                .find_payment_by_charge("ch_missing")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_correlation_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let key = CorrelationKey::generate();
        store
            .insert_pair(balance_entry(key, -1000), balance_entry(key, 1000))
            .await
            .unwrap();
        let result = store
            .insert_pair(balance_entry(key, -500), balance_entry(key, 500))
            .await;
        assert!(matches!(result, Err(BalanceError::StoreFailure(_))));
    }

    #[tokio::test]
    async fn account_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let account = Account::new(AccountId::generate(), Currency::new("eur"));
        store.put_account(&account).unwrap();

        assert_eq!(
            AccountStore::get(&store, account.id).await.unwrap(),
            Some(account)
        );
    }
}
