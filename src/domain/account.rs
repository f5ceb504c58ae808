use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BalanceError;

/// Identifier of a seller's connected account.
///
/// Generated client-side so entries can reference an account before any
/// insert commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Currency code, normalized to lowercase at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A positive transfer amount in minor units.
///
/// Ledger entries store raw signed `i64`s; this type guards the engine's
/// entry points so a zero or negative request cannot produce a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, BalanceError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(BalanceError::PreconditionViolation(format!(
                "transfer amount must be positive, got {value}"
            )))
        }
    }

    /// The amount in minor units.
    pub fn minor(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = BalanceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A seller's connected account, as resolved through the account store.
///
/// `currency` is the account's native currency, consulted when building
/// reversal entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub currency: Currency,
}

impl Account {
    pub fn new(id: AccountId, currency: Currency) -> Self {
        Self { id, currency }
    }
}
