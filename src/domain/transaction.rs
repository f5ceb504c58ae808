use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::account::{AccountId, Currency};

/// Entry kinds stored in the ledger.
///
/// This crate only writes `Balance` entries; `Payment` entries are recorded
/// upstream when a charge settles and are read here to resolve the source of
/// a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Payment,
    Balance,
}

/// Identifier of a ledger entry, generated before persistence so the two
/// halves of a pair can reference each other's relations pre-commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Opaque token shared by exactly the two entries of one balanced pair.
///
/// A 128-bit random value: collisions across pairs must be negligible, and
/// the store rejects a duplicate outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationKey(Uuid);

impl CorrelationKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PledgeId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueRewardId(pub Uuid);

/// References tying a transfer back to the record that funded it.
///
/// Zero or more may be set; no mutual exclusion is enforced. Reversal
/// entries copy these verbatim from the original outgoing entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceContext {
    pub pledge_id: Option<PledgeId>,
    pub subscription_id: Option<SubscriptionId>,
    pub issue_reward_id: Option<IssueRewardId>,
}

/// One row of the ledger. Immutable once created: correction is modeled
/// only by an offsetting reversal pair, never by mutation or deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: TransactionId,
    pub kind: TransactionKind,
    /// `None` means the platform's pooled account. Exactly one entry of a
    /// pair has `None`.
    pub account: Option<AccountId>,
    /// Nominal currency and signed amount in minor units.
    pub currency: Currency,
    pub amount: i64,
    /// The amount expressed in the destination account's native currency.
    /// Any conversion was applied upstream; this crate never recomputes it.
    pub account_currency: Currency,
    pub account_amount: i64,
    /// Always 0 for balance entries; payment entries carry real tax upstream.
    pub tax_amount: i64,
    /// Gateway charge reference, set on payment entries only. Lookup key
    /// for charge-based source resolution.
    pub charge_id: Option<String>,
    /// `None` on payment entries; balance entries always carry one.
    pub balance_correlation_key: Option<CorrelationKey>,
    pub pledge_id: Option<PledgeId>,
    pub subscription_id: Option<SubscriptionId>,
    pub issue_reward_id: Option<IssueRewardId>,
    /// The originating payment entry. Set on forward-transfer pairs, never
    /// on reversals.
    pub payment_transaction_id: Option<TransactionId>,
    /// On a reversal entry, the *other* half of the pair being reversed.
    pub balance_reversal_transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
}

/// The two halves of one balanced movement, in `(outgoing, incoming)` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePair {
    pub outgoing: LedgerEntry,
    pub incoming: LedgerEntry,
}

impl BalancePair {
    /// The correlation key both halves share.
    pub fn correlation_key(&self) -> Option<CorrelationKey> {
        self.outgoing.balance_correlation_key
    }

    /// Whether the pair nets to zero in both currency views.
    pub fn nets_to_zero(&self) -> bool {
        self.outgoing.amount + self.incoming.amount == 0
            && self.outgoing.account_amount + self.incoming.account_amount == 0
    }
}
