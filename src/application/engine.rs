use chrono::Utc;
use tracing::{debug, error};

use crate::domain::account::{Account, Amount, Currency};
use crate::domain::ports::{AccountStoreBox, LedgerStoreBox, PaymentGatewayBox, ReviewGateBox};
use crate::domain::transaction::{
    BalanceContext, BalancePair, CorrelationKey, LedgerEntry, TransactionId, TransactionKind,
};
use crate::error::{BalanceError, Result};

/// How `create_reversal_balance` treats a reversal denominated in a currency
/// other than the seller account's native currency.
///
/// The account-side amount of a reversal reuses the numeric magnitude of the
/// requested amount; no conversion rate is applied in either mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReversalCurrencyMode {
    /// Carry the magnitude through even when the currencies differ.
    #[default]
    Passthrough,
    /// Reject the call when the currencies differ, forcing the caller to
    /// pre-convert.
    RequireMatch,
}

/// The balance transaction engine.
///
/// A stateless service over injected collaborators: all coordination state
/// lives in the ledger store, so one instance serves concurrent requests.
/// Every operation creates a balanced pair of immutable entries sharing a
/// freshly generated correlation key, persisted in a single atomic write.
pub struct BalanceEngine {
    ledger_store: LedgerStoreBox,
    account_store: AccountStoreBox,
    review_gate: ReviewGateBox,
    gateway: PaymentGatewayBox,
    reversal_currency_mode: ReversalCurrencyMode,
}

impl BalanceEngine {
    pub fn new(
        ledger_store: LedgerStoreBox,
        account_store: AccountStoreBox,
        review_gate: ReviewGateBox,
        gateway: PaymentGatewayBox,
    ) -> Self {
        Self {
            ledger_store,
            account_store,
            review_gate,
            gateway,
            reversal_currency_mode: ReversalCurrencyMode::default(),
        }
    }

    pub fn with_reversal_currency_mode(mut self, mode: ReversalCurrencyMode) -> Self {
        self.reversal_currency_mode = mode;
        self
    }

    /// Creates a balanced pair moving `amount` from the platform's pooled
    /// account to `destination_account`.
    ///
    /// The nominal currency is taken from the payment entry; the account
    /// side mirrors it unchanged (the destination's display currency is
    /// assumed equal to the payment's currency at this call site). After the
    /// pair is durably committed, the review gate runs for the destination
    /// account; its failure is logged and does not affect the result.
    pub async fn create_balance(
        &self,
        destination_account: &Account,
        payment_transaction: &LedgerEntry,
        amount: Amount,
        context: BalanceContext,
    ) -> Result<BalancePair> {
        if payment_transaction.kind != TransactionKind::Payment {
            return Err(BalanceError::PreconditionViolation(format!(
                "entry {} is not a payment transaction",
                payment_transaction.id
            )));
        }

        let source_currency = payment_transaction.currency.clone();
        let balance_correlation_key = CorrelationKey::generate();
        let created_at = Utc::now();

        let outgoing = LedgerEntry {
            id: TransactionId::generate(),
            kind: TransactionKind::Balance,
            account: None, // platform pool
            currency: source_currency.clone(),
            amount: -amount.minor(),
            account_currency: source_currency.clone(),
            account_amount: -amount.minor(),
            tax_amount: 0,
            charge_id: None,
            balance_correlation_key: Some(balance_correlation_key),
            pledge_id: context.pledge_id,
            subscription_id: context.subscription_id,
            issue_reward_id: context.issue_reward_id,
            payment_transaction_id: Some(payment_transaction.id),
            balance_reversal_transaction_id: None,
            created_at,
        };
        let incoming = LedgerEntry {
            id: TransactionId::generate(),
            kind: TransactionKind::Balance,
            account: Some(destination_account.id),
            currency: source_currency.clone(),
            amount: amount.minor(),
            account_currency: source_currency,
            account_amount: amount.minor(),
            tax_amount: 0,
            charge_id: None,
            balance_correlation_key: Some(balance_correlation_key),
            pledge_id: context.pledge_id,
            subscription_id: context.subscription_id,
            issue_reward_id: context.issue_reward_id,
            payment_transaction_id: Some(payment_transaction.id),
            balance_reversal_transaction_id: None,
            created_at,
        };

        self.ledger_store
            .insert_pair(outgoing.clone(), incoming.clone())
            .await?;
        debug!(
            correlation_key = %balance_correlation_key,
            account = %destination_account.id,
            amount = amount.minor(),
            "balance pair committed"
        );

        // The pair is already durable; a gate failure must not undo it.
        if let Err(err) = self
            .review_gate
            .check_review_threshold(destination_account)
            .await
        {
            error!(account = %destination_account.id, %err, "review threshold check failed");
        }

        Ok(BalancePair { outgoing, incoming })
    }

    /// Resolves the payment entry recorded for `charge_id`, then creates the
    /// balance pair against it.
    pub async fn create_balance_from_charge(
        &self,
        destination_account: &Account,
        charge_id: &str,
        amount: Amount,
        context: BalanceContext,
    ) -> Result<BalancePair> {
        let payment_transaction = self
            .ledger_store
            .find_payment_by_charge(charge_id)
            .await?
            .ok_or_else(|| BalanceError::PaymentTransactionNotFound(charge_id.to_owned()))?;

        self.create_balance(destination_account, &payment_transaction, amount, context)
            .await
    }

    /// Resolves the payment intent's latest charge through the gateway, then
    /// delegates to the charge-based resolver, which owns the not-found
    /// check.
    pub async fn create_balance_from_payment_intent(
        &self,
        destination_account: &Account,
        payment_intent_id: &str,
        amount: Amount,
        context: BalanceContext,
    ) -> Result<BalancePair> {
        let payment_intent = self.gateway.retrieve_payment_intent(payment_intent_id).await?;
        let latest_charge = payment_intent.latest_charge.as_ref().ok_or_else(|| {
            BalanceError::PreconditionViolation(format!(
                "payment intent {payment_intent_id} has no latest charge"
            ))
        })?;

        self.create_balance_from_charge(destination_account, latest_charge.id(), amount, context)
            .await
    }

    /// Creates a balanced pair undoing a previously committed forward
    /// transfer: funds leave the seller account and return to the platform
    /// pool.
    ///
    /// The reversal pair carries its own correlation key; it is tied to the
    /// original pair by cross-links, each new entry referencing the *other*
    /// original entry. Context references are copied from the original
    /// outgoing entry. No review gate runs here: review is only triggered by
    /// funds accruing to an account.
    pub async fn create_reversal_balance(
        &self,
        balance_pair: &BalancePair,
        destination_currency: Currency,
        amount: Amount,
    ) -> Result<BalancePair> {
        let source_account_id = balance_pair.incoming.account.ok_or_else(|| {
            BalanceError::PreconditionViolation(
                "incoming entry of the pair under reversal has no account".to_owned(),
            )
        })?;
        let source_account = self
            .account_store
            .get(source_account_id)
            .await?
            .ok_or_else(|| {
                BalanceError::PreconditionViolation(format!(
                    "account {source_account_id} does not exist"
                ))
            })?;

        let source_currency = source_account.currency;
        if self.reversal_currency_mode == ReversalCurrencyMode::RequireMatch
            && source_currency != destination_currency
        {
            return Err(BalanceError::PreconditionViolation(format!(
                "reversal currency {destination_currency} does not match account currency {source_currency}"
            )));
        }

        let balance_correlation_key = CorrelationKey::generate();
        let created_at = Utc::now();

        let outgoing_reversal = LedgerEntry {
            id: TransactionId::generate(),
            kind: TransactionKind::Balance,
            account: Some(source_account_id), // funds leave the seller account
            currency: destination_currency.clone(),
            amount: -amount.minor(),
            account_currency: source_currency,
            account_amount: -amount.minor(),
            tax_amount: 0,
            charge_id: None,
            balance_correlation_key: Some(balance_correlation_key),
            pledge_id: balance_pair.outgoing.pledge_id,
            subscription_id: balance_pair.outgoing.subscription_id,
            issue_reward_id: balance_pair.outgoing.issue_reward_id,
            payment_transaction_id: None,
            balance_reversal_transaction_id: Some(balance_pair.incoming.id),
            created_at,
        };
        let incoming_reversal = LedgerEntry {
            id: TransactionId::generate(),
            kind: TransactionKind::Balance,
            account: None, // funds return to the platform pool
            currency: destination_currency.clone(),
            amount: amount.minor(),
            account_currency: destination_currency,
            account_amount: amount.minor(),
            tax_amount: 0,
            charge_id: None,
            balance_correlation_key: Some(balance_correlation_key),
            pledge_id: balance_pair.outgoing.pledge_id,
            subscription_id: balance_pair.outgoing.subscription_id,
            issue_reward_id: balance_pair.outgoing.issue_reward_id,
            payment_transaction_id: None,
            balance_reversal_transaction_id: Some(balance_pair.outgoing.id),
            created_at,
        };

        self.ledger_store
            .insert_pair(outgoing_reversal.clone(), incoming_reversal.clone())
            .await?;
        debug!(
            correlation_key = %balance_correlation_key,
            account = %source_account_id,
            amount = amount.minor(),
            "reversal pair committed"
        );

        Ok(BalancePair {
            outgoing: outgoing_reversal,
            incoming: incoming_reversal,
        })
    }
}
