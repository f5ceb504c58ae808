use thiserror::Error;

#[derive(Error, Debug)]
pub enum BalanceError {
    /// The charge-based lookup found no payment entry. Carries the charge
    /// identifier; retrying without a newly recorded payment entry cannot
    /// succeed.
    #[error("no payment transaction exists for charge {0}")]
    PaymentTransactionNotFound(String),

    /// Malformed input from an upstream collaborator that should never
    /// happen in correct operation. Fatal to the current request.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// The pair write did not commit. Safe to retry the whole operation:
    /// every call generates fresh identifiers, so nothing from the failed
    /// attempt is reused.
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// The payment gateway could not be reached or rejected the request.
    #[error("payment gateway error: {0}")]
    Gateway(String),
}

pub type Result<T> = std::result::Result<T, BalanceError>;
