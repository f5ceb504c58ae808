//! Double-entry balance ledger core for a marketplace payment system.
//!
//! Records how funds collected from a buyer's payment move from the
//! platform's pooled account to a seller's connected account, and how such
//! movements are reversed. Every movement is a balanced pair of immutable
//! entries netting to zero, created through [`application::engine::BalanceEngine`]
//! over injected [`domain::ports`] collaborators.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
