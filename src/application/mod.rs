// Application layer: use cases over the ledger store.
// WalletService owns every write; ReportingService only reads.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
