//! Payment record persistence.
//!
//! A persistent mapping from processor-issued intent ids to local payment
//! records, with conditional status transitions so concurrent or repeated
//! updates converge on the same terminal state.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryPaymentStore;
pub use postgres::PostgresPaymentStore;
pub use record::{NewPayment, PaymentRecord, PaymentStatus};
pub use store::{PaymentStore, StatusUpdate};
