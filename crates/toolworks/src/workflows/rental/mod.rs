//! Tool rental lifecycle: loans, returns, penalties, and the overdue sweep.
//!
//! The engine couples four mutable entities (customer, tool, loan, fine)
//! under branching preconditions. Every mutating operation runs as one store
//! transaction, and a customer's restriction is lifted only by the fine
//! payment cascade once no obligation remains.

pub mod domain;
pub mod error;
mod loans;
pub mod memory;
mod penalties;
pub mod repository;
pub mod router;
pub mod service;
mod sweep;
pub(crate) mod toolstate;

#[cfg(test)]
mod tests;

pub use domain::{
    Customer, CustomerId, CustomerStatus, DamageAssessment, Fine, FineId, FineKind, FineStatus,
    Loan, LoanId, LoanRequest, LoanStatus, MovementEvent, MovementKind, NewCustomer, NewToolKind,
    ReturnCondition, Tool, ToolId, ToolKind, ToolKindId, ToolStatus,
};
pub use error::{ConsistencyError, NotFoundError, RentalError, ValidationError};
pub use loans::MAX_ACTIVE_LOANS;
pub use memory::{InMemoryMovementLog, MemoryStore, StaticRateTable};
pub use repository::{
    MovementError, MovementLog, RateError, RateTable, RentalStore, RentalTx, DAILY_LATE_FEE_RATE,
};
pub use router::rental_router;
pub use service::RentalService;
pub use sweep::{SweepFailure, SweepReport};
