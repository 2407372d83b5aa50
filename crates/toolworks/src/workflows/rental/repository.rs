use chrono::NaiveDate;
use thiserror::Error;

use super::domain::{
    Customer, CustomerId, Fine, FineId, Loan, LoanId, MovementEvent, Tool, ToolId, ToolKind,
    ToolKindId,
};
use super::error::{ConsistencyError, NotFoundError, RentalError};

/// Name of the rate the overdue sweep charges per day of lateness.
pub const DAILY_LATE_FEE_RATE: &str = "daily_late_fee";

/// Transactional view over the rental entities.
///
/// Reads observe writes already staged in the same transaction; nothing
/// becomes visible to other callers until the enclosing
/// [`RentalStore::transaction`] returns `Ok`. Inserts assign identifiers.
pub trait RentalTx {
    fn customer(&self, id: CustomerId) -> Result<Customer, NotFoundError>;
    fn insert_customer(&mut self, customer: Customer) -> Customer;
    fn put_customer(&mut self, customer: Customer);
    fn customers(&self) -> Vec<Customer>;

    fn tool_kind(&self, id: ToolKindId) -> Result<ToolKind, NotFoundError>;
    fn insert_tool_kind(&mut self, kind: ToolKind) -> ToolKind;
    fn put_tool_kind(&mut self, kind: ToolKind);
    fn tool_kinds(&self) -> Vec<ToolKind>;

    fn tool(&self, id: ToolId) -> Result<Tool, NotFoundError>;
    fn insert_tool(&mut self, tool: Tool) -> Tool;
    fn put_tool(&mut self, tool: Tool);
    fn tools(&self) -> Vec<Tool>;

    fn loan(&self, id: LoanId) -> Result<Loan, NotFoundError>;
    fn insert_loan(&mut self, loan: Loan) -> Loan;
    fn put_loan(&mut self, loan: Loan);
    fn loans(&self) -> Vec<Loan>;

    fn fine(&self, id: FineId) -> Result<Fine, NotFoundError>;
    fn insert_fine(&mut self, fine: Fine) -> Fine;
    fn put_fine(&mut self, fine: Fine);
    fn fines(&self) -> Vec<Fine>;

    /// Day the overdue sweep last completed its claim, if any.
    fn sweep_marker(&self) -> Option<NaiveDate>;
    fn set_sweep_marker(&mut self, day: NaiveDate);

    fn loans_for_customer(&self, id: CustomerId) -> Vec<Loan> {
        self.loans()
            .into_iter()
            .filter(|loan| loan.customer == id)
            .collect()
    }

    fn fines_for_loan(&self, id: LoanId) -> Vec<Fine> {
        self.fines()
            .into_iter()
            .filter(|fine| fine.loan == id)
            .collect()
    }

    fn fines_for_customer(&self, id: CustomerId) -> Vec<Fine> {
        self.fines()
            .into_iter()
            .filter(|fine| fine.customer == id)
            .collect()
    }
}

/// Storage collaborator. Every engine operation runs as one atomic
/// transaction spanning all entities it touches; a returned `Err` must leave
/// no partial write behind.
pub trait RentalStore: Send + Sync {
    fn transaction<T, F>(&self, f: F) -> Result<T, RentalError>
    where
        F: FnOnce(&mut dyn RentalTx) -> Result<T, RentalError>;
}

/// Append-only recorder of tool movements. Fire-and-forget from the engine's
/// perspective; at-least-once delivery is acceptable.
pub trait MovementLog: Send + Sync {
    fn record(&self, event: MovementEvent) -> Result<(), MovementError>;
}

/// Movement log delivery failure.
#[derive(Debug, Error)]
pub enum MovementError {
    #[error("movement log transport unavailable: {0}")]
    Transport(String),
}

/// Named numeric rates maintained outside the engine.
pub trait RateTable: Send + Sync {
    fn rate_for(&self, name: &str) -> Result<i64, RateError>;
}

/// Rate lookup failure.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate '{0}' is not configured")]
    Missing(String),
}

impl From<RateError> for RentalError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Missing(name) => ConsistencyError::MissingRate(name).into(),
        }
    }
}
