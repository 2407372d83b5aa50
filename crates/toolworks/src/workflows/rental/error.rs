use chrono::NaiveDate;
use thiserror::Error;

use super::domain::{CustomerId, FineId, LoanId, LoanStatus, ToolId, ToolKindId, ToolStatus};

/// A business-rule precondition failed. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("customer {0} is restricted from new loans")]
    CustomerRestricted(CustomerId),
    #[error("customer {customer} already holds {limit} active loans")]
    ActiveLoanLimit { customer: CustomerId, limit: usize },
    #[error("customer {customer} already holds an active loan for tool kind {kind}")]
    DuplicateKindHeld { customer: CustomerId, kind: ToolKindId },
    #[error("tool kind {0} has no available stock")]
    OutOfStock(ToolKindId),
    #[error("tool {0} is already borrowed")]
    ToolAlreadyBorrowed(ToolId),
    #[error("due date {due_date} must fall strictly after loan date {loan_date}")]
    DueDateNotAfterLoanDate {
        loan_date: NaiveDate,
        due_date: NaiveDate,
    },
    #[error("loan {loan} cannot be returned from status {status}")]
    LoanNotReturnable { loan: LoanId, status: LoanStatus },
    #[error("loan {loan} is not awaiting a damage assessment (status {status})")]
    LoanNotAwaitingAssessment { loan: LoanId, status: LoanStatus },
    #[error("repair cost must be positive, got {0}")]
    NonPositiveRepairCost(i64),
    #[error("fine {0} is already paid")]
    FineAlreadyPaid(FineId),
    #[error("fine {fine} cannot be settled while loan {loan} is still {status}")]
    LoanStillOutstanding {
        fine: FineId,
        loan: LoanId,
        status: LoanStatus,
    },
    #[error("tool {tool} is not under repair (status {status})")]
    ToolNotUnderRepair { tool: ToolId, status: ToolStatus },
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },
    #[error("'{0}' is not a plausible email address")]
    InvalidEmail(String),
    #[error("a customer with email '{0}' is already registered")]
    DuplicateEmail(String),
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("{field} must be positive, got {value}")]
    NonPositiveRate { field: &'static str, value: i64 },
    #[error("tool kind '{name}' in category '{category}' is already registered")]
    ToolKindAlreadyRegistered { name: String, category: String },
}

/// A caller-supplied reference does not resolve to a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("customer {0} not found")]
    Customer(CustomerId),
    #[error("tool kind {0} not found")]
    ToolKind(ToolKindId),
    #[error("tool {0} not found")]
    Tool(ToolId),
    #[error("loan {0} not found")]
    Loan(LoanId),
    #[error("fine {0} not found")]
    Fine(FineId),
}

/// Stored state violates a collaborator contract. Fatal for the operation;
/// the enclosing transaction aborts and the error propagates un-retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("tool {tool} references missing tool kind {kind}")]
    MissingToolKind { tool: ToolId, kind: ToolKindId },
    #[error("loan {loan} references a missing {entity} record")]
    BrokenLoanReference { loan: LoanId, entity: &'static str },
    #[error("fine {fine} references a missing {entity} record")]
    BrokenFineReference { fine: FineId, entity: &'static str },
    #[error("stock for tool kind {0} would fall below zero")]
    StockUnderflow(ToolKindId),
    #[error("stock for tool kind {kind} would exceed its {total} total units")]
    StockExceedsTotal { kind: ToolKindId, total: u32 },
    #[error("total unit count for tool kind {0} would fall below zero")]
    TotalUnderflow(ToolKindId),
    #[error("obligation counter for customer {0} would fall below zero")]
    ObligationUnderflow(CustomerId),
    #[error("open fine counter for loan {0} would fall below zero")]
    FineCounterUnderflow(LoanId),
    #[error("overdue loan {0} carries no unpaid late fine to refresh")]
    MissingLateFine(LoanId),
    #[error("required rate '{0}' is not configured")]
    MissingRate(String),
}

/// Failure surface of every rental engine operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RentalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}
