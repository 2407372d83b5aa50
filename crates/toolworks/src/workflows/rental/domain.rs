use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered customers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CustomerId(pub u64);

/// Identifier wrapper for catalog entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ToolKindId(pub u64);

/// Identifier wrapper for physical tool units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ToolId(pub u64);

/// Identifier wrapper for loans.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LoanId(pub u64);

/// Identifier wrapper for fines.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FineId(pub u64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ToolKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a customer may take out new loans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Active,
    Restricted,
}

impl CustomerStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Restricted => "restricted",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of one physical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Available,
    Borrowed,
    UnderRepair,
    Decommissioned,
}

impl ToolStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ToolStatus::Available => "available",
            ToolStatus::Borrowed => "borrowed",
            ToolStatus::UnderRepair => "under_repair",
            ToolStatus::Decommissioned => "decommissioned",
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a loan, from checkout to final settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Overdue,
    PendingEvaluation,
    PendingFine,
    Completed,
    CompletedWithFine,
}

impl LoanStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::PendingEvaluation => "pending_evaluation",
            LoanStatus::PendingFine => "pending_fine",
            LoanStatus::Completed => "completed",
            LoanStatus::CompletedWithFine => "completed_with_fine",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a fine was charged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FineKind {
    Late,
    MinorDamage,
    IrreparableDamage,
}

impl FineKind {
    pub const fn label(self) -> &'static str {
        match self {
            FineKind::Late => "late",
            FineKind::MinorDamage => "minor_damage",
            FineKind::IrreparableDamage => "irreparable_damage",
        }
    }
}

/// Settlement state of a fine. Paid fines are never touched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FineStatus {
    Unpaid,
    Paid,
}

impl FineStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FineStatus::Unpaid => "unpaid",
            FineStatus::Paid => "paid",
        }
    }
}

/// Condition a borrower hands a tool back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnCondition {
    Good,
    Damaged,
}

/// Severity decision an administrator records for a damaged return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "severity", rename_all = "snake_case")]
pub enum DamageAssessment {
    Minor { repair_cost: i64 },
    Irreparable,
}

/// A registered borrower.
///
/// `open_obligations` counts the customer's unresolved obligations: unpaid
/// fines plus loans still awaiting a damage assessment. The payment cascade
/// releases the customer exactly when it reaches zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: CustomerStatus,
    pub open_obligations: u32,
}

/// Catalog entry shared by every physical unit of one kind of tool.
///
/// Invariant: `0 <= available_stock <= total_units`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolKind {
    pub id: ToolKindId,
    pub name: String,
    pub category: String,
    pub replacement_cost: i64,
    pub daily_rental_rate: i64,
    pub total_units: u32,
    pub available_stock: u32,
}

/// One physical unit of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    pub kind: ToolKindId,
    pub status: ToolStatus,
}

/// A checkout of one tool by one customer.
///
/// `loan_value` is priced once at creation; `open_fines` counts the unpaid
/// fines currently attached. Loans are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub customer: CustomerId,
    pub tool: ToolId,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub loan_value: i64,
    pub status: LoanStatus,
    pub open_fines: u32,
}

/// A charge raised against a customer for one loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fine {
    pub id: FineId,
    pub customer: CustomerId,
    pub loan: LoanId,
    pub kind: FineKind,
    pub amount: i64,
    pub status: FineStatus,
}

/// Inputs for a new loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub customer: CustomerId,
    pub tool: ToolId,
    pub due_date: NaiveDate,
}

/// Contact details for a customer registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Catalog intake request: a new kind of tool plus its initial units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewToolKind {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub replacement_cost: i64,
    pub daily_rental_rate: i64,
}

/// Categories of tool movement tracked in the append-only log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Intake,
    Loan,
    Return,
    Repair,
    Decommission,
}

impl MovementKind {
    pub const fn label(self) -> &'static str {
        match self {
            MovementKind::Intake => "intake",
            MovementKind::Loan => "loan",
            MovementKind::Return => "return",
            MovementKind::Repair => "repair",
            MovementKind::Decommission => "decommission",
        }
    }
}

/// Append-only record of a tool-affecting transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementEvent {
    pub kind: MovementKind,
    pub tool: ToolId,
    pub actor: String,
    pub date: NaiveDate,
    pub quantity: u32,
}

impl MovementEvent {
    /// One-unit movement stamped with the acting identity and date.
    pub fn single(kind: MovementKind, tool: ToolId, actor: &str, date: NaiveDate) -> Self {
        Self {
            kind,
            tool,
            actor: actor.to_string(),
            date,
            quantity: 1,
        }
    }
}
