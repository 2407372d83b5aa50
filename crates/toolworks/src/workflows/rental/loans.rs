//! Loan creation and return: the lifecycle half of the rental engine.

use chrono::NaiveDate;

use super::domain::{
    CustomerStatus, Loan, LoanId, LoanRequest, LoanStatus, MovementEvent, MovementKind,
    ReturnCondition, ToolStatus,
};
use super::error::{ConsistencyError, RentalError, ValidationError};
use super::repository::RentalTx;
use super::toolstate;

/// Ceiling on concurrently active loans per customer.
pub const MAX_ACTIVE_LOANS: usize = 5;

/// Validate and open a new loan.
///
/// Preconditions are checked in a fixed order so the caller always learns the
/// first violated rule; no write happens before all of them pass.
pub(crate) fn create_loan(
    tx: &mut dyn RentalTx,
    request: &LoanRequest,
    actor: &str,
    today: NaiveDate,
) -> Result<(Loan, Vec<MovementEvent>), RentalError> {
    let customer = tx.customer(request.customer)?;
    if customer.status == CustomerStatus::Restricted {
        return Err(ValidationError::CustomerRestricted(customer.id).into());
    }

    let active: Vec<Loan> = tx
        .loans_for_customer(customer.id)
        .into_iter()
        .filter(|loan| loan.status == LoanStatus::Active)
        .collect();
    if active.len() >= MAX_ACTIVE_LOANS {
        return Err(ValidationError::ActiveLoanLimit {
            customer: customer.id,
            limit: MAX_ACTIVE_LOANS,
        }
        .into());
    }

    let tool = tx.tool(request.tool)?;
    let kind = tx.tool_kind(tool.kind).map_err(|_| {
        ConsistencyError::MissingToolKind {
            tool: tool.id,
            kind: tool.kind,
        }
    })?;

    // Two units of the same kind may not be out to one customer at once;
    // kinds are compared by identifier, not by name.
    for held in &active {
        let held_tool = tx.tool(held.tool).map_err(|_| {
            ConsistencyError::BrokenLoanReference {
                loan: held.id,
                entity: "tool",
            }
        })?;
        if held_tool.kind == kind.id {
            return Err(ValidationError::DuplicateKindHeld {
                customer: customer.id,
                kind: kind.id,
            }
            .into());
        }
    }

    if kind.available_stock == 0 {
        return Err(ValidationError::OutOfStock(kind.id).into());
    }
    if tool.status == ToolStatus::Borrowed {
        return Err(ValidationError::ToolAlreadyBorrowed(tool.id).into());
    }
    if request.due_date <= today {
        return Err(ValidationError::DueDateNotAfterLoanDate {
            loan_date: today,
            due_date: request.due_date,
        }
        .into());
    }

    let days = (request.due_date - today).num_days();
    let loan_value = days * kind.daily_rental_rate;

    let tool = toolstate::borrow(tx, tool.id)?;
    let loan = tx.insert_loan(Loan {
        id: LoanId(0),
        customer: customer.id,
        tool: tool.id,
        loan_date: today,
        due_date: request.due_date,
        loan_value,
        status: LoanStatus::Active,
        open_fines: 0,
    });

    let events = vec![MovementEvent::single(
        MovementKind::Loan,
        tool.id,
        actor,
        today,
    )];
    Ok((loan, events))
}

/// Take a tool back and branch on punctuality and condition.
///
/// Punctual good returns complete the loan outright. Late good returns park
/// it at `pending_fine` for the late fine to settle. Damaged returns, late or
/// not, send the tool to repair, park the loan at `pending_evaluation`, and
/// restrict the customer until an administrator assesses the damage.
pub(crate) fn return_loan(
    tx: &mut dyn RentalTx,
    id: LoanId,
    condition: ReturnCondition,
    actor: &str,
    today: NaiveDate,
) -> Result<(Loan, Vec<MovementEvent>), RentalError> {
    let mut loan = tx.loan(id)?;
    if !matches!(loan.status, LoanStatus::Active | LoanStatus::Overdue) {
        return Err(ValidationError::LoanNotReturnable {
            loan: loan.id,
            status: loan.status,
        }
        .into());
    }

    let on_time = today <= loan.due_date;
    let mut events = Vec::new();

    match condition {
        ReturnCondition::Good => {
            let tool = toolstate::release(tx, loan.tool)?;
            loan.status = if on_time {
                LoanStatus::Completed
            } else {
                LoanStatus::PendingFine
            };
            events.push(MovementEvent::single(
                MovementKind::Return,
                tool.id,
                actor,
                today,
            ));
        }
        ReturnCondition::Damaged => {
            let tool = toolstate::mark_damaged(tx, loan.tool)?;
            loan.status = LoanStatus::PendingEvaluation;

            let mut customer = tx.customer(loan.customer).map_err(|_| {
                ConsistencyError::BrokenLoanReference {
                    loan: loan.id,
                    entity: "customer",
                }
            })?;
            customer.status = CustomerStatus::Restricted;
            customer.open_obligations += 1;
            tx.put_customer(customer);

            events.push(MovementEvent::single(
                MovementKind::Repair,
                tool.id,
                actor,
                today,
            ));
            events.push(MovementEvent::single(
                MovementKind::Return,
                tool.id,
                actor,
                today,
            ));
        }
    }

    tx.put_loan(loan.clone());
    Ok((loan, events))
}
