//! Fine issuance and the payment cascade that can release a customer.

use chrono::NaiveDate;

use super::domain::{
    Customer, CustomerStatus, DamageAssessment, Fine, FineId, FineKind, FineStatus, Loan, LoanId,
    LoanStatus, MovementEvent, MovementKind,
};
use super::error::{ConsistencyError, RentalError, ValidationError};
use super::repository::RentalTx;
use super::toolstate;

/// Accrued late fee between the due date and `today`, never negative.
pub(crate) fn late_fee(due_date: NaiveDate, today: NaiveDate, daily_rate: i64) -> i64 {
    let days_late = (today - due_date).num_days().max(0);
    days_late * daily_rate
}

/// Attach an unpaid late fine to a loan, bumping both obligation counters.
/// Statuses are left alone; the sweep owns the overdue transition.
pub(crate) fn issue_late_fine(
    tx: &mut dyn RentalTx,
    customer: &mut Customer,
    loan: &mut Loan,
    amount: i64,
) -> Fine {
    loan.open_fines += 1;
    customer.open_obligations += 1;
    tx.insert_fine(Fine {
        id: FineId(0),
        customer: customer.id,
        loan: loan.id,
        kind: FineKind::Late,
        amount,
        status: FineStatus::Unpaid,
    })
}

/// Record an administrator's damage verdict for a loan awaiting evaluation.
///
/// Irreparable damage charges the kind's replacement cost and decommissions
/// the unit; minor damage charges the supplied repair cost and leaves the
/// unit in the repair bay until the repair completes. Either way the loan
/// moves on to `pending_fine`.
pub(crate) fn assess_damage(
    tx: &mut dyn RentalTx,
    id: LoanId,
    assessment: DamageAssessment,
    actor: &str,
    today: NaiveDate,
) -> Result<(Fine, Vec<MovementEvent>), RentalError> {
    let mut loan = tx.loan(id)?;
    if loan.status != LoanStatus::PendingEvaluation {
        return Err(ValidationError::LoanNotAwaitingAssessment {
            loan: loan.id,
            status: loan.status,
        }
        .into());
    }

    let mut customer = tx.customer(loan.customer).map_err(|_| {
        ConsistencyError::BrokenLoanReference {
            loan: loan.id,
            entity: "customer",
        }
    })?;

    let mut events = Vec::new();
    let (kind, amount) = match assessment {
        DamageAssessment::Irreparable => {
            let tool = tx.tool(loan.tool).map_err(|_| {
                ConsistencyError::BrokenLoanReference {
                    loan: loan.id,
                    entity: "tool",
                }
            })?;
            let tool_kind = tx.tool_kind(tool.kind).map_err(|_| {
                ConsistencyError::MissingToolKind {
                    tool: tool.id,
                    kind: tool.kind,
                }
            })?;
            let tool = toolstate::decommission(tx, tool.id)?;
            events.push(MovementEvent::single(
                MovementKind::Decommission,
                tool.id,
                actor,
                today,
            ));
            (FineKind::IrreparableDamage, tool_kind.replacement_cost)
        }
        DamageAssessment::Minor { repair_cost } => {
            if repair_cost <= 0 {
                return Err(ValidationError::NonPositiveRepairCost(repair_cost).into());
            }
            (FineKind::MinorDamage, repair_cost)
        }
    };

    // The evaluation obligation is replaced by the fine's.
    customer.open_obligations = customer
        .open_obligations
        .checked_sub(1)
        .ok_or(ConsistencyError::ObligationUnderflow(customer.id))?;
    customer.open_obligations += 1;
    loan.open_fines += 1;
    loan.status = LoanStatus::PendingFine;

    let fine = tx.insert_fine(Fine {
        id: FineId(0),
        customer: customer.id,
        loan: loan.id,
        kind,
        amount,
        status: FineStatus::Unpaid,
    });
    tx.put_loan(loan);
    tx.put_customer(customer);
    Ok((fine, events))
}

/// Settle a fine and decide how far the resolution cascades.
///
/// Paying never finalizes a loan that is still awaiting a damage assessment,
/// or that carries another unpaid fine. Once a loan does finalize, the
/// customer is released exactly when no obligation remains anywhere.
pub(crate) fn pay_fine(tx: &mut dyn RentalTx, id: FineId) -> Result<Fine, RentalError> {
    let mut fine = tx.fine(id)?;
    if fine.status == FineStatus::Paid {
        return Err(ValidationError::FineAlreadyPaid(fine.id).into());
    }

    let mut loan = tx.loan(fine.loan).map_err(|_| {
        ConsistencyError::BrokenFineReference {
            fine: fine.id,
            entity: "loan",
        }
    })?;
    if matches!(loan.status, LoanStatus::Active | LoanStatus::Overdue) {
        return Err(ValidationError::LoanStillOutstanding {
            fine: fine.id,
            loan: loan.id,
            status: loan.status,
        }
        .into());
    }

    let mut customer = tx.customer(fine.customer).map_err(|_| {
        ConsistencyError::BrokenFineReference {
            fine: fine.id,
            entity: "customer",
        }
    })?;

    fine.status = FineStatus::Paid;
    loan.open_fines = loan
        .open_fines
        .checked_sub(1)
        .ok_or(ConsistencyError::FineCounterUnderflow(loan.id))?;
    customer.open_obligations = customer
        .open_obligations
        .checked_sub(1)
        .ok_or(ConsistencyError::ObligationUnderflow(customer.id))?;

    if loan.status == LoanStatus::PendingEvaluation {
        // A damage assessment is still expected; the loan stays open.
    } else if loan.open_fines == 0 {
        loan.status = LoanStatus::CompletedWithFine;
        if customer.open_obligations == 0 {
            customer.status = CustomerStatus::Active;
        }
    }
    // A sibling unpaid fine on the same loan keeps it at pending_fine.

    tx.put_fine(fine.clone());
    tx.put_loan(loan);
    tx.put_customer(customer);
    Ok(fine)
}
