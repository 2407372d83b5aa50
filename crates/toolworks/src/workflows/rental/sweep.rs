//! Recurring once-per-day batch that promotes and reprices overdue loans.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{CustomerStatus, FineKind, FineStatus, LoanId, LoanStatus};
use super::error::{ConsistencyError, RentalError};
use super::penalties;
use super::repository::{RentalStore, RentalTx};

/// Outcome summary of one sweep invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub day: NaiveDate,
    pub examined: usize,
    pub promoted: usize,
    pub refreshed: usize,
    pub failed: Vec<SweepFailure>,
    pub skipped: bool,
}

/// A loan the sweep could not process; the batch carried on without it.
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub loan: LoanId,
    pub reason: String,
}

impl SweepReport {
    fn fresh(day: NaiveDate, examined: usize) -> Self {
        Self {
            day,
            examined,
            promoted: 0,
            refreshed: 0,
            failed: Vec::new(),
            skipped: false,
        }
    }

    fn already_ran(day: NaiveDate) -> Self {
        Self {
            day,
            examined: 0,
            promoted: 0,
            refreshed: 0,
            failed: Vec::new(),
            skipped: true,
        }
    }
}

enum SweepAction {
    Promoted,
    Refreshed,
}

/// Run the daily pass over every active or overdue loan.
///
/// The calendar day is claimed up front, so a repeat invocation for the same
/// day is a no-op regardless of how often the caller's timer fires. Each loan
/// is processed in its own transaction: one loan's failure is reported and
/// logged without aborting the rest of the batch.
pub(crate) fn run<S: RentalStore>(
    store: &S,
    daily_late_fee: i64,
    today: NaiveDate,
) -> Result<SweepReport, RentalError> {
    let claimed = store.transaction(|tx| {
        if tx.sweep_marker() == Some(today) {
            return Ok(false);
        }
        tx.set_sweep_marker(today);
        Ok(true)
    })?;
    if !claimed {
        info!(%today, "overdue sweep already ran today");
        return Ok(SweepReport::already_ran(today));
    }

    let candidates: Vec<LoanId> = store.transaction(|tx| {
        Ok(tx
            .loans()
            .into_iter()
            .filter(|loan| matches!(loan.status, LoanStatus::Active | LoanStatus::Overdue))
            .map(|loan| loan.id)
            .collect())
    })?;

    let mut report = SweepReport::fresh(today, candidates.len());
    for loan_id in candidates {
        match store.transaction(|tx| sweep_loan(tx, loan_id, daily_late_fee, today)) {
            Ok(Some(SweepAction::Promoted)) => report.promoted += 1,
            Ok(Some(SweepAction::Refreshed)) => report.refreshed += 1,
            Ok(None) => {}
            Err(err) => {
                warn!(loan = %loan_id, error = %err, "overdue sweep left loan unprocessed");
                report.failed.push(SweepFailure {
                    loan: loan_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        %today,
        examined = report.examined,
        promoted = report.promoted,
        refreshed = report.refreshed,
        failed = report.failed.len(),
        "overdue sweep finished"
    );
    Ok(report)
}

// The status is re-read here, so a return that raced the candidate listing
// wins and the loan is simply left alone.
fn sweep_loan(
    tx: &mut dyn RentalTx,
    id: LoanId,
    daily_late_fee: i64,
    today: NaiveDate,
) -> Result<Option<SweepAction>, RentalError> {
    let mut loan = tx.loan(id)?;
    match loan.status {
        LoanStatus::Overdue => {
            let mut fine = tx
                .fines_for_loan(loan.id)
                .into_iter()
                .find(|fine| fine.kind == FineKind::Late && fine.status == FineStatus::Unpaid)
                .ok_or(ConsistencyError::MissingLateFine(loan.id))?;
            fine.amount = penalties::late_fee(loan.due_date, today, daily_late_fee);
            tx.put_fine(fine);
            Ok(Some(SweepAction::Refreshed))
        }
        LoanStatus::Active if loan.due_date < today => {
            let mut customer = tx.customer(loan.customer).map_err(|_| {
                ConsistencyError::BrokenLoanReference {
                    loan: loan.id,
                    entity: "customer",
                }
            })?;
            let amount = penalties::late_fee(loan.due_date, today, daily_late_fee);
            penalties::issue_late_fine(tx, &mut customer, &mut loan, amount);
            loan.status = LoanStatus::Overdue;
            customer.status = CustomerStatus::Restricted;
            tx.put_loan(loan);
            tx.put_customer(customer);
            Ok(Some(SweepAction::Promoted))
        }
        _ => Ok(None),
    }
}
