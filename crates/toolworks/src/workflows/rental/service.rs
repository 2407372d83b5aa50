use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use super::domain::{
    Customer, CustomerId, CustomerStatus, DamageAssessment, Fine, FineId, FineStatus, Loan,
    LoanId, LoanRequest, LoanStatus, MovementEvent, MovementKind, NewCustomer, NewToolKind,
    ReturnCondition, Tool, ToolId, ToolKind, ToolKindId, ToolStatus,
};
use super::error::{RentalError, ValidationError};
use super::loans;
use super::penalties;
use super::repository::{MovementLog, RateTable, RentalStore, DAILY_LATE_FEE_RATE};
use super::sweep::{self, SweepReport};
use super::toolstate;

/// Facade composing the store, movement log, and rate table collaborators.
///
/// Every operation runs inside a single store transaction; movement events
/// are published only after the transaction has committed, and a failing log
/// transport never fails the operation.
pub struct RentalService<S, M, R> {
    store: Arc<S>,
    movements: Arc<M>,
    rates: Arc<R>,
    actor: String,
}

impl<S, M, R> RentalService<S, M, R>
where
    S: RentalStore,
    M: MovementLog,
    R: RateTable,
{
    pub fn new(store: Arc<S>, movements: Arc<M>, rates: Arc<R>) -> Self {
        Self {
            store,
            movements,
            rates,
            actor: "system".to_string(),
        }
    }

    /// Identity stamped onto movement events (defaults to `system`).
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Open a loan for a customer; `today` becomes the loan date.
    pub fn create_loan(&self, request: LoanRequest, today: NaiveDate) -> Result<Loan, RentalError> {
        let (loan, events) = self
            .store
            .transaction(|tx| loans::create_loan(tx, &request, &self.actor, today))?;
        self.publish(events);
        Ok(loan)
    }

    /// Take a tool back in the stated condition.
    pub fn return_loan(
        &self,
        loan: LoanId,
        condition: ReturnCondition,
        today: NaiveDate,
    ) -> Result<Loan, RentalError> {
        let (loan, events) = self
            .store
            .transaction(|tx| loans::return_loan(tx, loan, condition, &self.actor, today))?;
        self.publish(events);
        Ok(loan)
    }

    /// Record the administrator's damage verdict for a returned tool.
    pub fn assess_damage(
        &self,
        loan: LoanId,
        assessment: DamageAssessment,
        today: NaiveDate,
    ) -> Result<Fine, RentalError> {
        let (fine, events) = self
            .store
            .transaction(|tx| penalties::assess_damage(tx, loan, assessment, &self.actor, today))?;
        self.publish(events);
        Ok(fine)
    }

    /// Settle a fine; may finalize its loan and release the customer.
    pub fn pay_fine(&self, fine: FineId) -> Result<Fine, RentalError> {
        self.store.transaction(|tx| penalties::pay_fine(tx, fine))
    }

    /// Run the daily overdue pass. Safe to invoke repeatedly; only the first
    /// invocation per calendar day does any work.
    pub fn run_overdue_sweep(&self, today: NaiveDate) -> Result<SweepReport, RentalError> {
        let daily_late_fee = self.rates.rate_for(DAILY_LATE_FEE_RATE)?;
        sweep::run(self.store.as_ref(), daily_late_fee, today)
    }

    /// Bring a repaired tool back into circulation.
    pub fn complete_repair(&self, tool: ToolId) -> Result<Tool, RentalError> {
        self.store.transaction(|tx| toolstate::mark_repaired(tx, tool))
    }

    /// Register a borrower with validated, normalized contact details.
    pub fn register_customer(&self, draft: NewCustomer) -> Result<Customer, RentalError> {
        let name = draft.name.trim().to_string();
        let email = draft.email.trim().to_lowercase();
        let phone = draft.phone.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingField { field: "name" }.into());
        }
        if !plausible_email(&email) {
            return Err(ValidationError::InvalidEmail(email).into());
        }

        self.store.transaction(move |tx| {
            if tx.customers().iter().any(|existing| existing.email == email) {
                return Err(ValidationError::DuplicateEmail(email).into());
            }
            Ok(tx.insert_customer(Customer {
                id: CustomerId(0),
                name,
                email,
                phone,
                status: CustomerStatus::Active,
                open_obligations: 0,
            }))
        })
    }

    /// Add a new kind of tool to the catalog along with its initial units.
    pub fn register_tool_kind(
        &self,
        draft: NewToolKind,
        today: NaiveDate,
    ) -> Result<ToolKind, RentalError> {
        let name = draft.name.trim().to_lowercase();
        let category = draft.category.trim().to_lowercase();
        if name.is_empty() {
            return Err(ValidationError::MissingField { field: "name" }.into());
        }
        if category.is_empty() {
            return Err(ValidationError::MissingField { field: "category" }.into());
        }
        if draft.quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity.into());
        }
        if draft.replacement_cost <= 0 {
            return Err(ValidationError::NonPositiveRate {
                field: "replacement_cost",
                value: draft.replacement_cost,
            }
            .into());
        }
        if draft.daily_rental_rate <= 0 {
            return Err(ValidationError::NonPositiveRate {
                field: "daily_rental_rate",
                value: draft.daily_rental_rate,
            }
            .into());
        }

        let actor = self.actor.clone();
        let (kind, events) = self.store.transaction(move |tx| {
            if tx
                .tool_kinds()
                .iter()
                .any(|kind| kind.name == name && kind.category == category)
            {
                return Err(ValidationError::ToolKindAlreadyRegistered { name, category }.into());
            }

            let kind = tx.insert_tool_kind(ToolKind {
                id: ToolKindId(0),
                name,
                category,
                replacement_cost: draft.replacement_cost,
                daily_rental_rate: draft.daily_rental_rate,
                total_units: draft.quantity,
                available_stock: draft.quantity,
            });

            let mut events = Vec::with_capacity(draft.quantity as usize);
            for _ in 0..draft.quantity {
                let unit = tx.insert_tool(Tool {
                    id: ToolId(0),
                    kind: kind.id,
                    status: ToolStatus::Available,
                });
                events.push(MovementEvent::single(
                    MovementKind::Intake,
                    unit.id,
                    &actor,
                    today,
                ));
            }
            Ok((kind, events))
        })?;
        self.publish(events);
        Ok(kind)
    }

    /// Top up an existing kind with additional physical units.
    pub fn add_tool_units(
        &self,
        kind: ToolKindId,
        quantity: u32,
        today: NaiveDate,
    ) -> Result<Vec<Tool>, RentalError> {
        if quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity.into());
        }

        let actor = self.actor.clone();
        let (units, events) = self.store.transaction(move |tx| {
            let mut tool_kind = tx.tool_kind(kind)?;
            tool_kind.total_units += quantity;
            tool_kind.available_stock += quantity;
            let kind_id = tool_kind.id;
            tx.put_tool_kind(tool_kind);

            let mut units = Vec::with_capacity(quantity as usize);
            let mut events = Vec::with_capacity(quantity as usize);
            for _ in 0..quantity {
                let unit = tx.insert_tool(Tool {
                    id: ToolId(0),
                    kind: kind_id,
                    status: ToolStatus::Available,
                });
                events.push(MovementEvent::single(
                    MovementKind::Intake,
                    unit.id,
                    &actor,
                    today,
                ));
                units.push(unit);
            }
            Ok((units, events))
        })?;
        self.publish(events);
        Ok(units)
    }

    pub fn customer(&self, id: CustomerId) -> Result<Customer, RentalError> {
        self.store.transaction(|tx| Ok(tx.customer(id)?))
    }

    pub fn tool(&self, id: ToolId) -> Result<Tool, RentalError> {
        self.store.transaction(|tx| Ok(tx.tool(id)?))
    }

    pub fn tool_kind(&self, id: ToolKindId) -> Result<ToolKind, RentalError> {
        self.store.transaction(|tx| Ok(tx.tool_kind(id)?))
    }

    pub fn tool_kinds(&self) -> Result<Vec<ToolKind>, RentalError> {
        self.store.transaction(|tx| Ok(tx.tool_kinds()))
    }

    pub fn tools_of_kind(&self, kind: ToolKindId) -> Result<Vec<Tool>, RentalError> {
        self.store.transaction(|tx| {
            tx.tool_kind(kind)?;
            Ok(tx
                .tools()
                .into_iter()
                .filter(|tool| tool.kind == kind)
                .collect())
        })
    }

    pub fn loan(&self, id: LoanId) -> Result<Loan, RentalError> {
        self.store.transaction(|tx| Ok(tx.loan(id)?))
    }

    pub fn loans(&self) -> Result<Vec<Loan>, RentalError> {
        self.store.transaction(|tx| Ok(tx.loans()))
    }

    pub fn loans_by_status(&self, status: LoanStatus) -> Result<Vec<Loan>, RentalError> {
        self.store.transaction(|tx| {
            Ok(tx
                .loans()
                .into_iter()
                .filter(|loan| loan.status == status)
                .collect())
        })
    }

    pub fn loans_for_customer(&self, customer: CustomerId) -> Result<Vec<Loan>, RentalError> {
        self.store.transaction(|tx| {
            tx.customer(customer)?;
            Ok(tx.loans_for_customer(customer))
        })
    }

    pub fn fine(&self, id: FineId) -> Result<Fine, RentalError> {
        self.store.transaction(|tx| Ok(tx.fine(id)?))
    }

    pub fn fines(&self) -> Result<Vec<Fine>, RentalError> {
        self.store.transaction(|tx| Ok(tx.fines()))
    }

    pub fn fines_by_status(&self, status: FineStatus) -> Result<Vec<Fine>, RentalError> {
        self.store.transaction(|tx| {
            Ok(tx
                .fines()
                .into_iter()
                .filter(|fine| fine.status == status)
                .collect())
        })
    }

    pub fn fines_for_customer(&self, customer: CustomerId) -> Result<Vec<Fine>, RentalError> {
        self.store.transaction(|tx| {
            tx.customer(customer)?;
            Ok(tx.fines_for_customer(customer))
        })
    }

    fn publish(&self, events: Vec<MovementEvent>) {
        for event in events {
            let tool = event.tool;
            if let Err(err) = self.movements.record(event) {
                warn!(%tool, error = %err, "movement log rejected event");
            }
        }
    }
}

// Light-weight shape check; full address verification is the directory's job.
fn plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
