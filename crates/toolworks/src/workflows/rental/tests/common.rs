use std::sync::Arc;

use chrono::NaiveDate;

use crate::workflows::rental::domain::{
    Customer, CustomerId, Loan, LoanRequest, NewCustomer, NewToolKind, Tool, ToolId, ToolKind,
};
use crate::workflows::rental::memory::{InMemoryMovementLog, MemoryStore, StaticRateTable};
use crate::workflows::rental::repository::DAILY_LATE_FEE_RATE;
use crate::workflows::rental::service::RentalService;

pub(super) type TestService = RentalService<MemoryStore, InMemoryMovementLog, StaticRateTable>;

pub(super) const LATE_FEE: i64 = 2_000;
pub(super) const RENTAL_RATE: i64 = 5_000;
pub(super) const REPLACEMENT_COST: i64 = 120_000;

pub(super) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn build_service() -> (TestService, Arc<MemoryStore>, Arc<InMemoryMovementLog>) {
    let store = Arc::new(MemoryStore::new());
    let movements = Arc::new(InMemoryMovementLog::default());
    let rates = Arc::new(StaticRateTable::new().with_rate(DAILY_LATE_FEE_RATE, LATE_FEE));
    let service = RentalService::new(store.clone(), movements.clone(), rates);
    (service, store, movements)
}

pub(super) fn register_customer(service: &TestService, name: &str) -> Customer {
    let slug = name.to_lowercase().replace(' ', ".");
    service
        .register_customer(NewCustomer {
            name: name.to_string(),
            email: format!("{slug}@example.com"),
            phone: "+56 9 5550 0000".to_string(),
        })
        .expect("customer registers")
}

pub(super) fn register_kind(
    service: &TestService,
    name: &str,
    quantity: u32,
) -> (ToolKind, Vec<Tool>) {
    let kind = service
        .register_tool_kind(
            NewToolKind {
                name: name.to_string(),
                category: "power tools".to_string(),
                quantity,
                replacement_cost: REPLACEMENT_COST,
                daily_rental_rate: RENTAL_RATE,
            },
            day(2025, 3, 1),
        )
        .expect("kind registers");
    let units = service.tools_of_kind(kind.id).expect("units listed");
    (kind, units)
}

pub(super) fn open_loan(
    service: &TestService,
    customer: CustomerId,
    tool: ToolId,
    from: NaiveDate,
    due: NaiveDate,
) -> Loan {
    service
        .create_loan(
            LoanRequest {
                customer,
                tool,
                due_date: due,
            },
            from,
        )
        .expect("loan opens")
}
