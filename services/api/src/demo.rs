use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use clap::Args;

use toolworks::error::AppError;
use toolworks::workflows::rental::{
    DamageAssessment, InMemoryMovementLog, LoanRequest, MemoryStore, NewCustomer, NewToolKind,
    RentalService, ReturnCondition,
};

use crate::infra::{default_rate_table, parse_date};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the demo loans are taken out (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let start = args.start.unwrap_or_else(|| Local::now().date_naive());

    let store = Arc::new(MemoryStore::new());
    let movements = Arc::new(InMemoryMovementLog::default());
    let service = RentalService::new(store, movements.clone(), Arc::new(default_rate_table()));

    println!("Tool rental lifecycle demo (loans taken out {start})");

    let drill = service.register_tool_kind(
        NewToolKind {
            name: "hammer drill".to_string(),
            category: "power tools".to_string(),
            quantity: 2,
            replacement_cost: 180_000,
            daily_rental_rate: 9_000,
        },
        start,
    )?;
    let customer = service.register_customer(NewCustomer {
        name: "Rosa Fuentes".to_string(),
        email: "rosa.fuentes@example.com".to_string(),
        phone: "+56 9 5550 1234".to_string(),
    })?;
    println!(
        "registered customer '{}' and stocked {} units of '{}'",
        customer.name, drill.total_units, drill.name
    );

    let unit = service
        .tools_of_kind(drill.id)?
        .into_iter()
        .next()
        .expect("unit just registered");

    let loan = service.create_loan(
        LoanRequest {
            customer: customer.id,
            tool: unit.id,
            due_date: start + Duration::days(3),
        },
        start,
    )?;
    println!(
        "loan {} opened for tool {} (value {}, due {})",
        loan.id, loan.tool, loan.loan_value, loan.due_date
    );

    // Miss the due date and let the daily sweep catch it.
    let late_day = start + Duration::days(5);
    let report = service.run_overdue_sweep(late_day)?;
    println!(
        "sweep on {late_day}: promoted {} loan(s) to overdue",
        report.promoted
    );

    let loan = service.return_loan(loan.id, ReturnCondition::Damaged, late_day)?;
    println!("tool came back damaged; loan is now {}", loan.status.label());

    let damage_fine = service.assess_damage(
        loan.id,
        DamageAssessment::Minor {
            repair_cost: 25_000,
        },
        late_day,
    )?;
    println!(
        "minor damage assessed: fine {} over {}",
        damage_fine.id, damage_fine.amount
    );

    for fine in service.fines_for_customer(customer.id)? {
        let paid = service.pay_fine(fine.id)?;
        let customer = service.customer(paid.customer)?;
        println!(
            "paid {} fine of {}; customer is now {}",
            paid.kind.label(),
            paid.amount,
            customer.status.label()
        );
    }

    println!(
        "{} movement events recorded",
        movements.events().len()
    );
    Ok(())
}
