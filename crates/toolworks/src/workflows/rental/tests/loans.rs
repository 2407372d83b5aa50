use super::common::*;
use crate::workflows::rental::domain::{
    CustomerStatus, LoanRequest, LoanStatus, MovementKind, ReturnCondition, ToolStatus,
};
use crate::workflows::rental::error::{RentalError, ValidationError};

#[test]
fn restricted_customer_cannot_borrow() {
    let (service, _, _) = build_service();
    let customer = register_customer(&service, "Marta Soto");
    let (_, units) = register_kind(&service, "angle grinder", 2);

    let loan = open_loan(
        &service,
        customer.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );
    service
        .return_loan(loan.id, ReturnCondition::Damaged, day(2025, 3, 11))
        .expect("damaged return accepted");

    let denied = service.create_loan(
        LoanRequest {
            customer: customer.id,
            tool: units[1].id,
            due_date: day(2025, 3, 20),
        },
        day(2025, 3, 11),
    );
    assert!(matches!(
        denied,
        Err(RentalError::Validation(ValidationError::CustomerRestricted(id))) if id == customer.id
    ));
}

#[test]
fn five_active_loans_is_the_ceiling() {
    let (service, _, _) = build_service();
    let customer = register_customer(&service, "Pedro Rojas");

    let mut units = Vec::new();
    for index in 0..6 {
        let (_, mut kind_units) = register_kind(&service, &format!("ladder {index}"), 1);
        units.push(kind_units.remove(0));
    }

    for unit in units.iter().take(5) {
        open_loan(
            &service,
            customer.id,
            unit.id,
            day(2025, 3, 10),
            day(2025, 3, 14),
        );
    }

    let sixth = service.create_loan(
        LoanRequest {
            customer: customer.id,
            tool: units[5].id,
            due_date: day(2025, 3, 14),
        },
        day(2025, 3, 10),
    );
    assert!(matches!(
        sixth,
        Err(RentalError::Validation(ValidationError::ActiveLoanLimit { limit: 5, .. }))
    ));
}

#[test]
fn second_unit_of_same_kind_is_rejected() {
    let (service, _, _) = build_service();
    let customer = register_customer(&service, "Elena Diaz");
    let (kind, units) = register_kind(&service, "circular saw", 2);

    open_loan(
        &service,
        customer.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );

    let duplicate = service.create_loan(
        LoanRequest {
            customer: customer.id,
            tool: units[1].id,
            due_date: day(2025, 3, 14),
        },
        day(2025, 3, 10),
    );
    assert!(matches!(
        duplicate,
        Err(RentalError::Validation(ValidationError::DuplicateKindHeld { kind: held, .. }))
            if held == kind.id
    ));
}

#[test]
fn exhausted_stock_is_rejected() {
    let (service, _, _) = build_service();
    let first = register_customer(&service, "Ana Perez");
    let second = register_customer(&service, "Luis Vega");
    let (kind, units) = register_kind(&service, "tile cutter", 1);

    open_loan(
        &service,
        first.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );

    let denied = service.create_loan(
        LoanRequest {
            customer: second.id,
            tool: units[0].id,
            due_date: day(2025, 3, 14),
        },
        day(2025, 3, 10),
    );
    assert!(matches!(
        denied,
        Err(RentalError::Validation(ValidationError::OutOfStock(id))) if id == kind.id
    ));
}

#[test]
fn borrowed_unit_is_rejected_even_with_stock_left() {
    let (service, _, _) = build_service();
    let first = register_customer(&service, "Ana Perez");
    let second = register_customer(&service, "Luis Vega");
    let (_, units) = register_kind(&service, "tile cutter", 2);

    open_loan(
        &service,
        first.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );

    let denied = service.create_loan(
        LoanRequest {
            customer: second.id,
            tool: units[0].id,
            due_date: day(2025, 3, 14),
        },
        day(2025, 3, 10),
    );
    assert!(matches!(
        denied,
        Err(RentalError::Validation(ValidationError::ToolAlreadyBorrowed(id)))
            if id == units[0].id
    ));
}

#[test]
fn due_date_must_fall_after_loan_date() {
    let (service, _, _) = build_service();
    let customer = register_customer(&service, "Ana Perez");
    let (_, units) = register_kind(&service, "heat gun", 1);

    for due in [day(2025, 3, 10), day(2025, 3, 9)] {
        let denied = service.create_loan(
            LoanRequest {
                customer: customer.id,
                tool: units[0].id,
                due_date: due,
            },
            day(2025, 3, 10),
        );
        assert!(matches!(
            denied,
            Err(RentalError::Validation(
                ValidationError::DueDateNotAfterLoanDate { .. }
            ))
        ));
    }
}

#[test]
fn loan_value_prices_the_full_span() {
    let (service, _, _) = build_service();
    let customer = register_customer(&service, "Ana Perez");
    let (_, units) = register_kind(&service, "heat gun", 1);

    let loan = open_loan(
        &service,
        customer.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );
    assert_eq!(loan.loan_value, 4 * RENTAL_RATE);
    assert_eq!(loan.loan_date, day(2025, 3, 10));
    assert_eq!(loan.status, LoanStatus::Active);
}

#[test]
fn punctual_good_return_completes_the_loan() {
    let (service, _, movements) = build_service();
    let customer = register_customer(&service, "Ana Perez");
    let (kind, units) = register_kind(&service, "heat gun", 1);

    let loan = open_loan(
        &service,
        customer.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );
    let returned = service
        .return_loan(loan.id, ReturnCondition::Good, day(2025, 3, 14))
        .expect("return accepted");

    assert_eq!(returned.status, LoanStatus::Completed);
    assert_eq!(
        service.tool(units[0].id).expect("tool").status,
        ToolStatus::Available
    );
    assert_eq!(
        service.tool_kind(kind.id).expect("kind").available_stock,
        1
    );
    assert_eq!(
        service.customer(customer.id).expect("customer").status,
        CustomerStatus::Active
    );

    let kinds: Vec<MovementKind> = movements
        .events()
        .into_iter()
        .filter(|event| event.tool == units[0].id)
        .map(|event| event.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![MovementKind::Intake, MovementKind::Loan, MovementKind::Return]
    );
}

#[test]
fn late_good_return_parks_the_loan_for_its_fine() {
    let (service, _, _) = build_service();
    let customer = register_customer(&service, "Ana Perez");
    let (kind, units) = register_kind(&service, "heat gun", 1);

    let loan = open_loan(
        &service,
        customer.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );
    let returned = service
        .return_loan(loan.id, ReturnCondition::Good, day(2025, 3, 16))
        .expect("return accepted");

    assert_eq!(returned.status, LoanStatus::PendingFine);
    assert_eq!(
        service.tool(units[0].id).expect("tool").status,
        ToolStatus::Available
    );
    assert_eq!(service.tool_kind(kind.id).expect("kind").available_stock, 1);
}

#[test]
fn damaged_return_restricts_the_customer() {
    let (service, _, movements) = build_service();
    let customer = register_customer(&service, "Ana Perez");
    let (kind, units) = register_kind(&service, "heat gun", 1);

    let loan = open_loan(
        &service,
        customer.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );
    let returned = service
        .return_loan(loan.id, ReturnCondition::Damaged, day(2025, 3, 12))
        .expect("return accepted");

    assert_eq!(returned.status, LoanStatus::PendingEvaluation);
    assert_eq!(
        service.tool(units[0].id).expect("tool").status,
        ToolStatus::UnderRepair
    );
    // The unit is in the repair bay, not back in stock.
    assert_eq!(service.tool_kind(kind.id).expect("kind").available_stock, 0);

    let customer = service.customer(customer.id).expect("customer");
    assert_eq!(customer.status, CustomerStatus::Restricted);
    assert_eq!(customer.open_obligations, 1);

    let kinds: Vec<MovementKind> = movements
        .events()
        .into_iter()
        .filter(|event| event.tool == units[0].id)
        .map(|event| event.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            MovementKind::Intake,
            MovementKind::Loan,
            MovementKind::Repair,
            MovementKind::Return
        ]
    );
}

#[test]
fn settled_loan_cannot_be_returned_again() {
    let (service, _, _) = build_service();
    let customer = register_customer(&service, "Ana Perez");
    let (_, units) = register_kind(&service, "heat gun", 1);

    let loan = open_loan(
        &service,
        customer.id,
        units[0].id,
        day(2025, 3, 10),
        day(2025, 3, 14),
    );
    service
        .return_loan(loan.id, ReturnCondition::Good, day(2025, 3, 12))
        .expect("first return accepted");

    let second = service.return_loan(loan.id, ReturnCondition::Good, day(2025, 3, 13));
    assert!(matches!(
        second,
        Err(RentalError::Validation(ValidationError::LoanNotReturnable {
            status: LoanStatus::Completed,
            ..
        }))
    ));
}
