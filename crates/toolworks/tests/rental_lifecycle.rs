//! Integration specifications for the rental lifecycle and penalty engine.
//!
//! Scenarios drive the public service facade and HTTP router end to end:
//! loan creation, punctual and late returns, damage assessment, the daily
//! overdue sweep, and the fine-payment cascade that releases a customer.

mod common {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use toolworks::workflows::rental::{
        Customer, CustomerId, InMemoryMovementLog, Loan, LoanRequest, MemoryStore, NewCustomer,
        NewToolKind, RentalService, StaticRateTable, Tool, ToolId, ToolKind,
        DAILY_LATE_FEE_RATE,
    };

    pub(super) type Service = RentalService<MemoryStore, InMemoryMovementLog, StaticRateTable>;

    pub(super) const LATE_FEE: i64 = 2_500;
    pub(super) const RENTAL_RATE: i64 = 8_000;
    pub(super) const REPLACEMENT_COST: i64 = 200_000;

    pub(super) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    pub(super) fn build_service() -> (Service, Arc<InMemoryMovementLog>) {
        let store = Arc::new(MemoryStore::new());
        let movements = Arc::new(InMemoryMovementLog::default());
        let rates = Arc::new(StaticRateTable::new().with_rate(DAILY_LATE_FEE_RATE, LATE_FEE));
        let service = RentalService::new(store, movements.clone(), rates);
        (service, movements)
    }

    pub(super) fn customer(service: &Service, name: &str, email: &str) -> Customer {
        service
            .register_customer(NewCustomer {
                name: name.to_string(),
                email: email.to_string(),
                phone: "+56 9 5550 0000".to_string(),
            })
            .expect("customer registers")
    }

    pub(super) fn catalog(service: &Service, name: &str, quantity: u32) -> (ToolKind, Vec<Tool>) {
        let kind = service
            .register_tool_kind(
                NewToolKind {
                    name: name.to_string(),
                    category: "workshop".to_string(),
                    quantity,
                    replacement_cost: REPLACEMENT_COST,
                    daily_rental_rate: RENTAL_RATE,
                },
                day(2025, 6, 1),
            )
            .expect("kind registers");
        let units = service.tools_of_kind(kind.id).expect("units listed");
        (kind, units)
    }

    pub(super) fn open_loan(
        service: &Service,
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
}

mod lifecycle {
    use super::common::*;
    use toolworks::workflows::rental::{
        CustomerStatus, LoanRequest, LoanStatus, MovementKind, RentalError, ReturnCondition,
        ToolStatus, ValidationError,
    };

    #[test]
    fn punctual_return_leaves_no_trace_on_the_customer() {
        let (service, movements) = build_service();
        let borrower = customer(&service, "Ana Perez", "ana@example.com");
        let (kind, units) = catalog(&service, "rotary hammer", 2);

        let loan = open_loan(
            &service,
            borrower.id,
            units[0].id,
            day(2025, 6, 2),
            day(2025, 6, 6),
        );
        assert_eq!(loan.loan_value, 4 * RENTAL_RATE);

        let returned = service
            .return_loan(loan.id, ReturnCondition::Good, day(2025, 6, 6))
            .expect("return accepted");

        assert_eq!(returned.status, LoanStatus::Completed);
        assert_eq!(
            service.tool(units[0].id).expect("tool").status,
            ToolStatus::Available
        );
        assert_eq!(service.tool_kind(kind.id).expect("kind").available_stock, 2);
        assert_eq!(
            service.customer(borrower.id).expect("customer").status,
            CustomerStatus::Active
        );

        let recorded: Vec<MovementKind> = movements
            .events()
            .into_iter()
            .filter(|event| event.tool == units[0].id)
            .map(|event| event.kind)
            .collect();
        assert_eq!(
            recorded,
            vec![MovementKind::Intake, MovementKind::Loan, MovementKind::Return]
        );
    }

    #[test]
    fn released_customer_can_borrow_again() {
        let (service, _) = build_service();
        let borrower = customer(&service, "Ana Perez", "ana@example.com");
        let (_, units) = catalog(&service, "rotary hammer", 2);

        let loan = open_loan(
            &service,
            borrower.id,
            units[0].id,
            day(2025, 6, 2),
            day(2025, 6, 4),
        );
        service
            .run_overdue_sweep(day(2025, 6, 7))
            .expect("sweep runs");

        // Restricted while the loan is overdue.
        let denied = service.create_loan(
            LoanRequest {
                customer: borrower.id,
                tool: units[1].id,
                due_date: day(2025, 6, 12),
            },
            day(2025, 6, 7),
        );
        assert!(matches!(
            denied,
            Err(RentalError::Validation(
                ValidationError::CustomerRestricted(_)
            ))
        ));

        service
            .return_loan(loan.id, ReturnCondition::Good, day(2025, 6, 7))
            .expect("return accepted");
        let fine = service
            .fines_for_customer(borrower.id)
            .expect("fines")
            .remove(0);
        service.pay_fine(fine.id).expect("payment accepted");

        // Fully settled: the next loan goes through.
        let reopened = service.create_loan(
            LoanRequest {
                customer: borrower.id,
                tool: units[1].id,
                due_date: day(2025, 6, 12),
            },
            day(2025, 6, 7),
        );
        assert!(reopened.is_ok());
    }
}

mod penalties {
    use super::common::*;
    use toolworks::workflows::rental::{
        CustomerStatus, DamageAssessment, FineKind, FineStatus, LoanStatus, ToolStatus,
    };
    use toolworks::workflows::rental::ReturnCondition;

    #[test]
    fn damaged_overdue_loan_settles_through_both_fines() {
        let (service, _) = build_service();
        let borrower = customer(&service, "Ana Perez", "ana@example.com");
        let (kind, units) = catalog(&service, "rotary hammer", 1);

        let loan = open_loan(
            &service,
            borrower.id,
            units[0].id,
            day(2025, 6, 2),
            day(2025, 6, 4),
        );
        service
            .run_overdue_sweep(day(2025, 6, 7))
            .expect("sweep runs");
        service
            .return_loan(loan.id, ReturnCondition::Damaged, day(2025, 6, 7))
            .expect("return accepted");

        let verdict = service
            .assess_damage(
                loan.id,
                DamageAssessment::Minor { repair_cost: 40_000 },
                day(2025, 6, 8),
            )
            .expect("assessment accepted");
        assert_eq!(verdict.kind, FineKind::MinorDamage);

        let fines = service.fines_for_customer(borrower.id).expect("fines");
        assert_eq!(fines.len(), 2);
        let late = fines
            .iter()
            .find(|fine| fine.kind == FineKind::Late)
            .expect("late fine");
        assert_eq!(late.amount, 3 * LATE_FEE);

        // Late fine first: the damage fine still blocks completion.
        service.pay_fine(late.id).expect("late payment");
        assert_eq!(
            service.loan(loan.id).expect("loan").status,
            LoanStatus::PendingFine
        );
        assert_eq!(
            service.customer(borrower.id).expect("customer").status,
            CustomerStatus::Restricted
        );

        service.pay_fine(verdict.id).expect("damage payment");
        assert_eq!(
            service.loan(loan.id).expect("loan").status,
            LoanStatus::CompletedWithFine
        );
        assert_eq!(
            service.customer(borrower.id).expect("customer").status,
            CustomerStatus::Active
        );

        // The unit is still in the repair bay; completing the repair
        // restores the stock drained at checkout.
        assert_eq!(
            service.tool(units[0].id).expect("tool").status,
            ToolStatus::UnderRepair
        );
        service
            .complete_repair(units[0].id)
            .expect("repair completes");
        assert_eq!(service.tool_kind(kind.id).expect("kind").available_stock, 1);
    }

    #[test]
    fn irreparable_damage_retires_the_unit() {
        let (service, _) = build_service();
        let borrower = customer(&service, "Ana Perez", "ana@example.com");
        let (kind, units) = catalog(&service, "rotary hammer", 2);

        let loan = open_loan(
            &service,
            borrower.id,
            units[0].id,
            day(2025, 6, 2),
            day(2025, 6, 6),
        );
        service
            .return_loan(loan.id, ReturnCondition::Damaged, day(2025, 6, 5))
            .expect("return accepted");

        let fine = service
            .assess_damage(loan.id, DamageAssessment::Irreparable, day(2025, 6, 6))
            .expect("assessment accepted");
        assert_eq!(fine.kind, FineKind::IrreparableDamage);
        assert_eq!(fine.amount, REPLACEMENT_COST);
        assert_eq!(fine.status, FineStatus::Unpaid);

        let kind = service.tool_kind(kind.id).expect("kind");
        assert_eq!(kind.total_units, 1);
        assert_eq!(
            service.tool(units[0].id).expect("tool").status,
            ToolStatus::Decommissioned
        );

        service.pay_fine(fine.id).expect("payment accepted");
        assert_eq!(
            service.customer(borrower.id).expect("customer").status,
            CustomerStatus::Active
        );
    }
}

mod sweeping {
    use super::common::*;
    use toolworks::workflows::rental::{FineKind, LoanStatus};

    #[test]
    fn the_daily_pass_is_idempotent_within_a_day() {
        let (service, _) = build_service();
        let borrower = customer(&service, "Ana Perez", "ana@example.com");
        let (_, units) = catalog(&service, "rotary hammer", 1);

        open_loan(
            &service,
            borrower.id,
            units[0].id,
            day(2025, 6, 2),
            day(2025, 6, 4),
        );

        let first = service
            .run_overdue_sweep(day(2025, 6, 6))
            .expect("first run");
        let second = service
            .run_overdue_sweep(day(2025, 6, 6))
            .expect("second run");

        assert_eq!(first.promoted, 1);
        assert!(second.skipped);

        let fines = service.fines_for_customer(borrower.id).expect("fines");
        assert_eq!(fines.len(), 1);
        assert_eq!(fines[0].kind, FineKind::Late);
        assert_eq!(fines[0].amount, 2 * LATE_FEE);
    }

    #[test]
    fn the_accruing_amount_is_replaced_day_over_day() {
        let (service, _) = build_service();
        let borrower = customer(&service, "Ana Perez", "ana@example.com");
        let (_, units) = catalog(&service, "rotary hammer", 1);

        let loan = open_loan(
            &service,
            borrower.id,
            units[0].id,
            day(2025, 6, 2),
            day(2025, 6, 4),
        );

        service.run_overdue_sweep(day(2025, 6, 6)).expect("day one");
        service.run_overdue_sweep(day(2025, 6, 9)).expect("day two");

        assert_eq!(
            service.loan(loan.id).expect("loan").status,
            LoanStatus::Overdue
        );
        let fines = service.fines_for_customer(borrower.id).expect("fines");
        assert_eq!(fines.len(), 1);
        assert_eq!(fines[0].amount, 5 * LATE_FEE);
    }
}

mod routing {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::common::*;
    use toolworks::workflows::rental::rental_router;

    async fn read_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn post(uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn the_whole_lifecycle_runs_over_http() {
        let (service, _) = build_service();
        let router = rental_router(Arc::new(service));

        let response = router
            .clone()
            .oneshot(post(
                "/api/v1/rental/customers",
                json!({
                    "name": "Ana Perez",
                    "email": "ana@example.com",
                    "phone": "+56 9 5550 0000",
                }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let customer_id = read_json(response)
            .await
            .get("id")
            .and_then(Value::as_u64)
            .expect("customer id");

        let response = router
            .clone()
            .oneshot(post(
                "/api/v1/rental/tool-kinds",
                json!({
                    "name": "rotary hammer",
                    "category": "workshop",
                    "quantity": 1,
                    "replacement_cost": 200000,
                    "daily_rental_rate": 8000,
                    "today": "2025-06-01",
                }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let kind_id = read_json(response)
            .await
            .get("id")
            .and_then(Value::as_u64)
            .expect("kind id");

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/v1/rental/tool-kinds/{kind_id}/units"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let tool_id = read_json(response)
            .await
            .as_array()
            .and_then(|units| units.first())
            .and_then(|unit| unit.get("id"))
            .and_then(Value::as_u64)
            .expect("one unit stocked");

        let response = router
            .clone()
            .oneshot(post(
                "/api/v1/rental/loans",
                json!({
                    "customer_id": customer_id,
                    "tool_id": tool_id,
                    "due_date": "2025-06-04",
                    "today": "2025-06-02",
                }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let loan_id = read_json(response)
            .await
            .get("id")
            .and_then(Value::as_u64)
            .expect("loan id");

        let response = router
            .clone()
            .oneshot(post(
                "/api/v1/rental/sweep",
                json!({ "today": "2025-06-06" }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response)
                .await
                .get("promoted")
                .and_then(Value::as_u64),
            Some(1)
        );

        let response = router
            .clone()
            .oneshot(post(
                &format!("/api/v1/rental/loans/{loan_id}/return"),
                json!({ "condition": "good", "today": "2025-06-06" }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await.get("status"),
            Some(&json!("pending_fine"))
        );

        let response = router
            .clone()
            .oneshot(post("/api/v1/rental/fines/1/payment", json!({})))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await.get("status"),
            Some(&json!("paid"))
        );

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/v1/rental/customers/{customer_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await.get("status"),
            Some(&json!("active"))
        );
    }
}
