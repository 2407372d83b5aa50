use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::domain::{
    Customer, CustomerId, Fine, FineId, Loan, LoanId, MovementEvent, Tool, ToolId, ToolKind,
    ToolKindId,
};
use super::error::{NotFoundError, RentalError};
use super::repository::{
    MovementError, MovementLog, RateError, RateTable, RentalStore, RentalTx,
};

#[derive(Debug, Default, Clone)]
struct Sequences {
    customers: u64,
    tool_kinds: u64,
    tools: u64,
    loans: u64,
    fines: u64,
}

#[derive(Debug, Default, Clone)]
struct State {
    customers: BTreeMap<u64, Customer>,
    tool_kinds: BTreeMap<u64, ToolKind>,
    tools: BTreeMap<u64, Tool>,
    loans: BTreeMap<u64, Loan>,
    fines: BTreeMap<u64, Fine>,
    sweep_marker: Option<NaiveDate>,
    sequences: Sequences,
}

/// In-process store used by the service binary and the test suites.
///
/// A transaction stages a clone of the committed state and swaps it back in
/// on success, while holding the lock for its whole duration. Concurrent
/// operations therefore serialize, and an aborted transaction leaves the
/// committed state untouched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RentalStore for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, RentalError>
    where
        F: FnOnce(&mut dyn RentalTx) -> Result<T, RentalError>,
    {
        let mut committed = self.state.lock().expect("store mutex poisoned");
        let mut staged = committed.clone();
        let value = f(&mut staged)?;
        *committed = staged;
        Ok(value)
    }
}

impl RentalTx for State {
    fn customer(&self, id: CustomerId) -> Result<Customer, NotFoundError> {
        self.customers
            .get(&id.0)
            .cloned()
            .ok_or(NotFoundError::Customer(id))
    }

    fn insert_customer(&mut self, mut customer: Customer) -> Customer {
        self.sequences.customers += 1;
        customer.id = CustomerId(self.sequences.customers);
        self.customers.insert(customer.id.0, customer.clone());
        customer
    }

    fn put_customer(&mut self, customer: Customer) {
        self.customers.insert(customer.id.0, customer);
    }

    fn customers(&self) -> Vec<Customer> {
        self.customers.values().cloned().collect()
    }

    fn tool_kind(&self, id: ToolKindId) -> Result<ToolKind, NotFoundError> {
        self.tool_kinds
            .get(&id.0)
            .cloned()
            .ok_or(NotFoundError::ToolKind(id))
    }

    fn insert_tool_kind(&mut self, mut kind: ToolKind) -> ToolKind {
        self.sequences.tool_kinds += 1;
        kind.id = ToolKindId(self.sequences.tool_kinds);
        self.tool_kinds.insert(kind.id.0, kind.clone());
        kind
    }

    fn put_tool_kind(&mut self, kind: ToolKind) {
        self.tool_kinds.insert(kind.id.0, kind);
    }

    fn tool_kinds(&self) -> Vec<ToolKind> {
        self.tool_kinds.values().cloned().collect()
    }

    fn tool(&self, id: ToolId) -> Result<Tool, NotFoundError> {
        self.tools.get(&id.0).copied().ok_or(NotFoundError::Tool(id))
    }

    fn insert_tool(&mut self, mut tool: Tool) -> Tool {
        self.sequences.tools += 1;
        tool.id = ToolId(self.sequences.tools);
        self.tools.insert(tool.id.0, tool);
        tool
    }

    fn put_tool(&mut self, tool: Tool) {
        self.tools.insert(tool.id.0, tool);
    }

    fn tools(&self) -> Vec<Tool> {
        self.tools.values().copied().collect()
    }

    fn loan(&self, id: LoanId) -> Result<Loan, NotFoundError> {
        self.loans.get(&id.0).cloned().ok_or(NotFoundError::Loan(id))
    }

    fn insert_loan(&mut self, mut loan: Loan) -> Loan {
        self.sequences.loans += 1;
        loan.id = LoanId(self.sequences.loans);
        self.loans.insert(loan.id.0, loan.clone());
        loan
    }

    fn put_loan(&mut self, loan: Loan) {
        self.loans.insert(loan.id.0, loan);
    }

    fn loans(&self) -> Vec<Loan> {
        self.loans.values().cloned().collect()
    }

    fn fine(&self, id: FineId) -> Result<Fine, NotFoundError> {
        self.fines.get(&id.0).cloned().ok_or(NotFoundError::Fine(id))
    }

    fn insert_fine(&mut self, mut fine: Fine) -> Fine {
        self.sequences.fines += 1;
        fine.id = FineId(self.sequences.fines);
        self.fines.insert(fine.id.0, fine.clone());
        fine
    }

    fn put_fine(&mut self, fine: Fine) {
        self.fines.insert(fine.id.0, fine);
    }

    fn fines(&self) -> Vec<Fine> {
        self.fines.values().cloned().collect()
    }

    fn sweep_marker(&self) -> Option<NaiveDate> {
        self.sweep_marker
    }

    fn set_sweep_marker(&mut self, day: NaiveDate) {
        self.sweep_marker = Some(day);
    }
}

/// Movement log capturing events in memory for inspection.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMovementLog {
    events: Arc<Mutex<Vec<MovementEvent>>>,
}

impl InMemoryMovementLog {
    pub fn events(&self) -> Vec<MovementEvent> {
        self.events.lock().expect("movement log mutex poisoned").clone()
    }
}

impl MovementLog for InMemoryMovementLog {
    fn record(&self, event: MovementEvent) -> Result<(), MovementError> {
        self.events
            .lock()
            .expect("movement log mutex poisoned")
            .push(event);
        Ok(())
    }
}

/// Fixed rate table backed by a name-to-amount map.
#[derive(Debug, Default, Clone)]
pub struct StaticRateTable {
    rates: BTreeMap<String, i64>,
}

impl StaticRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, name: &str, amount: i64) -> Self {
        self.rates.insert(name.to_string(), amount);
        self
    }
}

impl RateTable for StaticRateTable {
    fn rate_for(&self, name: &str) -> Result<i64, RateError> {
        self.rates
            .get(name)
            .copied()
            .ok_or_else(|| RateError::Missing(name.to_string()))
    }
}
