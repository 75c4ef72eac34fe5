//! Storage port for employees and their deductions.
//!
//! Handlers only talk to [`PayrollStore`]; the MySQL implementation is used in
//! production and the in-memory one for tests and local runs.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use derive_more::{Display, Error, From};

use crate::model::deduction::{Deduction, DeductionDraft};
use crate::model::employee::{Employee, EmployeeWithDeductions, EmployeeWithNetPay};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Computes the deductions to persist from the employee's salary after the
/// update and the deductions currently stored. Runs inside the store's unit of
/// work.
pub type Settle = dyn Fn(f64, Vec<Deduction>) -> Vec<DeductionDraft> + Send + Sync;

#[derive(Debug, Display, From, Error)]
pub enum StoreError {
    #[from(ignore)]
    #[display(fmt = "{} with id {} not found", entity, id)]
    NotFound { entity: &'static str, id: String },

    #[from(ignore)]
    #[display(fmt = "An employee with that name already exists.")]
    DuplicateName,

    #[from(ignore)]
    #[display(fmt = "corrupt row: {}", _0)]
    Corrupt(#[error(not(source))] String),

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn employee_not_found(id: &str) -> Self {
        StoreError::NotFound {
            entity: "Employee",
            id: id.to_string(),
        }
    }

    pub fn deduction_not_found(id: &str) -> Self {
        StoreError::NotFound {
            entity: "Employee deduction",
            id: id.to_string(),
        }
    }
}

/// Rows of `stored` whose category appears in `drafts`, i.e. the rows an
/// upsert of `drafts` wrote.
pub fn written_rows(stored: Vec<Deduction>, drafts: &[DeductionDraft]) -> Vec<Deduction> {
    stored
        .into_iter()
        .filter(|row| drafts.iter().any(|d| d.deduction_type == row.deduction_type))
        .collect()
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub salary: f64,
}

/// Partial employee update; `None` leaves the field as stored.
#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub salary: Option<f64>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.salary.is_none()
    }
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Every employee with derived total deductions and net pay.
    async fn list_employees(&self) -> StoreResult<Vec<EmployeeWithNetPay>>;

    async fn find_employee(&self, employee_id: &str) -> StoreResult<Employee>;

    /// All deductions of an employee; empty when there are none.
    async fn deductions_for_employee(&self, employee_id: &str) -> StoreResult<Vec<Deduction>>;

    /// Inserts the employee and its deductions as one unit.
    async fn create_employee(
        &self,
        employee: NewEmployee,
        deductions: Vec<DeductionDraft>,
    ) -> StoreResult<EmployeeWithDeductions>;

    /// Applies `changes`, then upserts whatever `settle` returns for the
    /// post-update salary and the stored deductions. The whole sequence is
    /// serialized per employee and either fully applied or not at all.
    async fn update_employee(
        &self,
        employee_id: &str,
        changes: EmployeeChanges,
        settle: &Settle,
    ) -> StoreResult<EmployeeWithDeductions>;

    /// Inserts or updates rows keyed by (employee, category) and returns the
    /// written rows. Fails with `NotFound` when the employee does not exist.
    async fn upsert_deductions(
        &self,
        employee_id: &str,
        deductions: Vec<DeductionDraft>,
    ) -> StoreResult<Vec<Deduction>>;

    /// Returns false when no employee had that id. Owned deductions go with it.
    async fn delete_employee(&self, employee_id: &str) -> StoreResult<bool>;

    async fn delete_deduction(&self, deduction_id: &str) -> StoreResult<bool>;
}
