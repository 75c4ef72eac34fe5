use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{
    EmployeeChanges, NewEmployee, PayrollStore, Settle, StoreError, StoreResult, written_rows,
};
use crate::model::deduction::{Deduction, DeductionDraft};
use crate::model::employee::{Employee, EmployeeWithDeductions, EmployeeWithNetPay};
use crate::payroll;

/// Process-local store. A single lock guards both tables, so every operation
/// is atomic and updates of the same employee are serialized.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    employees: HashMap<String, Employee>,
    // keyed by deduction id
    deductions: BTreeMap<String, Deduction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tables {
    fn employee(&self, employee_id: &str) -> StoreResult<&Employee> {
        self.employees
            .get(employee_id)
            .ok_or_else(|| StoreError::employee_not_found(employee_id))
    }

    /// Names compare byte for byte, like the binary collation of the MySQL
    /// `employees.name` column.
    fn name_taken(&self, name: &str, except: Option<&str>) -> bool {
        self.employees
            .values()
            .any(|e| e.name == name && Some(e.id.as_str()) != except)
    }

    fn deductions_of(&self, employee_id: &str) -> Vec<Deduction> {
        let mut rows: Vec<Deduction> = self
            .deductions
            .values()
            .filter(|d| d.employee_id == employee_id)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.deduction_type);
        rows
    }

    fn upsert(&mut self, employee_id: &str, drafts: Vec<DeductionDraft>) {
        for draft in drafts {
            let existing = self
                .deductions
                .values_mut()
                .find(|d| d.employee_id == employee_id && d.deduction_type == draft.deduction_type);

            match existing {
                Some(row) => row.deduction_amount = draft.deduction_amount,
                None => {
                    let row = Deduction {
                        id: draft.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                        employee_id: employee_id.to_string(),
                        deduction_type: draft.deduction_type,
                        deduction_amount: draft.deduction_amount,
                    };
                    self.deductions.insert(row.id.clone(), row);
                }
            }
        }
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn list_employees(&self) -> StoreResult<Vec<EmployeeWithNetPay>> {
        let tables = self.lock();
        let mut employees: Vec<&Employee> = tables.employees.values().collect();
        employees.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));

        Ok(employees
            .into_iter()
            .map(|e| {
                let total = payroll::total_deductions(
                    tables
                        .deductions
                        .values()
                        .filter(|d| d.employee_id == e.id)
                        .map(|d| d.deduction_amount),
                );
                EmployeeWithNetPay::new(e.clone(), total)
            })
            .collect())
    }

    async fn find_employee(&self, employee_id: &str) -> StoreResult<Employee> {
        self.lock().employee(employee_id).cloned()
    }

    async fn deductions_for_employee(&self, employee_id: &str) -> StoreResult<Vec<Deduction>> {
        Ok(self.lock().deductions_of(employee_id))
    }

    async fn create_employee(
        &self,
        employee: NewEmployee,
        deductions: Vec<DeductionDraft>,
    ) -> StoreResult<EmployeeWithDeductions> {
        let mut tables = self.lock();
        if tables.name_taken(&employee.name, None) {
            return Err(StoreError::DuplicateName);
        }

        let now = Utc::now();
        let created = Employee {
            id: Uuid::new_v4().to_string(),
            name: employee.name,
            salary: employee.salary,
            created_at: now,
            updated_at: now,
        };
        tables.employees.insert(created.id.clone(), created.clone());
        tables.upsert(&created.id, deductions);

        let deductions = tables.deductions_of(&created.id);
        Ok(EmployeeWithDeductions::new(created, deductions))
    }

    async fn update_employee(
        &self,
        employee_id: &str,
        changes: EmployeeChanges,
        settle: &Settle,
    ) -> StoreResult<EmployeeWithDeductions> {
        let mut tables = self.lock();
        let mut employee = tables.employee(employee_id)?.clone();

        if let Some(name) = &changes.name {
            if tables.name_taken(name, Some(employee_id)) {
                return Err(StoreError::DuplicateName);
            }
        }

        if !changes.is_empty() {
            if let Some(name) = changes.name {
                employee.name = name;
            }
            if let Some(salary) = changes.salary {
                employee.salary = salary;
            }
            employee.updated_at = Utc::now();
            tables.employees.insert(employee.id.clone(), employee.clone());
        }

        let existing = tables.deductions_of(employee_id);
        let settled = settle(employee.salary, existing);
        debug!(employee_id, count = settled.len(), "Upserting settled deductions");
        tables.upsert(employee_id, settled);

        let deductions = tables.deductions_of(employee_id);
        Ok(EmployeeWithDeductions::new(employee, deductions))
    }

    async fn upsert_deductions(
        &self,
        employee_id: &str,
        deductions: Vec<DeductionDraft>,
    ) -> StoreResult<Vec<Deduction>> {
        let mut tables = self.lock();
        tables.employee(employee_id)?;
        tables.upsert(employee_id, deductions.clone());
        Ok(written_rows(tables.deductions_of(employee_id), &deductions))
    }

    async fn delete_employee(&self, employee_id: &str) -> StoreResult<bool> {
        let mut tables = self.lock();
        if tables.employees.remove(employee_id).is_none() {
            return Ok(false);
        }
        tables.deductions.retain(|_, d| d.employee_id != employee_id);
        Ok(true)
    }

    async fn delete_deduction(&self, deduction_id: &str) -> StoreResult<bool> {
        Ok(self.lock().deductions.remove(deduction_id).is_some())
    }
}
