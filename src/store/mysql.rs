use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use tracing::{debug, error};
use uuid::Uuid;

use super::{
    EmployeeChanges, NewEmployee, PayrollStore, Settle, StoreError, StoreResult, written_rows,
};
use crate::model::deduction::{Deduction, DeductionDraft, DeductionType};
use crate::model::employee::{Employee, EmployeeWithDeductions, EmployeeWithNetPay};

// MySQL reports unique-key violations under this SQLSTATE
const INTEGRITY_CONSTRAINT_VIOLATION: &str = "23000";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct DeductionRow {
    id: String,
    employee_id: String,
    deduction_type: String,
    deduction_amount: f64,
}

#[derive(FromRow)]
struct EmployeeTotalRow {
    #[sqlx(flatten)]
    employee: Employee,
    total_deductions: f64,
}

impl TryFrom<DeductionRow> for Deduction {
    type Error = StoreError;

    fn try_from(row: DeductionRow) -> Result<Self, Self::Error> {
        let deduction_type = DeductionType::from_str(&row.deduction_type).map_err(|_| {
            StoreError::Corrupt(format!(
                "deduction {} has unknown type {}",
                row.id, row.deduction_type
            ))
        })?;

        Ok(Deduction {
            id: row.id,
            employee_id: row.employee_id,
            deduction_type,
            deduction_amount: row.deduction_amount,
        })
    }
}

fn map_name_conflict(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some(INTEGRITY_CONSTRAINT_VIOLATION) {
            return StoreError::DuplicateName;
        }
    }
    StoreError::Database(e)
}

async fn fetch_employee(conn: &mut MySqlConnection, employee_id: &str) -> StoreResult<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, name, salary, created_at, updated_at
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(employee)
}

/// Takes the row lock that serializes writers of one employee for the rest of
/// the transaction.
async fn lock_employee(conn: &mut MySqlConnection, employee_id: &str) -> StoreResult<()> {
    let found = sqlx::query_scalar::<_, String>("SELECT id FROM employees WHERE id = ? FOR UPDATE")
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::employee_not_found(employee_id)),
    }
}

async fn fetch_deductions(conn: &mut MySqlConnection, employee_id: &str) -> StoreResult<Vec<Deduction>> {
    let rows = sqlx::query_as::<_, DeductionRow>(
        r#"
        SELECT id, employee_id, deduction_type, deduction_amount
        FROM employee_deductions
        WHERE employee_id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut deductions = rows
        .into_iter()
        .map(Deduction::try_from)
        .collect::<StoreResult<Vec<_>>>()?;
    deductions.sort_by_key(|d| d.deduction_type);
    Ok(deductions)
}

async fn upsert_rows(
    conn: &mut MySqlConnection,
    employee_id: &str,
    drafts: &[DeductionDraft],
) -> StoreResult<()> {
    for draft in drafts {
        let id = draft
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        sqlx::query(
            r#"
            INSERT INTO employee_deductions
            (id, employee_id, deduction_type, deduction_amount)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE deduction_amount = VALUES(deduction_amount)
            "#,
        )
        .bind(id)
        .bind(employee_id)
        .bind(draft.deduction_type.as_ref())
        .bind(draft.deduction_amount)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl PayrollStore for MySqlStore {
    async fn list_employees(&self) -> StoreResult<Vec<EmployeeWithNetPay>> {
        // 0e0 keeps the fallback a DOUBLE
        let rows = sqlx::query_as::<_, EmployeeTotalRow>(
            r#"
            SELECT
                e.id,
                e.name,
                e.salary,
                e.created_at,
                e.updated_at,
                COALESCE(SUM(d.deduction_amount), 0e0) AS total_deductions
            FROM employees e
            LEFT JOIN employee_deductions d ON d.employee_id = e.id
            GROUP BY e.id
            ORDER BY e.created_at, e.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| EmployeeWithNetPay::new(row.employee, row.total_deductions))
            .collect())
    }

    async fn find_employee(&self, employee_id: &str) -> StoreResult<Employee> {
        let mut conn = self.pool.acquire().await?;
        fetch_employee(&mut conn, employee_id)
            .await?
            .ok_or_else(|| StoreError::employee_not_found(employee_id))
    }

    async fn deductions_for_employee(&self, employee_id: &str) -> StoreResult<Vec<Deduction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_deductions(&mut conn, employee_id).await
    }

    async fn create_employee(
        &self,
        employee: NewEmployee,
        deductions: Vec<DeductionDraft>,
    ) -> StoreResult<EmployeeWithDeductions> {
        let mut tx = self.pool.begin().await?;
        let employee_id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO employees (id, name, salary) VALUES (?, ?, ?)")
            .bind(&employee_id)
            .bind(&employee.name)
            .bind(employee.salary)
            .execute(&mut *tx)
            .await
            .map_err(map_name_conflict)?;

        upsert_rows(&mut tx, &employee_id, &deductions).await?;

        let created = fetch_employee(&mut tx, &employee_id)
            .await?
            .ok_or_else(|| StoreError::employee_not_found(&employee_id))?;
        let deductions = fetch_deductions(&mut tx, &employee_id).await?;

        tx.commit().await?;
        Ok(EmployeeWithDeductions::new(created, deductions))
    }

    async fn update_employee(
        &self,
        employee_id: &str,
        changes: EmployeeChanges,
        settle: &Settle,
    ) -> StoreResult<EmployeeWithDeductions> {
        let mut tx = self.pool.begin().await?;
        lock_employee(&mut tx, employee_id).await?;

        if !changes.is_empty() {
            sqlx::query(
                r#"
                UPDATE employees
                SET name = COALESCE(?, name), salary = COALESCE(?, salary)
                WHERE id = ?
                "#,
            )
            .bind(changes.name)
            .bind(changes.salary)
            .bind(employee_id)
            .execute(&mut *tx)
            .await
            .map_err(map_name_conflict)?;
        }

        let employee = fetch_employee(&mut tx, employee_id)
            .await?
            .ok_or_else(|| StoreError::employee_not_found(employee_id))?;

        let existing = fetch_deductions(&mut tx, employee_id).await?;
        let settled = settle(employee.salary, existing);
        debug!(employee_id, count = settled.len(), "Upserting settled deductions");
        upsert_rows(&mut tx, employee_id, &settled).await?;

        let deductions = fetch_deductions(&mut tx, employee_id).await?;
        tx.commit().await.map_err(|e| {
            error!(error = %e, employee_id, "Failed to commit employee update");
            e
        })?;

        Ok(EmployeeWithDeductions::new(employee, deductions))
    }

    async fn upsert_deductions(
        &self,
        employee_id: &str,
        deductions: Vec<DeductionDraft>,
    ) -> StoreResult<Vec<Deduction>> {
        let mut tx = self.pool.begin().await?;
        lock_employee(&mut tx, employee_id).await?;
        upsert_rows(&mut tx, employee_id, &deductions).await?;

        let written = written_rows(fetch_deductions(&mut tx, employee_id).await?, &deductions);

        tx.commit().await?;
        Ok(written)
    }

    async fn delete_employee(&self, employee_id: &str) -> StoreResult<bool> {
        // employee_deductions rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_deduction(&self, deduction_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employee_deductions WHERE id = ?")
            .bind(deduction_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
