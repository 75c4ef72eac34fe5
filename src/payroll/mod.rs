//! Payroll rules: keeping an employee's deductions within their salary.
//!
//! Everything here is synchronous and free of I/O. Storage implementations
//! call [`settle_update`] from inside their own unit of work so that the
//! read, merge, cap and write of one employee happen together.

pub mod normalizer;
pub mod reconciler;

pub use normalizer::normalize;
pub use reconciler::reconcile;

use crate::model::deduction::{Deduction, DeductionDraft, DeductionInput};

/// Deductions to persist when an employee is created.
///
/// Repeated categories collapse to the last one given.
pub fn settle_new(salary: f64, incoming: &[DeductionInput]) -> Vec<DeductionDraft> {
    normalize(salary, reconcile(Vec::new(), incoming))
}

/// Deductions to persist after a partial update.
///
/// `salary` must be the value the employee holds once the same request's
/// salary change (if any) is applied.
pub fn settle_update(
    salary: f64,
    existing: Vec<Deduction>,
    incoming: &[DeductionInput],
) -> Vec<DeductionDraft> {
    normalize(salary, reconcile(existing, incoming))
}

pub fn total_deductions<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    amounts.into_iter().sum()
}

pub fn net_pay(salary: f64, total_deductions: f64) -> f64 {
    salary - total_deductions
}
