pub mod deduction;
pub mod employee;
