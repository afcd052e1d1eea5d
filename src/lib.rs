//! Payroll Calculation Engine for Construction Trades
//!
//! This crate classifies a worker's daily hours into regular, overtime and
//! double time, prices them against collectively bargained wage rates, and
//! computes withholding, employer fringe contributions and net pay for one
//! pay period, with a complete audit trace of every decision.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
