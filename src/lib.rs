//! Credit Ledger Library
//!
//! Consumer credit limits, loan origination and payment processing, exported
//! for the server binary and the integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod loan_service;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
