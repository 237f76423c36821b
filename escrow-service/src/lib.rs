//! Escrow Service - Rental escrow ledger and vendor payouts as a microservice.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
