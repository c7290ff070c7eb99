//! Skilled-migration eligibility calculators, occupation lookup, and the tenant layer that meters
//! them.

pub mod calculators;
pub mod config;
pub mod error;
pub mod occupations;
pub mod telemetry;
pub mod tenancy;
