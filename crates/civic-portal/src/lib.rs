//! Core library for the municipal e-government portal.
//!
//! The interesting part lives in [`workflows::zoning`]: a staged review
//! workflow for zoning clearance applications, with per-document
//! verification gates and an append-only action history. The
//! [`workflows::housing`] module carries the eligibility scoring and fee
//! computation used by the housing assistance program.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
