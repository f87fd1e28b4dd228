//! Rounding policy validation
//!
//! Mirrors the schema CHECK constraints on the projects table. The
//! invoicing factor bound is the one declared failure mode of the module.

use crate::application::errors::{AppResult, ApplicationError};
use crate::domain::rounding::RoundingPolicy;

/// Validator for rounding policy values
pub struct PolicyValidator;

impl PolicyValidator {
    /// Validate the invoicing factor
    ///
    /// Rules:
    /// - Must be between 0 and 500, endpoints included
    /// - Must be a finite number
    pub fn validate_invoicing_factor(factor: f64) -> AppResult<()> {
        if !factor.is_finite() {
            return Err(ApplicationError::validation(
                "invoicing_factor",
                "Invoicing factor must be a finite number",
            ));
        }
        if !(0.0..=500.0).contains(&factor) {
            return Err(ApplicationError::validation(
                "invoicing_factor",
                "Invoicing factor should stay between 0 and 500, endpoints included",
            ));
        }
        Ok(())
    }

    /// Validate the rounding granularity
    ///
    /// Rules:
    /// - Must be zero (no rounding) or positive
    /// - Must be a finite number
    pub fn validate_granularity(granularity: f64) -> AppResult<()> {
        if !granularity.is_finite() {
            return Err(ApplicationError::validation(
                "granularity",
                "Granularity must be a finite number",
            ));
        }
        if granularity < 0.0 {
            return Err(ApplicationError::validation(
                "granularity",
                "Granularity cannot be negative",
            ));
        }
        Ok(())
    }

    /// Validate a full policy at once
    pub fn validate(policy: &RoundingPolicy) -> AppResult<()> {
        Self::validate_granularity(policy.granularity)?;
        Self::validate_invoicing_factor(policy.invoicing_factor)?;
        Ok(())
    }
}
