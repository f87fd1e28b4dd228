//! Input validation
//!
//! Application-level validators mirroring the schema constraints, so bad
//! input is rejected before it reaches the record store.

pub mod policy_validator;

pub use policy_validator::PolicyValidator;
