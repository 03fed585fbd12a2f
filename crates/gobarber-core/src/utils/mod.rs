//! Utility functions for display formatting.

pub mod format;

pub use format::{format_appointment_date, format_hour, mask_token};
