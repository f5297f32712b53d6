//! URL handling module
//!
//! Seed validation, fragment normalization for deduplication, host
//! extraction, and the same-origin check used at frontier admission.

mod domain;
mod normalize;

pub use domain::{extract_host, is_same_origin};
pub use normalize::{normalize_url, parse_absolute};
