//! Error type for table construction

use thiserror::Error;

/// Errors raised while configuring a [`RobinHoodTable`](crate::RobinHoodTable).
///
/// Lookups and removals never fail: a missing key is reported as `None`.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TableError {
    /// The load factor is NaN or lies outside `(0, 1]`
    #[error("load factor must be in (0, 1], got {0}")]
    InvalidLoadFactor(f64),
}
