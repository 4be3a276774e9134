//! # Robin Hood Table
//!
//! An in-memory hash table built on open addressing with Robin Hood
//! displacement.
//!
//! Every entry lives directly in one power-of-two sized slot array and
//! remembers its displacement, the number of linear probe steps between its
//! slot and the slot its hash points at. On insertion an entry that has
//! travelled further than the resident of a slot takes that slot and pushes
//! the rest of the cluster one step forward. Lookups stop as soon as they
//! meet an entry closer to home than the probe, so their cost is bounded by
//! the largest displacement rather than by the cluster length.
//!
//! Removal marks the slot as a tombstone. Tombstones keep probe chains intact,
//! are reused by later insertions, and are dropped when the table grows.
//! Growth is synchronous: the insertion that brings the live count to the
//! load-factor threshold doubles the capacity and rehashes every live entry.
//!
//! ## Basic Usage
//!
//! ```rust
//! use robin_hood_table::RobinHoodTable;
//!
//! // Create a table with room for 8 slots (grows at 4 live entries)
//! let mut table = RobinHoodTable::with_capacity(8);
//!
//! // Insert values
//! table.insert("apple".to_string(), 1);
//! table.insert("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(table.get("apple"), Some(&1));
//!
//! // Update values, the previous value comes back
//! assert_eq!(table.insert("apple".to_string(), 10), Some(1));
//! assert_eq!(table.len(), 2);
//!
//! // Remove values
//! assert_eq!(table.remove("apple"), Some(10));
//! assert_eq!(table.get("apple"), None);
//! assert_eq!(table.len(), 1);
//! ```
//!
//! ## Custom load factor
//!
//! ```rust
//! use robin_hood_table::{RobinHoodTable, TableError};
//!
//! let table = RobinHoodTable::<u64, u64>::with_load_factor(16, 0.75)?;
//! assert_eq!(table.threshold(), 12);
//!
//! assert!(RobinHoodTable::<u64, u64>::with_load_factor(16, 1.5).is_err());
//! # Ok::<(), TableError>(())
//! ```
//!
//! The table is single-threaded and has no defence against adversarial hash
//! inputs.

/// Error type for table construction
mod error;
/// Module implementing the Robin Hood hash table
mod robin_hood_table;
/// Utility functions and traits for the table
mod utils;

pub use error::TableError;
pub use robin_hood_table::{
    DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, DefaultState, Iter, ProbeStats, RobinHoodTable,
};
pub use utils::HashMapExtensions;
