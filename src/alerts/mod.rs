//! Alert normalization, sorting, and cross-cycle diffing.

pub mod diff;
pub mod model;
pub mod normalizer;
pub mod sorter;

pub use diff::{AlertDiff, ZoneChange};
pub use model::{AlertCollection, ZoneOccurrence};
pub use normalizer::AlertNormalizer;
pub use sorter::sort_and_truncate;
