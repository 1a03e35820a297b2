//! Engine constants.

/// Length of a ledger account identifier in characters.
pub const ACCOUNT_ID_LEN: usize = 56;

/// Leading character of every ledger account identifier.
pub const ACCOUNT_ID_PREFIX: char = 'G';

/// Number of characters kept from each end of an identifier when building a
/// placeholder display name.
pub const PLACEHOLDER_EDGE_CHARS: usize = 4;

/// Lower bound of every rater's influence weight.
pub const MIN_WEIGHT: f64 = 1.0;

/// Default upper bound of a rater's influence weight.
pub const DEFAULT_MAX_WEIGHT: f64 = 100.0;

/// Score thresholds for letter grades, highest first. A score maps to the
/// first grade whose threshold it reaches.
///
/// | Score      | Grade |
/// |------------|-------|
/// | `>= 3.5`   | A     |
/// | `>= 3.0`   | A-    |
/// | `>= 2.5`   | B+    |
/// | `>= 2.0`   | B     |
/// | `>= 1.5`   | C+    |
/// | `>= 1.0`   | C     |
/// | `> 0`      | D     |
pub const GRADE_THRESHOLDS: [f64; 6] = [3.5, 3.0, 2.5, 2.0, 1.5, 1.0];
