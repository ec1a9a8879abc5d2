use chrono::{DateTime, Utc};

/// Closed-interval overlap test between an existing stay and a candidate
/// date range. The endpoints count: a stay checking out on the day another
/// checks in is a conflict, not adjacent-safe.
pub fn overlaps(
    existing_check_in: DateTime<Utc>,
    existing_check_out: DateTime<Utc>,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
) -> bool {
    existing_check_in <= check_out && existing_check_out >= check_in
}
