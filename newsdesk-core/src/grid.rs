//! Column sizing for the day grid.

use crate::error::{NewsdeskError, NewsdeskResult};

/// Widest grid the layout supports.
pub const MAX_COLUMNS: usize = 7;

/// Number of grid columns, always within `1..=MAX_COLUMNS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GridSize(usize);

impl GridSize {
    pub fn get(self) -> usize {
        self.0
    }
}

/// One column per date bucket, at least one so an empty grid still has a
/// column.
///
/// More buckets than MAX_COLUMNS means the caller asked for too wide a window.
pub fn column_count(bucket_count: usize) -> NewsdeskResult<GridSize> {
    if bucket_count > MAX_COLUMNS {
        return Err(NewsdeskError::GridOverflow {
            count: bucket_count,
            max: MAX_COLUMNS,
        });
    }

    Ok(GridSize(bucket_count.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_count_is_bucket_count_with_floor_of_one() {
        for n in 0..=MAX_COLUMNS {
            assert_eq!(column_count(n).unwrap().get(), n.max(1));
        }
    }

    #[test]
    fn more_buckets_than_columns_is_rejected() {
        let err = column_count(MAX_COLUMNS + 1).unwrap_err();
        assert!(matches!(err, NewsdeskError::GridOverflow { count: 8, max: 7 }));
    }
}
