//! Fallback handling for sub-computations that must never fail a run.
//!
//! Duplicate counting, size lookup, approximate top-k and temp-table cleanup
//! all degrade to a documented default instead of propagating.

use std::fmt::Display;

/// Return the value of `result`, or log a warning and return `default`.
pub fn best_effort<T, E: Display>(label: &str, default: T, result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::warn!("{label} failed, using fallback: {e}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_passes_through() {
        let value = best_effort::<i64, String>("dup", -1, Ok(3));
        assert_eq!(value, 3);
    }

    #[test]
    fn test_err_uses_default() {
        let value = best_effort("dup", -1_i64, Err("unhashable"));
        assert_eq!(value, -1);
        let size = best_effort("size", 0.0_f64, Err("permission denied"));
        assert_eq!(size, 0.0);
    }
}
