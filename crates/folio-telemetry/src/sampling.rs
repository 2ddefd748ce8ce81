//! Sampling rates by span category.

/// Fraction of root spans named `name` to keep.
///
/// | Prefix     | Rate | |
/// |------------|------|-------------------------------------|
/// | `sync.*`   | 100% | Editor commits, reverts, restores   |
/// | `http.*`   | 10%  | One per request                     |
/// | `store.*`  | 1%   | One per database call               |
/// | other      | 10%  |                                     |
///
/// Errors are always kept regardless of name.
pub fn sample_rate(name: &str) -> f64 {
    if name.starts_with("sync.") {
        1.0
    } else if name.starts_with("store.") {
        0.01
    } else {
        0.1
    }
}
