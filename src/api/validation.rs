use super::ApiError;

/// Parses a path id. Zero, negatives and non-numbers are rejected.
///
/// Ids past the catalog's `u32` range are still well-formed; the lookup just
/// misses.
pub fn parse_anime_id(raw: &str) -> Result<u64, ApiError> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation(format!(
            "Invalid anime ID: {:?}. ID must be a positive integer",
            raw
        ))),
    }
}
