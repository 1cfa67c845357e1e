#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CacheError {
    NotFound,
    KeyExists,
    ValueTooLarge,
    ArithOnNonNumeric,
}

impl CacheError {
    pub fn to_static_string(&self) -> &'static str {
        static NOT_FOUND: &str = "Not found";
        static KEY_EXISTS: &str = "Key exists";

        match self {
            CacheError::NotFound => NOT_FOUND,
            CacheError::KeyExists => KEY_EXISTS,
            CacheError::ValueTooLarge => "object too large for cache",
            CacheError::ArithOnNonNumeric => "cannot increment or decrement non-numeric value",
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(CacheError::NotFound, "Not found" ; "not_found")]
    #[test_case(CacheError::KeyExists, "Key exists" ; "key_exists")]
    #[test_case(CacheError::ValueTooLarge, "object too large for cache" ; "value_too_large")]
    #[test_case(CacheError::ArithOnNonNumeric, "cannot increment or decrement non-numeric value" ; "non_numeric")]
    fn error_should_map_to_message(err: CacheError, message: &str) {
        assert_eq!(err.to_static_string(), message);
    }
}
