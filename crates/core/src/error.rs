use thiserror::Error;

/// Errors from fixed-point arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Amount exceeds the representable fixed-point range")]
    Overflow,

    #[error("Invalid decimal amount: {0}")]
    InvalidDecimal(String),
}

/// Errors from address validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Empty address")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_division_by_zero() {
        assert_eq!(ArithmeticError::DivisionByZero.to_string(), "Division by zero");
    }

    #[test]
    fn test_error_display_overflow() {
        assert_eq!(
            ArithmeticError::Overflow.to_string(),
            "Amount exceeds the representable fixed-point range"
        );
    }

    #[test]
    fn test_error_display_invalid_decimal() {
        let err = ArithmeticError::InvalidDecimal("1.2.3".to_string());
        assert_eq!(err.to_string(), "Invalid decimal amount: 1.2.3");
    }

    #[test]
    fn test_error_display_empty_address() {
        assert_eq!(AddressError::Empty.to_string(), "Empty address");
    }
}
