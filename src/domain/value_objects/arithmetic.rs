//! # Checked Arithmetic
//!
//! Traits and utilities for safe arithmetic operations.
//!
//! Price deviations and version counters are computed through
//! [`CheckedArithmetic`] so that a zero reference average or an overflowing
//! counter surfaces as an [`ArithmeticError`] instead of a panic.
//!
//! # Examples
//!
//! ```
//! use produce_market::domain::value_objects::arithmetic::{CheckedArithmetic, ArithmeticError};
//! use rust_decimal::Decimal;
//!
//! let a = Decimal::new(100, 0);
//! assert_eq!(a.safe_div(Decimal::ZERO), Err(ArithmeticError::DivisionByZero));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Error type for arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArithmeticError {
    /// Arithmetic operation resulted in overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic operation resulted in underflow.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero attempted.
    #[error("division by zero")]
    DivisionByZero,
}

/// Result type for arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

/// Trait for checked arithmetic operations.
///
/// Provides safe arithmetic methods that return `Result` instead of
/// panicking on overflow, underflow, or division by zero.
pub trait CheckedArithmetic: Sized {
    /// Safely add two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely subtract two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Underflow` if the result would underflow.
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely multiply two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely divide two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::DivisionByZero` if the divisor is zero.
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self>;
}

impl CheckedArithmetic for Decimal {
    #[inline]
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.checked_div(rhs).ok_or(ArithmeticError::Overflow)
    }
}

impl CheckedArithmetic for u64 {
    #[inline]
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_div(rhs).ok_or(ArithmeticError::DivisionByZero)
    }
}
