//! Element trait binding floating-point types to the engine
//!
//! The element type is chosen once per factorization via the generic
//! parameter and never mixed within a run. Only real floating-point types
//! make sense for Cholesky, so the trait is implemented for `f32` and `f64`.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

/// Trait for types that can be elements of the tiled matrix
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - tiles are shared across workers
/// - `Add + Sub + Mul + Div` - kernel arithmetic (Output = Self)
/// - `PartialOrd` - pivot sign checks
pub trait Element:
    Copy
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// Zero value
    fn zero() -> Self;

    /// Square root
    fn sqrt_val(self) -> Self;

    /// Machine epsilon for this type, as f64
    fn epsilon_val() -> f64;

    /// True when the value is neither NaN nor infinite
    fn is_finite_val(self) -> bool;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;
}

impl Element for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn sqrt_val(self) -> Self {
        self.sqrt()
    }

    #[inline]
    fn epsilon_val() -> f64 {
        f64::EPSILON
    }

    #[inline]
    fn is_finite_val(self) -> bool {
        self.is_finite()
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl Element for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn sqrt_val(self) -> Self {
        self.sqrt()
    }

    #[inline]
    fn epsilon_val() -> f64 {
        f32::EPSILON as f64
    }

    #[inline]
    fn is_finite_val(self) -> bool {
        self.is_finite()
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}
