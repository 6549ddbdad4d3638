//! Element types and the numeric capabilities the assignment kernels call
//!
//! The kernels never look at a type's identity. They only ever:
//! - cast one input value into the target's type ([`CastTo`]),
//! - combine an existing value with a new one ([`BinaryOp`]),
//! - ask whether a mask value is true ([`Element::is_nonzero`]).

use std::fmt::Debug;
use std::ops::{Add, Mul};

/// A value that can be stored in a matrix
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Cast to boolean: the truth value of a valued mask entry
    fn is_nonzero(self) -> bool;
}

macro_rules! impl_element_numeric {
    ($($t:ty),* $(,)?) => {
        $(
            impl Element for $t {
                #[inline(always)]
                fn is_nonzero(self) -> bool {
                    !num_traits::Zero::is_zero(&self)
                }
            }
        )*
    };
}

impl_element_numeric!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl Element for bool {
    #[inline(always)]
    fn is_nonzero(self) -> bool {
        self
    }
}

/// Typecast of a single value into the target element type
pub trait CastTo<T>: Copy {
    fn cast_to(self) -> T;
}

macro_rules! impl_cast_numeric {
    ($($src:ty),* $(,)?) => {
        $(
            impl_cast_numeric!(@to $src => i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

            impl CastTo<bool> for $src {
                #[inline(always)]
                fn cast_to(self) -> bool {
                    self.is_nonzero()
                }
            }

            impl CastTo<$src> for bool {
                #[inline(always)]
                fn cast_to(self) -> $src {
                    self as u8 as $src
                }
            }
        )*
    };
    (@to $src:ty => $($dst:ty),*) => {
        $(
            impl CastTo<$dst> for $src {
                #[inline(always)]
                fn cast_to(self) -> $dst {
                    self as $dst
                }
            }
        )*
    };
}

impl_cast_numeric!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl CastTo<bool> for bool {
    #[inline(always)]
    fn cast_to(self) -> bool {
        self
    }
}

/// Binary accumulator `z = op(x, y)` with `x` the existing entry and `y` the new value
pub trait BinaryOp<T>: Sync {
    fn apply(&self, x: T, y: T) -> T;

    /// Operator name for diagnostics
    fn name(&self) -> &'static str {
        "op"
    }
}

/// `z = x + y`
#[derive(Debug, Clone, Copy, Default)]
pub struct Plus;

/// `z = x * y`
#[derive(Debug, Clone, Copy, Default)]
pub struct Times;

/// `z = min(x, y)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

/// `z = max(x, y)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

/// `z = x`
#[derive(Debug, Clone, Copy, Default)]
pub struct First;

/// `z = y`
#[derive(Debug, Clone, Copy, Default)]
pub struct Second;

/// `z = x || y`
#[derive(Debug, Clone, Copy, Default)]
pub struct Lor;

impl<T: Element + Add<Output = T>> BinaryOp<T> for Plus {
    #[inline(always)]
    fn apply(&self, x: T, y: T) -> T {
        x + y
    }
    fn name(&self) -> &'static str {
        "plus"
    }
}

impl<T: Element + Mul<Output = T>> BinaryOp<T> for Times {
    #[inline(always)]
    fn apply(&self, x: T, y: T) -> T {
        x * y
    }
    fn name(&self) -> &'static str {
        "times"
    }
}

impl<T: Element + PartialOrd> BinaryOp<T> for Min {
    #[inline(always)]
    fn apply(&self, x: T, y: T) -> T {
        if y < x {
            y
        } else {
            x
        }
    }
    fn name(&self) -> &'static str {
        "min"
    }
}

impl<T: Element + PartialOrd> BinaryOp<T> for Max {
    #[inline(always)]
    fn apply(&self, x: T, y: T) -> T {
        if y > x {
            y
        } else {
            x
        }
    }
    fn name(&self) -> &'static str {
        "max"
    }
}

impl<T: Element> BinaryOp<T> for First {
    #[inline(always)]
    fn apply(&self, x: T, _y: T) -> T {
        x
    }
    fn name(&self) -> &'static str {
        "first"
    }
}

impl<T: Element> BinaryOp<T> for Second {
    #[inline(always)]
    fn apply(&self, _x: T, y: T) -> T {
        y
    }
    fn name(&self) -> &'static str {
        "second"
    }
}

impl BinaryOp<bool> for Lor {
    #[inline(always)]
    fn apply(&self, x: bool, y: bool) -> bool {
        x || y
    }
    fn name(&self) -> &'static str {
        "lor"
    }
}

/// Wraps a closure as a [`BinaryOp`]
#[derive(Clone, Copy)]
pub struct Closure<F>(pub F);

impl<T, F> BinaryOp<T> for Closure<F>
where
    F: Fn(T, T) -> T + Sync,
{
    #[inline(always)]
    fn apply(&self, x: T, y: T) -> T {
        (self.0)(x, y)
    }
    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Placeholder accumulator type for requests without one
///
/// Never invoked by the kernels; behaves like [`Second`] if it were.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAccum;

impl<T: Element> BinaryOp<T> for NoAccum {
    #[inline(always)]
    fn apply(&self, _x: T, y: T) -> T {
        y
    }
    fn name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_nonzero() {
        assert!(3i32.is_nonzero());
        assert!(!0u8.is_nonzero());
        assert!(!0.0f64.is_nonzero());
        assert!((-0.5f32).is_nonzero());
        assert!(true.is_nonzero());
        assert!(!false.is_nonzero());
        assert!((-1i8).is_nonzero());
        assert!(!0i64.is_nonzero());
        assert!(u64::MAX.is_nonzero());
        assert!(!0usize.is_nonzero());
        assert!(!(-0.0f64).is_nonzero());
        assert!(f64::NAN.is_nonzero());
    }

    #[test]
    fn test_casts() {
        let x: f64 = 7i32.cast_to();
        assert_eq!(x, 7.0);
        let y: u8 = 3.9f64.cast_to();
        assert_eq!(y, 3);
        let b: bool = 0.25f32.cast_to();
        assert!(b);
        let n: i64 = true.cast_to();
        assert_eq!(n, 1);
        let f: f32 = false.cast_to();
        assert_eq!(f, 0.0);
    }

    #[test]
    fn test_operators() {
        assert_eq!(BinaryOp::<i32>::apply(&Plus, 5, 2), 7);
        assert_eq!(BinaryOp::<f64>::apply(&Times, 1.5, 2.0), 3.0);
        assert_eq!(BinaryOp::<u16>::apply(&Min, 4, 9), 4);
        assert_eq!(BinaryOp::<u16>::apply(&Max, 4, 9), 9);
        assert_eq!(BinaryOp::<i8>::apply(&First, 1, 2), 1);
        assert_eq!(BinaryOp::<i8>::apply(&Second, 1, 2), 2);
        assert!(Lor.apply(false, true));
        assert_eq!(BinaryOp::<i32>::apply(&NoAccum, 1, 2), 2);

        let minus = Closure(|x: i64, y: i64| x - y);
        assert_eq!(minus.apply(10, 4), 6);
        assert_eq!(BinaryOp::<i64>::name(&minus), "closure");
    }
}
