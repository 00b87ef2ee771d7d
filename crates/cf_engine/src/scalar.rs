//! Format-neutral simple values and lossless conversion.
//!
//! A [`Scalar`] is what a format stores for a simple value. Converting a
//! scalar back into a concrete type goes through [`ExactConvert`], which
//! refuses any conversion that would lose information:
//!
//! ```
//! use cf_engine::scalar::{ExactConvert, Scalar};
//!
//! assert_eq!(u8::from_scalar(&Scalar::Unsigned(200)), Some(200));
//! assert_eq!(u8::from_scalar(&Scalar::Unsigned(300)), None);
//! assert_eq!(i32::from_scalar(&Scalar::Str("42".into())), Some(42));
//! assert_eq!(i64::from_scalar(&Scalar::Float(2.0)), Some(2));
//! assert_eq!(i64::from_scalar(&Scalar::Float(2.5)), None);
//! ```

use alloc::string::{String, ToString};
use core::fmt;

// -----------------------------------------------------------------------------
// Scalar

/// A simple value as seen by a format.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Signed(i128),
    Unsigned(u128),
    Float(f64),
    Char(char),
    Str(String),
}

impl Scalar {
    /// Kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Signed(_) => "signed integer",
            Self::Unsigned(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Str(_) => "string",
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if the scalar holds one that fits in `i128`.
    fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::Signed(v) => Some(v),
            Self::Unsigned(v) => i128::try_from(v).ok(),
            _ => None,
        }
    }

    /// Text form used for dictionary keys and error messages.
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => fmt::Display::fmt(v, f),
            Self::Signed(v) => fmt::Display::fmt(v, f),
            Self::Unsigned(v) => fmt::Display::fmt(v, f),
            Self::Float(v) => fmt::Display::fmt(v, f),
            Self::Char(v) => fmt::Display::fmt(v, f),
            Self::Str(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl From<&str> for Scalar {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

// -----------------------------------------------------------------------------
// KeyKind

/// Classes of simple types allowed as dictionary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    String,
    Integer,
    Enum,
}

// -----------------------------------------------------------------------------
// ExactConvert

/// Conversion between a simple type and [`Scalar`].
///
/// `from_scalar` must return `None` rather than lose information.
pub trait ExactConvert: Sized {
    fn to_scalar(&self) -> Scalar;

    fn from_scalar(scalar: &Scalar) -> Option<Self>;
}

/// 2^127, the first float above the `i128` range.
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

/// The integral value of `f`, if it has one that round-trips.
fn float_to_i128(f: f64) -> Option<i128> {
    if !f.is_finite() || f.fract() != 0.0 || !(-I128_BOUND..I128_BOUND).contains(&f) {
        return None;
    }
    let v = f as i128;
    (v as f64 == f).then_some(v)
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {$(
        impl ExactConvert for $ty {
            #[inline]
            fn to_scalar(&self) -> Scalar {
                Scalar::Signed(*self as i128)
            }

            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::Signed(v) => <$ty>::try_from(*v).ok(),
                    Scalar::Unsigned(v) => <$ty>::try_from(*v).ok(),
                    Scalar::Float(f) => float_to_i128(*f).and_then(|v| <$ty>::try_from(v).ok()),
                    Scalar::Str(s) => s.trim().parse().ok(),
                    _ => None,
                }
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl ExactConvert for $ty {
            #[inline]
            fn to_scalar(&self) -> Scalar {
                Scalar::Unsigned(*self as u128)
            }

            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::Signed(v) => <$ty>::try_from(*v).ok(),
                    Scalar::Unsigned(v) => <$ty>::try_from(*v).ok(),
                    Scalar::Float(f) => float_to_i128(*f).and_then(|v| <$ty>::try_from(v).ok()),
                    Scalar::Str(s) => s.trim().parse().ok(),
                    _ => None,
                }
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, i128, isize);
impl_unsigned!(u8, u16, u32, u64, u128, usize);

impl ExactConvert for f64 {
    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Float(*self)
    }

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Float(f) => Some(*f),
            Scalar::Str(s) => s.trim().parse().ok(),
            int => {
                let v = int.as_i128()?;
                let f = v as f64;
                (float_to_i128(f) == Some(v)).then_some(f)
            }
        }
    }
}

impl ExactConvert for f32 {
    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Float(*self as f64)
    }

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        let wide = f64::from_scalar(scalar)?;
        let narrow = wide as f32;
        // NaN never compares equal, keep it when the source was NaN.
        (narrow as f64 == wide || wide.is_nan()).then_some(narrow)
    }
}

impl ExactConvert for bool {
    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Bool(*self)
    }

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Bool(v) => Some(*v),
            Scalar::Str(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl ExactConvert for char {
    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Char(*self)
    }

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Char(c) => Some(*c),
            Scalar::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl ExactConvert for String {
    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Str(self.clone())
    }

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Str(s) => Some(s.clone()),
            Scalar::Char(c) => Some(c.to_string()),
            Scalar::Bool(_) => None,
            other => Some(other.to_string()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ExactConvert, Scalar};
    use alloc::string::String;

    #[test]
    fn integers_reject_overflow() {
        assert_eq!(u8::from_scalar(&Scalar::Signed(-1)), None);
        assert_eq!(i8::from_scalar(&Scalar::Unsigned(128)), None);
        assert_eq!(i8::from_scalar(&Scalar::Signed(-128)), Some(-128));
        assert_eq!(u64::from_scalar(&Scalar::Unsigned(u64::MAX as u128)), Some(u64::MAX));
        assert_eq!(i32::from_scalar(&Scalar::Str(" 7 ".into())), Some(7));
        assert_eq!(i32::from_scalar(&Scalar::Bool(true)), None);
    }

    #[test]
    fn floats_and_integers() {
        assert_eq!(i64::from_scalar(&Scalar::Float(-3.0)), Some(-3));
        assert_eq!(i64::from_scalar(&Scalar::Float(f64::NAN)), None);
        assert_eq!(i128::from_scalar(&Scalar::Float(1e40)), None);
        assert_eq!(i128::from_scalar(&Scalar::Float(2f64.powi(127))), None);
        assert_eq!(i128::from_scalar(&Scalar::Float(-(2f64.powi(127)))), Some(i128::MIN));
        assert_eq!(f64::from_scalar(&Scalar::Signed(i128::MAX)), None);
        assert_eq!(f64::from_scalar(&Scalar::Signed(i128::MIN)), Some(-(2f64.powi(127))));
        assert_eq!(f64::from_scalar(&Scalar::Signed(5)), Some(5.0));
        assert_eq!(f64::from_scalar(&Scalar::Unsigned((1 << 53) + 1)), None);
        assert_eq!(f32::from_scalar(&Scalar::Float(0.5)), Some(0.5));
        assert_eq!(f32::from_scalar(&Scalar::Float(0.1)), None);
        assert!(f32::from_scalar(&Scalar::Float(f64::NAN)).unwrap().is_nan());
    }

    #[test]
    fn text_like() {
        assert_eq!(char::from_scalar(&Scalar::Str("x".into())), Some('x'));
        assert_eq!(char::from_scalar(&Scalar::Str("xy".into())), None);
        assert_eq!(String::from_scalar(&Scalar::Signed(-4)), Some("-4".into()));
        assert_eq!(String::from_scalar(&Scalar::Bool(true)), None);
        assert_eq!(bool::from_scalar(&Scalar::Str("false".into())), Some(false));
        assert_eq!(Scalar::Unsigned(9).to_key_string(), "9");
    }
}
