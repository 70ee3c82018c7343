use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const INR_CURRENCY_CODE: &str = "INR";
pub const INR_CURRENCY_CODE_LOWER: &str = "inr";

const PAISE_PER_RUPEE: i64 = 100;

//--------------------------------------       Paise       -----------------------------------------------------------
/// A monetary amount in Indian paise (1/100th of a rupee).
///
/// All amounts inside the engine are carried in minor units so that arithmetic is exact. The payment gateway also
/// speaks paise, so values cross that boundary unchanged; anything user-facing goes through [`Paise::rupees`] or
/// `Display`, which render major units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Paise(i64);

impl Add for Paise {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Paise {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Paise {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Paise {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<i64> for Paise {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Paise {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct PaiseConversionError(String);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Paise {
    type Error = PaiseConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PaiseConversionError(format!("Value {} is too large to convert to Paise", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rupees = self.0 as f64 / PAISE_PER_RUPEE as f64;
        write!(f, "₹{rupees:0.2}")
    }
}

impl Paise {
    /// The raw amount in paise.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Construct an amount from whole rupees.
    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * PAISE_PER_RUPEE)
    }

    /// The amount in major units. Lossy for display only.
    pub fn rupees(&self) -> f64 {
        self.0 as f64 / PAISE_PER_RUPEE as f64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn factor_100_at_the_boundary() {
        assert_eq!(Paise::from_rupees(500).value(), 50_000);
        assert_eq!(Paise::from(50_000).rupees(), 500.0);
    }

    #[test]
    fn arithmetic() {
        let total = Paise::from_rupees(12) + Paise::from(50);
        assert_eq!(total.value(), 1250);
        assert_eq!(total - Paise::from(250), Paise::from_rupees(10));
        assert_eq!(vec![Paise::from(100), Paise::from(250)].into_iter().sum::<Paise>(), Paise::from(350));
    }

    #[test]
    fn display_is_major_units() {
        assert_eq!(Paise::from(123_456).to_string(), "₹1234.56");
        assert_eq!(Paise::from_rupees(1200).to_string(), "₹1200.00");
    }
}
