use std::fmt::{Display, Formatter};
use std::ops::{Div, Mul};

use serde::{Deserialize, Serialize};

/// Exponents of the base dimensions a unit is built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub mass: i32,
    pub length: i32,
    pub time: i32,
    pub temperature: i32,
}

impl Dimensions {
    pub const DIMENSIONLESS: Dimensions = Dimensions {
        mass: 0,
        length: 0,
        time: 0,
        temperature: 0,
    };
    pub const MASS: Dimensions = Dimensions {
        mass: 1,
        ..Self::DIMENSIONLESS
    };
    pub const LENGTH: Dimensions = Dimensions {
        length: 1,
        ..Self::DIMENSIONLESS
    };
    pub const TIME: Dimensions = Dimensions {
        time: 1,
        ..Self::DIMENSIONLESS
    };
    pub const TEMPERATURE: Dimensions = Dimensions {
        temperature: 1,
        ..Self::DIMENSIONLESS
    };

    pub fn powi(self, exp: i32) -> Self {
        Self {
            mass: self.mass * exp,
            length: self.length * exp,
            time: self.time * exp,
            temperature: self.temperature * exp,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }
}

impl Mul for Dimensions {
    type Output = Dimensions;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            mass: self.mass + rhs.mass,
            length: self.length + rhs.length,
            time: self.time + rhs.time,
            temperature: self.temperature + rhs.temperature,
        }
    }
}

impl Div for Dimensions {
    type Output = Dimensions;

    fn div(self, rhs: Self) -> Self::Output {
        self * rhs.powi(-1)
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let parts = [
            ("mass", self.mass),
            ("length", self.length),
            ("time", self.time),
            ("temperature", self.temperature),
        ];
        let mut first = true;
        for (name, exp) in parts {
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, "*")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "({name})")?;
            } else {
                write!(f, "({name})**{exp}")?;
            }
        }
        Ok(())
    }
}
