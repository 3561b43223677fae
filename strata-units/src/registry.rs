use std::collections::HashMap;
use std::fmt::Debug;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::dimensions::Dimensions;
use crate::error::StrataUnitError;

/// A parsed unit expression: its scale relative to cgs base units and its dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub expr: String,
    pub cgs_factor: f64,
    pub dimensions: Dimensions,
}

impl Unit {
    pub fn dimensionless() -> Self {
        Self {
            expr: String::new(),
            cgs_factor: 1.0,
            dimensions: Dimensions::DIMENSIONLESS,
        }
    }
}

/// Conversion arithmetic between unit expressions.
pub trait UnitSystem: Debug + Send + Sync + 'static {
    fn parse(&self, expr: &str) -> Result<Unit, StrataUnitError>;

    /// Multiplicative factor taking values in `from` to values in `to`
    fn conversion_factor(&self, from: &str, to: &str) -> Result<f64, StrataUnitError> {
        let from_unit = self.parse(from)?;
        let to_unit = self.parse(to)?;
        if from_unit.dimensions != to_unit.dimensions {
            return Err(StrataUnitError::Incompatible {
                from: from.to_string(),
                to: to.to_string(),
                from_dims: from_unit.dimensions,
                to_dims: to_unit.dimensions,
            });
        }
        Ok(from_unit.cgs_factor / to_unit.cgs_factor)
    }

    fn convert(&self, values: &[f64], from: &str, to: &str) -> Result<Vec<f64>, StrataUnitError> {
        let factor = self.conversion_factor(from, to)?;
        Ok(values.iter().map(|v| v * factor).collect())
    }

    fn is_compatible(&self, from: &str, to: &str) -> bool {
        self.conversion_factor(from, to).is_ok()
    }
}

const MSUN_GRAMS: f64 = 1.988_415_86e33;
const PC_CM: f64 = 3.085_677_581_491_367_3e18;
const AU_CM: f64 = 1.495_978_707e13;
const YEAR_SECONDS: f64 = 3.155_76e7;

lazy_static! {
    static ref CGS_SYMBOLS: HashMap<&'static str, (f64, Dimensions)> = {
        let mass = Dimensions::MASS;
        let length = Dimensions::LENGTH;
        let time = Dimensions::TIME;
        let energy = mass * length.powi(2) / time.powi(2);
        HashMap::from([
            ("1", (1.0, Dimensions::DIMENSIONLESS)),
            ("dimensionless", (1.0, Dimensions::DIMENSIONLESS)),
            ("g", (1.0, mass)),
            ("kg", (1.0e3, mass)),
            ("Msun", (MSUN_GRAMS, mass)),
            ("msun", (MSUN_GRAMS, mass)),
            ("cm", (1.0, length)),
            ("m", (1.0e2, length)),
            ("km", (1.0e5, length)),
            ("AU", (AU_CM, length)),
            ("au", (AU_CM, length)),
            ("pc", (PC_CM, length)),
            ("kpc", (PC_CM * 1.0e3, length)),
            ("Mpc", (PC_CM * 1.0e6, length)),
            ("s", (1.0, time)),
            ("yr", (YEAR_SECONDS, time)),
            ("Myr", (YEAR_SECONDS * 1.0e6, time)),
            ("Gyr", (YEAR_SECONDS * 1.0e9, time)),
            ("K", (1.0, Dimensions::TEMPERATURE)),
            ("dyne", (1.0, energy / length)),
            ("erg", (1.0, energy)),
        ])
    };
}

/// Unit registry over the cgs symbol table.
///
/// Expressions are products and quotients of symbols with optional integer powers,
/// e.g. `g/cm**3`, `cm/s`, `erg*s^-1`. Evaluation is strictly left to right.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    symbols: HashMap<String, (f64, Dimensions)>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self {
            symbols: CGS_SYMBOLS
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional symbol, e.g. a code unit tied to a dataset
    pub fn with_symbol(mut self, symbol: &str, cgs_factor: f64, dimensions: Dimensions) -> Self {
        self.symbols
            .insert(symbol.to_string(), (cgs_factor, dimensions));
        self
    }

    fn lookup(&self, symbol: &str, expr: &str) -> Result<(f64, Dimensions), StrataUnitError> {
        self.symbols
            .get(symbol)
            .copied()
            .ok_or_else(|| StrataUnitError::UnknownSymbol {
                symbol: symbol.to_string(),
                expr: expr.to_string(),
            })
    }
}

impl UnitSystem for UnitRegistry {
    fn parse(&self, expr: &str) -> Result<Unit, StrataUnitError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Ok(Unit::dimensionless());
        }

        let malformed = |reason: &str| StrataUnitError::MalformedExpression {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };

        let mut scanner = Scanner::new(trimmed);
        let mut factor = 1.0;
        let mut dimensions = Dimensions::DIMENSIONLESS;
        let mut divide = false;

        loop {
            scanner.skip_whitespace();
            let symbol = scanner.symbol();
            if symbol.is_empty() {
                return Err(malformed("expected a unit symbol"));
            }
            let (symbol_factor, symbol_dims) = self.lookup(symbol, expr)?;

            scanner.skip_whitespace();
            let exponent = if scanner.eat("**") || scanner.eat("^") {
                scanner.skip_whitespace();
                scanner
                    .integer()
                    .ok_or_else(|| malformed("expected an integer exponent"))?
            } else {
                1
            };

            let exponent = if divide { -exponent } else { exponent };
            factor *= symbol_factor.powi(exponent);
            dimensions = dimensions * symbol_dims.powi(exponent);

            scanner.skip_whitespace();
            if scanner.is_done() {
                break;
            } else if scanner.eat("*") {
                divide = false;
            } else if scanner.eat("/") {
                divide = true;
            } else {
                return Err(malformed("expected `*` or `/`"));
            }
        }

        Ok(Unit {
            expr: trimmed.to_string(),
            cgs_factor: factor,
            dimensions,
        })
    }
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn is_done(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn symbol(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn integer(&mut self) -> Option<i32> {
        let rest = self.rest();
        let (wrapped, inner) = match rest.strip_prefix('(') {
            Some(inner) => (true, inner),
            None => (false, rest),
        };
        let sign_len = usize::from(inner.starts_with('-') || inner.starts_with('+'));
        let digits = inner[sign_len..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(inner.len() - sign_len);
        if digits == 0 {
            return None;
        }
        let value = inner[..sign_len + digits].parse::<i32>().ok()?;
        let mut consumed = sign_len + digits;
        if wrapped {
            if !inner[consumed..].starts_with(')') {
                return None;
            }
            consumed += 2;
        }
        self.pos += consumed;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case("g/cm**3", 1.0, Dimensions { mass: 1, length: -3, ..Default::default() })]
    #[case("kg/m^3", 1.0e-3, Dimensions { mass: 1, length: -3, ..Default::default() })]
    #[case("cm/s", 1.0, Dimensions { length: 1, time: -1, ..Default::default() })]
    #[case("km/s", 1.0e5, Dimensions { length: 1, time: -1, ..Default::default() })]
    #[case("K", 1.0, Dimensions::TEMPERATURE)]
    #[case("Msun", MSUN_GRAMS, Dimensions::MASS)]
    #[case("erg/s", 1.0, Dimensions { mass: 1, length: 2, time: -3, ..Default::default() })]
    #[case("cm**(-3)", 1.0, Dimensions { length: -3, ..Default::default() })]
    #[case("", 1.0, Dimensions::DIMENSIONLESS)]
    fn test_parse(#[case] expr: &str, #[case] factor: f64, #[case] dims: Dimensions) {
        let unit = UnitRegistry::default().parse(expr).unwrap();
        assert_approx_eq!(f64, unit.cgs_factor, factor, epsilon = factor * 1e-12);
        assert_eq!(unit.dimensions, dims);
    }

    #[test]
    fn test_convert_density() {
        let registry = UnitRegistry::default();
        let converted = registry
            .convert(&[1.0, 2.5], "g/cm**3", "kg/m**3")
            .unwrap();
        assert_approx_eq!(f64, converted[0], 1000.0, epsilon = 1e-9);
        assert_approx_eq!(f64, converted[1], 2500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_convert_mass_to_msun() {
        let registry = UnitRegistry::default();
        let converted = registry.convert(&[MSUN_GRAMS * 2.0], "g", "Msun").unwrap();
        assert_approx_eq!(f64, converted[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_incompatible() {
        let registry = UnitRegistry::default();
        let err = registry.convert(&[1.0], "g", "cm/s").unwrap_err();
        assert!(matches!(err, StrataUnitError::Incompatible { .. }));
        assert!(!registry.is_compatible("K", "g"));
    }

    #[test]
    fn test_unknown_symbol() {
        let err = UnitRegistry::default().parse("furlong/fortnight").unwrap_err();
        assert_eq!(
            err,
            StrataUnitError::UnknownSymbol {
                symbol: "furlong".to_string(),
                expr: "furlong/fortnight".to_string()
            }
        );
    }

    #[rstest]
    #[case("g/")]
    #[case("g**")]
    #[case("g cm")]
    #[case("g**(2")]
    fn test_malformed(#[case] expr: &str) {
        let err = UnitRegistry::default().parse(expr).unwrap_err();
        assert!(matches!(err, StrataUnitError::MalformedExpression { .. }));
    }

    #[test]
    fn test_custom_symbol() {
        let registry =
            UnitRegistry::default().with_symbol("code_length", 3.0e24, Dimensions::LENGTH);
        let converted = registry.convert(&[1.0], "code_length", "Mpc").unwrap();
        assert_approx_eq!(f64, converted[0], 3.0e24 / (PC_CM * 1.0e6), epsilon = 1e-12);
    }
}
