// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Physical units and quantities.
//!
//! Units are kept symbolic: a unit is a product of base symbols raised to
//! integer powers, e.g. `m^3/day` or `kW*hr`.  Common spellings are normalized
//! to a canonical symbol, but no conversion between different symbols is
//! attempted, so `gal/min` and `m^3/day` are simply different units.

use std::collections::BTreeMap;

use crate::Error;

/// Spellings of a whole unit expression and what they normalize to.
const EXPRESSION_ALIASES: &[(&str, &str)] = &[
    ("million gallons per day", "MGD"),
    ("mgd", "MGD"),
    ("gpm", "gal/min"),
    ("gpd", "gal/day"),
    ("gph", "gal/hr"),
    ("cfm", "ft^3/min"),
    ("scfm", "SCFM"),
    ("cubic meters", "m^3"),
    ("cubic meter", "m^3"),
    ("cubic feet", "ft^3"),
    ("kwh", "kW*hr"),
    ("mwh", "MW*hr"),
];

/// Spellings of a single symbol and their canonical form.
const SYMBOL_ALIASES: &[(&str, &str)] = &[
    ("kilowatt", "kW"),
    ("kilowatts", "kW"),
    ("megawatt", "MW"),
    ("megawatts", "MW"),
    ("watt", "W"),
    ("watts", "W"),
    ("hour", "hr"),
    ("hours", "hr"),
    ("h", "hr"),
    ("minute", "min"),
    ("minutes", "min"),
    ("second", "s"),
    ("seconds", "s"),
    ("sec", "s"),
    ("day", "day"),
    ("days", "day"),
    ("d", "day"),
    ("meter", "m"),
    ("meters", "m"),
    ("metre", "m"),
    ("metres", "m"),
    ("foot", "ft"),
    ("feet", "ft"),
    ("inch", "in"),
    ("inches", "in"),
    ("gallon", "gal"),
    ("gallons", "gal"),
    ("liter", "L"),
    ("liters", "L"),
    ("litre", "L"),
    ("litres", "L"),
    ("l", "L"),
    ("kilogram", "kg"),
    ("kilograms", "kg"),
    ("gram", "g"),
    ("grams", "g"),
    ("pound", "lb"),
    ("pounds", "lb"),
    ("lbs", "lb"),
    ("horsepower", "hp"),
    ("volt", "V"),
    ("volts", "V"),
    ("ampere", "A"),
    ("amperes", "A"),
    ("amp", "A"),
    ("amps", "A"),
    ("hertz", "Hz"),
    ("percent", "%"),
    ("celsius", "degC"),
    ("fahrenheit", "degF"),
];

/// A physical unit, stored as base symbols with their exponents.
///
/// The empty product is the dimensionless unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Unit {
    factors: BTreeMap<String, i32>,
}

impl Unit {
    /// Returns the dimensionless unit.
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// Returns true if the unit has no dimensions.
    pub fn is_dimensionless(&self) -> bool {
        self.factors.is_empty()
    }

    /// Parses a unit expression.
    ///
    /// Returns `None` for an empty string or `"none"`, which documents use to
    /// say that a value has no units at all.
    pub fn parse(text: &str) -> Result<Option<Unit>, Error> {
        let trimmed = text.trim();
        let lowered = trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if lowered.is_empty() || lowered == "none" {
            return Ok(None);
        }
        if lowered == "dimensionless" {
            return Ok(Some(Unit::dimensionless()));
        }

        let expression = EXPRESSION_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| trimmed.replace(" per ", "/"));

        let mut unit = Unit::dimensionless();
        let mut sign = 1;
        let mut expect_factor = true;
        let mut tokens = tokenize(&expression)
            .ok_or_else(|| Error::malformed_document(format!("Invalid units: {text}")))?
            .into_iter()
            .peekable();

        while let Some(token) = tokens.next() {
            match token {
                Token::Mul | Token::Div if expect_factor => {
                    return Err(Error::malformed_document(format!("Invalid units: {text}")));
                }
                Token::Mul => {
                    sign = 1;
                    expect_factor = true;
                }
                Token::Div => {
                    sign = -1;
                    expect_factor = true;
                }
                Token::Pow(_) => {
                    return Err(Error::malformed_document(format!("Invalid units: {text}")));
                }
                Token::Symbol(symbol) => {
                    let mut exponent = 1;
                    if let Some(Token::Pow(power)) = tokens.peek() {
                        exponent = *power;
                        tokens.next();
                    }
                    // `1/s` style expressions
                    if symbol != "1" {
                        let (base, trailing) = split_trailing_power(&symbol);
                        unit.multiply_factor(&canonical_symbol(base), sign * exponent * trailing);
                    }
                    // adjacent symbols multiply
                    sign = 1;
                    expect_factor = false;
                }
            }
        }

        if expect_factor {
            return Err(Error::malformed_document(format!("Invalid units: {text}")));
        }
        Ok(Some(unit))
    }

    /// Returns the unit raised to the given integer power.
    pub fn powi(&self, power: i32) -> Unit {
        let mut unit = Unit::dimensionless();
        for (symbol, exponent) in &self.factors {
            unit.multiply_factor(symbol, exponent * power);
        }
        unit
    }

    fn multiply_factor(&mut self, symbol: &str, exponent: i32) {
        let entry = self.factors.entry(symbol.to_string()).or_insert(0);
        *entry += exponent;
        if *entry == 0 {
            self.factors.remove(symbol);
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)?.ok_or_else(|| Error::malformed_document(format!("Invalid units: {s}")))
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "dimensionless");
        }
        let format_factor = |symbol: &str, exponent: i32| {
            if exponent == 1 {
                symbol.to_string()
            } else {
                format!("{symbol}^{exponent}")
            }
        };
        let numerator = self
            .factors
            .iter()
            .filter(|(_, e)| **e > 0)
            .map(|(s, e)| format_factor(s, *e))
            .collect::<Vec<_>>();
        let denominator = self
            .factors
            .iter()
            .filter(|(_, e)| **e < 0)
            .map(|(s, e)| format_factor(s, -*e))
            .collect::<Vec<_>>();

        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", numerator.join("*"))?;
        }
        for factor in denominator {
            write!(f, "/{factor}")?;
        }
        Ok(())
    }
}

impl std::ops::Mul for &Unit {
    type Output = Unit;

    fn mul(self, rhs: &Unit) -> Unit {
        let mut unit = self.clone();
        for (symbol, exponent) in &rhs.factors {
            unit.multiply_factor(symbol, *exponent);
        }
        unit
    }
}

impl std::ops::Div for &Unit {
    type Output = Unit;

    fn div(self, rhs: &Unit) -> Unit {
        self * &rhs.powi(-1)
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Symbol(String),
    Mul,
    Div,
    Pow(i32),
}

fn tokenize(expression: &str) -> Option<Vec<Token>> {
    let mut tokens = vec![];
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '*' || c == '·' {
            chars.next();
            if chars.peek() == Some(&'*') {
                chars.next();
                tokens.push(Token::Pow(read_integer(&mut chars)?));
            } else {
                tokens.push(Token::Mul);
            }
        } else if c == '/' {
            chars.next();
            tokens.push(Token::Div);
        } else if c == '^' {
            chars.next();
            tokens.push(Token::Pow(read_integer(&mut chars)?));
        } else if c.is_alphanumeric() || matches!(c, '_' | '%' | '°' | 'µ') {
            let mut symbol = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || matches!(c, '_' | '%' | '°' | 'µ') {
                    symbol.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Symbol(symbol));
        } else {
            return None;
        }
    }
    Some(tokens)
}

fn read_integer(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<i32> {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    let mut digits = String::new();
    if chars.peek() == Some(&'-') {
        digits.push('-');
        chars.next();
    }
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            chars.next();
        } else {
            break;
        }
    }
    digits.parse().ok()
}

/// Splits `m3` into `("m", 3)`.  Symbols without a trailing power, or made
/// only of digits, are returned as they are.
fn split_trailing_power(symbol: &str) -> (&str, i32) {
    let base = symbol.trim_end_matches(|c: char| c.is_ascii_digit());
    if base.is_empty() || base.len() == symbol.len() {
        return (symbol, 1);
    }
    match symbol[base.len()..].parse() {
        Ok(power) => (base, power),
        Err(_) => (symbol, 1),
    }
}

fn canonical_symbol(symbol: &str) -> String {
    let lowered = symbol.to_lowercase();
    SYMBOL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| symbol.to_string())
}

/// A numeric value with a physical unit.
///
/// A `None` value means the value is unknown, which is different from zero.
/// Arithmetic with an unknown value produces an unknown value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Quantity {
    value: Option<f64>,
    units: Option<Unit>,
}

impl Quantity {
    /// Creates a new quantity.
    pub fn new(value: Option<f64>, units: Option<Unit>) -> Self {
        Self { value, units }
    }

    /// Returns the value, if known.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Returns the units, if any.
    pub fn units(&self) -> Option<&Unit> {
        self.units.as_ref()
    }

    /// Returns true if the value is not known.
    pub fn is_unknown(&self) -> bool {
        self.value.is_none()
    }

    /// Adds two quantities, failing if their units differ.
    ///
    /// Units are compared as normalized symbols, not by dimension. Two
    /// flows such as `MGD` and `m^3/day` are a `UnitMismatch`, since no
    /// conversion between spellings is attempted.
    pub fn checked_add(&self, other: &Quantity) -> Result<Quantity, Error> {
        let units = self.common_units(other, "add")?;
        Ok(Quantity::new(
            self.value.zip(other.value).map(|(a, b)| a + b),
            units,
        ))
    }

    /// Subtracts `other` from this quantity, failing if their units differ.
    ///
    /// Units are compared as in [`Quantity::checked_add`].
    pub fn checked_sub(&self, other: &Quantity) -> Result<Quantity, Error> {
        let units = self.common_units(other, "subtract")?;
        Ok(Quantity::new(
            self.value.zip(other.value).map(|(a, b)| a - b),
            units,
        ))
    }

    fn common_units(&self, other: &Quantity, verb: &str) -> Result<Option<Unit>, Error> {
        let lhs = self.units.clone().unwrap_or_default();
        let rhs = other.units.clone().unwrap_or_default();
        if lhs != rhs {
            return Err(Error::unit_mismatch(format!(
                "Can't {verb} quantities in {lhs} and {rhs}."
            )));
        }
        Ok(self.units.clone().or_else(|| other.units.clone()))
    }
}

impl std::ops::Mul for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: &Quantity) -> Quantity {
        let units = match (&self.units, &rhs.units) {
            (None, None) => None,
            (a, b) => Some(&a.clone().unwrap_or_default() * &b.clone().unwrap_or_default()),
        };
        Quantity::new(self.value.zip(rhs.value).map(|(a, b)| a * b), units)
    }
}

impl std::ops::Div for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: &Quantity) -> Quantity {
        let units = match (&self.units, &rhs.units) {
            (None, None) => None,
            (a, b) => Some(&a.clone().unwrap_or_default() / &b.clone().unwrap_or_default()),
        };
        Quantity::new(self.value.zip(rhs.value).map(|(a, b)| a / b), units)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.value, &self.units) {
            (Some(value), Some(units)) => write!(f, "{value} {units}"),
            (Some(value), None) => write!(f, "{value}"),
            (None, Some(units)) => write!(f, "unknown {units}"),
            (None, None) => write!(f, "unknown"),
        }
    }
}

/// Creates a [`Quantity`] from a value and a unit expression.
pub fn parse_quantity(value: Option<f64>, units: &str) -> Result<Quantity, Error> {
    Ok(Quantity::new(value, Unit::parse(units)?))
}

/// The operating range of a piece of equipment, e.g. its flow rate.
///
/// Any of the bounds may be unknown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DesignRange {
    pub min: Quantity,
    pub max: Quantity,
    pub design: Quantity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn unit(text: &str) -> Unit {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_units() -> Result<(), Error> {
        assert_eq!(Unit::parse("")?, None);
        assert_eq!(Unit::parse("None")?, None);
        assert_eq!(Unit::parse("dimensionless")?, Some(Unit::dimensionless()));

        assert_eq!(unit("gpm"), unit("gal/min"));
        assert_eq!(unit("gallons / minute"), unit("gal/min"));
        assert_eq!(unit("cubic meters"), unit("m^3"));
        assert_eq!(unit("m3"), unit("m**3"));
        assert_eq!(unit("kWh"), unit("kilowatt * hour"));
        assert_eq!(unit("kW hr"), unit("kW*hr"));
        assert_eq!(unit("m^3/day"), unit("m^3 per day"));
        assert_eq!(
            unit("kilowatt * hour / SCFM"),
            &unit("kW*hr") / &unit("SCFM")
        );
        assert_ne!(unit("MGD"), unit("gal/day"));

        assert!(Unit::parse("m^").is_err_and(|e| e.kind() == ErrorKind::MalformedDocument));
        assert!(Unit::parse("kW/").is_err_and(|e| e == Error::malformed_document("Invalid units: kW/")));
        assert!(Unit::parse("(m)").is_err());
        Ok(())
    }

    #[test]
    fn test_display() {
        assert_eq!(unit("gpm").to_string(), "gal/min");
        assert_eq!(unit("m^3/day").to_string(), "m^3/day");
        assert_eq!(unit("1/s").to_string(), "1/s");
        assert_eq!(Unit::dimensionless().to_string(), "dimensionless");

        for text in ["kW*hr/SCFM", "m^3/day", "1/s", "dimensionless", "MGD"] {
            assert_eq!(unit(&unit(text).to_string()), unit(text));
        }
    }

    #[test]
    fn test_unit_algebra() {
        let flow = unit("m^3/day");
        let time = unit("day");
        assert_eq!(&flow * &time, unit("m^3"));
        assert_eq!(&flow / &flow, Unit::dimensionless());
        assert!((&flow / &flow).is_dimensionless());
        assert_eq!(time.powi(-2), unit("1/day^2"));
    }

    #[test]
    fn test_quantity_arithmetic() -> Result<(), Error> {
        let a = parse_quantity(Some(3.0), "MGD")?;
        let b = parse_quantity(Some(2.0), "million gallons per day")?;
        assert_eq!(a.checked_add(&b)?, parse_quantity(Some(5.0), "MGD")?);
        assert_eq!(a.checked_sub(&b)?.value(), Some(1.0));

        let power = parse_quantity(Some(10.0), "kW")?;
        assert!(a.checked_add(&power).is_err_and(|e| e
            == Error::unit_mismatch("Can't add quantities in MGD and kW.")));

        // same dimension, different symbols
        let metric = parse_quantity(Some(1.0), "m^3/day")?;
        assert!(a.checked_add(&metric).is_err_and(|e| e
            == Error::unit_mismatch("Can't add quantities in MGD and m^3/day.")));
        assert!(metric.checked_sub(&a).is_err_and(|e| e.kind() == ErrorKind::UnitMismatch));

        let energy = &power * &parse_quantity(Some(2.0), "hr")?;
        assert_eq!(energy, parse_quantity(Some(20.0), "kWh")?);
        assert_eq!((&a / &b).units(), Some(&Unit::dimensionless()));
        Ok(())
    }

    #[test]
    fn test_unknown_values() -> Result<(), Error> {
        let unknown = parse_quantity(None, "MGD")?;
        let zero = parse_quantity(Some(0.0), "MGD")?;
        assert!(unknown.is_unknown());
        assert!(!zero.is_unknown());
        assert_ne!(unknown, zero);
        assert!(unknown.checked_add(&zero)?.is_unknown());
        assert_eq!(unknown.to_string(), "unknown MGD");
        Ok(())
    }
}
