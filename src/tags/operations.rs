// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! The operators that derive a virtual tag's series from its operands.

use crate::Error;

/// An operator applied to a single series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Identity.
    Noop,
    /// `v[t] - v[t-1]`, undefined for the first timestep.
    Delta,
    /// `v[t+1]`, undefined for the last timestep.
    ShiftLeft,
    /// `v[t-1]`, undefined for the first timestep.
    ShiftRight,
    Negate,
    /// Boolean negation: zero becomes one and everything else becomes zero.
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Noop => "noop",
            UnaryOp::Delta => "delta",
            UnaryOp::ShiftLeft => "<<",
            UnaryOp::ShiftRight => ">>",
            UnaryOp::Negate => "-",
            UnaryOp::Not => "~",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<UnaryOp> {
        match name {
            "noop" => Some(UnaryOp::Noop),
            "delta" => Some(UnaryOp::Delta),
            "<<" => Some(UnaryOp::ShiftLeft),
            ">>" => Some(UnaryOp::ShiftRight),
            "-" => Some(UnaryOp::Negate),
            "~" => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub(crate) fn apply(&self, series: &[f64]) -> Vec<f64> {
        let len = series.len();
        match self {
            UnaryOp::Noop => series.to_vec(),
            UnaryOp::Delta => (0..len)
                .map(|i| if i == 0 { f64::NAN } else { series[i] - series[i - 1] })
                .collect(),
            UnaryOp::ShiftLeft => (0..len)
                .map(|i| series.get(i + 1).copied().unwrap_or(f64::NAN))
                .collect(),
            UnaryOp::ShiftRight => (0..len)
                .map(|i| if i == 0 { f64::NAN } else { series[i - 1] })
                .collect(),
            UnaryOp::Negate => series.iter().map(|v| -v).collect(),
            UnaryOp::Not => series
                .iter()
                .map(|v| match v {
                    v if v.is_nan() => f64::NAN,
                    v if *v == 0.0 => 1.0,
                    _ => 0.0,
                })
                .collect(),
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operator combining two series elementwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<BinaryOp> {
        match name {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            _ => None,
        }
    }

    pub(crate) fn apply(&self, lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
        let op: fn(f64, f64) -> f64 = match self {
            BinaryOp::Add => |a, b| a + b,
            BinaryOp::Sub => |a, b| a - b,
            BinaryOp::Mul => |a, b| a * b,
            BinaryOp::Div => |a, b| a / b,
        };
        lhs.iter().zip(rhs).map(|(a, b)| op(*a, *b)).collect()
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a virtual tag combines its operands.
///
/// Each operand first goes through its unary operator, if there are any, and
/// the results are then combined from left to right with the binary
/// operators.  With `n` operands there are either no unary operators or `n` of
/// them, and exactly `n - 1` binary operators.
#[derive(Clone, Debug, PartialEq)]
pub struct Operator {
    unary: Vec<UnaryOp>,
    binary: Vec<BinaryOp>,
}

impl Operator {
    /// A single unary operator, for a virtual tag with one operand.
    pub fn unary(op: UnaryOp) -> Self {
        Self {
            unary: vec![op],
            binary: vec![],
        }
    }

    /// A binary operator applied between every pair of adjacent operands.
    pub fn binary(op: BinaryOp) -> Self {
        Self {
            unary: vec![],
            binary: vec![op],
        }
    }

    /// Explicit per-operand unary operators and between-operand binary
    /// operators.
    pub fn new(unary: Vec<UnaryOp>, binary: Vec<BinaryOp>) -> Self {
        Self { unary, binary }
    }

    /// Reads an operator name as written in the `operations` field of a
    /// document.
    ///
    /// `-` is negation for a single operand and subtraction otherwise.
    pub fn parse(name: &str, operand_count: usize) -> Result<Self, Error> {
        if operand_count > 1 {
            if let Some(op) = BinaryOp::from_name(name) {
                return Ok(Operator::binary(op));
            }
        } else if let Some(op) = UnaryOp::from_name(name) {
            return Ok(Operator::unary(op));
        }
        if UnaryOp::from_name(name).is_some() || BinaryOp::from_name(name).is_some() {
            return Err(Error::invalid_operation(format!(
                "Operator `{name}` can't be applied to {operand_count} operands."
            )));
        }
        Err(Error::unknown_type(format!("Unknown operator: {name}")))
    }

    pub fn unary_ops(&self) -> &[UnaryOp] {
        &self.unary
    }

    pub fn binary_ops(&self) -> &[BinaryOp] {
        &self.binary
    }

    /// Returns the operator as a single name, if it can be written that way.
    pub fn single_name(&self) -> Option<&'static str> {
        match (self.unary.as_slice(), self.binary.as_slice()) {
            ([op], []) => Some(op.as_str()),
            ([], [first, rest @ ..]) if rest.iter().all(|op| op == first) => Some(first.as_str()),
            _ => None,
        }
    }

    /// Spreads a single binary operator over all operands and checks that the
    /// operator fits the number of operands.
    pub(crate) fn normalize(&mut self, tag_id: &str, operand_count: usize) -> Result<(), Error> {
        if operand_count == 0 {
            return Err(Error::invalid_operation(format!(
                "Virtual tag {tag_id} has no operands."
            )));
        }
        if operand_count == 1 && self.unary.is_empty() && self.binary.is_empty() {
            self.unary.push(UnaryOp::Noop);
        }
        if self.binary.len() == 1 && operand_count > 2 {
            self.binary = vec![self.binary[0]; operand_count - 1];
        }
        if !self.unary.is_empty() && self.unary.len() != operand_count {
            return Err(Error::invalid_operation(format!(
                "Virtual tag {tag_id} has {} unary operators for {operand_count} operands.",
                self.unary.len()
            )));
        }
        if self.binary.len() != operand_count - 1 {
            return Err(Error::invalid_operation(format!(
                "Virtual tag {tag_id} has {} binary operators for {operand_count} operands.",
                self.binary.len()
            )));
        }
        Ok(())
    }

    /// Applies the operator to the operand series, which must all be of the
    /// same length.
    pub(crate) fn apply(&self, operands: Vec<Vec<f64>>) -> Vec<f64> {
        let mut operands = operands.into_iter().enumerate().map(|(i, series)| {
            match self.unary.get(i) {
                Some(op) => op.apply(&series),
                None => series,
            }
        });
        let Some(first) = operands.next() else {
            return vec![];
        };
        operands
            .zip(&self.binary)
            .fold(first, |acc, (series, op)| op.apply(&acc, &series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_series_eq(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} != {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!(
                (a.is_nan() && e.is_nan()) || a == e,
                "{actual:?} != {expected:?}"
            );
        }
    }

    #[test]
    fn test_unary_ops() {
        let series = [10.0, 20.0, 0.0];
        let nan = f64::NAN;
        assert_series_eq(&UnaryOp::Noop.apply(&series), &series);
        assert_series_eq(&UnaryOp::Delta.apply(&series), &[nan, 10.0, -20.0]);
        assert_series_eq(&UnaryOp::ShiftLeft.apply(&series), &[20.0, 0.0, nan]);
        assert_series_eq(&UnaryOp::ShiftRight.apply(&series), &[nan, 10.0, 20.0]);
        assert_series_eq(&UnaryOp::Negate.apply(&series), &[-10.0, -20.0, -0.0]);
        assert_series_eq(&UnaryOp::Not.apply(&[2.0, 0.0, nan]), &[0.0, 1.0, nan]);
        assert!(UnaryOp::Delta.apply(&[]).is_empty());
    }

    #[test]
    fn test_parse() -> Result<(), Error> {
        assert_eq!(Operator::parse("-", 1)?, Operator::unary(UnaryOp::Negate));
        assert_eq!(Operator::parse("-", 2)?, Operator::binary(BinaryOp::Sub));
        assert_eq!(Operator::parse("delta", 1)?, Operator::unary(UnaryOp::Delta));
        assert!(Operator::parse("delta", 2).is_err_and(|e| e
            == Error::invalid_operation("Operator `delta` can't be applied to 2 operands.")));
        assert!(Operator::parse("/", 1).is_err());
        assert!(Operator::parse("%", 2)
            .is_err_and(|e| e == Error::unknown_type("Unknown operator: %")));
        Ok(())
    }

    #[test]
    fn test_normalize() -> Result<(), Error> {
        let mut op = Operator::binary(BinaryOp::Add);
        op.normalize("Sum", 4)?;
        assert_eq!(op.binary_ops(), &[BinaryOp::Add; 3]);
        assert_eq!(op.single_name(), Some("+"));

        let mut op = Operator::new(vec![UnaryOp::Noop], vec![BinaryOp::Add]);
        assert!(op.normalize("Sum", 2).is_err_and(|e| e
            == Error::invalid_operation("Virtual tag Sum has 1 unary operators for 2 operands.")));

        let mut op = Operator::new(vec![], vec![BinaryOp::Add, BinaryOp::Sub]);
        op.normalize("Net", 3)?;
        assert_eq!(op.single_name(), None);

        let mut op = Operator::new(vec![], vec![]);
        op.normalize("Copy", 1)?;
        assert_eq!(op.single_name(), Some("noop"));

        let mut op = Operator::unary(UnaryOp::Delta);
        assert!(op.normalize("Empty", 0).is_err());
        Ok(())
    }

    #[test]
    fn test_apply() {
        let a = vec![10.0, 20.0, 30.0];
        let b = vec![1.0, 2.0, 3.0];
        let c = vec![2.0, 2.0, 2.0];

        let div = Operator::binary(BinaryOp::Div);
        assert_series_eq(&div.apply(vec![a.clone(), b.clone()]), &[10.0, 10.0, 10.0]);

        // left to right: (a - b) * c
        let op = Operator::new(vec![], vec![BinaryOp::Sub, BinaryOp::Mul]);
        assert_series_eq(
            &op.apply(vec![a.clone(), b.clone(), c.clone()]),
            &[18.0, 36.0, 54.0],
        );

        // unary operators are applied before combining
        let op = Operator::new(
            vec![UnaryOp::Delta, UnaryOp::Noop],
            vec![BinaryOp::Add],
        );
        assert_series_eq(&op.apply(vec![a, b]), &[f64::NAN, 12.0, 13.0]);
    }
}
