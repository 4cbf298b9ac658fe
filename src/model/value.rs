//! Runtime values carried on varstacks.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::{Failure, FailureKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    List(Vec<Value>),
}

impl Value {
    pub fn as_int(&self) -> Result<i64, Failure> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(Failure::domain(format!("expected an int, got {other}"))),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], Failure> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(Failure::domain(format!("expected a list, got {other}"))),
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Int(0))
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, Failure> {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_add(*b)
                .map(Self::Int)
                .ok_or_else(|| overflow("+", *a, *b)),
            (Self::List(a), Self::List(b)) => {
                let mut out = a.clone();
                out.extend(b.iter().cloned());
                Ok(Self::List(out))
            }
            (a, b) => Err(Failure::domain(format!("unsupported operands for +: {a} and {b}"))),
        }
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, Failure> {
        let (a, b) = (self.as_int()?, rhs.as_int()?);
        a.checked_sub(b).map(Self::Int).ok_or_else(|| overflow("-", a, b))
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, Failure> {
        let (a, b) = (self.as_int()?, rhs.as_int()?);
        a.checked_mul(b).map(Self::Int).ok_or_else(|| overflow("*", a, b))
    }

    /// Integer division rounding toward zero, matching the rendered Rust `/`
    /// (`7 / -2 == -3`).
    pub fn div(&self, rhs: &Value) -> Result<Value, Failure> {
        let (a, b) = (self.as_int()?, rhs.as_int()?);
        if b == 0 {
            return Err(Failure::new(
                FailureKind::DivisionByZero,
                format!("attempt to divide {a} by zero"),
            ));
        }
        a.checked_div(b).map(Self::Int).ok_or_else(|| overflow("/", a, b))
    }

    pub fn pow(&self, rhs: &Value) -> Result<Value, Failure> {
        let (a, b) = (self.as_int()?, rhs.as_int()?);
        let exp = u32::try_from(b)
            .map_err(|_| Failure::domain(format!("exponent {b} is not a non-negative u32")))?;
        a.checked_pow(exp).map(Self::Int).ok_or_else(|| overflow("**", a, b))
    }

    pub fn neg(&self) -> Result<Value, Failure> {
        let a = self.as_int()?;
        a.checked_neg().map(Self::Int).ok_or_else(|| {
            Failure::new(FailureKind::Overflow, format!("attempt to negate {a} with overflow"))
        })
    }
}

fn overflow(symbol: &str, a: i64, b: i64) -> Failure {
    Failure::new(
        FailureKind::Overflow,
        format!("attempt to compute {a} {symbol} {b} with overflow"),
    )
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("vec![")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}
