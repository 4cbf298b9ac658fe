//! Stock operation libraries over ints and lists.

use serde::{Deserialize, Serialize};

use crate::{BinaryOperator, Check, Machine, ReadAndWrite, UnaryOperator, Value, rand_range};

impl Machine {
    /// `+ - * /` and unary `-` on one stack. Division requires a non-zero divisor.
    pub fn arithmetic_operations(&mut self, stack: &str) {
        self.binary_operation(BinaryOperator::new("+", stack, Value::add));
        self.binary_operation(BinaryOperator::new("-", stack, Value::sub));
        self.binary_operation(BinaryOperator::new("*", stack, Value::mul));
        self.binary_operation(
            BinaryOperator::new("/", stack, Value::div).with_precondition(|_, y| !y.is_zero()),
        );
        self.unary_operation(UnaryOperator::new("-", stack, Value::neg));
    }

    pub fn power_operation(&mut self, stack: &str) {
        self.binary_operation(
            BinaryOperator::new("**", stack, Value::pow)
                .with_precondition(|_, y| matches!(y, Value::Int(e) if *e >= 0)),
        );
    }

    pub fn ints(&mut self, stack: &str) {
        self.basic_operations(stack);
        self.arithmetic_operations(stack);
        self.generate(|rng| Value::Int(rand_range(rng, 0, 1_000_000)), stack, None);
        self.generate(|rng| Value::Int(rand_range(rng, -10, 10)), stack, None);
    }

    /// Lists on `target` built from the elements on `source`.
    pub fn lists(&mut self, source: &str, target: &str) {
        self.basic_operations(target);
        self.generate(|_| Value::List(Vec::new()), target, Some("empty"));
        self.operation(
            ReadAndWrite::new("append", &[target, source], Some(target), |args| {
                let mut items = args[0].as_list()?.to_vec();
                items.push(args[1].clone());
                Ok(Value::List(items))
            })
            .with_pattern("[{}, vec![{}]].concat()"),
        );
        self.operation(
            ReadAndWrite::new("singleton", &[source], Some(target), |args| {
                Ok(Value::List(vec![args[0].clone()]))
            })
            .with_pattern("vec![{}]"),
        );
        self.operation(
            ReadAndWrite::new("pair", &[source, source], Some(target), |args| {
                Ok(Value::List(vec![args[0].clone(), args[1].clone()]))
            })
            .with_pattern("vec![{}, {}]"),
        );
        self.operation(
            ReadAndWrite::new("copy", &[target], Some(target), |args| {
                Ok(Value::List(args[0].as_list()?.to_vec()))
            })
            .with_pattern("{}.clone()"),
        );
        self.binary_operation(BinaryOperator::new("+", target, Value::add));
    }
}

/// Ready-made setups selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Library {
    /// Int arithmetic with a 32-bit range check.
    Ints,
    /// Lists of ints whose length must stay short.
    Lists,
    /// Pushes from {-1, 0, 1} and an unguarded division.
    Divide,
    /// Same pushes, but division declares a zero divisor inapplicable.
    GuardedDivide,
}

impl clap::ValueEnum for Library {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Ints, Self::Lists, Self::Divide, Self::GuardedDivide]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Ints => clap::builder::PossibleValue::new("ints"),
            Self::Lists => clap::builder::PossibleValue::new("lists"),
            Self::Divide => clap::builder::PossibleValue::new("divide"),
            Self::GuardedDivide => clap::builder::PossibleValue::new("guarded-divide"),
        })
    }
}

impl Library {
    pub fn install(self, machine: &mut Machine) {
        match self {
            Self::Ints => {
                machine.ints("ints");
                machine.power_operation("ints");
                machine.check(Check::new("fits_i32", &["ints"], |args| {
                    matches!(args[0], Value::Int(v) if i32::try_from(v).is_ok())
                }));
            }
            Self::Lists => {
                machine.ints("ints");
                machine.lists("ints", "lists");
                machine.check(Check::new("is_short", &["lists"], |args| {
                    args[0].as_list().map(|items| items.len() < 4).unwrap_or(false)
                }));
            }
            Self::Divide | Self::GuardedDivide => {
                machine.generate(|rng| Value::Int(rand_range(rng, -1, 1)), "N", None);
                let divide = BinaryOperator::new("/", "N", Value::div);
                machine.binary_operation(if self == Self::GuardedDivide {
                    divide.with_precondition(|_, y| !y.is_zero())
                } else {
                    divide
                });
            }
        }
    }
}
