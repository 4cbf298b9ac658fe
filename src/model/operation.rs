//! Concrete, already-parameterized program operations.
//!
//! Every variant answers four questions: can it run here (`applicable`), run it
//! (`invoke`), and how does one execution read as source (`compile`). The
//! fourth, `inputs_available`, is the structural half of `applicable` and is
//! all the choice combinator consults while generating.

use std::fmt;
use std::sync::Arc;

use crate::{Failure, FailureKind, RunContext, Value};

/// Maps popped (or read) arguments to a result.
pub type OpFn = Arc<dyn Fn(&[Value]) -> Result<Value, Failure> + Send + Sync>;

/// Domain precondition or check predicate over arguments.
pub type Predicate = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct ReadAndWrite {
    pub name: String,
    pub argspec: Vec<String>,
    /// Result is discarded when `None`.
    pub target: Option<String>,
    pub function: OpFn,
    pub precondition: Option<Predicate>,
    /// Rendering template; each `{}` takes the next argument name.
    pub pattern: Option<String>,
}

#[derive(Clone)]
pub struct Check {
    pub name: String,
    pub argspec: Vec<String>,
    pub test: Predicate,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Push {
    pub target: String,
    pub value: Value,
    pub name: Option<String>,
}

/// Pops `y` then `x` from one stack and pushes `function([x, y])`.
#[derive(Clone)]
pub struct BinaryOperator {
    pub symbol: String,
    pub stack: String,
    pub function: OpFn,
    /// Sees `[x, y]`.
    pub precondition: Option<Predicate>,
}

#[derive(Clone)]
pub struct UnaryOperator {
    pub symbol: String,
    pub stack: String,
    pub function: OpFn,
    pub precondition: Option<Predicate>,
}

impl ReadAndWrite {
    pub fn new<F>(name: &str, argspec: &[&str], target: Option<&str>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Failure> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            argspec: argspec.iter().map(|s| s.to_string()).collect(),
            target: target.map(str::to_string),
            function: Arc::new(function),
            precondition: None,
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn with_precondition<P>(mut self, precondition: P) -> Self
    where
        P: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        self.precondition = Some(Arc::new(precondition));
        self
    }
}

impl Check {
    pub fn new<T>(name: &str, argspec: &[&str], test: T) -> Self
    where
        T: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            argspec: argspec.iter().map(|s| s.to_string()).collect(),
            test: Arc::new(test),
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }
}

impl BinaryOperator {
    pub fn new<F>(symbol: &str, stack: &str, function: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value, Failure> + Send + Sync + 'static,
    {
        Self {
            symbol: symbol.to_string(),
            stack: stack.to_string(),
            function: Arc::new(move |args: &[Value]| function(&args[0], &args[1])),
            precondition: None,
        }
    }

    pub fn with_precondition<P>(mut self, precondition: P) -> Self
    where
        P: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.precondition = Some(Arc::new(move |args: &[Value]| precondition(&args[0], &args[1])));
        self
    }
}

impl UnaryOperator {
    pub fn new<F>(symbol: &str, stack: &str, function: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, Failure> + Send + Sync + 'static,
    {
        Self {
            symbol: symbol.to_string(),
            stack: stack.to_string(),
            function: Arc::new(move |args: &[Value]| function(&args[0])),
            precondition: None,
        }
    }

    pub fn with_precondition<P>(mut self, precondition: P) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.precondition = Some(Arc::new(move |args: &[Value]| precondition(&args[0])));
        self
    }
}

#[derive(Debug, Clone)]
pub enum Operation {
    ReadAndWrite(Arc<ReadAndWrite>),
    Check(Arc<Check>),
    Push(Push),
    BinaryOperator(Arc<BinaryOperator>),
    UnaryOperator(Arc<UnaryOperator>),
    Dup { stack: String },
    Drop { stack: String },
}

impl Operation {
    /// Enough values on every stack this operation consumes or reads.
    pub fn inputs_available(&self, ctx: &RunContext<'_>) -> bool {
        match self {
            Self::ReadAndWrite(op) => ctx.inspect(op.argspec.as_slice()).is_some(),
            Self::Check(op) => ctx.inspect(op.argspec.as_slice()).is_some(),
            Self::Push(_) => true,
            Self::BinaryOperator(op) => ctx.has(&op.stack, 2),
            Self::UnaryOperator(op) => ctx.has(&op.stack, 1),
            Self::Dup { stack } | Self::Drop { stack } => ctx.has(stack, 1),
        }
    }

    /// True iff invoking now would not violate a structural or domain
    /// precondition.
    pub fn applicable(&self, ctx: &RunContext<'_>) -> bool {
        match self {
            Self::ReadAndWrite(op) => match ctx.inspect(op.argspec.as_slice()) {
                Some(args) => op.precondition.as_ref().is_none_or(|pre| pre(&args)),
                None => false,
            },
            Self::BinaryOperator(op) => match ctx.inspect(&[&op.stack, &op.stack]) {
                Some(top) => {
                    let args = [top[1].clone(), top[0].clone()];
                    op.precondition.as_ref().is_none_or(|pre| pre(&args))
                }
                None => false,
            },
            Self::UnaryOperator(op) => match ctx.inspect(&[&op.stack]) {
                Some(args) => op.precondition.as_ref().is_none_or(|pre| pre(&args)),
                None => false,
            },
            Self::Check(_) | Self::Push(_) | Self::Dup { .. } | Self::Drop { .. } => {
                self.inputs_available(ctx)
            }
        }
    }

    pub fn invoke(&self, ctx: &mut RunContext<'_>) -> Result<(), Failure> {
        match self {
            Self::ReadAndWrite(op) => {
                let mut args = Vec::with_capacity(op.argspec.len());
                for stack in &op.argspec {
                    args.push(ctx.varstack(stack).pop()?);
                }
                let result = (op.function)(&args)?;
                if let Some(target) = &op.target {
                    ctx.varstack(target).push(result)?;
                }
                Ok(())
            }
            Self::Check(op) => {
                let mut frozen = ctx.freeze(op.argspec.as_slice());
                let args = frozen.read(op.argspec.as_slice())?;
                if (op.test)(&args) {
                    return Ok(());
                }
                let shown: Vec<String> = args.iter().map(Value::to_string).collect();
                Err(Failure::new(
                    FailureKind::CheckFailed,
                    format!("check {} failed for ({})", op.name, shown.join(", ")),
                ))
            }
            Self::Push(op) => ctx.varstack(&op.target).push(op.value.clone()),
            Self::BinaryOperator(op) => {
                let mut stack = ctx.varstack(&op.stack);
                let y = stack.pop()?;
                let x = stack.pop()?;
                let result = (op.function)(&[x, y])?;
                stack.push(result)
            }
            Self::UnaryOperator(op) => {
                let mut stack = ctx.varstack(&op.stack);
                let x = stack.pop()?;
                let result = (op.function)(&[x])?;
                stack.push(result)
            }
            Self::Dup { stack } => ctx.varstack(stack).dup(),
            Self::Drop { stack } => ctx.varstack(stack).pop().map(|_| ()),
        }
    }

    /// Renders one execution given the symbolic names it read and wrote.
    ///
    /// `results` is empty for the failing step, which renders as a bare
    /// expression statement.
    pub fn compile(&self, arguments: &[String], results: &[String]) -> Vec<String> {
        let expr = match self {
            Self::ReadAndWrite(op) => match &op.pattern {
                Some(pattern) => fill_pattern(pattern, arguments),
                None => call(&op.name, arguments),
            },
            Self::Check(op) => {
                let test = match &op.pattern {
                    Some(pattern) => fill_pattern(pattern, arguments),
                    None => call(&op.name, arguments),
                };
                return vec![format!("assert!({test});")];
            }
            Self::Push(op) => op.value.to_string(),
            Self::BinaryOperator(op) => {
                // Popped top-first, so the log holds [y, x].
                format!("{} {} {}", arg(arguments, 1), op.symbol, arg(arguments, 0))
            }
            Self::UnaryOperator(op) => format!("{}{}", op.symbol, arg(arguments, 0)),
            Self::Dup { .. } | Self::Drop { .. } => return Vec::new(),
        };
        vec![bind(results, &expr)]
    }

    pub fn name(&self) -> &str {
        match self {
            Self::ReadAndWrite(op) => &op.name,
            Self::Check(op) => &op.name,
            Self::Push(op) => op.name.as_deref().unwrap_or("push"),
            Self::BinaryOperator(op) => &op.symbol,
            Self::UnaryOperator(op) => &op.symbol,
            Self::Dup { .. } => "dup",
            Self::Drop { .. } => "drop",
        }
    }
}

/// Identity for shared variants, structural for the rest.
impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ReadAndWrite(a), Self::ReadAndWrite(b)) => Arc::ptr_eq(a, b),
            (Self::Check(a), Self::Check(b)) => Arc::ptr_eq(a, b),
            (Self::Push(a), Self::Push(b)) => a == b,
            (Self::BinaryOperator(a), Self::BinaryOperator(b)) => Arc::ptr_eq(a, b),
            (Self::UnaryOperator(a), Self::UnaryOperator(b)) => Arc::ptr_eq(a, b),
            (Self::Dup { stack: a }, Self::Dup { stack: b }) => a == b,
            (Self::Drop { stack: a }, Self::Drop { stack: b }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadAndWrite(op) => write!(f, "{}({})", op.name, op.argspec.join(", ")),
            Self::Check(op) => write!(f, "check {}({})", op.name, op.argspec.join(", ")),
            Self::Push(op) => write!(f, "push {} -> {}", op.value, op.target),
            Self::BinaryOperator(op) => write!(f, "binary {} on {}", op.symbol, op.stack),
            Self::UnaryOperator(op) => write!(f, "unary {} on {}", op.symbol, op.stack),
            Self::Dup { stack } => write!(f, "dup {stack}"),
            Self::Drop { stack } => write!(f, "drop {stack}"),
        }
    }
}

fn arg(arguments: &[String], idx: usize) -> &str {
    arguments.get(idx).map(String::as_str).unwrap_or("_")
}

fn call(name: &str, arguments: &[String]) -> String {
    format!("{name}({})", arguments.join(", "))
}

fn fill_pattern(pattern: &str, arguments: &[String]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    let mut idx = 0usize;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        out.push_str(arg(arguments, idx));
        idx += 1;
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

fn bind(results: &[String], expr: &str) -> String {
    match results {
        [] => format!("{expr};"),
        [one] => format!("let {one} = {expr};"),
        many => format!("let ({}) = {expr};", many.join(", ")),
    }
}

macro_rules! opaque_debug {
    ($ty:ident { $($field:ident),* }) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &self.$field))*
                    .finish_non_exhaustive()
            }
        }
    };
}

opaque_debug!(ReadAndWrite { name, argspec, target, pattern });
opaque_debug!(Check { name, argspec, pattern });
opaque_debug!(BinaryOperator { symbol, stack });
opaque_debug!(UnaryOperator { symbol, stack });
