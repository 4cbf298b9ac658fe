//! Named value stacks with a parallel stack of symbolic names.

use crate::{Failure, Value};

/// Symbolic-name generation plus the read/write logs used to attribute
/// dependencies to the step currently executing.
#[derive(Debug, Clone, Default)]
pub struct Tracking {
    var_index: u64,
    values_read: Vec<String>,
    values_written: Vec<String>,
}

impl Tracking {
    pub fn newvar(&mut self) -> String {
        self.var_index += 1;
        format!("t{}", self.var_index)
    }

    pub fn on_read(&mut self, var: &str) {
        self.values_read.push(var.to_string());
    }

    pub fn on_write(&mut self, var: &str) {
        self.values_written.push(var.to_string());
    }

    pub fn reset(&mut self) {
        self.values_read.clear();
        self.values_written.clear();
    }

    pub fn values_read(&self) -> &[String] {
        &self.values_read
    }

    pub fn values_written(&self) -> &[String] {
        &self.values_written
    }
}

#[derive(Debug, Clone)]
pub struct VarStack {
    name: String,
    data: Vec<Value>,
    names: Vec<String>,
    pub(crate) frozen: bool,
}

impl VarStack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Vec::new(),
            names: Vec::new(),
            frozen: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has(&self, count: usize) -> bool {
        self.integrity_check();
        self.data.len() >= count
    }

    /// Value at `depth` below the top, without recording a read.
    pub fn value_at(&self, depth: usize) -> Option<&Value> {
        self.integrity_check();
        let idx = self.data.len().checked_sub(depth + 1)?;
        self.data.get(idx)
    }

    fn integrity_check(&self) {
        assert_eq!(
            self.data.len(),
            self.names.len(),
            "varstack {:?} lost track of its symbolic names",
            self.name
        );
    }

    fn modification(&self) -> Result<(), Failure> {
        if self.frozen {
            return Err(Failure::frozen(&self.name));
        }
        Ok(())
    }
}

/// Mutable access to one varstack, wired to its context's tracking state.
#[derive(Debug)]
pub struct StackHandle<'a> {
    stack: &'a mut VarStack,
    tracking: &'a mut Tracking,
}

impl<'a> StackHandle<'a> {
    pub(crate) fn new(stack: &'a mut VarStack, tracking: &'a mut Tracking) -> Self {
        Self { stack, tracking }
    }

    pub fn push(&mut self, value: Value) -> Result<(), Failure> {
        self.stack.modification()?;
        self.stack.integrity_check();
        let var = self.tracking.newvar();
        self.stack.data.push(value);
        self.tracking.on_write(&var);
        self.stack.names.push(var);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, Failure> {
        self.stack.modification()?;
        self.stack.integrity_check();
        let (Some(value), Some(var)) = (self.stack.data.pop(), self.stack.names.pop()) else {
            return Err(Failure::empty(&self.stack.name, 0));
        };
        self.tracking.on_read(&var);
        Ok(value)
    }

    pub fn peek(&mut self, depth: usize) -> Result<Value, Failure> {
        self.stack.integrity_check();
        let Some(idx) = self.stack.data.len().checked_sub(depth + 1) else {
            return Err(Failure::empty(&self.stack.name, depth));
        };
        self.tracking.on_read(&self.stack.names[idx]);
        Ok(self.stack.data[idx].clone())
    }

    /// Duplicates the top value together with its symbolic name.
    pub fn dup(&mut self) -> Result<(), Failure> {
        self.stack.modification()?;
        self.stack.integrity_check();
        let (Some(value), Some(var)) = (self.stack.data.last(), self.stack.names.last()) else {
            return Err(Failure::empty(&self.stack.name, 0));
        };
        let (value, var) = (value.clone(), var.clone());
        self.stack.data.push(value);
        self.stack.names.push(var);
        Ok(())
    }

    pub fn has(&self, count: usize) -> bool {
        self.stack.has(count)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;

    fn handle<'a>(stack: &'a mut VarStack, tracking: &'a mut Tracking) -> StackHandle<'a> {
        StackHandle::new(stack, tracking)
    }

    #[test]
    fn names_track_values_through_mutation() {
        let mut stack = VarStack::new("N");
        let mut tracking = Tracking::default();
        {
            let mut h = handle(&mut stack, &mut tracking);
            h.push(Value::Int(1)).unwrap();
            h.push(Value::Int(2)).unwrap();
            h.dup().unwrap();
            assert_eq!(h.pop().unwrap(), Value::Int(2));
            h.push(Value::Int(3)).unwrap();
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.names(), ["t1", "t2", "t3"]);
        assert_eq!(tracking.values_written(), ["t1", "t2", "t3"]);
        assert_eq!(tracking.values_read(), ["t2"]);
    }

    #[test]
    fn invariant_holds_after_every_call() {
        let mut stack = VarStack::new("N");
        let mut tracking = Tracking::default();
        for round in 0..50i64 {
            let mut h = handle(&mut stack, &mut tracking);
            let _ = match round % 4 {
                0 | 1 => h.push(Value::Int(round)),
                2 => h.dup(),
                _ => h.pop().map(|_| ()),
            };
            assert_eq!(stack.names().len(), stack.len());
        }
    }

    #[test]
    fn frozen_stack_rejects_mutation_but_allows_reads() {
        let mut stack = VarStack::new("N");
        let mut tracking = Tracking::default();
        handle(&mut stack, &mut tracking).push(Value::Int(4)).unwrap();
        stack.frozen = true;

        let mut h = handle(&mut stack, &mut tracking);
        assert_eq!(h.push(Value::Int(1)).unwrap_err().kind, FailureKind::FrozenStack);
        assert_eq!(h.pop().unwrap_err().kind, FailureKind::FrozenStack);
        assert_eq!(h.dup().unwrap_err().kind, FailureKind::FrozenStack);
        assert_eq!(h.peek(0).unwrap(), Value::Int(4));
        assert!(h.has(1));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn empty_stack_reports_depth() {
        let mut stack = VarStack::new("N");
        let mut tracking = Tracking::default();
        let mut h = handle(&mut stack, &mut tracking);
        assert_eq!(h.pop().unwrap_err().kind, FailureKind::EmptyStack);
        assert_eq!(h.dup().unwrap_err().kind, FailureKind::EmptyStack);
        h.push(Value::Int(1)).unwrap();
        let err = h.peek(1).unwrap_err();
        assert_eq!(err.kind, FailureKind::EmptyStack);
        assert!(err.message.contains("depth 1"));
    }

    #[test]
    fn reset_clears_logs_but_keeps_counter() {
        let mut tracking = Tracking::default();
        assert_eq!(tracking.newvar(), "t1");
        tracking.on_read("t1");
        tracking.reset();
        assert!(tracking.values_read().is_empty());
        assert_eq!(tracking.newvar(), "t2");
    }
}
