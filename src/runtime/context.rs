//! Per-attempt execution context: varstacks, symbolic names, read/write logs.

use rand_chacha::ChaCha20Rng;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::{Failure, StackHandle, Tracking, Value, VarStack};

/// Owns every varstack touched by one program attempt.
///
/// A context borrows the run's RNG handle rather than owning one, so search,
/// pruning and annotation all draw from the same seeded source.
pub struct RunContext<'r> {
    rng: &'r mut ChaCha20Rng,
    varstacks: BTreeMap<String, VarStack>,
    tracking: Tracking,
}

impl<'r> RunContext<'r> {
    pub fn new(rng: &'r mut ChaCha20Rng) -> Self {
        Self {
            rng,
            varstacks: BTreeMap::new(),
            tracking: Tracking::default(),
        }
    }

    pub fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut *self.rng
    }

    /// Returns the named varstack, creating it on first reference.
    pub fn varstack(&mut self, name: &str) -> StackHandle<'_> {
        let stack = self
            .varstacks
            .entry(name.to_string())
            .or_insert_with(|| VarStack::new(name));
        StackHandle::new(stack, &mut self.tracking)
    }

    pub fn stack(&self, name: &str) -> Option<&VarStack> {
        self.varstacks.get(name)
    }

    pub fn has(&self, name: &str, count: usize) -> bool {
        match self.varstacks.get(name) {
            Some(stack) => stack.has(count),
            None => count == 0,
        }
    }

    pub fn newvar(&mut self) -> String {
        self.tracking.newvar()
    }

    pub fn on_read(&mut self, var: &str) {
        self.tracking.on_read(var);
    }

    pub fn on_write(&mut self, var: &str) {
        self.tracking.on_write(var);
    }

    pub fn reset_tracking(&mut self) {
        self.tracking.reset();
    }

    pub fn values_read(&self) -> &[String] {
        self.tracking.values_read()
    }

    pub fn values_written(&self) -> &[String] {
        self.tracking.values_written()
    }

    /// Reads one value per argspec entry without popping.
    ///
    /// A stack named `k` times yields its top `k` values, topmost first.
    pub fn read<S: AsRef<str>>(&mut self, argspec: &[S]) -> Result<Vec<Value>, Failure> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        let mut out = Vec::with_capacity(argspec.len());
        for name in argspec {
            let name = name.as_ref();
            let depth = seen.entry(name).or_insert(0);
            out.push(self.varstack(name).peek(*depth)?);
            *depth += 1;
        }
        Ok(out)
    }

    /// Same layout as [`RunContext::read`], but records nothing and never
    /// creates stacks. `None` when some entry is missing.
    pub fn inspect<S: AsRef<str>>(&self, argspec: &[S]) -> Option<Vec<Value>> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        let mut out = Vec::with_capacity(argspec.len());
        for name in argspec {
            let name = name.as_ref();
            let depth = seen.entry(name).or_insert(0);
            out.push(self.varstacks.get(name)?.value_at(*depth)?.clone());
            *depth += 1;
        }
        Some(out)
    }

    /// Freezes the named stacks until the returned guard is dropped.
    ///
    /// Only stacks this call froze are thawed on drop, so nested scopes over
    /// the same stack keep the outer freeze in place.
    pub fn freeze<S: AsRef<str>>(&mut self, names: &[S]) -> FreezeGuard<'_, 'r> {
        let mut frozen = Vec::new();
        for name in names {
            let name = name.as_ref();
            let stack = self
                .varstacks
                .entry(name.to_string())
                .or_insert_with(|| VarStack::new(name));
            if !stack.frozen {
                stack.frozen = true;
                frozen.push(name.to_string());
            }
        }
        FreezeGuard { ctx: self, frozen }
    }
}

impl fmt::Debug for RunContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for RunContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RunContext(")?;
        for (i, stack) in self.varstacks.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", stack.name(), stack.len())?;
        }
        f.write_str(")")
    }
}

/// Read-only scope over a set of varstacks.
pub struct FreezeGuard<'c, 'r> {
    ctx: &'c mut RunContext<'r>,
    frozen: Vec<String>,
}

impl<'r> Deref for FreezeGuard<'_, 'r> {
    type Target = RunContext<'r>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl DerefMut for FreezeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for FreezeGuard<'_, '_> {
    fn drop(&mut self) {
        for name in &self.frozen {
            if let Some(stack) = self.ctx.varstacks.get_mut(name) {
                stack.frozen = false;
            }
        }
    }
}
