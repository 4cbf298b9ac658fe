//! The machine: registered languages, configuration and the run's RNG.

use rand_chacha::ChaCha20Rng;

use std::sync::Arc;

use crate::{
    BinaryOperator, Check, ChooseFrom, Failure, Language, MachineConfig, Operation, PushRandom,
    ReadAndWrite, RunContext, SearchStats, UnaryOperator, Value, gen_seed, rng_from_seed,
};

/// Generates random programs from its registered languages, searches for
/// failing ones and shrinks them.
///
/// One RNG handle is seeded per machine and lent to every context the machine
/// builds, so a fixed seed reproduces search, pruning and annotation alike.
#[derive(Debug)]
pub struct Machine {
    pub(crate) config: MachineConfig,
    pub(crate) languages: Vec<Language>,
    pub(crate) seed: u64,
    pub(crate) rng: ChaCha20Rng,
    pub(crate) stats: SearchStats,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let seed = config.seed.unwrap_or_else(gen_seed);
        Self {
            config,
            languages: Vec::new(),
            seed,
            rng: rng_from_seed(seed),
            stats: SearchStats::default(),
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Statistics of the most recent search.
    pub fn search_stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn add_language(&mut self, language: Language) {
        self.languages.push(language);
    }

    /// Uniform choice over everything registered so far.
    pub fn language(&self) -> Language {
        Language::ChooseFrom(ChooseFrom::uniform(self.languages.iter().cloned()))
    }

    /// Pops one value per argspec entry, applies the function and pushes the
    /// result onto the operation's target (if any).
    pub fn operation(&mut self, op: ReadAndWrite) {
        self.add_language(Language::ReadAndWrite(Arc::new(op)));
    }

    /// Reads (without popping) the argspec values and fails when the test is false.
    pub fn check(&mut self, check: Check) {
        self.add_language(Language::Check(Arc::new(check)));
    }

    /// Pushes values drawn by `produce` onto `target`.
    pub fn generate<F>(&mut self, produce: F, target: &str, name: Option<&str>)
    where
        F: Fn(&mut ChaCha20Rng) -> Value + Send + Sync + 'static,
    {
        self.add_language(Language::PushRandom(Arc::new(PushRandom {
            target: target.to_string(),
            produce: Arc::new(produce),
            name: name.map(str::to_string),
        })));
    }

    pub fn binary_operation(&mut self, op: BinaryOperator) {
        self.add_language(Language::BinaryOperator(Arc::new(op)));
    }

    pub fn unary_operation(&mut self, op: UnaryOperator) {
        self.add_language(Language::UnaryOperator(Arc::new(op)));
    }

    pub fn basic_operations(&mut self, stack: &str) {
        self.add_language(Language::Dup {
            stack: stack.to_string(),
        });
        self.add_language(Language::Drop {
            stack: stack.to_string(),
        });
    }

    /// Replays `program` from scratch, stopping at the first failure.
    pub fn run_program(&mut self, program: &[Operation]) -> Result<(), Failure> {
        let mut ctx = RunContext::new(&mut self.rng);
        for operation in program {
            operation.invoke(&mut ctx)?;
        }
        Ok(())
    }

    pub fn program_fails(&mut self, program: &[Operation]) -> bool {
        self.run_program(program).is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(v: i64) -> Operation {
        Operation::Push(crate::Push {
            target: "N".to_string(),
            value: Value::Int(v),
            name: None,
        })
    }

    #[test]
    fn explicit_seed_is_kept() {
        let machine = Machine::new(MachineConfig::default().with_seed(77));
        assert_eq!(machine.seed(), 77);
        assert!(machine.languages().is_empty());
    }

    #[test]
    fn registration_builds_one_language_per_call() {
        let mut machine = Machine::new(MachineConfig::default().with_seed(1));
        machine.basic_operations("N");
        machine.generate(|_| Value::Int(1), "N", Some("one"));
        machine.binary_operation(BinaryOperator::new("+", "N", Value::add));
        machine.unary_operation(UnaryOperator::new("-", "N", Value::neg));
        machine.check(Check::new("nonzero", &["N"], |args| !args[0].is_zero()));
        machine.operation(ReadAndWrite::new("ignore", &["N"], None, |args| Ok(args[0].clone())));
        assert_eq!(machine.languages().len(), 7);
        let Language::ChooseFrom(choice) = machine.language() else {
            panic!("expected a choice combinator");
        };
        assert_eq!(choice.len(), 7);
    }

    #[test]
    fn run_program_reports_the_first_failure() {
        let mut machine = Machine::new(MachineConfig::default().with_seed(1));
        let divide = Operation::BinaryOperator(Arc::new(BinaryOperator::new("/", "N", Value::div)));
        assert!(machine.run_program(&[push(4), push(2), divide.clone()]).is_ok());
        let err = machine
            .run_program(&[push(4), push(0), divide.clone(), push(1)])
            .unwrap_err();
        assert_eq!(err.kind, crate::FailureKind::DivisionByZero);
        assert!(machine.program_fails(&[divide]));
        assert!(!machine.program_fails(&[]));
    }
}
