use stackfuzz::{
    FailureKind, Library, Machine, MachineConfig, RunStatus, StackfuzzError, Value,
};

fn machine(library: Library, config: MachineConfig) -> Machine {
    let mut machine = Machine::new(config);
    library.install(&mut machine);
    machine
}

#[test]
fn golden_divide_by_zero_minimizes_to_three_steps() {
    for seed in [1u64, 2, 3, 42] {
        let mut m = machine(Library::Divide, MachineConfig::default().with_seed(seed));
        let report = m.run().expect("run");
        assert_eq!(report.status, RunStatus::Fail, "seed {seed}");

        let failure = report.failure.as_ref().expect("failure");
        assert_eq!(failure.kind, FailureKind::DivisionByZero);
        assert_eq!(report.stats.minimized_length, Some(3));
        assert!(report.stats.found_length >= report.stats.minimized_length);

        assert_eq!(report.statements.len(), 3);
        assert!(report.statements[0].starts_with("let t1 = "));
        assert_eq!(report.statements[1], "let t2 = 0;");
        assert_eq!(report.statements[2], "t1 / t2;");

        let last = report.steps.last().expect("steps");
        assert!(last.failure.is_some());
        assert!(last.definitions.is_empty());
        assert!(report.steps[..2].iter().all(|s| s.failure.is_none()));
    }
}

#[test]
fn golden_guarded_divide_never_reports_a_disallowed_division() {
    let config = MachineConfig {
        n_iters: 100,
        ..MachineConfig::default().with_seed(9)
    };
    let mut m = machine(Library::GuardedDivide, config);
    let report = m.run().expect("run");
    assert_eq!(report.status, RunStatus::Exhausted);
    assert_eq!(report.stats.trials, 100);
    assert_eq!(report.stats.failures, 0);
    assert!(report.stats.discarded > 0);
    assert!(report.statements.is_empty());
}

#[test]
fn golden_exhaustion_is_reported_from_the_search() {
    let config = MachineConfig {
        n_iters: 15,
        prog_length: 5,
        ..MachineConfig::default().with_seed(4)
    };
    let mut m = Machine::new(config);
    m.generate(|_| Value::Int(1), "N", None);
    m.basic_operations("N");
    let err = m.find_failing_program().unwrap_err();
    assert!(matches!(
        err,
        StackfuzzError::NoFailingProgram {
            prog_length: 5,
            n_iters: 15
        }
    ));
    assert_eq!(m.search_stats().trials, 15);
}

#[test]
fn golden_minimization_is_idempotent_and_keeps_failing() {
    for library in [Library::Ints, Library::Lists, Library::Divide] {
        let mut m = machine(library, MachineConfig::default().with_seed(17));
        let found = m.find_failing_program().expect("failing program");
        let once = m.minimize_failing_program(&found).expect("minimize");
        assert!(once.len() <= found.len(), "{library:?}");
        assert!(m.program_fails(&once), "{library:?}");
        let twice = m.minimize_failing_program(&once).expect("minimize again");
        assert_eq!(twice, once, "{library:?}");
    }
}

#[test]
fn golden_pruned_programs_only_invoke_applicable_steps() {
    let mut m = machine(Library::Ints, MachineConfig::default().with_seed(23));
    let found = m.find_failing_program().expect("failing program");
    let minimal = m.minimize_failing_program(&found).expect("minimize");
    assert_eq!(m.prune_program(&minimal), minimal);
    let steps = m.annotate_program(&minimal);
    assert_eq!(steps.len(), minimal.len());
    assert!(steps.last().is_some_and(|s| s.failed()));
}

#[test]
fn golden_same_seed_reproduces_the_run() {
    let run = |seed: u64| {
        let mut m = machine(Library::Lists, MachineConfig::default().with_seed(seed));
        m.run().expect("run")
    };
    let a = run(31);
    let b = run(31);
    assert_eq!(a.status, b.status);
    assert_eq!(a.statements, b.statements);
    assert_eq!(a.stats, b.stats);
    assert_eq!(a.steps, b.steps);
    assert_ne!(a.run_id, b.run_id);
}

#[test]
fn golden_ints_failure_renders_its_last_statement() {
    let mut m = machine(Library::Ints, MachineConfig::default().with_seed(5));
    let report = m.run().expect("run");
    assert_eq!(report.status, RunStatus::Fail);
    let failure = report.failure.as_ref().expect("failure");
    let last = report.steps.last().expect("steps");
    assert_eq!(last.failure.as_ref(), Some(failure));
    if failure.kind == FailureKind::CheckFailed {
        assert!(
            report
                .statements
                .last()
                .is_some_and(|s| s.starts_with("assert!(fits_i32("))
        );
    }
}
