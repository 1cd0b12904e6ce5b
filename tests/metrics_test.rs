mod helpers;

use calabash_solver::clause;
use calabash_solver::statistics::MetricsSink;
use calabash_solver::BoolTheory;
use calabash_solver::SmtSolver;
use calabash_solver::SmtSolverOptions;
use calabash_solver::SolverResult;
use calabash_solver::VariableKind;
use helpers::lit;

fn solver_with_metrics(path: &std::path::Path) -> SmtSolver {
    let mut solver = SmtSolver::new(SmtSolverOptions {
        metrics: MetricsSink::to_file(path).expect("the temp directory is writable"),
    });
    solver.add_theory(BoolTheory::default());
    solver
}

#[test]
fn the_record_stream_of_a_root_conflict_is_fixed() {
    let path = std::env::temp_dir().join("calabash_metrics_root_conflict.csv");
    let _ = std::fs::remove_file(&path);

    let mut solver = solver_with_metrics(&path);
    solver.resize_variables(VariableKind::Boolean, 1);
    let _ = solver.assert_clause(clause![lit(0)]);
    let _ = solver.assert_clause(clause![!lit(0)]);

    assert_eq!(solver.check(), SolverResult::Unsat);
    solver.metrics_mut().close();

    let contents = std::fs::read_to_string(&path).expect("the log file exists");
    let records: Vec<_> = contents.lines().collect();
    assert_eq!(
        records,
        vec![
            "core,before_propagation,0,0,0,0",
            "core,after_propagation,0,1,1",
            "core,search_end,0,1,1,0,0,0,0",
        ]
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn a_full_search_brackets_its_events_between_propagation_and_search_end() {
    let path = std::env::temp_dir().join("calabash_metrics_full_search.csv");
    let _ = std::fs::remove_file(&path);

    let mut solver = solver_with_metrics(&path);
    solver.resize_variables(VariableKind::Boolean, 3);
    let _ = solver.assert_clause(clause![!lit(0), lit(1)]);
    let _ = solver.assert_clause(clause![!lit(1), lit(2)]);
    let _ = solver.assert_clause(clause![!lit(0), !lit(2)]);

    assert_eq!(solver.check(), SolverResult::Sat);
    solver.metrics_mut().close();

    let contents = std::fs::read_to_string(&path).expect("the log file exists");
    let records: Vec<Vec<&str>> = contents
        .lines()
        .map(|line| line.split(',').collect())
        .collect();

    assert!(records
        .iter()
        .all(|record| record[0] == "core" && record.len() >= 3));
    assert_eq!(records[0][1], "before_propagation");
    assert_eq!(records.last().expect("the stream is non-empty")[1], "search_end");

    // the conflict produced an analysis bracket and a learned clause record
    let tags: Vec<_> = records.iter().map(|record| record[1]).collect();
    let analysis_start = tags
        .iter()
        .position(|&tag| tag == "conflict_analysis_start")
        .expect("one conflict was analyzed");
    let analysis_end = tags
        .iter()
        .position(|&tag| tag == "conflict_analysis_end")
        .expect("the analysis bracket is closed");
    assert!(analysis_start < analysis_end);
    assert!(tags.contains(&"learned_clause"));
    assert!(tags.contains(&"decision"));
    assert!(tags.contains(&"before_backtrack"));
    assert!(tags.contains(&"after_backtrack"));

    let _ = std::fs::remove_file(&path);
}
