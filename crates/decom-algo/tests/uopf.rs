//! End-to-end tests of the decommitment search.

use decom_algo::test_utils::{bus, decommit_case, generator, network_with, ScriptedBackend};
use decom_algo::{
    solve_uopf, DecommitConfig, EconomicDispatch, OpfError, UnitDecommitment,
};
use decom_core::{CostModel, DecomError};

fn serial() -> DecommitConfig {
    DecommitConfig {
        parallel: false,
        ..DecommitConfig::default()
    }
}

#[test]
fn accepts_improving_stage_then_stops() {
    let result = solve_uopf(&decommit_case(), EconomicDispatch::new()).unwrap();

    assert!(result.success);
    assert!(result.shed_for_feasibility.is_empty());
    assert_eq!(result.decommitted, vec![2]);
    assert!((result.total_cost() - 2100.0).abs() < 1e-6);
    assert_eq!(result.committed(), vec![0, 1]);

    assert_eq!(result.stages.len(), 2);
    let first = &result.stages[0];
    assert!((first.baseline_cost - 3000.0).abs() < 1e-6);
    assert_eq!(first.candidates, vec![1, 2]);
    assert_eq!(first.improving_trials, 2);
    assert_eq!(first.winner, Some(2));

    // G1 alone cannot carry 150 MW, so the only trial of stage 2 fails.
    let second = &result.stages[1];
    assert_eq!(second.candidates, vec![1]);
    assert_eq!(second.trials_succeeded, 0);
    assert_eq!(second.winner, None);
}

#[test]
fn best_cost_never_increases_across_stages() {
    let result = solve_uopf(&decommit_case(), EconomicDispatch::new()).unwrap();
    for stage in &result.stages {
        assert!(stage.best_cost <= stage.baseline_cost);
        if stage.winner.is_some() {
            assert!(stage.best_cost < stage.baseline_cost);
        }
    }
    for pair in result.stages.windows(2) {
        assert!(pair[1].baseline_cost <= pair[0].baseline_cost);
    }
}

#[test]
fn final_dispatch_keeps_unit_shut_down() {
    let result = solve_uopf(&decommit_case(), EconomicDispatch::new()).unwrap();
    let g3 = result.solution.network.generator(2).unwrap();
    assert!(!g3.status);
    assert_eq!(g3.active_power.value(), 0.0);
    let pg = result.solution.generator_p();
    assert!((pg[0] - 120.0).abs() < 1e-6);
    assert!((pg[1] - 30.0).abs() < 1e-6);
}

#[test]
fn sheds_most_expensive_units_at_pmin_first() {
    // Pmin total 120 MW against 60 MW of demand. Average cost at Pmin: 10, 22.5, 15.
    let network = network_with(
        &[bus(1, 60.0)],
        vec![
            generator(1, 50.0, 200.0, CostModel::linear(0.0, 10.0)),
            generator(2, 40.0, 100.0, CostModel::linear(500.0, 10.0)),
            generator(3, 30.0, 100.0, CostModel::linear(0.0, 15.0)),
        ],
    );
    let result = solve_uopf(&network, EconomicDispatch::new()).unwrap();

    assert_eq!(result.shed_for_feasibility, vec![1, 2]);
    assert!(result.success);
    let final_network = &result.solution.network;
    assert!(final_network.committed_pmin_mw() <= final_network.load_capacity_mw());
    assert!((result.solution.generator_p()[0] - 60.0).abs() < 1e-6);
}

#[test]
fn dispatchable_load_raises_load_capacity() {
    // Pmin total 120 MW against 100 MW of fixed demand plus 30 MW of curtailable load.
    let network = network_with(
        &[bus(1, 100.0)],
        vec![
            generator(1, 50.0, 200.0, CostModel::linear(0.0, 10.0)),
            generator(2, 40.0, 100.0, CostModel::linear(500.0, 10.0)),
            generator(3, 30.0, 100.0, CostModel::linear(0.0, 15.0)),
            generator(4, -30.0, 0.0, CostModel::linear(0.0, 80.0)).as_dispatchable_load(),
        ],
    );
    let result = UnitDecommitment::new(EconomicDispatch::new())
        .with_config(DecommitConfig {
            max_stages: Some(0),
            ..DecommitConfig::default()
        })
        .solve(&network)
        .unwrap();

    assert!(result.shed_for_feasibility.is_empty());
    assert!(result.success);
    assert!((result.solution.generator_p()[3] + 30.0).abs() < 1e-9);
}

#[test]
fn no_pinned_units_means_single_solve() {
    let network = decommit_case();
    let backend = ScriptedBackend::new().with_solution(&[], 500.0, &[]);
    let search = UnitDecommitment::new(backend);
    let result = search.solve(&network).unwrap();

    assert!(result.success);
    assert_eq!(result.total_cost(), 500.0);
    assert!(result.decommitted.is_empty());
    assert!(result.stages.is_empty());
    assert_eq!(search.backend().calls(), vec![Vec::<usize>::new()]);
}

#[test]
fn no_pinned_units_with_economic_dispatch() {
    let network = network_with(
        &[bus(1, 100.0)],
        vec![
            generator(1, 20.0, 100.0, CostModel::linear(0.0, 10.0)),
            generator(2, 20.0, 100.0, CostModel::linear(0.0, 10.0)),
        ],
    );
    let result = solve_uopf(&network, EconomicDispatch::new()).unwrap();
    assert!(result.stages.is_empty());
    assert!((result.total_cost() - 1000.0).abs() < 1e-6);
}

#[test]
fn failed_trial_is_never_selected() {
    let backend = ScriptedBackend::new()
        .with_solution(&[], 100.0, &[(1, 5.0), (2, 5.0)])
        .with_failure(&[1], 10.0)
        .with_solution(&[2], 90.0, &[]);
    let result = UnitDecommitment::new(backend)
        .with_config(serial())
        .solve(&decommit_case())
        .unwrap();

    assert_eq!(result.decommitted, vec![2]);
    assert_eq!(result.total_cost(), 90.0);
    assert_eq!(result.stages[0].trials_succeeded, 1);
    assert_eq!(result.stages[0].improving_trials, 1);
}

#[test]
fn backend_error_on_trial_is_skipped() {
    let backend = ScriptedBackend::new()
        .with_solution(&[], 100.0, &[(1, 5.0), (2, 5.0)])
        .with_failure(&[1], 10.0)
        .with_error(&[2], OpfError::NumericalIssue("singular".into()));
    let result = UnitDecommitment::new(backend).solve(&decommit_case()).unwrap();

    assert!(result.success);
    assert!(result.decommitted.is_empty());
    assert_eq!(result.total_cost(), 100.0);
    assert_eq!(result.stages.len(), 1);
    assert_eq!(result.stages[0].winner, None);
    assert_eq!(result.stages[0].trials_succeeded, 0);
}

#[test]
fn equal_cost_trials_resolve_to_lowest_index() {
    let backend = ScriptedBackend::new()
        .with_solution(&[], 100.0, &[(1, 1.0), (2, 1.0)])
        .with_solution(&[2], 80.0, &[])
        .with_solution(&[1], 80.0, &[]);
    let search = UnitDecommitment::new(backend);
    let result = search.solve(&decommit_case()).unwrap();

    assert_eq!(result.decommitted, vec![1]);
    let mut calls = search.backend().calls();
    calls.sort();
    assert_eq!(calls, vec![vec![], vec![1], vec![2]]);
}

#[test]
fn later_stages_start_from_the_winner() {
    let backend = ScriptedBackend::new()
        .with_solution(&[], 100.0, &[(1, 2.0), (2, 3.0)])
        .with_solution(&[1], 95.0, &[])
        .with_solution(&[2], 90.0, &[(1, 4.0)])
        .with_solution(&[1, 2], 85.0, &[]);
    let search = UnitDecommitment::new(backend).with_config(serial());
    let result = search.solve(&decommit_case()).unwrap();

    assert_eq!(result.decommitted, vec![2, 1]);
    assert_eq!(result.total_cost(), 85.0);
    assert_eq!(
        search.backend().calls(),
        vec![vec![], vec![1], vec![2], vec![1, 2]]
    );
}

#[test]
fn stage_limit_stops_search() {
    let config = DecommitConfig {
        max_stages: Some(0),
        ..DecommitConfig::default()
    };
    let result = UnitDecommitment::new(EconomicDispatch::new())
        .with_config(config)
        .solve(&decommit_case())
        .unwrap();
    assert!(result.decommitted.is_empty());
    assert!((result.total_cost() - 3000.0).abs() < 1e-6);
}

#[test]
fn serial_and_parallel_agree() {
    let network = decommit_case();
    let parallel = solve_uopf(&network, EconomicDispatch::new()).unwrap();
    let serial = UnitDecommitment::new(EconomicDispatch::new())
        .with_config(serial())
        .solve(&network)
        .unwrap();
    assert_eq!(parallel.decommitted, serial.decommitted);
    assert_eq!(parallel.total_cost(), serial.total_cost());
}

#[test]
fn non_converged_initial_solve_is_reported() {
    let network = network_with(
        &[bus(1, 500.0)],
        vec![generator(1, 0.0, 100.0, CostModel::linear(0.0, 10.0))],
    );
    let result = solve_uopf(&network, EconomicDispatch::new()).unwrap();
    assert!(!result.success);
    assert!(result.stages.is_empty());
}

#[test]
fn backend_error_on_initial_solve_propagates() {
    let err = solve_uopf(&decommit_case(), ScriptedBackend::new()).unwrap_err();
    assert!(matches!(err, DecomError::Validation(_)));
}

#[test]
fn input_network_is_not_modified() {
    let network = decommit_case();
    let _ = solve_uopf(&network, EconomicDispatch::new()).unwrap();
    assert_eq!(network.in_service_generators(), vec![0, 1, 2]);
}

#[test]
fn json_report_lists_generators() {
    let result = solve_uopf(&decommit_case(), EconomicDispatch::new()).unwrap();
    let json = result.to_json();
    assert_eq!(json["success"], true);
    assert_eq!(json["decommitted"][0], 2);
    assert_eq!(json["generators"].as_array().unwrap().len(), 3);
    assert_eq!(json["generators"][2]["status"], false);
}
