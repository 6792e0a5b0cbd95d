use approx::assert_relative_eq;

use parametric_mincut::{
    dimacs, solve, verify, Error, Instance, LinearFlowFunction, Network, ParametricIbfs,
    ParametricMinCut, RawArc, Sweep, SweepConfig, DEFAULT_INFINITY,
};

const INF: f64 = f64::INFINITY;

fn linear(offset: f64, slope: f64) -> LinearFlowFunction {
    LinearFlowFunction::new(offset, slope).unwrap()
}

/// s=0, t=3; 0->1 has capacity λ, every other arc is constant.
fn scenario() -> Network {
    let mut builder = Network::builder(4, 0, 3).unwrap();
    builder.add_arc(0, 1, linear(0.0, 1.0)).unwrap();
    builder.add_arc(1, 3, 5.0).unwrap();
    builder.add_arc(0, 2, 3.0).unwrap();
    builder.add_arc(2, 3, 3.0).unwrap();
    builder.build().unwrap()
}

#[test]
fn four_vertex_scenario() {
    let network = scenario();
    let breakpoints = solve(&network, SweepConfig::new(0.0, 10.0).unwrap()).unwrap();

    assert_eq!(breakpoints.as_slice(), &[0.0, 5.0, 0.0, INF]);
    assert_eq!(breakpoints.source_side(4.0), vec![0, 2]);
    assert_eq!(breakpoints.source_side(5.0), vec![0, 1, 2]);
    assert_relative_eq!(breakpoints.min_cut_value(0.0).unwrap(), 3.0);
    assert_relative_eq!(breakpoints.min_cut_value(2.5).unwrap(), 5.5);
    assert_relative_eq!(breakpoints.min_cut_value(7.0).unwrap(), 8.0);
    assert_eq!(breakpoints.levels(), vec![0.0, 5.0]);
    assert_eq!(breakpoints.stats().levels, 2);

    verify::check(&network, &breakpoints, &[1.0, 2.5, 4.9, 5.1, 9.0]).unwrap();
}

#[test]
fn constant_capacities_give_a_single_cut() {
    let mut builder = Network::builder(5, 0, 4).unwrap();
    builder.add_arc(0, 1, 4.0).unwrap();
    builder.add_arc(0, 2, 1.0).unwrap();
    builder.add_arc(1, 3, 2.0).unwrap();
    builder.add_arc(2, 3, 6.0).unwrap();
    builder.add_arc(3, 4, 10.0).unwrap();
    builder.add_arc(1, 2, 1.0).unwrap();
    let network = builder.build().unwrap();

    let breakpoints = solve(&network, SweepConfig::default()).unwrap();
    assert_eq!(breakpoints.as_slice(), &[0.0, 0.0, INF, INF, INF]);
    assert_eq!(breakpoints.cut_segments().len(), 1);
    assert_relative_eq!(breakpoints.min_cut_value(1e6).unwrap(), 4.0);
    verify::check(&network, &breakpoints, &[0.0, 3.0]).unwrap();
}

#[test]
fn repeated_runs_agree() {
    let network = scenario();
    let config = SweepConfig::new(0.0, 10.0).unwrap();
    let mut algo = ParametricIbfs::new(config);
    let first = algo.parametric_min_cut(&network).unwrap();
    let second = algo.parametric_min_cut(&network).unwrap();
    assert_eq!(first, second);
}

#[test]
fn domain_upper_bound_stops_the_sweep() {
    let network = scenario();
    let breakpoints = solve(&network, SweepConfig::new(0.0, 4.0).unwrap()).unwrap();
    assert_eq!(breakpoints.as_slice(), &[0.0, INF, 0.0, INF]);

    let breakpoints = solve(&network, SweepConfig::new(6.0, 10.0).unwrap()).unwrap();
    assert_eq!(breakpoints.as_slice(), &[6.0, 6.0, 6.0, INF]);
}

#[test]
fn levels_keep_flow_conserved_and_cuts_nested() {
    let mut builder = Network::builder(6, 0, 5).unwrap();
    builder.add_arc(0, 1, linear(0.0, 1.0)).unwrap();
    builder.add_arc(0, 2, linear(1.0, 2.0)).unwrap();
    builder.add_arc(0, 3, linear(0.0, 3.0)).unwrap();
    builder.add_arc(1, 4, 4.0).unwrap();
    builder.add_arc(2, 4, 3.0).unwrap();
    builder.add_arc(3, 2, 2.0).unwrap();
    builder.add_arc(3, 5, 5.0).unwrap();
    builder.add_arc(4, 5, 6.0).unwrap();
    builder.add_arc(1, 2, 1.0).unwrap();
    let network = builder.build().unwrap();

    let mut sweep = Sweep::new(&network, SweepConfig::new(0.0, 20.0).unwrap()).unwrap();
    let mut previous = vec![false; network.vertex_count()];
    let mut previous_value = 0.0;
    while let Some(lambda) = sweep.next_level().unwrap() {
        sweep.check_conservation().unwrap();
        let side = sweep.source_side();
        for v in 0..network.vertex_count() {
            assert!(!previous[v] || side[v], "vertex {v} left the source side at {lambda}");
        }
        let value = sweep.flow_value().value;
        assert!(value >= previous_value);
        previous = side;
        previous_value = value;
    }
    assert!(!previous[network.sink()]);

    let breakpoints = solve(&network, SweepConfig::new(0.0, 20.0).unwrap()).unwrap();
    let lambdas = verify::sample_lambdas(&breakpoints, 20.0, 32);
    verify::check(&network, &breakpoints, &lambdas).unwrap();
}

#[test]
fn parametric_arc_collapses_at_the_threshold() {
    let mut builder = Network::builder(3, 0, 2)
        .unwrap()
        .with_infinity(6.0)
        .unwrap();
    builder.add_arc(0, 1, linear(0.0, 2.0)).unwrap();
    builder.add_arc(1, 2, 10.0).unwrap();
    let network = builder.build().unwrap();

    let breakpoints = solve(&network, SweepConfig::default()).unwrap();
    // without the collapse vertex 1 would join at 5
    assert_eq!(breakpoints.as_slice(), &[0.0, 3.0, INF]);
    assert_relative_eq!(breakpoints.min_cut_value(1.5).unwrap(), 3.0);
    assert_relative_eq!(breakpoints.min_cut_value(4.0).unwrap(), 10.0);
    verify::check(&network, &breakpoints, &[1.5, 4.0]).unwrap();
}

#[test]
fn invalid_inputs_are_reported_before_the_sweep() {
    let network = scenario();
    assert!(matches!(
        solve(&network, SweepConfig { lambda_min: 3.0, lambda_max: 1.0 }),
        Err(Error::InvalidDomain { .. })
    ));

    let instance = Instance::new(
        3,
        0,
        2,
        vec![
            RawArc {
                tail: 0,
                head: 1,
                capacity: DEFAULT_INFINITY,
                slope: 0.0,
            },
            RawArc {
                tail: 1,
                head: 2,
                capacity: DEFAULT_INFINITY,
                slope: 0.0,
            },
        ],
    );
    let network = Network::try_from(&instance).unwrap();
    assert_eq!(
        solve(&network, SweepConfig::default()).unwrap_err(),
        Error::UnboundedCut
    );
}

#[test]
fn sweep_ends_where_an_unbounded_path_forms() {
    let mut builder = Network::builder(3, 0, 2).unwrap();
    builder.add_arc(0, 1, linear(0.0, 1.0)).unwrap();
    builder.add_arc(1, 2, DEFAULT_INFINITY).unwrap();
    let network = builder.build().unwrap();

    let breakpoints = solve(&network, SweepConfig::default()).unwrap();
    assert_eq!(breakpoints.as_slice(), &[0.0, INF, INF]);
    assert_eq!(breakpoints.levels(), vec![0.0]);
    assert_relative_eq!(breakpoints.min_cut_value(7.0).unwrap(), 7.0);
    verify::check(&network, &breakpoints, &[0.0, 7.0, 1e6]).unwrap();
}

#[test]
fn constant_star_is_solved_in_one_level() {
    let spokes = 2000;
    let sink = spokes + 1;
    let mut builder = Network::builder(spokes + 2, 0, sink).unwrap();
    for i in 1..=spokes {
        builder.add_arc(0, i, 2.0).unwrap();
        builder.add_arc(i, sink, 1.0).unwrap();
    }
    let network = builder.build().unwrap();

    let breakpoints = solve(&network, SweepConfig::default()).unwrap();
    assert!((1..=spokes).all(|i| breakpoints.get(i) == Some(0.0)));
    assert_eq!(breakpoints.get(sink), Some(INF));
    assert_relative_eq!(breakpoints.min_cut_value(0.0).unwrap(), spokes as f64);

    let stats = breakpoints.stats();
    assert_eq!(stats.levels, 1);
    assert_eq!(stats.augmentations, spokes);
    assert!(stats.scans <= 4 * spokes, "{}", stats);
}

#[test]
fn sloped_star_joins_one_spoke_per_level() {
    let spokes = 1000;
    let sink = spokes + 1;
    let mut builder = Network::builder(spokes + 2, 0, sink).unwrap();
    for i in 1..=spokes {
        builder.add_arc(0, i, linear(0.0, 1.0)).unwrap();
        builder.add_arc(i, sink, i as f64).unwrap();
    }
    let network = builder.build().unwrap();

    let domain = SweepConfig::new(0.0, 2.0 * spokes as f64).unwrap();
    let breakpoints = solve(&network, domain).unwrap();
    assert!((1..=spokes).all(|i| breakpoints.get(i) == Some(i as f64)));
    assert_eq!(breakpoints.levels().len(), spokes + 1);
    assert_relative_eq!(breakpoints.min_cut_value(10.5).unwrap(), 55.0 + 10.5 * 990.0);

    let stats = breakpoints.stats();
    assert_eq!(stats.events, spokes);
    assert!(stats.scans <= 8 * spokes, "{}", stats);
    assert!(stats.reroutes <= 2 * spokes, "{}", stats);
    assert!(stats.orphans + stats.releases <= 6 * spokes, "{}", stats);

    verify::check(&network, &breakpoints, &[0.5, 499.0, 999.5, 2000.0]).unwrap();
}

#[test]
fn rate_through_an_exhausted_arc_is_rerouted() {
    // the rate out of 1 fills one of its two paths to 2 and then moves onto the other
    let mut builder = Network::builder(5, 0, 4).unwrap();
    builder.add_arc(0, 1, linear(0.0, 1.0)).unwrap();
    builder.add_arc(1, 2, 4.0).unwrap();
    builder.add_arc(1, 3, 3.0).unwrap();
    builder.add_arc(3, 2, 3.0).unwrap();
    builder.add_arc(2, 4, 20.0).unwrap();
    let network = builder.build().unwrap();

    let mut sweep = Sweep::new(&network, SweepConfig::new(0.0, 30.0).unwrap()).unwrap();
    while sweep.next_level().unwrap().is_some() {
        sweep.check_conservation().unwrap();
    }
    let breakpoints = sweep.finish().unwrap();
    // 3 is cut off from the sink once 3->2 is full as well
    assert_eq!(breakpoints.as_slice(), &[0.0, 7.0, INF, 7.0, INF]);
    assert_relative_eq!(breakpoints.min_cut_value(5.0).unwrap(), 5.0);
    assert_relative_eq!(breakpoints.min_cut_value(9.0).unwrap(), 7.0);
    verify::check(&network, &breakpoints, &[4.0, 5.0, 6.9, 7.0, 9.0]).unwrap();
}

#[test]
fn dimacs_instance_end_to_end() {
    let text = "c parametric diamond
p max 4 4
n 1 s
n 4 t
a 1 2 0 1
a 2 4 5
a 1 3 3
a 3 4 3
";
    let instance = dimacs::parse(text, DEFAULT_INFINITY).unwrap();
    let network = Network::try_from(instance).unwrap();
    let breakpoints = solve(&network, SweepConfig::new(0.0, 10.0).unwrap()).unwrap();
    assert_eq!(breakpoints.as_slice(), &[0.0, 5.0, 0.0, INF]);

    let rows: Vec<_> = breakpoints
        .rows()
        .map(|row| (row.vertex, row.breakpoint))
        .collect();
    assert_eq!(rows, vec![(0, 0.0), (1, 5.0), (2, 0.0), (3, INF)]);
}
