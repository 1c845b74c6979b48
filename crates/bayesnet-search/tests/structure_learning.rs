//! End-to-end structure learning on small synthetic datasets.

use bayesnet_data::{Attribute, Dataset, DatasetBuilder};
use bayesnet_search::{
    BayesNetConfig, HillClimber, K2, NetworkGenerator, NodeEntry, SearchError, SearchMethod,
    SimulatedAnnealing, StructureFile, in_markov_blanket,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Chain `a -> b -> class`: each link copies its parent with occasional flips.
fn chain() -> Dataset {
    let mut builder = DatasetBuilder::new(vec![
        Attribute::with_cardinality("a", 2).unwrap(),
        Attribute::with_cardinality("b", 2).unwrap(),
        Attribute::with_cardinality("class", 2).unwrap(),
    ])
    .unwrap();
    for i in 0..300 {
        let a = i % 2;
        let b = if (i / 2) % 10 == 0 { 1 - a } else { a };
        let c = if (i / 3) % 9 == 0 { 1 - b } else { b };
        builder.push_row(&[a, b, c]).unwrap();
    }
    builder.build()
}

fn linked(net: &bayesnet_search::Network, x: usize, y: usize) -> bool {
    net.is_arc(x, y) || net.is_arc(y, x)
}

fn sampled(seed: u64) -> Dataset {
    NetworkGenerator::new()
        .with_n_nodes(7)
        .with_n_arcs(8)
        .with_seed(seed)
        .generate()
        .unwrap()
        .sample(400, seed)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[test]
fn hill_climber_recovers_chain_skeleton() {
    let model = BayesNetConfig::new()
        .with_search(SearchMethod::HillClimber(HillClimber::new()))
        .with_init_as_naive_bayes(false)
        .fit(&chain())
        .unwrap();
    let net = model.network();
    assert!(net.is_acyclic());
    assert!(linked(net, 0, 1));
    assert!(linked(net, 1, 2));
}

#[test]
fn hill_climber_with_reversal_recovers_chain_skeleton() {
    let model = BayesNetConfig::new()
        .with_search(SearchMethod::HillClimber(
            HillClimber::new().with_arc_reversal(true),
        ))
        .with_init_as_naive_bayes(false)
        .fit(&chain())
        .unwrap();
    let net = model.network();
    assert!(net.is_acyclic());
    assert!(linked(net, 0, 1));
    assert!(linked(net, 1, 2));
}

#[test]
fn k2_picks_dependent_predecessors() {
    let model = BayesNetConfig::new()
        .with_search(SearchMethod::K2(K2::new().with_max_parents(2)))
        .with_init_as_naive_bayes(false)
        .fit(&chain())
        .unwrap();
    let net = model.network();
    // Ordering is class, a, b: a can only pick the class.
    assert_eq!(net.parents(0), &[2]);
    assert!(!net.parents(1).is_empty());
    assert!(net.parents(2).is_empty());
}

#[test]
fn default_config_is_naive_bayes() {
    let model = BayesNetConfig::new().fit(&chain()).unwrap();
    assert_eq!(model.network().arcs(), vec![(2, 0), (2, 1)]);
}

#[test]
fn every_strategy_yields_acyclic_networks() {
    let methods = [
        SearchMethod::K2(K2::new().with_max_parents(3).with_random_order(true)),
        SearchMethod::HillClimber(HillClimber::new().with_max_parents(3).with_arc_reversal(true)),
        SearchMethod::SimulatedAnnealing(SimulatedAnnealing::new().with_runs(800)),
    ];
    for seed in [1, 2] {
        let data = sampled(seed);
        for method in &methods {
            for naive in [true, false] {
                let model = BayesNetConfig::new()
                    .with_search(method.clone())
                    .with_init_as_naive_bayes(naive)
                    .fit(&data)
                    .unwrap();
                assert!(model.network().is_acyclic(), "{method:?} naive={naive}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Markov-blanket correction
// ---------------------------------------------------------------------------

#[test]
fn correction_pulls_every_node_into_class_blanket() {
    let data = sampled(5);
    let class = data.class_index();
    let model = BayesNetConfig::new()
        .with_search(SearchMethod::HillClimber(HillClimber::new()))
        .with_init_as_naive_bayes(false)
        .with_markov_blanket_correction(true)
        .fit(&data)
        .unwrap();
    let net = model.network();
    assert!(net.is_acyclic());
    for node in 0..net.n_nodes() {
        assert!(in_markov_blanket(net, class, node), "node {node} outside blanket");
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

#[test]
fn predictions_follow_the_chain() {
    let model = BayesNetConfig::new()
        .with_search(SearchMethod::HillClimber(HillClimber::new()))
        .fit(&chain())
        .unwrap();
    let proba = model.predict_proba(&[1, 1, 0]).unwrap();
    assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert_eq!(model.predict(&[1, 1, 0]).unwrap(), 1);
    assert_eq!(model.predict(&[0, 0, 1]).unwrap(), 0);
}

#[test]
fn prediction_input_validated() {
    let model = BayesNetConfig::new().fit(&chain()).unwrap();
    assert!(matches!(
        model.predict_proba(&[0, 1]),
        Err(SearchError::RowLengthMismatch { expected: 3, got: 2 })
    ));
    assert!(matches!(
        model.predict_proba(&[0, 5, 0]),
        Err(SearchError::ValueOutOfRange { attribute: 1, value: 5, .. })
    ));
}

// ---------------------------------------------------------------------------
// Structure files
// ---------------------------------------------------------------------------

#[test]
fn saved_structure_reloads_as_fixed_search() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("structure.bin");
    let data = sampled(3);

    let learned = BayesNetConfig::new()
        .with_search(SearchMethod::HillClimber(HillClimber::new()))
        .fit(&data)
        .unwrap();
    learned.save_structure(&path).unwrap();

    let reloaded = BayesNetConfig::new()
        .with_search(SearchMethod::FromFile(path))
        .fit(&data)
        .unwrap();
    assert_eq!(reloaded.network(), learned.network());
    assert_eq!(reloaded.tables(), learned.tables());
}

#[test]
fn unknown_structure_names_abort_learning() {
    let file = StructureFile::new(vec![
        NodeEntry::new("a", vec!["nope".to_owned()]),
        NodeEntry::new("b", vec![]),
        NodeEntry::new("class", vec![]),
    ]);
    let err = BayesNetConfig::new()
        .with_search(SearchMethod::Fixed(file))
        .fit(&chain())
        .unwrap_err();
    assert!(matches!(err, SearchError::UnknownAttribute { name } if name == "nope"));
}

#[test]
fn missing_structure_file_aborts_learning() {
    let dir = TempDir::new().unwrap();
    let err = BayesNetConfig::new()
        .with_search(SearchMethod::FromFile(dir.path().join("absent.bin")))
        .fit(&chain())
        .unwrap_err();
    assert!(matches!(err, SearchError::ReadStructure { .. }));
}
