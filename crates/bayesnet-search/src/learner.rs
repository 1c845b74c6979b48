//! Learning configuration and the phased structure search driver.

use bayesnet_adtree::{AdTreeConfig, CountSource, ScanCounter};
use bayesnet_data::Dataset;
use tracing::{debug, info, instrument};

use crate::{
    SearchError,
    estimator::estimate_tables,
    markov::{MarkovCorrection, markov_blanket_correction},
    model::BayesNet,
    network::Network,
    score::{LocalScore, ScoreMetric, ScoreType},
    strategy::{SearchContext, SearchMethod, SearchStrategy},
};

/// Where a [`StructureSearch`] is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Strategy resolved, network not yet seeded.
    Unbuilt,
    /// Network seeded (empty or naive Bayes).
    Initialized,
    /// Strategy running, or finished and awaiting finalization.
    Searching,
    /// Markov-blanket correction running.
    MarkovCorrecting,
    /// Structure final.
    Built,
    /// The strategy returned an error; the network is discarded.
    Failed,
}

impl std::fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SearchPhase::Unbuilt => "unbuilt",
            SearchPhase::Initialized => "initialized",
            SearchPhase::Searching => "searching",
            SearchPhase::MarkovCorrecting => "markov-correcting",
            SearchPhase::Built => "built",
            SearchPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Configuration for learning a [`BayesNet`].
///
/// Construct via [`BayesNetConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter                   | Default          |
/// |-----------------------------|------------------|
/// | `search`                    | `K2` (1 parent)  |
/// | `score_type`                | `Bayes`          |
/// | `alpha`                     | 0.5              |
/// | `estimator_alpha`           | 0.5              |
/// | `init_as_naive_bayes`       | `true`           |
/// | `markov_blanket_correction` | `false`          |
/// | `use_ad_tree`               | `true`           |
/// | `ad_tree`                   | leaf threshold 16 |
#[derive(Debug, Clone)]
pub struct BayesNetConfig {
    pub(crate) search: SearchMethod,
    pub(crate) score_type: ScoreType,
    pub(crate) alpha: f64,
    pub(crate) estimator_alpha: f64,
    pub(crate) init_as_naive_bayes: bool,
    pub(crate) markov_blanket_correction: bool,
    pub(crate) use_ad_tree: bool,
    pub(crate) ad_tree: AdTreeConfig,
}

impl BayesNetConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            search: SearchMethod::default(),
            score_type: ScoreType::Bayes,
            alpha: 0.5,
            estimator_alpha: 0.5,
            init_as_naive_bayes: true,
            markov_blanket_correction: false,
            use_ad_tree: true,
            ad_tree: AdTreeConfig::new(),
        }
    }

    // --- Setters ---

    /// Set the structure search strategy.
    #[must_use]
    pub fn with_search(mut self, search: SearchMethod) -> Self {
        self.search = search;
        self
    }

    /// Set the score guiding the search.
    #[must_use]
    pub fn with_score_type(mut self, score_type: ScoreType) -> Self {
        self.score_type = score_type;
        self
    }

    /// Set the Dirichlet prior count of the Bayes score.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the prior count used when estimating probability tables.
    #[must_use]
    pub fn with_estimator_alpha(mut self, estimator_alpha: f64) -> Self {
        self.estimator_alpha = estimator_alpha;
        self
    }

    /// Seed the search with the class as every other node's parent.
    #[must_use]
    pub fn with_init_as_naive_bayes(mut self, init_as_naive_bayes: bool) -> Self {
        self.init_as_naive_bayes = init_as_naive_bayes;
        self
    }

    /// Pull every node into the class's Markov blanket after searching.
    #[must_use]
    pub fn with_markov_blanket_correction(mut self, markov_blanket_correction: bool) -> Self {
        self.markov_blanket_correction = markov_blanket_correction;
        self
    }

    /// Answer count queries from an AD-tree instead of scanning rows.
    #[must_use]
    pub fn with_ad_tree(mut self, use_ad_tree: bool) -> Self {
        self.use_ad_tree = use_ad_tree;
        self
    }

    /// Set the AD-tree construction parameters.
    #[must_use]
    pub fn with_ad_tree_config(mut self, ad_tree: AdTreeConfig) -> Self {
        self.ad_tree = ad_tree;
        self
    }

    // --- Getters ---

    /// Return the search strategy selection.
    #[must_use]
    pub fn search(&self) -> &SearchMethod {
        &self.search
    }

    /// Return the score type.
    #[must_use]
    pub fn score_type(&self) -> ScoreType {
        self.score_type
    }

    /// Return the score prior count.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Return the estimator prior count.
    #[must_use]
    pub fn estimator_alpha(&self) -> f64 {
        self.estimator_alpha
    }

    /// Return whether the search starts from naive Bayes.
    #[must_use]
    pub fn init_as_naive_bayes(&self) -> bool {
        self.init_as_naive_bayes
    }

    /// Return whether Markov-blanket correction runs.
    #[must_use]
    pub fn markov_blanket_correction(&self) -> bool {
        self.markov_blanket_correction
    }

    /// Return whether an AD-tree answers count queries.
    #[must_use]
    pub fn use_ad_tree(&self) -> bool {
        self.use_ad_tree
    }

    /// Return the AD-tree construction parameters.
    #[must_use]
    pub fn ad_tree_config(&self) -> &AdTreeConfig {
        &self.ad_tree
    }

    /// Learn a structure and its probability tables from `data`.
    ///
    /// The search strategy is resolved before any search state exists, so
    /// configuration errors never leave partial work behind.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::EmptyDataset`] | `data` has no rows |
    /// | [`SearchError::InvalidAlpha`] | a prior count is negative or non-finite |
    /// | strategy configuration errors | see [`SearchMethod::resolve`] |
    /// | [`SearchError::Counts`] | a count query failed |
    #[instrument(skip_all, fields(n_rows = data.n_rows(), n_attributes = data.n_attributes()))]
    pub fn fit(&self, data: &Dataset) -> Result<BayesNet, SearchError> {
        if data.is_empty() {
            return Err(SearchError::EmptyDataset);
        }
        for alpha in [self.alpha, self.estimator_alpha] {
            if !alpha.is_finite() || alpha < 0.0 {
                return Err(SearchError::InvalidAlpha { alpha });
            }
        }

        let mut search = StructureSearch::new(data, self)?;

        let tree;
        let scan;
        let counts: &dyn CountSource = if self.use_ad_tree {
            tree = self.ad_tree.build(data);
            debug!(n_nodes = tree.n_nodes(), n_leaves = tree.n_leaves(), "ad-tree built");
            &tree
        } else {
            scan = ScanCounter::new(data);
            &scan
        };

        let metric = ScoreMetric::new(counts, data.n_rows(), self.score_type, self.alpha);
        let correction = search.run(&metric)?;
        let network = search.into_network()?;
        if let Some(correction) = &correction {
            info!(
                added = correction.added.len(),
                skipped = ?correction.skipped,
                "markov blanket corrected"
            );
        }
        let score = metric.network_score(&network)?;
        let tables = estimate_tables(&network, counts, self.estimator_alpha)?;

        info!(
            n_arcs = network.n_arcs(),
            score,
            score_type = %self.score_type,
            "bayes net learned"
        );
        Ok(BayesNet::new(
            data.attributes().to_vec(),
            data.class_index(),
            network,
            tables,
            correction,
        ))
    }
}

impl Default for BayesNetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Phased structure search: seed, search, optionally correct, finish.
///
/// Each step checks the current [`SearchPhase`] and fails with
/// [`SearchError::InvalidPhase`] when called out of order. The network is
/// only handed out once the search is [`SearchPhase::Built`].
#[derive(Debug)]
pub struct StructureSearch<'a> {
    data: &'a Dataset,
    strategy: Box<dyn SearchStrategy>,
    init_as_naive_bayes: bool,
    markov_blanket_correction: bool,
    network: Network,
    phase: SearchPhase,
}

impl<'a> StructureSearch<'a> {
    /// Resolve the configured strategy against `data`.
    ///
    /// # Errors
    ///
    /// Strategy configuration errors (see [`SearchMethod::resolve`]).
    pub fn new(data: &'a Dataset, config: &BayesNetConfig) -> Result<Self, SearchError> {
        let strategy = config.search.resolve(data)?;
        debug!(strategy = strategy.name(), "strategy resolved");
        Ok(Self {
            data,
            strategy,
            init_as_naive_bayes: config.init_as_naive_bayes,
            markov_blanket_correction: config.markov_blanket_correction,
            network: Network::for_dataset(data),
            phase: SearchPhase::Unbuilt,
        })
    }

    /// Return the current phase.
    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Return the network in its current state.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Seed the network: naive Bayes (class parent of every other node) or empty.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidPhase`] unless the search is unbuilt.
    pub fn initialize(&mut self) -> Result<(), SearchError> {
        self.expect_phase(SearchPhase::Unbuilt)?;
        self.network.clear();
        if self.init_as_naive_bayes {
            let class = self.data.class_index();
            for node in (0..self.network.n_nodes()).filter(|&n| n != class) {
                self.network.add_parent(node, class);
            }
        }
        self.enter(SearchPhase::Initialized);
        Ok(())
    }

    /// Run the strategy guided by `score`.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidPhase`] unless initialized. Strategy errors are
    /// returned unmodified and move the search to [`SearchPhase::Failed`],
    /// from which no later step succeeds.
    pub fn search(&mut self, score: &dyn LocalScore) -> Result<(), SearchError> {
        self.expect_phase(SearchPhase::Initialized)?;
        self.enter(SearchPhase::Searching);
        let ctx = SearchContext {
            data: self.data,
            score,
            init_as_naive_bayes: self.init_as_naive_bayes,
        };
        if let Err(err) = self.strategy.search(&mut self.network, &ctx) {
            self.enter(SearchPhase::Failed);
            self.network.clear();
            return Err(err);
        }
        debug_assert!(self.network.is_acyclic());
        Ok(())
    }

    /// Apply Markov-blanket correction when configured, then mark the
    /// structure final. Returns the correction when one ran.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidPhase`] unless the search has run.
    pub fn finish(&mut self) -> Result<Option<MarkovCorrection>, SearchError> {
        self.expect_phase(SearchPhase::Searching)?;
        let correction = if self.markov_blanket_correction {
            self.enter(SearchPhase::MarkovCorrecting);
            Some(markov_blanket_correction(
                &mut self.network,
                self.data.class_index(),
            ))
        } else {
            None
        };
        self.enter(SearchPhase::Built);
        Ok(correction)
    }

    /// Run every remaining step from an unbuilt search.
    ///
    /// # Errors
    ///
    /// Any error of [`StructureSearch::initialize`],
    /// [`StructureSearch::search`], or [`StructureSearch::finish`].
    #[instrument(skip_all, fields(strategy = self.strategy.name()))]
    pub fn run(&mut self, score: &dyn LocalScore) -> Result<Option<MarkovCorrection>, SearchError> {
        self.initialize()?;
        self.search(score)?;
        self.finish()
    }

    /// Return the finished network.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidPhase`] unless the search is built.
    pub fn into_network(self) -> Result<Network, SearchError> {
        self.expect_phase(SearchPhase::Built)?;
        Ok(self.network)
    }

    fn expect_phase(&self, expected: SearchPhase) -> Result<(), SearchError> {
        if self.phase != expected {
            return Err(SearchError::InvalidPhase {
                expected,
                found: self.phase,
            });
        }
        Ok(())
    }

    fn enter(&mut self, phase: SearchPhase) {
        debug!(from = %self.phase, to = %phase, "search phase");
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use bayesnet_data::{Attribute, DatasetBuilder};

    use super::*;
    use crate::strategy::HillClimber;

    /// `b` copies `a`; the class is independent noise.
    fn data() -> Dataset {
        let mut builder = DatasetBuilder::new(vec![
            Attribute::with_cardinality("a", 2).unwrap(),
            Attribute::with_cardinality("b", 2).unwrap(),
            Attribute::with_cardinality("class", 2).unwrap(),
        ])
        .unwrap();
        for i in 0..40 {
            let a = i % 2;
            builder.push_row(&[a, a, (i / 2) % 2]).unwrap();
        }
        builder.build()
    }

    #[test]
    fn naive_bayes_initialization() {
        let data = data();
        let config = BayesNetConfig::new();
        let mut search = StructureSearch::new(&data, &config).unwrap();
        assert_eq!(search.phase(), SearchPhase::Unbuilt);
        search.initialize().unwrap();
        assert_eq!(search.phase(), SearchPhase::Initialized);
        assert_eq!(search.network().arcs(), vec![(2, 0), (2, 1)]);
    }

    #[test]
    fn empty_initialization() {
        let data = data();
        let config = BayesNetConfig::new().with_init_as_naive_bayes(false);
        let mut search = StructureSearch::new(&data, &config).unwrap();
        search.initialize().unwrap();
        assert_eq!(search.network().n_arcs(), 0);
    }

    #[test]
    fn out_of_order_steps_rejected() {
        let data = data();
        let config = BayesNetConfig::new();
        let counts = ScanCounter::new(&data);
        let metric = ScoreMetric::new(&counts, data.n_rows(), ScoreType::Bayes, 0.5);

        let mut search = StructureSearch::new(&data, &config).unwrap();
        let err = search.search(&metric).unwrap_err();
        assert!(matches!(
            err,
            SearchError::InvalidPhase {
                expected: SearchPhase::Initialized,
                found: SearchPhase::Unbuilt,
            }
        ));
        assert!(search.finish().is_err());
        search.initialize().unwrap();
        assert!(search.initialize().is_err());
        assert!(matches!(
            StructureSearch::new(&data, &config).unwrap().into_network(),
            Err(SearchError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn run_reaches_built() {
        let data = data();
        let config = BayesNetConfig::new()
            .with_search(SearchMethod::HillClimber(HillClimber::new()))
            .with_markov_blanket_correction(true);
        let counts = ScanCounter::new(&data);
        let metric = ScoreMetric::new(&counts, data.n_rows(), ScoreType::Bayes, 0.5);
        let mut search = StructureSearch::new(&data, &config).unwrap();
        assert!(search.run(&metric).unwrap().is_some());
        assert_eq!(search.phase(), SearchPhase::Built);
        let net = search.into_network().unwrap();
        assert!(net.is_acyclic());
    }

    #[test]
    fn fit_rejects_empty_data_and_bad_alpha() {
        let empty = DatasetBuilder::new(vec![Attribute::with_cardinality("c", 2).unwrap()])
            .unwrap()
            .build();
        assert!(matches!(
            BayesNetConfig::new().fit(&empty),
            Err(SearchError::EmptyDataset)
        ));
        assert!(matches!(
            BayesNetConfig::new().with_alpha(-1.0).fit(&data()),
            Err(SearchError::InvalidAlpha { .. })
        ));
        assert!(matches!(
            BayesNetConfig::new().with_estimator_alpha(f64::NAN).fit(&data()),
            Err(SearchError::InvalidAlpha { .. })
        ));
    }

    #[test]
    fn invalid_strategy_rejected_before_search() {
        let config = BayesNetConfig::new()
            .with_search(SearchMethod::HillClimber(HillClimber::new().with_max_parents(0)));
        assert!(matches!(
            config.fit(&data()),
            Err(SearchError::InvalidMaxParents { .. })
        ));
    }

    #[test]
    fn ad_tree_and_scan_agree() {
        let data = data();
        let search = SearchMethod::HillClimber(HillClimber::new());
        let with_tree = BayesNetConfig::new().with_search(search.clone()).fit(&data).unwrap();
        let with_scan = BayesNetConfig::new()
            .with_search(search)
            .with_ad_tree(false)
            .fit(&data)
            .unwrap();
        assert_eq!(with_tree.network(), with_scan.network());
    }

    /// Rewards every parent, but cannot score a node with two or more.
    struct FailsOnSecondParent;

    impl LocalScore for FailsOnSecondParent {
        fn node_score(&self, _node: usize, parents: &[usize]) -> Result<f64, SearchError> {
            if parents.len() >= 2 {
                return Err(SearchError::EmptyDataset);
            }
            Ok(parents.len() as f64)
        }
    }

    #[test]
    fn failed_search_hands_out_no_network() {
        let data = data();
        let config = BayesNetConfig::new()
            .with_search(SearchMethod::HillClimber(HillClimber::new()))
            .with_init_as_naive_bayes(false);
        let mut search = StructureSearch::new(&data, &config).unwrap();
        search.initialize().unwrap();

        // The first arc is applied before the refresh fails.
        let err = search.search(&FailsOnSecondParent).unwrap_err();
        assert!(matches!(err, SearchError::EmptyDataset));
        assert_eq!(search.phase(), SearchPhase::Failed);
        assert_eq!(search.network().n_arcs(), 0);

        assert!(matches!(
            search.finish(),
            Err(SearchError::InvalidPhase {
                expected: SearchPhase::Searching,
                found: SearchPhase::Failed,
            })
        ));
        assert!(matches!(
            search.into_network(),
            Err(SearchError::InvalidPhase {
                expected: SearchPhase::Built,
                found: SearchPhase::Failed,
            })
        ));
    }

    #[test]
    fn run_stops_at_failed_phase() {
        let data = data();
        let config = BayesNetConfig::new()
            .with_search(SearchMethod::HillClimber(HillClimber::new()))
            .with_init_as_naive_bayes(false);
        let mut search = StructureSearch::new(&data, &config).unwrap();
        assert!(search.run(&FailsOnSecondParent).is_err());
        assert_eq!(search.phase(), SearchPhase::Failed);
        assert!(search.into_network().is_err());
    }

    #[test]
    fn fit_reports_markov_correction() {
        let data = data();
        let corrected = BayesNetConfig::new()
            .with_search(SearchMethod::HillClimber(HillClimber::new()))
            .with_init_as_naive_bayes(false)
            .with_markov_blanket_correction(true)
            .fit(&data)
            .unwrap();
        let correction = corrected.markov_correction().unwrap();
        assert!(correction.skipped.is_empty());
        for &(tail, head) in &correction.added {
            assert!(corrected.network().is_arc(head, tail));
        }

        let plain = BayesNetConfig::new().fit(&data).unwrap();
        assert!(plain.markov_correction().is_none());
    }
}
