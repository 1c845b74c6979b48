use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use bayesnet_adtree::AdTreeConfig;
use bayesnet_data::Dataset;
use bayesnet_search::{
    BayesNet, BayesNetConfig, HillClimber, K2, NetworkGenerator, NodeEntry, ScoreType,
    SearchMethod, SimulatedAnnealing, StructureFile,
};

#[derive(Parser)]
#[command(name = "bayesnet")]
#[command(about = "Bayesian network structure learning with AD-tree cached counts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 1, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

/// Structure search and scoring parameters.
#[derive(Args, Debug, Clone)]
struct SearchArgs {
    /// Search strategy: "k2", "hill-climber", or "annealing"
    #[arg(long, default_value = "k2")]
    search: String,

    /// Use the structure in this file instead of searching
    #[arg(long, conflicts_with = "search")]
    structure: Option<PathBuf>,

    /// Maximum parents per node (K2 and hill climber)
    #[arg(long)]
    max_parents: Option<usize>,

    /// Let the hill climber reverse arcs
    #[arg(long, default_value_t = false)]
    arc_reversal: bool,

    /// Shuffle the K2 node ordering
    #[arg(long, default_value_t = false)]
    random_order: bool,

    /// Number of simulated annealing runs
    #[arg(long, default_value_t = 10_000)]
    runs: usize,

    /// Score: "bayes", "bdeu", "mdl", "aic", or "entropy"
    #[arg(long, default_value = "bayes")]
    score: String,

    /// Dirichlet prior count for the Bayes score
    #[arg(long, default_value_t = 0.5)]
    alpha: f64,

    /// Start from an empty network instead of naive Bayes
    #[arg(long, default_value_t = false)]
    empty_init: bool,

    /// Pull every node into the class's Markov blanket after searching
    #[arg(long, default_value_t = false)]
    markov_blanket: bool,

    /// Count by scanning rows instead of building an AD-tree
    #[arg(long, default_value_t = false)]
    no_ad_tree: bool,

    /// Largest record partition stored as an AD-tree leaf
    #[arg(long, default_value_t = 16)]
    leaf_threshold: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Sample data from a random network, learn a structure back, and compare
    Simulate {
        /// Number of nodes in the generating network
        #[arg(long, default_value_t = 10)]
        nodes: usize,

        /// Number of arcs in the generating network
        #[arg(long, default_value_t = 12)]
        arcs: usize,

        /// Values per node
        #[arg(long, default_value_t = 2)]
        cardinality: usize,

        /// Number of training records
        #[arg(long, default_value_t = 2000)]
        rows: usize,

        /// Number of held-out records for classification accuracy
        #[arg(long, default_value_t = 500)]
        test_rows: usize,

        /// Write the learned structure to this file
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Print the contents of a structure file
    Inspect {
        /// Path to the structure file
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct SimulateOutput {
    n_nodes: usize,
    n_rows: usize,
    search: String,
    score: String,
    true_arcs: usize,
    learned_arcs: usize,
    correct: usize,
    reversed: usize,
    missing: usize,
    extra: usize,
    test_accuracy: Option<f64>,
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    n_nodes: usize,
    n_arcs: usize,
    nodes: &'a [NodeEntry],
}

fn parse_score(s: &str) -> Result<ScoreType> {
    match s {
        "bayes" => Ok(ScoreType::Bayes),
        "bdeu" => Ok(ScoreType::BDeu),
        "mdl" => Ok(ScoreType::Mdl),
        "aic" => Ok(ScoreType::Aic),
        "entropy" => Ok(ScoreType::Entropy),
        other => bail!("unknown score '{other}': expected bayes, bdeu, mdl, aic, or entropy"),
    }
}

fn parse_search(args: &SearchArgs, seed: u64) -> Result<SearchMethod> {
    if let Some(path) = &args.structure {
        return Ok(SearchMethod::FromFile(path.clone()));
    }
    let method = match args.search.as_str() {
        "k2" => {
            let mut k2 = K2::new().with_random_order(args.random_order).with_seed(seed);
            if let Some(max_parents) = args.max_parents {
                k2 = k2.with_max_parents(max_parents);
            }
            SearchMethod::K2(k2)
        }
        "hill-climber" => {
            let mut hc = HillClimber::new().with_arc_reversal(args.arc_reversal);
            if let Some(max_parents) = args.max_parents {
                hc = hc.with_max_parents(max_parents);
            }
            SearchMethod::HillClimber(hc)
        }
        "annealing" => SearchMethod::SimulatedAnnealing(
            SimulatedAnnealing::new().with_runs(args.runs).with_seed(seed),
        ),
        other => bail!("unknown search '{other}': expected k2, hill-climber, or annealing"),
    };
    Ok(method)
}

fn build_config(args: &SearchArgs, seed: u64) -> Result<BayesNetConfig> {
    Ok(BayesNetConfig::new()
        .with_search(parse_search(args, seed)?)
        .with_score_type(parse_score(&args.score)?)
        .with_alpha(args.alpha)
        .with_init_as_naive_bayes(!args.empty_init)
        .with_markov_blanket_correction(args.markov_blanket)
        .with_ad_tree(!args.no_ad_tree)
        .with_ad_tree_config(AdTreeConfig::new().with_leaf_threshold(args.leaf_threshold)))
}

fn accuracy(model: &BayesNet, data: &Dataset) -> Result<Option<f64>> {
    if data.is_empty() {
        return Ok(None);
    }
    let class = data.class_index();
    let mut hits = 0usize;
    for row in data.rows() {
        if model.predict(row)? == row[class] {
            hits += 1;
        }
    }
    Ok(Some(hits as f64 / data.n_rows() as f64))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Simulate {
            nodes,
            arcs,
            cardinality,
            rows,
            test_rows,
            output,
            search,
        } => {
            // 1. Generate the reference network and data
            let generated = NetworkGenerator::new()
                .with_n_nodes(nodes)
                .with_n_arcs(arcs)
                .with_cardinality(cardinality)
                .with_seed(cli.seed)
                .generate()
                .context("failed to generate network")?;
            let train = generated
                .sample(rows, cli.seed)
                .context("failed to sample training data")?;
            let test = generated
                .sample(test_rows, cli.seed.wrapping_add(1))
                .context("failed to sample test data")?;
            info!(n_rows = train.n_rows(), n_nodes = nodes, "data sampled");

            // 2. Learn
            let config = build_config(&search, cli.seed)?;
            let model = config.fit(&train).context("structure learning failed")?;

            // 3. Compare arcs
            let truth: HashSet<(usize, usize)> = generated.network().arcs().into_iter().collect();
            let learned = model.network().arcs();
            let correct = learned.iter().filter(|&arc| truth.contains(arc)).count();
            let reversed = learned
                .iter()
                .filter(|&&(tail, head)| truth.contains(&(head, tail)))
                .count();
            let extra = learned.len() - correct - reversed;
            let missing = truth
                .iter()
                .filter(|&&(tail, head)| {
                    !model.network().is_arc(head, tail) && !model.network().is_arc(tail, head)
                })
                .count();

            if let Some(path) = &output {
                model
                    .save_structure(path)
                    .context("failed to save structure")?;
                info!(path = %path.display(), "structure saved");
            }

            let output = SimulateOutput {
                n_nodes: nodes,
                n_rows: rows,
                search: match &search.structure {
                    Some(path) => format!("file:{}", path.display()),
                    None => search.search.clone(),
                },
                score: search.score.clone(),
                true_arcs: truth.len(),
                learned_arcs: learned.len(),
                correct,
                reversed,
                missing,
                extra,
                test_accuracy: accuracy(&model, &test).context("prediction failed")?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Inspect { path } => {
            let structure = StructureFile::load(&path)
                .with_context(|| format!("failed to load structure from {}", path.display()))?;
            info!(n_nodes = structure.nodes().len(), n_arcs = structure.n_arcs(), "structure loaded");

            let output = InspectOutput {
                n_nodes: structure.nodes().len(),
                n_arcs: structure.n_arcs(),
                nodes: structure.nodes(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
