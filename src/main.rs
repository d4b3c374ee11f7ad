use ratnet::prelude::*;

use serde::Serialize;

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let json = args.iter().any(|a| a == "--json");

    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return;
    }
    if args.len() >= 2 && args[1] == "trials" {
        run_trials(json);
        return;
    }
    if args.len() >= 2 && args[1] != "--json" {
        eprintln!("Unknown command: {}", args[1]);
        print_help();
        std::process::exit(2);
    }

    run_demo(json);
}

fn print_help() {
    println!("ratnet - spreading-activation word puzzle solver");
    println!();
    println!("Usage:");
    println!("  ratnet            run the built-in demo puzzle through both engines");
    println!("  ratnet trials     run the built-in puzzle set and report success rates");
    println!("  ratnet --json     emit the summary as JSON");
    println!("  ratnet --help     show this help");
}

/// Small built-in association graph for demonstration. Weights are invented
/// but shaped like free-association norms: a handful of strong forward
/// associations per cue.
fn demo_graph() -> AssociationGraph {
    let mut b = AssociationGraph::builder();
    b.add_edge("cottage", "cheese", 0.35);
    b.add_edge("cottage", "house", 0.40);
    b.add_edge("swiss", "cheese", 0.30);
    b.add_edge("swiss", "alps", 0.25);
    b.add_edge("swiss", "chocolate", 0.20);
    b.add_edge("cake", "chocolate", 0.55);
    b.add_edge("cake", "cheese", 0.45);
    b.add_edge("cake", "bread", 0.15);
    b.add_edge("cheese", "milk", 0.60);
    b.add_edge("cheese", "bread", 0.30);
    b.add_edge("river", "bank", 0.50);
    b.add_edge("note", "bank", 0.40);
    b.add_edge("note", "music", 0.30);
    b.add_edge("account", "bank", 0.60);
    b.add_edge("bank", "money", 0.55);
    b.build().expect("demo graph weights are valid")
}

#[derive(Debug, Serialize)]
struct DemoSummary {
    cues: Vec<String>,
    target: String,
    search_path: Vec<String>,
    network_path: Vec<String>,
    search_position: Option<usize>,
    network_position: Option<usize>,
    visited_match: bool,
    max_activation_diff: f32,
    network_steps: usize,
    network_retries: usize,
}

fn run_demo(json: bool) {
    let graph = demo_graph();
    let puzzle = Puzzle::from_words(&graph, ["cottage", "swiss", "cake"], "cheese")
        .expect("demo words are in the vocabulary");

    let params = SearchParams {
        threshold: 0.0,
        max_visited: 8,
    };
    let report = match run_matched(
        &graph,
        &puzzle.cues,
        puzzle.target,
        &params,
        NetworkConfig::default().with_seed(42),
    ) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("demo run failed: {e}");
            std::process::exit(1);
        }
    };

    let summary = DemoSummary {
        cues: puzzle.cues.iter().map(|&c| word(&graph, c)).collect(),
        target: word(&graph, puzzle.target),
        search_path: report.search.visited.iter().map(|&v| word(&graph, v)).collect(),
        network_path: report.network.visited.iter().map(|&v| word(&graph, v)).collect(),
        search_position: report.search.target_position(puzzle.target),
        network_position: report.network.target_position(),
        visited_match: report.visited_match,
        max_activation_diff: report.max_activation_diff,
        network_steps: report.network.steps,
        network_retries: report.network.retries,
    };

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("failed to serialize summary: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("puzzle: {:?} -> {}", summary.cues, summary.target);
    println!();
    println!("discrete search path:");
    for (rank, &v) in report.search.visited.iter().enumerate() {
        println!(
            "  {:>2}  {:<12} {:.3}",
            rank + 1,
            word(&graph, v),
            report.search.activations[v]
        );
    }
    println!();
    println!("network path ({} steps, {} retries):", summary.network_steps, summary.network_retries);
    for (rank, &v) in report.network.visited.iter().enumerate() {
        println!(
            "  {:>2}  {:<12} {:.3}",
            rank + 1,
            word(&graph, v),
            report.network.final_activity()[v]
        );
    }
    println!();
    println!("visited sequences match: {}", summary.visited_match);
    println!("max activation difference: {:.4}", summary.max_activation_diff);
}

#[derive(Debug, Serialize)]
struct TrialsSummary {
    engine: &'static str,
    positions: Vec<i32>,
    success_rate: f32,
}

fn run_trials(json: bool) {
    let graph = demo_graph();
    let puzzles = vec![
        Puzzle::from_words(&graph, ["cottage", "swiss", "cake"], "cheese")
            .expect("built-in puzzle words exist"),
        Puzzle::from_words(&graph, ["river", "note", "account"], "bank")
            .expect("built-in puzzle words exist"),
        Puzzle::from_words(&graph, ["house", "alps", "bread"], "milk")
            .expect("built-in puzzle words exist"),
    ];

    let params = SearchParams {
        threshold: 0.0,
        max_visited: 6,
    };
    let cfg = NetworkConfig {
        max_visited: 6,
        ..NetworkConfig::default()
    }
    .with_seed(42);

    let search_report = run_search_trials(&graph, &puzzles, &params);
    let network_report = run_network_trials(&graph, &puzzles, &cfg);

    let (search_report, network_report) = match (search_report, network_report) {
        (Ok(s), Ok(n)) => (s, n),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("trials failed: {e}");
            std::process::exit(1);
        }
    };

    let summaries = vec![
        TrialsSummary {
            engine: "search",
            positions: search_report.positions.clone(),
            success_rate: search_report.success_rate(),
        },
        TrialsSummary {
            engine: "network",
            positions: network_report.positions.clone(),
            success_rate: network_report.success_rate(),
        },
    ];

    if json {
        match serde_json::to_string_pretty(&summaries) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("failed to serialize summary: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    for s in &summaries {
        println!(
            "{:<8} positions={:?} success_rate={:.2}",
            s.engine, s.positions, s.success_rate
        );
    }
}

fn word(graph: &AssociationGraph, id: NodeId) -> String {
    graph.word(id).unwrap_or("<unknown>").to_string()
}
