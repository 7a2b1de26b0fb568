use clap::Parser;
use sew_algo::{TabuConfig, TabuSearch};
use sew_core::ProblemModel;
use sew_io::{read_workbook, save_solution, write_schedule_report};
use std::fs;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

mod cli;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    info!("Loading workbook {}", cli.workbook.display());
    let ingested = read_workbook(&cli.workbook)?;
    let mut diagnostics = ingested.diagnostics;
    let model = ProblemModel::from_records(&ingested.records, &mut diagnostics)?;

    for issue in &diagnostics.issues {
        warn!("{issue}");
    }
    info!("Ingested: {}", diagnostics.summary());
    info!(
        "Model: {} lines x {} days, {} styles",
        model.num_lines(),
        model.horizon(),
        model.num_styles()
    );

    let config = TabuConfig {
        max_iter: cli.max_iter,
        max_time: Duration::from_secs(cli.max_time),
        tabu_tenure: cli.tenure,
        destroy_probability: cli.destroy_prob,
        seed: cli.seed,
        ..TabuConfig::default()
    };
    info!(
        "Starting tabu search: up to {} iterations within {}s (seed {})",
        config.max_iter,
        config.max_time.as_secs(),
        config.seed
    );
    let (best, stats) = TabuSearch::new(&model, config).run();
    info!(
        "Search finished: {} iterations in {:.1?}, best cost {:.2}",
        stats.iterations, stats.elapsed, best.total_cost
    );
    for (operator, count) in stats.operator_counts() {
        debug!("accepted {count} moves via {operator}");
    }

    fs::create_dir_all(&cli.out)?;
    let solution_path = cli.out.join("schedule.json");
    save_solution(&best, &solution_path)?;
    info!("Solution saved to {}", solution_path.display());

    let report_path = cli.out.join("schedule_report.xlsx");
    write_schedule_report(&model, &best, &report_path)?;
    info!("Report written to {}", report_path.display());

    println!("{}", best.summary(&model));
    Ok(())
}
