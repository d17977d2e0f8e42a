// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use queuesim::metrics::logger::RecordLogger;
use queuesim::prelude::*;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep one parameter and compare simulated against closed-form results
    Sweep {
        /// JSON config file, replaces every other sweep flag
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "mu")]
        parameter: String,
        #[arg(long, default_value_t = 1.1)]
        min: f64,
        #[arg(long, default_value_t = 3.0)]
        max: f64,
        #[arg(long, default_value_t = 0.1)]
        step: f64,
        #[arg(short, long, default_value_t = 20)]
        replications: u32,
        #[arg(short = 'T', long, default_value_t = 10_000)]
        packets: u64,
        #[arg(short = 'K', long, default_value_t = 10)]
        capacity: usize,
        #[arg(short = 'S', long, default_value_t = 2)]
        servers: usize,
        #[arg(long, default_value_t = 1.0)]
        lambda: f64,
        #[arg(long, default_value_t = 1.1)]
        mu: f64,
        #[arg(short, long, default_value = "shortest-queue")]
        dispatch: String,
        /// Random if omitted; the chosen seed is logged
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "clock")]
        arrival_reference: String,
        /// Also write every packet's timeline
        #[arg(long)]
        trace: bool,
        #[arg(long)]
        sequential: bool,
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Print closed-form values for one parameter set
    Analytic {
        #[arg(long, default_value_t = 1.0)]
        lambda: f64,
        #[arg(long, default_value_t = 1.1)]
        mu: f64,
        #[arg(short = 'K', long, default_value_t = 10)]
        capacity: usize,
        #[arg(short = 'S', long, default_value_t = 1)]
        servers: usize,
    },

    List,
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Sweep {
            config,
            parameter,
            min,
            max,
            step,
            replications,
            packets,
            capacity,
            servers,
            lambda,
            mu,
            dispatch,
            seed,
            arrival_reference,
            trace,
            sequential,
            output,
        } => {
            let config = match config {
                Some(path) => {
                    info!("Loading config from: {}", path.display());
                    SweepConfig::from_json_file(&path)?
                }
                None => {
                    let parameter = parse_parameter(&parameter)?;
                    let seed = seed.unwrap_or_else(rand::random);
                    SweepConfig {
                        name: format!("{}_{}", dispatch, parameter),
                        parameter,
                        min,
                        max,
                        step,
                        replications,
                        packets,
                        capacity,
                        servers,
                        lambda,
                        mu,
                        policy: dispatch,
                        seed,
                        arrival_reference: parse_arrival_reference(&arrival_reference)?,
                        trace_packets: trace,
                        parallel: !sequential,
                        show_progress: true,
                    }
                }
            };
            run_sweep(config, &output)?;
        }

        Commands::Analytic { lambda, mu, capacity, servers } => {
            print_analytic(QueueModel::new(lambda, mu, capacity, servers)?);
        }

        Commands::List => {
            println!("\nAvailable Dispatch Policies");

            for policy in DispatchRegistry::global().list() {
                println!("  - {}", policy);
            }

            println!("\nUsage: cargo run -- sweep --dispatch <name>");
            println!("Example: cargo run -- sweep --dispatch random --parameter load --min 0.3 --max 0.9\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn run_sweep(config: SweepConfig, output: &Path) -> Result<()> {
    info!("Seed: {}", config.seed);

    let experiment = Experiment::new(config)?;
    let report = experiment.run()?;

    save_results(&report, output)?;
    comparison_table(&report.points(), &report.config);

    Ok(())
}

fn save_results(report: &ExperimentReport, output: &Path) -> Result<()> {
    std::fs::create_dir_all(output)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let stem = format!("{}_{}", report.config.name, timestamp);

    let avg_path = output.join(format!("{}_avg.csv", stem));
    RecordLogger::new(&avg_path)?.log_batch(&report.points())?;
    info!("Sweep averages saved to: {}", avg_path.display());

    let runs_path = output.join(format!("{}_runs.csv", stem));
    let summaries: Vec<ReplicationSummary> = report.summaries().cloned().collect();
    RecordLogger::new(&runs_path)?.log_batch(&summaries)?;
    info!("Per-replication results saved to: {}", runs_path.display());

    if report.config.trace_packets {
        let trace_path = output.join(format!("{}_packets.csv", stem));
        let records: Vec<&PacketRecord> = report.trace().collect();
        RecordLogger::new(&trace_path)?.log_batch(&records)?;
        info!("Packet trace saved to: {}", trace_path.display());
    }

    let json_path = output.join(format!("{}.json", stem));
    std::fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
    info!("Report saved to: {}", json_path.display());

    Ok(())
}

fn parse_parameter(name: &str) -> Result<SweepParameter> {
    match name.to_lowercase().as_str() {
        "lambda" | "l" | "0" => Ok(SweepParameter::Lambda),
        "mu" | "m" | "1" => Ok(SweepParameter::Mu),
        "load" | "rho" | "2" => Ok(SweepParameter::Load),
        _ => anyhow::bail!("Unknown sweep parameter: {}. Use: lambda, mu, or load", name),
    }
}

fn parse_arrival_reference(name: &str) -> Result<ArrivalReference> {
    match name.to_lowercase().as_str() {
        "clock" => Ok(ArrivalReference::Clock),
        "head-scaled" | "head" => Ok(ArrivalReference::HeadScaled),
        _ => anyhow::bail!("Unknown arrival reference: {}. Use: clock or head-scaled", name),
    }
}

fn print_analytic(model: QueueModel) {
    println!("\nM/M/{}/{}  λ={:.4} μ={:.4} ρ={:.6}",
        model.servers(), model.capacity(), model.lambda(), model.mu(), model.load());
    println!("  Blocking probability:   {:.6}", model.blocking_probability());
    println!("  Mean number in system:  {:.6}", model.mean_number_in_system());
    println!("  Mean wait:              {:.6}", model.mean_wait());
    println!("\n  n   p_n");
    for (n, p) in model.state_probabilities().iter().enumerate() {
        println!("  {:<3} {:.6}", n, p);
    }
    println!();
}

fn comparison_table(points: &[SweepPoint], config: &SweepConfig) {
    println!("\n╔═══════════╦═══════════════════════╦═══════════════════════╦═══════════════════════╗");
    println!("║ {:<9} ║ Blocking probability  ║ Mean length           ║ Mean wait             ║", config.parameter.to_string());
    println!("║           ║ analytic   simulated  ║ analytic   simulated  ║ analytic   simulated  ║");
    println!("╠═══════════╬═══════════════════════╬═══════════════════════╬═══════════════════════╣");

    for p in points {
        println!(
            "║ {:>9.3} ║ {:>9.6}  {:>9.6}  ║ {:>9.4}  {:>9.4}  ║ {:>9.4}  {:>9.4}  ║",
            p.value,
            p.analytic_bp,
            p.empirical_bp,
            p.analytic_len,
            p.empirical_len,
            p.analytic_wait,
            p.empirical_wait,
        );
    }

    println!("╚═══════════╩═══════════════════════╩═══════════════════════╩═══════════════════════╝\n");

    if let Some(worst) = points.iter().max_by(|a, b| a.bp_error().total_cmp(&b.bp_error())) {
        println!("Largest blocking error: {:.6} at {}={:.3}",
            worst.bp_error(), config.parameter, worst.value);
    }

    println!();
}
