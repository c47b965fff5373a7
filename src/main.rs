//! Command line front end: integrate a built-in integrand with one of the
//! five methods, repeating stochastic methods and summarising the trials.
//!
//! ```bash
//! numint --lower -5 --upper 5 --tolerance 1e-4 --method 1
//! numint --lower -5 --upper 5 --tolerance 1e-3 --method adaptive_monte_carlo --repeat 20 --seed 7
//! RUST_LOG=numint=debug numint --lower 0 --upper 2 --tolerance 1e-3 --method 4
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use numint::configuration::Configuration;
use numint::integrator::integrand::BuiltinIntegrand;
use numint::integrator::integrationmethod::IntegrationMethod;
use numint::integrator::integrator::Integrator;
use numint::manager::managererror::ManagerError;
use numint::trial::trialrunner::TrialRunner;

/// Definite integration of a one-dimensional function
#[derive(Parser, Debug)]
#[command(name = "numint")]
#[command(about = "Integrate f(z) over [lower, upper] to a relative accuracy")]
#[command(version)]
struct Args {
    /// Lower limit of integration
    #[arg(long, allow_hyphen_values = true)]
    lower: f64,

    /// Upper limit of integration
    #[arg(long, allow_hyphen_values = true)]
    upper: f64,

    /// Desired relative accuracy, e.g. 1e-4
    #[arg(long)]
    tolerance: f64,

    /// Menu number 1-5, a canonical method name, or a name from --config
    #[arg(short, long)]
    method: String,

    /// Repetitions of a Monte Carlo method
    #[arg(short, long, default_value = "10")]
    repeat: usize,

    /// gaussian, constant, sine or peak
    #[arg(short, long, default_value = "gaussian")]
    integrand: BuiltinIntegrand,

    /// JSON file with named integrator entries
    #[arg(short, long)]
    config: Option<String>,

    /// Seed of the first Monte Carlo run; run i uses seed + i
    #[arg(long)]
    seed: Option<u64>,
}

/// A menu number or canonical name maps to the canonical registry entry,
/// anything else is looked up as a configured name.
fn resolve_integrator(configuration: &Configuration, method: &str) -> Result<Arc<dyn Integrator>, ManagerError> {
    match method.parse::<IntegrationMethod>() {
        Ok(builtin) => configuration.integrator(builtin.name()),
        Err(_) => configuration.integrator(method),
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::new();
    if let Some(path) = &args.config {
        configuration.from_reader(path)?;
    }
    let integrand = args.integrand.function();
    let integrator = resolve_integrator(&configuration, &args.method)?;
    let method = integrator.method();

    println!("{}", method.title());
    if !method.is_stochastic() {
        let result = integrator.integrate(&integrand, args.lower, args.upper, args.tolerance)?;
        println!(
            "Integration with {}: {} with estimated error: {} ({} function evaluations)",
            method,
            result.estimate(),
            result.error_estimate(),
            result.evaluation_count()
        );
        return Ok(());
    }

    let mut runner = TrialRunner::new(args.repeat)?;
    if let Some(seed) = args.seed {
        runner = runner.with_seed(seed);
    }
    let summary = runner.run_with(
        integrator.as_ref(),
        &integrand,
        args.lower,
        args.upper,
        args.tolerance,
        |run, result| {
            println!(
                "Run {}: Result: {}, standard error: {}, function evaluations: {}",
                run + 1,
                result.estimate(),
                result.error_estimate(),
                result.evaluation_count()
            );
        },
    )?;
    println!(
        "Mean of results: {}, with error of the mean: {} and averaged standard error: {}",
        summary.mean_estimate(),
        summary.estimate_standard_error(),
        summary.mean_reported_error()
    );
    println!(
        "Mean of function evaluations: {} with standard error of the mean: {}",
        summary.mean_evaluations(),
        summary.evaluations_standard_error()
    );
    println!("Average time usage: {} seconds.", summary.mean_duration().as_secs_f64());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
