mod error;

use cf_core::units::{density_cgs, g_per_cm3, k, kelvin, myr, seconds};
use cf_core::ElementId;
use cf_sim::run_box;
use cf_solver::{
    cool_element, net_rate_at_temperature, Context, CoolingConfig, GasElement, GasView,
    IonizationSeed, Metallicity,
};
use clap::{Parser, Subcommand};
use error::{CliError, CliResult};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(about = "coolflow CLI - radiative cooling and ionization equilibrium", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate run file syntax and values
    Validate {
        /// Path to the run file (YAML or JSON)
        run_path: PathBuf,
    },
    /// Cool a box of elements as described by a run file
    Run {
        /// Path to the run file (YAML or JSON)
        run_path: PathBuf,
        /// Write the recorded history as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cool a single element over one timestep
    Cool {
        /// Mass density in g/cm^3
        #[arg(long)]
        density: f64,
        /// Starting temperature in K
        #[arg(long)]
        temperature: f64,
        /// Timestep in Myr
        #[arg(long, default_value_t = 1.0)]
        dt_myr: f64,
        /// Total metal mass fraction
        #[arg(long, default_value_t = 0.0)]
        metallicity: f64,
        /// Cooling configuration YAML (defaults to primordial gas)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Tabulate net rates over a temperature range at fixed density
    Sweep {
        /// Mass density in g/cm^3
        #[arg(long)]
        density: f64,
        #[arg(long, default_value_t = 1.0e2)]
        t_min: f64,
        #[arg(long, default_value_t = 1.0e8)]
        t_max: f64,
        #[arg(long, default_value_t = 25)]
        points: usize,
        /// Total metal mass fraction
        #[arg(long, default_value_t = 0.0)]
        metallicity: f64,
        /// Cooling configuration YAML (defaults to primordial gas)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print every non-zero channel under each row
        #[arg(long)]
        breakdown: bool,
    },
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { run_path } => cmd_validate(&run_path),
        Commands::Run { run_path, output } => cmd_run(&run_path, output.as_deref()),
        Commands::Cool {
            density,
            temperature,
            dt_myr,
            metallicity,
            config,
        } => cmd_cool(density, temperature, dt_myr, metallicity, config.as_deref()),
        Commands::Sweep {
            density,
            t_min,
            t_max,
            points,
            metallicity,
            config,
            breakdown,
        } => cmd_sweep(
            density,
            t_min,
            t_max,
            points,
            metallicity,
            config.as_deref(),
            breakdown,
        ),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<CoolingConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&text)?)
        }
        None => Ok(CoolingConfig::primordial()),
    }
}

fn cmd_validate(run_path: &Path) -> CliResult<()> {
    println!("Validating run file: {}", run_path.display());
    let run = cf_project::load(run_path)?;
    println!("✓ Run file is valid ({} elements)", run.elements.len());
    Ok(())
}

fn cmd_run(run_path: &Path, output: Option<&Path>) -> CliResult<()> {
    let run = cf_project::load(run_path)?;
    println!("Running '{}' with {} elements", run.name, run.elements.len());

    let started = Instant::now();
    let mut ctx = Context::build(run.cooling.clone())?;
    let (mut elements, mut seeds) = cf_project::build_elements(&ctx, &run)?;
    let record = run_box(&mut ctx, &mut elements, &mut seeds, &run.run.sim_options())?;
    tracing::info!(
        records = record.t.len(),
        reloads = record.table_reloads,
        "box run finished"
    );

    println!("✓ Run completed in {:.2}s", started.elapsed().as_secs_f64());
    println!("  Records: {}", record.t.len());
    println!("  Final redshift: {:.4}", ctx.redshift());
    println!("  Metal table reloads: {}", record.table_reloads);
    if let Some(last) = record.samples.last() {
        println!("  {:>8}  {:>12}  {:>12}  {:>10}", "id", "T [K]", "u [erg/g]", "ne/nH");
        for s in last {
            println!(
                "  {:>8}  {:>12.4e}  {:>12.4e}  {:>10.4e}",
                s.id.to_string(),
                s.temperature,
                s.specific_energy,
                s.electron_fraction
            );
        }
    }

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&record)?)?;
        println!("  History written to {}", path.display());
    }
    Ok(())
}

fn equilibrium_element(
    ctx: &Context,
    density: f64,
    temperature: f64,
    metallicity: f64,
    dt: f64,
) -> CliResult<(GasElement, IonizationSeed)> {
    let mut element = GasElement::new(ElementId::new(0), density, 0.0, dt);
    element.metallicity = Metallicity::scaled(metallicity);
    let view = GasView::new(ctx, &element, &IonizationSeed::default());
    let (sol, _) = net_rate_at_temperature(ctx, &view, temperature, 0.5)?;
    element.specific_energy = ctx.energy_from_temperature(temperature, sol.state.ne);
    Ok((element, IonizationSeed::new(sol.state)))
}

fn check_positive(name: &str, v: f64) -> CliResult<()> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(CliError::InvalidArg(format!("{name} must be positive, got {v}")))
    }
}

fn cmd_cool(
    density: f64,
    temperature: f64,
    dt_myr: f64,
    metallicity: f64,
    config: Option<&Path>,
) -> CliResult<()> {
    check_positive("density", density)?;
    check_positive("temperature", temperature)?;
    let rho = density_cgs(g_per_cm3(density));
    let t = kelvin(k(temperature));
    let dt = seconds(myr(dt_myr));

    let ctx = Context::build(load_config(config)?)?;
    let (element, seed) = equilibrium_element(&ctx, rho, t, metallicity, dt)?;
    let out = cool_element(&ctx, &element, &seed)?;

    println!("rho = {rho:.4e} g/cm^3, dt = {dt_myr} Myr");
    println!("  u: {:.6e} -> {:.6e} erg/g", element.specific_energy, out.specific_energy);
    println!("  T: {:.6e} -> {:.6e} K", t, out.temperature);
    println!("  mu = {:.4}, ne/nH = {:.4e}, P = {:.4e}", out.mu, out.electron_fraction(), out.pressure);
    println!(
        "  bisections = {}, temperature iterations = {}{}",
        out.iterations,
        out.temperature_iterations,
        if out.floor_clamped { " (clamped to floor)" } else { "" }
    );
    println!("  heating = {:.4e}, cooling = {:.4e} erg cm^3/s", out.rates.heating, out.rates.cooling);
    for (channel, value) in out.rates.breakdown() {
        println!("    {:<24} {:>12.4e}", channel.to_string(), value);
    }
    Ok(())
}

fn cmd_sweep(
    density: f64,
    t_min: f64,
    t_max: f64,
    points: usize,
    metallicity: f64,
    config: Option<&Path>,
    breakdown: bool,
) -> CliResult<()> {
    check_positive("density", density)?;
    check_positive("t_min", t_min)?;
    if !(t_max > t_min) || points < 2 {
        return Err(CliError::InvalidArg(
            "sweep needs t_max > t_min and at least 2 points".to_string(),
        ));
    }

    let ctx = Context::build(load_config(config)?)?;
    let mut element = GasElement::new(ElementId::new(0), density_cgs(g_per_cm3(density)), 0.0, 0.0);
    element.metallicity = Metallicity::scaled(metallicity);
    let view = GasView::new(&ctx, &element, &IonizationSeed::default());

    let (lo, hi) = (t_min.log10(), t_max.log10());
    println!(
        "{:>12}  {:>12}  {:>12}  {:>12}  {:>10}  dominant",
        "T [K]", "net", "heating", "cooling", "ne/nH"
    );
    for i in 0..points {
        let t = 10f64.powf(lo + (hi - lo) * i as f64 / (points - 1) as f64);
        let (sol, rate) = net_rate_at_temperature(&ctx, &view, t, 0.5)?;
        let dominant = rate
            .dominant_cooling()
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "{:>12.4e}  {:>12.4e}  {:>12.4e}  {:>12.4e}  {:>10.4e}  {}",
            t, rate.net, rate.heating, rate.cooling, sol.state.ne, dominant
        );
        if breakdown {
            for (channel, value) in rate.breakdown() {
                println!("    {:<24} {:>12.4e}", channel.to_string(), value);
            }
        }
    }
    Ok(())
}
