#![warn(clippy::all, clippy::pedantic)]
use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use csv::Writer;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use parametric_mincut::{
    dimacs, solve, verify, Breakpoints, Instance, Network, RawArc, SweepConfig, DEFAULT_INFINITY,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// `p max` problem with 1-based vertex ids
    Dimacs,
    /// `tail,head,capacity[,slope]` rows with 0-based vertex ids
    Csv,
}

/// Computes the parametric min-cut of a network and writes the breakpoint of every vertex.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Parametric min-cut instance
    #[arg(short, long)]
    input: PathBuf,

    /// CSV file the `vertex,breakpoint` rows are appended to
    #[arg(short, long)]
    output: PathBuf,

    /// Capacities with this value or higher are unbounded
    #[arg(long, default_value_t = DEFAULT_INFINITY)]
    inf: f64,

    #[arg(long, value_enum, default_value_t = Format::Dimacs)]
    format: Format,

    /// Source vertex of a CSV instance
    #[arg(long, required_if_eq("format", "csv"))]
    source: Option<usize>,

    /// Sink vertex of a CSV instance
    #[arg(long, required_if_eq("format", "csv"))]
    sink: Option<usize>,

    /// Vertex count of a CSV instance, one past the largest vertex id by default
    #[arg(long)]
    vertices: Option<usize>,

    #[arg(long, default_value_t = 0.0)]
    lambda_min: f64,

    #[arg(long, default_value_t = f64::INFINITY)]
    lambda_max: f64,

    /// Check the result against max-flows from scratch at up to this many values of lambda
    #[arg(long)]
    verify: Option<usize>,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn read_instance(cli: &Cli) -> Result<Instance, Box<dyn Error>> {
    match cli.format {
        Format::Dimacs => {
            let text = fs::read_to_string(&cli.input)?;
            Ok(dimacs::parse(&text, cli.inf).map_err(|e| e.to_string())?)
        }
        Format::Csv => {
            let mut rdr = csv::Reader::from_path(&cli.input)?;
            let arcs: Vec<RawArc> = rdr.deserialize().collect::<Result<_, _>>()?;
            let (source, sink) = cli
                .source
                .zip(cli.sink)
                .ok_or("CSV instances need --source and --sink")?;
            let vertex_count = cli.vertices.unwrap_or_else(|| {
                arcs.iter()
                    .flat_map(|arc| [arc.tail, arc.head])
                    .chain([source, sink])
                    .max()
                    .map_or(0, |v| v + 1)
            });

            let mut instance = Instance::new(vertex_count, source, sink, arcs);
            instance.infinity = cli.inf;
            Ok(instance)
        }
    }
}

// Appends the breakpoints, header included, to the output file
fn write_csv(breakpoints: &Breakpoints, filepath: &Path) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new().create(true).append(true).open(filepath)?;
    let mut wtr = Writer::from_writer(file);
    for row in breakpoints.rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    TermLogger::init(
        cli.log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let instance = read_instance(&cli)?;
    let network = Network::try_from(&instance).map_err(|e| e.to_string())?;
    let config = SweepConfig::new(cli.lambda_min, cli.lambda_max).map_err(|e| e.to_string())?;
    let breakpoints = solve(&network, config).map_err(|e| e.to_string())?;
    log::info!(
        "{} vertices on the source side at some lambda, {} distinct breakpoints",
        breakpoints.iter().filter(|(_, b)| b.is_finite()).count(),
        breakpoints.levels().len()
    );

    if let Some(samples) = cli.verify {
        let lambdas = verify::sample_lambdas(&breakpoints, cli.lambda_max, samples);
        verify::check(&network, &breakpoints, &lambdas).map_err(|e| e.to_string())?;
        log::info!("verified at {} values of lambda", lambdas.len());
    }

    write_csv(&breakpoints, &cli.output)
}
