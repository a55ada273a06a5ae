//! Command-line interface for calculaterm
//!
//! Evaluates expressions of `x`, samples them for plotting, and finds
//! intersections. Definitions given with `-D name=expression` are available
//! to every expression.

use anyhow::{Context, Result};
use calculaterm::{find_intersection, sample, Function, Registry, Viewport, Workbook};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "calculaterm")]
#[command(about = "Single-variable expression engine for graphing calculators")]
#[command(version)]
struct Cli {
    /// Definitions, as `name = expression`, processed in order
    #[arg(short = 'D', long = "define", global = true, value_name = "DEFINITION")]
    definitions: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate an expression at one point
    Eval {
        expression: String,
        /// Value of x
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,
    },
    /// Sample an expression across a window, as CSV
    ///
    /// Consecutive points of a curve are printed on consecutive lines, and
    /// curves are separated by an empty line.
    Sample {
        expression: String,
        #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
        x_min: f64,
        #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
        x_max: f64,
        #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
        y_min: f64,
        #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
        y_max: f64,
        /// Width of the drawing area, in columns
        #[arg(short, long, default_value_t = 80)]
        width: usize,
    },
    /// Find where two expressions are equal
    Intersect {
        f: String,
        g: String,
        /// Starting point of the search
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        guess: f64,
    },
    /// Process rows, one per line, and evaluate each of them
    ///
    /// Rows are named y1, y2, ... unless written `name = expression`, and can
    /// reference each other.
    Rows {
        /// File to read rows from, standard input if absent
        file: Option<PathBuf>,
        /// Value of x
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,
    },
}

fn registry(definitions: &[String]) -> Result<Registry> {
    let mut registry = Registry::new();
    for definition in definitions {
        registry
            .define_or_update(definition)
            .with_context(|| format!("invalid definition {:?}", definition))?;
    }
    Ok(registry)
}

fn compile(expression: &str, registry: &Registry) -> Result<Function> {
    Function::compile(expression, registry).with_context(|| format!("cannot compile {:?}", expression))
}

fn read_rows(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("can't open {:?}", path))
        }
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let registry = registry(&cli.definitions)?;

    match cli.command {
        Commands::Eval { expression, x } => {
            let function = compile(&expression, &registry)?;
            let y = function.eval(x, &registry)?;
            println!("{}", y);
        }
        Commands::Sample {
            expression,
            x_min,
            x_max,
            y_min,
            y_max,
            width,
        } => {
            let function = compile(&expression, &registry)?;
            let viewport = Viewport {
                x_min,
                x_max,
                y_min,
                y_max,
                width,
            };
            for (i, run) in sample(&function, &registry, &viewport).iter().enumerate() {
                if i > 0 {
                    println!();
                }
                for (x, y) in run {
                    println!("{},{}", x, y);
                }
            }
        }
        Commands::Intersect { f, g, guess } => {
            let f = compile(&f, &registry)?;
            let g = compile(&g, &registry)?;
            let x = find_intersection(&f, &g, &registry, guess)?;
            println!("x = {}, y = {}", x, f.eval(x, &registry)?);
        }
        Commands::Rows { file, x } => {
            let input = read_rows(file)?;
            let mut workbook = Workbook::with_registry(registry);
            for line in input.lines() {
                let index = workbook.push_row();
                if let Err(err) = workbook.edit(index, line) {
                    log::debug!("row {}: {}", index + 1, err);
                }
            }
            for (index, row) in workbook.rows().iter().enumerate() {
                match workbook.evaluate(index, x) {
                    Ok(y) => println!("{}\t{}\t{}", row.name(), row.text(), y),
                    Err(err) => println!("{}\t{}\terror: {}", row.name(), row.text(), err),
                }
            }
        }
    }
    Ok(())
}
