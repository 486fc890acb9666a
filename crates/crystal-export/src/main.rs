//! crystal-to-fdtd: CLI tool for editing lattice models and compiling them to Lumerical scripts

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crystal_export::{
    translate, BoundaryPolicy, Crystal, FsStore, LatticeGrid, LengthUnit, SceneConfig,
    SceneOptions,
};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crystal-to-fdtd")]
#[command(about = "Compile photonic-crystal lattice sketches to Lumerical FDTD scripts")]
#[command(version)]
struct Args {
    /// Directory holding the `<name>_crystal_model.txt` files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// JSON scene configuration; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lattice constant, in `--unit` units
    #[arg(long)]
    lattice_constant: Option<f64>,

    /// Etch depth, in `--unit` units
    #[arg(long)]
    zspan: Option<f64>,

    /// Length unit for --lattice-constant and --zspan (m, mm, um, nm)
    #[arg(long, default_value = "nm")]
    unit: LengthUnit,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default checkerboard lattice, backing up any existing one
    Init {
        name: String,
        #[arg(long, default_value = "5")]
        x: usize,
        #[arg(long, default_value = "5")]
        y: usize,
        /// Put the half-step offset on even rows
        #[arg(long)]
        first_null: bool,
    },

    /// Print a lattice and its dimensions
    Show { name: String },

    /// Widen every row by N sites
    Expand {
        name: String,
        #[arg(short, default_value = "1")]
        n: usize,
    },

    /// Narrow every row by N sites
    Reduce {
        name: String,
        #[arg(short, default_value = "1")]
        n: usize,
    },

    /// Assemble crystals left to right and write the scene script
    Compile {
        /// Crystal names, in placement order
        #[arg(required = true)]
        names: Vec<String>,

        /// Output .lsf file
        #[arg(short, long, default_value = "scene.lsf")]
        output: PathBuf,

        /// Print generated script to stdout instead of file
        #[arg(long)]
        stdout: bool,

        /// Neighbour policy for curves on the lattice edge
        #[arg(long, value_enum)]
        boundary: Option<BoundaryPolicy>,

        /// Add a movie monitor
        #[arg(long)]
        movie: bool,

        #[arg(long)]
        no_sources: bool,

        #[arg(long)]
        no_monitors: bool,

        /// Skip the substrate rectangle
        #[arg(long)]
        no_base: bool,

        /// Skip the FDTD region and analysis monitors
        #[arg(long)]
        no_analysis: bool,
    },
}

fn load_config(args: &Args) -> Result<SceneConfig> {
    let mut config = match &args.config {
        Some(path) => SceneConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?,
        None => SceneConfig::default(),
    };

    if let Some(a) = args.lattice_constant {
        config.lattice_constant = args.unit.to_meters(a);
    }
    if let Some(zspan) = args.zspan {
        config.zspan = args.unit.to_meters(zspan);
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let store = FsStore::new(&args.dir);
    let open = |name: &str| {
        Crystal::open(&store, name, config.lattice_constant, config.zspan)
            .with_context(|| format!("Failed to open crystal '{}'", name))
    };

    match args.command {
        Command::Init { name, x, y, first_null } => {
            let mut grid = LatticeGrid::default();
            grid.set_first_null(first_null);
            grid.generate_default(&store, &name, x, y)
                .with_context(|| format!("Failed to write lattice for '{}'", name))?;
            info!("Edit {:?} and run `compile {}`", store.model_path(&name), name);
        }
        Command::Show { name } => {
            let crystal = open(&name)?;
            print!("{}", crystal.grid);
            println!(
                "{}: {} x {} sites, first_null={}, a={:.1} nm",
                crystal.name,
                crystal.columns(),
                crystal.rows(),
                crystal.grid.first_null(),
                LengthUnit::Nanometer.from_meters(crystal.a),
            );
        }
        Command::Expand { name, n } => {
            let mut crystal = open(&name)?;
            crystal.expand_x(&store, n)?;
            info!("'{}' is now {} sites wide", name, crystal.columns());
        }
        Command::Reduce { name, n } => {
            let mut crystal = open(&name)?;
            crystal.reduce_x(&store, n)?;
            info!("'{}' is now {} sites wide", name, crystal.columns());
        }
        Command::Compile {
            names,
            output,
            stdout,
            boundary,
            movie,
            no_sources,
            no_monitors,
            no_base,
            no_analysis,
        } => {
            let mut config = config;
            if let Some(boundary) = boundary {
                config.boundary = boundary;
            }
            let options = SceneOptions {
                sources: !no_sources,
                monitors: !no_monitors,
                base: !no_base,
                analysis: !no_analysis,
                movie,
            };

            let script = translate(&store, &names, &config, options)
                .context("Compilation failed")?;

            if stdout {
                println!("{}", script);
            } else {
                fs::write(&output, &script)
                    .with_context(|| format!("Failed to write output file: {:?}", output))?;
                eprintln!("Generated Lumerical script: {:?}", output);
            }
        }
    }

    Ok(())
}
