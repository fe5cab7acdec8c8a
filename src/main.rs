use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use grid_perceptron::{
    Config, Grid, ImageStyle, Network, PpmSnapshots, RandomSource, Trainer, store,
};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file; defaults are used for missing keys
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the network and report fail rates before and after
    Train {
        #[arg(long, value_name = "PATH", default_value = "hidden_weights.csv")]
        hidden: PathBuf,
        #[arg(long, value_name = "PATH", default_value = "output_weights.csv")]
        output: PathBuf,
        /// Write the trained weights into the data directory
        #[arg(long)]
        save: bool,
    },
    /// Run a single evaluation pass
    Check {
        #[arg(long, value_name = "PATH", default_value = "hidden_weights.csv")]
        hidden: PathBuf,
        #[arg(long, value_name = "PATH", default_value = "output_weights.csv")]
        output: PathBuf,
    },
    /// Write starting weight files
    Init {
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,
        /// Fill with noise in [-1, 1] from this seed instead of zeros
        #[arg(short, long, value_name = "INT")]
        seed: Option<u64>,
    },
    /// Render a weight file as a PPM image
    Render {
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,
        #[arg(short, long, value_name = "PATH")]
        out: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

fn install_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    install_logger();
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let style = ImageStyle {
        scale: config.image_scale,
        range: config.image_range,
    };

    match args.command {
        Command::Train {
            hidden,
            output,
            save,
        } => train(config, style, &hidden, &output, save)?,
        Command::Check { hidden, output } => {
            let network = load_network(&config, &hidden, &output)?;
            let mut trainer = Trainer::new(config)?;
            let report = trainer.evaluate(&network)?;
            println!("fail rate: {:.6}", report.fail_rate());
        }
        Command::Init { dir, seed } => {
            fs::create_dir_all(&dir)?;
            let mut rng = seed.map(RandomSource::new);
            for name in ["hidden_weights.csv", "output_weights.csv"] {
                let mut grid = Grid::zeros();
                if let Some(rng) = rng.as_mut() {
                    grid.fill_noise(rng);
                }
                let path = dir.join(name);
                store::save_csv(&grid, &path)?;
                info!(path = %path.display(), "wrote weights");
            }
        }
        Command::Render { input, out } => {
            let grid = store::load(&input)?;
            store::save_ppm(&grid, &out, style)?;
            info!(path = %out.display(), "rendered");
        }
        Command::Config => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

fn load_network(
    config: &Config,
    hidden: &Path,
    output: &Path,
) -> grid_perceptron::Result<Network> {
    let hidden = store::load(hidden)?;
    let output = store::load(output)?;
    Ok(Network::new(hidden, output, config.bias))
}

fn train(
    config: Config,
    style: ImageStyle,
    hidden: &Path,
    output: &Path,
    save: bool,
) -> Result<(), Box<dyn Error>> {
    let data_dir = config.data_dir.clone();
    info!(dir = %data_dir.display(), "creating data directory");
    fs::create_dir_all(&data_dir)?;

    let mut network = load_network(&config, hidden, output)?;
    let snapshots = config.snapshots;
    let mut trainer = Trainer::new(config)?;
    if snapshots {
        trainer = trainer.with_snapshots(PpmSnapshots::new(&data_dir, style));
    }

    let report = trainer.fit(&mut network)?;
    println!(
        "fail rate of untrained model is {:.6}",
        report.initial.fail_rate()
    );
    println!(
        "fail rate of trained model is {:.6} ({} passes, converged: {})",
        report.trained.fail_rate(),
        report.passes,
        report.converged
    );

    // Timing of one more pass of each kind, continuing the check sequence. The
    // extra train pass works on a copy so the saved weights are the fit result.
    let mut scratch = network.clone();
    let extra_train = trainer.train_pass(&mut scratch)?;
    let extra_check = trainer.evaluate_pass(&scratch)?;
    info!(
        elapsed = ?extra_train.elapsed,
        adjusted = extra_train.tally,
        "benchmark train pass"
    );
    info!(
        elapsed = ?extra_check.elapsed,
        failed = extra_check.tally,
        "benchmark check pass"
    );

    if save {
        #[cfg(feature = "json")]
        network.save_json(data_dir.join("network.json"))?;

        let (hidden, output) = network.into_weights();
        for (name, grid) in [("hidden_weights", &hidden), ("output_weights", &output)] {
            store::save_csv(grid, data_dir.join(format!("{name}.csv")))?;
            store::save_bin(grid, data_dir.join(format!("{name}.bin")))?;
            store::save_ppm(grid, data_dir.join(format!("{name}.ppm")), style)?;
            debug!(name, "saved trained weights");
        }
        info!(dir = %data_dir.display(), "saved trained weights");
    }
    Ok(())
}
