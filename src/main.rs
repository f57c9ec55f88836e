use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use automatone::audio::{Channels, Envelope, Scale, Waveform};
use automatone::{io, simulate, Automatone, CombineMode, GeneratorConfig, Rule, RuleSelection};

#[derive(Parser)]
#[command(name = "automatone")]
#[command(about = "Music from elementary cellular automata", long_about = None)]
struct Cli {
    /// TOML config file (default: ./automatone.toml if present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a piece to <output-root>/<hash>/audio.wav
    Generate(GenerateArgs),
    /// Print one automaton as text
    Grid {
        #[arg(short, long, default_value = "30")]
        rule: u8,
        #[arg(long, default_value = "64")]
        size: usize,
        #[arg(long, default_value = "32")]
        steps: usize,
        #[arg(long, default_value = "0")]
        skip: usize,
    },
}

/// Every flag overrides the config file; unset flags keep its value.
#[derive(clap::Args)]
struct GenerateArgs {
    /// Rule list like "[30,45]", or a count of rules to pick at random
    #[arg(long)]
    rules: Option<RuleSelection>,
    /// Range of tones in the 12-tone system
    #[arg(long)]
    tone_range: Option<usize>,
    /// Sequence length in time steps
    #[arg(long)]
    sequence_length: Option<usize>,
    /// Initial automaton generations to skip
    #[arg(long)]
    skip: Option<usize>,
    /// Seed for rule choice, first generation and noise
    #[arg(long)]
    seed: Option<u64>,
    /// Grid combination: product or sum
    #[arg(long)]
    combine: Option<CombineMode>,
    /// Audio samples per second
    #[arg(long)]
    sample_rate: Option<u32>,
    /// Seconds between tone onsets
    #[arg(long)]
    interval: Option<f64>,
    /// attack,decay,sustain,level,release (seconds, level in 0..1)
    #[arg(long)]
    adslr: Option<Envelope>,
    /// major, pentatonic or chromatic
    #[arg(long)]
    scale: Option<Scale>,
    /// Frequency of the lowest note in Hz
    #[arg(long)]
    root_frequency: Option<f64>,
    /// Stereo pan (0.0 = left, 0.5 = center, 1.0 = right)
    #[arg(long)]
    pan: Option<f64>,
    /// Relative volume
    #[arg(long)]
    volume: Option<f64>,
    /// sine or square
    #[arg(long)]
    wave: Option<Waveform>,
    /// Gaussian noise mix in 0..1
    #[arg(long)]
    noise_ratio: Option<f64>,
    /// Render two panned channels instead of one
    #[arg(long)]
    stereo: bool,
    /// Keep raw amplitudes instead of scaling the peak to 1.0
    #[arg(long)]
    no_normalize: bool,
    /// Root of the output path
    #[arg(long)]
    output_root: Option<PathBuf>,
}

impl GenerateArgs {
    fn apply(self, config: &mut GeneratorConfig) {
        if let Some(rules) = self.rules {
            config.rules = rules;
        }
        config.tone_range = self.tone_range.unwrap_or(config.tone_range);
        config.sequence_length = self.sequence_length.unwrap_or(config.sequence_length);
        config.skip = self.skip.unwrap_or(config.skip);
        config.seed = self.seed.or(config.seed);
        config.combine = self.combine.unwrap_or(config.combine);
        config.sample_rate = self.sample_rate.unwrap_or(config.sample_rate);
        config.interval = self.interval.unwrap_or(config.interval);
        config.envelope = self.adslr.unwrap_or(config.envelope);
        config.scale = self.scale.unwrap_or(config.scale);
        config.root_frequency = self.root_frequency.unwrap_or(config.root_frequency);
        config.pan = self.pan.unwrap_or(config.pan);
        config.volume = self.volume.unwrap_or(config.volume);
        config.wave = self.wave.unwrap_or(config.wave);
        config.noise_ratio = self.noise_ratio.unwrap_or(config.noise_ratio);
        if let Some(root) = self.output_root {
            config.output_root = root;
        }
        if self.stereo {
            config.channels = Channels::Stereo;
        }
        if self.no_normalize {
            config.normalize = false;
        }
    }
}

fn generate(config: &GeneratorConfig) -> automatone::Result<()> {
    info!("generating automatone...");
    let piece = Automatone::from_config(config)?;
    info!("\n{piece}");

    let audio = piece.render_audio(&config.render_options())?;
    let hash = piece.hash();
    info!("hash: {hash}");

    let dir = io::write_output(&audio, &config.output_root, &hash, &piece.to_string())?;
    info!("wrote {}", dir.display());
    Ok(())
}

fn run(cli: Cli) -> automatone::Result<()> {
    match cli.command {
        Commands::Generate(args) => {
            let mut config = GeneratorConfig::load(cli.config.as_deref())?;
            args.apply(&mut config);
            generate(&config)
        }
        Commands::Grid { rule, size, steps, skip } => {
            print!("{}", simulate(Rule::new(rule), size, steps, skip));
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
