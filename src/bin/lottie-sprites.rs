use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use lottie_sprites::{
    AnimationDescriptor, FrameMapping, ResampleSpec, ValidationReport, entry_name, validate,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  lottie-sprites info coin.json --json\n  lottie-sprites plan coin.json --fps 12 --scale 0.5\n  lottie-sprites plan coin.json --width 128 --prefix coin --json\n  lottie-sprites completions zsh > _lottie-sprites";

#[derive(Debug, Parser)]
#[command(
    name = "lottie-sprites",
    version,
    about = "Inspect Lottie animations and plan sprite-frame resampling",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print animation facts and a validation report.
    #[command(
        about = "Print animation metadata",
        visible_alias = "inspect",
        after_help = "Examples:\n  lottie-sprites info coin.json\n  lottie-sprites info coin.json --json"
    )]
    Info {
        /// Lottie JSON file.
        input: String,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve output size and frame count and print the frame mapping.
    #[command(
        about = "Print the resample plan",
        after_help = "Examples:\n  lottie-sprites plan coin.json --fps 12\n  lottie-sprites plan coin.json --height 64 --json"
    )]
    Plan {
        /// Lottie JSON file.
        input: String,
        /// Output frame rate (defaults to the source frame rate).
        #[arg(long)]
        fps: Option<f64>,
        /// Output scale relative to the canvas.
        #[arg(long, conflicts_with_all = ["width", "height"])]
        scale: Option<f64>,
        /// Output width; height follows the aspect ratio.
        #[arg(long, conflicts_with = "height")]
        width: Option<u32>,
        /// Output height; width follows the aspect ratio.
        #[arg(long)]
        height: Option<u32>,
        /// Archive entry prefix.
        #[arg(long, default_value = "sprite")]
        prefix: String,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) {
    let level = if global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn resolve_spec(
    descriptor: &AnimationDescriptor,
    fps: Option<f64>,
    scale: Option<f64>,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<ResampleSpec, Box<dyn std::error::Error>> {
    let mut spec = ResampleSpec::for_descriptor(descriptor);
    if let Some(scale) = scale {
        spec.set_scale(descriptor, scale)?;
    }
    if let Some(width) = width {
        spec.set_width(descriptor, width)?;
    }
    if let Some(height) = height {
        spec.set_height(descriptor, height)?;
    }
    if let Some(fps) = fps {
        spec.set_frame_rate(descriptor, fps)?;
    }
    Ok(spec)
}

fn print_report(report: &ValidationReport) {
    for item in &report.info {
        println!("{} {item}", "info:".cyan().bold());
    }
    for item in &report.warnings {
        println!("{} {}", "warning:".yellow().bold(), item.yellow());
    }
    for item in &report.errors {
        println!("{} {}", "error:".red().bold(), item.red());
    }
}

fn mapping_rows(mapping: &FrameMapping, prefix: &str) -> Vec<serde_json::Value> {
    mapping
        .iter()
        .map(|(output, source)| {
            json!({
                "output": output,
                "source": source,
                "entry": entry_name(prefix, output),
            })
        })
        .collect()
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Info { input, json } => {
            let descriptor = AnimationDescriptor::from_path(&input)?;
            let report = descriptor.validate();
            if json {
                let payload = json!({
                    "source": descriptor.source_url,
                    "width": descriptor.intrinsic_width,
                    "height": descriptor.intrinsic_height,
                    "fps": descriptor.source_frame_rate,
                    "frame_count": descriptor.source_frame_count,
                    "duration_seconds": descriptor.duration_secs(),
                    "valid": report.is_valid(),
                    "warnings": report.warnings,
                    "errors": report.errors,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Source: {}", descriptor.source_url);
                println!(
                    "Canvas: {}x{}",
                    descriptor.intrinsic_width, descriptor.intrinsic_height
                );
                println!(
                    "Frames: {} @ {:.2} fps ({:.3}s)",
                    descriptor.source_frame_count,
                    descriptor.source_frame_rate,
                    descriptor.duration_secs(),
                );
                print_report(&report);
            }
        }
        Commands::Plan {
            input,
            fps,
            scale,
            width,
            height,
            prefix,
            json,
        } => {
            let descriptor = AnimationDescriptor::from_path(&input)?;
            let spec = resolve_spec(&descriptor, fps, scale, width, height)?;
            let mapping = spec.mapping(&descriptor);
            let report = validate(&descriptor, &spec);

            if json {
                let payload = json!({
                    "source": descriptor.source_url,
                    "width": spec.output_width,
                    "height": spec.output_height,
                    "scale": spec.scale,
                    "fps": spec.target_frame_rate,
                    "frame_count": spec.target_frame_count,
                    "preview_interval_ms": spec.preview_interval().as_secs_f64() * 1000.0,
                    "valid": report.is_valid(),
                    "mapping": mapping_rows(&mapping, &prefix),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_report(&report);
                for (output, source) in mapping.iter() {
                    println!(
                        "{:>6} <- {:<6} {}",
                        output,
                        source,
                        entry_name(&prefix, output).dimmed()
                    );
                }
            }

            if !report.is_valid() {
                return Err("resample plan has no output frames".into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "lottie-sprites", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
