use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use image::imageops::FilterType;
use mkico::{AssemblyOptions, IconDir, MaskPolarity};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mkico", version, about = "Builds ICO files from images")]
struct Cli {
    /// Log more detail (repeat for even more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an image into a multi-resolution ICO file.
    Convert(ConvertArgs),
    /// List the entries of an ICO file.
    List(ListArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Source image (any format the `image` crate can decode).
    source: PathBuf,

    /// Output path. Defaults to the source path with an `.ico` extension,
    /// numbered if that file already exists.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated formats, each `WIDTH[xHEIGHT] [BPPbpp] [BMP|PNG]`.
    #[arg(short, long, default_value = "16,32,48,256")]
    formats: String,

    /// Overwrite the output file if it already exists.
    #[arg(long)]
    force: bool,

    /// Which mask bit marks transparent pixels.
    #[arg(long, value_enum, default_value_t = PolarityChoice::TransparentSet)]
    mask_polarity: PolarityChoice,

    /// Resampling filter used when scaling the source.
    #[arg(long, value_enum, default_value_t = FilterChoice::Lanczos3)]
    filter: FilterChoice,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// ICO file to inspect.
    ico: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolarityChoice {
    TransparentSet,
    OpaqueSet,
}

impl From<PolarityChoice> for MaskPolarity {
    fn from(choice: PolarityChoice) -> MaskPolarity {
        match choice {
            PolarityChoice::TransparentSet => MaskPolarity::TransparentSet,
            PolarityChoice::OpaqueSet => MaskPolarity::OpaqueSet,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterChoice {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<FilterChoice> for FilterType {
    fn from(choice: FilterChoice) -> FilterType {
        match choice {
            FilterChoice::Nearest => FilterType::Nearest,
            FilterChoice::Triangle => FilterType::Triangle,
            FilterChoice::CatmullRom => FilterType::CatmullRom,
            FilterChoice::Gaussian => FilterType::Gaussian,
            FilterChoice::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Convert(args) => convert(args),
        Command::List(args) => list(args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn convert(args: ConvertArgs) -> anyhow::Result<()> {
    let output = match args.output {
        Some(path) => path,
        None => mkico::default_output_path(&args.source),
    };
    let options = AssemblyOptions {
        mask_polarity: args.mask_polarity.into(),
        filter: args.filter.into(),
    };
    let icon = mkico::convert_file(
        &args.source,
        &output,
        &args.formats,
        options,
        args.force,
    )
    .with_context(|| {
        format!(
            "failed to convert {} into {}",
            args.source.display(),
            output.display()
        )
    })?;
    println!(
        "Wrote {} ({} entries, {} bytes)",
        output.display(),
        icon.entries().len(),
        icon.encoded_len()
    );
    Ok(())
}

fn list(args: ListArgs) -> anyhow::Result<()> {
    let file = File::open(&args.ico)
        .with_context(|| format!("failed to open {}", args.ico.display()))?;
    let icondir = IconDir::read(BufReader::new(file))
        .with_context(|| format!("failed to read {}", args.ico.display()))?;
    for (index, entry) in icondir.entries().iter().enumerate() {
        let kind = if entry.is_png() { "PNG" } else { "BMP" };
        println!(
            "{:5}: {}x{} {}, {} bpp, {} colors, {} bytes at {}",
            index,
            entry.width(),
            entry.height(),
            kind,
            entry.bits_per_pixel(),
            entry.num_colors(),
            entry.data().len(),
            entry.data_offset()
        );
    }
    Ok(())
}
