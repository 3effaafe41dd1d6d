use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use pixelfont::FontVariant;

/// Build pixel fonts from a YAML glyph database
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Glyph data: a YAML file, or a directory of YAML files merged in name order
    input: PathBuf,

    /// Directory to write the fonts into
    #[arg(default_value = ".")]
    output_dir: PathBuf,

    /// Only build these variants (may be repeated)
    #[arg(long = "variant", value_enum)]
    variants: Vec<FontVariant>,

    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();

    if !args.input.exists() {
        log::error!("Input not found: {}", args.input.display());
        std::process::exit(1);
    }
    let variants = if args.variants.is_empty() {
        FontVariant::ALL.to_vec()
    } else {
        args.variants
    };

    let before = std::time::Instant::now();
    let result = pixelfont::load(&args.input).and_then(|data| {
        std::fs::create_dir_all(&args.output_dir)?;
        pixelfont::build_all(&data, &args.output_dir, &variants)
    });
    match result {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
            log::info!("Built {} fonts in {:.2?}", variants.len(), before.elapsed());
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
