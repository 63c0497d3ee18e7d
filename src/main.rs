use clap::{Args, Parser, Subcommand};
use rendition_keys::config::{self, VariantConfig};
use rendition_keys::format::{MagicSniffer, classify_stream};
use rendition_keys::paths::PathBuilder;
use rendition_keys::registry::RenditionKeyRegistry;
use rendition_keys::size_key::{RenditionKeySet, validate_size_key_set};
use rendition_keys::stored::{ImageContext, StoredImage};
use rendition_keys::url_set::{absolute_url_fn, build_url_set};
use rendition_keys::{output, plan};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rendition-keys")]
#[command(version)]
#[command(about = "Name, locate and resolve image variants from size keys")]
#[command(long_about = "\
Name, locate and resolve image variants from size keys

A size key is a chain of capabilities separated by double underscores,
ending in 'url' or a WIDTHxHEIGHT token:

  url                              original image
  crop__400x400                    400x400 crop
  thumbnail__100x100               100x100 thumbnail
  filters__invert__url             inverted copy
  filters__invert__crop__400x400   crop of the inverted copy

Named sets of [label, size key] pairs live under [rendition_key_sets] in
config.toml. Run 'rendition-keys gen-config' for a documented config.")]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Log resolution details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Where the size keys for a command come from.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct SizesArgs {
    /// Named rendition key set from config.toml
    #[arg(long)]
    set: Option<String>,

    /// Inline LABEL=SIZE_KEY pair (repeatable)
    #[arg(long = "size", value_parser = parse_label_pair)]
    sizes: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate every rendition key set in config.toml
    Check,
    /// Print the storage path of a sized variant
    Sized {
        /// Storage path of the original image
        path: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Filename key, e.g. crop or thumbnail
        #[arg(long)]
        key: String,
    },
    /// Print the storage path of a filtered variant
    Filtered {
        /// Storage path of the original image
        path: String,
        /// Filter name, e.g. invert
        #[arg(long)]
        key: String,
    },
    /// Resolve size keys to URLs for one image and print them as JSON
    Urls {
        /// Storage path of the image (empty string for a missing image)
        image: String,
        #[command(flatten)]
        sizes: SizesArgs,
        /// Base URL for absolute URLs, e.g. https://example.com/
        #[arg(long)]
        base: Option<url::Url>,
    },
    /// List every variant a rendition key set needs for a directory of originals
    Plan {
        /// Storage root holding the originals
        root: PathBuf,
        #[command(flatten)]
        sizes: SizesArgs,
    },
    /// Print the detected format of a file
    Sniff { file: PathBuf },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn parse_label_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(label, key)| (label.to_string(), key.to_string()))
        .ok_or_else(|| format!("expected LABEL=SIZE_KEY, got '{raw}'"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let load_config = || config::load_config(&cli.config);

    match cli.command {
        Command::Check => {
            let config = load_config()?;
            let registry = RenditionKeyRegistry::from_config(&config);
            let results = registry.check_all();
            output::print_check_output(&results);
            if results.iter().any(|(_, result)| result.is_err()) {
                return Err("invalid rendition key sets in config".into());
            }
        }
        Command::Sized {
            path,
            width,
            height,
            key,
        } => {
            let paths = PathBuilder::from_config(&load_config()?);
            println!("{}", paths.sized_path(&path, width, height, &key));
        }
        Command::Filtered { path, key } => {
            let paths = PathBuilder::from_config(&load_config()?);
            println!("{}", paths.filtered_path(&path, &key));
        }
        Command::Urls { image, sizes, base } => {
            let config = load_config()?;
            let set = resolve_sizes(&config, sizes)?;
            let image = StoredImage::new(image, Arc::new(ImageContext::from_config(&config)));
            let rewrite = base.map(absolute_url_fn);
            let absolute: Option<&dyn Fn(&str) -> String> = match &rewrite {
                Some(rewrite) => Some(rewrite),
                None => None,
            };
            let urls = build_url_set(&image, set.pairs(), absolute)?;
            println!("{}", output::format_url_set(&urls));
        }
        Command::Plan { root, sizes } => {
            let config = load_config()?;
            let set = resolve_sizes(&config, sizes)?;
            let plans = plan::plan_directory(&root, &set, &config, &MagicSniffer)?;
            output::print_plan_output(&plans);
        }
        Command::Sniff { file } => {
            let mut stream = std::fs::File::open(&file)?;
            let (format, mime_type) = classify_stream(&MagicSniffer, &mut stream)?;
            println!("{}: {} ({})", file.display(), format, mime_type);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// The rendition key set selected by `--set` or built from `--size` pairs.
fn resolve_sizes(
    config: &VariantConfig,
    sizes: SizesArgs,
) -> Result<RenditionKeySet, Box<dyn std::error::Error>> {
    match sizes.set {
        Some(name) => Ok(RenditionKeyRegistry::from_config(config).get(&name)?.clone()),
        None => Ok(validate_size_key_set(sizes.sizes)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_label_pair_splits_on_first_equals() {
        assert_eq!(
            parse_label_pair("small=thumbnail__100x100").unwrap(),
            ("small".to_string(), "thumbnail__100x100".to_string())
        );
        assert!(parse_label_pair("no-equals").is_err());
    }

    #[test]
    fn urls_accepts_inline_sizes() {
        let cli = Cli::try_parse_from([
            "rendition-keys",
            "urls",
            "photos/cat.jpg",
            "--size",
            "full=url",
            "--size",
            "small=crop__10x10",
        ])
        .unwrap();
        match cli.command {
            Command::Urls { sizes, .. } => assert_eq!(sizes.sizes.len(), 2),
            _ => panic!("expected urls command"),
        }
    }

    #[test]
    fn urls_rejects_set_and_sizes_together() {
        let result = Cli::try_parse_from([
            "rendition-keys",
            "urls",
            "cat.jpg",
            "--set",
            "headshot",
            "--size",
            "full=url",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn default_config_loads_for_sized_command() {
        let config = VariantConfig::default();
        let paths = PathBuilder::from_config(&config);
        assert_eq!(
            paths.sized_path("cat.jpg", 10, 10, "crop"),
            "__sized__/cat-crop-10x10-70.jpg"
        );
    }
}
