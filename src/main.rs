use clap::Parser;
use omeka_iiif::config::{self, DEFAULT_CONFIG_FILE};
use omeka_iiif::{migrate, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "omeka-iiif")]
#[command(version)]
#[command(about = "Migrate Omeka still images to static IIIF tiles and manifests")]
#[command(long_about = "\
Migrate Omeka still images to static IIIF tiles and manifests

Every item of the configured type becomes a IIIF Presentation 2.1 manifest.
Each of its image files is downloaded, cut into a level-0 tile pyramid keyed
by content hash, and added as a page.

Output (relative to output_dir, default: current directory):

  data/                       Downloaded originals
  images/tiles/<sha256>/      Tiles and info.json per distinct image
  manifests/<item-id>.json    One manifest per item
  manifests/index.json        List of all manifests

The two positional arguments are the whole required interface; --config
is optional and only tunes output location, item type, tiling and HTTP.

Serve the output so that <IIIF_URL>/manifests/... and <IIIF_URL>/images/tiles/...
resolve. Re-running is cheap: downloads and tile sets already on disk are reused.

Set RUST_LOG (e.g. RUST_LOG=debug) for more detailed diagnostics on stderr.")]
struct Cli {
    /// Base URL of the Omeka instance (its API lives under /api)
    omeka_url: String,

    /// Base URL the generated tiles and manifests will be served from
    iiif_url: String,

    /// Config file [default: omeka-iiif.toml if present]
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => config::load_config(path, true)?,
        None => config::load_config(&PathBuf::from(DEFAULT_CONFIG_FILE), false)?,
    };

    let summary = migrate::migrate(&cli.omeka_url, &cli.iiif_url, &config, &mut |event| {
        output::print_migrate_event(event)
    })?;
    output::print_summary(&summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn two_positionals_are_enough() {
        let cli = Cli::try_parse_from(["omeka-iiif", "http://omeka.test", "https://iiif.test"])
            .unwrap();
        assert_eq!(cli.omeka_url, "http://omeka.test");
        assert_eq!(cli.iiif_url, "https://iiif.test");
        assert!(cli.config.is_none());
    }

    #[test]
    fn both_positionals_are_required() {
        assert!(Cli::try_parse_from(["omeka-iiif"]).is_err());
        assert!(Cli::try_parse_from(["omeka-iiif", "http://omeka.test"]).is_err());
    }

    #[test]
    fn config_is_optional_flag() {
        let cli = Cli::try_parse_from([
            "omeka-iiif",
            "--config",
            "alt.toml",
            "http://omeka.test",
            "https://iiif.test",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
    }

    #[test]
    fn help_names_the_required_interface() {
        let help = Cli::command()
            .get_long_about()
            .map(|s| s.to_string())
            .unwrap_or_default();
        assert!(help.contains("two positional arguments are the whole required interface"));
    }
}
