use clap::{Parser, Subcommand};
use gallery_sync::imaging::RustBackend;
use gallery_sync::scan::ScanOptions;
use gallery_sync::staleness::RunOptions;
use gallery_sync::{config, driver, output, tree};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "gallery-sync")]
#[command(about = "Incremental static photo gallery generator")]
#[command(long_about = "\
Incremental static photo gallery generator

Your photo directories become a browsable HTML gallery, generated in place.
Every directory gets thumbnails, one page per image, and paginated index
pages. Re-running only redoes what changed.

Gallery structure:

  photos/
  ├── yapa/
  │   ├── root                     # gallery-name=Holiday Photos (marks the root)
  │   ├── config                   # layout and sort options (inherited below)
  │   ├── images                   # image order, one name[@label] per line
  │   ├── directories              # sub-gallery order, same format
  │   ├── thumbnails/              # generated
  │   └── midnails/                # generated
  ├── directory.txt                # description of this directory
  ├── dawn.jpg
  ├── dawn.txt                     # description of dawn.jpg
  ├── ride.gpx                     # GPS track, gets its own page
  └── 2009/
      └── yapa/links               # import images from elsewhere, one path per line

Edit the order files to reorder or relabel; the next sync picks it up.
Files the gallery does not recognise are deleted as scratch.

Run 'gallery-sync gen-config' to print a config file with every option.")]
#[command(version = version_string())]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone, Copy)]
struct ForceArgs {
    /// Regenerate all pages and thumbnails
    #[arg(short, long)]
    force: bool,
    /// Regenerate all html pages
    #[arg(long)]
    force_html: bool,
    /// Regenerate all thumbnails and midnails
    #[arg(long)]
    force_nails: bool,
}

impl ForceArgs {
    fn run_options(self) -> RunOptions {
        RunOptions {
            force_html: self.force || self.force_html,
            force_nails: self.force || self.force_nails,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Bring the gallery containing DIR up to date
    Sync {
        /// A directory inside the gallery (the root is found by walking up)
        dir: PathBuf,
        #[command(flatten)]
        force: ForceArgs,
    },
    /// Show the gallery tree without changing anything
    Scan {
        dir: PathBuf,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config file with all options at their defaults
    GenConfig,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Command::Sync { dir, force } => {
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_sync_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let backend = RustBackend::new();
            let result = driver::sync_gallery(&dir, &backend, force.run_options(), Some(tx));
            printer.join().map_err(|_| "output thread panicked")?;
            let summary = result?;
            tracing::debug!(%summary, "sync finished");
            output::print_summary(&summary);
        }
        Command::Scan { dir, json } => {
            let root = config::find_root_dir(&dir)?.unwrap_or(dir);
            let tree = tree::build_tree(&root, &ScanOptions { dry_run: true })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                output::print_tree(&tree);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_text());
        }
    }

    Ok(())
}
