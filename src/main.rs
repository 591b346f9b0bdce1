use clap::{Parser, Subcommand};
use docmaker::build::{self, BuildError, BuildOptions};
use docmaker::render::markup::MarkupOptions;
use docmaker::{config, output};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "docmaker")]
#[command(about = "Build a single HTML document from templated markdown pages")]
#[command(long_about = "\
Build a single HTML document from templated markdown pages

The project root is the nearest directory (walking up from --dir, $INIT_CWD,
or the working directory) containing docmaker.yaml.

Project structure:

  docs/
  ├── docmaker.yaml        # Config: layout, pages, data, assets
  ├── layout.html          # Outer template; rendered pages arrive as {{ content }}
  ├── pages/
  │   ├── 01-intro.md      # Pages: templated, joined in order, then markdown → HTML
  │   └── 02-usage.md
  ├── data/
  │   └── site.yaml        # Data: merged into the template namespace in order
  └── assets/
      ├── about.liquid     # Template asset → build/about
      └── style.css        # Copied verbatim → build/style.css

Run 'docmaker gen-config' to print a documented docmaker.yaml.")]
#[command(version)]
struct Cli {
    /// Directory to start searching for docmaker.yaml from
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Render pages and layout into the build directory and process assets
    Build(BuildArgs),
    /// Resolve the config and load data without writing anything
    Check,
    /// Print a stock docmaker.yaml with all options documented
    GenConfig,
}

#[derive(clap::Args, Clone, Default)]
struct BuildArgs {
    /// Remove the build directory before writing
    #[arg(long)]
    clean: bool,

    /// Deepest heading level listed in the table of contents
    #[arg(long, default_value_t = 2)]
    toc_depth: u8,

    /// Leave mermaid code blocks as highlighted code
    #[arg(long)]
    no_diagrams: bool,

    /// Disable footnote syntax
    #[arg(long)]
    no_footnotes: bool,
}

impl BuildArgs {
    fn markup(&self) -> MarkupOptions {
        MarkupOptions {
            toc_depth: self.toc_depth,
            diagrams: !self.no_diagrams,
            footnotes: !self.no_footnotes,
            ..MarkupOptions::default()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BuildError> {
    let command = cli.command.unwrap_or(Command::Build(BuildArgs {
        toc_depth: MarkupOptions::default().toc_depth,
        ..BuildArgs::default()
    }));

    match command {
        Command::Build(args) => {
            let options = BuildOptions {
                start_dir: cli.dir,
                clean: args.clean,
                markup: args.markup(),
            };
            let report = build::build(&options)?;
            output::print_build_output(&report);
            println!("==> Build complete: {}", report.build_dir.display());
        }
        Command::Check => {
            let options = BuildOptions {
                start_dir: cli.dir,
                ..BuildOptions::default()
            };
            let report = build::check(&options)?;
            println!("==> Checking {}", report.config.root.display());
            output::print_check_output(&report);
            println!("==> Project is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_yaml());
        }
    }

    Ok(())
}

/// Authoring mistakes get a one-line message; anything else gets the full
/// error with its cause chain.
fn report_error(err: &BuildError) {
    if err.is_user_facing() {
        eprintln!("error: {err}");
        return;
    }

    eprintln!("error: {err:?}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
