//! gradebook CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gradebook", version, about = "Weighted course grade tracker")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Restore a corrupt dataset from its backup without asking
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config, directories and an example outline
    Init,

    /// Create a dataset from a course outline
    Create {
        /// Outline file, or a name in the outlines directory
        outline: String,

        /// Dataset name (default: the outline's file name)
        #[arg(long)]
        name: Option<String>,

        /// Overwrite an existing dataset
        #[arg(long)]
        force: bool,
    },

    /// Check an outline without writing anything
    Validate {
        /// Outline file, or a name in the outlines directory
        outline: String,
    },

    /// List datasets and outlines
    List,

    /// Record or clear one grade
    Grade {
        dataset: String,
        course: String,
        assessment: String,

        /// Attempt number, starting at 1
        number: usize,

        /// Grade in percent, or "none" to clear it
        grade: String,
    },

    /// Per-assessment breakdown of a dataset
    Summary {
        dataset: String,

        /// Only show this course
        course: Option<String>,
    },

    /// Per-course totals of a dataset
    Overview {
        dataset: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show a course's letter scale and where the current grade falls
    Scale { dataset: String, course: String },

    /// Score needed on remaining work to reach a target
    Needed {
        dataset: String,
        course: String,

        /// Target percentage (e.g. 85 or 85%) or a letter from the course scale
        target: String,
    },

    /// Best grade still reachable in a course
    Max { dataset: String, course: String },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gradebook=warn,gradebook_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::Context::for_init(cli.config.as_deref(), cli.yes)
            .and_then(|ctx| commands::init::execute(&ctx)),
        command => commands::Context::load(cli.config.as_deref(), cli.yes)
            .and_then(|ctx| run(&ctx, command)),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(ctx: &commands::Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => commands::init::execute(ctx),
        Commands::Create {
            outline,
            name,
            force,
        } => commands::create::execute(ctx, &outline, name, force),
        Commands::Validate { outline } => commands::validate::execute(ctx, &outline),
        Commands::List => commands::list::execute(ctx),
        Commands::Grade {
            dataset,
            course,
            assessment,
            number,
            grade,
        } => commands::grade::execute(ctx, &dataset, &course, &assessment, number, &grade),
        Commands::Summary { dataset, course } => {
            commands::summary::execute(ctx, &dataset, course.as_deref())
        }
        Commands::Overview { dataset, format } => {
            commands::overview::execute(ctx, &dataset, &format)
        }
        Commands::Scale { dataset, course } => commands::scale::execute(ctx, &dataset, &course),
        Commands::Needed {
            dataset,
            course,
            target,
        } => commands::needed::execute(ctx, &dataset, &course, &target),
        Commands::Max { dataset, course } => commands::max::execute(ctx, &dataset, &course),
    }
}
