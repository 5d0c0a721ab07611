use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use fintrack::core::entry::EntryKind;
use fintrack::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Category {
    Income,
    Expense,
}

impl From<Category> for EntryKind {
    fn from(category: Category) -> EntryKind {
        match category {
            Category::Income => EntryKind::Income,
            Category::Expense => EntryKind::Expense,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record an income entry
    Add {
        /// Amount, e.g. 150.00 or 1.234,56
        amount: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Record an expense entry
    Spend {
        /// Amount, e.g. 150.00 or 1.234,56
        amount: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List entries, newest first
    List {
        /// Which table to list; defaults to income
        #[arg(value_enum)]
        category: Option<Category>,
    },
    /// Change an entry's amount or description
    Edit {
        #[arg(value_enum)]
        category: Category,
        id: u64,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete an entry
    Remove {
        #[arg(value_enum)]
        category: Category,
        id: u64,
    },
    /// Show balances and the current exchange rate
    Summary,
}

impl From<Commands> for fintrack::AppCommand {
    fn from(cmd: Commands) -> fintrack::AppCommand {
        match cmd {
            Commands::Add {
                amount,
                description,
            } => fintrack::AppCommand::Add {
                kind: EntryKind::Income,
                amount,
                description,
            },
            Commands::Spend {
                amount,
                description,
            } => fintrack::AppCommand::Add {
                kind: EntryKind::Expense,
                amount,
                description,
            },
            Commands::List { category } => fintrack::AppCommand::List {
                kind: category.unwrap_or(Category::Income).into(),
            },
            Commands::Edit {
                category,
                id,
                amount,
                description,
            } => fintrack::AppCommand::Edit {
                kind: category.into(),
                id,
                amount,
                description,
            },
            Commands::Remove { category, id } => fintrack::AppCommand::Remove {
                kind: category.into(),
                id,
            },
            Commands::Summary => fintrack::AppCommand::Summary,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(cmd) => fintrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
