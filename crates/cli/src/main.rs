// textgrid CLI - headless editing of tables embedded in text documents

mod exit_codes;
mod ops;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use textgrid_config::SettingsStore;

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "tgrid")]
#[command(about = "Headless editor for pipe-delimited tables in text documents")]
#[command(version)]
struct Cli {
    /// Settings store location (default: the user config dir)
    #[arg(long, global = true, env = "TEXTGRID_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a table file and print its canonical form
    Show { file: PathBuf },

    /// Re-pad a table file to canonical column widths
    Fmt {
        file: PathBuf,

        /// Rewrite the file instead of printing
        #[arg(long)]
        write: bool,
    },

    /// Parse a table file and verify the model invariants
    Check { file: PathBuf },

    /// Replace one cell's content (0-based row and column indexes)
    Set {
        file: PathBuf,
        row: usize,
        col: usize,
        content: String,
    },

    /// Append an empty row
    AddRow { file: PathBuf },

    /// Append an empty text column
    AddCol { file: PathBuf },

    /// Delete the row at a 0-based index
    DelRow { file: PathBuf, index: usize },

    /// Delete the column at a 0-based index
    DelCol { file: PathBuf, index: usize },

    /// Move a column between 0-based positions
    MoveCol {
        file: PathBuf,
        from: usize,
        to: usize,
    },

    /// Export the table as versioned JSON
    ExportJson {
        file: PathBuf,

        /// Output path (default: the table file with a .json extension)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut store = match &cli.settings {
        Some(path) => SettingsStore::load_from(path),
        None => SettingsStore::load(),
    };

    let result = match &cli.command {
        Commands::Show { file } => ops::show(file, &store),
        Commands::Fmt { file, write } => ops::fmt(file, *write, &mut store),
        Commands::Check { file } => ops::check(file, &store),
        Commands::Set {
            file,
            row,
            col,
            content,
        } => ops::set_cell(file, *row, *col, content, &mut store),
        Commands::AddRow { file } => ops::add_row(file, &mut store),
        Commands::AddCol { file } => ops::add_col(file, &mut store),
        Commands::DelRow { file, index } => ops::del_row(file, *index, &mut store),
        Commands::DelCol { file, index } => ops::del_col(file, *index, &mut store),
        Commands::MoveCol { file, from, to } => ops::move_col(file, *from, *to, &mut store),
        Commands::ExportJson { file, output } => {
            ops::export_json(file, output.as_deref(), &store)
        }
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
