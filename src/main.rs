use anyhow::{Context, Result, bail};
use clap::Parser;
use sheetwrap::commands::{self, config::Config, services::open_workbook};
use sheetwrap::sheets::SheetRef;
use std::path::PathBuf;
use std::str::FromStr;

/// sheetwrap - Google Sheets from the command line
///
/// Read and write worksheets of a spreadsheet. Every remote call is retried on
/// rate limiting, service outages and malformed responses.
///
/// The OAuth access token is read from GOOGLE_OAUTH_TOKEN when --token is not given.
///
/// Sheets are selected by name (case-insensitive) or by id with `id:<n>`.
///
/// Examples:
///   sheetwrap -w Budget sheets              # List worksheets
///   sheetwrap -w Budget show Data           # Print a worksheet as JSON records
///   sheetwrap -w Budget append Data a b c   # Append a row
#[derive(Parser, Debug)]
#[command(author, version = env!("SHEETWRAP_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Spreadsheet title (also via SHEETWRAP_WORKBOOK)
    #[arg(
        long,
        short = 'w',
        env = "SHEETWRAP_WORKBOOK",
        value_name = "TITLE",
        global = true
    )]
    workbook: Option<String>,

    /// Spreadsheet id, instead of a title (also via SHEETWRAP_KEY)
    #[arg(long, env = "SHEETWRAP_KEY", value_name = "ID", global = true)]
    key: Option<String>,

    /// OAuth access token
    #[arg(
        long,
        env = "GOOGLE_OAUTH_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    token: Option<String>,

    /// Sheets API URL (defaults to https://sheets.googleapis.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Drive API URL, used to find spreadsheets by title (defaults to https://www.googleapis.com)
    #[arg(long = "drive-url", value_name = "URL", global = true)]
    drive_url: Option<String>,

    /// Maximum attempts per remote call
    #[arg(
        long = "max-attempts",
        env = "SHEETWRAP_MAX_ATTEMPTS",
        value_name = "N",
        global = true
    )]
    max_attempts: Option<usize>,

    /// Seconds to wait between attempts
    #[arg(
        long = "retry-delay",
        env = "SHEETWRAP_RETRY_DELAY",
        value_name = "SECONDS",
        global = true
    )]
    retry_delay: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Workbook(WorkbookCommand),

    /// Convert a column index to its letter label
    ColumnLetter(ColumnLetterArgs),
}

#[derive(clap::Subcommand, Debug)]
enum WorkbookCommand {
    /// List worksheets with their ids
    Sheets,

    /// Print a worksheet as JSON records keyed by its header row
    Show(SheetArgs),

    /// Print the values of one column
    Column(ColumnArgs),

    /// Append a row after the last non-empty row
    Append(AppendArgs),

    /// Write a JSON 2-D array into a range
    Update(UpdateArgs),

    /// Replace a worksheet with a JSON table file
    Replace(ReplaceArgs),

    /// Clear the values of a range, keeping formatting
    Clear(ClearArgs),

    /// Remove a worksheet's basic filter
    ClearFilter(SheetArgs),

    /// Delete a span of rows (1-based, inclusive)
    DeleteRows(DeleteRowsArgs),

    /// Print the browser URL of the workbook or one worksheet
    Url(UrlArgs),
}

#[derive(clap::Args, Debug)]
struct SheetArgs {
    /// Worksheet name, or `id:<n>`
    #[arg(value_name = "SHEET", value_parser = SheetRef::from_str)]
    sheet: SheetRef,
}

#[derive(clap::Args, Debug)]
struct ColumnArgs {
    #[arg(value_name = "SHEET", value_parser = SheetRef::from_str)]
    sheet: SheetRef,

    /// 1-based column index
    #[arg(value_name = "INDEX")]
    index: usize,
}

#[derive(clap::Args, Debug)]
struct AppendArgs {
    #[arg(value_name = "SHEET", value_parser = SheetRef::from_str)]
    sheet: SheetRef,

    /// Cell values, left to right
    #[arg(value_name = "VALUE", required = true)]
    values: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct UpdateArgs {
    #[arg(value_name = "SHEET", value_parser = SheetRef::from_str)]
    sheet: SheetRef,

    /// Range in A1 notation, e.g. A2:C3
    #[arg(value_name = "RANGE")]
    range: String,

    /// JSON 2-D array, e.g. '[["a", 1], ["b", 2]]'
    #[arg(value_name = "JSON", conflicts_with = "file", required_unless_present = "file")]
    values: Option<String>,

    /// Read the JSON array from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct ReplaceArgs {
    /// Worksheet name
    #[arg(value_name = "SHEET")]
    sheet: String,

    /// JSON file with `columns` and `rows`
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

#[derive(clap::Args, Debug)]
struct ClearArgs {
    #[arg(value_name = "SHEET", value_parser = SheetRef::from_str)]
    sheet: SheetRef,

    /// Range in A1 notation
    #[arg(value_name = "RANGE")]
    range: String,
}

#[derive(clap::Args, Debug)]
struct DeleteRowsArgs {
    #[arg(value_name = "SHEET", value_parser = SheetRef::from_str)]
    sheet: SheetRef,

    /// First row to delete
    #[arg(value_name = "START")]
    start: usize,

    /// Last row to delete; only START when omitted
    #[arg(value_name = "END")]
    end: Option<usize>,
}

#[derive(clap::Args, Debug)]
struct UrlArgs {
    /// Worksheet name, or `id:<n>`; the workbook URL when omitted
    #[arg(value_name = "SHEET", value_parser = SheetRef::from_str)]
    sheet: Option<SheetRef>,
}

#[derive(clap::Args, Debug)]
struct ColumnLetterArgs {
    #[arg(value_name = "INDEX")]
    index: usize,

    /// Treat the index as 0-based
    #[arg(long)]
    zero_based: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::ColumnLetter(args) => {
            return commands::column_letter(args.index, args.zero_based);
        }
        Commands::Workbook(command) => command,
    };

    let config = Config::new(
        cli.workbook,
        cli.key,
        cli.token,
        cli.api_url,
        cli.drive_url,
        cli.max_attempts,
        cli.retry_delay,
    )?;
    let mut workbook = open_workbook(&config).await?;

    match command {
        WorkbookCommand::Sheets => commands::sheets(&mut workbook).await?,
        WorkbookCommand::Show(args) => commands::show(&mut workbook, args.sheet).await?,
        WorkbookCommand::Column(args) => {
            commands::column(&mut workbook, args.sheet, args.index).await?
        }
        WorkbookCommand::Append(args) => {
            commands::append(&mut workbook, args.sheet, args.values).await?
        }
        WorkbookCommand::Update(args) => {
            let values = match (args.values, args.file) {
                (Some(values), _) => values,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read values file {:?}", path))?,
                (None, None) => bail!("Pass the values as JSON or with --file"),
            };
            commands::update(&mut workbook, args.sheet, &args.range, &values).await?
        }
        WorkbookCommand::Replace(args) => {
            commands::replace(&mut workbook, &args.sheet, &args.path).await?
        }
        WorkbookCommand::Clear(args) => {
            commands::clear(&mut workbook, args.sheet, &args.range).await?
        }
        WorkbookCommand::ClearFilter(args) => {
            commands::clear_filter(&mut workbook, args.sheet).await?
        }
        WorkbookCommand::DeleteRows(args) => {
            commands::delete_rows(&mut workbook, args.sheet, args.start, args.end).await?
        }
        WorkbookCommand::Url(args) => commands::url(&mut workbook, args.sheet).await?,
    }
    Ok(())
}
