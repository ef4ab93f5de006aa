//! Console front end for the grid view-model

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gv_core::events::events::{ChangesCommitted, ChangesReverted};
use gv_core::GridConfig;
use gv_data::SqliteSource;
use gv_view::GridViewModel;

mod console;
mod create_sample_db;

use console::{parse_value, print_window, read_line, ConsoleDialog, ConsoleWidget};

const HELP: &str = "\
commands:
  show [OFFSET [COUNT]]   show a window of rows
  edit ROW COL VALUE      edit a cell (VALUE may be 'null')
  pending                 list pending edits
  commit                  save pending edits
  cancel                  discard pending edits
  chunk N                 set the window size
  details                 show details of the last error
  refresh                 drop everything and reload
  quit";

/// Command-line options
struct Options {
    database: Option<PathBuf>,
    table: String,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        database: None,
        table: "sensor_telemetry".to_string(),
        config: None,
    };
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a file path")?;
                options.config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("usage: gridview [DATABASE TABLE] [--config FILE]\n\n{}", HELP);
                std::process::exit(0);
            }
            _ => positional.push(arg),
        }
    }
    
    match positional.len() {
        0 => {}
        2 => {
            options.database = Some(PathBuf::from(&positional[0]));
            options.table = positional[1].clone();
        }
        _ => bail!("expected DATABASE and TABLE, got {} arguments", positional.len()),
    }
    Ok(options)
}

fn load_config(path: Option<&PathBuf>) -> Result<GridConfig> {
    let Some(path) = path else {
        return Ok(GridConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    GridConfig::from_json_str(&text)
        .with_context(|| format!("Invalid config {:?}", path))
}

fn open_source(options: &Options) -> Result<SqliteSource> {
    match &options.database {
        Some(path) => {
            info!("Opening SQLite table: {} from {:?}", options.table, path);
            Ok(SqliteSource::open(path, options.table.clone())?)
        }
        None => {
            info!("No database given, using generated sample data");
            let conn = create_sample_db::create_sample_database(1_000)
                .context("Failed to create sample database")?;
            Ok(SqliteSource::from_connection(conn, options.table.clone())?)
        }
    }
}

async fn show(view_model: &GridViewModel, offset: usize, count: usize) {
    match view_model.request_window(offset, count).await {
        Ok(window) => {
            print_window(offset, &window.columns, &window.rows);
            if window.is_fully_loaded {
                println!("(all rows loaded)");
            }
        }
        Err(e) => error!("Failed to load rows: {}", e),
    }
    if let Some(status) = view_model.status_line() {
        println!("{}", status);
    }
}

fn edit(view_model: &GridViewModel, args: &[&str]) -> Result<()> {
    let [row, column, value @ ..] = args else {
        bail!("usage: edit ROW COL VALUE");
    };
    let row: usize = row.parse().context("ROW must be a number")?;
    let column: usize = column.parse().context("COL must be a number")?;
    let value = value.join(" ");
    
    let columns = view_model.columns();
    let data_type = columns.get(column)
        .map(|c| c.data_type.clone())
        .context("no such column")?;
    let cell = parse_value(&value, &data_type).map_err(anyhow::Error::msg)?;
    
    view_model.edit_cell_value(row, column, cell)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    
    let options = parse_args()?;
    let config = load_config(options.config.as_ref())?;
    let source = open_source(&options)?;
    
    let input = console::stdin_lines();
    let view_model = GridViewModel::new(
        Arc::new(source),
        Arc::new(ConsoleDialog::new(input.clone())),
        config,
    );
    view_model.attach_widget(Arc::new(ConsoleWidget));
    view_model.events().subscribe(|event: &ChangesCommitted| {
        println!("Committed rows {:?}", event.row_indices);
    });
    view_model.events().subscribe(|event: &ChangesReverted| {
        println!("Reverted rows {:?}", event.row_indices);
    });
    
    info!("Starting grid view");
    let chunk_size = view_model.state().chunk_size;
    show(&view_model, 0, chunk_size.min(20)).await;
    println!("{}", HELP);
    
    while let Some(line) = read_line(&input).await {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((command, args)) = parts.split_first() else {
            continue;
        };
        
        match *command {
            "show" => {
                let offset = args.first().and_then(|a| a.parse().ok()).unwrap_or(0);
                let count = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(20);
                show(&view_model, offset, count).await;
            }
            "edit" => {
                if let Err(e) = edit(&view_model, args) {
                    println!("{}", e);
                }
            }
            "pending" => {
                for diff in view_model.pending_changes() {
                    println!(
                        "row {} (columns {:?}): {}",
                        diff.row_index,
                        diff.changed_columns(),
                        console::format_row(&diff.edited)
                    );
                }
            }
            "commit" => match view_model.commit_changes().await {
                Ok(outcome) => println!("{:?}", outcome),
                Err(e) => error!("Commit aborted: {}", e),
            },
            "cancel" => println!("Discarded {} changed rows", view_model.cancel_changes()),
            "chunk" => match args.first().and_then(|a| a.parse().ok()) {
                Some(n) => {
                    view_model.set_chunk_size(n);
                }
                None => println!("usage: chunk N"),
            },
            "details" => {
                if !view_model.show_error_details() {
                    println!("No error details");
                }
            }
            "refresh" => {
                view_model.refresh();
                let chunk_size = view_model.state().chunk_size;
                show(&view_model, 0, chunk_size.min(20)).await;
            }
            "quit" | "exit" => break,
            _ => println!("{}", HELP),
        }
    }
    
    Ok(())
}
