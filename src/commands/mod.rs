use anyhow::{Context, Result, bail};
use log::info;
use serde_json::Value;
use std::path::Path;

use crate::{
    a1,
    sheets::{SheetRef, Spreadsheets},
    table::Table,
    workbook::Workbook,
};

pub mod config;
pub mod services;

/// Prints every worksheet as `<id>\t<title>`.
#[tracing::instrument(skip(workbook))]
pub async fn sheets<S: Spreadsheets>(workbook: &mut Workbook<S>) -> Result<()> {
    for (title, id) in workbook.worksheet_map().await? {
        println!("{}\t{}", id, title);
    }
    Ok(())
}

/// Prints the worksheet as a JSON array of records keyed by header.
#[tracing::instrument(skip(workbook))]
pub async fn show<S: Spreadsheets>(workbook: &mut Workbook<S>, sheet: SheetRef) -> Result<()> {
    let table = workbook.to_table(sheet).await?;
    println!("{}", serde_json::to_string_pretty(&table.to_records())?);
    Ok(())
}

/// Prints the values of one 1-based column, one per line.
#[tracing::instrument(skip(workbook))]
pub async fn column<S: Spreadsheets>(
    workbook: &mut Workbook<S>,
    sheet: SheetRef,
    index: usize,
) -> Result<()> {
    for value in workbook.column_values(sheet, index).await? {
        println!("{}", value);
    }
    Ok(())
}

#[tracing::instrument(skip(workbook))]
pub async fn append<S: Spreadsheets>(
    workbook: &mut Workbook<S>,
    sheet: SheetRef,
    cells: Vec<String>,
) -> Result<()> {
    let row = cells.into_iter().map(Value::String).collect();
    let ws = workbook.append_row(sheet, row).await?;
    info!("Appended a row to '{}'", ws.title());
    Ok(())
}

/// Writes a JSON 2-D array into `range`.
#[tracing::instrument(skip(workbook, values))]
pub async fn update<S: Spreadsheets>(
    workbook: &mut Workbook<S>,
    sheet: SheetRef,
    range: &str,
    values: &str,
) -> Result<()> {
    let values = parse_values(values)?;
    let ws = workbook.update_range(sheet, range, &values).await?;
    info!("Updated {} row(s) of '{}'", values.len(), ws.title());
    Ok(())
}

/// Replaces the worksheet with the table stored in a JSON file.
#[tracing::instrument(skip(workbook))]
pub async fn replace<S: Spreadsheets>(
    workbook: &mut Workbook<S>,
    name: &str,
    path: &Path,
) -> Result<()> {
    let table = read_table(path)?;
    let ws = workbook.replace_with_table(name, &table).await?;
    println!("{}", ws.url());
    Ok(())
}

#[tracing::instrument(skip(workbook))]
pub async fn clear<S: Spreadsheets>(
    workbook: &mut Workbook<S>,
    sheet: SheetRef,
    range: &str,
) -> Result<()> {
    workbook.batch_clear(sheet, range).await
}

#[tracing::instrument(skip(workbook))]
pub async fn clear_filter<S: Spreadsheets>(
    workbook: &mut Workbook<S>,
    sheet: SheetRef,
) -> Result<()> {
    workbook.clear_basic_filter(sheet).await
}

#[tracing::instrument(skip(workbook))]
pub async fn delete_rows<S: Spreadsheets>(
    workbook: &mut Workbook<S>,
    sheet: SheetRef,
    start: usize,
    end: Option<usize>,
) -> Result<()> {
    workbook.delete_rows(sheet, start, end).await
}

/// Prints the workbook URL, or the worksheet URL when a sheet is given.
#[tracing::instrument(skip(workbook))]
pub async fn url<S: Spreadsheets>(
    workbook: &mut Workbook<S>,
    sheet: Option<SheetRef>,
) -> Result<()> {
    let url = match sheet {
        Some(sheet) => workbook.sheet_url(sheet).await?,
        None => workbook.url().to_string(),
    };
    println!("{}", url);
    Ok(())
}

/// Prints the column letter for an index. Needs no workbook.
pub fn column_letter(index: usize, zero_based: bool) -> Result<()> {
    let letter = if zero_based {
        a1::column_letter_zero_based(index)
    } else {
        if index == 0 {
            bail!("Column index is 1-based; use --zero-based for 0");
        }
        a1::column_letter(index)
    };
    println!("{}", letter);
    Ok(())
}

/// Parses a JSON 2-D array. Numbers and booleans are kept as such, `null` becomes an empty cell.
pub fn parse_values(json: &str) -> Result<Vec<Vec<Value>>> {
    let values: Vec<Vec<Value>> =
        serde_json::from_str(json).context("Values must be a JSON array of arrays")?;

    values
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    Value::Null => Ok(Value::String(String::new())),
                    Value::Array(_) | Value::Object(_) => {
                        bail!("Cell values must be strings, numbers or booleans")
                    }
                    scalar => Ok(scalar),
                })
                .collect()
        })
        .collect()
}

/// Reads a `{"columns": [...], "rows": [[...]]}` file.
pub fn read_table(path: &Path) -> Result<Table> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read table file {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid table in {:?}", path))
}
