//! Console stand-ins for the grid widget and the dialog layer

use std::sync::Arc;
use arrow::datatypes::DataType;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use gv_core::{CellValue, Column, Row};
use gv_view::{DialogPresenter, GridActions, RetryRequest};

/// Stdin shared by the command loop and the retry prompt
pub type SharedInput = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> SharedInput {
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()))
}

/// Read one line, `None` on end of input
pub async fn read_line(input: &SharedInput) -> Option<String> {
    input.lock().await.next_line().await.ok().flatten()
}

/// Prints the notifications a grid widget would receive
pub struct ConsoleWidget;

impl GridActions for ConsoleWidget {
    fn change_chunk_size(&self, chunk_size: usize) {
        println!("[grid] chunk size is now {}", chunk_size);
    }
    
    fn reset_data(&self) {
        println!("[grid] all rows dropped");
    }
    
    fn update_row_value(&self, row_index: usize, row: &Row) {
        println!("[grid] row {} -> {}", row_index, format_row(row));
    }
}

/// Asks on the terminal whether to retry a failed save
pub struct ConsoleDialog {
    input: SharedInput,
}

impl ConsoleDialog {
    pub fn new(input: SharedInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl DialogPresenter for ConsoleDialog {
    async fn confirm_retry(&self, request: &RetryRequest) -> bool {
        println!("Save failed: {}", request.message);
        loop {
            if request.can_show_details() {
                println!("Retry? [y/n/d(etails)]");
            } else {
                println!("Retry? [y/n]");
            }
            
            let Some(answer) = read_line(&self.input).await else {
                return false;
            };
            match answer.trim() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                "d" | "details" => {
                    if let Some(detail) = &request.details {
                        self.show_details(&request.message, detail);
                    }
                }
                _ => {}
            }
        }
    }
    
    fn show_details(&self, message: &str, detail: &serde_json::Value) {
        println!("{}", message);
        match serde_json::to_string_pretty(detail) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", detail),
        }
    }
}

pub fn format_row(row: &Row) -> String {
    row.iter()
        .map(|cell| cell.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn print_window(offset: usize, columns: &[Column], rows: &[Row]) {
    let header = columns.iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    println!("#     {}", header);
    for (i, row) in rows.iter().enumerate() {
        println!("{:<5} {}", offset + i, format_row(row));
    }
}

/// Parse user input into a cell of the given column type
pub fn parse_value(text: &str, data_type: &DataType) -> Result<CellValue, String> {
    if text.eq_ignore_ascii_case("null") {
        return Ok(CellValue::Null);
    }
    match data_type {
        DataType::Int64 => text.parse::<i64>()
            .map(CellValue::Int)
            .map_err(|e| format!("'{}' is not an integer: {}", text, e)),
        DataType::Float64 => text.parse::<f64>()
            .map(CellValue::Float)
            .map_err(|e| format!("'{}' is not a number: {}", text, e)),
        DataType::Boolean => match text.to_lowercase().as_str() {
            "true" | "1" => Ok(CellValue::Bool(true)),
            "false" | "0" => Ok(CellValue::Bool(false)),
            _ => Err(format!("'{}' is not a boolean", text)),
        },
        _ => Ok(CellValue::from(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42", &DataType::Int64), Ok(CellValue::Int(42)));
        assert_eq!(parse_value("NULL", &DataType::Int64), Ok(CellValue::Null));
        assert_eq!(parse_value("0", &DataType::Boolean), Ok(CellValue::Bool(false)));
        assert_eq!(parse_value("2.5", &DataType::Float64), Ok(CellValue::Float(2.5)));
        assert_eq!(parse_value("abc", &DataType::Utf8), Ok(CellValue::from("abc")));
        assert!(parse_value("abc", &DataType::Int64).is_err());
    }
}
