//! Spreadsheet service contract and tools.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;

use aide_agent::error::Result;
use aide_agent::tool::{optional_u64, require_str, Tool, ToolDefinition};

/// Errors from a spreadsheet backend.
#[derive(Error, Debug)]
pub enum SheetError {
    /// No sheet with the given id.
    #[error("sheet not found: {0}")]
    NotFound(String),

    /// The backend failed.
    #[error("sheet service error: {0}")]
    Service(String),
}

/// External spreadsheet backend contract. Rows are 1-indexed.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Read rows `row_start..=row_end` of a sheet.
    async fn read_rows(
        &self,
        sheet_id: &str,
        row_start: usize,
        row_end: usize,
    ) -> std::result::Result<Vec<Vec<String>>, SheetError>;

    /// Append one row and return its 1-indexed row number.
    async fn append_row(
        &self,
        sheet_id: &str,
        row: Vec<String>,
    ) -> std::result::Result<usize, SheetError>;
}

/// In-memory sheet store used by tests and the demo wiring.
#[derive(Default)]
pub struct InMemorySheets {
    sheets: RwLock<HashMap<String, Vec<Vec<String>>>>,
}

impl InMemorySheets {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sheet with a header row.
    pub async fn create(&self, sheet_id: &str, header: Vec<String>) {
        self.sheets
            .write()
            .await
            .insert(sheet_id.to_string(), vec![header]);
    }
}

#[async_trait]
impl SheetStore for InMemorySheets {
    async fn read_rows(
        &self,
        sheet_id: &str,
        row_start: usize,
        row_end: usize,
    ) -> std::result::Result<Vec<Vec<String>>, SheetError> {
        let sheets = self.sheets.read().await;
        let rows = sheets
            .get(sheet_id)
            .ok_or_else(|| SheetError::NotFound(sheet_id.to_string()))?;

        let start = row_start.max(1) - 1;
        let end = row_end.min(rows.len());
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(rows[start..end].to_vec())
    }

    async fn append_row(
        &self,
        sheet_id: &str,
        row: Vec<String>,
    ) -> std::result::Result<usize, SheetError> {
        let mut sheets = self.sheets.write().await;
        let rows = sheets
            .get_mut(sheet_id)
            .ok_or_else(|| SheetError::NotFound(sheet_id.to_string()))?;
        rows.push(row);
        Ok(rows.len())
    }
}

/// Read a range of rows from a sheet.
pub struct SheetReadTool {
    sheets: Arc<dyn SheetStore>,
}

impl SheetReadTool {
    /// Create the tool over a sheet backend.
    pub fn new(sheets: Arc<dyn SheetStore>) -> Self {
        Self { sheets }
    }
}

#[async_trait]
impl Tool for SheetReadTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "sheet_read",
            "Read rows from a spreadsheet. Rows are 1-indexed; the first row \
             is usually a header.",
            json!({
                "type": "object",
                "properties": {
                    "sheet_id": {"type": "string", "description": "Id of the sheet"},
                    "row_start": {"type": "integer", "description": "First row to read (default: 1)"},
                    "row_end": {"type": "integer", "description": "Last row to read (default: 100)"}
                },
                "required": ["sheet_id"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let sheet_id = require_str(args, "sheet_id").map_err(invalid_args("sheet_read"))?;
        let row_start = optional_u64(args, "row_start").unwrap_or(1) as usize;
        let row_end = optional_u64(args, "row_end").unwrap_or(100) as usize;

        match self.sheets.read_rows(sheet_id, row_start, row_end).await {
            Ok(rows) if rows.is_empty() => Ok(format!(
                "No rows found in sheet {sheet_id} between rows {row_start} and {row_end}"
            )),
            Ok(rows) => {
                let lines: Vec<String> = rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| format!("{}: {}", row_start + i, row.join(" | ")))
                    .collect();
                Ok(format!(
                    "Rows {row_start}-{} of sheet {sheet_id}:\n{}",
                    row_start + lines.len() - 1,
                    lines.join("\n")
                ))
            }
            Err(e) => Ok(format!("Error reading sheet: {e}")),
        }
    }
}

/// Append one row to a sheet.
pub struct SheetAppendTool {
    sheets: Arc<dyn SheetStore>,
}

impl SheetAppendTool {
    /// Create the tool over a sheet backend.
    pub fn new(sheets: Arc<dyn SheetStore>) -> Self {
        Self { sheets }
    }
}

#[async_trait]
impl Tool for SheetAppendTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "sheet_append_row",
            "Append one row of values to a spreadsheet. Values are \
             comma-separated in column order.",
            json!({
                "type": "object",
                "properties": {
                    "sheet_id": {"type": "string", "description": "Id of the sheet"},
                    "values": {"type": "string", "description": "Comma-separated cell values"}
                },
                "required": ["sheet_id", "values"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let sheet_id = require_str(args, "sheet_id").map_err(invalid_args("sheet_append_row"))?;
        let values = require_str(args, "values").map_err(invalid_args("sheet_append_row"))?;

        let row: Vec<String> = values.split(',').map(|v| v.trim().to_string()).collect();
        match self.sheets.append_row(sheet_id, row).await {
            Ok(row_number) => Ok(format!(
                "✓ Row appended to sheet {sheet_id} at row {row_number}"
            )),
            Err(e) => Ok(format!("Error appending row: {e}")),
        }
    }
}

/// All sheet tools over one backend, ready for registration.
pub fn sheet_toolset(sheets: Arc<dyn SheetStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SheetReadTool::new(sheets.clone())),
        Arc::new(SheetAppendTool::new(sheets)),
    ]
}

fn invalid_args(tool_name: &str) -> impl Fn(String) -> aide_agent::AgentError {
    let tool_name = tool_name.to_string();
    move |message| aide_agent::AgentError::InvalidArguments {
        tool_name: tool_name.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> Arc<InMemorySheets> {
        let sheets = Arc::new(InMemorySheets::new());
        sheets
            .create(
                "prospects",
                vec!["Company".into(), "Website".into(), "Sector".into()],
            )
            .await;
        sheets
    }

    #[tokio::test]
    async fn test_append_then_read() {
        let sheets = seeded().await;

        let append = SheetAppendTool::new(sheets.clone());
        let out = append
            .invoke(&json!({"sheet_id": "prospects", "values": "Acme, acme.example, Robotics"}))
            .await
            .unwrap();
        assert_eq!(out, "✓ Row appended to sheet prospects at row 2");

        let read = SheetReadTool::new(sheets.clone());
        let out = read.invoke(&json!({"sheet_id": "prospects"})).await.unwrap();
        assert!(out.contains("1: Company | Website | Sector"));
        assert!(out.contains("2: Acme | acme.example | Robotics"));
    }

    #[tokio::test]
    async fn test_read_range() {
        let sheets = seeded().await;
        for i in 0..5 {
            sheets
                .append_row("prospects", vec![format!("Company {i}")])
                .await
                .unwrap();
        }

        let read = SheetReadTool::new(sheets);
        let out = read
            .invoke(&json!({"sheet_id": "prospects", "row_start": 3, "row_end": 4}))
            .await
            .unwrap();
        assert!(out.contains("3: Company 1"));
        assert!(out.contains("4: Company 2"));
        assert!(!out.contains("Company 3"));
    }

    #[tokio::test]
    async fn test_unknown_sheet_is_text_error() {
        let out = SheetReadTool::new(Arc::new(InMemorySheets::new()))
            .invoke(&json!({"sheet_id": "nope"}))
            .await
            .unwrap();
        assert!(out.starts_with("Error reading sheet:"));
    }

    #[tokio::test]
    async fn test_empty_range() {
        let sheets = seeded().await;
        let out = SheetReadTool::new(sheets)
            .invoke(&json!({"sheet_id": "prospects", "row_start": 10, "row_end": 20}))
            .await
            .unwrap();
        assert!(out.starts_with("No rows found"));
    }
}
