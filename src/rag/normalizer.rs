//! Turns uploaded `.txt`, `.json` and `.jsonl` batches into conversation records.
//!
//! Pure parsing; nothing here touches the network.

use std::path::Path;

use serde_json::Value;

use super::types::ConversationRecord;
use crate::core::errors::NormalizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Text,
    Json,
    JsonLines,
}

impl BatchFormat {
    /// Picks the format from the file extension, case-insensitively.
    pub fn detect(file_name: &str) -> Result<Self, NormalizeError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("txt") => Ok(BatchFormat::Text),
            Some("json") => Ok(BatchFormat::Json),
            Some("jsonl") => Ok(BatchFormat::JsonLines),
            _ => Err(NormalizeError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

pub fn normalize(file_name: &str, raw: &[u8]) -> Result<Vec<ConversationRecord>, NormalizeError> {
    let format = BatchFormat::detect(file_name)?;
    let decoded = String::from_utf8_lossy(raw);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);

    match format {
        BatchFormat::Text => normalize_text(text).map(|record| vec![record]),
        BatchFormat::JsonLines => normalize_json_lines(text),
        BatchFormat::Json => normalize_json(text),
    }
}

/// Every non-blank line, trimmed, becomes one message of a single record.
fn normalize_text(text: &str) -> Result<ConversationRecord, NormalizeError> {
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        return Err(NormalizeError::EmptyInput);
    }
    Ok(ConversationRecord::new(lines))
}

/// One record per non-blank line. Any bad line aborts the whole batch.
fn normalize_json_lines(text: &str) -> Result<Vec<ConversationRecord>, NormalizeError> {
    let mut records = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_number = index + 1;
        let invalid = |reason: String| NormalizeError::InvalidLine {
            line: line_number,
            reason,
        };

        let value: Value = serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;
        let record = record_from_line(&value).map_err(invalid)?;
        records.push(record);
    }

    Ok(records)
}

/// Accepted shapes, tried in order: `["..."]`, `{"messages": ["..."]}`, `{"q": "...", "a": "..."}`.
fn record_from_line(value: &Value) -> Result<ConversationRecord, String> {
    if let Some(messages) = string_array(value) {
        return non_empty(messages);
    }

    if let Some(messages) = value.get("messages").and_then(string_array) {
        return non_empty(messages);
    }

    let question = value.get("q").and_then(Value::as_str);
    let answer = value.get("a").and_then(Value::as_str);
    if let (Some(q), Some(a)) = (question, answer) {
        return Ok(ConversationRecord::new(vec![
            format!("Q: {}", q),
            format!("A: {}", a),
        ]));
    }

    Err("expected an array of strings, {\"messages\": [...]} or {\"q\", \"a\"}".to_string())
}

/// Either one conversation (`["..."]`) or several (`[["..."], ["..."]]`).
fn normalize_json(text: &str) -> Result<Vec<ConversationRecord>, NormalizeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| NormalizeError::InvalidJson(e.to_string()))?;

    let items = value.as_array().ok_or_else(|| {
        NormalizeError::InvalidJson("top-level value must be an array".to_string())
    })?;
    if items.is_empty() {
        return Err(NormalizeError::InvalidJson(
            "array contains no messages".to_string(),
        ));
    }

    if let Some(messages) = string_array(&value) {
        return Ok(vec![ConversationRecord::new(messages)]);
    }

    if items.iter().all(Value::is_array) {
        return items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let messages = string_array(item).ok_or_else(|| {
                    NormalizeError::InvalidJson(format!(
                        "conversation {} must contain only strings",
                        i + 1
                    ))
                })?;
                non_empty(messages).map_err(|reason| {
                    NormalizeError::InvalidJson(format!("conversation {}: {}", i + 1, reason))
                })
            })
            .collect();
    }

    Err(NormalizeError::InvalidJson(
        "expected an array of strings or an array of string arrays".to_string(),
    ))
}

fn string_array(value: &Value) -> Option<Vec<String>> {
    value.as_array()?.iter().map(|item| item.as_str().map(str::to_string)).collect()
}

fn non_empty(messages: Vec<String>) -> Result<ConversationRecord, String> {
    if messages.is_empty() {
        return Err("conversation has no messages".to_string());
    }
    Ok(ConversationRecord::new(messages))
}
