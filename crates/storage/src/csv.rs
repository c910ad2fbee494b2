use std::borrow::Cow;

use serde_json::Value;
use shared::domain::LoggedVote;

pub const CSV_HEADER: [&str; 3] = ["id", "voto", "receivedAt"];

/// Renders the log as CSV, one row per vote, rows separated by `\n`.
pub fn render_csv(votes: &[LoggedVote]) -> String {
    let mut rows = Vec::with_capacity(votes.len() + 1);
    rows.push(CSV_HEADER.join(","));
    for vote in votes {
        let row: Vec<String> = CSV_HEADER
            .iter()
            .map(|key| escape_field(&render_value(vote.field(key))).into_owned())
            .collect();
        rows.push(row.join(","));
    }
    rows.join("\n")
}

fn render_value(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    }
}

/// Quotes a field holding a comma, double quote or newline; inner quotes are doubled.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
#[path = "tests/csv_tests.rs"]
mod tests;
