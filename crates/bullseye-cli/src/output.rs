use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&result.data)?
            } else {
                serde_json::to_string(&result.data)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => render_table(&result.data),
    }

    Ok(())
}

fn render_table(data: &Value) {
    match data {
        Value::Array(rows) => render_rows(rows),
        Value::Object(fields) => {
            for (key, value) in fields {
                match value {
                    Value::Array(rows) if rows.iter().all(Value::is_object) => {
                        println!("{key}:");
                        render_rows(rows);
                    }
                    other => println!("{key}: {}", cell(other)),
                }
            }
        }
        other => println!("{}", cell(other)),
    }
}

fn render_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        println!("(no rows)");
        return;
    };

    let columns: Vec<&String> = first.keys().collect();
    let mut widths: Vec<usize> = columns.iter().map(|name| name.len()).collect();
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|name| cell(row.get(name.as_str()).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect();
    for row in &table {
        for (index, text) in row.iter().enumerate() {
            widths[index] = widths[index].max(text.len());
        }
    }

    let header: Vec<String> = columns
        .iter()
        .zip(widths.iter().copied())
        .map(|(name, width)| format!("{name:<width$}"))
        .collect();
    println!("{}", header.join("  "));
    println!(
        "{}",
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in table {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(text, width)| format!("{text:<width$}"))
            .collect();
        println!("{}", line.join("  "));
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_cells_render_without_quotes() {
        assert_eq!(cell(&json!("AAPL")), "AAPL");
        assert_eq!(cell(&json!(2.5)), "2.5");
        assert_eq!(cell(&json!(true)), "true");
        assert_eq!(cell(&Value::Null), "-");
    }

    #[test]
    fn json_render_emits_the_data_payload() {
        let result = CommandResult::ok(json!({"added": ["AAPL"]}));
        assert!(render(&result, OutputFormat::Json, false).is_ok());
        assert!(render(&result, OutputFormat::Json, true).is_ok());
    }
}
