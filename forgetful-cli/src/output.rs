//! Output formatting: human-readable, JSON, or YAML, matching the
//! `--format` switch on every subcommand.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, lightly colored summary.
    Human,
    /// JSON output for scripting.
    Json,
    /// YAML output.
    Yaml,
}

impl OutputFormat {
    pub fn print<T: Serialize>(self, data: &T) -> anyhow::Result<()> {
        self.write(io::stdout(), data)
    }

    fn write<T: Serialize, W: Write>(self, mut writer: W, data: &T) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, data)?;
                writeln!(writer)?;
            }
            OutputFormat::Yaml => {
                serde_yaml::to_writer(&mut writer, data)?;
            }
            OutputFormat::Human => {
                let value = serde_json::to_value(data)?;
                write_human(&mut writer, &value, 0)?;
            }
        }
        Ok(())
    }
}

/// Render arbitrary JSON as indented `key: value` lines. Good enough for
/// the flat-ish response shapes every subcommand returns; nested objects
/// recurse, arrays are enumerated.
fn write_human<W: Write>(writer: &mut W, value: &Value, depth: usize) -> anyhow::Result<()> {
    let indent = "  ".repeat(depth);
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                match v {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "{indent}{}:", key.cyan().bold())?;
                        write_human(writer, v, depth + 1)?;
                    }
                    _ => writeln!(writer, "{indent}{}: {}", key.cyan().bold(), scalar(v))?,
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                writeln!(writer, "{indent}- [{i}]")?;
                write_human(writer, item, depth + 1)?;
            }
        }
        other => writeln!(writer, "{indent}{}", scalar(other))?,
    }
    Ok(())
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".dimmed().to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
