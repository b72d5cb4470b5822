use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use brickwire_codec::{hex, Command};

use crate::exit::{codec_error, CliResult};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A result that can be shown as JSON or as labelled fields.
pub trait Record: Serialize {
    fn fields(&self) -> Vec<(&'static str, String)>;
}

/// Encoded request shown instead of being sent.
#[derive(Debug, Serialize)]
pub struct FramePreview {
    pub frame: String,
    pub length: usize,
    pub expects_reply: bool,
    #[serde(skip)]
    bytes: Vec<u8>,
}

impl FramePreview {
    /// Serialize `command` as it would go out as the first request of a session.
    pub fn of(mut command: Command) -> CliResult<Self> {
        command.set_sequence_number(1);
        let frame = command
            .serialize()
            .map_err(|err| codec_error("encode failed", err))?;
        Ok(Self {
            frame: hex(&frame).to_string(),
            length: frame.len(),
            expects_reply: command.expects_reply(),
            bytes: frame.to_vec(),
        })
    }
}

impl Record for FramePreview {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("frame", self.frame.clone()),
            ("length", self.length.to_string()),
            ("expects_reply", self.expects_reply.to_string()),
        ]
    }
}

pub fn print_record<R: Record>(record: &R, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in record.fields() {
                table.add_row(vec![name.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line: Vec<String> = record
                .fields()
                .into_iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("{}", line.join(" "));
        }
        OutputFormat::Raw => {
            for (_, value) in record.fields() {
                println!("{value}");
            }
        }
    }
}

/// Dry-run output. `raw` writes the frame bytes themselves.
pub fn print_preview(preview: &FramePreview, format: OutputFormat) {
    match format {
        OutputFormat::Raw => print_raw(&preview.bytes),
        other => print_record(preview, other),
    }
}

/// Rows with a shared header, e.g. a directory listing.
pub fn print_rows<R: Record>(rows: &[R], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            if let Some(first) = rows.first() {
                table.set_header(first.fields().into_iter().map(|(name, _)| name.to_uppercase()));
            }
            for row in rows {
                table.add_row(row.fields().into_iter().map(|(_, value)| value));
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in rows {
                print_record(row, OutputFormat::Pretty);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
