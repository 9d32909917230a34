use anyhow::{Context, Result};
use handlebars::handlebars_helper;
use serde::Serialize;
use std::{
    fs::File,
    io::{stdout, BufReader, Write},
    path::Path,
};
use stein::decode::{decode_fsw, decode_raw_records};
use stein::hexdump::read_packets;
use stein::raw::read_records;
use stein::Summary;
use tracing::debug;

use crate::decode::READ_FAILED;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// ASCII hex dump of flight software packets
    Fsw,
    /// Raw binary event records
    Raw,
}

impl clap::ValueEnum for InputType {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Fsw, Self::Raw]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Fsw => Some(clap::builder::PossibleValue::new("fsw")),
            Self::Raw => Some(clap::builder::PossibleValue::new("raw")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    input_type: InputType,
    summary: Summary,
}

fn summarize(fpath: &Path, input_type: &InputType) -> Result<Info> {
    let reader = BufReader::new(File::open(fpath).context(READ_FAILED)?);

    let summary = match input_type {
        InputType::Fsw => {
            let mut events = decode_fsw(read_packets(reader));
            for event in events.by_ref() {
                event.context(READ_FAILED)?;
            }
            events.summary().clone()
        }
        InputType::Raw => {
            let mut events = decode_raw_records(read_records(reader));
            for event in events.by_ref() {
                event.context(READ_FAILED)?;
            }
            events.summary().clone()
        }
    };
    debug!("summary for {fpath:?}: {summary:?}");

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        input_type: input_type.clone(),
        summary,
    })
}

pub fn info(fpath: &Path, input_type: &InputType, format: &Format) -> Result<()> {
    let info = summarize(fpath, input_type)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        let width = usize::try_from(num).unwrap_or(0);
        format!("{v:>width$}")
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }} ({{ input_type }})
==================================
Packets:         {{ summary.packets }}
Skipped packets: {{ summary.skipped_packets }}
Events:          {{ summary.events }}
Skipped events:  {{ summary.skipped_events }}
----------------------------------
Kind                         Count
----------------------------------
{{ #each summary.kinds }}{{ lpad 12 @key }}  {{ lpad 18 this }}
{{/each }}----------------------------------
Code                         Count
----------------------------------
{{ #each summary.codes }}{{ lpad 12 @key }}  {{ lpad 18 this }}
{{/each }}";
