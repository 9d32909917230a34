use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::decode::READ_FAILED;

pub fn convert(input: &Path, output: &Path) -> Result<()> {
    let src = BufReader::new(File::open(input).context(READ_FAILED)?);
    let dest = BufWriter::new(
        File::create(output).with_context(|| format!("failed to create output {output:?}"))?,
    );

    let count = stein::sub20::convert(src, dest)
        .with_context(|| format!("failed to convert {input:?}"))?;
    info!("wrote {count} records to {output:?}");
    Ok(())
}
