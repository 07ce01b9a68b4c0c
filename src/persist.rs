use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{grid::Direction, table::TravelTimeTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    #[default]
    #[value(name = "msgpack")]
    MessagePack,
    #[value(name = "json")]
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::MessagePack => "msgpack",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode table: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode table: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_error(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `<dir>/<direction>_df.<ext>`
pub fn output_path(dir: &Path, direction: Direction, format: OutputFormat) -> PathBuf {
    dir.join(format!("{direction}_df.{}", format.extension()))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// Written next to `path` and renamed into place, so readers never see a
// partial table.
pub fn write_table(
    table: &TravelTimeTable,
    path: &Path,
    format: OutputFormat,
) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
    }
    let staging = staging_path(path);
    if let Err(err) = write_staged(table, &staging, format) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    fs::rename(&staging, path).map_err(|e| io_error(path, e))?;
    info!("Wrote {} rows to {:?}", table.len(), path);
    Ok(())
}

fn write_staged(
    table: &TravelTimeTable,
    staging: &Path,
    format: OutputFormat,
) -> Result<(), PersistError> {
    let mut writer = BufWriter::new(File::create(staging).map_err(|e| io_error(staging, e))?);
    match format {
        OutputFormat::MessagePack => rmp_serde::encode::write_named(&mut writer, table)?,
        OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, table)?,
    }
    writer.flush().map_err(|e| io_error(staging, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| io_error(staging, e))?;
    Ok(())
}

pub fn read_table(path: &Path, format: OutputFormat) -> Result<TravelTimeTable, PersistError> {
    let reader = BufReader::new(File::open(path).map_err(|e| io_error(path, e))?);
    Ok(match format {
        OutputFormat::MessagePack => rmp_serde::from_read(reader)?,
        OutputFormat::Json => serde_json::from_reader(reader)?,
    })
}
