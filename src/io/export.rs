//! JSON export and import of network tables

use crate::analysis::graph::{NetworkTables, PoreNetworkGraph};
use crate::io::error::{Result, SnowError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write a network's node and edge tables as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if the file cannot be created or written
pub fn write_network_json(network: &PoreNetworkGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SnowError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source,
        })?;
    }

    let file = File::create(path).map_err(|source| SnowError::FileSystem {
        path: path.to_path_buf(),
        operation: "create file",
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &network.to_tables()).map_err(|source| {
        SnowError::Serialization {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(|source| SnowError::FileSystem {
        path: path.to_path_buf(),
        operation: "write file",
        source,
    })
}

/// Read network tables written by [`write_network_json`]
///
/// # Errors
///
/// Returns an error if the file cannot be opened or does not hold valid tables
pub fn read_network_json(path: &Path) -> Result<NetworkTables> {
    let file = File::open(path).map_err(|source| SnowError::FileSystem {
        path: path.to_path_buf(),
        operation: "open file",
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| SnowError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}
