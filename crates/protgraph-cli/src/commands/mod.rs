pub mod batch;
pub mod build;

use crate::error::{CliError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes `value` as JSON to `path`, or to stdout when no path is given.
pub(crate) fn write_json<T: Serialize>(value: &T, path: Option<&Path>, pretty: bool) -> Result<()> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serialize(value, &mut writer, pretty)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serialize(value, &mut lock, pretty)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

fn serialize<T: Serialize, W: Write>(value: &T, writer: W, pretty: bool) -> Result<()> {
    let written = if pretty {
        serde_json::to_writer_pretty(writer, value)
    } else {
        serde_json::to_writer(writer, value)
    };
    written.map_err(|e| CliError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn write_json_honours_the_pretty_flag() {
        let dir = tempdir().unwrap();
        let value: BTreeMap<&str, u32> = [("nodes", 3), ("edges", 2)].into_iter().collect();

        let compact = dir.path().join("compact.json");
        write_json(&value, Some(&compact), false).unwrap();
        assert_eq!(
            std::fs::read_to_string(&compact).unwrap(),
            "{\"edges\":2,\"nodes\":3}"
        );

        let pretty = dir.path().join("pretty.json");
        write_json(&value, Some(&pretty), true).unwrap();
        assert!(std::fs::read_to_string(&pretty).unwrap().contains("\n  \"edges\": 2"));
    }
}
