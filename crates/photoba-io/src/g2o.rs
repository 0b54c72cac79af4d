use crate::record::{EdgeRecord, RECORD_TOKENS};
use crate::{IoError, parse_token};
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Tag opening every patch edge line.
pub const EDGE_TAG: &str = "EDGE_INVD_PATCH";

/// Files with more lines than this are parsed in parallel.
const PARALLEL_LINE_THRESHOLD: usize = 5000;

/// One persisted patch edge with the ids of the vertices it connects.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchEdgeEntry {
    pub point_id: usize,
    pub observation_id: usize,
    pub anchor_id: usize,
    pub record: EdgeRecord,
}

impl PatchEdgeEntry {
    /// Whether the observation and anchor vertices coincide (stereo self-edge).
    pub fn is_self_edge(&self) -> bool {
        self.observation_id == self.anchor_id
    }
}

/// Loader and writer for patch edge files.
pub struct PatchEdgeLoader;

impl PatchEdgeLoader {
    /// Loads every patch edge from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<PatchEdgeEntry>, IoError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the file is only read while mapped and is not expected to be
        // truncated concurrently.
        let mmap = unsafe { Mmap::map(&file)? };
        let content = std::str::from_utf8(&mmap).map_err(|e| IoError::Parse {
            line: 0,
            message: format!("Invalid UTF-8: {e}"),
        })?;

        let entries = Self::parse_content(content)?;
        info!(
            "Loaded {} patch edges from {}",
            entries.len(),
            path.display()
        );
        Ok(entries)
    }

    /// Writes the entries, one line each, in the order given.
    pub fn write<P: AsRef<Path>>(entries: &[PatchEdgeEntry], path: P) -> Result<(), IoError> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            Self::write_entry(entry, &mut writer)?;
        }
        writer.flush()?;
        debug!(
            "Wrote {} patch edges to {}",
            entries.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Writes a single entry followed by a newline.
    pub fn write_entry<W: Write>(entry: &PatchEdgeEntry, writer: &mut W) -> Result<(), IoError> {
        write!(
            writer,
            "{} {} {} {} ",
            EDGE_TAG, entry.point_id, entry.observation_id, entry.anchor_id
        )?;
        entry.record.write_to(writer)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Parses file content, in parallel for large inputs.
    pub fn parse_content(content: &str) -> Result<Vec<PatchEdgeEntry>, IoError> {
        let lines: Vec<&str> = content.lines().collect();

        let parsed: Vec<Option<PatchEdgeEntry>> = if lines.len() > PARALLEL_LINE_THRESHOLD {
            lines
                .par_iter()
                .enumerate()
                .map(|(line_num, line)| Self::parse_line(line, line_num + 1))
                .collect::<Result<_, _>>()?
        } else {
            lines
                .iter()
                .enumerate()
                .map(|(line_num, line)| Self::parse_line(line, line_num + 1))
                .collect::<Result<_, _>>()?
        };

        Ok(parsed.into_iter().flatten().collect())
    }

    /// Parses one line; `Ok(None)` for blank lines, comments and other tags.
    pub fn parse_line(line: &str, line_num: usize) -> Result<Option<PatchEdgeEntry>, IoError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts[0] != EDGE_TAG {
            return Ok(None);
        }

        let expected = 4 + RECORD_TOKENS;
        if parts.len() < expected {
            return Err(IoError::MissingFields {
                line: line_num,
                expected,
                found: parts.len(),
            });
        }

        Ok(Some(PatchEdgeEntry {
            point_id: parse_token(parts[1], line_num)?,
            observation_id: parse_token(parts[2], line_num)?,
            anchor_id: parse_token(parts[3], line_num)?,
            record: EdgeRecord::parse_tokens(&parts[4..], line_num)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PATCH_DIM;
    use nalgebra::{SMatrix, SVector};
    use tempfile::NamedTempFile;

    fn entry(point_id: usize, observation_id: usize, anchor_id: usize) -> PatchEdgeEntry {
        let measurement = SVector::<f64, PATCH_DIM>::from_fn(|i, _| i as f64 * 0.5);
        let information =
            SMatrix::<f64, PATCH_DIM, PATCH_DIM>::from_fn(|i, j| 1.0 / (1.0 + (i + j) as f64));
        PatchEdgeEntry {
            point_id,
            observation_id,
            anchor_id,
            record: EdgeRecord::new(1, measurement, information),
        }
    }

    #[test]
    fn test_write_then_load() -> Result<(), IoError> {
        let entries = vec![entry(10, 1, 0), entry(11, 2, 2)];
        let temp_file = NamedTempFile::new()?;

        PatchEdgeLoader::write(&entries, temp_file.path())?;
        let loaded = PatchEdgeLoader::load(temp_file.path())?;

        assert_eq!(loaded, entries);
        assert!(!loaded[0].is_self_edge());
        assert!(loaded[1].is_self_edge());
        Ok(())
    }

    #[test]
    fn test_skips_comments_and_unknown_tags() -> Result<(), IoError> {
        let mut buffer = Vec::new();
        writeln!(buffer, "# patch edges")?;
        writeln!(buffer)?;
        writeln!(buffer, "VERTEX_SE3:EXPMAP 0 0 0 0 0 0 0 1")?;
        PatchEdgeLoader::write_entry(&entry(5, 1, 0), &mut buffer)?;
        let content = String::from_utf8(buffer).map_err(|e| IoError::Parse {
            line: 0,
            message: e.to_string(),
        })?;

        let parsed = PatchEdgeLoader::parse_content(&content)?;
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].point_id, 5);
        Ok(())
    }

    #[test]
    fn test_missing_fields_reports_line() {
        let content = format!("# header\n{EDGE_TAG} 0 1 2 0 1.0 2.0\n");
        match PatchEdgeLoader::parse_content(&content) {
            Err(IoError::MissingFields { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_parallel_parse_matches_sequential() -> Result<(), IoError> {
        let mut buffer = Vec::new();
        for i in 0..(PARALLEL_LINE_THRESHOLD + 10) {
            PatchEdgeLoader::write_entry(&entry(i, i % 7, i % 5), &mut buffer)?;
        }
        let content = String::from_utf8(buffer).map_err(|e| IoError::Parse {
            line: 0,
            message: e.to_string(),
        })?;

        let parsed = PatchEdgeLoader::parse_content(&content)?;
        assert_eq!(parsed.len(), PARALLEL_LINE_THRESHOLD + 10);
        assert_eq!(parsed[1234].point_id, 1234);
        assert_eq!(parsed[1234].observation_id, 1234 % 7);
        Ok(())
    }
}
