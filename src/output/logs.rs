//! Persisted statistics logs
//!
//! Append-only logs grow one line per event; snapshots are rewritten whole.
//! Every line is `key, value` except the fingerprint log, which holds one
//! value per line.

use crate::dedup::Fingerprint;
use crate::output::OutputResult;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

pub const UNIQUE_LINKS_FILE: &str = "unique_links.txt";
pub const FINGERPRINTS_FILE: &str = "hash_vals.txt";
pub const LOW_INFO_FILE: &str = "low_info.txt";
pub const ALL_TOKENS_FILE: &str = "all_tokens.txt";
pub const SUBDOMAINS_FILE: &str = "subdomains.txt";
pub const ERROR_FILE: &str = "error.txt";
pub const REPORT_FILE: &str = "report.md";

/// Every file the statistics layer writes
pub const ALL_FILES: &[&str] = &[
    UNIQUE_LINKS_FILE,
    FINGERPRINTS_FILE,
    LOW_INFO_FILE,
    ALL_TOKENS_FILE,
    SUBDOMAINS_FILE,
    ERROR_FILE,
    REPORT_FILE,
];

/// The statistics directory
#[derive(Debug, Clone)]
pub struct StatsFiles {
    dir: PathBuf,
}

impl StatsFiles {
    /// Uses `dir`, creating it if needed
    pub fn create(dir: impl Into<PathBuf>) -> OutputResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Deletes every statistics file left by a previous crawl
    pub fn clear(&self) -> OutputResult<()> {
        for name in ALL_FILES {
            match fs::remove_file(self.path(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Appends one line to a log
    pub fn append_line(&self, name: &str, line: &str) -> OutputResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(name))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Replaces a snapshot with `key, value` lines
    pub fn write_pairs<'a, I>(&self, name: &str, pairs: I) -> OutputResult<()>
    where
        I: IntoIterator<Item = (&'a String, &'a u64)>,
    {
        let mut writer = BufWriter::new(File::create(self.path(name))?);
        for (key, value) in pairs {
            writeln!(writer, "{}, {}", key, value)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads `key, value` lines; a missing file reads as empty
    ///
    /// Malformed lines are skipped. The value is split off at the last
    /// separator so keys may themselves contain ", ".
    pub fn read_pairs(&self, name: &str) -> OutputResult<Vec<(String, u64)>> {
        let Some(content) = self.read_optional(name)? else {
            return Ok(Vec::new());
        };

        Ok(content
            .lines()
            .filter_map(|line| {
                let (key, value) = line.rsplit_once(", ")?;
                Some((key.to_string(), value.trim().parse().ok()?))
            })
            .collect())
    }

    /// Reads the fingerprint log; a missing file reads as empty
    pub fn read_fingerprints(&self) -> OutputResult<Vec<Fingerprint>> {
        let Some(content) = self.read_optional(FINGERPRINTS_FILE)? else {
            return Ok(Vec::new());
        };

        Ok(content
            .lines()
            .filter_map(|line| line.trim().parse().ok())
            .map(Fingerprint::from_raw)
            .collect())
    }

    fn read_optional(&self, name: &str) -> OutputResult<Option<String>> {
        match fs::read_to_string(self.path(name)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
