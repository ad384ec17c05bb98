//! JSON-lines spill files.
//!
//! Each non-blank line holds one spill:
//!
//! ```text
//! {"info": {"spillpot": 3.2e13, "isgoodspill": true}, "records": [{...}, {...}]}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use nx_core::{Error, Result, Spill, SpillSource};

use crate::schema::{SpillInfo, StandardRecord};

/// Spill sources carrying [`SpillInfo`] headers and [`StandardRecord`] events.
pub trait CafSource: SpillSource<Info = SpillInfo, Record = StandardRecord> {}

impl<T: SpillSource<Info = SpillInfo, Record = StandardRecord>> CafSource for T {}

/// Prefix of dataset-definition tokens, which name a catalogue query rather
/// than local files.
pub const DATASET_DEF_PREFIX: &str = "dataset_def_name";

const EXTENSIONS: [&str; 2] = ["jsonl", "json"];

/// Resolve a data-source token to the spill files it names.
///
/// A file is used as-is; a directory contributes its `.jsonl`/`.json` files in
/// name order.
pub fn resolve(token: &str) -> Result<Vec<PathBuf>> {
    let token = token.trim();
    if token.starts_with(DATASET_DEF_PREFIX) {
        let query = token.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
        let query = if query.is_empty() { token } else { query.as_str() };
        return Err(Error::Resource(format!(
            "dataset definition '{query}' cannot be resolved locally; \
             pass a .jsonl file or directory"
        )));
    }
    let path = Path::new(token);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(Error::Resource(format!("input '{token}' does not exist")));
    }
    let mut files = Vec::new();
    let entries = std::fs::read_dir(path)
        .map_err(|e| Error::Resource(format!("cannot list {}: {e}", path.display())))?;
    for entry in entries {
        let p = entry?.path();
        let is_spill_file = p
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext));
        if p.is_file() && is_spill_file {
            files.push(p);
        }
    }
    if files.is_empty() {
        return Err(Error::Resource(format!("no .jsonl files in {}", path.display())));
    }
    files.sort();
    Ok(files)
}

struct OpenFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

/// Streams spills from JSON-lines files, one file at a time.
pub struct JsonlSource {
    token: String,
    pending: std::vec::IntoIter<PathBuf>,
    current: Option<OpenFile>,
}

impl std::fmt::Debug for JsonlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSource")
            .field("token", &self.token)
            .field("current", &self.current.as_ref().map(|c| &c.path))
            .finish()
    }
}

impl JsonlSource {
    /// Open the data source named by `token` (file or directory path).
    pub fn open(token: &str) -> Result<Self> {
        let files = resolve(token)?;
        log::debug!("{} resolved to {} file(s)", token.trim(), files.len());
        Ok(Self { token: token.trim().to_string(), pending: files.into_iter(), current: None })
    }

    fn advance_file(&mut self) -> Result<bool> {
        let Some(path) = self.pending.next() else {
            self.current = None;
            return Ok(false);
        };
        let f = File::open(&path)
            .map_err(|e| Error::Resource(format!("cannot open {}: {e}", path.display())))?;
        log::debug!("reading {}", path.display());
        self.current = Some(OpenFile { path, lines: BufReader::new(f).lines(), line_no: 0 });
        Ok(true)
    }
}

impl SpillSource for JsonlSource {
    type Info = SpillInfo;
    type Record = StandardRecord;

    fn describe(&self) -> String {
        self.token.clone()
    }

    fn next_spill(&mut self) -> Result<Option<Spill<SpillInfo, StandardRecord>>> {
        loop {
            let Some(cur) = self.current.as_mut() else {
                if self.advance_file()? {
                    continue;
                }
                return Ok(None);
            };
            let Some(line) = cur.lines.next() else {
                if self.advance_file()? {
                    continue;
                }
                return Ok(None);
            };
            cur.line_no += 1;
            let line = line.map_err(|e| {
                Error::Resource(format!("{}:{}: {e}", cur.path.display(), cur.line_no))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let spill = serde_json::from_str(&line).map_err(|e| {
                let at = format!("{}:{}", cur.path.display(), cur.line_no);
                Error::Resource(format!("{at}: malformed spill: {e}"))
            })?;
            return Ok(Some(spill));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        let mut f = File::create(&p).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        p
    }

    const SPILL: &str = r#"{"info": {"spillpot": 2.0e13, "isgoodspill": true}, "records": [{"hdr": {"evt": 1}}, {"hdr": {"evt": 2}}]}"#;

    #[test]
    fn reads_every_line_of_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "a.jsonl", &format!("{SPILL}\n\n{SPILL}\n"));
        let mut src = JsonlSource::open(p.to_str().unwrap()).unwrap();
        let first = src.next_spill().unwrap().unwrap();
        assert_eq!(first.info.spillpot, 2.0e13);
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.records[1].hdr.evt, 2);
        assert!(src.next_spill().unwrap().is_some());
        assert!(src.next_spill().unwrap().is_none());
        assert!(src.next_spill().unwrap().is_none());
    }

    #[test]
    fn directory_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.jsonl", r#"{"info": {"run": 2}}"#);
        write(dir.path(), "a.json", r#"{"info": {"run": 1}}"#);
        write(dir.path(), "notes.txt", "ignored");
        let mut src = JsonlSource::open(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(src.next_spill().unwrap().unwrap().info.run, 1);
        let second = src.next_spill().unwrap().unwrap();
        assert_eq!(second.info.run, 2);
        assert!(second.records.is_empty());
        assert!(src.next_spill().unwrap().is_none());
    }

    #[test]
    fn dataset_definitions_are_not_resolvable() {
        let token = "dataset_def_name_newest_snapshot  prod_caf_fd_fhc";
        let err = JsonlSource::open(token).unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
        assert!(err.to_string().contains("prod_caf_fd_fhc"), "{err}");
    }

    #[test]
    fn missing_inputs_are_resource_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(JsonlSource::open(dir.path().to_str().unwrap()), Err(Error::Resource(_))));
        let gone = dir.path().join("gone.jsonl");
        assert!(matches!(JsonlSource::open(gone.to_str().unwrap()), Err(Error::Resource(_))));
    }

    #[test]
    fn malformed_line_names_file_and_line() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "bad.jsonl", &format!("{SPILL}\n{{not json\n"));
        let mut src = JsonlSource::open(p.to_str().unwrap()).unwrap();
        src.next_spill().unwrap();
        let err = src.next_spill().unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
        assert!(err.to_string().contains("bad.jsonl:2"), "{err}");
    }
}
