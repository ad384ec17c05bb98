//! Final, exposure-normalized histograms and the file container they are
//! written to.

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use nx_core::{Error, Result};

/// A 1D histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Axis title.
    pub title: String,
    /// Bin edges (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins, excluding under/overflow).
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin.
    pub sumw2: Vec<f64>,
    /// Underflow content.
    pub underflow: f64,
    /// Overflow content.
    pub overflow: f64,
    /// Number of in-range fills.
    pub entries: u64,
    /// Exposure the contents correspond to.
    pub pot: f64,
}

impl Histogram {
    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.bin_content.len()
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Statistical error per bin (`sqrt(sumw2)`).
    pub fn errors(&self) -> Vec<f64> {
        self.sumw2.iter().map(|w2| w2.sqrt()).collect()
    }
}

/// A 2D histogram. Contents are stored x-major: `index = ix * ny + iy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram2D {
    /// Histogram name.
    pub name: String,
    /// X axis title.
    pub x_title: String,
    /// Y axis title.
    pub y_title: String,
    /// X bin edges.
    pub x_edges: Vec<f64>,
    /// Y bin edges.
    pub y_edges: Vec<f64>,
    /// Bin contents (`nx * ny`).
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin.
    pub sumw2: Vec<f64>,
    /// Fills outside the 2D range on either axis.
    pub out_of_range: f64,
    /// Number of in-range fills.
    pub entries: u64,
    /// Exposure the contents correspond to.
    pub pot: f64,
}

impl Histogram2D {
    /// `(nx, ny)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.x_edges.len() - 1, self.y_edges.len() - 1)
    }

    /// Content of bin `(ix, iy)`.
    pub fn content(&self, ix: usize, iy: usize) -> Option<f64> {
        let (nx, ny) = self.shape();
        if ix >= nx || iy >= ny {
            return None;
        }
        self.bin_content.get(ix * ny + iy).copied()
    }
}

/// One entry of a [`HistogramFile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoredHistogram {
    /// 1D histogram.
    H1(Histogram),
    /// 2D histogram.
    H2(Histogram2D),
}

/// Named histograms written together to one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramFile {
    /// Histograms keyed by the name they were written under.
    pub histograms: BTreeMap<String, StoredHistogram>,
}

impl HistogramFile {
    /// Empty container.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: String, h: StoredHistogram) -> Result<()> {
        if self.histograms.contains_key(&key) {
            return Err(Error::Configuration(format!("histogram '{key}' written twice")));
        }
        self.histograms.insert(key, h);
        Ok(())
    }

    /// Store a 1D histogram under `key`.
    pub fn write_1d(&mut self, key: impl Into<String>, h: Histogram) -> Result<()> {
        self.insert(key.into(), StoredHistogram::H1(h))
    }

    /// Store a 2D histogram under `key`.
    pub fn write_2d(&mut self, key: impl Into<String>, h: Histogram2D) -> Result<()> {
        self.insert(key.into(), StoredHistogram::H2(h))
    }

    /// Look up a 1D histogram.
    pub fn get_1d(&self, key: &str) -> Option<&Histogram> {
        match self.histograms.get(key)? {
            StoredHistogram::H1(h) => Some(h),
            StoredHistogram::H2(_) => None,
        }
    }

    /// Look up a 2D histogram.
    pub fn get_2d(&self, key: &str) -> Option<&Histogram2D> {
        match self.histograms.get(key)? {
            StoredHistogram::H2(h) => Some(h),
            StoredHistogram::H1(_) => None,
        }
    }

    /// Write the container as pretty JSON.
    ///
    /// The file appears atomically: content goes to a temporary sibling that is
    /// renamed over `path` once complete.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            Error::Resource(format!("cannot create output in {}: {e}", dir.display()))
        })?;
        let mut w = BufWriter::new(tmp);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.write_all(b"\n")?;
        let tmp = w.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        tmp.persist(path)
            .map_err(|e| Error::Resource(format!("cannot write {}: {}", path.display(), e.error)))?;
        log::info!("wrote {} histogram(s) to {}", self.histograms.len(), path.display());
        Ok(())
    }

    /// Read a container written by [`HistogramFile::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let f = std::fs::File::open(path)
            .map_err(|e| Error::Resource(format!("cannot open {}: {e}", path.display())))?;
        Ok(serde_json::from_reader(BufReader::new(f))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h1(name: &str) -> Histogram {
        Histogram {
            name: name.into(),
            title: "E (GeV)".into(),
            bin_edges: vec![0.0, 1.0, 2.0],
            bin_content: vec![3.0, 4.0],
            sumw2: vec![9.0, 16.0],
            underflow: 0.0,
            overflow: 1.0,
            entries: 7,
            pot: 1e20,
        }
    }

    #[test]
    fn histogram_helpers() {
        let h = h1("h");
        assert_eq!(h.n_bins(), 2);
        assert_eq!(h.integral(), 7.0);
        assert_eq!(h.errors(), vec![3.0, 4.0]);
    }

    fn h2(name: &str) -> Histogram2D {
        Histogram2D {
            name: name.into(),
            x_title: "x".into(),
            y_title: "y".into(),
            x_edges: vec![0.0, 1.0, 2.0],
            y_edges: vec![0.0, 1.0, 2.0, 3.0],
            bin_content: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            sumw2: vec![0.0; 6],
            out_of_range: 0.0,
            entries: 15,
            pot: 1.0,
        }
    }

    #[test]
    fn histogram2d_indexing() {
        let h = h2("h2");
        assert_eq!(h.shape(), (2, 3));
        assert_eq!(h.content(1, 2), Some(5.0));
        assert_eq!(h.content(0, 1), Some(1.0));
        assert_eq!(h.content(2, 0), None);
    }

    #[test]
    fn duplicate_keys_rejected() {
        let mut f = HistogramFile::new();
        f.write_1d("a", h1("a")).unwrap();
        assert!(matches!(f.write_1d("a", h1("a")), Err(Error::Configuration(_))));
        assert!(f.get_1d("a").is_some());
        assert!(f.get_2d("a").is_none());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots.json");
        let mut f = HistogramFile::new();
        f.write_1d("npngPass", h1("npngPass")).unwrap();
        f.save(&path).unwrap();
        let back = HistogramFile::load(&path).unwrap();
        assert_eq!(back, f);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"kind\": \"h1\""), "{text}");
    }

    #[test]
    fn save_and_load_mixed_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots.json");
        let mut f = HistogramFile::new();
        f.write_1d("e", h1("e")).unwrap();
        f.write_2d("e_vs_cos", h2("e_vs_cos")).unwrap();
        assert!(matches!(f.write_2d("e", h2("e")), Err(Error::Configuration(_))));
        f.save(&path).unwrap();

        let back = HistogramFile::load(&path).unwrap();
        assert_eq!(back, f);
        let h = back.get_2d("e_vs_cos").unwrap();
        assert_eq!(h.content(1, 2), Some(5.0));
        assert!(back.get_1d("e_vs_cos").is_none());
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"kind\": \"h2\""), "{text}");
    }

    #[test]
    fn save_into_missing_directory_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("plots.json");
        let err = HistogramFile::new().save(&path).unwrap_err();
        assert!(matches!(err, Error::Resource(_)), "{err}");
    }
}
