//! JSON file repository
//!
//! Paths ending in `.gz` are read and written gzip-compressed.

use super::{PersistenceResult, Repository};
use crate::graph::GraphStore;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stores the export document of a graph in a single file
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
    pretty: bool,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: true,
        }
    }

    /// Write indented JSON (the default) or a single line
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_compressed(&self) -> bool {
        self.path.extension().map_or(false, |ext| ext == "gz")
    }

    fn read_text(&self) -> PersistenceResult<String> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut text = String::new();
        if self.is_compressed() {
            GzDecoder::new(reader).read_to_string(&mut text)?;
        } else {
            let mut reader = reader;
            reader.read_to_string(&mut text)?;
        }
        Ok(text)
    }
}

impl Repository for JsonFileRepository {
    fn load(&self) -> PersistenceResult<GraphStore> {
        if !self.path.exists() {
            debug!("No graph file at {:?}, starting empty", self.path);
            return Ok(GraphStore::new());
        }
        let store = GraphStore::from_json_str(&self.read_text()?)?;
        info!(
            "Loaded {} nodes and {} edges from {:?}",
            store.node_count(),
            store.edge_count(),
            self.path
        );
        Ok(store)
    }

    fn save(&self, store: &GraphStore) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = store.to_json_string(self.pretty)?;
        let writer = BufWriter::new(File::create(&self.path)?);
        if self.is_compressed() {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            encoder.write_all(text.as_bytes())?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = writer;
            writer.write_all(text.as_bytes())?;
            writer.flush()?;
        }
        info!(
            "Saved {} nodes and {} edges to {:?}",
            store.node_count(),
            store.edge_count(),
            self.path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{Ingestor, ProductRecord};
    use crate::persistence::PersistenceError;
    use crate::serialization::SerializationError;
    use tempfile::TempDir;

    fn sample() -> GraphStore {
        let mut store = GraphStore::new();
        let mut ingestor = Ingestor::new(&mut store);
        ingestor
            .add_product(&ProductRecord::named("A").with_features(["x", "y", "z"]))
            .unwrap();
        ingestor
            .add_product(&ProductRecord::named("B").with_features(["y", "z", "w"]).with_competitors(["A"]))
            .unwrap();
        store
    }

    #[test]
    fn test_missing_file_loads_empty_graph() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("graph.json"));
        let store = repo.load().unwrap();
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("nested/dir/graph.json"));
        let store = sample();
        repo.save(&store).unwrap();

        let text = fs::read_to_string(repo.path()).unwrap();
        assert!(text.contains('\n'));

        let loaded = repo.load().unwrap();
        assert_eq!(loaded.statistics(), store.statistics());
    }

    #[test]
    fn test_compact_output() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("graph.json")).with_pretty(false);
        repo.save(&sample()).unwrap();
        let text = fs::read_to_string(repo.path()).unwrap();
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_gzip_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("graph.json.gz"));
        assert!(repo.is_compressed());

        let store = sample();
        repo.save(&store).unwrap();
        let raw = fs::read(repo.path()).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let loaded = repo.load().unwrap();
        assert_eq!(loaded.node_count(), store.node_count());
        assert_eq!(loaded.edge_count(), store.edge_count());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.json");
        fs::write(&path, "{\"nodes\": 5}").unwrap();

        let result = JsonFileRepository::new(&path).load();
        assert!(matches!(
            result,
            Err(PersistenceError::Serialization(SerializationError::Malformed(_)))
        ));
    }
}
