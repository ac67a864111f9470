//! `MessagePack` persistence for a [`TrainedModel`].
//!
//! The artefact is a single file holding a versioned envelope around the
//! full fitted pipeline. It is written to a uniquely named `.tmp` sibling
//! first and then renamed, so an interrupted save never leaves a truncated
//! artefact at the destination and concurrent saves never share a
//! temporary file.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::TrainedModel;

/// Current artefact format version.
pub const FORMAT_VERSION: u32 = 1;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Errors saving or loading a model artefact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// No artefact exists at the path.
    #[error("Model artefact not found: {0}")]
    NotFound(String),

    /// The file exists but does not hold a usable model.
    #[error("Corrupt model artefact: {0}")]
    Corrupt(String),

    /// Reading or writing failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    model: &'a TrainedModel,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    model: TrainedModel,
}

/// Writes `model` to `path`, creating parent directories as needed.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`ArtifactError::Io`] if the file cannot be written, or
/// [`ArtifactError::Corrupt`] if the model fails to encode.
pub fn save(model: &TrainedModel, path: &Path) -> Result<u64, ArtifactError> {
    let bytes = rmp_serde::to_vec_named(&EnvelopeRef {
        version: FORMAT_VERSION,
        model,
    })
    .map_err(|e| ArtifactError::Corrupt(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ArtifactError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let tmp_path = tmp_path_for(path);

    if let Err(e) = write_synced(&tmp_path, &bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ArtifactError::Io {
            path: tmp_path.display().to_string(),
            source: e,
        });
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        ArtifactError::Io {
            path: path.display().to_string(),
            source: e,
        }
    })?;

    log::info!(
        "Saved model artefact to {} ({} bytes, alpha={})",
        path.display(),
        bytes.len(),
        model.alpha()
    );

    Ok(bytes.len() as u64)
}

/// `<path>.<pid>.<n>.tmp`, unique per process and per save.
fn tmp_path_for(path: &Path) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}.{n}.tmp", std::process::id()));
    PathBuf::from(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Reads a model previously written by [`save`].
///
/// # Errors
///
/// Returns [`ArtifactError::NotFound`] if `path` does not exist,
/// [`ArtifactError::Corrupt`] if it cannot be decoded, has an unknown
/// format version, or holds an internally inconsistent pipeline, and
/// [`ArtifactError::Io`] for other read failures.
pub fn load(path: &Path) -> Result<TrainedModel, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound(path.display().to_string())
        } else {
            ArtifactError::Io {
                path: path.display().to_string(),
                source: e,
            }
        }
    })?;

    let envelope: Envelope =
        rmp_serde::from_slice(&bytes).map_err(|e| ArtifactError::Corrupt(e.to_string()))?;

    if envelope.version != FORMAT_VERSION {
        return Err(ArtifactError::Corrupt(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            envelope.version
        )));
    }
    if let Some(problem) = envelope.model.consistency_error() {
        return Err(ArtifactError::Corrupt(problem));
    }

    log::debug!(
        "Loaded model artefact from {} ({} features, alpha={})",
        path.display(),
        envelope.model.n_features(),
        envelope.model.alpha()
    );

    Ok(envelope.model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fixture() -> TrainedModel {
        let x = array![[1.0, 5.0], [2.0, 3.0], [3.0, 4.0], [4.0, 1.0]];
        let y = array![10.0, 12.0, 15.0, 16.0];
        TrainedModel::fit(&x, &y, vec!["a".to_owned(), "b".to_owned()], 2, 1.0).unwrap()
    }

    #[test]
    fn save_then_load_predicts_identically() {
        let dir = std::env::temp_dir().join("aqi_model_artifact_roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("model.msgpack");

        let model = fixture();
        save(&model, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, model);
        let sample = [2.5, 2.5];
        assert!(
            (loaded.predict_one(&sample).unwrap() - model.predict_one(&sample).unwrap()).abs()
                < f64::EPSILON
        );
        let leftovers: Vec<_> = std::fs::read_dir(dir.join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, ["model.msgpack"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn temporary_paths_are_unique() {
        let path = Path::new("/data/model.msgpack");
        let first = tmp_path_for(path);
        let second = tmp_path_for(path);
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
        assert!(first.to_string_lossy().ends_with(".tmp"));
    }

    #[test]
    fn concurrent_saves_to_one_path_leave_a_valid_artefact() {
        let dir = std::env::temp_dir().join("aqi_model_artifact_concurrent");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("model.msgpack");
        let model = fixture();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| save(&model, &path).unwrap());
            }
        });

        assert_eq!(load(&path).unwrap(), model);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("aqi_model_artifact_does_not_exist.msgpack");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(load(&path), Err(ArtifactError::NotFound(_))));
    }

    #[test]
    fn garbage_is_corrupt() {
        let path = std::env::temp_dir().join("aqi_model_artifact_garbage.msgpack");
        std::fs::write(&path, b"definitely not a model").unwrap();
        let result = load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ArtifactError::Corrupt(_))));
    }

    #[test]
    fn inconsistent_model_is_corrupt() {
        let path = std::env::temp_dir().join("aqi_model_artifact_inconsistent.msgpack");
        let mut model = fixture();
        model.ridge.coef = array![1.0, 2.0];
        save(&model, &path).unwrap();
        let result = load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ArtifactError::Corrupt(_))));
    }
}
