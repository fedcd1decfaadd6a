//! Model resolution: bundled artifacts first, cache-backed hub load second
//!
//! Given a configured model identifier, an ordered list of naming-convention
//! candidates is checked under the bundled-models directory; the first path
//! that exists wins and the model is loaded from disk. When no candidate
//! exists, a single fallback load goes through the hub API with the bundled
//! directory as its cache folder, so a prior populate is reused and anything
//! newly fetched persists for future process starts.

use crate::{EmbeddingError, EmbeddingResult};
use hf_hub::api::tokio::ApiBuilder;
use hf_hub::{Repo, RepoType};
use std::path::{Path, PathBuf};

/// Naming-convention transforms applied to the model identifier, in priority
/// order, to generate bundled-directory candidates. `{model}` is replaced by
/// the identifier's final path segment. New conventions are added here; the
/// scan logic never changes.
pub const BUNDLED_CANDIDATE_TEMPLATES: &[&str] = &[
    "models--sentence-transformers--{model}",
    "{model}",
    "sentence-transformers--{model}",
];

/// Safetensors weights, tried first when locating or fetching model files
const WEIGHTS_SAFETENSORS: &str = "model.safetensors";
/// Legacy pytorch weights, accepted when no safetensors file exists
const WEIGHTS_PYTORCH: &str = "pytorch_model.bin";

/// On-disk files a sentence-embedding model loads from
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// Where the resolved model came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Loaded directly from a bundled directory candidate
    Bundled(PathBuf),
    /// Loaded through the hub API with the bundled dir as cache folder
    HubCache,
}

/// Result of model resolution: the file set plus its provenance
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub files: ModelFiles,
    pub source: ModelSource,
}

/// The identifier's final path segment, used for directory naming
fn model_name(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}

/// Repo id used for the hub fallback; bare names are qualified with the
/// sentence-transformers namespace.
fn qualified_repo_id(model_id: &str) -> String {
    if model_id.contains('/') {
        model_id.to_string()
    } else {
        format!("sentence-transformers/{model_id}")
    }
}

/// Generate the ordered candidate paths for a model identifier
pub fn candidate_paths(bundled_models_dir: &Path, model_id: &str) -> Vec<PathBuf> {
    let name = model_name(model_id);
    BUNDLED_CANDIDATE_TEMPLATES
        .iter()
        .map(|template| bundled_models_dir.join(template.replace("{model}", name)))
        .collect()
}

/// Ordered scan over the candidates; first existing path wins
fn find_bundled(bundled_models_dir: &Path, model_id: &str) -> Option<PathBuf> {
    candidate_paths(bundled_models_dir, model_id)
        .into_iter()
        .find(|path| path.exists())
}

/// Pick the weights file inside a directory, preferring safetensors
fn weights_in(dir: &Path) -> Option<PathBuf> {
    let safetensors = dir.join(WEIGHTS_SAFETENSORS);
    if safetensors.exists() {
        return Some(safetensors);
    }
    let pytorch = dir.join(WEIGHTS_PYTORCH);
    pytorch.exists().then_some(pytorch)
}

/// Locate the model files inside a bundled directory
///
/// Two layouts are accepted: a flat directory holding the files directly, and
/// the hub cache layout (`refs/main` naming a revision under `snapshots/`).
fn locate_files(dir: &Path) -> EmbeddingResult<ModelFiles> {
    let flat_config = dir.join("config.json");
    if flat_config.exists() {
        let weights = weights_in(dir).ok_or_else(|| {
            EmbeddingError::Resolve(format!("No weights file in {}", dir.display()))
        })?;
        return Ok(ModelFiles {
            config: flat_config,
            tokenizer: dir.join("tokenizer.json"),
            weights,
        });
    }

    let snapshot = snapshot_dir(dir)?;
    let weights = weights_in(&snapshot).ok_or_else(|| {
        EmbeddingError::Resolve(format!("No weights file in {}", snapshot.display()))
    })?;
    Ok(ModelFiles {
        config: snapshot.join("config.json"),
        tokenizer: snapshot.join("tokenizer.json"),
        weights,
    })
}

/// Resolve the snapshot directory of a hub-cache-layout model directory
///
/// `refs/main` names the revision when present; otherwise the first snapshot
/// entry (lexicographic, for determinism) is used.
fn snapshot_dir(dir: &Path) -> EmbeddingResult<PathBuf> {
    let snapshots = dir.join("snapshots");

    if let Ok(revision) = std::fs::read_to_string(dir.join("refs/main")) {
        let snapshot = snapshots.join(revision.trim());
        if snapshot.is_dir() {
            return Ok(snapshot);
        }
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(&snapshots)
        .map_err(|e| {
            EmbeddingError::Resolve(format!("No snapshots under {}: {e}", dir.display()))
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    entries.sort();

    entries.into_iter().next().ok_or_else(|| {
        EmbeddingError::Resolve(format!("Empty snapshots directory in {}", dir.display()))
    })
}

/// Log the bundled directory contents when no candidate matched, to aid
/// operational debugging.
fn log_bundled_contents(bundled_models_dir: &Path) {
    match std::fs::read_dir(bundled_models_dir) {
        Ok(entries) => {
            let names: Vec<String> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            tracing::warn!(
                dir = %bundled_models_dir.display(),
                contents = ?names,
                "No bundled model candidate matched"
            );
        }
        Err(e) => {
            tracing::warn!(
                dir = %bundled_models_dir.display(),
                error = %e,
                "Bundled models directory is not readable"
            );
        }
    }
}

/// Fetch the model files through the hub API, using the bundled directory as
/// the cache folder. One attempt; a cache hit avoids the network entirely.
async fn fetch_via_hub(model_id: &str, cache_dir: &Path) -> EmbeddingResult<ModelFiles> {
    let repo_id = qualified_repo_id(model_id);
    tracing::info!(repo = %repo_id, cache = %cache_dir.display(), "Fetching model via hub cache");

    let api = ApiBuilder::new()
        .with_cache_dir(cache_dir.to_path_buf())
        .build()
        .map_err(|e| EmbeddingError::Resolve(format!("Failed to create hub API: {e}")))?;
    let repo = api.repo(Repo::new(repo_id, RepoType::Model));

    let config = repo
        .get("config.json")
        .await
        .map_err(|e| EmbeddingError::Resolve(format!("Failed to fetch config: {e}")))?;
    let tokenizer = repo
        .get("tokenizer.json")
        .await
        .map_err(|e| EmbeddingError::Resolve(format!("Failed to fetch tokenizer: {e}")))?;
    let weights = match repo.get(WEIGHTS_SAFETENSORS).await {
        Ok(path) => path,
        Err(_) => repo
            .get(WEIGHTS_PYTORCH)
            .await
            .map_err(|e| EmbeddingError::Resolve(format!("Failed to fetch weights: {e}")))?,
    };

    Ok(ModelFiles {
        config,
        tokenizer,
        weights,
    })
}

/// Resolve exactly one usable model for the configured identifier
///
/// Bundled candidates are scanned in declared priority order; the first
/// existing path is loaded directly from disk. Otherwise the single hub
/// fallback runs with the bundled directory as cache.
///
/// # Errors
/// Returns `EmbeddingError::Resolve` when no candidate exists and the
/// fallback also fails. Callers must treat this as a startup abort.
pub async fn resolve_model(
    model_id: &str,
    bundled_models_dir: &Path,
) -> EmbeddingResult<ResolvedModel> {
    if let Some(bundled) = find_bundled(bundled_models_dir, model_id) {
        tracing::info!(path = %bundled.display(), "Using bundled model");
        let files = locate_files(&bundled)?;
        return Ok(ResolvedModel {
            files,
            source: ModelSource::Bundled(bundled),
        });
    }

    log_bundled_contents(bundled_models_dir);

    let files = fetch_via_hub(model_id, bundled_models_dir)
        .await
        .map_err(|e| {
            EmbeddingError::Resolve(format!(
                "No bundled candidate for '{model_id}' in {} and fallback load failed: {e}",
                bundled_models_dir.display()
            ))
        })?;

    Ok(ResolvedModel {
        files,
        source: ModelSource::HubCache,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn flat_model_dir(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        touch(&dir.join("config.json"));
        touch(&dir.join("tokenizer.json"));
        touch(&dir.join(WEIGHTS_SAFETENSORS));
        dir
    }

    #[test]
    fn candidates_follow_declared_priority_order() {
        let root = Path::new("/bundled");
        let paths = candidate_paths(root, "all-mpnet-base-v2");
        assert_eq!(
            paths,
            vec![
                root.join("models--sentence-transformers--all-mpnet-base-v2"),
                root.join("all-mpnet-base-v2"),
                root.join("sentence-transformers--all-mpnet-base-v2"),
            ]
        );
    }

    #[test]
    fn namespaced_identifier_uses_final_segment() {
        let root = Path::new("/bundled");
        let paths = candidate_paths(root, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(
            paths[0],
            root.join("models--sentence-transformers--all-MiniLM-L6-v2")
        );
        assert_eq!(paths[1], root.join("all-MiniLM-L6-v2"));
    }

    #[test]
    fn first_existing_candidate_wins() {
        let temp = tempfile::tempdir().unwrap();
        // Both the bare-name and the cache-convention dirs exist; the
        // cache convention is declared first and must win.
        flat_model_dir(temp.path(), "all-mpnet-base-v2");
        flat_model_dir(
            temp.path(),
            "models--sentence-transformers--all-mpnet-base-v2",
        );

        let found = find_bundled(temp.path(), "all-mpnet-base-v2").unwrap();
        assert_eq!(
            found,
            temp.path()
                .join("models--sentence-transformers--all-mpnet-base-v2")
        );
    }

    #[test]
    fn lower_priority_candidate_found_when_alone() {
        let temp = tempfile::tempdir().unwrap();
        flat_model_dir(temp.path(), "sentence-transformers--all-mpnet-base-v2");

        let found = find_bundled(temp.path(), "all-mpnet-base-v2").unwrap();
        assert_eq!(
            found,
            temp.path().join("sentence-transformers--all-mpnet-base-v2")
        );
    }

    #[test]
    fn no_candidate_returns_none() {
        let temp = tempfile::tempdir().unwrap();
        assert!(find_bundled(temp.path(), "all-mpnet-base-v2").is_none());
    }

    #[test]
    fn flat_layout_files_are_located() {
        let temp = tempfile::tempdir().unwrap();
        let dir = flat_model_dir(temp.path(), "all-mpnet-base-v2");

        let files = locate_files(&dir).unwrap();
        assert_eq!(files.config, dir.join("config.json"));
        assert_eq!(files.weights, dir.join(WEIGHTS_SAFETENSORS));
    }

    #[test]
    fn snapshot_layout_follows_refs_main() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp
            .path()
            .join("models--sentence-transformers--all-mpnet-base-v2");
        let snapshot = dir.join("snapshots/abc123");
        touch(&snapshot.join("config.json"));
        touch(&snapshot.join("tokenizer.json"));
        touch(&snapshot.join(WEIGHTS_PYTORCH));
        fs::create_dir_all(dir.join("refs")).unwrap();
        fs::write(dir.join("refs/main"), "abc123\n").unwrap();

        let files = locate_files(&dir).unwrap();
        assert_eq!(files.config, snapshot.join("config.json"));
        assert_eq!(files.weights, snapshot.join(WEIGHTS_PYTORCH));
    }

    #[test]
    fn snapshot_layout_without_refs_picks_first_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("all-mpnet-base-v2");
        let snapshot = dir.join("snapshots/rev-a");
        touch(&snapshot.join("config.json"));
        touch(&snapshot.join("tokenizer.json"));
        touch(&snapshot.join(WEIGHTS_SAFETENSORS));

        let files = locate_files(&dir).unwrap();
        assert_eq!(files.config, snapshot.join("config.json"));
    }

    #[test]
    fn missing_weights_is_a_resolve_error() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("all-mpnet-base-v2");
        touch(&dir.join("config.json"));
        touch(&dir.join("tokenizer.json"));

        assert!(matches!(
            locate_files(&dir),
            Err(EmbeddingError::Resolve(_))
        ));
    }

    #[test]
    fn safetensors_preferred_over_pytorch_weights() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("all-mpnet-base-v2");
        touch(&dir.join("config.json"));
        touch(&dir.join("tokenizer.json"));
        touch(&dir.join(WEIGHTS_PYTORCH));
        touch(&dir.join(WEIGHTS_SAFETENSORS));

        let files = locate_files(&dir).unwrap();
        assert_eq!(files.weights, dir.join(WEIGHTS_SAFETENSORS));
    }

    #[test]
    fn bare_identifier_is_namespace_qualified_for_the_hub() {
        assert_eq!(
            qualified_repo_id("all-mpnet-base-v2"),
            "sentence-transformers/all-mpnet-base-v2"
        );
        assert_eq!(
            qualified_repo_id("sentence-transformers/all-mpnet-base-v2"),
            "sentence-transformers/all-mpnet-base-v2"
        );
    }

    #[tokio::test]
    async fn bundled_hit_resolves_without_network() {
        let temp = tempfile::tempdir().unwrap();
        let dir = flat_model_dir(
            temp.path(),
            "models--sentence-transformers--all-mpnet-base-v2",
        );

        let resolved = resolve_model("all-mpnet-base-v2", temp.path()).await.unwrap();
        assert_eq!(resolved.source, ModelSource::Bundled(dir.clone()));
        assert_eq!(resolved.files.config, dir.join("config.json"));
    }
}
