use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Collapse `.` / `..` lexically while ensuring the key never climbs above the storage root.
fn normalize_relative(key: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for c in key.components() {
        match c {
            Component::CurDir => {},
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(StorageError::PathTraversalAttempt {
                        message: key.display().to_string().into(),
                        context: Some("Key attempted to escape the storage root via '..'".into()),
                    });
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::PathTraversalAttempt {
                    message: key.display().to_string().into(),
                    context: Some("Absolute keys must be read verbatim, not resolved".into()),
                });
            },
        }
    }

    if out.as_os_str().is_empty() {
        return Err(StorageError::invalid("Key resolves to the storage root itself"));
    }

    Ok(out)
}

/// Joins a relative key to the root and verifies the result stays inside it.
pub(crate) fn resolve_key(root: &Path, key: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let safe_rel = normalize_relative(key.as_ref())?;
    let joined = root.join(safe_rel);

    match joined.canonicalize() {
        Ok(canonical) => validate_canonical(root, canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => validate_path(root, &joined),
        Err(e) => Err(StorageError::Io { source: e, context: Some("Failed to resolve key".into()) }),
    }
}

fn validate_canonical(root: &Path, canonical: PathBuf) -> Result<PathBuf, StorageError> {
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(StorageError::PathTraversalAttempt {
            message: canonical.display().to_string().into(),
            context: Some("Key resolves outside the storage root".into()),
        })
    }
}

/// Checks a not-yet-existing target through its nearest existing ancestor.
///
/// The ancestor is canonicalized so a symlinked directory cannot redirect writes outside
/// the root.
fn validate_path(root: &Path, joined: &Path) -> Result<PathBuf, StorageError> {
    if !joined.starts_with(root) {
        return Err(StorageError::PathTraversalAttempt {
            message: joined.display().to_string().into(),
            context: Some("Key is outside the storage root".into()),
        });
    }

    let mut current = joined.parent();

    while let Some(path) = current {
        if path == root {
            return Ok(joined.to_path_buf());
        }

        if path.exists() {
            return match path.canonicalize() {
                Ok(canonical) if canonical.starts_with(root) => Ok(joined.to_path_buf()),
                Ok(canonical) => Err(StorageError::PathTraversalAttempt {
                    message: canonical.display().to_string().into(),
                    context: Some("Existing parent directory links outside the root".into()),
                }),
                Err(e) => Err(StorageError::Io {
                    source: e,
                    context: Some("Failed to verify parent directory".into()),
                }),
            };
        }

        current = path.parent();
    }

    Err(StorageError::PathTraversalAttempt {
        message: joined.display().to_string().into(),
        context: Some("No ancestor found within the storage root".into()),
    })
}

/// Renders a path below `root` as a `/`-separated key.
pub(crate) fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| match c {
            Component::Normal(seg) => seg.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
