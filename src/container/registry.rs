//! Process-wide container registry
//!
//! Tracks which container files are open in this process. The registry is
//! brought up by the first open and torn down when the last session
//! closes. A write session is exclusive; read-only sessions may share a
//! file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{const_mutex, Mutex};

use crate::error::BackendError;

/// How a session uses its file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

#[derive(Debug)]
enum Sessions {
    Readers(usize),
    Writer,
}

/// `None` while no container is open
static REGISTRY: Mutex<Option<HashMap<PathBuf, Sessions>>> = const_mutex(None);

/// Registration of one open session; released on drop
#[derive(Debug)]
pub(crate) struct Lease {
    key: PathBuf,
}

/// Register a session on `path`, rejecting conflicting access
pub(crate) fn acquire(path: &Path, access: Access) -> Result<Lease, BackendError> {
    let key = session_key(path);
    let mut guard = REGISTRY.lock();

    let sessions = guard.get_or_insert_with(|| {
        tracing::debug!("container registry initialised");
        HashMap::new()
    });

    match sessions.get_mut(&key) {
        None => {
            let entry = match access {
                Access::Read => Sessions::Readers(1),
                Access::Write => Sessions::Writer,
            };
            sessions.insert(key.clone(), entry);
        }
        Some(Sessions::Readers(n)) if access == Access::Read => *n += 1,
        Some(current) => {
            let held = match current {
                Sessions::Writer => "a write session",
                Sessions::Readers(_) => "read sessions",
            };
            return Err(BackendError::file(format!(
                "{} is already held by {}",
                path.display(),
                held
            )));
        }
    }

    Ok(Lease { key })
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut guard = REGISTRY.lock();
        let Some(sessions) = guard.as_mut() else {
            return;
        };

        let remove = match sessions.get_mut(&self.key) {
            Some(Sessions::Readers(n)) if *n > 1 => {
                *n -= 1;
                false
            }
            Some(_) => true,
            None => false,
        };
        if remove {
            sessions.remove(&self.key);
        }

        if sessions.is_empty() {
            *guard = None;
            tracing::debug!("container registry torn down");
        }
    }
}

/// Whether any session in this process has `path` open
pub fn is_open(path: &Path) -> bool {
    let key = session_key(path);
    REGISTRY
        .lock()
        .as_ref()
        .map_or(false, |sessions| sessions.contains_key(&key))
}

/// Whether the registry currently holds any session
pub fn is_active() -> bool {
    REGISTRY.lock().is_some()
}

/// Stable key for a path, resolving symlinks and relative components
fn session_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }

    // Not created yet: resolve the parent directory instead
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
