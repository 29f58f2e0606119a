use crate::config::ScratchPolicy;
use crate::error::AppError;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Scratch directory used by one run of the silence pipeline.
///
/// Nothing is removed implicitly: the owner calls [`ScratchSpace::finish`]
/// once everything consuming the scratch files is done, and the policy decides
/// whether they are purged or kept for inspection. Only files handed out by
/// [`ScratchSpace::file`] are purged, and the directory itself only when this
/// run created it.
#[derive(Debug)]
pub struct ScratchSpace {
    path: PathBuf,
    policy: ScratchPolicy,
    created_dir: bool,
    files: RefCell<BTreeSet<PathBuf>>,
}

impl ScratchSpace {
    /// Use `<parent>/tmp`, creating it if needed
    pub fn create(parent: &Path, policy: ScratchPolicy) -> Result<Self, AppError> {
        let path = parent.join("tmp");
        let created_dir = !path.exists();
        std::fs::create_dir_all(&path)?;
        Ok(Self {
            path,
            policy,
            created_dir,
            files: RefCell::new(BTreeSet::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a scratch file, tracked for purging
    pub fn file(&self, name: &str) -> PathBuf {
        let file = self.path.join(name);
        self.files.borrow_mut().insert(file.clone());
        file
    }

    /// Apply the policy. Returns `true` when the scratch files were purged.
    pub fn finish(self, succeeded: bool) -> bool {
        if !self.policy.should_purge(succeeded) {
            info!(
                "Keeping scratch files in {} (clear it periodically)",
                self.path.display()
            );
            return false;
        }

        let mut purged = true;
        for file in self.files.take() {
            match std::fs::remove_file(&file) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove scratch file {}: {}", file.display(), e);
                    purged = false;
                }
            }
        }

        if self.created_dir
            && let Err(e) = std::fs::remove_dir(&self.path)
        {
            warn!(
                "Scratch directory {} left in place: {}",
                self.path.display(),
                e
            );
        }

        if purged {
            info!("Removed scratch files from {}", self.path.display());
        }
        purged
    }
}
