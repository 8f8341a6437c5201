//! Cleanup of generated speech artifacts.

use crate::error::SpeechError;
use haven_rs_config::RetentionConfig;
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Prefix of every file the bridge writes.
pub const ARTIFACT_PREFIX: &str = "tts_";

/// How many generated files to keep. The default keeps everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_files: Option<usize>,
    pub max_age: Option<Duration>,
}

impl From<&RetentionConfig> for RetentionPolicy {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            max_files: config.max_files,
            max_age: config.max_age_secs.map(Duration::from_secs),
        }
    }
}

impl RetentionPolicy {
    pub fn keeps_everything(&self) -> bool {
        self.max_files.is_none() && self.max_age.is_none()
    }
}

/// Delete `tts_*` files in `dir` older than `max_age`, then the oldest ones
/// beyond `max_files`. Returns how many files were removed.
pub fn prune_artifacts(dir: &Path, policy: &RetentionPolicy) -> Result<usize, SpeechError> {
    if policy.keeps_everything() {
        return Ok(0);
    }
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err.into()),
    };

    let mut artifacts: Vec<(PathBuf, SystemTime)> = Vec::new();
    for entry in listing {
        let entry = entry?;
        let is_artifact = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(ARTIFACT_PREFIX));
        let metadata = entry.metadata()?;
        if is_artifact && metadata.is_file() {
            artifacts.push((entry.path(), metadata.modified()?));
        }
    }
    // Oldest first; names break ties so the order is stable.
    artifacts.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let mut removed = 0;
    if let Some(max_age) = policy.max_age {
        let now = SystemTime::now();
        let mut kept = Vec::with_capacity(artifacts.len());
        for (path, modified) in artifacts {
            let age = now.duration_since(modified).unwrap_or_default();
            if age > max_age {
                debug!("removing expired artifact (path={})", path.display());
                fs::remove_file(&path)?;
                removed += 1;
            } else {
                kept.push((path, modified));
            }
        }
        artifacts = kept;
    }
    if let Some(max_files) = policy.max_files {
        let excess = artifacts.len().saturating_sub(max_files);
        for (path, _) in artifacts.iter().take(excess) {
            debug!("removing surplus artifact (path={})", path.display());
            fs::remove_file(path)?;
            removed += 1;
        }
    }
    info!(
        "pruned speech artifacts (dir={}, removed={})",
        dir.display(),
        removed
    );
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, age: Duration) {
        let path = dir.join(name);
        let file = File::create(&path).expect("create");
        file.set_modified(SystemTime::now() - age).expect("mtime");
    }

    #[test]
    fn default_policy_removes_nothing() {
        let temp = TempDir::new().expect("tmp");
        touch(temp.path(), "tts_a.mp3", Duration::from_secs(10_000));
        assert_eq!(
            prune_artifacts(temp.path(), &RetentionPolicy::default()).expect("prune"),
            0
        );
        assert!(temp.path().join("tts_a.mp3").exists());
    }

    #[test]
    fn oldest_files_beyond_the_cap_are_removed() {
        let temp = TempDir::new().expect("tmp");
        touch(temp.path(), "tts_old.mp3", Duration::from_secs(300));
        touch(temp.path(), "tts_mid.mp3", Duration::from_secs(200));
        touch(temp.path(), "tts_new.mp3", Duration::from_secs(100));
        touch(temp.path(), "keep.txt", Duration::from_secs(900));

        let policy = RetentionPolicy {
            max_files: Some(1),
            max_age: None,
        };
        assert_eq!(prune_artifacts(temp.path(), &policy).expect("prune"), 2);
        assert!(temp.path().join("tts_new.mp3").exists());
        assert!(!temp.path().join("tts_old.mp3").exists());
        assert!(temp.path().join("keep.txt").exists());
    }

    #[test]
    fn expired_files_are_removed() {
        let temp = TempDir::new().expect("tmp");
        touch(temp.path(), "tts_stale.wav", Duration::from_secs(7_200));
        touch(temp.path(), "tts_fresh.wav", Duration::from_secs(1));
        let policy = RetentionPolicy {
            max_files: None,
            max_age: Some(Duration::from_secs(3_600)),
        };
        assert_eq!(prune_artifacts(temp.path(), &policy).expect("prune"), 1);
        assert!(temp.path().join("tts_fresh.wav").exists());
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = TempDir::new().expect("tmp");
        let policy = RetentionPolicy {
            max_files: Some(0),
            max_age: None,
        };
        assert_eq!(
            prune_artifacts(&temp.path().join("absent"), &policy).expect("prune"),
            0
        );
    }
}
