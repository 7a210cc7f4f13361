//! Git-backed revision store.
//!
//! Shells out to `git` the same way other external tools are driven here:
//! capture output, treat a spawn failure as "not available", and keep stderr
//! for diagnostics.
use super::{HistoryError, RevisionStore, UnitDates};
use crate::sources::SourceUnit;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Revision compared against: the last commit on the current branch.
const BASELINE_REVISION: &str = "HEAD";

#[derive(Debug, Clone)]
pub struct GitRevisionStore {
    workdir: PathBuf,
}

impl GitRevisionStore {
    /// Open history for the repository containing `dir`.
    ///
    /// Fails with [`HistoryError::Unavailable`] when `git` is missing, `dir` is
    /// outside a repository, or the repository has no commits yet.
    pub fn discover(dir: &Path) -> Result<Self, HistoryError> {
        let output = git_output(dir, &["rev-parse", "--verify", "--quiet", BASELINE_REVISION])
            .map_err(|_| HistoryError::Unavailable)?;
        if !output.status.success() {
            tracing::debug!(
                dir = %dir.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "no committed revision"
            );
            return Err(HistoryError::Unavailable);
        }
        Ok(Self {
            workdir: dir.to_path_buf(),
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run git in the unit's directory so nested repositories resolve too.
    fn unit_location<'u>(&self, unit: &'u SourceUnit) -> Result<(PathBuf, &'u str), HistoryError> {
        let file_name = unit
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| HistoryError::Io {
                unit: unit.name.clone(),
                message: "unit path has no UTF-8 file name".to_string(),
            })?;
        let dir = match unit.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.workdir.clone(),
        };
        Ok((dir, file_name))
    }
}

impl RevisionStore for GitRevisionStore {
    fn is_available(&self) -> bool {
        true
    }

    /// `cat-file --filters` applies the same eol and smudge conversion as a
    /// checkout, so a clean file matches its working-tree bytes even under
    /// `core.autocrlf` or `eol=crlf` attributes.
    fn committed_content(&self, unit: &SourceUnit) -> Result<Vec<u8>, HistoryError> {
        let (dir, file_name) = self.unit_location(unit)?;
        let object = format!("{BASELINE_REVISION}:./{file_name}");
        let output = git_output(&dir, &["cat-file", "--filters", &object])
            .map_err(|_| HistoryError::Unavailable)?;
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.contains("exists on disk, but not in")
            || stderr.contains("does not exist in")
        {
            return Err(HistoryError::Untracked {
                unit: unit.name.clone(),
            });
        }
        Err(HistoryError::Git {
            unit: unit.name.clone(),
            stderr,
        })
    }

    fn unit_dates(&self, unit: &SourceUnit) -> Option<UnitDates> {
        let (dir, file_name) = self.unit_location(unit).ok()?;
        let output = git_output(
            &dir,
            &["log", "--follow", "--format=%cI", BASELINE_REVISION, "--", file_name],
        )
        .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_log_dates(&String::from_utf8_lossy(&output.stdout))
    }
}

fn git_output(dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .env("LC_ALL", "C")
        .output()
}

/// `git log` lists newest first: the first line is the latest commit, the
/// last line the one that introduced the file.
fn parse_log_dates(stdout: &str) -> Option<UnitDates> {
    let dates = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| DateTime::parse_from_rfc3339(line).ok())
        .map(|date| date.with_timezone(&Utc))
        .collect::<Vec<_>>();
    let committed = *dates.first()?;
    let created = *dates.last()?;
    Some(UnitDates { created, committed })
}
