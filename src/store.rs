//! Saved-set files on disk.
//!
//! Each saved set is its own JSON file in the data directory, named
//! `<set_name>_set.json`. Discovery is a directory scan for that suffix,
//! and writes go through a temp file plus rename so a crash mid-save never
//! leaves a half-written set behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, TimerError};
use crate::task::SavedSet;

const SET_SUFFIX: &str = "_set";

/// A discovered saved-set file, before its contents are parsed.
#[derive(Debug, Clone)]
pub struct SetFile {
    pub name: String,
    pub display_name: String,
    pub path: PathBuf,
}

/// Lowercase, alphanumeric-and-underscore form of a set name, used for the
/// file name so `Deep Work!` and `deep work` refer to the same set.
pub fn sanitize_set_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// File path a set with this display name saves to.
pub fn set_path(dir: &Path, display_name: &str) -> PathBuf {
    dir.join(format!("{}{}.json", sanitize_set_name(display_name), SET_SUFFIX))
}

fn set_file_from(path: PathBuf) -> Option<SetFile> {
    let stem = path.file_stem()?.to_str()?;
    let name = stem.strip_suffix(SET_SUFFIX)?;
    if name.is_empty() {
        return None;
    }
    Some(SetFile {
        name: name.to_string(),
        display_name: name.replace('_', " "),
        path,
    })
}

/// All saved-set files in the directory, sorted by name. A missing
/// directory is just an empty list.
pub fn discover_sets(dir: &Path) -> Result<Vec<SetFile>> {
    let mut sets = Vec::new();
    if !dir.exists() {
        return Ok(sets);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            if let Some(set_file) = set_file_from(path) {
                sets.push(set_file);
            }
        }
    }
    sets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sets)
}

/// Load one saved set by display name.
pub fn load_set(dir: &Path, display_name: &str) -> Result<SavedSet> {
    let path = set_path(dir, display_name);
    if !path.exists() {
        return Err(TimerError::UnknownSet(display_name.trim().to_string()));
    }
    let contents = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load every discovered set, skipping files that no longer parse. Used by
/// listings, where one corrupt file should not hide the rest.
pub fn load_all(dir: &Path) -> Result<Vec<(SetFile, SavedSet)>> {
    let mut out = Vec::new();
    for set_file in discover_sets(dir)? {
        match fs::read_to_string(&set_file.path)
            .map_err(TimerError::from)
            .and_then(|s| serde_json::from_str(&s).map_err(TimerError::from))
        {
            Ok(set) => out.push((set_file, set)),
            Err(e) => eprintln!("Skipping {}: {e}", set_file.path.display()),
        }
    }
    Ok(out)
}

/// Write a set to its file, creating the directory on first use.
/// Re-saving a name overwrites the previous contents.
pub fn save_set(dir: &Path, set: &SavedSet) -> Result<PathBuf> {
    if sanitize_set_name(&set.name).is_empty() {
        return Err(TimerError::invalid("the set needs a name"));
    }
    fs::create_dir_all(dir)?;
    let path = set_path(dir, &set.name);
    // Atomic-ish write via temp + rename.
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)?;
    let data = serde_json::to_string_pretty(set)?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(tmp, &path)?;
    Ok(path)
}

/// Remove a saved set's file.
pub fn delete_set(dir: &Path, display_name: &str) -> Result<()> {
    let path = set_path(dir, display_name);
    if !path.exists() {
        return Err(TimerError::UnknownSet(display_name.trim().to_string()));
    }
    fs::remove_file(path)?;
    Ok(())
}
