use crate::error::{IconError, Result};
use std::path::{Path, PathBuf};

//===========================================================================//

/// Picks an output path next to `source`: the same name with an `.ico`
/// extension, or `name-1.ico`, `name-2.ico`, ... if that is already taken.
pub fn default_output_path(source: &Path) -> PathBuf {
    let path = source.with_extension("ico");
    if !path.exists() {
        return path;
    }
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "icon".to_string());
    let mut index: u32 = 0;
    loop {
        index += 1;
        let candidate = path.with_file_name(format!("{}-{}.ico", stem, index));
        if !candidate.exists() {
            return candidate;
        }
    }
}

/// Fails with `SourceNotFound` unless `source` is an existing file.
pub fn check_source(source: &Path) -> Result<()> {
    if source.is_file() {
        Ok(())
    } else {
        Err(IconError::SourceNotFound(source.to_path_buf()))
    }
}

/// Fails with `InvalidTargetState` if writing `target` would clobber
/// something the caller didn't agree to overwrite.
pub fn check_target(target: &Path, overwrite: bool) -> Result<()> {
    if target.is_dir() {
        return Err(IconError::target(target, "path is a directory"));
    }
    if target.exists() && !overwrite {
        return Err(IconError::target(
            target,
            "file already exists (use --force to overwrite)",
        ));
    }
    Ok(())
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{check_source, check_target, default_output_path};
    use crate::error::IconError;
    use std::fs;

    #[test]
    fn default_path_swaps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("logo.png");
        assert_eq!(default_output_path(&source), dir.path().join("logo.ico"));
    }

    #[test]
    fn default_path_adds_numeric_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("logo.png");
        fs::write(dir.path().join("logo.ico"), b"").unwrap();
        fs::write(dir.path().join("logo-1.ico"), b"").unwrap();
        assert_eq!(
            default_output_path(&source),
            dir.path().join("logo-2.ico")
        );
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("missing.png");
        match check_source(&source) {
            Err(IconError::SourceNotFound(path)) => assert_eq!(path, source),
            other => panic!("unexpected {:?}", other),
        }
        assert!(check_source(dir.path()).is_err());
    }

    #[test]
    fn existing_target_needs_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.ico");
        check_target(&target, false).unwrap();
        fs::write(&target, b"").unwrap();
        match check_target(&target, false) {
            Err(IconError::InvalidTargetState { path, .. }) => {
                assert_eq!(path, target)
            }
            other => panic!("unexpected {:?}", other),
        }
        check_target(&target, true).unwrap();
        assert!(check_target(dir.path(), true).is_err());
    }
}

//===========================================================================//
