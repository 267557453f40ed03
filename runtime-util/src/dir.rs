//! Directory walking and recursive removal (component O), mirroring the
//! original's `pdir.h` surface as a thin wrapper over `std::fs`.

use std::path::{Path, PathBuf};

use multios_runtime_core::error::{Domain, Error};

/// Yields the direct children of `path` (non-recursive), matching the
/// original's `PDir` iterator semantics.
pub fn entries(path: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(path.as_ref()).map_err(|e| Error::from_io(Domain::Io, e))? {
        let entry = entry.map_err(|e| Error::from_io(Domain::Io, e))?;
        out.push(entry.path());
    }
    Ok(out)
}

pub fn create(path: impl AsRef<Path>) -> Result<(), Error> {
    std::fs::create_dir_all(path.as_ref()).map_err(|e| Error::from_io(Domain::Io, e))
}

/// Recursively removes `path` and everything under it.
pub fn remove_recursive(path: impl AsRef<Path>) -> Result<(), Error> {
    std::fs::remove_dir_all(path.as_ref()).map_err(|e| Error::from_io(Domain::Io, e))
}

pub fn is_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_list_and_remove_recursive() {
        let root = std::env::temp_dir().join(format!("multios-runtime-util-dir-test-{:?}", std::thread::current().id()));
        create(root.join("nested")).unwrap();
        std::fs::write(root.join("nested/file.txt"), b"x").unwrap();

        assert!(is_exists(&root));
        let top_level = entries(&root).unwrap();
        assert_eq!(top_level.len(), 1);

        remove_recursive(&root).unwrap();
        assert!(!is_exists(&root));
    }
}
