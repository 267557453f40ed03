//! Dynamic library loading (component O), grounded on the original's
//! `plibraryloader.h` contract (`open`/`get_symbol`/`close`) but backed by
//! the `libloading` crate — the teacher is `no_std` and hand-rolls
//! `dlopen`/`LoadLibrary`, but this repo links `std` and this is the one
//! subsystem that genuinely needs dynamic loading, so it reaches for the
//! ecosystem crate rather than re-deriving the platform shims.

use std::path::Path;

use libloading::{Library, Symbol};
use multios_runtime_core::error::{Code, Domain, Error};

pub struct LibraryLoader {
    path: String,
    lib: Library,
}

impl LibraryLoader {
    /// Loads the shared object/DLL at `path`.
    ///
    /// # Safety
    /// Loading arbitrary native code runs its initializers in this
    /// process; the caller must trust `path`'s contents, exactly as with
    /// `dlopen`/`LoadLibrary`.
    pub unsafe fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let lib = Library::new(path)
            .map_err(|e| Error::new(Domain::Io, Code::Failed, format!("failed to load library {}: {e}", path.display())))?;
        Ok(LibraryLoader { path: path.display().to_string(), lib })
    }

    /// Resolves a symbol by name and returns it typed as `*const ()`; the
    /// caller transmutes it to the expected function/data pointer type,
    /// matching the original's untyped `p_library_loader_get_symbol`.
    ///
    /// # Safety
    /// The caller must know the real type of the named symbol.
    pub unsafe fn get_symbol(&self, name: &str) -> Result<*const (), Error> {
        let symbol: Symbol<'_, *const ()> = self
            .lib
            .get(name.as_bytes())
            .map_err(|e| Error::new(Domain::Io, Code::NotAvailable, format!("symbol {name} not found in {}: {e}", self.path)))?;
        Ok(*symbol)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_nonexistent_library_fails() {
        let result = unsafe { LibraryLoader::open("/definitely/not/a/real/library.so") };
        assert!(result.is_err());
    }
}
