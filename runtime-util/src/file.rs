//! Thin filesystem wrappers (component O) translating `std::io::Error`
//! into the shared [`Error`] taxonomy, mirroring the original's `pfile.h`
//! surface without reinventing `std::fs`.

use std::path::Path;

use multios_runtime_core::error::{Domain, Error};

pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

pub fn is_exists_as_file(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

pub fn remove(path: impl AsRef<Path>) -> Result<(), Error> {
    std::fs::remove_file(path.as_ref()).map_err(|e| Error::from_io(Domain::Io, e))
}

pub fn read_to_string(path: impl AsRef<Path>) -> Result<String, Error> {
    std::fs::read_to_string(path.as_ref()).map_err(|e| Error::from_io(Domain::Io, e))
}

pub fn write(path: impl AsRef<Path>, contents: &[u8]) -> Result<(), Error> {
    std::fs::write(path.as_ref(), contents).map_err(|e| Error::from_io(Domain::Io, e))
}
