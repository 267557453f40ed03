//! Named shared memory region (component J).
//!
//! Grounded on the original's `pshm.c`/`pshm-win.c` split: POSIX uses
//! `shm_open`+`ftruncate`+`mmap`, Windows uses `CreateFileMappingW`+
//! `MapViewOfFile`. Every region owns a companion named semaphore (same
//! platform-key, initial count 1) used by [`Shm::lock`]/[`Shm::unlock`] —
//! the spec's "integrated lock" — rather than requiring callers to manage
//! a separate synchronization primitive.

use multios_runtime_core::error::Error;

use crate::naming::platform_key;
use crate::semaphore::{OpenMode, Semaphore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPerms {
    ReadOnly,
    ReadWrite,
}

/// A mapped, named region of memory shared across processes.
pub struct Shm {
    name: String,
    platform_key: String,
    size: usize,
    perms: AccessPerms,
    ownership: bool,
    guard: Semaphore,
    imp: imp::ShmImpl,
}

impl Shm {
    /// Opens or creates a region named `name`. If a region with the same
    /// platform-key already exists, `size` is ignored in favor of the
    /// existing region's actual size (mirrors the original: "size may be
    /// adjusted to the existing region's size").
    pub fn new(name: &str, size: usize, perms: AccessPerms) -> Result<Self, Error> {
        let platform_key = platform_key(name, "/rtshm-");
        let (imp, actual_size) = imp::ShmImpl::open(&platform_key, size, perms)?;

        let guard = Semaphore::new(name, 1, OpenMode::OpenOrCreate)?;

        log::debug!("shm '{name}' ({platform_key}) opened, size {actual_size}");
        Ok(Shm {
            name: name.to_owned(),
            platform_key,
            size: actual_size,
            perms,
            ownership: false,
            guard,
            imp,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_size(&self) -> usize {
        self.size
    }

    pub fn perms(&self) -> AccessPerms {
        self.perms
    }

    /// Raw base address of the mapped region.
    ///
    /// # Safety
    /// Callers must not read/write past `get_size()` bytes and must
    /// synchronize access themselves (typically via [`Shm::lock`]).
    pub unsafe fn get_address(&self) -> *mut u8 {
        self.imp.addr()
    }

    /// A safe view of the whole region, valid as long as `&self` is
    /// borrowed. Does not itself take the guard lock.
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.imp.addr(), self.size) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.imp.addr(), self.size) }
    }

    /// Acquires the region's guard semaphore.
    pub fn lock(&self) -> Result<(), Error> {
        self.guard.acquire()
    }

    /// Releases the region's guard semaphore.
    pub fn unlock(&self) -> Result<(), Error> {
        self.guard.release()
    }

    /// Marks this handle as owner: on drop, the OS object (and the guard
    /// semaphore) are removed rather than merely unmapped/closed.
    pub fn take_ownership(&mut self) {
        self.ownership = true;
        self.guard.take_ownership();
    }

    pub fn is_ownership_taken(&self) -> bool {
        self.ownership
    }
}

impl Drop for Shm {
    fn drop(&mut self) {
        self.imp.close(self.ownership, &self.platform_key);
    }
}

#[cfg(unix)]
mod imp {
    use super::*;
    use multios_runtime_core::error::{Code, Domain};
    use std::ffi::CString;
    use std::ptr;

    pub struct ShmImpl {
        fd: libc::c_int,
        addr: *mut u8,
        map_size: usize,
    }

    unsafe impl Send for ShmImpl {}
    unsafe impl Sync for ShmImpl {}

    impl ShmImpl {
        pub fn open(platform_key: &str, size: usize, perms: AccessPerms) -> Result<(Self, usize), Error> {
            let c_name = CString::new(platform_key)
                .map_err(|_| Error::invalid_argument("shm name contains a null byte"))?;

            let oflag_rw = libc::O_CREAT | libc::O_RDWR;
            let fd = unsafe { libc::shm_open(c_name.as_ptr(), oflag_rw, 0o666) };
            if fd < 0 {
                return Err(translate_errno(std::io::Error::last_os_error()));
            }

            let mut stat: libc::stat = unsafe { std::mem::zeroed() };
            if unsafe { libc::fstat(fd, &mut stat) } != 0 {
                unsafe { libc::close(fd) };
                return Err(translate_errno(std::io::Error::last_os_error()));
            }

            let existing_size = stat.st_size as usize;
            let map_size = if existing_size > 0 { existing_size } else { size.max(1) };

            if existing_size == 0 && unsafe { libc::ftruncate(fd, map_size as libc::off_t) } != 0 {
                unsafe { libc::close(fd) };
                return Err(translate_errno(std::io::Error::last_os_error()));
            }

            let prot = match perms {
                AccessPerms::ReadOnly => libc::PROT_READ,
                AccessPerms::ReadWrite => libc::PROT_READ | libc::PROT_WRITE,
            };

            let addr = unsafe {
                libc::mmap(ptr::null_mut(), map_size, prot, libc::MAP_SHARED, fd, 0)
            };
            if addr == libc::MAP_FAILED {
                unsafe { libc::close(fd) };
                return Err(translate_errno(std::io::Error::last_os_error()));
            }

            Ok((ShmImpl { fd, addr: addr as *mut u8, map_size }, map_size))
        }

        pub fn addr(&self) -> *mut u8 {
            self.addr
        }

        pub fn close(&mut self, ownership: bool, platform_key: &str) {
            if !self.addr.is_null() {
                unsafe {
                    libc::munmap(self.addr as *mut libc::c_void, self.map_size);
                }
                self.addr = ptr::null_mut();
            }
            if self.fd >= 0 {
                unsafe {
                    libc::close(self.fd);
                }
                self.fd = -1;
            }
            if ownership {
                if let Ok(c_name) = CString::new(platform_key) {
                    unsafe {
                        libc::shm_unlink(c_name.as_ptr());
                    }
                }
            }
        }
    }

    fn translate_errno(err: std::io::Error) -> Error {
        let code = match err.raw_os_error() {
            Some(libc::EEXIST) => Code::AddressInUse,
            Some(libc::ENOENT) => Code::NotAvailable,
            Some(libc::EACCES) => Code::AccessDenied,
            Some(libc::ENOSPC) | Some(libc::ENFILE) | Some(libc::EMFILE) => Code::NoResources,
            Some(libc::EINVAL) => Code::InvalidArgument,
            _ => Code::Failed,
        };
        match err.raw_os_error() {
            Some(n) => Error::with_native(Domain::Ipc, code, n, format!("shm: {err}")),
            None => Error::new(Domain::Ipc, code, format!("shm: {err}")),
        }
    }
}

#[cfg(windows)]
mod imp {
    use super::*;
    use multios_runtime_core::error::{Code, Domain};
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, HANDLE};
    use windows_sys::Win32::System::Memory::{
        CreateFileMappingW, MapViewOfFile, UnmapViewOfFile, VirtualQuery, FILE_MAP_ALL_ACCESS, FILE_MAP_READ,
        MEMORY_BASIC_INFORMATION, PAGE_READONLY, PAGE_READWRITE,
    };

    pub struct ShmImpl {
        mapping: HANDLE,
        addr: *mut u8,
        map_size: usize,
    }

    unsafe impl Send for ShmImpl {}
    unsafe impl Sync for ShmImpl {}

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
    }

    impl ShmImpl {
        pub fn open(platform_key: &str, size: usize, perms: AccessPerms) -> Result<(Self, usize), Error> {
            let wide_name = wide(platform_key);
            let protect = match perms {
                AccessPerms::ReadOnly => PAGE_READONLY,
                AccessPerms::ReadWrite => PAGE_READWRITE,
            };
            let size = size.max(1) as u64;
            let high = (size >> 32) as u32;
            let low = (size & 0xFFFF_FFFF) as u32;

            let mapping = unsafe {
                CreateFileMappingW(
                    windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE,
                    std::ptr::null(),
                    protect,
                    high,
                    low,
                    wide_name.as_ptr(),
                )
            };
            if mapping == 0 {
                return Err(translate_last_error());
            }

            let map_access = match perms {
                AccessPerms::ReadOnly => FILE_MAP_READ,
                AccessPerms::ReadWrite => FILE_MAP_ALL_ACCESS,
            };
            let addr = unsafe { MapViewOfFile(mapping, map_access, 0, 0, 0) };
            if addr.Value.is_null() {
                unsafe { CloseHandle(mapping) };
                return Err(translate_last_error());
            }

            let mut info: MEMORY_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
            let actual_size = unsafe {
                let written = VirtualQuery(addr.Value as *const _, &mut info, std::mem::size_of_val(&info));
                if written != 0 {
                    info.RegionSize
                } else {
                    size as usize
                }
            };

            Ok((ShmImpl { mapping, addr: addr.Value as *mut u8, map_size: actual_size }, actual_size))
        }

        pub fn addr(&self) -> *mut u8 {
            self.addr
        }

        pub fn close(&mut self, _ownership: bool, _platform_key: &str) {
            if !self.addr.is_null() {
                unsafe {
                    UnmapViewOfFile(windows_sys::Win32::System::Memory::MEMORY_MAPPED_VIEW_ADDRESS {
                        Value: self.addr as *mut _,
                    });
                }
                self.addr = std::ptr::null_mut();
            }
            if self.mapping != 0 {
                unsafe {
                    CloseHandle(self.mapping);
                }
                self.mapping = 0;
            }
        }
    }

    fn translate_last_error() -> Error {
        let code = unsafe { GetLastError() };
        Error::with_native(Domain::Ipc, Code::Failed, code as i32, format!("shm: win32 error {code}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("rt-test-{tag}-{}", std::process::id())
    }

    #[test]
    fn new_region_is_zeroed_and_sized() {
        let mut shm = Shm::new(&unique_name("shm-basic"), 4096, AccessPerms::ReadWrite).unwrap();
        shm.take_ownership();
        assert!(shm.get_size() >= 4096);
        assert!(shm.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn lock_unlock_round_trips() {
        let mut shm = Shm::new(&unique_name("shm-lock"), 4096, AccessPerms::ReadWrite).unwrap();
        shm.take_ownership();
        shm.lock().unwrap();
        shm.as_mut_slice()[0] = 0xAB;
        shm.unlock().unwrap();
        assert_eq!(shm.as_slice()[0], 0xAB);
    }
}
