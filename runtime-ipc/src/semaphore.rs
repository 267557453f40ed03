//! Named counting semaphore (component I).
//!
//! Grounded on the original's POSIX backend (`sem_open`/`sem_wait`/
//! `sem_post`/`sem_unlink`) and, on Windows, `CreateSemaphoreW`/
//! `WaitForSingleObject`/`ReleaseSemaphore`. The user-visible `name` is
//! never used directly as the OS object name — [`crate::naming::platform_key`]
//! maps it to a short, alphabet-safe key so the same name always resolves
//! to the same kernel object across processes, regardless of what
//! characters the caller's name contains.

use multios_runtime_core::error::{Domain, Error, Code};

use crate::naming::platform_key;

/// How [`Semaphore::new`] should treat an existing OS object under the
/// same platform-key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Fail if the object already exists.
    Create,
    /// Create it if absent, open it if present.
    OpenOrCreate,
    /// Fail if the object does not already exist.
    Open,
}

/// A handle to a named, cross-process counting semaphore.
///
/// Multiple handles (in this process or another) can refer to the same
/// kernel object. Whichever handle calls [`Semaphore::take_ownership`]
/// causes the underlying OS object to be removed when *that* handle's
/// final close happens — handles without ownership never remove it.
pub struct Semaphore {
    name: String,
    platform_key: String,
    ownership: bool,
    imp: imp::SemaphoreImpl,
}

impl Semaphore {
    pub fn new(name: &str, initial_count: u32, mode: OpenMode) -> Result<Self, Error> {
        let platform_key = platform_key(name, "/rtsem-");
        let imp = imp::SemaphoreImpl::open(&platform_key, initial_count, mode)?;
        log::debug!("semaphore '{name}' ({platform_key}) opened in {mode:?} mode");
        Ok(Semaphore { name: name.to_owned(), platform_key, ownership: false, imp })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marks this handle as the owner: when it is dropped, the underlying
    /// OS object is removed rather than merely closed.
    pub fn take_ownership(&mut self) {
        self.ownership = true;
    }

    pub fn is_ownership_taken(&self) -> bool {
        self.ownership
    }

    /// Decrements the count, blocking if it is already zero. Retries
    /// internally on `EINTR`.
    pub fn acquire(&self) -> Result<(), Error> {
        self.imp.acquire()
    }

    /// Increments the count, waking one blocked acquirer if any.
    pub fn release(&self) -> Result<(), Error> {
        self.imp.release()
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        self.imp.close(self.ownership, &self.platform_key);
    }
}

#[cfg(unix)]
mod imp {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    pub struct SemaphoreImpl {
        handle: *mut libc::sem_t,
    }

    // `sem_t*` is safe to send/share: POSIX semaphores are designed for
    // cross-thread and cross-process use; the kernel serializes access.
    unsafe impl Send for SemaphoreImpl {}
    unsafe impl Sync for SemaphoreImpl {}

    impl SemaphoreImpl {
        pub fn open(platform_key: &str, initial_count: u32, mode: OpenMode) -> Result<Self, Error> {
            let c_name = CString::new(platform_key)
                .map_err(|_| Error::invalid_argument("semaphore name contains a null byte"))?;

            let flags = match mode {
                OpenMode::Create => libc::O_CREAT | libc::O_EXCL,
                OpenMode::OpenOrCreate => libc::O_CREAT,
                OpenMode::Open => 0,
            };

            let handle = unsafe {
                libc::sem_open(c_name.as_ptr(), flags, 0o666u32, initial_count as libc::c_uint)
            };

            if handle == libc::SEM_FAILED {
                return Err(translate_errno(std::io::Error::last_os_error()));
            }

            Ok(SemaphoreImpl { handle })
        }

        pub fn acquire(&self) -> Result<(), Error> {
            loop {
                let rc = unsafe { libc::sem_wait(self.handle) };
                if rc == 0 {
                    return Ok(());
                }
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() == Some(libc::EINTR) {
                    continue;
                }
                return Err(translate_errno(err));
            }
        }

        pub fn release(&self) -> Result<(), Error> {
            let rc = unsafe { libc::sem_post(self.handle) };
            if rc == 0 {
                Ok(())
            } else {
                Err(translate_errno(std::io::Error::last_os_error()))
            }
        }

        pub fn close(&mut self, ownership: bool, platform_key: &str) {
            unsafe {
                libc::sem_close(self.handle);
            }
            if ownership {
                if let Ok(c_name) = CString::new(platform_key) {
                    unsafe {
                        libc::sem_unlink(c_name.as_ptr());
                    }
                }
            }
            self.handle = ptr::null_mut();
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
            Some(n) => Error::with_native(Domain::Ipc, code, n, format!("semaphore: {err}")),
            None => Error::new(Domain::Ipc, code, format!("semaphore: {err}")),
        }
    }
}

#[cfg(windows)]
mod imp {
    use super::*;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE, WAIT_OBJECT_0};
    use windows_sys::Win32::System::Threading::{
        CreateSemaphoreW, OpenSemaphoreW, ReleaseSemaphore, WaitForSingleObject, INFINITE, SEMAPHORE_ALL_ACCESS,
    };

    pub struct SemaphoreImpl {
        handle: HANDLE,
    }

    unsafe impl Send for SemaphoreImpl {}
    unsafe impl Sync for SemaphoreImpl {}

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
    }

    impl SemaphoreImpl {
        pub fn open(platform_key: &str, initial_count: u32, mode: OpenMode) -> Result<Self, Error> {
            let wide_name = wide(platform_key);
            let handle = match mode {
                OpenMode::Open => unsafe {
                    OpenSemaphoreW(SEMAPHORE_ALL_ACCESS, 0, wide_name.as_ptr())
                },
                OpenMode::Create | OpenMode::OpenOrCreate => unsafe {
                    let h = CreateSemaphoreW(
                        std::ptr::null(),
                        initial_count as i32,
                        i32::MAX,
                        wide_name.as_ptr(),
                    );
                    if mode == OpenMode::Create && GetLastError() == ERROR_ALREADY_EXISTS {
                        CloseHandle(h);
                        0
                    } else {
                        h
                    }
                },
            };

            if handle == 0 {
                return Err(translate_last_error());
            }

            Ok(SemaphoreImpl { handle })
        }

        pub fn acquire(&self) -> Result<(), Error> {
            let rc = unsafe { WaitForSingleObject(self.handle, INFINITE) };
            if rc == WAIT_OBJECT_0 {
                Ok(())
            } else {
                Err(translate_last_error())
            }
        }

        pub fn release(&self) -> Result<(), Error> {
            let ok = unsafe { ReleaseSemaphore(self.handle, 1, std::ptr::null_mut()) };
            if ok != 0 {
                Ok(())
            } else {
                Err(translate_last_error())
            }
        }

        pub fn close(&mut self, _ownership: bool, _platform_key: &str) {
            // Windows named kernel objects are reference-counted by the
            // kernel itself; the last `CloseHandle` across every process
            // removes the object, so there is no separate "ownership"
            // unlink step the way POSIX's `sem_unlink` needs.
            if self.handle != 0 {
                unsafe {
                    CloseHandle(self.handle);
                }
                self.handle = 0;
            }
        }
    }

    fn translate_last_error() -> Error {
        let code = unsafe { GetLastError() };
        Error::with_native(Domain::Ipc, Code::Failed, code as i32, format!("semaphore: win32 error {code}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn unique_name(tag: &str) -> String {
        format!("rt-test-{tag}-{}", std::process::id())
    }

    #[test]
    fn create_then_acquire_release_round_trips() {
        let name = unique_name("sem-basic");
        let mut sem = Semaphore::new(&name, 1, OpenMode::OpenOrCreate).unwrap();
        sem.take_ownership();
        sem.acquire().unwrap();
        sem.release().unwrap();
    }

    #[test]
    fn count_of_ten_allows_ten_concurrent_acquires() {
        let name = unique_name("sem-count10");
        let mut sem = Semaphore::new(&name, 10, OpenMode::OpenOrCreate).unwrap();
        sem.take_ownership();
        for _ in 0..10 {
            sem.acquire().unwrap();
        }
        // Released back so Drop/unlink doesn't leave a held resource; the
        // 11th-blocks behavior is exercised in the two-thread scenario
        // below rather than here, since testing "blocks" single-threaded
        // would hang.
        for _ in 0..10 {
            sem.release().unwrap();
        }
    }

    #[test]
    fn shared_counter_guarded_by_count_one_semaphore() {
        let name = unique_name("sem-counter");
        let mut sem = Semaphore::new(&name, 1, OpenMode::OpenOrCreate).unwrap();
        sem.take_ownership();
        let sem = Arc::new(sem);
        let counter = Arc::new(AtomicI64::new(0));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let sem = Arc::clone(&sem);
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        sem.acquire().unwrap();
                        counter.fetch_add(1, Ordering::SeqCst);
                        sem.release().unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2000);
    }
}
