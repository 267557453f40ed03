//! Process identification (component O), grounded on the original's
//! `pprocess.c` (`p_process_get_current_pid`, `p_process_is_running`).
//! Spawning is explicitly out of scope (Non-goal); this module only
//! answers "who am I" and "is that pid alive".

use std::path::PathBuf;

pub fn pid() -> u32 {
    std::process::id()
}

pub fn current_exe_path() -> Option<PathBuf> {
    std::env::current_exe().ok()
}

/// Checks whether `pid` currently names a live process.
#[cfg(unix)]
pub fn is_running(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(windows)]
pub fn is_running(pid: u32) -> bool {
    use windows_sys::Win32::Foundation::{CloseHandle, WAIT_TIMEOUT};
    use windows_sys::Win32::System::Threading::{OpenProcess, WaitForSingleObject, PROCESS_SYNCHRONIZE};

    unsafe {
        let handle = OpenProcess(PROCESS_SYNCHRONIZE, 0, pid);
        if handle.is_null() {
            return false;
        }
        let result = WaitForSingleObject(handle, 0);
        CloseHandle(handle);
        result == WAIT_TIMEOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_matches_current_process_and_reports_as_running() {
        let this_pid = pid();
        assert!(this_pid > 0);
        assert!(is_running(this_pid));
    }

    #[test]
    fn current_exe_path_resolves_to_an_existing_file() {
        let path = current_exe_path().expect("current_exe should resolve under test");
        assert!(path.is_file());
    }
}
