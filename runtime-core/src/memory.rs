//! Process-wide swappable allocator vtable (component B).
//!
//! Grounded on the teacher's `memory-manager` library, which keeps a single
//! allocator behind a lock-guarded slot that callers install once at
//! startup. The C surface this mirrors is three raw function pointers
//! (`malloc`, `realloc`, `free`); Rust's `Vec`/`Box` do not route through an
//! installable vtable without `#[global_allocator]`, which is a
//! whole-program decision out of scope for a library crate. Instead this
//! vtable backs the explicit allocation calls made by `runtime-ipc`'s SHM
//! buffer header and `runtime-util`'s hash table, exactly the two
//! components in this workspace that need caller-controlled allocation
//! rather than ordinary Rust collections.

use std::sync::OnceLock;
use parking_lot::Mutex;

use crate::error::{Code, Domain, Error};

/// Raw allocator entry points, matching the spec's `{malloc, realloc, free}`
/// triple.
#[derive(Clone, Copy)]
pub struct VTable {
    pub malloc: unsafe fn(usize) -> *mut u8,
    pub realloc: unsafe fn(*mut u8, usize) -> *mut u8,
    pub free: unsafe fn(*mut u8),
}

// `realloc`'s safety contract requires the `Layout` a block was originally
// allocated with, not one built from its new size. The default vtable has
// no caller-supplied bookkeeping to draw that from, so it keeps its own:
// every block is prefixed with a `usize` header recording its payload
// size, and the pointer handed back to callers points just past it.
const HEADER_SIZE: usize = std::mem::size_of::<usize>();
const HEADER_ALIGN: usize = std::mem::align_of::<usize>();

unsafe fn block_layout(total_size: usize) -> std::alloc::Layout {
    std::alloc::Layout::from_size_align(total_size, HEADER_ALIGN).expect("allocation size overflow")
}

unsafe fn header_of(ptr: *mut u8) -> *mut u8 {
    ptr.sub(HEADER_SIZE)
}

unsafe fn payload_size(ptr: *mut u8) -> usize {
    (header_of(ptr) as *const usize).read()
}

unsafe fn default_malloc(size: usize) -> *mut u8 {
    if size == 0 {
        return std::ptr::null_mut();
    }
    let total = size.checked_add(HEADER_SIZE).expect("allocation size overflow");
    let base = std::alloc::alloc(block_layout(total));
    if base.is_null() {
        return std::ptr::null_mut();
    }
    (base as *mut usize).write(size);
    base.add(HEADER_SIZE)
}

unsafe fn default_realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    if ptr.is_null() {
        return default_malloc(size);
    }
    if size == 0 {
        default_free(ptr);
        return std::ptr::null_mut();
    }
    let old_total = payload_size(ptr).checked_add(HEADER_SIZE).expect("allocation size overflow");
    let new_total = size.checked_add(HEADER_SIZE).expect("allocation size overflow");
    let new_base = std::alloc::realloc(header_of(ptr), block_layout(old_total), new_total);
    if new_base.is_null() {
        return std::ptr::null_mut();
    }
    (new_base as *mut usize).write(size);
    new_base.add(HEADER_SIZE)
}

unsafe fn default_free(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    let total = payload_size(ptr) + HEADER_SIZE;
    std::alloc::dealloc(header_of(ptr), block_layout(total));
}

const DEFAULT_VTABLE: VTable = VTable { malloc: default_malloc, realloc: default_realloc, free: default_free };

static ACTIVE_VTABLE: OnceLock<Mutex<VTable>> = OnceLock::new();

fn slot() -> &'static Mutex<VTable> {
    ACTIVE_VTABLE.get_or_init(|| Mutex::new(DEFAULT_VTABLE))
}

/// Install a new allocator vtable, replacing whatever is active. Fails if
/// any of the three function pointers would be null — `fn` pointers in safe
/// Rust can't be null, so this check only matters for callers that
/// constructed a `VTable` by transmute; kept for parity with the spec's
/// stated failure mode.
pub fn set_vtable(table: VTable) -> Result<(), Error> {
    let malloc_ptr = table.malloc as usize;
    let realloc_ptr = table.realloc as usize;
    let free_ptr = table.free as usize;
    if malloc_ptr == 0 || realloc_ptr == 0 || free_ptr == 0 {
        return Err(Error::new(Domain::Io, Code::InvalidArgument, "vtable function pointer is null"));
    }
    *slot().lock() = table;
    log::debug!("memory vtable replaced");
    Ok(())
}

/// Revert to the system default `{malloc, realloc, free}`.
pub fn restore_default() {
    *slot().lock() = DEFAULT_VTABLE;
    log::debug!("memory vtable restored to default");
}

/// Allocate `size` bytes through the active vtable.
///
/// # Safety
/// Caller must free the returned pointer with [`free`] (or the matching
/// vtable's `free`), exactly once, and must not read/write past `size`
/// bytes.
pub unsafe fn malloc(size: usize) -> *mut u8 {
    (slot().lock().malloc)(size)
}

/// Reallocate a pointer previously returned by [`malloc`] or [`realloc`].
///
/// # Safety
/// See [`malloc`].
pub unsafe fn realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    (slot().lock().realloc)(ptr, size)
}

/// Free a pointer previously returned by [`malloc`] or [`realloc`].
///
/// # Safety
/// See [`malloc`]; must not be called twice on the same pointer.
pub unsafe fn free(ptr: *mut u8) {
    (slot().lock().free)(ptr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_malloc_free_round_trip() {
        unsafe {
            let p = malloc(64);
            assert!(!p.is_null());
            std::ptr::write_bytes(p, 0xAB, 64);
            free(p);
        }
        restore_default();
    }

    #[test]
    fn realloc_grows_and_shrinks_preserving_prefix() {
        unsafe {
            let p = malloc(8);
            std::ptr::write_bytes(p, 0x11, 8);

            let grown = realloc(p, 256);
            assert!(!grown.is_null());
            assert_eq!(std::slice::from_raw_parts(grown, 8), [0x11u8; 8]);

            std::ptr::write_bytes(grown, 0x22, 256);
            let shrunk = realloc(grown, 4);
            assert!(!shrunk.is_null());
            assert_eq!(std::slice::from_raw_parts(shrunk, 4), [0x22u8; 4]);

            free(shrunk);
        }
        restore_default();
    }

    #[test]
    fn realloc_to_zero_frees_and_returns_null() {
        unsafe {
            let p = malloc(32);
            assert!(realloc(p, 0).is_null());
        }
        restore_default();
    }

    #[test]
    fn set_vtable_then_restore() {
        static CALLED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
        unsafe fn tracking_malloc(size: usize) -> *mut u8 {
            CALLED.store(true, std::sync::atomic::Ordering::SeqCst);
            default_malloc(size)
        }

        let table = VTable { malloc: tracking_malloc, realloc: default_realloc, free: default_free };
        set_vtable(table).unwrap();
        unsafe {
            let p = malloc(16);
            free(p);
        }
        assert!(CALLED.load(std::sync::atomic::Ordering::SeqCst));
        restore_default();
    }
}
