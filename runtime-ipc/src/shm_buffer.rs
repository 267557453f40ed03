//! Cyclic, length-prefixed byte buffer layered over [`crate::shm`] +
//! [`crate::semaphore`] (component K).
//!
//! Grounded directly on the original's `pshmbuffer.c`: the region's first
//! eight bytes hold `read_pos:u32` then `write_pos:u32` (both little-endian
//! regardless of host order, since they are a wire-visible cross-process
//! layout), the rest is the cyclic data area. One read-position slot is
//! always left empty so `read_pos == write_pos` can mean "empty" without
//! ambiguity against "full" — the usable capacity is therefore one byte
//! less than the data area's size.

use multios_runtime_core::error::{Code, Domain, Error};

use crate::shm::{AccessPerms, Shm};

const READ_OFFSET: usize = 0;
const WRITE_OFFSET: usize = 4;
const DATA_OFFSET: usize = 8;

/// A single-producer/single-consumer cyclic buffer backed by a named SHM
/// region. All reads/writes are serialized by the region's guard
/// semaphore, so multiple producer or consumer threads are safe too, just
/// not lock-free.
pub struct ShmBuffer {
    shm: Shm,
    /// Size of the cyclic data area (region size minus the 8-byte header).
    /// One byte of this is always left unused, matching the original's
    /// `buf->size - 1` "full" check.
    data_size: usize,
}

impl ShmBuffer {
    /// `size` is the desired usable capacity; the backing region is sized
    /// `size + DATA_OFFSET + 1` bytes so that `size` bytes can be written
    /// without the read/write positions colliding.
    pub fn new(name: &str, size: usize) -> Result<Self, Error> {
        let region_size = if size != 0 { size + DATA_OFFSET + 1 } else { 0 };
        let shm = Shm::new(name, region_size, AccessPerms::ReadWrite)?;

        let data_size = shm.get_size().saturating_sub(DATA_OFFSET);
        if data_size == 0 {
            return Err(Error::new(Domain::Ipc, Code::InvalidArgument, "shm buffer: memory segment too small"));
        }

        Ok(ShmBuffer { shm, data_size })
    }

    pub fn take_ownership(&mut self) {
        self.shm.take_ownership();
    }

    /// Usable capacity: at most this many bytes can be in flight at once.
    pub fn capacity(&self) -> usize {
        self.data_size - 1
    }

    fn positions(&self) -> (u32, u32) {
        let bytes = self.shm.as_slice();
        let read_pos = u32::from_le_bytes(bytes[READ_OFFSET..READ_OFFSET + 4].try_into().unwrap());
        let write_pos = u32::from_le_bytes(bytes[WRITE_OFFSET..WRITE_OFFSET + 4].try_into().unwrap());
        (read_pos, write_pos)
    }

    fn set_read_pos(&mut self, pos: u32) {
        self.shm.as_mut_slice()[READ_OFFSET..READ_OFFSET + 4].copy_from_slice(&pos.to_le_bytes());
    }

    fn set_write_pos(&mut self, pos: u32) {
        self.shm.as_mut_slice()[WRITE_OFFSET..WRITE_OFFSET + 4].copy_from_slice(&pos.to_le_bytes());
    }

    /// Not thread-safe on its own; callers must already hold the guard
    /// semaphore (every public method below does).
    fn free_space_locked(&self) -> usize {
        let (read_pos, write_pos) = self.positions();
        let (read_pos, write_pos) = (read_pos as usize, write_pos as usize);
        if write_pos < read_pos {
            read_pos - write_pos
        } else if write_pos > read_pos {
            self.data_size - (write_pos - read_pos) - 1
        } else {
            self.data_size - 1
        }
    }

    fn used_space_locked(&self) -> usize {
        let (read_pos, write_pos) = self.positions();
        let (read_pos, write_pos) = (read_pos as usize, write_pos as usize);
        if write_pos > read_pos {
            write_pos - read_pos
        } else if write_pos < read_pos {
            self.data_size - (read_pos - write_pos)
        } else {
            0
        }
    }

    /// Snapshot of free space, taken under the guard lock. Not a
    /// consistent view for unlocked inspection — another writer can
    /// shrink it the instant this call returns.
    pub fn get_free_space(&mut self) -> Result<usize, Error> {
        self.shm.lock()?;
        let space = self.free_space_locked();
        self.shm.unlock()?;
        Ok(space)
    }

    pub fn get_used_space(&mut self) -> Result<usize, Error> {
        self.shm.lock()?;
        let space = self.used_space_locked();
        self.shm.unlock()?;
        Ok(space)
    }

    /// Writes all of `data`, failing (and writing nothing) if the buffer
    /// doesn't have `data.len()` bytes of free space.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        if data.is_empty() {
            return Ok(0);
        }
        self.shm.lock()?;

        if self.free_space_locked() < data.len() {
            self.shm.unlock()?;
            return Err(Error::new(Domain::Ipc, Code::NoResources, "shm buffer: not enough free space"));
        }

        let (_, write_pos) = self.positions();
        let mut write_pos = write_pos as usize;
        let data_size = self.data_size;
        let bytes = self.shm.as_mut_slice();
        for &b in data {
            bytes[DATA_OFFSET + write_pos] = b;
            write_pos = (write_pos + 1) % data_size;
        }
        self.set_write_pos(write_pos as u32);

        self.shm.unlock()?;
        Ok(data.len())
    }

    /// Reads up to `out.len()` bytes, returning how many were actually
    /// available (`min(out.len(), used_space)`).
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        if out.is_empty() {
            return Ok(0);
        }
        self.shm.lock()?;

        let (read_pos, write_pos) = self.positions();
        if read_pos == write_pos {
            self.shm.unlock()?;
            return Ok(0);
        }

        let available = self.used_space_locked();
        let to_copy = available.min(out.len());
        let mut read_pos = read_pos as usize;
        let data_size = self.data_size;
        let bytes = self.shm.as_slice();
        for slot in out.iter_mut().take(to_copy) {
            *slot = bytes[DATA_OFFSET + read_pos];
            read_pos = (read_pos + 1) % data_size;
        }
        self.set_read_pos(read_pos as u32);

        self.shm.unlock()?;
        Ok(to_copy)
    }

    /// Zeros the entire backing region (header and data) under lock.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.shm.lock()?;
        self.shm.as_mut_slice().fill(0);
        self.shm.unlock()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("rt-test-{tag}-{}", std::process::id())
    }

    #[test]
    fn write_then_read_round_trips_exact_bytes() {
        let mut buf = ShmBuffer::new(&unique_name("shmbuf-roundtrip"), 1024).unwrap();
        buf.take_ownership();
        let payload = b"This is a test string!\0";
        buf.write(payload).unwrap();
        let mut out = vec![0u8; payload.len()];
        let n = buf.read(&mut out).unwrap();
        assert_eq!(n, payload.len());
        assert_eq!(&out[..], payload);
    }

    #[test]
    fn free_plus_used_equals_capacity() {
        let mut buf = ShmBuffer::new(&unique_name("shmbuf-capacity"), 1024).unwrap();
        buf.take_ownership();
        buf.write(b"hello").unwrap();
        let free = buf.get_free_space().unwrap();
        let used = buf.get_used_space().unwrap();
        assert_eq!(free + used, buf.capacity());
    }

    #[test]
    fn write_larger_than_capacity_is_rejected() {
        let mut buf = ShmBuffer::new(&unique_name("shmbuf-oversize"), 1024).unwrap();
        buf.take_ownership();
        assert_eq!(buf.capacity(), 1024);
        let oversized = vec![0u8; 2048];
        assert!(buf.write(&oversized).is_err());
    }

    #[test]
    fn clear_zeros_region_and_resets_to_empty() {
        let mut buf = ShmBuffer::new(&unique_name("shmbuf-clear"), 1024).unwrap();
        buf.take_ownership();
        buf.write(b"data").unwrap();
        buf.clear().unwrap();
        assert_eq!(buf.get_used_space().unwrap(), 0);
        assert_eq!(buf.get_free_space().unwrap(), buf.capacity());
    }

    #[test]
    fn two_threads_exchange_identical_payloads_for_a_bounded_duration() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use std::time::{Duration, Instant};

        let name = unique_name("shmbuf-threaded");
        let mut writer_buf = ShmBuffer::new(&name, 1024).unwrap();
        writer_buf.take_ownership();
        let mut reader_buf = ShmBuffer::new(&name, 1024).unwrap();

        let payload = b"This is a test string!\0";
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let write_count = Arc::new(AtomicUsize::new(0));
        let read_count = Arc::new(AtomicUsize::new(0));

        let w_stop = Arc::clone(&stop);
        let w_count = Arc::clone(&write_count);
        let writer = std::thread::spawn(move || {
            while !w_stop.load(Ordering::Relaxed) {
                if writer_buf.get_free_space().unwrap_or(0) >= payload.len() {
                    if writer_buf.write(payload).is_ok() {
                        w_count.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });

        let r_stop = Arc::clone(&stop);
        let r_count = Arc::clone(&read_count);
        let reader = std::thread::spawn(move || {
            let mut out = vec![0u8; payload.len()];
            while !r_stop.load(Ordering::Relaxed) {
                if reader_buf.get_used_space().unwrap_or(0) >= payload.len() {
                    let n = reader_buf.read(&mut out).unwrap_or(0);
                    if n == payload.len() {
                        assert_eq!(&out[..], payload);
                        r_count.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });

        let deadline = Instant::now() + Duration::from_millis(200);
        while Instant::now() < deadline {
            std::thread::yield_now();
        }
        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
        reader.join().unwrap();

        assert!(write_count.load(Ordering::Relaxed) > 0);
        assert!(read_count.load(Ordering::Relaxed) > 0);
    }
}
