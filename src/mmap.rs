#[cfg(windows)]
pub mod _win {
    use core::ptr::null_mut;

    use crate::error::TrimError;
    use winapi::um::{
        memoryapi::{VirtualAlloc, VirtualFree},
        winnt::{MEM_COMMIT, MEM_DECOMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE},
    };

    pub struct Mmap {
        start: *mut u8,
        end: *mut u8,
        size: usize,
    }

    unsafe impl Send for Mmap {}
    unsafe impl Sync for Mmap {}

    impl Mmap {
        pub fn new(size: usize) -> Result<Self, TrimError> {
            unsafe {
                let mem = VirtualAlloc(null_mut(), size, MEM_RESERVE | MEM_COMMIT, PAGE_READWRITE);
                if mem.is_null() {
                    return Err(TrimError::Reserve { size });
                }
                let mem = mem as *mut u8;

                Ok(Self {
                    start: mem,
                    end: mem.add(size),
                    size,
                })
            }
        }

        pub fn start(&self) -> *mut u8 {
            self.start
        }
        pub fn end(&self) -> *mut u8 {
            self.end
        }

        pub fn decommit(&self, page: *mut u8, size: usize) -> bool {
            debug_assert!(page >= self.start && page as usize + size <= self.end as usize);
            unsafe { VirtualFree(page.cast(), size, MEM_DECOMMIT) != 0 }
        }

        pub fn commit(&self, page: *mut u8, size: usize) -> bool {
            debug_assert!(page >= self.start && page as usize + size <= self.end as usize);
            unsafe { !VirtualAlloc(page.cast(), size, MEM_COMMIT, PAGE_READWRITE).is_null() }
        }
        pub const fn size(&self) -> usize {
            self.size
        }
    }

    impl Drop for Mmap {
        fn drop(&mut self) {
            unsafe {
                VirtualFree(self.start.cast(), 0, MEM_RELEASE);
            }
        }
    }
}

#[cfg(unix)]
pub mod _unix {
    use crate::error::TrimError;

    pub struct Mmap {
        start: *mut u8,
        end: *mut u8,
        size: usize,
    }

    unsafe impl Send for Mmap {}
    unsafe impl Sync for Mmap {}

    impl Mmap {
        pub const fn size(&self) -> usize {
            self.size
        }
        pub fn new(size: usize) -> Result<Self, TrimError> {
            unsafe {
                let map = libc::mmap(
                    core::ptr::null_mut(),
                    size as _,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANON | libc::MAP_NORESERVE,
                    -1,
                    0,
                );
                if map == libc::MAP_FAILED {
                    return Err(TrimError::Reserve { size });
                }
                Ok(Self {
                    start: map as *mut u8,
                    end: (map as usize + size) as *mut u8,
                    size,
                })
            }
        }

        pub fn start(&self) -> *mut u8 {
            self.start
        }
        pub fn end(&self) -> *mut u8 {
            self.end
        }

        /// Gives the physical pages behind `[page, page + size)` back to the OS.
        /// The range stays mapped and reads as zeroes afterwards.
        pub fn decommit(&self, page: *mut u8, size: usize) -> bool {
            debug_assert!(page >= self.start && page as usize + size <= self.end as usize);
            unsafe { libc::madvise(page as *mut _, size as _, libc::MADV_DONTNEED) == 0 }
        }

        pub fn commit(&self, page: *mut u8, size: usize) -> bool {
            debug_assert!(page >= self.start && page as usize + size <= self.end as usize);
            unsafe { libc::madvise(page as *mut _, size as _, libc::MADV_WILLNEED) == 0 }
        }
    }

    impl Drop for Mmap {
        fn drop(&mut self) {
            unsafe {
                libc::munmap(self.start() as *mut _, self.size as _);
            }
        }
    }
}

#[cfg(unix)]
pub use _unix::*;
#[cfg(windows)]
pub use _win::*;
