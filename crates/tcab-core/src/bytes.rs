//! Byte buffers crossing the boundary.
//!
//! Rule for the native→host direction: copy into host-owned storage and
//! release the native buffer before returning, so the host never holds a
//! live pointer into the native heap. The host→native direction passes
//! `(pointer, length)` for the duration of one call; [`PinnedBytes`] is the
//! one sanctioned exception for native code that wants to wrap a host
//! buffer beyond a single call.

use std::ffi::{c_int, c_void};
use std::sync::Arc;

/// Deallocator for buffers the native library hands to the caller.
pub type FreeFn = unsafe extern "C" fn(*mut c_void);

/// Copy a native-owned buffer into host storage and free the native copy
/// immediately.
///
/// # Safety
///
/// `ptr` must point to `len` readable bytes owned by the native library,
/// and `free` must be the deallocator matching that allocation. The buffer
/// must not be used again after this call.
pub unsafe fn copy_out(ptr: *mut c_void, len: c_int, free: FreeFn) -> Vec<u8> {
    let out = copy_slice(ptr as *const c_void, len);
    free(ptr);
    out
}

/// Copy out of a buffer the native side keeps ownership of (an interior
/// pointer into a container). Nothing is freed.
///
/// # Safety
///
/// `ptr` must point to `len` readable bytes for the duration of this call.
pub unsafe fn copy_slice(ptr: *const c_void, len: c_int) -> Vec<u8> {
    if ptr.is_null() || len <= 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(ptr as *const u8, len as usize).to_vec()
}

/// A host buffer pinned for zero-copy use by native code that retains the
/// pointer past a single call.
///
/// The `Arc` back-reference exists solely to keep the backing buffer
/// alive for as long as the native wrapper might read it; it confers no
/// ownership semantics and this type must never be exposed as a
/// general-purpose handle.
pub struct PinnedBytes {
    ptr: *const u8,
    len: usize,
    _owner: Arc<[u8]>,
}

// Pinned data is immutable and the owner is refcounted.
unsafe impl Send for PinnedBytes {}
unsafe impl Sync for PinnedBytes {}

impl PinnedBytes {
    pub fn new(owner: Arc<[u8]>) -> PinnedBytes {
        let ptr = owner.as_ptr();
        let len = owner.len();
        PinnedBytes {
            ptr,
            len,
            _owner: owner,
        }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.ptr as *const c_void
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
