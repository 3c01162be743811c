//! Ownership of one opaque native pointer.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, ErrorKind, NativeError, Result};
use crate::gate;

/// Native destructor. Returns `false` when teardown itself failed.
pub type DestroyFn = unsafe extern "C" fn(*mut c_void) -> bool;

/// Owner of exactly one native object.
///
/// The destructor is fixed at construction and invoked at most once over
/// the handle's lifetime, whether teardown happens through an explicit
/// [`close`](Handle::close) or through `Drop`. While the open flag is set
/// the pointer is safe to pass to native calls; once cleared every access
/// through [`raw`](Handle::raw) fails with [`Error::ClosedHandle`].
///
/// A closed handle is never reopened — opening is always a fresh
/// allocation.
///
/// Handles may move between threads (the wrapped library is internally
/// thread-safe), but closing the same handle from two threads at once is
/// the caller's coordination problem, not this type's.
#[derive(Debug)]
pub struct Handle {
    ptr: *mut c_void,
    destroy: DestroyFn,
    open: AtomicBool,
}

// The pointer is exclusively owned and never aliased outside the handle.
unsafe impl Send for Handle {}

impl Handle {
    /// Wrap a freshly constructed native object.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live object that `destroy` can tear down, and the
    /// caller must hand over exclusive ownership of it.
    pub unsafe fn new(ptr: *mut c_void, destroy: DestroyFn) -> Handle {
        Handle {
            ptr,
            destroy,
            open: AtomicBool::new(true),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// The single use-after-close enforcement point. Every operation must
    /// fetch the pointer through here before a native call; the pointer is
    /// borrowed for that one call only.
    pub fn raw(&self, op: &'static str) -> Result<*mut c_void> {
        if self.open.load(Ordering::Acquire) {
            Ok(self.ptr)
        } else {
            Err(Error::ClosedHandle { op })
        }
    }

    /// Tear the native object down.
    ///
    /// Closing an already-closed handle is a caller error and reported as
    /// [`Error::ClosedHandle`]. The flag flips to closed *before* the
    /// destructor runs: even when the destructor reports failure the
    /// native object may be partially torn down, so further operations are
    /// refused rather than risked.
    pub fn close(&self, op: &'static str) -> Result<()> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Err(Error::ClosedHandle { op });
        }
        let ok = gate::blocking(|| unsafe { (self.destroy)(self.ptr) });
        if !ok {
            return Err(NativeError::new(ErrorKind::Close, op, "").into());
        }
        Ok(())
    }
}

impl Drop for Handle {
    /// Finalization safety net. Explicit close remains the deterministic
    /// release path; this only fires for handles the host reclaimed while
    /// still open. Destructor failure has no caller to report to here.
    fn drop(&mut self) {
        if self.open.swap(false, Ordering::AcqRel) {
            let ok = gate::blocking(|| unsafe { (self.destroy)(self.ptr) });
            if !ok {
                tracing::debug!(target: "tcab", "native destructor reported failure during drop");
            }
        }
    }
}
