//! The native resizable byte-string array.

use std::ffi::{c_int, c_void};

use tcab_core::bytes;
use tcab_core::{ErrorKind, Handle, NativeError, Result};

use crate::catalog::ListCatalog;
use crate::int_len;

/// A native list of byte strings, in insertion order.
///
/// List calls are fast in-memory operations and skip the call gate. No
/// sortedness invariant is enforced; [`binary_search`](List::binary_search)
/// is only meaningful if the caller has kept the list sorted.
#[derive(Debug)]
pub struct List {
    handle: Handle,
    cat: &'static ListCatalog,
}

impl List {
    pub fn new(cat: &'static ListCatalog, capacity: Option<usize>) -> Result<List> {
        let hint = capacity
            .map(|n| n.min(c_int::MAX as usize) as c_int)
            .unwrap_or(-1);
        let ptr = unsafe { (cat.new)(hint) };
        if ptr.is_null() {
            return Err(NativeError::new(
                ErrorKind::Misc,
                "list_new",
                "native constructor returned null",
            )
            .into());
        }
        Ok(List {
            handle: unsafe { Handle::new(ptr, cat.destroy) },
            cat,
        })
    }

    /// Adopt a native list produced by another native call.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live list the caller exclusively owns.
    pub(crate) unsafe fn from_raw(ptr: *mut c_void, cat: &'static ListCatalog) -> List {
        List {
            handle: Handle::new(ptr, cat.destroy),
            cat,
        }
    }

    pub(crate) fn raw(&self, op: &'static str) -> Result<*mut c_void> {
        self.handle.raw(op)
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("list_push")?;
        let len = int_len(bytes, "list_push")?;
        unsafe { (self.cat.push)(ptr, bytes.as_ptr() as *const c_void, len) };
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let ptr = self.handle.raw("list_len")?;
        Ok(unsafe { (self.cat.len)(ptr) }.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// The element at `index`, or `None` out of range. The native bytes
    /// are copied out; the interior pointer never escapes this call.
    pub fn get(&self, index: usize) -> Result<Option<Vec<u8>>> {
        let ptr = self.handle.raw("list_get")?;
        let Ok(index) = c_int::try_from(index) else {
            return Ok(None);
        };
        let mut len: c_int = 0;
        let val = unsafe { (self.cat.value_at)(ptr, index, &mut len) };
        if val.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { bytes::copy_slice(val, len) }))
    }

    /// Index of the first element equal to `needle`, scanning linearly.
    pub fn linear_search(&self, needle: &[u8]) -> Result<Option<usize>> {
        let ptr = self.handle.raw("list_lsearch")?;
        let len = int_len(needle, "list_lsearch")?;
        let idx =
            unsafe { (self.cat.linear_search)(ptr, needle.as_ptr() as *const c_void, len) };
        Ok((idx >= 0).then_some(idx as usize))
    }

    /// Index of an element equal to `needle`, assuming the caller has kept
    /// the list sorted.
    pub fn binary_search(&self, needle: &[u8]) -> Result<Option<usize>> {
        let ptr = self.handle.raw("list_bsearch")?;
        let len = int_len(needle, "list_bsearch")?;
        let idx =
            unsafe { (self.cat.binary_search)(ptr, needle.as_ptr() as *const c_void, len) };
        Ok((idx >= 0).then_some(idx as usize))
    }

    /// Destroy the native list now rather than at drop.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close("list_close")
    }
}
