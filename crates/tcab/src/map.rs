//! The native byte-string map.

use std::ffi::c_int;

use tcab_core::bytes;
use tcab_core::error::ensure;
use tcab_core::{ErrorKind, Handle, NativeError, Result};

use crate::catalog::{ListCatalog, MapCatalog};
use crate::int_len;
use crate::list::List;

/// A native map from byte strings to byte strings.
///
/// Iteration order is hash-bucket order, not sorted and not insertion
/// order; callers wanting sorted output sort the [`keys`](Map::keys) list
/// themselves. The iteration cursor is internal native state — one per map
/// instance, reset by [`rewind`](Map::rewind) — so two callers iterating
/// the same map concurrently must synchronize externally.
///
/// Map calls are fast in-memory operations and skip the call gate.
#[derive(Debug)]
pub struct Map {
    handle: Handle,
    cat: &'static MapCatalog,
    list_cat: &'static ListCatalog,
}

impl Map {
    pub fn new(
        cat: &'static MapCatalog,
        list_cat: &'static ListCatalog,
        buckets: Option<u32>,
    ) -> Result<Map> {
        let hint = buckets.map(i64::from).unwrap_or(-1);
        let ptr = unsafe { (cat.new)(hint) };
        if ptr.is_null() {
            return Err(NativeError::new(
                ErrorKind::Misc,
                "map_new",
                "native constructor returned null",
            )
            .into());
        }
        Ok(Map {
            handle: unsafe { Handle::new(ptr, cat.destroy) },
            cat,
            list_cat,
        })
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Store a record, overwriting any existing value.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("map_put")?;
        let (klen, vlen) = (int_len(key, "map_put")?, int_len(value, "map_put")?);
        unsafe { (self.cat.put)(ptr, key.as_ptr().cast(), klen, value.as_ptr().cast(), vlen) };
        Ok(())
    }

    /// Store a record only if the key is absent. Returns `false` when the
    /// existing record was kept — a typed outcome, not an error.
    pub fn put_if_absent(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        let ptr = self.handle.raw("map_putkeep")?;
        let (klen, vlen) = (int_len(key, "map_putkeep")?, int_len(value, "map_putkeep")?);
        let inserted = unsafe {
            (self.cat.put_keep)(ptr, key.as_ptr().cast(), klen, value.as_ptr().cast(), vlen)
        };
        Ok(inserted)
    }

    /// Concatenate `value` onto the existing record, or insert it if the
    /// key is absent.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("map_putcat")?;
        let (klen, vlen) = (int_len(key, "map_putcat")?, int_len(value, "map_putcat")?);
        unsafe { (self.cat.put_cat)(ptr, key.as_ptr().cast(), klen, value.as_ptr().cast(), vlen) };
        Ok(())
    }

    /// Remove a record if present. Absence is success.
    pub fn remove(&mut self, key: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("map_out")?;
        let klen = int_len(key, "map_out")?;
        let _ = unsafe { (self.cat.remove)(ptr, key.as_ptr().cast(), klen) };
        Ok(())
    }

    /// Remove a record that must exist; absence is a `no-record` error.
    pub fn remove_existing(&mut self, key: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("map_out")?;
        let klen = int_len(key, "map_out")?;
        let removed = unsafe { (self.cat.remove)(ptr, key.as_ptr().cast(), klen) };
        ensure(removed, ErrorKind::NoRecord, "map_out")
    }

    /// The value for `key`, copied into host storage, or `None` for an
    /// absent key. Absence is an outcome, never an error.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let ptr = self.handle.raw("map_get")?;
        let klen = int_len(key, "map_get")?;
        let mut vlen: c_int = 0;
        let val = unsafe { (self.cat.get)(ptr, key.as_ptr().cast(), klen, &mut vlen) };
        if val.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { bytes::copy_slice(val, vlen) }))
    }

    /// Reset the iteration cursor to the first record.
    pub fn rewind(&mut self) -> Result<()> {
        let ptr = self.handle.raw("map_iterinit")?;
        unsafe { (self.cat.iter_init)(ptr) };
        Ok(())
    }

    /// The next record under the cursor, or `None` at end of iteration.
    /// Both key and value are copied out before returning.
    pub fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let ptr = self.handle.raw("map_iternext")?;
        let mut klen: c_int = 0;
        let kptr = unsafe { (self.cat.iter_next)(ptr, &mut klen) };
        if kptr.is_null() {
            return Ok(None);
        }
        let key = unsafe { bytes::copy_slice(kptr, klen) };
        let mut vlen: c_int = 0;
        let vptr = unsafe { (self.cat.iter_value)(ptr, kptr, &mut vlen) };
        if vptr.is_null() {
            return Err(NativeError::new(
                ErrorKind::Misc,
                "map_iterval",
                "cursor key has no value",
            )
            .into());
        }
        Ok(Some((key, unsafe { bytes::copy_slice(vptr, vlen) })))
    }

    pub fn len(&self) -> Result<u64> {
        let ptr = self.handle.raw("map_rnum")?;
        Ok(unsafe { (self.cat.len)(ptr) })
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Total size in bytes of the map's records.
    pub fn byte_size(&self) -> Result<u64> {
        let ptr = self.handle.raw("map_msiz")?;
        Ok(unsafe { (self.cat.byte_size)(ptr) })
    }

    /// All keys, as a freshly allocated native list this side now owns.
    pub fn keys(&self) -> Result<List> {
        let ptr = self.handle.raw("map_keys")?;
        let list = unsafe { (self.cat.keys)(ptr) };
        if list.is_null() {
            return Err(
                NativeError::new(ErrorKind::Misc, "map_keys", "native call returned null").into(),
            );
        }
        Ok(unsafe { List::from_raw(list, self.list_cat) })
    }

    /// All values, as a freshly allocated native list this side now owns.
    pub fn values(&self) -> Result<List> {
        let ptr = self.handle.raw("map_vals")?;
        let list = unsafe { (self.cat.values)(ptr) };
        if list.is_null() {
            return Err(
                NativeError::new(ErrorKind::Misc, "map_vals", "native call returned null").into(),
            );
        }
        Ok(unsafe { List::from_raw(list, self.list_cat) })
    }

    /// Remove every record.
    pub fn clear(&mut self) -> Result<()> {
        let ptr = self.handle.raw("map_clear")?;
        unsafe { (self.cat.clear)(ptr) };
        Ok(())
    }

    /// Destroy the native map now rather than at drop.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close("map_close")
    }
}
