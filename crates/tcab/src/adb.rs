//! The native abstract database.
//!
//! Every operation here may touch the disk, so every native call runs
//! through the call gate. The abstract surface exposes no error code;
//! failures are reported as the `miscellaneous` kind with an empty message,
//! and this layer does not invent finer-grained codes it cannot actually
//! observe.

use std::ffi::{c_int, CStr, CString};

use tcab_core::bytes;
use tcab_core::error::ensure;
use tcab_core::{gate, Error, ErrorKind, Handle, NativeError, Result};

use crate::catalog::{AdbCatalog, ListCatalog};
use crate::int_len;
use crate::list::List;

/// Failure through the generic surface: kind `Misc`, empty message.
fn misc_err(op: &'static str) -> Error {
    NativeError::new(ErrorKind::Misc, op, "").into()
}

/// An abstract database: key/value storage whose engine (in-memory hash or
/// tree, file hash, B+ tree, ...) is selected by the open name.
#[derive(Debug)]
pub struct Adb {
    handle: Handle,
    cat: &'static AdbCatalog,
    list_cat: &'static ListCatalog,
}

impl Adb {
    /// Construct and open a database in one step. The name selects the
    /// engine and its tuning parameters, e.g. `"*"` for an in-memory hash
    /// or `"casket.tch#bnum=1000000"` for a file hash.
    ///
    /// The handle's destructor both closes and deletes the native object,
    /// so an `Adb` never leaks the object struct whichever way it ends.
    pub fn open(cat: &'static AdbCatalog, list_cat: &'static ListCatalog, name: &str) -> Result<Adb> {
        let cname = CString::new(name).map_err(|_| {
            Error::Native(NativeError::new(
                ErrorKind::Invalid,
                "open",
                "name contains a NUL byte",
            ))
        })?;
        let ptr = unsafe { (cat.new)() };
        if ptr.is_null() {
            return Err(misc_err("open"));
        }
        let ok = gate::blocking(|| unsafe { (cat.open)(ptr, cname.as_ptr()) });
        if !ok {
            // Nothing was opened; release the bare object.
            unsafe {
                (cat.destroy)(ptr);
            }
            return Err(misc_err("open"));
        }
        tracing::debug!(target: "tcab", name, "abstract database opened");
        Ok(Adb {
            handle: unsafe { Handle::new(ptr, cat.destroy) },
            cat,
            list_cat,
        })
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Close the database. Further operations fail with a closed-handle
    /// error; a failed close still leaves the handle closed.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close("close")
    }

    /// Store a record, overwriting any existing value.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("put")?;
        let (klen, vlen) = (int_len(key, "put")?, int_len(value, "put")?);
        let ok = gate::blocking(|| unsafe {
            (self.cat.put)(ptr, key.as_ptr().cast(), klen, value.as_ptr().cast(), vlen)
        });
        ensure(ok, ErrorKind::Misc, "put")
    }

    /// Store a record only if the key is absent. The generic surface folds
    /// the existing-record conflict into its one failure signal, so this
    /// reports `Misc` rather than `Keep`.
    pub fn put_if_absent(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("putkeep")?;
        let (klen, vlen) = (int_len(key, "putkeep")?, int_len(value, "putkeep")?);
        let ok = gate::blocking(|| unsafe {
            (self.cat.put_keep)(ptr, key.as_ptr().cast(), klen, value.as_ptr().cast(), vlen)
        });
        ensure(ok, ErrorKind::Misc, "putkeep")
    }

    /// Concatenate `value` onto the existing record, or insert it.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("putcat")?;
        let (klen, vlen) = (int_len(key, "putcat")?, int_len(value, "putcat")?);
        let ok = gate::blocking(|| unsafe {
            (self.cat.put_cat)(ptr, key.as_ptr().cast(), klen, value.as_ptr().cast(), vlen)
        });
        ensure(ok, ErrorKind::Misc, "putcat")
    }

    /// Remove a record. The generic surface reports an absent key the same
    /// way as any other failure.
    pub fn remove(&mut self, key: &[u8]) -> Result<()> {
        let ptr = self.handle.raw("out")?;
        let klen = int_len(key, "out")?;
        let ok = gate::blocking(|| unsafe { (self.cat.remove)(ptr, key.as_ptr().cast(), klen) });
        ensure(ok, ErrorKind::Misc, "out")
    }

    /// The value for `key`, copied into host storage and the native buffer
    /// freed, or `None` for an absent key.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let ptr = self.handle.raw("get")?;
        let klen = int_len(key, "get")?;
        let mut vlen: c_int = 0;
        let val =
            gate::blocking(|| unsafe { (self.cat.get)(ptr, key.as_ptr().cast(), klen, &mut vlen) });
        if val.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { bytes::copy_out(val, vlen, self.cat.free) }))
    }

    /// Reset the database's key iterator.
    pub fn iter_rewind(&mut self) -> Result<()> {
        let ptr = self.handle.raw("iterinit")?;
        let ok = gate::blocking(|| unsafe { (self.cat.iter_init)(ptr) });
        ensure(ok, ErrorKind::Misc, "iterinit")
    }

    /// The next key under the iterator, or `None` at the end. Keys only;
    /// pair it with [`get`](Adb::get) for values.
    pub fn next_key(&mut self) -> Result<Option<Vec<u8>>> {
        let ptr = self.handle.raw("iternext")?;
        let mut klen: c_int = 0;
        let key = gate::blocking(|| unsafe { (self.cat.iter_next)(ptr, &mut klen) });
        if key.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { bytes::copy_out(key, klen, self.cat.free) }))
    }

    /// Keys beginning with `prefix`, at most `max` of them.
    pub fn prefix_keys(&self, prefix: &[u8], max: Option<usize>) -> Result<List> {
        let ptr = self.handle.raw("fwmkeys")?;
        let plen = int_len(prefix, "fwmkeys")?;
        let max = max
            .map(|n| n.min(c_int::MAX as usize) as c_int)
            .unwrap_or(-1);
        let list = gate::blocking(|| unsafe {
            (self.cat.prefix_keys)(ptr, prefix.as_ptr().cast(), plen, max)
        });
        if list.is_null() {
            return Err(misc_err("fwmkeys"));
        }
        Ok(unsafe { List::from_raw(list, self.list_cat) })
    }

    /// Add `delta` to the number stored under `key`, creating the record
    /// if absent, and return the new total.
    ///
    /// The library signals failure with `c_int::MIN`, which a legitimate
    /// total can also equal; that ambiguity is inherited and not resolved
    /// here.
    pub fn add_int(&mut self, key: &[u8], delta: i32) -> Result<i32> {
        let ptr = self.handle.raw("addint")?;
        let klen = int_len(key, "addint")?;
        let num =
            gate::blocking(|| unsafe { (self.cat.add_int)(ptr, key.as_ptr().cast(), klen, delta) });
        if num == c_int::MIN {
            return Err(misc_err("addint"));
        }
        Ok(num)
    }

    /// Floating-point variant of [`add_int`](Adb::add_int); failure is
    /// signalled by NaN, with the same sentinel ambiguity.
    pub fn add_double(&mut self, key: &[u8], delta: f64) -> Result<f64> {
        let ptr = self.handle.raw("adddouble")?;
        let klen = int_len(key, "adddouble")?;
        let num = gate::blocking(|| unsafe {
            (self.cat.add_double)(ptr, key.as_ptr().cast(), klen, delta)
        });
        if num.is_nan() {
            return Err(misc_err("adddouble"));
        }
        Ok(num)
    }

    /// Flush updates to the underlying device.
    pub fn sync(&mut self) -> Result<()> {
        let ptr = self.handle.raw("sync")?;
        let ok = gate::blocking(|| unsafe { (self.cat.sync)(ptr) });
        ensure(ok, ErrorKind::Misc, "sync")
    }

    /// Rebuild the database with new tuning parameters (`None` for the
    /// engine defaults).
    pub fn optimize(&mut self, params: Option<&str>) -> Result<()> {
        let ptr = self.handle.raw("optimize")?;
        let cparams = match params {
            Some(p) => Some(CString::new(p).map_err(|_| {
                Error::Native(NativeError::new(
                    ErrorKind::Invalid,
                    "optimize",
                    "params contain a NUL byte",
                ))
            })?),
            None => None,
        };
        let cptr = cparams
            .as_ref()
            .map(|c| c.as_ptr())
            .unwrap_or(std::ptr::null());
        let ok = gate::blocking(|| unsafe { (self.cat.optimize)(ptr, cptr) });
        ensure(ok, ErrorKind::Misc, "optimize")
    }

    /// Remove every record.
    pub fn vanish(&mut self) -> Result<()> {
        let ptr = self.handle.raw("vanish")?;
        let ok = gate::blocking(|| unsafe { (self.cat.vanish)(ptr) });
        ensure(ok, ErrorKind::Misc, "vanish")
    }

    /// Copy the database file to `path`.
    pub fn copy(&self, path: &str) -> Result<()> {
        let ptr = self.handle.raw("copy")?;
        let cpath = CString::new(path).map_err(|_| {
            Error::Native(NativeError::new(
                ErrorKind::Invalid,
                "copy",
                "path contains a NUL byte",
            ))
        })?;
        let ok = gate::blocking(|| unsafe { (self.cat.copy)(ptr, cpath.as_ptr()) });
        ensure(ok, ErrorKind::Misc, "copy")
    }

    pub fn tran_begin(&mut self) -> Result<()> {
        let ptr = self.handle.raw("tranbegin")?;
        let ok = gate::blocking(|| unsafe { (self.cat.tran_begin)(ptr) });
        ensure(ok, ErrorKind::Misc, "tranbegin")
    }

    pub fn tran_commit(&mut self) -> Result<()> {
        let ptr = self.handle.raw("trancommit")?;
        let ok = gate::blocking(|| unsafe { (self.cat.tran_commit)(ptr) });
        ensure(ok, ErrorKind::Misc, "trancommit")
    }

    pub fn tran_abort(&mut self) -> Result<()> {
        let ptr = self.handle.raw("tranabort")?;
        let ok = gate::blocking(|| unsafe { (self.cat.tran_abort)(ptr) });
        ensure(ok, ErrorKind::Misc, "tranabort")
    }

    /// The name the database was opened with.
    pub fn path(&self) -> Result<String> {
        let ptr = self.handle.raw("path")?;
        let p = gate::blocking(|| unsafe { (self.cat.path)(ptr) });
        if p.is_null() {
            return Err(misc_err("path"));
        }
        Ok(unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
    }

    /// Number of records.
    pub fn len(&self) -> Result<u64> {
        let ptr = self.handle.raw("rnum")?;
        Ok(gate::blocking(|| unsafe { (self.cat.len)(ptr) }))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Size in bytes of the database.
    pub fn size(&self) -> Result<u64> {
        let ptr = self.handle.raw("size")?;
        Ok(gate::blocking(|| unsafe { (self.cat.size)(ptr) }))
    }

    /// Size in bytes of the value stored under `key`. The generic surface
    /// reports an absent key the same way as any other failure.
    pub fn value_size(&self, key: &[u8]) -> Result<usize> {
        let ptr = self.handle.raw("vsiz")?;
        let klen = int_len(key, "vsiz")?;
        let size =
            gate::blocking(|| unsafe { (self.cat.value_size)(ptr, key.as_ptr().cast(), klen) });
        if size < 0 {
            return Err(misc_err("vsiz"));
        }
        Ok(size as usize)
    }

    /// Engine-specific escape hatch: invoke operation `name` with a list
    /// of arguments, receiving a list of results. Whatever structured
    /// error the engine produced is lost in transit — the surface reports
    /// only success or failure.
    pub fn misc(&mut self, name: &str, args: &List) -> Result<List> {
        let ptr = self.handle.raw("misc")?;
        let cname = CString::new(name).map_err(|_| {
            Error::Native(NativeError::new(
                ErrorKind::Invalid,
                "misc",
                "name contains a NUL byte",
            ))
        })?;
        let args_ptr = args.raw("misc")?;
        let out = gate::blocking(|| unsafe { (self.cat.misc)(ptr, cname.as_ptr(), args_ptr) });
        if out.is_null() {
            return Err(misc_err("misc"));
        }
        Ok(unsafe { List::from_raw(out, self.list_cat) })
    }
}
