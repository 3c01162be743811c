//! Catalogues of native entry points, one per resource kind.
//!
//! The wrapped library is reached exclusively through these tables of
//! `unsafe extern "C"` function pointers. Each field documents its success
//! predicate — that predicate, applied at the call site, is how the
//! heterogeneous failure signals get normalized into one error type. The
//! indirection also lets tests stand in a fake engine with destructor
//! counters where the real library would be.
//!
//! Signatures are this crate's, not the library's: where the real API
//! splits a constructor in two (`new` vs `new2` with a hint) or omits an
//! argument the fake needs, `sys` carries a thin adapter.

use std::ffi::{c_char, c_double, c_int, c_void};

pub use tcab_core::bytes::FreeFn;
pub use tcab_core::handle::DestroyFn;

/// Entry points for the native resizable byte-string array.
#[derive(Debug, Clone, Copy)]
pub struct ListCatalog {
    /// Construct with a capacity hint; negative means library default.
    /// Success: non-null.
    pub new: unsafe extern "C" fn(c_int) -> *mut c_void,
    /// Success: `true`. List destruction cannot actually fail in the real
    /// library; the flag exists for uniformity with the other kinds.
    pub destroy: DestroyFn,
    pub len: unsafe extern "C" fn(*mut c_void) -> c_int,
    /// Interior pointer into the list, valid until the list is mutated.
    /// Null: index out of range.
    pub value_at: unsafe extern "C" fn(*mut c_void, c_int, *mut c_int) -> *const c_void,
    pub push: unsafe extern "C" fn(*mut c_void, *const c_void, c_int),
    /// `-1`: no match.
    pub linear_search: unsafe extern "C" fn(*mut c_void, *const c_void, c_int) -> c_int,
    /// `-1`: no match. Meaningful only on a sorted list.
    pub binary_search: unsafe extern "C" fn(*mut c_void, *const c_void, c_int) -> c_int,
}

/// Entry points for the native byte-string map.
#[derive(Debug, Clone, Copy)]
pub struct MapCatalog {
    /// Construct with a bucket-count hint; negative means library default.
    /// Success: non-null.
    pub new: unsafe extern "C" fn(i64) -> *mut c_void,
    pub destroy: DestroyFn,
    pub put: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, *const c_void, c_int),
    /// `false`: the key already existed and the record was kept.
    pub put_keep: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, *const c_void, c_int) -> bool,
    pub put_cat: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, *const c_void, c_int),
    /// `false`: no such record.
    pub remove: unsafe extern "C" fn(*mut c_void, *const c_void, c_int) -> bool,
    /// Interior pointer to the value. Null: absent key.
    pub get: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, *mut c_int) -> *const c_void,
    /// Reset the map's single iteration cursor.
    pub iter_init: unsafe extern "C" fn(*mut c_void),
    /// Interior pointer to the next key. Null: end of iteration.
    pub iter_next: unsafe extern "C" fn(*mut c_void, *mut c_int) -> *const c_void,
    /// Value for a key pointer just returned by `iter_next`.
    pub iter_value: unsafe extern "C" fn(*mut c_void, *const c_void, *mut c_int) -> *const c_void,
    pub len: unsafe extern "C" fn(*mut c_void) -> u64,
    /// Total size in bytes of the map's records.
    pub byte_size: unsafe extern "C" fn(*mut c_void) -> u64,
    /// Freshly allocated native list owned by the caller. Success: non-null.
    pub keys: unsafe extern "C" fn(*mut c_void) -> *mut c_void,
    /// Freshly allocated native list owned by the caller. Success: non-null.
    pub values: unsafe extern "C" fn(*mut c_void) -> *mut c_void,
    pub clear: unsafe extern "C" fn(*mut c_void),
}

/// Entry points for the native abstract database.
///
/// The abstract surface multiplexes several storage engines behind one
/// API and exposes no error code; boolean failures through it can only be
/// reported as [`tcab_core::ErrorKind::Misc`].
#[derive(Debug, Clone, Copy)]
pub struct AdbCatalog {
    /// Success: non-null.
    pub new: unsafe extern "C" fn() -> *mut c_void,
    /// Combined close-and-delete. `false`: the close step failed (the
    /// object is freed regardless).
    pub destroy: DestroyFn,
    /// `false`: open failed.
    pub open: unsafe extern "C" fn(*mut c_void, *const c_char) -> bool,
    pub put: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, *const c_void, c_int) -> bool,
    /// `false`: the key already existed.
    pub put_keep: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, *const c_void, c_int) -> bool,
    pub put_cat: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, *const c_void, c_int) -> bool,
    /// `false`: no such record (indistinguishable from other failures).
    pub remove: unsafe extern "C" fn(*mut c_void, *const c_void, c_int) -> bool,
    /// Native-allocated buffer the caller must release through `free`.
    /// Null: absent key.
    pub get: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, *mut c_int) -> *mut c_void,
    /// `false`: initialization failed.
    pub iter_init: unsafe extern "C" fn(*mut c_void) -> bool,
    /// Native-allocated key buffer, released through `free`. Null: end of
    /// iteration.
    pub iter_next: unsafe extern "C" fn(*mut c_void, *mut c_int) -> *mut c_void,
    /// Keys matching a prefix, at most `max` (negative: no limit), as a
    /// caller-owned native list. Success: non-null.
    pub prefix_keys: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, c_int) -> *mut c_void,
    /// `c_int::MIN`: failure. A legitimate result equal to the sentinel is
    /// indistinguishable from one.
    pub add_int: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, c_int) -> c_int,
    /// NaN: failure, with the same caveat.
    pub add_double: unsafe extern "C" fn(*mut c_void, *const c_void, c_int, c_double) -> c_double,
    pub sync: unsafe extern "C" fn(*mut c_void) -> bool,
    /// Null params selects the engine defaults.
    pub optimize: unsafe extern "C" fn(*mut c_void, *const c_char) -> bool,
    /// Remove every record.
    pub vanish: unsafe extern "C" fn(*mut c_void) -> bool,
    pub copy: unsafe extern "C" fn(*mut c_void, *const c_char) -> bool,
    pub tran_begin: unsafe extern "C" fn(*mut c_void) -> bool,
    pub tran_commit: unsafe extern "C" fn(*mut c_void) -> bool,
    pub tran_abort: unsafe extern "C" fn(*mut c_void) -> bool,
    /// Interior pointer to the open path. Null only on a defective handle.
    pub path: unsafe extern "C" fn(*mut c_void) -> *const c_char,
    pub len: unsafe extern "C" fn(*mut c_void) -> u64,
    pub size: unsafe extern "C" fn(*mut c_void) -> u64,
    /// `-1`: failure (the generic surface also reports absent keys this
    /// way).
    pub value_size: unsafe extern "C" fn(*mut c_void, *const c_void, c_int) -> c_int,
    /// Engine-specific escape hatch; the result list is caller-owned.
    /// Null: failure, with no further detail.
    pub misc: unsafe extern "C" fn(*mut c_void, *const c_char, *mut c_void) -> *mut c_void,
    /// Frees buffers returned by `get` and `iter_next`.
    pub free: FreeFn,
}
