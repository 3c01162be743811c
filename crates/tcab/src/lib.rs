//! Safe adapters over a Tokyo Cabinet style native store.
//!
//! The native library exposes three opaque resource kinds: an abstract
//! database ([`Adb`]), a resizable byte-string array ([`List`]) and an
//! unordered byte-string map ([`Map`]). Their semantics pass through
//! untouched — what this crate adds is the boundary discipline: open/closed
//! tracking with at-most-once destruction, the blocking-call gate around
//! disk-touching operations, copy-out of every native buffer before it is
//! freed, and normalization of the library's failure signals (false
//! booleans, null pointers, `INT_MIN`/NaN sentinels) into
//! [`tcab_core::NativeError`].
//!
//! Adapters are constructed against a [`catalog`] — a per-resource-kind
//! table of native entry points. With the `system` feature enabled the
//! [`sys`] module provides catalogues bound to the real library; tests (and
//! alternative backends) supply their own.
//!
//! Every public operation follows the same shape: validate the handle is
//! open, enter the gate if the call may block, invoke the native function,
//! translate the result, marshal bytes into host-owned storage.

pub mod adb;
pub mod catalog;
pub mod list;
pub mod map;
#[cfg(feature = "system")]
pub mod sys;

pub use adb::Adb;
pub use list::List;
pub use map::Map;
pub use tcab_core::bytes::PinnedBytes;
pub use tcab_core::{gate, Error, ErrorKind, NativeError, Result};

use std::ffi::c_int;

/// Buffer lengths cross the boundary as `c_int`; anything larger is a
/// caller error surfaced before the native side can truncate it.
pub(crate) fn int_len(bytes: &[u8], op: &'static str) -> Result<c_int> {
    c_int::try_from(bytes.len()).map_err(|_| {
        Error::Native(NativeError::new(
            ErrorKind::Invalid,
            op,
            "buffer exceeds native length limit",
        ))
    })
}
