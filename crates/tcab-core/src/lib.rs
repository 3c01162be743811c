//! Boundary plumbing for driving a manually memory-managed native library
//! from safe Rust.
//!
//! The native side hands out opaque pointers (databases, lists, maps) that
//! must be destroyed exactly once, must never be touched after destruction,
//! and signal failure through a grab-bag of conventions (false booleans,
//! null pointers, sentinel integers and floats). This crate holds the three
//! pieces every wrapper over such a library needs:
//!
//! - [`handle::Handle`] — owns one native pointer plus its destructor and an
//!   open flag, and guarantees at-most-one destruction across an explicit
//!   close and the drop path.
//! - [`gate`] — the native call gate. Hosts with a global scheduling lock
//!   install an enter/leave hook pair once per process; every call expected
//!   to block runs between the hooks. Without hooks the gate is a direct
//!   call.
//! - [`error`] — the single structured error type native failures are
//!   normalized into, kept distinct from host-level misuse (operating on a
//!   closed handle).
//!
//! [`bytes`] carries the copy-out helpers for buffers crossing the boundary.

pub mod bytes;
pub mod error;
pub mod gate;
pub mod handle;

pub use error::{Error, ErrorKind, NativeError, Result};
pub use handle::{DestroyFn, Handle};
