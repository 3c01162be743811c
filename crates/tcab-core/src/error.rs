//! Structured errors for native call failures.
//!
//! Two layers are kept apart on purpose. [`Error::ClosedHandle`] is a host
//! usage bug (the caller kept going after close); [`NativeError`] is a
//! runtime condition reported by the native library. Nothing here retries —
//! retry policy belongs to the caller.

use std::fmt;

/// Closed set of native failure kinds, named after the wrapped library's
/// error codes.
///
/// The abstract-database surface of the library does not expose an error
/// code at all, so everything that fails through it is reported as
/// [`ErrorKind::Misc`]. The finer-grained kinds are part of the contract so
/// that catalogues which *can* report them have somewhere to put them; this
/// fidelity gap is inherited from the library and deliberately not papered
/// over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Threading error inside the library.
    Thread,
    /// Invalid operation or argument.
    Invalid,
    /// File not found.
    NoFile,
    /// Permission denied.
    NoPerm,
    /// Invalid meta data.
    Meta,
    /// Invalid record header.
    RecordHeader,
    /// Open failed.
    Open,
    /// Close failed.
    Close,
    /// Truncate failed.
    Trunc,
    /// Sync failed.
    Sync,
    /// Stat failed.
    Stat,
    /// Seek failed.
    Seek,
    /// Read failed.
    Read,
    /// Write failed.
    Write,
    /// Memory map failed.
    Mmap,
    /// File lock failed.
    Lock,
    /// Unlink failed.
    Unlink,
    /// Rename failed.
    Rename,
    /// Mkdir failed.
    Mkdir,
    /// Rmdir failed.
    Rmdir,
    /// Write-if-absent conflict: the record already existed.
    Keep,
    /// No record found where one was required.
    NoRecord,
    /// Everything the generic surface cannot classify.
    Misc,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Thread => "thread",
            ErrorKind::Invalid => "invalid-argument",
            ErrorKind::NoFile => "no-such-file",
            ErrorKind::NoPerm => "permission",
            ErrorKind::Meta => "corrupt-metadata",
            ErrorKind::RecordHeader => "corrupt-record-header",
            ErrorKind::Open => "open-failed",
            ErrorKind::Close => "close-failed",
            ErrorKind::Trunc => "truncate-failed",
            ErrorKind::Sync => "sync-failed",
            ErrorKind::Stat => "stat-failed",
            ErrorKind::Seek => "seek-failed",
            ErrorKind::Read => "read-failed",
            ErrorKind::Write => "write-failed",
            ErrorKind::Mmap => "mmap-failed",
            ErrorKind::Lock => "lock-failed",
            ErrorKind::Unlink => "unlink-failed",
            ErrorKind::Rename => "rename-failed",
            ErrorKind::Mkdir => "mkdir-failed",
            ErrorKind::Rmdir => "rmdir-failed",
            ErrorKind::Keep => "keep-failed",
            ErrorKind::NoRecord => "no-record",
            ErrorKind::Misc => "miscellaneous",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A native operation failure: symbolic kind, the operation that was being
/// performed, and whatever diagnostic text the library offered (often
/// nothing). Immutable once constructed; carries no handle reference.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{op}: {kind}: {message}")]
pub struct NativeError {
    kind: ErrorKind,
    op: &'static str,
    message: String,
}

impl NativeError {
    pub fn new(kind: ErrorKind, op: &'static str, message: impl Into<String>) -> NativeError {
        NativeError {
            kind,
            op,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The handle was already closed when the operation was attempted.
    /// This is a caller bug, not a runtime condition, and is therefore not
    /// a [`NativeError`].
    #[error("{op}: handle is closed")]
    ClosedHandle { op: &'static str },

    /// The native library reported a failure.
    #[error(transparent)]
    Native(#[from] NativeError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Shared error-construction path for boolean native results. Each call
/// site supplies its own success value and failure kind; the message is
/// empty because the generic surface has none to give.
pub fn ensure(ok: bool, kind: ErrorKind, op: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(NativeError::new(kind, op, "").into())
    }
}
