//! The native call gate.
//!
//! Hosts that schedule cooperatively under a global execution lock must
//! release that lock while a native call blocks on I/O or a library mutex,
//! and reacquire it before touching host-managed memory again. The gate
//! models that discipline as a process-wide enter/leave hook pair: `enter`
//! releases the host lock, `leave` reacquires it. Hook-free processes (a
//! plain Rust program has no such lock) pay nothing — [`blocking`] is then a
//! direct call.
//!
//! The gate provides no cancellation. Once the closure has been entered the
//! native call runs to completion; callers must not rely on timing out an
//! in-flight call.

use once_cell::sync::OnceCell;

/// Scheduling hooks bracketing every potentially blocking native call.
#[derive(Clone, Copy)]
pub struct Hooks {
    /// Release the host's scheduling lock. Runs on the calling thread
    /// immediately before the native call.
    pub enter: fn(),
    /// Reacquire the host's scheduling lock. Runs on the calling thread
    /// after the native call returns, before any host memory is touched.
    pub leave: fn(),
}

static HOOKS: OnceCell<Hooks> = OnceCell::new();

/// Install the gate hooks for this process. The first caller wins; later
/// installs are rejected and `false` is returned.
pub fn install_hooks(hooks: Hooks) -> bool {
    let installed = HOOKS.set(hooks).is_ok();
    if installed {
        tracing::debug!(target: "tcab", "native call gate hooks installed");
    }
    installed
}

struct Leave(fn());

impl Drop for Leave {
    fn drop(&mut self) {
        (self.0)()
    }
}

/// Run `f` between the gate hooks. `f` must only call into the native
/// library; host-managed memory is off limits while the host lock is
/// released. The leave hook runs even if `f` unwinds.
pub fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match HOOKS.get() {
        None => f(),
        Some(hooks) => {
            (hooks.enter)();
            let _leave = Leave(hooks.leave);
            f()
        }
    }
}
