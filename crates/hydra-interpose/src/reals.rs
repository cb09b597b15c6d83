//! Binding to the authentic libc implementations via `dlsym(RTLD_NEXT)`.
//!
//! When a shim preempts a symbol, calling the "real" implementation by
//! name would loop straight back into the shim. `RTLD_NEXT` resolves
//! the next definition in the loader's search order after this
//! library, which is the authentic one.

use std::ffi::CStr;
use std::sync::atomic::{AtomicPtr, Ordering};

use libc::c_void;

/// Storage for the authentic implementation of an interposed function.
///
/// Bound exactly once during library load; the handle never changes and
/// is never released afterwards, so every thread may read it without
/// synchronization beyond the atomic load.
pub struct RealSymbol {
    ptr: AtomicPtr<c_void>,
    name: &'static CStr,
}

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("dlsym({0}) failed: symbol not found")]
    Unresolved(&'static str),
}

impl RealSymbol {
    pub const fn new(name: &'static CStr) -> Self {
        Self {
            ptr: AtomicPtr::new(std::ptr::null_mut()),
            name,
        }
    }

    /// Resolve the authentic symbol, bypassing our own preempted
    /// definition. Idempotent: a second call on a bound symbol is a
    /// no-op.
    pub fn bind(&self) -> Result<(), BindError> {
        if !self.ptr.load(Ordering::Acquire).is_null() {
            return Ok(());
        }
        let f = unsafe { libc::dlsym(libc::RTLD_NEXT, self.name.as_ptr()) };
        if f.is_null() {
            return Err(BindError::Unresolved(self.name.to_str().unwrap_or("?")));
        }
        self.ptr.store(f, Ordering::Release);
        Ok(())
    }

    /// The bound handle. Null only if `bind` has not yet succeeded;
    /// callers transmute it to the concrete function type.
    pub fn get(&self) -> *mut c_void {
        self.ptr.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &'static CStr {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_existing_symbol() {
        static REAL_GETPID: RealSymbol = RealSymbol::new(c"getpid");
        assert!(REAL_GETPID.bind().is_ok());
        assert!(!REAL_GETPID.get().is_null());

        // Idempotent: handle is stable across repeated binds
        let first = REAL_GETPID.get();
        assert!(REAL_GETPID.bind().is_ok());
        assert_eq!(REAL_GETPID.get(), first);
    }

    #[test]
    fn bound_handle_is_callable() {
        static REAL_GETPID: RealSymbol = RealSymbol::new(c"getpid");
        REAL_GETPID.bind().unwrap();
        let real = unsafe {
            std::mem::transmute::<*mut c_void, unsafe extern "C" fn() -> libc::pid_t>(
                REAL_GETPID.get(),
            )
        };
        assert_eq!(unsafe { real() }, unsafe { libc::getpid() });
    }

    #[test]
    fn missing_symbol_is_an_error() {
        static REAL_NOPE: RealSymbol = RealSymbol::new(c"__hydra_no_such_symbol__");
        let err = REAL_NOPE.bind().unwrap_err();
        assert!(err.to_string().contains("__hydra_no_such_symbol__"));
        assert!(REAL_NOPE.get().is_null());
    }
}
