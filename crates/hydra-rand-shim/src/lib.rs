//! # hydra-rand-shim
//!
//! LD_PRELOAD interposer for `getrandom`. Every request is satisfied
//! in full with the fixed fill byte `0x5e`, so harness runs are
//! reproducible across executions. The authentic implementation is
//! bound at load time purely to fail fast in a broken preload
//! environment; the entry point never consults it and never fails.
//!
//! This destroys real entropy by design. Never preload it into
//! anything that needs randomness for security.

#![allow(clippy::missing_safety_doc)]

use std::ptr;

use hydra_interpose::policy::FILL_BYTE;
use hydra_interpose::reals::RealSymbol;
use libc::{c_uint, c_void, size_t, ssize_t};

static REAL_GETRANDOM: RealSymbol = RealSymbol::new(c"getrandom");

/// Load-time setup. The handle is never called, but an environment
/// where the authentic symbol cannot be resolved is broken and must
/// surface here rather than mid-run.
unsafe extern "C" fn setup() {
    if let Err(e) = REAL_GETRANDOM.bind() {
        hydra_interpose::fatal!("hydra-rand-shim: error: {e}");
    }
    hydra_interpose::diag!("hydra-rand-shim: interposing getrandom(): fill byte {FILL_BYTE:#04x}");
}

#[cfg(target_os = "linux")]
#[link_section = ".init_array"]
#[used]
pub static SETUP: unsafe extern "C" fn() = setup;

/// libc-compatible entry point. Fills the whole buffer with
/// [`FILL_BYTE`], ignores the flags, and always reports the full
/// requested length as produced.
#[no_mangle]
pub unsafe extern "C" fn getrandom(buf: *mut c_void, buflen: size_t, _flags: c_uint) -> ssize_t {
    if buflen > 0 {
        ptr::write_bytes(buf as *mut u8, FILL_BYTE, buflen);
    }
    buflen as ssize_t
}
