//! # hydra-dns-shim
//!
//! LD_PRELOAD interposer for `getaddrinfo`. Lookups whose node name
//! begins with `perf-test-hydra-` are resolved against the IPv4
//! loopback and the first result record is rewritten in place to the
//! address configured via `PROXY_IP` (default `0.0.0.0`, the current
//! host). Every other lookup passes through to the authentic resolver
//! untouched, return code included.
//!
//! The rewrite happens after the authentic call (address-rewrite
//! policy): the resolver does the work of building a well-formed
//! `addrinfo` list for the loopback, and only the first record's
//! address bytes change. Ownership of the list is unchanged; callers
//! release it with `freeaddrinfo` exactly as usual.

#![allow(clippy::missing_safety_doc)]

use std::ffi::CStr;
use std::mem;
use std::sync::atomic::{AtomicU32, Ordering};

use hydra_interpose::policy::{self, DEFAULT_OVERRIDE_ADDR, NODE_MARKER};
use hydra_interpose::reals::RealSymbol;
use libc::{addrinfo, c_char, c_int, c_void, sockaddr_in, AF_INET};

type GetaddrinfoFn = unsafe extern "C" fn(
    *const c_char,
    *const c_char,
    *const addrinfo,
    *mut *mut addrinfo,
) -> c_int;

static REAL_GETADDRINFO: RealSymbol = RealSymbol::new(c"getaddrinfo");

/// Override address in network byte order, published by the
/// constructor and immutable from then on.
static OVERRIDE_ADDR: AtomicU32 = AtomicU32::new(DEFAULT_OVERRIDE_ADDR);

/// Node name handed to the authentic resolver in place of a marked
/// one. Numeric, so the delegated lookup never touches the network.
const LOOPBACK_NODE: &CStr = c"127.0.0.1";

/// Load-time setup: bind the authentic resolver and resolve the
/// redirection policy before any caller can reach the entry point.
/// Binding failure is unrecoverable; every later call depends on the
/// handle, so terminate instead of returning with it unresolved.
unsafe extern "C" fn setup() {
    if let Err(e) = REAL_GETADDRINFO.bind() {
        hydra_interpose::fatal!("hydra-dns-shim: error: {e}");
    }
    let addr = policy::env_override_addr().unwrap_or(DEFAULT_OVERRIDE_ADDR);
    OVERRIDE_ADDR.store(addr, Ordering::Release);
    let [a, b, c, d] = policy::addr_octets(addr);
    hydra_interpose::diag!(
        "hydra-dns-shim: interposing getaddrinfo(): {NODE_MARKER}* -> {a}.{b}.{c}.{d}"
    );
}

#[cfg(target_os = "linux")]
#[link_section = ".init_array"]
#[used]
pub static SETUP: unsafe extern "C" fn() = setup;

/// libc-compatible entry point, resolved in place of the authentic
/// `getaddrinfo` by symbol preemption. The return code is always the
/// authentic resolver's; this shim introduces no error codes of its
/// own.
#[no_mangle]
pub unsafe extern "C" fn getaddrinfo(
    node: *const c_char,
    service: *const c_char,
    hints: *const addrinfo,
    res: *mut *mut addrinfo,
) -> c_int {
    let p = REAL_GETADDRINFO.get();
    assert!(!p.is_null(), "getaddrinfo entered before load-time binding");
    let real = mem::transmute::<*mut c_void, GetaddrinfoFn>(p);

    // Null node must not reach the prefix test; it delegates as-is.
    if !policy::node_has_marker(node) {
        return real(node, service, hints, res);
    }

    let rc = real(LOOPBACK_NODE.as_ptr(), service, hints, res);
    if rc == 0 {
        rewrite_first_v4(*res, OVERRIDE_ADDR.load(Ordering::Acquire));
    }
    rc
}

/// Overwrite the address bytes of the first result record in place,
/// leaving every other field and the linked continuation untouched.
///
/// The delegated query is the numeric IPv4 loopback, so the first
/// record is AF_INET in practice; the family check keeps a
/// front-loaded `sockaddr_in6` from being clobbered regardless.
unsafe fn rewrite_first_v4(head: *mut addrinfo, addr: libc::in_addr_t) {
    if head.is_null() {
        return;
    }
    let rec = &mut *head;
    if rec.ai_family != AF_INET || rec.ai_addr.is_null() {
        return;
    }
    (*(rec.ai_addr as *mut sockaddr_in)).sin_addr.s_addr = addr;
}
