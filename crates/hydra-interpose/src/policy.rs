//! Redirection policy, resolved once at library load.
//!
//! The resolution shim redirects only lookups whose node name begins
//! with [`NODE_MARKER`]; the target address comes from the `PROXY_IP`
//! environment variable with a deterministic fallback to `0.0.0.0`
//! (the current host). The randomness shim carries no environment
//! state, just the fixed [`FILL_BYTE`].

use std::ffi::CStr;
use std::net::Ipv4Addr;

use libc::c_char;

/// Node names beginning with this marker are candidates for
/// redirection; everything else passes through untouched.
pub const NODE_MARKER: &str = "perf-test-hydra-";

/// Environment variable carrying the override address for marked
/// lookups.
pub const OVERRIDE_ADDR_VAR: &CStr = c"PROXY_IP";

/// Fallback when `PROXY_IP` is unset or unusable: 0.0.0.0, i.e. the
/// current host. Network byte order, like everything in this module.
pub const DEFAULT_OVERRIDE_ADDR: libc::in_addr_t = 0;

/// Byte the randomness shim fills caller buffers with.
pub const FILL_BYTE: u8 = 0x5e;

/// Literal, case-sensitive, byte-wise prefix test on the caller's
/// node name. A null node never matches and is never dereferenced.
///
/// # Safety
///
/// `node` must be null or point to a valid C string.
pub unsafe fn node_has_marker(node: *const c_char) -> bool {
    if node.is_null() {
        return false;
    }
    CStr::from_ptr(node).to_bytes().starts_with(NODE_MARKER.as_bytes())
}

/// Parse an override address from the raw environment value. Unset,
/// empty, and unparsable values all yield `None` so the caller falls
/// back to [`DEFAULT_OVERRIDE_ADDR`].
pub fn parse_override_addr(raw: Option<&str>) -> Option<libc::in_addr_t> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    let addr: Ipv4Addr = raw.parse().ok()?;
    Some(u32::from(addr).to_be())
}

/// Read and parse `PROXY_IP` from the process environment. Safe in
/// constructor context: the value is borrowed only for the duration of
/// the parse and nothing allocates.
pub fn env_override_addr() -> Option<libc::in_addr_t> {
    let val = unsafe { libc::getenv(OVERRIDE_ADDR_VAR.as_ptr()) };
    if val.is_null() {
        return None;
    }
    let s = unsafe { CStr::from_ptr(val) }.to_str().ok()?;
    parse_override_addr(Some(s))
}

/// Dotted-quad octets of a network-byte-order address, for
/// diagnostics.
pub fn addr_octets(addr: libc::in_addr_t) -> [u8; 4] {
    addr.to_ne_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    #[test]
    fn marker_is_a_prefix_test_not_a_full_match() {
        let marked = CString::new("perf-test-hydra-7").unwrap();
        let exact = CString::new("perf-test-hydra-").unwrap();
        let unmarked = CString::new("other-host").unwrap();
        let partial = CString::new("perf-test").unwrap();
        unsafe {
            assert!(node_has_marker(marked.as_ptr()));
            assert!(node_has_marker(exact.as_ptr()));
            assert!(!node_has_marker(unmarked.as_ptr()));
            assert!(!node_has_marker(partial.as_ptr()));
        }
    }

    #[test]
    fn marker_is_case_sensitive() {
        let upper = CString::new("PERF-TEST-HYDRA-7").unwrap();
        unsafe {
            assert!(!node_has_marker(upper.as_ptr()));
        }
    }

    #[test]
    fn null_node_never_matches() {
        unsafe {
            assert!(!node_has_marker(ptr::null()));
        }
    }

    #[test]
    fn override_addr_parses_dotted_quad() {
        let addr = parse_override_addr(Some("10.0.0.5")).unwrap();
        assert_eq!(addr_octets(addr), [10, 0, 0, 5]);
        assert_eq!(addr, u32::from(std::net::Ipv4Addr::new(10, 0, 0, 5)).to_be());
    }

    #[test]
    fn unset_and_empty_fall_back_to_default() {
        assert_eq!(parse_override_addr(None), None);
        assert_eq!(parse_override_addr(Some("")), None);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        assert_eq!(parse_override_addr(Some("not-an-address")), None);
        assert_eq!(parse_override_addr(Some("10.0.0")), None);
        assert_eq!(parse_override_addr(Some("256.0.0.1")), None);
    }

    #[test]
    fn default_is_the_current_host() {
        assert_eq!(addr_octets(DEFAULT_OVERRIDE_ADDR), [0, 0, 0, 0]);
    }
}
