//! # hydra-interpose
//!
//! Shared mechanism for the LD_PRELOAD interposer shims used by the
//! perf-test-hydra harness: authentic-symbol binding via
//! `dlsym(RTLD_NEXT)`, redirection policy resolution from the process
//! environment, and constructor-safe diagnostics.
//!
//! Everything here is designed to run inside a dynamic-loader
//! constructor: no heap allocation on the diagnostic path, no locks,
//! and no calls that could re-enter an interposed symbol.

// Macros must be defined before modules that use them
#[macro_use]
pub mod diag;

pub mod policy;
pub mod reals;
