// this_file: src/crash.rs
//! Crash handler (§5 Cancellation & timeouts, §7.4 Signal-catastrophic):
//! catches SIGSEGV/SIGABRT/SIGILL/SIGFPE/SIGBUS, prints a backtrace to
//! stderr, and exits `128+signal`.

use std::os::raw::c_int;

const CAUGHT_SIGNALS: [c_int; 5] = [
    libc::SIGSEGV,
    libc::SIGABRT,
    libc::SIGILL,
    libc::SIGFPE,
    libc::SIGBUS,
];

/// Installs the signal handlers once at process startup. Signal handlers
/// are fundamentally process-global (§9 "Global mutable state") — this is
/// the one place that global state is acceptable.
pub fn install() {
    for &sig in &CAUGHT_SIGNALS {
        unsafe {
            libc::signal(sig, handle_signal as *const () as libc::sighandler_t);
        }
    }
}

extern "C" fn handle_signal(sig: c_int) {
    eprintln!("flipbook: caught signal {sig}, backtrace follows:");
    let bt = backtrace::Backtrace::new();
    eprintln!("{:?}", bt);
    unsafe {
        libc::_exit(128 + sig);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn exit_code_formula_matches_spec() {
        assert_eq!(128 + libc::SIGSEGV, 128 + 11);
        assert_eq!(128 + libc::SIGABRT, 128 + 6);
    }
}
