use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

static CANCEL_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Shared flag raised on Ctrl-C; running external tools are killed when it is set
pub fn cancel_flag() -> Arc<AtomicBool> {
    CANCEL_FLAG
        .get_or_init(|| Arc::new(AtomicBool::new(false)))
        .clone()
}

#[cfg(unix)]
extern "C" fn on_interrupt(_: nix::libc::c_int) {
    if let Some(flag) = CANCEL_FLAG.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Route SIGINT to the cancel flag instead of terminating the process
#[cfg(unix)]
pub fn install_handler() -> Arc<AtomicBool> {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    let flag = cancel_flag();
    let action = SigAction::new(
        SigHandler::Handler(on_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only performs an atomic store on an initialized flag
    if let Err(e) = unsafe { sigaction(Signal::SIGINT, &action) } {
        tracing::warn!("Failed to install SIGINT handler: {}", e);
    }
    flag
}

#[cfg(not(unix))]
pub fn install_handler() -> Arc<AtomicBool> {
    cancel_flag()
}

pub fn is_cancelled() -> bool {
    CANCEL_FLAG
        .get()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}
