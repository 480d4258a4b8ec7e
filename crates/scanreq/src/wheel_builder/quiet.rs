//! Process-wide suppression of build backend output.
//!
//! Build backends are chatty. While suppression is active, hook subprocesses get their output
//! captured and re-emitted as `debug` events instead of writing into the caller's streams.
use parking_lot::Mutex;
use std::process::{Command, Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

static SUPPRESSED: AtomicBool = AtomicBool::new(false);

// Serializes every section that flips the switch.
static SECTION: Mutex<()> = parking_lot::const_mutex(());

/// Returns true if build output is currently suppressed.
pub fn is_suppressed() -> bool {
    SUPPRESSED.load(Ordering::SeqCst)
}

struct Restore(bool);

impl Drop for Restore {
    fn drop(&mut self) {
        SUPPRESSED.store(self.0, Ordering::SeqCst);
    }
}

/// Runs `f` with build output suppressed. The previous state is restored when `f` returns or
/// unwinds. Sections are mutually exclusive across threads and must not be nested.
pub fn suppressed<T>(f: impl FnOnce() -> T) -> T {
    let _section = SECTION.lock();
    let _restore = Restore(SUPPRESSED.swap(true, Ordering::SeqCst));
    f()
}

/// Runs `command` to completion, capturing its output when suppression is active and letting it
/// inherit the parent's streams otherwise.
pub(crate) fn run(command: &mut Command) -> std::io::Result<Output> {
    if !is_suppressed() {
        let status = command
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        return Ok(Output {
            status,
            stdout: Vec::new(),
            stderr: Vec::new(),
        });
    }

    let output = command.stdin(Stdio::null()).output()?;
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        tracing::debug!(target: "scanreq::build", "{line}");
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        tracing::debug!(target: "scanreq::build", "{line}");
    }
    Ok(output)
}
