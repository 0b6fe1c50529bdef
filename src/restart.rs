//! Whole-process restart — the sole recovery path for fatal errors.

use std::path::PathBuf;
use std::process::Command;

/// Re-exec the current executable with its original arguments, discarding
/// all in-memory state. The fresh process farms immediately.
pub fn restart_process(delay_secs: u64) -> ! {
    tracing::info!("🔄 Restarting in {delay_secs}s...");
    std::thread::sleep(std::time::Duration::from_secs(delay_secs));

    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("irisfarm"));
    let args: Vec<String> = std::env::args().skip(1).collect();

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // exec only returns on failure.
        let err = Command::new(&exe).args(&args).exec();
        tracing::error!("Re-exec failed: {err}");
    }

    #[cfg(not(unix))]
    match Command::new(&exe).args(&args).spawn() {
        Ok(_) => std::process::exit(0),
        Err(e) => tracing::error!("Respawn failed: {e}"),
    }

    std::process::exit(1)
}
