/*!
 * Pid Kernel - Main Entry Point
 *
 * Boots the pid manager, runs a small process tree on OS threads and
 * reaps it, logging each step.
 */

use anyhow::Context;
use pid_kernel::{init_tracing, spawn, PidConfig, PidManager, BOOTUP_PID};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Pid kernel starting...");
    let config = PidConfig::from_env().context("invalid pid table limits")?;
    let manager = PidManager::builder()
        .with_config(config)
        .build()
        .context("pid table bootstrap failed")?;

    // Each worker forks two grandchildren and only waits for the first;
    // the second is reaped through auto-detach when the worker exits.
    let mut workers = Vec::new();
    for n in 0..4 {
        let tree = manager.clone();
        let pid = spawn(&manager, BOOTUP_PID, "worker", move |me| {
            let joined = spawn(&tree, me, "leaf", move |_| n * 10)
                .ok()
                .and_then(|leaf| tree.wait(me, leaf).ok())
                .unwrap_or(-1);
            if let Err(e) = spawn(&tree, me, "stray", |_| 0) {
                warn!(parent = me, error = %e, "Stray spawn failed");
            }
            joined + n
        })
        .with_context(|| format!("failed to spawn worker {n}"))?;
        workers.push(pid);
    }

    for pid in workers {
        let status = manager.wait(BOOTUP_PID, pid)?;
        info!(pid, status, "Worker reaped");
    }

    let stats = manager.stats();
    info!(
        stats = %serde_json::to_string(&stats)?,
        "Pid kernel finished"
    );
    Ok(())
}
