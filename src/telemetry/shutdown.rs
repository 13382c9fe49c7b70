use eyre::Result;
use tokio::sync::watch;

/// Registers a ctrl-c handler and returns a receiver that flips to `true` on shutdown
pub fn register_shutdown() -> Result<watch::Receiver<bool>> {
    let (tx, rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        println!();
        tracing::info!(target: "tiller", "shutting down...");
        tx.send_replace(true);
    })?;
    Ok(rx)
}
