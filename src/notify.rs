//! Completion notification.

use std::io::Write;

use log::debug;

const BELL: &[u8] = b"\x07";

/// Rings the terminal bell on `out`.
pub fn ring_bell(mut out: impl Write) -> std::io::Result<()> {
    out.write_all(BELL)?;
    out.flush()
}

/// Rings the bell on stderr if enabled; failures are only logged.
pub fn pipeline_finished(play_sound: bool) {
    if !play_sound {
        return;
    }
    if let Err(e) = ring_bell(std::io::stderr()) {
        debug!("Could not ring terminal bell: {e}");
    }
}
