use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{AppError, Result};

/// OSC 52 "set clipboard" sequence understood by most terminal emulators.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(osc52_sequence(text).as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|e| AppError::Clipboard(e.to_string()))
}
