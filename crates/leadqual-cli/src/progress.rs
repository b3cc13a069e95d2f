//! Progress reporting for batch commands

use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// Single-line progress on stderr, silent when stderr is not a terminal
pub struct ProgressReporter {
    enabled: bool,
    processed: usize,
    total: usize,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            enabled: io::stderr().is_terminal(),
            processed: 0,
            total: 0,
        }
    }

    pub fn file(&mut self, path: &Path, index: usize, total: usize) {
        self.processed = index + 1;
        self.total = total;
        if self.enabled {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            eprint!("\r[{}/{}] {:<50}", self.processed, total, name);
            io::stderr().flush().ok();
        }
    }

    pub fn finish(&self) {
        if self.enabled && self.total > 0 {
            eprintln!("\rDone ({}/{}){:<50}", self.processed, self.total, "");
        }
    }
}
