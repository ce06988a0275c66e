//! Helpful error messages for common CLI failure modes.

use colored::Colorize;

/// Adds a short list of suggestions to an error's display output.
pub trait EnhancedError<T> {
    fn context_with_help(self, msg: &str, help: &[&str]) -> anyhow::Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> EnhancedError<T> for Result<T, E> {
    fn context_with_help(self, msg: &str, help: &[&str]) -> anyhow::Result<T> {
        self.map_err(|e| {
            let mut text = format!("{}\n\n{e}", msg.red().bold());
            if !help.is_empty() {
                text.push_str(&format!("\n\n{}", "Possible solutions:".yellow().bold()));
                for (i, h) in help.iter().enumerate() {
                    text.push_str(&format!("\n  {}. {h}", i + 1));
                }
            }
            anyhow::anyhow!(text)
        })
    }
}

pub mod helpers {
    pub const STORAGE_CONNECTION_HELP: &[&str] = &[
        "Check storage.backend and storage.redb_path / storage.turso_url in the config file",
        "For a local redb store, verify the containing directory is writable",
        "For Turso, verify the network connection and auth token",
    ];

    pub const MEMORY_NOT_FOUND_HELP: &[&str] = &[
        "Check that the memory id is correct (use 'forgetful memory query' to list candidates)",
        "The memory may have been marked obsolete rather than deleted; obsolete memories are still fetchable by id",
    ];

    pub const CONFIG_ERROR_HELP: &[&str] = &[
        "Check the config file pointed to by --config or FORGETFUL_CONFIG",
        "Verify storage.backend is 'redb' or 'turso' and its required fields are set",
        "Run 'forgetful config show' to see the resolved configuration",
    ];
}
