use clap::Parser;
use std::path::PathBuf;

/// Terminal task list with a persisted snapshot.
#[derive(Debug, Clone, Parser)]
#[command(name = "taskers", version)]
pub struct Config {
    /// Storage file holding the task snapshot.
    #[arg(long, env = "TASKERS_STORE", default_value = "taskers_store.json")]
    pub store: PathBuf,

    /// Where log output goes; the terminal itself is taken by the UI.
    #[arg(long, env = "TASKERS_LOG", default_value = "taskers.log")]
    pub log_file: PathBuf,

    /// Run without reading or writing the storage file.
    #[arg(long)]
    pub no_persist: bool,
}
