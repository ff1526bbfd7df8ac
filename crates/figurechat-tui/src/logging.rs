use std::fs::{self, OpenOptions};

use anyhow::Result;
use env_logger::{Env, Target};
use figurechat_core::Config;

/// Sends log output to `figurechat.log` in the config directory.
///
/// The terminal belongs to the UI, so nothing is written to stderr. Filtering
/// follows `RUST_LOG` and defaults to `info`.
pub fn init() -> Result<()> {
    let dir = Config::config_dir()?;
    fs::create_dir_all(&dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("figurechat.log"))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}
