use aip::{LoadedData, Settings, logging};
use std::path::PathBuf;

/// Environment variable naming a JSON5 settings file.
const SETTINGS_ENV: &str = "AIP_SETTINGS";

fn main() -> anyhow::Result<()> {
    let settings = match std::env::var_os(SETTINGS_ENV) {
        Some(path) => Settings::load_path(&PathBuf::from(path))?,
        None => Settings::default(),
    };
    let log = logging::init(&settings);

    // Optional data snapshot to start with; more can be opened from the menu.
    let data = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .map(|path| LoadedData::load_path(&path))
        .transpose()?;

    aip::run_gui(data, settings, log).map_err(|e| anyhow::anyhow!("{e}"))
}
