use std::path::Path;

use anyhow::Result;

use vitrine_core::AppConfig;

pub fn run(config: &AppConfig, path: &Path, save: bool) -> Result<()> {
    if save {
        config.save_to(path)?;
        println!("Saved configuration to {}", path.display());
        return Ok(());
    }

    let status = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("# {}{}\n", path.display(), status);
    print!("{}", config.to_toml()?);

    Ok(())
}
