use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::config::ZenoConfig;

pub fn run() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join("zeno.yml");

    if config_path.exists() {
        print!(
            "zeno.yml already exists in {}. Overwrite? [y/N] ",
            cwd.display()
        );
        std::io::stdout().flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Keeping the existing zeno.yml.");
            return Ok(());
        }
    }

    let yaml = serde_yaml::to_string(&ZenoConfig::default())
        .context("serialising default config")?;
    std::fs::write(&config_path, yaml)
        .with_context(|| format!("writing {}", config_path.display()))?;

    println!("Created zeno.yml in {}", cwd.display());
    println!();
    println!("Edit the build command and binary path, then run `zeno run`.");
    Ok(())
}
