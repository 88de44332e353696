use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use clap_complete::{generate, Shell};

use depot_cli::cli::build_cli_command;

pub fn handle(shell: Shell, out: Option<&Path>) -> Result<()> {
    let mut cmd = build_cli_command();
    let bin = cmd.get_name().to_string();
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(path)
                .with_context(|| format!("creating completion file {}", path.display()))?;
            generate(shell, &mut cmd, bin, &mut file);
            println!("Wrote {shell} completion to {}", path.display());
        }
        None => generate(shell, &mut cmd, bin, &mut io::stdout()),
    }
    Ok(())
}
