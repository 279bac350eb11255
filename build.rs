use std::{
    env, fs,
    io::Result,
    path::{Path, PathBuf},
};

use clap::CommandFactory;
use clap_complete::{generate_to, shells::Shell};

#[allow(dead_code)]
mod args {
    include!("src/options/args.rs");
}

use args::Args;

fn create_dir(dir: &Path) -> Result<()> {
    let res = fs::create_dir_all(dir);
    if let Err(err) = &res {
        eprintln!(
            "Failed to create a directory at location {dir:?}, encountered error {err:?}. Aborting..."
        );
    }

    res
}

fn main() -> Result<()> {
    const COMPLETION_DIR: &str = "./target/tmp/perfstat/completion/";
    const MANPAGE_DIR: &str = "./target/tmp/perfstat/manpage/";

    match env::var_os("PERFSTAT_GENERATE") {
        Some(var) if !var.is_empty() => {
            let completion_out_dir = PathBuf::from(COMPLETION_DIR);
            let manpage_out_dir = PathBuf::from(MANPAGE_DIR);

            create_dir(&completion_out_dir)?;
            create_dir(&manpage_out_dir)?;

            let mut app = Args::command();
            for shell in [
                Shell::Bash,
                Shell::Zsh,
                Shell::Fish,
                Shell::PowerShell,
                Shell::Elvish,
            ] {
                generate_to(shell, &mut app, "perfstat", &completion_out_dir)?;
            }

            let man = clap_mangen::Man::new(app);
            let mut buffer: Vec<u8> = Default::default();
            man.render(&mut buffer)?;
            fs::write(manpage_out_dir.join("perfstat.1"), buffer)?;
        }
        _ => {}
    }

    println!("cargo:rerun-if-env-changed=PERFSTAT_GENERATE");
    println!("cargo:rerun-if-changed=src/options/args.rs");

    Ok(())
}
