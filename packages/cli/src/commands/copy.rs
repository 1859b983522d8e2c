use super::{open_session, report};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Markup file to copy from
    pub file: PathBuf,

    /// Path of a node to copy (repeatable); defaults to the initial selection
    #[arg(short, long = "select")]
    pub select: Vec<String>,
}

pub fn copy(args: CopyArgs, config: &Config) -> Result<()> {
    let mut session = open_session(config, &args.file, &args.select)?;
    let copied = match session.copy() {
        Ok(copied) => copied,
        Err(err) => return Err(report(&session.text(), &args.file, err)),
    };

    eprintln!(
        "{} {}",
        "Copied".green().bold(),
        copied.display_names.join(", ")
    );
    println!("{}", copied.text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_copy_selected_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        fs::write(&file, "<div><p>a</p></div>").unwrap();
        let config = Config::load(dir.path()).unwrap();

        let args = CopyArgs {
            file,
            select: vec!["0_0_0".to_string()],
        };
        assert!(copy(args, &config).is_ok());
    }

    #[test]
    fn test_unknown_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        fs::write(&file, "<div></div>").unwrap();
        let config = Config::load(dir.path()).unwrap();

        let args = CopyArgs {
            file,
            select: vec!["0_9".to_string()],
        };
        assert!(copy(args, &config).is_err());
    }
}
