//! Config command

use anyhow::Result;
use camino::Utf8Path;

use crate::cli::ConfigArgs;
use crate::commands::load_config;

const MASK: &str = "********";

pub fn run(args: ConfigArgs, config_file: Option<&Utf8Path>) -> Result<()> {
    let mut config = load_config(config_file)?;

    if !args.show_token && config.api.token.is_some() {
        config.api.token = Some(MASK.to_string());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", serde_yaml_ng::to_string(&config)?);
    }

    Ok(())
}
