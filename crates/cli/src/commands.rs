//! Clap command definition.

use clap::{Arg, ArgAction, Command};

/// Build the command-line interface.
pub fn build_cli() -> Command {
    Command::new("zbot")
        .about("Command daemon with a versioned object store")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("wd")
                .long("wd")
                .value_name("DIR")
                .help("Working directory (default: ~/.zbot)"),
        )
        .arg(
            Arg::new("mods")
                .long("mods")
                .short('m')
                .value_name("LIST")
                .help("Comma-separated modules to load, overriding zbot.toml"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Debug logging")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("daemon")
                .long("daemon")
                .short('d')
                .help("Run without a console until stopped")
                .action(ArgAction::SetTrue)
                .conflicts_with("words"),
        )
        .arg(
            Arg::new("words")
                .help("Run one command and exit, e.g. `zbot log buy milk`")
                .num_args(1..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        )
}

/// Split a `--mods` value into module names.
pub fn split_mods(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
