use std::process::ExitCode;

fn main() -> ExitCode {
    aliasconf_cli::run()
}
