use std::process::ExitCode;

fn main() -> ExitCode {
    licibot_cli::run()
}
