use std::process::ExitCode;

fn main() -> ExitCode {
    hiredesk_cli::run()
}
