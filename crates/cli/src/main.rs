use std::process::ExitCode;

fn main() -> ExitCode {
    osvoice_cli::run()
}
