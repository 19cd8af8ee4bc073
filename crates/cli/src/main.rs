use std::process::ExitCode;

fn main() -> ExitCode {
    rfqflow_cli::run()
}
