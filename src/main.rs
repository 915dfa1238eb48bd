use std::process::ExitCode;

fn main() -> ExitCode {
    cloud_filter_lib::run()
}
