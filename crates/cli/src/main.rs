use std::process::ExitCode;

fn main() -> ExitCode {
    replydesk_cli::run()
}
