use slack_router_cli::{run_cli, CliError};

fn main() {
    if let Err(e) = run_cli() {
        eprintln!("{}", e);

        let exit_code = match e {
            CliError::Verification(_) => 1,
            CliError::InvalidArgument { .. } => 2,
            CliError::Io(_) => 3,
        };

        std::process::exit(exit_code);
    }
}
