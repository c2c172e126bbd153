// src/main.rs

use execd::{cli, logging, run, socket_path_for};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if args.print_socket_path {
        match socket_path_for(&args) {
            Ok(path) => println!("{}", path.display()),
            Err(err) => {
                eprintln!("execd error: {err}");
                std::process::exit(err.exit_code());
            }
        }
        return;
    }

    if let Err(err) = logging::init_logging(args.log_level, args.log_file.as_deref()) {
        eprintln!("execd error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        error!(error = %err, "execd exiting with error");
        std::process::exit(err.exit_code());
    }
}
