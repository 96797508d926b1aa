use std::{process::ExitCode, sync::Arc};

use admin_scripts::{cli::Cli, submitter::SentHook};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    let on_sent: SentHook = Arc::new(|label, hash| println!("sent {label}: {hash:#x}"));
    let config = cli.dispatch_config(Some(on_sent));

    match cli.command.run(&config).await {
        Ok(report) => {
            if !report.is_empty() {
                println!("{report}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
