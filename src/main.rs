use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use dotcycles::cli::{self, Cli};
use dotcycles::error::{DotcyclesError, IngestError};
use dotcycles::util::output;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                return ExitCode::SUCCESS;
            }
            return ExitCode::from(1);
        }
    };

    if let Err(err) = cli::run(&cli) {
        output::error(&format!("ERROR: {err}"));
        if matches!(
            err,
            DotcyclesError::Ingest(IngestError::Unreadable { .. })
        ) {
            output::info("USAGE: dotcycles <path-to-graph-file>");
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
