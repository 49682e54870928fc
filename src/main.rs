use std::process;

use clap::error::ErrorKind as ArgsErrorKind;
use clap::Parser;
use console::style;

use kb_gate::cmd::App;

#[tokio::main]
async fn main() {
    let app = match App::try_parse() {
        Ok(app) => app,
        Err(err) => {
            let _ = err.print();
            if matches!(
                err.kind(),
                ArgsErrorKind::DisplayHelp
                    | ArgsErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                    | ArgsErrorKind::DisplayVersion
            ) {
                return;
            }
            process::exit(3);
        }
    };

    if let Err(err) = app.run().await {
        eprintln!("{}: {err:#}", style("error").red().bold());
        process::exit(1);
    }
}
