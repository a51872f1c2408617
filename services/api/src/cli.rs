use crate::offline::{run_offline_allotment, AllotArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hostel_allot::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Hostel Allotment",
    about = "Run merit-ranked hostel room allotment as a service or from CSV rosters",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one allotment offline against student and room CSV files
    Allot(AllotArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Allot(args) => run_offline_allotment(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostel_allot::workflows::allotment::EligibilityOrder;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["hostel-allot-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn allot_accepts_cutoff_and_order_overrides() {
        let cli = Cli::try_parse_from([
            "hostel-allot-api",
            "allot",
            "--students",
            "students.csv",
            "--rooms",
            "rooms.csv",
            "--cutoff",
            "3",
            "--order",
            "rank-major",
            "--json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Allot(args)) => {
                assert_eq!(args.cutoff, Some(3));
                assert_eq!(args.order, Some(EligibilityOrder::RankMajor));
                assert!(args.json);
            }
            other => panic!("expected allot command, got {other:?}"),
        }
    }

    #[test]
    fn allot_rejects_unknown_order() {
        let result = Cli::try_parse_from([
            "hostel-allot-api",
            "allot",
            "--students",
            "s.csv",
            "--rooms",
            "r.csv",
            "--order",
            "alphabetical",
        ]);
        assert!(result.is_err());
    }
}
