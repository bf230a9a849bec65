use midoss_forcing::{
    config::{CliArgs, CliCommand},
    error::ForcingError,
    run::create_forcing,
    stats::make_stats_file,
};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let matches = CliArgs::command().get_matches();
    let args = match CliArgs::from_matches(&matches) {
        Ok(args) => args,
        Err(e) => exit_with(e),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not install logger: {}", e);
    }

    if let Err(e) = run(args.command) {
        exit_with(e);
    }
}

fn run(command: CliCommand) -> Result<(), ForcingError> {
    match command {
        CliCommand::MakeHdf5(request) => {
            let summary = create_forcing(&request.yaml_filename, request.start_date, request.n_days)?;
            for group in &summary.groups {
                info!(
                    "{}: {} records written, {} skipped, from {} files",
                    group.kind.group(),
                    group.written,
                    group.skipped,
                    group.source_files
                );
            }
        }
        CliCommand::Stats(stats) => {
            make_stats_file(&stats.directory, stats.grid_x, stats.grid_y, &stats.output)?;
        }
    }
    Ok(())
}

/// Report a fatal error once on stderr and exit with its code
fn exit_with(e: ForcingError) -> ! {
    eprintln!("{}", e);
    std::process::exit(e.exit_code());
}
