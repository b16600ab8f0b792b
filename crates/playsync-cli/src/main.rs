use playsync_lib::cli::{
    ResolvedCommand, parse_args, resolve_command, run_check, run_daemon, run_sync,
};
use playsync_lib::error::PlaysyncError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), PlaysyncError> {
    color_eyre::install()?;

    let args = parse_args()?;
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Sync(params) => run_sync(params).await?,
        ResolvedCommand::Daemon(params) => run_daemon(params).await?,
        ResolvedCommand::Check(params) => run_check(params).await?,
    }

    Ok(())
}
