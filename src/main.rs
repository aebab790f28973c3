use std::process::ExitCode;

fn main() -> ExitCode {
    // A local `.env` may set RUST_LOG.
    dotenvy::dotenv().ok();

    let (global_level, crate_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Warn, log::LevelFilter::Warn)
    };
    env_logger::Builder::new()
        .filter(None, global_level)
        .filter(Some("call_curves"), crate_level)
        .parse_env("RUST_LOG")
        .init();

    match call_curves::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
