use consolepanel_core::{Verbosity, init_logging};

mod app;
mod commands;
mod remote;
mod watch;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = app::build_cli();
    let matches = app.get_matches();

    // `serve` is a long-running process and always logs at least at info
    let mut verbosity = Verbosity::from_occurrences(matches.get_count("verbose"));
    if matches.subcommand_name() == Some("serve") {
        verbosity = verbosity.max(Verbosity::Normal);
    }
    init_logging(verbosity);

    commands::run_command(&matches)?;

    Ok(())
}
