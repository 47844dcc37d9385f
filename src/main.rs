// stepscope: step through a small program and watch its variables change

use std::error::Error;
use std::io;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stepscope::config::{Cli, Config, Emit};
use stepscope::runner::{RunReport, TraceRunner};
use stepscope::session::{PipelineError, Session};
use stepscope::ui::App;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let config = Config::from_cli(Cli::parse())?;
    info!(path = %config.path.display(), language = %config.language, "loaded program");

    let mut session = Session::new(config.source.as_str(), config.language.id());
    let runner = TraceRunner::new(config.runner);

    match config.emit {
        Emit::Report => println!("{}", serde_json::to_string_pretty(session.structure())?),
        Emit::Host => print!("{}", session.host_program()?.source),
        Emit::Instrumented => print!("{}", session.instrumented()?.render()),
        Emit::Trace => {
            let report = session.visualize(&runner)?;
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        Emit::Tui => run_viewer(&mut session, &runner)?,
    }

    Ok(())
}

fn run_viewer(session: &mut Session, runner: &TraceRunner) -> Result<(), Box<dyn Error>> {
    let host = session.host_program()?;
    let capture_lines = match session.instrumented() {
        Ok(program) => program.capture_lines,
        Err(PipelineError::Syntax(_)) => Default::default(),
        Err(err) => return Err(err.into()),
    };
    let report: RunReport = session.visualize(runner)?.clone();
    let structure = session.structure().clone();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(host.source, capture_lines, report, structure);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
