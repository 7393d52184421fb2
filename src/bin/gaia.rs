use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use gaia_graph::{GraphBuilder, GraphError, Resource, Result, load_request, sync_impl, validate};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run geospatial process.", long_about = None)]
struct Args {
    /// Process to run, e.g. `within`
    process: String,

    /// String representation of the JSON request
    #[arg(long)]
    jsonstr: Option<String>,

    /// Path to a JSON request file
    #[arg(long)]
    jsonfile: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &Args) -> Result<()> {
    let Some(spec) = load_request(args.jsonstr.as_deref(), args.jsonfile.as_deref())? else {
        println!("You must supply either a JSON string or file");
        println!("{}", Args::command().render_usage());
        return Ok(());
    };

    let builder = GraphBuilder::global()?;
    let mut process = match builder.build(&args.process, Some(&spec), None) {
        Ok(process) => process,
        Err(err @ GraphError::UnknownProcessType { .. }) => {
            let registry = builder.registry();
            let available: Vec<&str> = registry
                .names()
                .into_iter()
                .filter(|name| registry.get_process(name).is_ok())
                .collect();
            eprintln!("Available processes: {}", available.join(", "));
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    let report = validate(&process);
    if !report.is_safe() || report.has_warnings() {
        report.print_summary();
    }
    if !report.is_safe() {
        return Err(GraphError::InvalidRequest(format!(
            "request for '{}' failed validation",
            args.process
        )));
    }

    sync_impl::run(&mut process)?;

    match process.output() {
        Some(Resource::File(file)) => println!("Result saved to {}", file.uri),
        Some(Resource::Data { value }) => println!("Result: {}", value),
        None => println!("Process produced no output"),
    }
    Ok(())
}
