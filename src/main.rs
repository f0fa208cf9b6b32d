use clap::{App, AppSettings, Arg, SubCommand};
use spacetraveling::build::build_site;
use spacetraveling::config::Config;
use spacetraveling::prismic::PrismicGateway;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Names the environment variable holding the log filter directives.
const LOG_VAR: &str = "SPACETRAVELING_LOG";

fn main() {
    init_tracing_subscriber();

    let matches = App::new("spacetraveling")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Fetches all posts and writes the static site")
                .arg(
                    Arg::with_name("project")
                        .short("p")
                        .long("project")
                        .takes_value(true)
                        .help("Directory to search (upwards) for spacetraveling.yaml")
                        .default_value("."),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("Output directory")
                        .default_value("_output"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("build") {
        let project = PathBuf::from(matches.value_of("project").unwrap_or("."));
        let output = PathBuf::from(matches.value_of("output").unwrap_or("_output"));
        if let Err(e) = build(project, output) {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn build(project: PathBuf, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_directory(&project.canonicalize()?, &output)?;
    tracing::info!("Building into {}", config.root_output_directory.display());
    let gateway = PrismicGateway::connect(
        config.prismic_endpoint.clone(),
        config.access_token.clone(),
        config.orderings.clone(),
    )?;
    std::fs::create_dir_all(&config.root_output_directory)?;
    build_site(&config, &gateway)?;
    tracing::info!("Done");
    Ok(())
}

fn init_tracing_subscriber() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
