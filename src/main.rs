use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};
use colored::Colorize;
use std::path::{Path, PathBuf};
use uecli::{
    api::{self, CppOptions, CppOutcome},
    config::Config,
    template::{TemplateSource, TeraRenderer},
};

// The CLI layer should only parse inputs and forward them to library code.
fn main() -> miette::Result<()> {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to the config file (defaults to $UECLI_CONFIG or the user config dir)")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("cpp")
                .about("Turn a blueprint project into a C++ project")
                .arg(
                    Arg::new("project")
                        .help("Project name, project folder or .uproject file")
                        .required(true),
                )
                .arg(
                    Arg::new("no-input")
                        .long("no-input")
                        .help("Use default values without prompting (pass `false` to be asked)")
                        .value_parser(value_parser!(bool))
                        .num_args(0..=1)
                        .default_value("true")
                        .default_missing_value("true"),
                )
                .arg(
                    Arg::new("template")
                        .long("template")
                        .help("Render this template directory instead of the built-in one")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("init")
                .about("Record the engine and project folders in the config file")
                .arg(
                    Arg::new("engine")
                        .long("engine")
                        .help("Unreal Engine install folder")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("project-path")
                        .long("project-path")
                        .help("Folder holding Unreal projects, may be repeated")
                        .value_parser(value_parser!(PathBuf))
                        .action(ArgAction::Append),
                ),
        )
        .get_matches();

    let is_verbose = matches.get_flag("verbose");

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if is_verbose { "debug" } else { "info" }),
    )
    .init();

    let config_path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path.clone(),
        None => Config::default_location()?,
    };

    match matches.subcommand() {
        Some(("cpp", args)) => handle_cpp(args, &config_path),
        Some(("init", args)) => handle_init(args, &config_path),
        _ => unreachable!(),
    }
}

fn handle_cpp(args: &ArgMatches, config_path: &Path) -> miette::Result<()> {
    let project = args
        .get_one::<String>("project")
        .expect("project required");
    let no_input = args
        .get_one::<bool>("no-input")
        .copied()
        .unwrap_or(true);
    let template = args
        .get_one::<PathBuf>("template")
        .map(|dir| TemplateSource::Directory(dir.clone()))
        .unwrap_or(TemplateSource::Bundled);

    let config = Config::load(config_path)?;

    let options = CppOptions {
        project: project.clone(),
        no_input,
        template,
    };

    match api::cpp(&options, &config, &TeraRenderer)? {
        CppOutcome::Converted { project_dir, .. } => {
            println!(
                "{} {} is now a C++ project",
                "done".green().bold(),
                project_dir.display()
            );
        }
        CppOutcome::Canceled => {
            println!("{}", "canceled".yellow());
        }
    }

    Ok(())
}

fn handle_init(args: &ArgMatches, config_path: &Path) -> miette::Result<()> {
    let engine = args.get_one::<PathBuf>("engine").cloned();
    let project_paths = args
        .get_many::<PathBuf>("project-path")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();

    let config = api::init(config_path, engine, project_paths)?;

    if !config.is_ready() {
        log::warn!("no Unreal Engine install found at the configured engine path");
    }

    println!("{} {}", "config".green(), config_path.display());

    Ok(())
}
