use std::{io::ErrorKind as IoErrorKind, path::PathBuf};

use clap::{
    CommandFactory, FromArgMatches,
    error::{ErrorKind as ClapErrorKind, Result as ClapResult},
};
use refpack::build::{BuildConfig, CONFIG_FILE};

#[derive(Debug)]
pub struct Main {
    pub verbose: bool,
    pub command: Command,
}

impl Main {
    pub fn parse() -> ClapResult<Main> {
        let mut cmd = MainArgs::command();
        let mut matches = cmd
            .try_get_matches_from_mut(std::env::args_os())
            .map_err(|err| err.format(&mut cmd))?;
        let args =
            MainArgs::from_arg_matches_mut(&mut matches).map_err(|err| err.format(&mut cmd))?;

        let command = match args.command {
            CommandArgs::Build(BuildArgs {
                config: path,
                strict,
                output,
            }) => {
                let contents = match std::fs::read_to_string(&path) {
                    Ok(contents) => contents,
                    Err(err) if err.kind() == IoErrorKind::NotFound => {
                        return Err(cmd.error(
                            ClapErrorKind::Io,
                            format!(
                                "`{}` doesn't exist; please specify a configuration file with `--config`",
                                path.display()
                            ),
                        ));
                    }
                    Err(err) => {
                        return Err(cmd.error(
                            ClapErrorKind::Io,
                            format!("Failed to read `{}`: {err}", path.display()),
                        ));
                    }
                };
                let mut config = BuildConfig::from_toml(&contents).map_err(|err| {
                    cmd.error(
                        ClapErrorKind::ValueValidation,
                        format!("Failed to parse `{}`: {err}", path.display()),
                    )
                })?;
                if let Some(base) = path.parent() {
                    config.resolve_paths(base);
                }

                // Flags override the configuration file.
                config.strict |= strict;
                if let Some(output) = output {
                    config.output = output;
                }
                Command::Build(config)
            }
            CommandArgs::Resolve(ResolveArgs {
                shared,
                input,
                strict,
            }) => Command::Resolve(Resolve {
                shared,
                input,
                strict,
            }),
            CommandArgs::Schema(SchemaArgs { input, id, output }) => {
                Command::Schema(Schema { input, id, output })
            }
        };

        Ok(Main {
            verbose: args.verbose,
            command,
        })
    }
}

#[derive(Debug)]
pub enum Command {
    Build(BuildConfig),
    Resolve(Resolve),
    Schema(Schema),
}

#[derive(Debug)]
pub struct Resolve {
    pub shared: PathBuf,
    pub input: PathBuf,
    pub strict: bool,
}

#[derive(Debug)]
pub struct Schema {
    pub input: PathBuf,
    pub id: String,
    pub output: Option<PathBuf>,
}

#[derive(Debug, clap::Parser)]
#[command(version, about, long_about = None)]
struct MainArgs {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CommandArgs,
}

#[derive(Debug, clap::Subcommand)]
enum CommandArgs {
    /// Bundle every API in a configuration file, and generate
    /// JSON Schema documents and TypeScript types for them.
    Build(BuildArgs),
    /// Print the shared schemas that an API document needs, as YAML.
    Resolve(ResolveArgs),
    /// Extract the schemas of an OpenAPI document into a JSON Schema document.
    Schema(SchemaArgs),
}

#[derive(Debug, clap::Args)]
struct BuildArgs {
    /// The build configuration file.
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Fail on references to undefined schemas.
    #[arg(long)]
    strict: bool,

    /// The output directory. Overrides the configuration file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct ResolveArgs {
    /// The shared definitions document.
    shared: PathBuf,

    /// The API document.
    input: PathBuf,

    /// Fail on references to undefined schemas.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, clap::Args)]
struct SchemaArgs {
    /// The OpenAPI document (`.yaml` or `.json`).
    input: PathBuf,

    /// The `$id` of the JSON Schema document.
    #[arg(long)]
    id: String,

    /// The output file. Prints to standard output if not set.
    #[arg(short, long)]
    output: Option<PathBuf>,
}
