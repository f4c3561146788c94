mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kdev_lib::inspect::{DEFAULT_OBJECT_LIMIT, DEFAULT_SYMBOL_LIMIT};
use kdev_lib::session::Shell;

use crate::cmd::BuildKind;
use crate::output::{OutputFormat, print_error};

/// kdev - Android kernel build, package and boot helpers
#[derive(Parser)]
#[command(name = "kdev")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to kdev.toml (default: $KDEV_CONFIG, then search upward)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the kernel
  Compile {
    /// Extra arguments passed to make
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Clean the build output
  Clean,

  /// Package the current build into a flashable zip
  Package {
    /// Destination (default: builds/<kernel>-<device>-<tag>.zip)
    path: Option<PathBuf>,

    /// Release version; falls back to $RELEASE_VER, otherwise a test package
    #[arg(long)]
    release: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },

  /// Package a test build named after the build counter
  PackageTest {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },

  /// Reset the build counter
  ResetCounter,

  /// Build and package a release
  Release {
    /// Release version, e.g. 3
    version: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Extra arguments passed to make
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Clean, then build and package a release
  CleanRelease {
    /// Release version, e.g. 3
    version: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Extra arguments passed to make
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Clean, build and package the working copy
  CleanBuild {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Extra arguments passed to make
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Build and package the working copy
  IncBuild {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Extra arguments passed to make
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Build and package a test build
  TestBuild {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Extra arguments passed to make
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Boot a kernel image on the attached device without flashing it
  Install {
    /// Image to boot (default: <out>/arch/<arch>/boot/Image.gz-dtb)
    image: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },

  /// Build the working copy and boot it on the attached device
  BuildInstall {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Extra arguments passed to make
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Inspect and edit the kernel configuration
  Config {
    #[command(subcommand)]
    command: ConfigCommands,
  },

  /// Size reports over the build output
  Size {
    #[command(subcommand)]
    command: SizeCommands,
  },

  /// Print the shell setup script (eval "$(kdev env)")
  Env {
    /// Shell to generate the script for (auto-detected if not specified)
    #[arg(short, long)]
    shell: Option<Shell>,

    /// Print the teardown script instead
    #[arg(long)]
    teardown: bool,
  },

  /// Show the loaded build configuration
  Info {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },
}

#[derive(Subcommand)]
enum ConfigCommands {
  /// Show option changes between the defconfig and the generated config
  Diff {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },

  /// Overwrite the defconfig with the generated config
  Commit,

  /// Regenerate the config from the defconfig
  Reset,

  /// Edit the generated config (menuconfig, or a text editor with --raw)
  Edit {
    /// Open the raw file in $EDITOR instead of menuconfig
    #[arg(long)]
    raw: bool,

    /// Editor command for --raw
    #[arg(long, requires = "raw")]
    editor: Option<String>,
  },
}

#[derive(Subcommand)]
enum SizeCommands {
  /// Largest compiled objects
  Objects {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_OBJECT_LIMIT)]
    limit: usize,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },

  /// Largest symbols in vmlinux
  Symbols {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_SYMBOL_LIMIT)]
    limit: usize,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let config = cli.config.as_deref();

  match cli.command {
    Commands::Compile { args } => cmd::cmd_compile(config, &args),
    Commands::Clean => cmd::cmd_clean(config),
    Commands::Package { path, release, output } => cmd::cmd_package(config, path.as_deref(), release.as_deref(), output),
    Commands::PackageTest { output } => cmd::cmd_package_test(config, output),
    Commands::ResetCounter => cmd::cmd_reset_counter(config),
    Commands::Release { version, output, args } => cmd::cmd_release(config, &version, &args, false, output),
    Commands::CleanRelease { version, output, args } => cmd::cmd_release(config, &version, &args, true, output),
    Commands::CleanBuild { output, args } => cmd::cmd_build(config, BuildKind::Clean, &args, output),
    Commands::IncBuild { output, args } => cmd::cmd_build(config, BuildKind::Incremental, &args, output),
    Commands::TestBuild { output, args } => cmd::cmd_build(config, BuildKind::Test, &args, output),
    Commands::Install { image, output } => cmd::cmd_install(config, image.as_deref(), output),
    Commands::BuildInstall { output, args } => cmd::cmd_build_install(config, &args, output),
    Commands::Config { command } => match command {
      ConfigCommands::Diff { output } => cmd::cmd_config_diff(config, output),
      ConfigCommands::Commit => cmd::cmd_config_commit(config),
      ConfigCommands::Reset => cmd::cmd_config_reset(config),
      ConfigCommands::Edit { raw, editor } => cmd::cmd_config_edit(config, raw, editor.as_deref()),
    },
    Commands::Size { command } => match command {
      SizeCommands::Objects { limit, output } => cmd::cmd_size_objects(config, limit, output),
      SizeCommands::Symbols { limit, output } => cmd::cmd_size_symbols(config, limit, output),
    },
    Commands::Env { shell, teardown } => cmd::cmd_env(config, shell, teardown),
    Commands::Info { output } => cmd::cmd_info(config, output),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
