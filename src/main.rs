mod checks;
mod commands;
mod core;
mod engine;
mod project;
mod safety;
mod ui;

use clap::{Parser, Subcommand};
use core::context::ProjectContext;
use core::error::{ExitCode, RelError, print_error};
use engine::Params;
use engine::validators::{CONFIRM_PARAM, FORCE_EMPTY_PARAM, REVIEW_PARAM};
use safety::TokenManager;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter variable (e.g. `RELGATE_LOG=debug`)
const LOG_ENV: &str = "RELGATE_LOG";

/// Flags stripped from the command line echoed back in re-run instructions
const TOKEN_FLAGS: [&str; 3] = ["--confirm", "--review", "--force-empty-changelog"];

/// Gated release workflow for uv-managed Python packages
#[derive(Parser)]
#[command(name = "relgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Output the outcome as JSON
  #[arg(long, global = true)]
  json: bool,

  /// Package to operate on (defaults to the root package)
  #[arg(short, long, global = true)]
  package: Option<String>,

  /// Confirmation token printed by a previous run
  #[arg(long, global = true, value_name = "TOKEN")]
  confirm: Option<String>,

  /// Review token from `relgate log` or `relgate status`
  #[arg(long, global = true, value_name = "TOKEN")]
  review: Option<String>,

  /// Override token allowing a bump with an empty changelog
  #[arg(long, global = true, value_name = "TOKEN")]
  force_empty_changelog: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Inspection
  // ============================================================================
  /// Show project release readiness
  Status,

  /// Run every pre-release check
  Preflight,

  /// List commits since the last tag (review for bump)
  Log {
    /// Maximum number of commits to list
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: u64,
  },

  // ============================================================================
  // Preparation
  // ============================================================================
  /// Create CHANGELOG.md from a template
  InitChangelog,

  /// Bump version and update changelog
  Bump {
    /// Which version component to bump
    #[arg(value_parser = ["major", "minor", "patch"])]
    bump_type: String,
  },

  // ============================================================================
  // Shipping
  // ============================================================================
  /// Create and push the git tag for the current version
  Tag {
    /// Create the tag locally without pushing it
    #[arg(long)]
    no_push: bool,
  },

  /// Build distribution packages
  Build,

  /// Publish the built package to PyPI
  Publish,

  /// Full release: checks, tag, build, publish
  Release,
}

impl Commands {
  /// Registry name of the subcommand
  fn name(&self) -> &'static str {
    match self {
      Commands::Status => "status",
      Commands::Preflight => "preflight",
      Commands::Log { .. } => "log",
      Commands::InitChangelog => "init-changelog",
      Commands::Bump { .. } => "bump",
      Commands::Tag { .. } => "tag",
      Commands::Build => "build",
      Commands::Publish => "publish",
      Commands::Release => "release",
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging() {
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
  // Diagnostics go to stderr so `--json` output stays parseable
  let _ = tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
    .try_init();
}

/// Parameters shared by every validator and step of this invocation
fn params_from(cli: &Cli) -> Params {
  let mut params = Params::new()
    .with_opt("package", cli.package.clone())
    .with_opt(CONFIRM_PARAM, cli.confirm.clone())
    .with_opt(REVIEW_PARAM, cli.review.clone())
    .with_opt(FORCE_EMPTY_PARAM, cli.force_empty_changelog.clone())
    .with("invocation", invocation(std::env::args().skip(1)));

  match &cli.command {
    Commands::Log { limit } => params = params.with("limit", *limit),
    Commands::Bump { bump_type } => params = params.with("bump_type", bump_type.clone()),
    Commands::Tag { no_push } => params = params.with("push", !no_push),
    _ => {}
  }
  params
}

/// `relgate <args>` with every token flag (and its value) removed
fn invocation(args: impl Iterator<Item = String>) -> String {
  let mut kept = vec!["relgate".to_string()];
  let mut skip_value = false;
  for arg in args {
    if skip_value {
      skip_value = false;
      continue;
    }
    if TOKEN_FLAGS.contains(&arg.as_str()) {
      skip_value = true;
      continue;
    }
    if TOKEN_FLAGS.iter().any(|flag| arg.starts_with(&format!("{}=", flag))) {
      continue;
    }
    kept.push(arg);
  }
  kept.join(" ")
}

fn main() {
  let cli = Cli::parse();
  init_logging();

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(RelError::from(e).context("Failed to get current directory")),
  };

  // Build the project context once; every command reads the same snapshot
  let ctx = match ProjectContext::build(&root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let tokens = Arc::new(TokenManager::from_env(&ctx.root));
  let registry = match commands::registry(tokens, &ctx.config) {
    Ok(registry) => registry,
    Err(e) => handle_error(e),
  };

  let params = params_from(&cli);
  let outcome = registry.dispatch(cli.command.name(), &ctx, params);

  if cli.json {
    match ui::render_json(&outcome) {
      Ok(json) => println!("{}", json),
      Err(e) => handle_error(e),
    }
  } else {
    print!("{}", ui::render(&outcome));
  }

  let code = if outcome.success() { ExitCode::Success } else { ExitCode::User };
  std::process::exit(code.as_i32());
}

fn handle_error(err: RelError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
