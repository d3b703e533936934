//! confedit CLI - command line interface for the configuration editor

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use confedit_core::{
    Action, BoundConfiguration, ConfigurationIdentity, CurrentEnv, InMemoryStore, Settings,
    StateStore,
};
use confedit_editor::{
    parse_resource_items, BufferSurfaceFactory, ConfigPage, Delivery, HttpResourceResolver,
    ResourceReference, ResourceResolver, ResourceSelection, SessionHost, StaticResourceResolver,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, Level};

/// Subcommand to run
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// List `{{name@version}}` placeholders in a configuration file
    Refs { file: PathBuf },
    /// Resolve a reference by name within an environment and zone
    Resolve {
        reference: String,
        env: String,
        zone: String,
    },
    /// Resolve a fully qualified reference
    Detail { reference: String },
    /// Run a headless editing session over a configuration file
    Edit {
        file: PathBuf,
        env: String,
        zone: String,
        app: String,
        insert: Option<String>,
    },
}

/// CLI arguments structure
#[derive(Debug, Clone)]
pub struct Args {
    pub command: Option<CliCommand>,
    pub config_file: Option<PathBuf>,
    pub resource_file: Option<PathBuf>,
    pub verbose: bool,
    pub validate_config: bool,
}

fn env_arg() -> Arg {
    Arg::new("env")
        .short('e')
        .long("env")
        .help("Environment the configuration belongs to")
        .required(true)
        .value_parser(clap::value_parser!(String))
}

fn zone_arg() -> Arg {
    Arg::new("zone")
        .short('z')
        .long("zone")
        .help("Zone code within the environment")
        .required(true)
        .value_parser(clap::value_parser!(String))
}

fn reference_arg() -> Arg {
    Arg::new("reference")
        .help("Resource reference, `name` or `name@version`")
        .required(true)
        .index(1)
        .value_parser(clap::value_parser!(String))
}

/// Build the command line definition
pub fn build_cli() -> Command {
    Command::new("confedit")
        .version("0.1.0")
        .about("Configuration editor with resource insertion")
        .long_about(
            "confedit edits configuration files bound to an environment and zone, and \
            inserts the content of shared resources looked up from the resource service.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to settings file (JSON format)")
                .long_help(
                    "Path to a JSON settings file. Without it the default location under the \
                    user configuration directory is used when present. CONFEDIT_* environment \
                    variables override values from the file.",
                )
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("resource-file")
                .long("resource-file")
                .help("Serve lookups from a JSON {reference: content} table")
                .long_help(
                    "Resolve resources offline from a JSON object mapping references such as \
                    \"cache.conf@v2\" to their content, instead of calling the resource service.",
                )
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("validate-config")
                .long("validate-config")
                .help("Validate settings and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("refs")
                .about("List resource placeholders in a configuration file")
                .arg(
                    Arg::new("file")
                        .help("Configuration file to scan")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve a resource by name in an environment and zone")
                .arg(reference_arg())
                .arg(env_arg())
                .arg(zone_arg()),
        )
        .subcommand(
            Command::new("detail")
                .about("Fetch the content of a fully qualified resource reference")
                .arg(reference_arg()),
        )
        .subcommand(
            Command::new("edit")
                .about("Open a configuration file in a headless editing session")
                .arg(
                    Arg::new("file")
                        .help("Configuration file to edit")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(env_arg())
                .arg(zone_arg())
                .arg(
                    Arg::new("app")
                        .short('a')
                        .long("app")
                        .help("Application the configuration belongs to")
                        .required(true)
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    Arg::new("insert")
                        .short('i')
                        .long("insert")
                        .help("Insert the content of this resource at the end of the document")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .after_help(
            "EXAMPLES:\n    \
            confedit refs app.toml                                  List placeholders\n    \
            confedit resolve cache.conf --env prod --zone z1        Resolve by name\n    \
            confedit detail cache.conf@v2                           Resolve a selection\n    \
            confedit edit app.toml -e prod -z z1 -a svc -i cache.conf@v2  Insert a resource\n    \
            confedit --validate-config --config settings.json       Validate settings",
        )
}

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("Missing required argument: {}", name))
}

fn required_path(matches: &ArgMatches, name: &str) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("Missing required argument: {}", name))
}

impl Args {
    /// Parse command line arguments
    pub fn parse() -> Result<Self> {
        Self::from_matches(&build_cli().get_matches())
    }

    /// Build arguments from already parsed matches
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let command = match matches.subcommand() {
            Some(("refs", sub)) => Some(CliCommand::Refs {
                file: required_path(sub, "file")?,
            }),
            Some(("resolve", sub)) => Some(CliCommand::Resolve {
                reference: required(sub, "reference")?,
                env: required(sub, "env")?,
                zone: required(sub, "zone")?,
            }),
            Some(("detail", sub)) => Some(CliCommand::Detail {
                reference: required(sub, "reference")?,
            }),
            Some(("edit", sub)) => Some(CliCommand::Edit {
                file: required_path(sub, "file")?,
                env: required(sub, "env")?,
                zone: required(sub, "zone")?,
                app: required(sub, "app")?,
                insert: sub.get_one::<String>("insert").cloned(),
            }),
            Some((other, _)) => bail!("Unknown command: {}", other),
            None => None,
        };

        // Global args are visible on the subcommand matches too
        let scope = matches.subcommand().map(|(_, sub)| sub).unwrap_or(matches);

        Ok(Self {
            command,
            config_file: scope.get_one::<PathBuf>("config").cloned(),
            resource_file: scope.get_one::<PathBuf>("resource-file").cloned(),
            verbose: scope.get_flag("verbose"),
            validate_config: matches.get_flag("validate-config"),
        })
    }

    /// Load settings from the file (if any) and the environment
    pub fn load_settings(&self) -> Result<Settings> {
        match &self.config_file {
            Some(path) => info!("Loading settings from: {}", path.display()),
            None => debug!("Using default settings location"),
        }

        let settings = Settings::load(self.config_file.as_deref(), &Settings::environment())
            .context("Failed to load settings")?;
        Ok(settings)
    }

    /// Resolver for this invocation: the offline table when given, the
    /// lookup service otherwise
    pub fn resolver(&self, settings: &Settings) -> Result<Arc<dyn ResourceResolver>> {
        match &self.resource_file {
            Some(path) => {
                let json = std::fs::read_to_string(path).with_context(|| {
                    format!("Failed to read resource file: {}", path.display())
                })?;
                let resolver = StaticResourceResolver::from_json(&json)
                    .with_context(|| format!("Invalid resource file: {}", path.display()))?;
                info!("Serving resources from {}", path.display());
                Ok(Arc::new(resolver))
            }
            None => {
                let resolver = HttpResourceResolver::new(&settings.lookup)?;
                debug!("Using resource service at {}", resolver.base_url());
                Ok(Arc::new(resolver))
            }
        }
    }
}

/// Placeholders declared by a configuration, as `name@version` lines
fn run_refs(file: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read configuration file: {}", file.display()))?;

    let items = parse_resource_items(&content);
    info!("Found {} resource placeholder(s) in {}", items.len(), file.display());

    Ok(items
        .into_iter()
        .map(|item| format!("{}@{}", item.name, item.version))
        .collect())
}

async fn run_resolve(
    resolver: &dyn ResourceResolver,
    reference: &str,
    env: &str,
    zone: &str,
) -> Result<String> {
    let reference = ResourceReference::parse(reference)?;
    let content = resolver
        .resolve_by_name_version(env, zone, reference.name())
        .await
        .with_context(|| format!("Failed to resolve {} in {}/{}", reference, env, zone))?;
    Ok(content)
}

async fn run_detail(resolver: &dyn ResourceResolver, reference: &str) -> Result<String> {
    let reference = ResourceReference::parse(reference)?;
    let content = resolver
        .resolve_detail(reference.as_str())
        .await
        .with_context(|| format!("Failed to fetch {}", reference))?;
    Ok(content)
}

/// Bind `file` to a headless session, optionally insert a resource, and
/// return the final document text
async fn run_edit(
    settings: &Settings,
    resolver: Arc<dyn ResourceResolver>,
    file: &Path,
    env: &str,
    zone: &str,
    app: &str,
    insert: Option<&str>,
) -> Result<String> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read configuration file: {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("Not a file: {}", file.display()))?;

    let mut identity = ConfigurationIdentity::new(env, zone, app, file_name);
    if let Some(extension) = file.extension() {
        identity = identity.with_format(extension.to_string_lossy());
    }

    let store = Arc::new(InMemoryStore::new());
    let mut page = ConfigPage::new(store.clone());
    page.enter(Some(app), Some(env), &[zone.to_string()]).await?;
    page.publish_env(CurrentEnv {
        aid: 0,
        env: env.to_string(),
        app_name: app.to_string(),
        zone_code: zone.to_string(),
    })
    .await?;
    store
        .dispatch(Action::SetCurrentConfig(BoundConfiguration::new(
            identity, content,
        )))
        .await?;

    let factory = Arc::new(BufferSurfaceFactory::new());
    let mut host = SessionHost::new(
        store.clone(),
        factory.clone(),
        resolver,
        settings.editor.clone(),
    );
    host.sync_from_store().await?;

    if let Some(reference) = insert {
        let handle = factory
            .last_handle()
            .context("No editor surface was created")?;
        handle.request_insert_resource();
        host.pump().await?;

        match host
            .confirm_insertion(ResourceSelection::new(reference))
            .await
            .with_context(|| format!("Failed to insert {}", reference))?
        {
            Delivery::Delivered { bytes, .. } => {
                info!("Inserted {} bytes from {}", bytes, reference)
            }
            Delivery::NothingPending => bail!("Insertion request for {} was dropped", reference),
        }
    }

    let result = host.session().context("No live editor session")?.content()?;
    host.shutdown().await?;
    Ok(result)
}

/// Validate settings and print a summary
fn validate_config(args: &Args) -> Result<()> {
    println!("🔍 Validating settings\n");

    if let Some(path) = &args.config_file {
        println!("Settings file: {}", path.display());
    }

    let settings = args.load_settings()?;
    println!("✅ Settings are valid\n");

    println!("Lookup:");
    println!("  Base URL: {}", settings.lookup.base_url);
    println!("  Timeout: {}s", settings.lookup.timeout_secs);
    println!(
        "  Token: {}",
        if settings.lookup.token.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("\nEditor:");
    println!("  Default format: {}", settings.editor.default_format);
    println!("  Focus on reseed: {}", settings.editor.focus_on_reseed);

    Ok(())
}

async fn run(args: &Args, command: &CliCommand) -> Result<()> {
    let output = match command {
        CliCommand::Refs { file } => run_refs(file)?.join("\n"),
        CliCommand::Resolve {
            reference,
            env,
            zone,
        } => {
            let settings = args.load_settings()?;
            let resolver = args.resolver(&settings)?;
            run_resolve(resolver.as_ref(), reference, env, zone).await?
        }
        CliCommand::Detail { reference } => {
            let settings = args.load_settings()?;
            let resolver = args.resolver(&settings)?;
            run_detail(resolver.as_ref(), reference).await?
        }
        CliCommand::Edit {
            file,
            env,
            zone,
            app,
            insert,
        } => {
            let settings = args.load_settings()?;
            let resolver = args.resolver(&settings)?;
            run_edit(
                &settings,
                resolver,
                file,
                env,
                zone,
                app,
                insert.as_deref(),
            )
            .await?
        }
    };

    if output.is_empty() {
        return Ok(());
    }
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse()?;

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(args.verbose)
        .with_line_number(args.verbose)
        .with_writer(std::io::stderr)
        .init();

    if args.validate_config {
        if let Err(e) = validate_config(&args) {
            eprintln!("❌ Settings validation failed:\n{:#}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let Some(command) = &args.command else {
        build_cli().print_help()?;
        return Ok(());
    };

    if let Err(e) = run(&args, command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
