use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use plugscan::plugins::{builtin, ArchiveScanner, PluginProfile};
use plugscan::ProfileConfig;

#[derive(Parser)]
#[command(name = "plugscan")]
#[command(about = "Discover and instantiate plugin types packaged in archives", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ProfileArgs {
    /// Plugin root directory (overrides config and PLUGSCAN_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List archives under the root and the type names they declare
    Scan {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Reload the profile and list cataloged types
    List {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resolve a type by qualified or short name
    Resolve {
        name: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Construct a type, passing each argument as a JSON value
    Make {
        name: String,
        /// Constructor arguments, e.g. '"text"' 42 null
        args: Vec<String>,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Show version information
    Version,
}

fn load_config(args: &ProfileArgs) -> anyhow::Result<ProfileConfig> {
    let mut config = match &args.config {
        Some(path) => ProfileConfig::load(path)?,
        None => ProfileConfig::default(),
    }
    .apply_env_overrides();
    if let Some(root) = &args.root {
        config.root_dir = root.clone();
    }
    Ok(config)
}

fn open_profile(args: &ProfileArgs) -> anyhow::Result<PluginProfile> {
    let config = load_config(args)?;
    let profile = PluginProfile::from_config(config, Arc::new(builtin::catalog()))?;
    Ok(profile)
}

fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Some(Commands::Version) | None => {
            println!("plugscan {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Scan { profile }) => {
            let config = load_config(&profile)?;
            config.validate()?;
            let scanner = ArchiveScanner::new(&config);
            for archive in scanner.discover_archives(&config.root_dir) {
                println!("{}", archive.display());
                for name in scanner.list_type_names(&archive) {
                    println!("  {}", name);
                }
            }
        }
        Some(Commands::List { profile, json }) => {
            let profile = open_profile(&profile)?;
            let mut types = profile.all_types();
            types.sort_by(|a, b| a.qualified_name().cmp(b.qualified_name()));

            if json {
                let listing: Vec<Value> = types
                    .iter()
                    .map(|t| {
                        json!({
                            "name": t.qualified_name(),
                            "short_name": t.short_name(),
                            "archive": t.origin().display().to_string(),
                            "constructors": t
                                .constructors()
                                .iter()
                                .map(|c| c.params().to_vec())
                                .collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for t in &types {
                    println!("{}\t{}", t.qualified_name(), t.origin().display());
                }
            }
        }
        Some(Commands::Resolve { name, profile }) => {
            let profile = open_profile(&profile)?;
            let found = profile.by_name(&name)?;
            println!("{} ({})", found.qualified_name(), found.origin().display());
            for ctor in found.constructors() {
                let params: Vec<String> = ctor.params().iter().map(|p| p.to_string()).collect();
                println!("  new({})", params.join(", "));
            }
        }
        Some(Commands::Make {
            name,
            args,
            profile,
        }) => {
            let profile = open_profile(&profile)?;
            let values: Vec<Value> = args.iter().map(|a| parse_arg(a)).collect();
            let object = profile
                .make_object_with(&name, &values)
                .with_context(|| format!("Failed to construct {}", name))?;

            if let Some(text) = object.downcast_ref::<String>() {
                println!("{:?}", text);
            } else if let Some(counter) = object.downcast_ref::<builtin::Counter>() {
                println!("Counter({})", counter.value());
            } else if let Some(flag) = object.downcast_ref::<bool>() {
                println!("{}", flag);
            } else {
                println!("constructed {}", name);
            }
        }
    }

    Ok(())
}
