//! CLI structure and command definitions.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ks_core::log::{LogFormat, LogSettings};
use ks_types::{LogLevel, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage Kubernetes manifests as parameterised components", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// App directory (default: the app containing the working directory)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log format: pretty, compact or json
    #[arg(long, global = true, default_value = "pretty", value_parser = parse_log_format)]
    pub log_format: LogFormat,
}

fn parse_log_format(raw: &str) -> std::result::Result<LogFormat, String> {
    match raw {
        "pretty" => Ok(LogFormat::Pretty),
        "compact" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("unknown log format '{}'", other)),
    }
}

fn parse_output(raw: &str) -> std::result::Result<OutputFormat, String> {
    raw.parse().map_err(|e: ks_types::KsError| e.to_string())
}

/// Where a parameter edit lands.
#[derive(Args, Debug, Clone)]
pub struct ParamTarget {
    /// Component namespace
    #[arg(long = "ns", default_value = "/")]
    pub namespace: String,

    /// Edit the environment's overrides instead of the namespace params
    #[arg(long)]
    pub env: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new app
    Init {
        /// App name
        name: String,

        /// App directory (default: ./<name>)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Import manifests as components
    Import {
        /// Manifest file or directory
        #[arg(short, long)]
        file: PathBuf,

        /// Target namespace
        #[arg(long = "ns", default_value = "/")]
        namespace: String,

        /// Store manifests verbatim instead of converting them
        #[arg(long)]
        raw: bool,
    },

    /// Manage component parameters
    #[command(subcommand)]
    Param(ParamCommand),

    /// Manage components
    #[command(subcommand)]
    Component(ComponentCommand),

    /// Manage component namespaces
    #[command(subcommand)]
    Ns(NsCommand),

    /// Manage environments
    #[command(subcommand)]
    Env(EnvCommand),

    /// Render components to objects
    Show {
        /// Environment whose overrides apply
        env: Option<String>,

        /// Limit to these components
        #[arg(short, long = "component")]
        components: Vec<String>,

        /// Output format: yaml or json
        #[arg(short, long, default_value = "yaml", value_parser = parse_output)]
        output: OutputFormat,
    },

    /// Apply components to an environment's cluster
    Apply {
        /// Environment name
        env: String,

        /// Limit to these components
        #[arg(short, long = "component")]
        components: Vec<String>,

        /// Create objects instead of applying them
        #[arg(long)]
        create: bool,

        /// Validate without changing the cluster
        #[arg(long)]
        dry_run: bool,

        /// Label objects with this tag and prune tagged objects no longer rendered
        #[arg(long)]
        gc_tag: Option<String>,

        /// Do not prune
        #[arg(long)]
        skip_gc: bool,

        /// kubeconfig context
        #[arg(long)]
        context: Option<String>,
    },

    /// Delete components from an environment's cluster
    Delete {
        /// Environment name
        env: String,

        /// Limit to these components
        #[arg(short, long = "component")]
        components: Vec<String>,

        /// Seconds objects get to terminate
        #[arg(long)]
        grace_period: Option<i64>,

        /// kubeconfig context
        #[arg(long)]
        context: Option<String>,
    },

    /// Show version information
    Version {
        /// Also show build and tool details
        #[arg(long)]
        detailed: bool,
    },
}

#[derive(Subcommand)]
pub enum ParamCommand {
    /// Set a component parameter
    Set {
        /// Component name
        component: String,
        /// Dotted parameter path
        path: String,
        /// Value; JSON literals keep their type, anything else is a string
        #[arg(allow_hyphen_values = true)]
        value: String,
        #[command(flatten)]
        target: ParamTarget,
        /// Component instance
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// Remove a component parameter
    Delete {
        /// Component name
        component: String,
        /// Dotted parameter path
        path: String,
        #[command(flatten)]
        target: ParamTarget,
        /// Component instance
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// List parameters of one or every component
    List {
        /// Component name
        component: Option<String>,
        #[command(flatten)]
        target: ParamTarget,
    },

    /// Set a parameter shared by every component
    #[command(name = "set-global")]
    SetGlobal {
        /// Dotted parameter path
        path: String,
        /// Value; JSON literals keep their type, anything else is a string
        #[arg(allow_hyphen_values = true)]
        value: String,
        #[command(flatten)]
        target: ParamTarget,
    },

    /// Remove a shared parameter
    #[command(name = "delete-global")]
    DeleteGlobal {
        /// Dotted parameter path
        path: String,
        #[command(flatten)]
        target: ParamTarget,
    },
}

#[derive(Subcommand)]
pub enum ComponentCommand {
    /// List components
    List {
        /// Only this namespace
        #[arg(long = "ns")]
        namespace: Option<String>,
    },

    /// Remove a component and its parameters
    Rm {
        /// Component name
        name: String,
        /// Component namespace
        #[arg(long = "ns", default_value = "/")]
        namespace: String,
    },
}

#[derive(Subcommand)]
pub enum NsCommand {
    /// Create a namespace
    Create {
        /// Namespace name, `/`-separated for nesting
        name: String,
    },

    /// List namespaces
    List,
}

#[derive(Subcommand)]
pub enum EnvCommand {
    /// Declare an environment
    Add {
        /// Environment name
        name: String,
        /// API server URL
        #[arg(long)]
        server: Option<String>,
        /// Kubernetes namespace
        #[arg(long)]
        namespace: Option<String>,
        /// kubeconfig context
        #[arg(long)]
        context: Option<String>,
    },

    /// List environments
    List,

    /// Show an environment
    Describe {
        /// Environment name
        name: String,
    },

    /// Replace the namespaces an environment renders
    Targets {
        /// Environment name
        name: String,
        /// Namespaces; none means every namespace
        #[arg(long = "ns", alias = "component")]
        namespaces: Vec<String>,
    },
}

impl Cli {
    /// Logging settings from the verbosity flags, falling back to `KS_LOG`.
    pub fn log_settings(&self) -> LogSettings {
        let level = if self.debug {
            LogLevel::Trace
        } else if self.verbose {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Error
        } else {
            std::env::var("KS_LOG")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(LogLevel::Info)
        };
        LogSettings {
            level,
            format: self.log_format,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        use crate::commands::*;

        let dir = self.dir.as_deref();
        match &self.command {
            Commands::Init { name, path } => init::execute(name, path.as_deref()).await,
            Commands::Import { file, namespace, raw } => import::execute(dir, file, namespace, *raw).await,
            Commands::Param(command) => param::execute(dir, command).await,
            Commands::Component(command) => component::execute(dir, command).await,
            Commands::Ns(command) => ns::execute(dir, command).await,
            Commands::Env(command) => env::execute(dir, command).await,
            Commands::Show { env, components, output } => {
                show::execute(dir, env.as_deref(), components, *output).await
            }
            Commands::Apply {
                env,
                components,
                create,
                dry_run,
                gc_tag,
                skip_gc,
                context,
            } => {
                let options = ks_types::ApplyOptions {
                    create: *create,
                    dry_run: *dry_run,
                    gc_tag: gc_tag.clone(),
                    skip_gc: *skip_gc,
                    client: ks_types::ClientConfig {
                        context: context.clone(),
                        ..Default::default()
                    },
                };
                apply::execute(dir, env, components, options).await
            }
            Commands::Delete {
                env,
                components,
                grace_period,
                context,
            } => {
                let options = ks_types::DeleteOptions {
                    grace_period: *grace_period,
                    client: ks_types::ClientConfig {
                        context: context.clone(),
                        ..Default::default()
                    },
                };
                delete::execute(dir, env, components, options).await
            }
            Commands::Version { detailed } => version::execute(dir, *detailed).await,
        }
    }
}
