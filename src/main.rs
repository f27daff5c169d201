mod commands;
pub mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use podwatch::{k8s, logging};

use commands::Scope;
use commands::list::ListArgs;
use commands::watch::WatchArgs;

#[derive(Parser)]
#[command(
    name = "podwatch",
    about = "Watch pod lifecycle events through a shared informer",
    author,
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Path to the kubeconfig file.
    /// Inferred (in-cluster, $KUBECONFIG, ~/.kube/config) when omitted.
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one
    #[arg(long, global = true)]
    context: Option<String>,
    /// Namespace to watch (all namespaces when omitted)
    #[arg(short, long, global = true)]
    namespace: Option<String>,
    /// Label selector, e.g. -l app=web
    #[arg(short = 'l', long, global = true)]
    selector: Option<String>,
    /// Field selector, e.g. --field-selector spec.nodeName=node-1
    #[arg(long, global = true)]
    field_selector: Option<String>,
    /// Disable colored output
    #[arg(long, global = true, default_value_t = false)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print pod add/update/delete events until interrupted (default)
    Watch(WatchArgs),
    /// Sync the pod cache once and print it as a table
    List(ListArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();
    if cli.no_color {
        colored::control::set_override(false);
    }

    // 1. Initialize Client ONCE
    let pb = utils::create_spinner("Initializing Kubernetes client...");
    let client = k8s::connect(cli.kubeconfig, cli.context).await;
    pb.finish_and_clear();
    let client = client?;

    let scope = Scope {
        namespace: cli.namespace,
        label_selector: cli.selector,
        field_selector: cli.field_selector,
    };

    match cli.command.unwrap_or_else(|| Commands::Watch(WatchArgs::default())) {
        Commands::Watch(args) => commands::watch::run(client, scope, args, !cli.no_color).await?,
        Commands::List(args) => commands::list::run(client, scope, args).await?,
    }
    Ok(())
}
