/// Nodeboot - bootstrap user-data for cluster nodes
///
/// Renders the first-boot shell scripts that configure control plane and
/// worker machines and join them to the cluster.
use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand};
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nodeboot::cluster::Machine;
use nodeboot::config::BootstrapConfig;

#[derive(Parser)]
#[command(name = "nodeboot")]
#[command(about = "Render bootstrap user-data for cluster machines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "cluster.yaml")]
    config: PathBuf,

    /// Output directory for rendered scripts
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate example configuration file
    Init,

    /// Render the bootstrap script for a single machine
    Render {
        /// Machine name
        machine: String,

        /// Machine namespace, required when the name is ambiguous
        #[arg(long)]
        namespace: Option<String>,

        /// Join token, overrides config and BOOTSTRAP_TOKEN
        #[arg(long)]
        token: Option<String>,

        /// File appended to the script, overrides the configured extra_userdata
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Base64-encode the script
        #[arg(long)]
        base64: bool,

        /// Print the script instead of writing it to the output directory
        #[arg(long)]
        stdout: bool,
    },

    /// Render bootstrap scripts for every configured machine
    RenderAll {
        /// Base64-encode the scripts
        #[arg(long)]
        base64: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("nodeboot={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Init => init_config(&cli).await,
        Commands::Render {
            ref machine,
            ref namespace,
            ref token,
            ref metadata,
            base64,
            stdout,
        } => {
            let options = RenderOptions {
                machine,
                namespace: namespace.as_deref(),
                token: token.as_deref(),
                metadata: metadata.as_deref(),
                base64,
                stdout,
            };
            render_machine(&cli, options).await
        }
        Commands::RenderAll { base64 } => render_all(&cli, base64).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Options for rendering a single machine
struct RenderOptions<'a> {
    machine: &'a str,
    namespace: Option<&'a str>,
    token: Option<&'a str>,
    metadata: Option<&'a Path>,
    base64: bool,
    stdout: bool,
}

/// Initialize example configuration file
async fn init_config(cli: &Cli) -> Result<()> {
    if cli.config.exists() {
        anyhow::bail!(
            "Configuration file already exists: {}",
            cli.config.display()
        );
    }

    let example_config = BootstrapConfig::example();
    let yaml = serde_yaml::to_string(&example_config)?;

    tokio::fs::write(&cli.config, yaml)
        .await
        .context("Failed to write configuration file")?;

    info!("Example configuration created: {}", cli.config.display());
    info!("");
    info!("Next steps:");
    info!("  1. Edit the cluster network, API endpoints and machines");
    info!("  2. Set the join token:");
    info!("     export BOOTSTRAP_TOKEN=your-token-here");
    info!("  3. Render the scripts:");
    info!("     nodeboot render-all");

    Ok(())
}

/// Render the bootstrap script for one machine
async fn render_machine(cli: &Cli, options: RenderOptions<'_>) -> Result<()> {
    let config = BootstrapConfig::from_file(&cli.config).context("Failed to load configuration")?;

    let entry = config.find_machine(options.machine, options.namespace)?;
    let token = config.resolve_token(options.token)?;
    let metadata = match options.metadata {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read metadata file {}", path.display()))?,
        None => entry.extra_userdata.clone(),
    };

    let renderer = config.renderer()?;
    let script = renderer
        .render(&config.cluster, &entry.machine, &token, &metadata)
        .with_context(|| {
            format!(
                "Failed to render user-data for {}",
                entry.machine.qualified_name()
            )
        })?;
    let script = encode(script, options.base64);

    if options.stdout {
        print!("{}", script);
        return Ok(());
    }

    let path = script_path(&cli.output, &entry.machine);
    write_script(&path, &script).await?;

    info!(
        "✓ Rendered {} user-data for {}: {}",
        entry.machine.role(),
        entry.machine.qualified_name(),
        path.display()
    );

    Ok(())
}

/// Render bootstrap scripts for every configured machine
async fn render_all(cli: &Cli, base64: bool) -> Result<()> {
    info!("Rendering user-data for all machines...");

    let config = BootstrapConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let token = config.get_token()?;
    let renderer = config.renderer()?;

    info!("Cluster name: {}", config.cluster.name());

    let mut rendered = Vec::with_capacity(config.machines.len());
    for entry in &config.machines {
        let script = renderer
            .render(&config.cluster, &entry.machine, &token, &entry.extra_userdata)
            .with_context(|| {
                format!(
                    "Failed to render user-data for {}",
                    entry.machine.qualified_name()
                )
            })?;
        rendered.push((
            &entry.machine,
            script_path(&cli.output, &entry.machine),
            encode(script, base64),
        ));
    }

    try_join_all(
        rendered
            .iter()
            .map(|(_, path, script)| write_script(path, script)),
    )
    .await?;

    info!("✓ User-data rendered successfully!");
    info!("");
    info!("Scripts:");
    for (machine, path, _) in &rendered {
        info!(
            "  {} ({}): {}",
            machine.qualified_name(),
            machine.role(),
            path.display()
        );
    }

    Ok(())
}

fn encode(script: String, as_base64: bool) -> String {
    if as_base64 {
        base64::engine::general_purpose::STANDARD.encode(script)
    } else {
        script
    }
}

/// Output file for a machine: "<namespace>-<name>.sh"
fn script_path(output: &Path, machine: &Machine) -> PathBuf {
    let file_name = if machine.metadata.namespace.is_empty() {
        format!("{}.sh", machine.metadata.name)
    } else {
        format!(
            "{}-{}.sh",
            machine.metadata.namespace, machine.metadata.name
        )
    };
    output.join(file_name)
}

async fn write_script(path: &Path, script: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create output directory")?;
    }

    tokio::fs::write(path, script)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_for(dir: &Path, args: &[&str]) -> Cli {
        let config = dir.join("cluster.yaml");
        let output = dir.join("output");
        let mut argv = vec![
            "nodeboot".to_string(),
            "--config".to_string(),
            config.display().to_string(),
            "--output".to_string(),
            output.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        Cli::parse_from(argv)
    }

    fn write_config(dir: &Path) {
        let mut config = BootstrapConfig::example();
        config.token = Some("abcdef.0123456789abcdef".to_string());
        config.machines[1].extra_userdata = "echo joined\n".to_string();
        std::fs::write(
            dir.join("cluster.yaml"),
            serde_yaml::to_string(&config).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("#!/bin/bash\n".to_string(), false), "#!/bin/bash\n");
        assert_eq!(encode("#!/bin/bash\n".to_string(), true), "IyEvYmluL2Jhc2gK");
    }

    #[test]
    fn test_script_path() {
        let mut machine = BootstrapConfig::example().machines[0].machine.clone();
        assert_eq!(
            script_path(Path::new("out"), &machine),
            PathBuf::from("out/default-control-plane-0.sh")
        );

        machine.metadata.namespace = String::new();
        assert_eq!(
            script_path(Path::new("out"), &machine),
            PathBuf::from("out/control-plane-0.sh")
        );
    }

    #[test]
    fn test_write_script_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("node.sh");

        tokio_test::block_on(write_script(&path, "#!/bin/bash\n")).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#!/bin/bash\n");
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(dir.path(), &["init"]);

        init_config(&cli).await.unwrap();
        let config = BootstrapConfig::from_file(&cli.config).unwrap();
        assert_eq!(config.machines.len(), 2);

        assert!(init_config(&cli).await.is_err());
    }

    #[tokio::test]
    async fn test_render_all() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path());
        let cli = cli_for(dir.path(), &["render-all"]);

        render_all(&cli, false).await.unwrap();

        let output = dir.path().join("output");
        let cp = std::fs::read_to_string(output.join("default-control-plane-0.sh")).unwrap();
        assert!(cp.contains("CONTROL_PLANE_VERSION=1.30.0\n"));
        assert!(cp.contains("TOKEN=abcdef.0123456789abcdef\n"));

        let worker = std::fs::read_to_string(output.join("default-worker-0.sh")).unwrap();
        assert!(worker.contains("MASTER=10.0.1.10:443\n"));
        assert!(worker.ends_with("SERVICE_CIDR=10.96.0.0/12\necho joined\n"));
    }

    #[tokio::test]
    async fn test_render_machine_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path());
        let metadata = dir.path().join("extra.sh");
        std::fs::write(&metadata, "extra: true\n").unwrap();
        let cli = cli_for(dir.path(), &["render", "worker-0"]);

        let options = RenderOptions {
            machine: "worker-0",
            namespace: None,
            token: Some("override.token"),
            metadata: Some(&metadata),
            base64: false,
            stdout: false,
        };
        render_machine(&cli, options).await.unwrap();

        let script =
            std::fs::read_to_string(dir.path().join("output").join("default-worker-0.sh")).unwrap();
        assert!(script.contains("TOKEN=override.token\n"));
        assert!(script.ends_with("SERVICE_CIDR=10.96.0.0/12\nextra: true\n"));
    }

    #[tokio::test]
    async fn test_render_machine_rejects_empty_token() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path());
        let cli = cli_for(dir.path(), &["render", "worker-0", "--token", ""]);

        let options = RenderOptions {
            machine: "worker-0",
            namespace: None,
            token: Some(""),
            metadata: None,
            base64: false,
            stdout: false,
        };
        let err = render_machine(&cli, options).await.unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
        assert!(!dir.path().join("output").exists());
    }

    #[tokio::test]
    async fn test_render_worker_without_endpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BootstrapConfig::example();
        config.token = Some("t".to_string());
        config.cluster.status.api_endpoints.clear();
        std::fs::write(
            dir.path().join("cluster.yaml"),
            serde_yaml::to_string(&config).unwrap(),
        )
        .unwrap();
        let cli = cli_for(dir.path(), &["render-all"]);

        let err = render_all(&cli, false).await.unwrap_err();
        assert!(format!("{:#}", err).contains("no API endpoint"));
        assert!(!dir.path().join("output").exists());
    }
}
