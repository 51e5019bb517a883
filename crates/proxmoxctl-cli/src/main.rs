//! proxmoxctl binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use proxmoxctl_cli::cli::{Cli, Commands};
use proxmoxctl_cli::client::ApiClient;
use proxmoxctl_cli::commands::{
    BackupCommand, CloneCommand, ConfigCommand, GroupCommand, LxcCommand, SnapshotCommand,
    StatusCommand, StorageCommand, UserCommand, VmCommand,
};
use proxmoxctl_cli::output::OutputFormat;
use proxmoxctl_config::{ConfigResolver, Overrides};

fn main() -> ExitCode {
    // Logs go to stderr; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), proxmoxctl_cli::CliError> {
    let format = OutputFormat::new(cli.output);
    let resolver = ConfigResolver::from_process(&Overrides {
        config_path: cli.config.clone(),
        tls_insecure: cli.insecure,
    });
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Status { node, command } => {
            let client = connect(&resolver)?;
            let cmd = StatusCommand::new(&client, node.as_deref());
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Vm { node, command } => {
            let client = connect(&resolver)?;
            let cmd = VmCommand::new(&client, node.as_deref());
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Lxc { node, command } => {
            let client = connect(&resolver)?;
            let cmd = LxcCommand::new(&client, node.as_deref());
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Clone { node, command } => {
            let client = connect(&resolver)?;
            let cmd = CloneCommand::new(&client, node.as_deref());
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Snapshot { node, command } => {
            let client = connect(&resolver)?;
            let cmd = SnapshotCommand::new(&client, node.as_deref());
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Backup { node, command } => {
            let client = connect(&resolver)?;
            let cmd = BackupCommand::new(&client, node.as_deref());
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Storage { node, command } => {
            let client = connect(&resolver)?;
            let cmd = StorageCommand::new(&client, node.as_deref());
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::User { command } => {
            let client = connect(&resolver)?;
            let cmd = UserCommand::new(&client);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Group { command } => {
            let client = connect(&resolver)?;
            let cmd = GroupCommand::new(&client);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Config { command } => {
            let cmd = ConfigCommand::new(&resolver);
            cmd.execute(&mut stdout, &format, &command)?;
        }
    }

    Ok(())
}

/// Load complete connection settings and build a client.
fn connect(resolver: &ConfigResolver) -> Result<ApiClient, proxmoxctl_cli::CliError> {
    let config = resolver.load()?;
    Ok(ApiClient::new(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxmoxctl_cli::CliError;
    use proxmoxctl_cli::cli::{
        BackupCommands, Format, GuestType, JobCommands, SnapshotCommands, StatusCommands,
        VmCommands,
    };
    use proxmoxctl_config::ConfigError;

    #[test]
    fn connect_requires_complete_settings() {
        let resolver = ConfigResolver::new(Some("/nonexistent/proxmoxctl/config.toml".into()))
            .with_env([("PROXMOX_SERVER_URL", "https://pve.local:8006")]);
        match connect(&resolver) {
            Err(CliError::Config(ConfigError::ConfigurationMissing { keys })) => {
                assert_eq!(keys, vec!["api_token"]);
            }
            Err(other) => panic!("expected ConfigurationMissing, got {other:?}"),
            Ok(_) => panic!("expected ConfigurationMissing, got a client"),
        }
    }

    #[test]
    fn connect_with_complete_settings() {
        let resolver = ConfigResolver::new(None).with_env([
            ("PROXMOX_SERVER_URL", "https://pve.local:8006/"),
            ("PROXMOX_API_TOKEN", "root@pam!cli=secret"),
        ]);
        let client = connect(&resolver).expect("client");
        assert_eq!(client.base_url(), "https://pve.local:8006");
    }

    #[test]
    fn cli_parses_vm_list() {
        let cli = Cli::parse_from(["proxmoxctl", "vm", "list"]);
        match cli.command {
            Commands::Vm { node, command } => {
                assert_eq!(node, None);
                assert!(matches!(command, VmCommands::List));
            }
            _ => panic!("expected vm command"),
        }
    }

    #[test]
    fn node_flag_after_subcommand() {
        let cli = Cli::parse_from(["proxmoxctl", "vm", "start", "100", "--node", "pve2"]);
        match cli.command {
            Commands::Vm { node, command } => {
                assert_eq!(node.as_deref(), Some("pve2"));
                assert!(matches!(command, VmCommands::Start { vmid: 100 }));
            }
            _ => panic!("expected vm command"),
        }
    }

    #[test]
    fn cli_respects_output_flag() {
        let cli = Cli::parse_from(["proxmoxctl", "-o", "json", "status", "cluster"]);
        assert_eq!(cli.output, Format::Json);
        assert!(matches!(
            cli.command,
            Commands::Status { command: StatusCommands::Cluster, .. }
        ));
    }

    #[test]
    fn tasks_default_limit() {
        let cli = Cli::parse_from(["proxmoxctl", "status", "tasks"]);
        match cli.command {
            Commands::Status { command: StatusCommands::Tasks { limit, errors }, .. } => {
                assert_eq!(limit, 25);
                assert!(!errors);
            }
            _ => panic!("expected status tasks"),
        }
    }

    #[test]
    fn snapshot_type_flag() {
        let cli = Cli::parse_from([
            "proxmoxctl", "snapshot", "list", "200", "--type", "lxc",
        ]);
        match cli.command {
            Commands::Snapshot { command: SnapshotCommands::List { vmid, guest }, .. } => {
                assert_eq!(vmid, 200);
                assert_eq!(guest, GuestType::Lxc);
            }
            _ => panic!("expected snapshot list"),
        }
    }

    #[test]
    fn backup_job_enabled_accepts_false() {
        let cli = Cli::parse_from([
            "proxmoxctl", "backup", "jobs", "create", "--all", "--storage", "pbs",
            "--enabled", "false",
        ]);
        match cli.command {
            Commands::Backup {
                command: BackupCommands::Jobs { command: JobCommands::Create(args) },
                ..
            } => {
                assert!(args.all);
                assert!(!args.enabled);
                assert_eq!(args.schedule, "0 2 * * *");
            }
            _ => panic!("expected backup jobs create"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "proxmoxctl", "user", "list", "--insecure", "--config", "/tmp/p.toml",
        ]);
        assert!(cli.insecure);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/p.toml")));
    }
}
