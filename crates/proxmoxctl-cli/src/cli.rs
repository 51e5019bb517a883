//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// proxmoxctl - manage a Proxmox VE cluster over its REST API.
#[derive(Parser, Debug, Clone)]
#[command(name = "proxmoxctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file to read and write.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        env = "PROXMOX_OUTPUT",
        default_value_t = Format::Table
    )]
    pub output: Format,

    /// Disable TLS certificate verification (not recommended).
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Guest kind addressed by snapshot and restore commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum GuestType {
    /// KVM virtual machine.
    #[default]
    Qemu,
    /// LXC container.
    Lxc,
}

impl GuestType {
    /// Path segment used by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Qemu => "qemu",
            Self::Lxc => "lxc",
        }
    }
}

impl std::fmt::Display for GuestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Cluster, node, resource and task status.
    Status {
        /// Node to query (defaults to the first cluster node).
        #[arg(long, global = true)]
        node: Option<String>,

        /// Status subcommand to execute.
        #[command(subcommand)]
        command: StatusCommands,
    },

    /// Virtual machine management.
    Vm {
        /// Node hosting the VM (defaults to the first cluster node).
        #[arg(long, global = true)]
        node: Option<String>,

        /// VM subcommand to execute.
        #[command(subcommand)]
        command: VmCommands,
    },

    /// LXC container management.
    Lxc {
        /// Node hosting the container (defaults to the first cluster node).
        #[arg(long, global = true)]
        node: Option<String>,

        /// Container subcommand to execute.
        #[command(subcommand)]
        command: LxcCommands,
    },

    /// Clone a VM or container.
    Clone {
        /// Node hosting the source guest (defaults to the first cluster node).
        #[arg(long, global = true)]
        node: Option<String>,

        /// Clone subcommand to execute.
        #[command(subcommand)]
        command: CloneCommands,
    },

    /// Guest snapshot management.
    Snapshot {
        /// Node hosting the guest (defaults to the first cluster node).
        #[arg(long, global = true)]
        node: Option<String>,

        /// Snapshot subcommand to execute.
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Backups and scheduled backup jobs.
    Backup {
        /// Node to run on (defaults to the first cluster node).
        #[arg(long, global = true)]
        node: Option<String>,

        /// Backup subcommand to execute.
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Storage pools and their content.
    Storage {
        /// Node for live usage (cluster configuration when omitted).
        #[arg(long, global = true)]
        node: Option<String>,

        /// Storage subcommand to execute.
        #[command(subcommand)]
        command: StorageCommands,
    },

    /// User accounts.
    User {
        /// User subcommand to execute.
        #[command(subcommand)]
        command: UserCommands,
    },

    /// User groups.
    Group {
        /// Group subcommand to execute.
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Connection settings.
    Config {
        /// Config subcommand to execute.
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Status subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum StatusCommands {
    /// Cluster quorum and node overview.
    Cluster,

    /// CPU, memory, swap and disk of one node.
    Node,

    /// All cluster resources grouped by type.
    Resources {
        /// Filter by type: vm, lxc, storage or node.
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
    },

    /// Recent tasks on a node.
    Tasks {
        /// Maximum number of tasks to show.
        #[arg(long, default_value_t = 25)]
        limit: u32,

        /// Show only failed tasks.
        #[arg(long)]
        errors: bool,
    },
}

/// VM subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum VmCommands {
    /// List VMs on a node.
    List,

    /// Create a VM.
    Create(VmCreateArgs),

    /// Change name, memory or cores of a VM.
    Modify {
        /// VM ID.
        vmid: u32,

        /// New VM name.
        #[arg(long)]
        name: Option<String>,

        /// New memory in MB.
        #[arg(long)]
        memory: Option<u64>,

        /// New CPU core count.
        #[arg(long)]
        cores: Option<u32>,
    },

    /// Delete a VM.
    Delete {
        /// VM ID.
        vmid: u32,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Start a VM.
    Start {
        /// VM ID.
        vmid: u32,
    },

    /// Stop a VM immediately.
    Stop {
        /// VM ID.
        vmid: u32,
    },

    /// Shut a VM down through the guest OS.
    Shutdown {
        /// VM ID.
        vmid: u32,
    },

    /// Reboot a VM.
    Reboot {
        /// VM ID.
        vmid: u32,
    },

    /// Current status of a VM.
    Status {
        /// VM ID.
        vmid: u32,
    },
}

/// Arguments for `vm create`.
#[derive(Args, Debug, Clone)]
pub struct VmCreateArgs {
    /// VM ID.
    #[arg(long)]
    pub vmid: u32,

    /// VM name.
    #[arg(long)]
    pub name: String,

    /// Memory in MB.
    #[arg(long, default_value_t = 2048)]
    pub memory: u64,

    /// Number of CPU cores.
    #[arg(long, default_value_t = 2)]
    pub cores: u32,

    /// Disk spec (e.g. local-lvm:32).
    #[arg(long, default_value = "local-lvm:32")]
    pub disk: String,

    /// ISO to attach as CD-ROM (e.g. local:iso/debian.iso).
    #[arg(long)]
    pub iso: Option<String>,
}

/// Container subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum LxcCommands {
    /// List containers on a node.
    List,

    /// Create a container from a template.
    Create(LxcCreateArgs),

    /// Delete a container.
    Delete {
        /// Container ID.
        vmid: u32,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Start a container.
    Start {
        /// Container ID.
        vmid: u32,
    },

    /// Stop a container immediately.
    Stop {
        /// Container ID.
        vmid: u32,
    },

    /// Shut a container down cleanly.
    Shutdown {
        /// Container ID.
        vmid: u32,
    },

    /// Reboot a container.
    Reboot {
        /// Container ID.
        vmid: u32,
    },

    /// Current status of a container.
    Status {
        /// Container ID.
        vmid: u32,
    },
}

/// Arguments for `lxc create`.
#[derive(Args, Debug, Clone)]
pub struct LxcCreateArgs {
    /// Container ID.
    #[arg(long)]
    pub vmid: u32,

    /// Container hostname.
    #[arg(long)]
    pub hostname: String,

    /// OS template (e.g. local:vztmpl/debian-12.tar.zst).
    #[arg(long)]
    pub template: String,

    /// Memory in MB.
    #[arg(long, default_value_t = 512)]
    pub memory: u64,

    /// CPU cores.
    #[arg(long, default_value_t = 1)]
    pub cores: u32,

    /// Root filesystem spec (e.g. local-lvm:8).
    #[arg(long, default_value = "local-lvm:8")]
    pub disk: String,

    /// Root password.
    #[arg(long)]
    pub password: Option<String>,
}

/// Clone subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum CloneCommands {
    /// Clone a VM.
    Vm(CloneVmArgs),

    /// Clone a container.
    Lxc(CloneLxcArgs),
}

/// Arguments for `clone vm`.
#[derive(Args, Debug, Clone)]
pub struct CloneVmArgs {
    /// Source VM ID.
    pub vmid: u32,

    /// ID of the new VM.
    #[arg(long)]
    pub newid: u32,

    /// Name of the new VM.
    #[arg(long)]
    pub name: Option<String>,

    /// Clone from this snapshot instead of the current state.
    #[arg(long)]
    pub snapname: Option<String>,

    /// Resource pool for the clone.
    #[arg(long)]
    pub pool: Option<String>,

    /// Target storage for the cloned disks.
    #[arg(long)]
    pub storage: Option<String>,

    /// Linked clone sharing the base disk (source must be a template).
    #[arg(long)]
    pub linked: bool,

    /// Force a full independent clone.
    #[arg(long)]
    pub full: bool,
}

/// Arguments for `clone lxc`.
#[derive(Args, Debug, Clone)]
pub struct CloneLxcArgs {
    /// Source container ID.
    pub vmid: u32,

    /// ID of the new container.
    #[arg(long)]
    pub newid: u32,

    /// Hostname of the new container.
    #[arg(long)]
    pub hostname: Option<String>,

    /// Clone from this snapshot instead of the current state.
    #[arg(long)]
    pub snapname: Option<String>,

    /// Resource pool for the clone.
    #[arg(long)]
    pub pool: Option<String>,

    /// Target storage for the cloned root filesystem.
    #[arg(long)]
    pub storage: Option<String>,
}

/// Snapshot subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SnapshotCommands {
    /// List snapshots of a guest.
    List {
        /// Guest ID.
        vmid: u32,

        /// Guest type.
        #[arg(long = "type", value_enum, default_value_t = GuestType::Qemu)]
        guest: GuestType,
    },

    /// Take a snapshot.
    Create {
        /// Guest ID.
        vmid: u32,

        /// Guest type.
        #[arg(long = "type", value_enum, default_value_t = GuestType::Qemu)]
        guest: GuestType,

        /// Snapshot name (no spaces).
        #[arg(long)]
        name: String,

        /// Description.
        #[arg(long)]
        desc: Option<String>,

        /// Include RAM state (VMs only).
        #[arg(long)]
        vmstate: bool,
    },

    /// Delete a snapshot.
    Delete {
        /// Guest ID.
        vmid: u32,

        /// Guest type.
        #[arg(long = "type", value_enum, default_value_t = GuestType::Qemu)]
        guest: GuestType,

        /// Snapshot name.
        #[arg(long)]
        name: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Roll a guest back to a snapshot.
    Rollback {
        /// Guest ID.
        vmid: u32,

        /// Guest type.
        #[arg(long = "type", value_enum, default_value_t = GuestType::Qemu)]
        guest: GuestType,

        /// Snapshot name.
        #[arg(long)]
        name: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Show the guest configuration stored in a snapshot.
    Show {
        /// Guest ID.
        vmid: u32,

        /// Guest type.
        #[arg(long = "type", value_enum, default_value_t = GuestType::Qemu)]
        guest: GuestType,

        /// Snapshot name.
        #[arg(long)]
        name: String,
    },
}

/// Backup subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum BackupCommands {
    /// Back up guests now.
    Create(BackupCreateArgs),

    /// List backups on a storage.
    List {
        /// Storage to list backups from.
        #[arg(long)]
        storage: String,

        /// Filter by guest ID.
        #[arg(long)]
        vmid: Option<u32>,
    },

    /// Show one backup.
    Show {
        /// Storage containing the backup.
        #[arg(long)]
        storage: String,

        /// Backup file name.
        #[arg(long)]
        file: String,
    },

    /// Delete a backup.
    Delete {
        /// Storage containing the backup.
        #[arg(long)]
        storage: String,

        /// Backup file name.
        #[arg(long)]
        file: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Restore a backup into a guest.
    Restore(BackupRestoreArgs),

    /// Scheduled backup jobs.
    Jobs {
        /// Jobs subcommand to execute.
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Arguments for `backup create`.
#[derive(Args, Debug, Clone)]
pub struct BackupCreateArgs {
    /// Comma-separated guest IDs, or `all`.
    pub vmids: String,

    /// Target storage for the backup file.
    #[arg(long)]
    pub storage: String,

    /// Backup mode: snapshot, suspend or stop.
    #[arg(long, default_value = "snapshot")]
    pub mode: String,

    /// Compression: zstd, lzo, gzip or 0.
    #[arg(long, default_value = "zstd")]
    pub compress: String,

    /// Notification email address(es).
    #[arg(long)]
    pub mailto: Option<String>,

    /// Notes template stored with the backup.
    #[arg(long)]
    pub notes: Option<String>,

    /// Remove backups older than N days (0 keeps all).
    #[arg(long, default_value_t = 0)]
    pub remove_older: u32,
}

/// Arguments for `backup restore`.
#[derive(Args, Debug, Clone)]
pub struct BackupRestoreArgs {
    /// Storage containing the backup.
    #[arg(long)]
    pub storage: String,

    /// Backup file name.
    #[arg(long)]
    pub file: String,

    /// Guest ID to restore into.
    #[arg(long)]
    pub vmid: u32,

    /// Guest type to restore.
    #[arg(long = "type", value_enum, default_value_t = GuestType::Qemu)]
    pub guest: GuestType,

    /// Storage for restored disks (defaults to the original).
    #[arg(long)]
    pub target_storage: Option<String>,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub force: bool,

    /// Start the guest after the restore.
    #[arg(long)]
    pub start: bool,
}

/// Backup job subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum JobCommands {
    /// List scheduled jobs.
    List,

    /// Show one job.
    Show {
        /// Job ID.
        id: String,
    },

    /// Schedule a new job.
    Create(JobCreateArgs),

    /// Change a job.
    Modify(JobModifyArgs),

    /// Delete a job.
    Delete {
        /// Job ID.
        id: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for `backup jobs create`.
#[derive(Args, Debug, Clone)]
pub struct JobCreateArgs {
    /// Comma-separated guest IDs.
    #[arg(long)]
    pub vmids: Option<String>,

    /// Back up all guests.
    #[arg(long)]
    pub all: bool,

    /// Destination storage.
    #[arg(long)]
    pub storage: String,

    /// Cron-style schedule.
    #[arg(long, default_value = "0 2 * * *")]
    pub schedule: String,

    /// Backup mode: snapshot, suspend or stop.
    #[arg(long, default_value = "snapshot")]
    pub mode: String,

    /// Compression: zstd, lzo, gzip or 0.
    #[arg(long, default_value = "zstd")]
    pub compress: String,

    /// Notification email address.
    #[arg(long)]
    pub mailto: Option<String>,

    /// Backups to keep per guest (0 is unlimited).
    #[arg(long, default_value_t = 0)]
    pub max_files: u32,

    /// Notes template for created backups.
    #[arg(long)]
    pub notes: Option<String>,

    /// Enable the job immediately.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub enabled: bool,
}

/// Arguments for `backup jobs modify`.
#[derive(Args, Debug, Clone)]
pub struct JobModifyArgs {
    /// Job ID.
    pub id: String,

    /// New comma-separated guest IDs.
    #[arg(long)]
    pub vmids: Option<String>,

    /// New destination storage.
    #[arg(long)]
    pub storage: Option<String>,

    /// New cron-style schedule.
    #[arg(long)]
    pub schedule: Option<String>,

    /// New backup mode.
    #[arg(long)]
    pub mode: Option<String>,

    /// New compression.
    #[arg(long)]
    pub compress: Option<String>,

    /// New notification email.
    #[arg(long)]
    pub mailto: Option<String>,

    /// New backup count per guest.
    #[arg(long)]
    pub max_files: Option<u32>,

    /// Enable or disable the job.
    #[arg(long)]
    pub enabled: Option<bool>,
}

/// Storage subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum StorageCommands {
    /// List storage pools.
    List {
        /// Only enabled/active pools.
        #[arg(long)]
        active: bool,

        /// Filter by content type (e.g. backup, iso, images).
        #[arg(long)]
        content: Option<String>,
    },

    /// Show one storage pool.
    Show {
        /// Storage ID.
        storage: String,
    },

    /// List volumes on a storage.
    Content {
        /// Storage ID.
        storage: String,

        /// Filter by content type: backup, iso, vztmpl, images, rootdir, snippets.
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        /// Filter by guest ID.
        #[arg(long)]
        vmid: Option<u32>,
    },
}

/// User subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommands {
    /// List users.
    List {
        /// Only enabled accounts.
        #[arg(long)]
        enabled: bool,
    },

    /// Show one user.
    Show {
        /// User ID (USER@REALM).
        userid: String,
    },

    /// Create a user.
    Create(UserCreateArgs),

    /// Change a user.
    Modify(UserModifyArgs),

    /// Delete a user.
    Delete {
        /// User ID (USER@REALM).
        userid: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Set a user's password.
    Passwd {
        /// User ID (USER@REALM).
        userid: String,

        /// New password (prompted when omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// Groups a user belongs to.
    Groups {
        /// User ID (USER@REALM).
        userid: String,
    },
}

/// Arguments for `user create`.
#[derive(Args, Debug, Clone)]
pub struct UserCreateArgs {
    /// User ID (USER@REALM).
    pub userid: String,

    /// Initial password (for @pam/@pve realms).
    #[arg(long)]
    pub password: Option<String>,

    /// First name.
    #[arg(long)]
    pub firstname: Option<String>,

    /// Last name.
    #[arg(long)]
    pub lastname: Option<String>,

    /// Email address.
    #[arg(long)]
    pub email: Option<String>,

    /// Comment.
    #[arg(long)]
    pub comment: Option<String>,

    /// Comma-separated group IDs.
    #[arg(long)]
    pub groups: Option<String>,

    /// Expiry as a Unix timestamp (0 is never).
    #[arg(long, default_value_t = 0)]
    pub expire: i64,

    /// Whether the account is enabled.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub enabled: bool,
}

/// Arguments for `user modify`.
#[derive(Args, Debug, Clone)]
pub struct UserModifyArgs {
    /// User ID (USER@REALM).
    pub userid: String,

    /// New first name.
    #[arg(long)]
    pub firstname: Option<String>,

    /// New last name.
    #[arg(long)]
    pub lastname: Option<String>,

    /// New email address.
    #[arg(long)]
    pub email: Option<String>,

    /// New comment.
    #[arg(long)]
    pub comment: Option<String>,

    /// Comma-separated group IDs (replaces current groups).
    #[arg(long)]
    pub groups: Option<String>,

    /// New expiry as a Unix timestamp (0 is never).
    #[arg(long)]
    pub expire: Option<i64>,

    /// Enable or disable the account.
    #[arg(long)]
    pub enabled: Option<bool>,
}

/// Group subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum GroupCommands {
    /// List groups.
    List,

    /// Show one group.
    Show {
        /// Group ID.
        groupid: String,
    },

    /// Create a group.
    Create {
        /// Group ID.
        groupid: String,

        /// Description.
        #[arg(long)]
        comment: Option<String>,
    },

    /// Change a group's description.
    Modify {
        /// Group ID.
        groupid: String,

        /// New description.
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a group.
    Delete {
        /// Group ID.
        groupid: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Save connection settings, prompting for anything not given.
    Set {
        /// Friendly server label.
        #[arg(long)]
        server_name: Option<String>,

        /// Server URL (e.g. https://192.168.1.10:8006).
        #[arg(long)]
        server_url: Option<String>,

        /// API token (USER@REALM!TOKENID=SECRET).
        #[arg(long)]
        api_token: Option<String>,

        /// Skip TLS verification for this server.
        #[arg(long)]
        tls_insecure: bool,
    },

    /// Show the resolved settings with the token masked.
    Show,
}
