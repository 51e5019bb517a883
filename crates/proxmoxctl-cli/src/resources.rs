//! Typed records for the API payloads the CLI renders.
//!
//! The API is loose about scalar types (numbers sometimes arrive as strings,
//! booleans as 0/1), so fields go through the lenient decoders in [`de`].
//! Absent and null fields fall back to defaults; a present field of an
//! unrelated type is still a decode error.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Decode a raw `data` value into a typed record.
///
/// # Errors
///
/// [`ApiError::Decode`] when the value does not fit `T`.
pub fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(ApiError::Decode)
}

/// Decode a list payload. A null `data` is an empty list.
///
/// # Errors
///
/// [`ApiError::Decode`] when an element does not fit `T`.
pub fn decode_list<T: DeserializeOwned>(data: Value) -> Result<Vec<T>, ApiError> {
    decode::<Option<Vec<T>>>(data).map(Option::unwrap_or_default)
}

/// Lenient field decoders.
pub mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn mismatch<E: Error>(expected: &str, found: &Value) -> E {
        E::custom(format!("expected {expected}, found {found}"))
    }

    fn parse_f64<E: Error>(s: &str) -> Result<f64, E> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(0.0);
        }
        s.parse()
            .map_err(|_| E::custom(format!("expected a number, found \"{s}\"")))
    }

    /// Float from a number or numeric string. Null is 0.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(0.0),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom("number out of range")),
            Value::String(s) => parse_f64(&s),
            other => Err(mismatch("a number", &other)),
        }
    }

    /// Non-negative integer from a number or numeric string. Null is 0.
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(0),
            Value::Number(n) => Ok(n
                .as_u64()
                .unwrap_or_else(|| n.as_f64().map_or(0, |f| f.max(0.0) as u64))),
            Value::String(s) => parse_f64(&s).map(|f| f.max(0.0) as u64),
            other => Err(mismatch("a count", &other)),
        }
    }

    /// Optional guest id. Null and 0 are `None`.
    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        count(d).map(|n| (n > 0).then_some(n))
    }

    /// Optional epoch seconds. Null and values `<= 0` are `None`.
    pub fn epoch<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let secs = number(d)?;
        Ok((secs > 0.0).then_some(secs as i64))
    }

    /// Boolean from a bool, 0/1 or `"0"`/`"1"`/`"true"`/`"false"`. Null is false.
    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|f| (f - 1.0).abs() < f64::EPSILON)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "" | "0" | "false" | "no" => Ok(false),
                _ => Err(D::Error::custom(format!("expected a boolean, found \"{s}\""))),
            },
            other => Err(mismatch("a boolean", &other)),
        }
    }

    /// Text from any scalar. Null is empty.
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(mismatch("text", &other)),
        }
    }

    /// List from a comma-separated string or an array of scalars.
    pub fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let split = |s: &str| {
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        };
        match Value::deserialize(d)? {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(split(&s)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    other => Err(mismatch("a list item", &other)),
                })
                .collect(),
            other => Err(mismatch("a list", &other)),
        }
    }

    /// Floats from an array of numbers or numeric strings.
    pub fn numbers<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Number(n) => n
                        .as_f64()
                        .ok_or_else(|| D::Error::custom("number out of range")),
                    Value::String(s) => parse_f64(&s),
                    other => Err(mismatch("a number", &other)),
                })
                .collect(),
            other => Err(mismatch("a list of numbers", &other)),
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Entry of `GET /cluster/status`: either the cluster itself or a node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterStatusEntry {
    /// `cluster` or `node`.
    #[serde(rename = "type", deserialize_with = "de::text")]
    pub kind: String,
    /// Cluster or node name.
    #[serde(deserialize_with = "de::text")]
    pub name: String,
    /// Whether the cluster has quorum (cluster entry).
    #[serde(deserialize_with = "de::flag")]
    pub quorate: bool,
    /// Node count (cluster entry).
    #[serde(deserialize_with = "de::count")]
    pub nodes: u64,
    /// Config version (cluster entry).
    #[serde(deserialize_with = "de::text")]
    pub version: String,
    /// Whether the node is up (node entry).
    #[serde(deserialize_with = "de::flag")]
    pub online: bool,
    /// CPU load as a ratio (node entry).
    #[serde(deserialize_with = "de::number")]
    pub cpu: f64,
    /// Memory in use, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub mem: u64,
    /// Memory installed, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub maxmem: u64,
    /// Seconds since boot.
    #[serde(deserialize_with = "de::count")]
    pub uptime: u64,
}

impl ClusterStatusEntry {
    /// `online` or `offline`.
    pub const fn node_status(&self) -> &'static str {
        if self.online { "online" } else { "offline" }
    }
}

/// Used/free/total triple in node status.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Bytes in use.
    #[serde(deserialize_with = "de::count")]
    pub used: u64,
    /// Bytes free.
    #[serde(deserialize_with = "de::count")]
    pub free: u64,
    /// Bytes in total.
    #[serde(deserialize_with = "de::count")]
    pub total: u64,
}

/// CPU description in node status.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CpuInfo {
    /// CPU model string.
    #[serde(deserialize_with = "de::text")]
    pub model: String,
    /// Populated sockets.
    #[serde(deserialize_with = "de::count")]
    pub sockets: u64,
    /// Cores per socket.
    #[serde(deserialize_with = "de::count")]
    pub cores: u64,
    /// Logical CPUs.
    #[serde(deserialize_with = "de::count")]
    pub cpus: u64,
}

/// `GET /nodes/{node}/status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeStatus {
    /// Manager version string, e.g. `pve-manager/8.1.4/...`.
    #[serde(deserialize_with = "de::text")]
    pub pveversion: String,
    /// Running kernel.
    #[serde(deserialize_with = "de::text")]
    pub kversion: String,
    /// Seconds since boot.
    #[serde(deserialize_with = "de::count")]
    pub uptime: u64,
    /// CPU load as a ratio.
    #[serde(deserialize_with = "de::number")]
    pub cpu: f64,
    /// 1, 5 and 15 minute load averages.
    #[serde(deserialize_with = "de::numbers")]
    pub loadavg: Vec<f64>,
    /// CPU description.
    pub cpuinfo: CpuInfo,
    /// RAM usage.
    pub memory: Usage,
    /// Swap usage.
    pub swap: Usage,
    /// Root filesystem usage.
    pub rootfs: Usage,
}

/// `GET /nodes/{node}/version`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeVersion {
    /// Proxmox VE version.
    #[serde(deserialize_with = "de::text")]
    pub version: String,
    /// Release series.
    #[serde(deserialize_with = "de::text")]
    pub release: String,
}

/// Entry of `GET /cluster/resources`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Resource {
    /// Resource id, e.g. `qemu/100` or `storage/pve1/local`.
    #[serde(deserialize_with = "de::text")]
    pub id: String,
    /// `node`, `qemu`, `lxc`, `storage` or `sdn`.
    #[serde(rename = "type", deserialize_with = "de::text")]
    pub kind: String,
    /// Guest id, 0 for non-guests.
    #[serde(deserialize_with = "de::count")]
    pub vmid: u64,
    /// Guest name.
    #[serde(deserialize_with = "de::text")]
    pub name: String,
    /// Node hosting the resource.
    #[serde(deserialize_with = "de::text")]
    pub node: String,
    /// Reported status.
    #[serde(deserialize_with = "de::text")]
    pub status: String,
    /// Storage id (storage entries).
    #[serde(deserialize_with = "de::text")]
    pub storage: String,
    /// CPU load as a ratio.
    #[serde(deserialize_with = "de::number")]
    pub cpu: f64,
    /// Memory in use, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub mem: u64,
    /// Memory limit, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub maxmem: u64,
    /// Disk in use, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub disk: u64,
    /// Disk size, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub maxdisk: u64,
    /// Seconds since start.
    #[serde(deserialize_with = "de::count")]
    pub uptime: u64,
}

/// Entry of `GET /nodes/{node}/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Task {
    /// Unique task id.
    #[serde(deserialize_with = "de::text")]
    pub upid: String,
    /// Task type, e.g. `qmstart` or `vzdump`.
    #[serde(rename = "type", deserialize_with = "de::text")]
    pub kind: String,
    /// User that started the task.
    #[serde(deserialize_with = "de::text")]
    pub user: String,
    /// Exit status; empty while running.
    #[serde(deserialize_with = "de::text")]
    pub status: String,
    /// Start time, epoch seconds.
    #[serde(deserialize_with = "de::epoch")]
    pub starttime: Option<i64>,
    /// End time, epoch seconds.
    #[serde(deserialize_with = "de::epoch")]
    pub endtime: Option<i64>,
}

impl Task {
    /// Reported status; tasks without one are `running` until they end.
    pub fn display_status(&self) -> &str {
        if !self.status.is_empty() {
            &self.status
        } else if self.endtime.is_none() {
            "running"
        } else {
            "unknown"
        }
    }
}

/// Entry of `GET /nodes/{node}/qemu` or `/lxc`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GuestSummary {
    /// Guest id.
    #[serde(deserialize_with = "de::count")]
    pub vmid: u64,
    /// Guest name.
    #[serde(deserialize_with = "de::text")]
    pub name: String,
    /// `running` or `stopped`.
    #[serde(deserialize_with = "de::text")]
    pub status: String,
    /// Memory limit, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub maxmem: u64,
    /// Virtual CPUs.
    #[serde(deserialize_with = "de::count")]
    pub cpus: u64,
    /// Seconds since start; 0 when stopped.
    #[serde(deserialize_with = "de::count")]
    pub uptime: u64,
}

/// `GET /nodes/{node}/{qemu|lxc}/{vmid}/status/current`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GuestStatus {
    /// Guest id.
    #[serde(deserialize_with = "de::count")]
    pub vmid: u64,
    /// Guest name.
    #[serde(deserialize_with = "de::text")]
    pub name: String,
    /// `running` or `stopped`.
    #[serde(deserialize_with = "de::text")]
    pub status: String,
    /// CPU load as a ratio.
    #[serde(deserialize_with = "de::number")]
    pub cpu: f64,
    /// Virtual CPUs.
    #[serde(deserialize_with = "de::count")]
    pub cpus: u64,
    /// Memory in use, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub mem: u64,
    /// Memory limit, in bytes.
    #[serde(deserialize_with = "de::count")]
    pub maxmem: u64,
    /// Seconds since start.
    #[serde(deserialize_with = "de::count")]
    pub uptime: u64,
}

/// Entry of `GET .../snapshot`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Snapshot name.
    #[serde(deserialize_with = "de::text")]
    pub name: String,
    /// Free-form description.
    #[serde(deserialize_with = "de::text")]
    pub description: String,
    /// Whether RAM state was saved.
    #[serde(deserialize_with = "de::flag")]
    pub vmstate: bool,
    /// Creation time, epoch seconds.
    #[serde(deserialize_with = "de::epoch")]
    pub snaptime: Option<i64>,
}

/// Volume in a storage content listing, backups included.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Volume {
    /// Volume id, `storage:path`.
    #[serde(deserialize_with = "de::text")]
    pub volid: String,
    /// Content type, e.g. `backup` or `iso`.
    #[serde(deserialize_with = "de::text")]
    pub content: String,
    /// Volume format, e.g. `vma.zst` or `qcow2`.
    #[serde(deserialize_with = "de::text")]
    pub format: String,
    /// Size in bytes.
    #[serde(deserialize_with = "de::count")]
    pub size: u64,
    /// Owning guest, if any.
    #[serde(deserialize_with = "de::id")]
    pub vmid: Option<u64>,
    /// Creation time, epoch seconds.
    #[serde(deserialize_with = "de::epoch")]
    pub ctime: Option<i64>,
    /// Backup notes.
    #[serde(deserialize_with = "de::text")]
    pub notes: String,
    /// Protected from pruning.
    #[serde(deserialize_with = "de::flag")]
    pub protected: bool,
    /// Key fingerprint when the backup is encrypted.
    #[serde(deserialize_with = "de::text")]
    pub encrypted: String,
}

/// Entry of `GET /cluster/backup`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupJob {
    /// Job id.
    #[serde(deserialize_with = "de::text")]
    pub id: String,
    /// Comma-separated guest ids.
    #[serde(deserialize_with = "de::text")]
    pub vmid: String,
    /// Whether the job covers every guest.
    #[serde(deserialize_with = "de::flag")]
    pub all: bool,
    /// Target storage.
    #[serde(deserialize_with = "de::text")]
    pub storage: String,
    /// Calendar event, e.g. `0 2 * * *`.
    #[serde(deserialize_with = "de::text")]
    pub schedule: String,
    /// `snapshot`, `suspend` or `stop`.
    #[serde(deserialize_with = "de::text")]
    pub mode: String,
    /// Compression, e.g. `zstd`.
    #[serde(deserialize_with = "de::text")]
    pub compress: String,
    /// Whether the job runs.
    #[serde(default = "default_true", deserialize_with = "de::flag")]
    pub enabled: bool,
    /// Notification address.
    #[serde(deserialize_with = "de::text")]
    pub mailto: String,
    /// Backups kept per guest.
    #[serde(deserialize_with = "de::text")]
    pub maxfiles: String,
    /// Template for backup notes.
    #[serde(rename = "notes-template", deserialize_with = "de::text")]
    pub notes_template: String,
}

impl Default for BackupJob {
    fn default() -> Self {
        Self {
            id: String::new(),
            vmid: String::new(),
            all: false,
            storage: String::new(),
            schedule: String::new(),
            mode: String::new(),
            compress: String::new(),
            enabled: true,
            mailto: String::new(),
            maxfiles: String::new(),
            notes_template: String::new(),
        }
    }
}

impl BackupJob {
    /// Guests covered by the job.
    pub fn guests(&self) -> &str {
        if self.all { "all" } else { &self.vmid }
    }
}

/// Storage definition from `GET /storage`, or live status from
/// `GET /nodes/{node}/storage[/{storage}/status]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// Storage id.
    #[serde(deserialize_with = "de::text")]
    pub storage: String,
    /// Storage type, e.g. `dir`, `lvmthin` or `nfs`.
    #[serde(rename = "type", deserialize_with = "de::text")]
    pub kind: String,
    /// Comma-separated content types.
    #[serde(deserialize_with = "de::text")]
    pub content: String,
    /// Whether all nodes see the same storage.
    #[serde(deserialize_with = "de::flag")]
    pub shared: bool,
    /// Disabled in the cluster config.
    #[serde(deserialize_with = "de::flag")]
    pub disable: bool,
    /// Whether the storage is usable on the node.
    #[serde(deserialize_with = "de::flag")]
    pub active: bool,
    /// Filesystem path (directory storage).
    #[serde(deserialize_with = "de::text")]
    pub path: String,
    /// Remote server (network storage).
    #[serde(deserialize_with = "de::text")]
    pub server: String,
    /// NFS export.
    #[serde(deserialize_with = "de::text")]
    pub export: String,
    /// Pool name (ZFS, Ceph).
    #[serde(deserialize_with = "de::text")]
    pub pool: String,
    /// Proxmox Backup Server datastore.
    #[serde(deserialize_with = "de::text")]
    pub datastore: String,
    /// Bytes in use.
    #[serde(deserialize_with = "de::count")]
    pub used: u64,
    /// Bytes available.
    #[serde(deserialize_with = "de::count")]
    pub avail: u64,
    /// Bytes in total.
    #[serde(deserialize_with = "de::count")]
    pub total: u64,
}

impl Storage {
    /// Where the storage lives: its path, or the server for network storage.
    pub fn location(&self) -> &str {
        if self.path.is_empty() {
            &self.server
        } else {
            &self.path
        }
    }

    /// `active` or `inactive` for node-level listings.
    pub const fn state(&self) -> &'static str {
        if self.active { "active" } else { "inactive" }
    }
}

/// Entry of `GET /access/users` or `GET /access/users/{userid}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct User {
    /// `user@realm`.
    #[serde(deserialize_with = "de::text")]
    pub userid: String,
    /// Given name.
    #[serde(deserialize_with = "de::text")]
    pub firstname: String,
    /// Family name.
    #[serde(deserialize_with = "de::text")]
    pub lastname: String,
    /// Email address.
    #[serde(deserialize_with = "de::text")]
    pub email: String,
    /// Free-form comment.
    #[serde(deserialize_with = "de::text")]
    pub comment: String,
    /// Whether the account may log in.
    #[serde(default = "default_true", deserialize_with = "de::flag")]
    pub enable: bool,
    /// Expiry, epoch seconds; `None` never expires.
    #[serde(deserialize_with = "de::epoch")]
    pub expire: Option<i64>,
    /// Group memberships.
    #[serde(deserialize_with = "de::list")]
    pub groups: Vec<String>,
    /// Second-factor keys.
    #[serde(deserialize_with = "de::text")]
    pub keys: String,
}

impl Default for User {
    fn default() -> Self {
        Self {
            userid: String::new(),
            firstname: String::new(),
            lastname: String::new(),
            email: String::new(),
            comment: String::new(),
            enable: true,
            expire: None,
            groups: Vec::new(),
            keys: String::new(),
        }
    }
}

/// Entry of `GET /access/groups`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Group {
    /// Group id.
    #[serde(deserialize_with = "de::text")]
    pub groupid: String,
    /// Free-form comment.
    #[serde(deserialize_with = "de::text")]
    pub comment: String,
    /// Member user ids.
    #[serde(deserialize_with = "de::list")]
    pub users: Vec<String>,
}
