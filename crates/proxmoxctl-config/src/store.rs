//! Persisted config file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::connection::ConnectionConfig;
use crate::error::ConfigError;

/// Directory under the user config dir that holds our files.
pub const APP_DIR: &str = "proxmoxctl";
/// File name of the persisted connection record.
pub const CONFIG_FILE: &str = "config.toml";

/// Default location of the config file, `<config dir>/proxmoxctl/config.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] when the platform has no per-user
/// configuration directory.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

/// Values present in the file. Absent keys stay `None` so the resolver can
/// tell them apart from explicit values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FileLayer {
    pub server_name: Option<String>,
    pub server_url: Option<String>,
    pub api_token: Option<String>,
    pub tls_insecure: Option<bool>,
}

/// Read the file layer. A missing file yields `None`.
pub(crate) fn read(path: &Path) -> Result<Option<FileLayer>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file");
            return Ok(None);
        }
        Err(e) => return Err(ConfigError::io(path, e)),
    };

    let layer = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(Some(layer))
}

/// Persist `config` at `path`, replacing any previous file.
///
/// The record is serialized before the disk is touched. Missing parent
/// directories are created owner-only, and the contents go to a temporary
/// file in the same directory that is then renamed over `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Serialize`] if the record cannot be encoded, and
/// [`ConfigError::Io`] for filesystem failures. In both cases a previous file
/// at `path` is left as it was.
pub fn save(config: &ConnectionConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(config)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_private_dir(dir).map_err(|e| ConfigError::io(dir, e))?;

    // NamedTempFile is created 0600 on unix
    let mut tmp = tempfile::Builder::new()
        .prefix(".config")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| ConfigError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ConfigError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| ConfigError::io(path, e.error))?;

    debug!(path = %path.display(), "saved config file");
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    if dir.is_dir() {
        return Ok(());
    }
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}
