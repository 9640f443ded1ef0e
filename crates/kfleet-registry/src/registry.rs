//! JSON-file device registry.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use kfleet_settings::FleetSettings;
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::device::Device;
use crate::errors::{RegistryError, Result};

/// Default fleet file name inside the data directory.
pub const FLEET_FILE: &str = "fleet.json";

/// Devices stored as a JSON array in one file.
///
/// Every change rewrites the whole file atomically. Read-modify-write
/// cycles are serialized within the process.
pub struct Registry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Registry {
    /// Open the registry in `data_dir`, creating the directory and an empty
    /// fleet file as needed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_file(data_dir, FLEET_FILE)
    }

    /// Open the registry configured in `settings`.
    pub fn from_settings(settings: &FleetSettings) -> Result<Self> {
        Self::open_file(&settings.data_dir, &settings.fleet_file)
    }

    /// Open `file_name` inside `data_dir`.
    pub fn open_file(data_dir: impl AsRef<Path>, file_name: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let registry = Self {
            path: dir.join(file_name),
            lock: Mutex::new(()),
        };
        if !registry.path.exists() {
            registry.write_all(&[])?;
            debug!(path = %registry.path.display(), "created fleet file");
        }
        Ok(registry)
    }

    /// Path of the fleet file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All devices, in file order.
    pub fn list(&self) -> Result<Vec<Device>> {
        let _guard = self.lock.lock();
        self.read_all()
    }

    /// Device with `id`, if registered.
    pub fn get(&self, id: &str) -> Result<Option<Device>> {
        Ok(self.list()?.into_iter().find(|d| d.id == id))
    }

    /// Insert `device`, replacing an existing entry with the same id in
    /// place.
    pub fn upsert(&self, device: Device) -> Result<()> {
        let _guard = self.lock.lock();
        let mut devices = self.read_all()?;
        match devices.iter_mut().find(|d| d.id == device.id) {
            Some(slot) => *slot = device,
            None => devices.push(device),
        }
        self.write_all(&devices)
    }

    /// Remove the device with `id`. Returns whether it was registered.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock();
        let mut devices = self.read_all()?;
        let before = devices.len();
        devices.retain(|d| d.id != id);
        if devices.len() == before {
            return Ok(false);
        }
        self.write_all(&devices)?;
        Ok(true)
    }

    fn read_all(&self) -> Result<Vec<Device>> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RegistryError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, devices: &[Device]) -> Result<()> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let io_err = |source| RegistryError::Io {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_string_pretty(devices).map_err(|source| RegistryError::Json {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        let _ = tmp.persist(&self.path).map_err(|source| RegistryError::Persist {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), devices = devices.len(), "fleet file written");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
