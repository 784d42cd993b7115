//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the whole [`NodeConfig`] as one postcard blob
//! under `rfidgate::nodecfg`.
//!
//! - Config validation: every field is range-checked before persistence
//!   and again after loading.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - The simulation backend keeps blobs in a map (dev/test only).

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::NodeConfig;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

const CONFIG_NAMESPACE: &str = "rfidgate";
const CONFIG_KEY: &str = "nodecfg";

const MAX_BLOB_SIZE: usize = 2048;

pub struct NvsAdapter {
    #[cfg(target_os = "espidf")]
    nvs: core::cell::RefCell<EspNvs<NvsDefault>>,
    #[cfg(not(target_os = "espidf"))]
    store: core::cell::RefCell<HashMap<String, Vec<u8>>>,
}

#[cfg(target_os = "espidf")]
impl NvsAdapter {
    /// Open the config namespace on the default NVS partition.  The
    /// partition handle is shared with the Wi-Fi driver.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
        let nvs = EspNvs::new(partition, CONFIG_NAMESPACE, true).map_err(|e| {
            warn!("NvsAdapter: cannot open namespace '{}': {}", CONFIG_NAMESPACE, e);
            ConfigError::IoError
        })?;
        info!("NvsAdapter: ESP-IDF NVS namespace '{}' open", CONFIG_NAMESPACE);
        Ok(Self {
            nvs: core::cell::RefCell::new(nvs),
        })
    }

    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        let mut buf = vec![0u8; MAX_BLOB_SIZE];
        let nvs = self.nvs.borrow();
        match nvs.get_blob(CONFIG_KEY, &mut buf) {
            Ok(Some(bytes)) => Ok(bytes.to_vec()),
            Ok(None) => Err(ConfigError::NotFound),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.nvs
            .borrow_mut()
            .set_blob(CONFIG_KEY, bytes)
            .map_err(|e| {
                warn!("NvsAdapter: NVS write error {}", e);
                ConfigError::IoError
            })
    }

    /// Drop the stored config; the next boot uses the bundled defaults.
    pub fn erase(&self) -> Result<(), ConfigError> {
        self.nvs
            .borrow_mut()
            .remove(CONFIG_KEY)
            .map(|_| ())
            .map_err(|_| ConfigError::IoError)
    }
}

#[cfg(not(target_os = "espidf"))]
impl NvsAdapter {
    pub fn new() -> Result<Self, ConfigError> {
        info!("NvsAdapter: simulation backend");
        Ok(Self {
            store: core::cell::RefCell::new(HashMap::new()),
        })
    }

    fn composite_key() -> String {
        format!("{}::{}", CONFIG_NAMESPACE, CONFIG_KEY)
    }

    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        self.store
            .borrow()
            .get(&Self::composite_key())
            .cloned()
            .ok_or(ConfigError::NotFound)
    }

    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(), bytes.to_vec());
        Ok(())
    }

    /// Drop the stored config; the next boot uses the bundled defaults.
    pub fn erase(&self) -> Result<(), ConfigError> {
        self.store.borrow_mut().remove(&Self::composite_key());
        Ok(())
    }

    /// Simulation: overwrite the raw blob (corruption tests).
    pub fn write_raw(&self, bytes: &[u8]) {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(), bytes.to_vec());
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<NodeConfig, ConfigError> {
        let bytes = self.read_blob()?;
        let cfg: NodeConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &NodeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::ValidationFailed("config exceeds NVS blob size"));
        }
        self.write_blob(&bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
