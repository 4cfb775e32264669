//! Device identity: a stable fingerprint and the record registered for it.
//!
//! An [`IdentityProvider`] yields an opaque fingerprint for the running
//! installation. [`resolve_device`] registers the fingerprint the first time
//! it is seen and refreshes `last_seen` on every later call, so the device id
//! stays fixed for the life of the store.

use sha2::{Digest, Sha256};
use sysinfo::System;
use uuid::Uuid;

use crate::{error::AeroBaseError, store::ReferenceStore};

/// A registered installation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Device {
    /// Random v4 UUID assigned at registration.
    pub id: String,
    /// Fingerprint reported by the identity provider.
    pub fingerprint: String,
    /// Free-form hardware description, JSON when available.
    pub hardware_info: Option<String>,
    /// Registration time in unix seconds.
    pub created_at: i64,
    /// Most recent lookup in unix seconds.
    pub last_seen: i64,
}

/// Source of the installation fingerprint.
pub trait IdentityProvider: Send + Sync {
    /// Stable fingerprint for this installation.
    ///
    /// # Errors
    /// Returns [`AeroBaseError::DeviceIdentity`] when no fingerprint can be
    /// derived.
    fn fingerprint(&self) -> Result<String, AeroBaseError>;

    /// Optional hardware description stored alongside a new device.
    fn hardware_info(&self) -> Option<String> {
        None
    }
}

/// Host properties reported by `sysinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HostFacts {
    /// Operating system name.
    pub system_name: Option<String>,
    /// Operating system version.
    pub os_version: Option<String>,
    /// Kernel version.
    pub kernel_version: Option<String>,
    /// Network host name.
    pub host_name: Option<String>,
    /// Logical CPU count.
    pub cpu_count: usize,
    /// Brand string of the first CPU.
    pub cpu_brand: Option<String>,
    /// Installed memory in MiB.
    pub total_memory_mb: u64,
    /// Target architecture.
    pub architecture: String,
    /// Target OS family.
    pub os_family: String,
}

impl HostFacts {
    /// Query the running host.
    pub fn collect() -> Self {
        let system = System::new_all();
        Self {
            system_name: System::name(),
            os_version: System::os_version(),
            kernel_version: System::kernel_version(),
            host_name: System::host_name(),
            cpu_count: system.cpus().len(),
            cpu_brand: system.cpus().first().map(|cpu| cpu.brand().to_owned()),
            total_memory_mb: system.total_memory() / 1024 / 1024,
            architecture: std::env::consts::ARCH.to_owned(),
            os_family: std::env::consts::FAMILY.to_owned(),
        }
    }

    /// Hex SHA-256 over every fact.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            &self.system_name,
            &self.os_version,
            &self.kernel_version,
            &self.host_name,
            &self.cpu_brand,
        ] {
            hasher.update(field.as_deref().unwrap_or_default().as_bytes());
            hasher.update([0_u8]);
        }
        hasher.update(self.cpu_count.to_le_bytes());
        hasher.update(self.total_memory_mb.to_le_bytes());
        hasher.update(self.architecture.as_bytes());
        hasher.update([0_u8]);
        hasher.update(self.os_family.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Fingerprint of the running host.
///
/// Hashes the platform machine id from `machine-uid` with SHA-256. When the
/// platform has none, the [`HostFacts`] digest is used instead.
#[derive(Debug, Clone)]
pub struct HostIdentityProvider {
    use_machine_id: bool,
}

impl Default for HostIdentityProvider {
    fn default() -> Self {
        Self {
            use_machine_id: true,
        }
    }
}

impl HostIdentityProvider {
    /// Provider that always fingerprints [`HostFacts`], ignoring the
    /// machine id.
    pub const fn host_facts_only() -> Self {
        Self {
            use_machine_id: false,
        }
    }

    fn machine_id(&self) -> Option<String> {
        if !self.use_machine_id {
            return None;
        }
        match machine_uid::get() {
            Ok(id) if !id.trim().is_empty() => Some(id.trim().to_owned()),
            Ok(_) => None,
            Err(err) => {
                log::debug!("machine id unavailable: {err}");
                None
            }
        }
    }
}

impl IdentityProvider for HostIdentityProvider {
    fn fingerprint(&self) -> Result<String, AeroBaseError> {
        if let Some(machine_id) = self.machine_id() {
            return Ok(format!("{:x}", Sha256::digest(machine_id.as_bytes())));
        }
        log::debug!("fingerprinting host facts");
        Ok(HostFacts::collect().digest())
    }

    #[cfg(feature = "serde")]
    fn hardware_info(&self) -> Option<String> {
        serde_json::to_string(&HostFacts::collect()).ok()
    }
}

/// Provider returning a fixed fingerprint, for hosts that supply their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentityProvider {
    fingerprint: String,
}

impl StaticIdentityProvider {
    /// Wrap a host-supplied fingerprint.
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn fingerprint(&self) -> Result<String, AeroBaseError> {
        if self.fingerprint.trim().is_empty() {
            return Err(AeroBaseError::DeviceIdentity {
                reason: "fingerprint is empty".into(),
            });
        }
        Ok(self.fingerprint.clone())
    }
}

/// Current time in unix seconds.
pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Return the device registered for the provider's fingerprint, creating it
/// on first use, and stamp `last_seen` with `now`.
pub fn resolve_device(
    store: &dyn ReferenceStore,
    provider: &dyn IdentityProvider,
    now: i64,
) -> Result<Device, AeroBaseError> {
    let fingerprint = provider.fingerprint()?;

    if let Some(mut device) = store.device_by_fingerprint(&fingerprint)? {
        store.touch_device(&device.id, now)?;
        device.last_seen = now;
        return Ok(device);
    }

    let device = Device {
        id: Uuid::new_v4().to_string(),
        fingerprint,
        hardware_info: provider.hardware_info(),
        created_at: now,
        last_seen: now,
    };
    store.insert_device(&device)?;
    log::info!("registered device {}", device.id);
    Ok(device)
}
