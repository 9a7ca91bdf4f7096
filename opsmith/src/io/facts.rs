//! Best-effort host facts for grounding engine suggestions.
//!
//! This is a diagnostic payload, not a stable contract: every field is
//! optional, detection failures degrade to `None`, and collection never
//! errors past this module. The compact JSON form is embedded in the
//! outbound payload's fenced facts block.

use std::collections::BTreeMap;
use std::env;

use serde::Serialize;
use sysinfo::System;
use tracing::warn;

/// Command-line tools probed for availability.
const PROBED_TOOLS: &[&str] = &["curl", "git", "docker", "kubectl", "helm", "systemctl"];

#[derive(Debug, Clone, Serialize, Default)]
pub struct OsFacts {
    pub family: String,
    pub name: Option<String>,
    pub version: Option<String>,
    pub kernel: Option<String>,
    pub arch: String,
}

/// Snapshot of the host environment.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SystemFacts {
    pub os: OsFacts,
    pub hostname: Option<String>,
    pub shell: Option<String>,
    /// Tool name -> found on PATH. BTreeMap keeps serialization stable.
    pub tools: BTreeMap<String, bool>,
}

impl SystemFacts {
    /// Compact JSON form; degrades to `{}` rather than failing.
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            warn!(%err, "failed to serialize system facts");
            "{}".to_string()
        })
    }
}

/// Collect the snapshot. Partial detection is fine; this never fails.
pub fn collect() -> SystemFacts {
    SystemFacts {
        os: OsFacts {
            family: env::consts::OS.to_string(),
            name: System::name(),
            version: System::os_version(),
            kernel: System::kernel_version(),
            arch: env::consts::ARCH.to_string(),
        },
        hostname: System::host_name(),
        shell: env::var("SHELL").ok(),
        tools: PROBED_TOOLS
            .iter()
            .map(|tool| (tool.to_string(), on_path(tool)))
            .collect(),
    }
}

/// True when `name` resolves to a file in any PATH entry.
fn on_path(name: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| dir.join(name).is_file())
}
