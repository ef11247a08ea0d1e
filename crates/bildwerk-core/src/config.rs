// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Number of background worker contexts in the conversion pool.
    pub worker_count: usize,
    /// Per-job timeout in seconds. `None` disables the timeout, reproducing
    /// the original behaviour where a stuck worker hangs its job forever.
    pub job_timeout_secs: Option<u64>,
    /// Encoder quality (1-100) applied to lossy formats when a job does not
    /// specify one.
    pub default_quality: u8,
    /// Longest side of generated preview thumbnails, in pixels.
    pub thumbnail_max_dim: u32,
    /// Fixed encoder quality for preview thumbnails.
    pub thumbnail_quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            job_timeout_secs: Some(60),
            default_quality: 90,
            thumbnail_max_dim: 200,
            thumbnail_quality: 70,
        }
    }
}

const CONFIG_FILE: &str = "config.json";

impl AppConfig {
    /// Load the config from `config.json` in the given directory, falling
    /// back to defaults when the file is missing or unreadable.
    pub fn load(data_dir: &std::path::Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    /// Persist the config as pretty-printed JSON.
    pub fn persist(&self, data_dir: &std::path::Path) -> Result<()> {
        let path = data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(())
    }
}
