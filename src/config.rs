use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PulseboardConfig {
    pub api_port: u16,
    pub paths: PulseboardPaths,
    /// Optional JSON file seeding the in-memory identity directory.
    pub identity_seed: Option<PathBuf>,
}

impl PulseboardConfig {
    pub fn from_env() -> Result<Self> {
        let paths = PulseboardPaths::discover()?;
        let api_port = env::var("PULSEBOARD_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let identity_seed = env::var("PULSEBOARD_IDENTITY_SEED")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);
        Ok(Self {
            api_port,
            paths,
            identity_seed,
        })
    }

    pub fn new(api_port: u16, paths: PulseboardPaths) -> Self {
        Self {
            api_port,
            paths,
            identity_seed: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PulseboardPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
}

impl PulseboardPaths {
    pub fn discover() -> Result<Self> {
        let base = match env::var("PULSEBOARD_DATA_DIR") {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw),
            _ => {
                let exe_path = env::current_exe()
                    .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
                exe_path
                    .parent()
                    .ok_or_else(|| anyhow!("executable path missing parent"))?
                    .to_path_buf()
            }
        };
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("pulseboard.db");
        Ok(Self {
            base,
            data_dir,
            db_path,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|err| anyhow!("failed to create data dir: {err}"))?;
        Ok(())
    }
}
