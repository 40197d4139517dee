use crate::metrics::ScorePolicy;
use crate::prompt::QuestionPack;
use crate::score_store::DEFAULT_RANKING_LIMIT;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Opaque player identity scores are recorded under. Verifying who is
    /// behind the name is somebody else's job.
    pub player: String,
    pub pack: String,
    pub questions_per_session: usize,
    pub ranking_limit: usize,
    pub score_policy: ScorePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: "guest".to_string(),
            pack: "general".to_string(),
            questions_per_session: 10,
            ranking_limit: DEFAULT_RANKING_LIMIT,
            score_policy: ScorePolicy::default(),
        }
    }
}

impl Config {
    pub fn question_pack(&self) -> QuestionPack {
        QuestionPack::from_name(&self.pack).unwrap_or(QuestionPack::General)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "quik") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("quik_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            player: "ada".into(),
            pack: "science".into(),
            questions_per_session: 20,
            ranking_limit: 5,
            score_policy: ScorePolicy::LinearPenalty,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn unknown_pack_name_falls_back_to_general() {
        let cfg = Config {
            pack: "klingon".into(),
            ..Config::default()
        };
        assert_eq!(cfg.question_pack(), QuestionPack::General);
    }
}
