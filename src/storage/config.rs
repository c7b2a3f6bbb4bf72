//! 配置文件管理模块

use crate::core::models::AppConfig;
use anyhow::Result;
use std::path::PathBuf;

/// 配置管理器
pub struct ConfigManager {
    config_path: PathBuf,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "loanledger", "LoanLedger")
}

impl ConfigManager {
    /// 创建配置管理器
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// 获取默认配置路径
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|d| d.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// 获取默认数据库路径
    pub fn default_database_path() -> PathBuf {
        project_dirs()
            .map(|d| d.data_dir().join("ledger.db"))
            .unwrap_or_else(|| PathBuf::from("ledger.db"))
    }

    /// 配置中实际使用的数据库路径
    pub fn database_path(config: &AppConfig) -> PathBuf {
        config
            .database_path
            .clone()
            .unwrap_or_else(Self::default_database_path)
    }

    /// 加载配置
    pub fn load(&self) -> Result<AppConfig> {
        if self.config_path.exists() {
            let content = std::fs::read_to_string(&self.config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// 保存配置
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        tracing::info!("配置已保存: {}", self.config_path.display());
        Ok(())
    }

    /// 重置为默认配置
    pub fn reset(&self) -> Result<()> {
        self.save(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::GuarantorLayout;
    use tempfile::tempdir;

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("config.json");

        let manager = ConfigManager::new(config_path);

        let mut config = AppConfig::default();
        config.guarantor_layout = GuarantorLayout::FixedColumns;
        config.database_path = Some(dir.path().join("people.db"));

        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(ConfigManager::database_path(&loaded), dir.path().join("people.db"));
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("config.json"));
        assert_eq!(manager.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_reset() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("config.json"));

        let mut config = AppConfig::default();
        config.guarantor_layout = GuarantorLayout::SingleColumn;
        manager.save(&config).unwrap();
        manager.reset().unwrap();

        assert_eq!(manager.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_corrupt_config_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ConfigManager::new(path).load().is_err());
    }
}
