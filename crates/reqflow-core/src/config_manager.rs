//! 네트워크 설정 파일 관리.
//!
//! `NetworkConfig`를 JSON 파일 하나로 보관한다. 경로를 주지 않으면
//! 플랫폼 설정 디렉토리 아래 `reqflow/config.json`을 쓴다.
//! 파일이 없으면 기본값으로 만들고, 저장은 임시 파일을 거쳐 교체한다.

use crate::config::NetworkConfig;
use crate::error::CoreError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

const FILE_NAME: &str = "config.json";
const DIR_NAME: &str = "reqflow";

/// 설정 관리자
///
/// 복제본은 같은 설정을 공유한다.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    current: Arc<RwLock<NetworkConfig>>,
    path: PathBuf,
}

impl ConfigManager {
    /// 플랫폼 기본 경로의 설정 파일을 연다
    pub fn new() -> Result<Self, CoreError> {
        Self::with_path(Self::config_dir()?.join(FILE_NAME))
    }

    /// 지정한 경로의 설정 파일을 연다 (없으면 기본 설정으로 생성)
    pub fn with_path(path: PathBuf) -> Result<Self, CoreError> {
        let config = match read_config(&path)? {
            Some(config) => config,
            None => {
                let config = NetworkConfig::default_config();
                write_config(&path, &config)?;
                info!("기본 설정 파일 생성: {}", path.display());
                config
            }
        };

        Ok(Self {
            current: Arc::new(RwLock::new(config)),
            path,
        })
    }

    /// 현재 설정 (복제본)
    pub fn get(&self) -> NetworkConfig {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 검증 후 저장하고 메모리 설정 교체
    ///
    /// 검증이나 저장에 실패하면 현재 설정은 그대로 남는다.
    pub fn update(&self, config: NetworkConfig) -> Result<(), CoreError> {
        config.validate()?;
        write_config(&self.path, &config)?;
        self.replace(config);
        debug!("설정 저장: {}", self.path.display());
        Ok(())
    }

    /// 현재 설정을 고쳐서 저장
    pub fn update_with<F>(&self, edit: F) -> Result<NetworkConfig, CoreError>
    where
        F: FnOnce(&mut NetworkConfig),
    {
        let mut config = self.get();
        edit(&mut config);
        self.update(config.clone())?;
        Ok(config)
    }

    /// 설정 파일 경로
    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// 파일 내용으로 메모리 설정 교체
    pub fn reload(&self) -> Result<(), CoreError> {
        let config = read_config(&self.path)?.ok_or_else(|| {
            CoreError::Config(format!("설정 파일이 사라짐: {}", self.path.display()))
        })?;
        self.replace(config);
        info!("설정 다시 로드: {}", self.path.display());
        Ok(())
    }

    /// 플랫폼 설정 디렉토리 (`.../reqflow`)
    ///
    /// - Linux: `$XDG_CONFIG_HOME/reqflow`, 없으면 `~/.config/reqflow`
    /// - macOS: `~/Library/Application Support/reqflow`
    /// - Windows: `%APPDATA%\reqflow`
    pub fn config_dir() -> Result<PathBuf, CoreError> {
        let env = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        let base = if cfg!(target_os = "windows") {
            env("APPDATA")
        } else if cfg!(target_os = "macos") {
            env("HOME").map(|home| home.join("Library").join("Application Support"))
        } else {
            env("XDG_CONFIG_HOME").or_else(|| env("HOME").map(|home| home.join(".config")))
        };

        match base {
            Some(base) => Ok(base.join(DIR_NAME)),
            None => {
                warn!("설정 디렉토리를 결정할 수 없어 현재 디렉토리 사용");
                Ok(PathBuf::from(".").join(DIR_NAME))
            }
        }
    }

    fn replace(&self, config: NetworkConfig) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

/// 파일이 없으면 `Ok(None)`
fn read_config(path: &Path) -> Result<Option<NetworkConfig>, CoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CoreError::Config(format!(
                "설정 파일 읽기 실패: {}: {e}",
                path.display()
            )))
        }
    };

    let config: NetworkConfig = serde_json::from_str(&content)
        .map_err(|e| CoreError::Config(format!("설정 파일 파싱 실패: {}: {e}", path.display())))?;
    config.validate()?;
    debug!("설정 파일 로드: {}", path.display());
    Ok(Some(config))
}

fn write_config(path: &Path, config: &NetworkConfig) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| {
            CoreError::Config(format!("설정 디렉토리 생성 실패: {}: {e}", dir.display()))
        })?;
    }

    let content = serde_json::to_string_pretty(config)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, content)
        .and_then(|()| fs::rename(&staging, path))
        .map_err(|e| CoreError::Config(format!("설정 파일 저장 실패: {}: {e}", path.display())))
}
