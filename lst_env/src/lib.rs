use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 보드 클라이언트 전체를 위한 통합 환경 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub assets: AssetSettings,
    pub logging: LoggingSettings,
    pub controller: ControllerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// 백엔드 주소. `/init`, `/action` 등의 경로가 이 뒤에 붙습니다.
    pub base_url: String,
    /// None 이면 reqwest 기본값(무제한)을 그대로 사용
    pub request_timeout_ms: Option<u64>,
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// 쿠키 저장 파일 경로. 상대 경로면 설정 디렉토리 기준
    pub cookie_file: String,
    pub max_age_seconds: u64,
}

impl StorageSettings {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    pub fn cookie_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.cookie_file);
        if path.is_absolute() {
            path
        } else {
            ClientConfig::get_config_dir().join(path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSettings {
    pub directory: String,
    pub field_count: u32,
    pub board_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub directory: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSettings {
    pub reset_pulse_ms: u64,
    /// 오래된 응답이 최신 상태를 덮어쓰지 못하도록 세대 번호로 막습니다.
    /// false 면 마지막에 도착한 응답이 이깁니다.
    pub fence_stale_responses: bool,
}

impl ControllerSettings {
    pub fn reset_pulse(&self) -> Duration {
        Duration::from_millis(self.reset_pulse_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: "http://localhost:8000".to_string(),
                request_timeout_ms: None,
            },
            storage: StorageSettings {
                cookie_file: "cookies.json".to_string(),
                max_age_seconds: 31_536_000,
            },
            assets: AssetSettings {
                directory: "assets".to_string(),
                field_count: 41,
                board_count: 51,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                directory: "logs".to_string(),
                filename: "lst_client.log".to_string(),
            },
            controller: ControllerSettings {
                reset_pulse_ms: 500,
                fence_stale_responses: true,
            },
        }
    }
}

static CONFIG: Lazy<ClientConfig> = Lazy::new(|| {
    ClientConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        ClientConfig::default()
    })
});

impl ClientConfig {
    /// 전역 설정 인스턴스 가져오기
    pub fn global() -> &'static ClientConfig {
        &CONFIG
    }

    /// 설정 파일 로드
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = Self::get_config_dir().join("client.toml");
        Self::load_from(config_file)
    }

    pub fn load_from(config_file: PathBuf) -> Result<Self, ConfigError> {
        info!("Loading configuration from: {:?}", config_file);

        let settings = Config::builder()
            // 기본값 설정
            .add_source(Config::try_from(&Self::default())?)
            // 설정 파일 로드 (선택사항)
            .add_source(File::from(config_file).required(false))
            // 환경 변수 오버라이드 (예: LST__API__BASE_URL)
            .add_source(Environment::with_prefix("LST").separator("__"))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// 설정 파일 저장
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::get_config_dir();
        std::fs::create_dir_all(&config_dir)?;

        let config_file = config_dir.join("client.toml");
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(config_file, toml_string)?;

        Ok(())
    }

    /// 설정 디렉토리 가져오기
    pub fn get_config_dir() -> PathBuf {
        if let Ok(config_home) = std_env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_home).join("lst")
        } else if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".config").join("lst")
        } else {
            // 최후의 수단으로 현재 디렉토리
            PathBuf::from("./config")
        }
    }

    /// 테스트 환경용 설정 생성
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.logging.level = "trace".to_string();
        config.api.request_timeout_ms = Some(5_000);
        config
    }
}

/// 설정 초기화 함수
pub fn init() -> Result<()> {
    dotenv::dotenv().ok();

    // 전역 설정 초기화 (Lazy 실행)
    let config = ClientConfig::global();
    info!("Client configuration initialized");
    debug!("Configuration: {:?}", config);

    Ok(())
}

/// 설정 파일 생성 헬퍼
pub fn create_default_config() -> Result<()> {
    let config = ClientConfig::default();
    config.save()?;
    info!("Default configuration file created");
    Ok(())
}
