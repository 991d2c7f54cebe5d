//! 환경변수 기반 설정 모듈.

use std::{path::PathBuf, str::FromStr, time::Duration};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use flow_core::calendar::{local_date, EXCHANGE_TIMEZONE};
use flow_data::{Market, ProviderConfig};
use rand::Rng;

use crate::{error::CollectorError, Result};

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 수집 대상 종목 코드
    pub security_id: String,
    /// 이력 JSON 파일 경로
    pub store_path: PathBuf,
    /// "오늘"을 계산할 거래소 타임존
    pub timezone: Tz,
    /// 데이터 프로바이더 설정
    pub provider: ProviderSettings,
    /// 누락 일자 보충 설정
    pub reconcile: ReconcileConfig,
    /// 저장 설정
    pub persist: PersistConfig,
}

/// 데이터 프로바이더 설정
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// 시장 구분 (TPEX, TWSE)
    pub market: Market,
    /// API Base URL 재정의
    pub base_url: Option<String>,
    /// HTTP 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 장당 주식 수. 1이면 주 단위 그대로 저장
    pub shares_per_lot: i64,
}

/// 누락 일자 보충 설정
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// 오늘 포함 조회할 과거 일수
    pub lookback_days: u32,
    /// 보존할 최대 레코드 수
    pub retention_cap: usize,
    /// API 요청 간 최소 딜레이 (밀리초)
    pub request_delay_min_ms: u64,
    /// API 요청 간 최대 딜레이 (밀리초)
    pub request_delay_max_ms: u64,
}

/// 변경이 없을 때의 저장 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewritePolicy {
    /// 새 레코드가 있거나 보존 한도로 잘린 경우에만 저장
    #[default]
    OnChange,
    /// 매 실행마다 저장
    Always,
}

impl FromStr for RewritePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on_change" | "on-change" | "changed" => Ok(Self::OnChange),
            "always" => Ok(Self::Always),
            other => Err(format!("알 수 없는 저장 정책: {}", other)),
        }
    }
}

/// 저장 설정
#[derive(Debug, Clone, Default)]
pub struct PersistConfig {
    pub rewrite_policy: RewritePolicy,
    /// 시도한 조회가 모두 실패하면 비정상 종료
    pub fail_on_total_fetch_failure: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            security_id: "4749".to_string(),
            store_path: PathBuf::from("data.json"),
            timezone: EXCHANGE_TIMEZONE,
            provider: ProviderSettings::default(),
            reconcile: ReconcileConfig::default(),
            persist: PersistConfig::default(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            market: Market::Tpex,
            base_url: None,
            request_timeout_secs: 30,
            shares_per_lot: 1000,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            lookback_days: 10,
            retention_cap: 30,
            request_delay_min_ms: 1000,
            request_delay_max_ms: 3000,
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let market = match std::env::var("FLOW_MARKET") {
            Ok(v) => v.parse().map_err(CollectorError::Config)?,
            Err(_) => defaults.provider.market,
        };
        let timezone = match std::env::var("FLOW_TIMEZONE") {
            Ok(v) => v
                .parse::<Tz>()
                .map_err(|e| CollectorError::Config(format!("FLOW_TIMEZONE: {}", e)))?,
            Err(_) => defaults.timezone,
        };
        let rewrite_policy = match std::env::var("FLOW_REWRITE_POLICY") {
            Ok(v) => v.parse().map_err(CollectorError::Config)?,
            Err(_) => RewritePolicy::default(),
        };

        let config = Self {
            security_id: std::env::var("FLOW_SECURITY_ID").unwrap_or(defaults.security_id),
            store_path: std::env::var("FLOW_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            timezone,
            provider: ProviderSettings {
                market,
                base_url: std::env::var("FLOW_BASE_URL")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
                request_timeout_secs: env_var_parse(
                    "FLOW_REQUEST_TIMEOUT_SECS",
                    defaults.provider.request_timeout_secs,
                ),
                shares_per_lot: env_var_parse(
                    "FLOW_SHARES_PER_LOT",
                    defaults.provider.shares_per_lot,
                ),
            },
            reconcile: ReconcileConfig {
                lookback_days: env_var_parse(
                    "FLOW_LOOKBACK_DAYS",
                    defaults.reconcile.lookback_days,
                ),
                retention_cap: env_var_parse(
                    "FLOW_RETENTION_CAP",
                    defaults.reconcile.retention_cap,
                ),
                request_delay_min_ms: env_var_parse(
                    "FLOW_REQUEST_DELAY_MIN_MS",
                    defaults.reconcile.request_delay_min_ms,
                ),
                request_delay_max_ms: env_var_parse(
                    "FLOW_REQUEST_DELAY_MAX_MS",
                    defaults.reconcile.request_delay_max_ms,
                ),
            },
            persist: PersistConfig {
                rewrite_policy,
                fail_on_total_fetch_failure: env_var_bool(
                    "FLOW_FAIL_ON_TOTAL_FETCH_FAILURE",
                    false,
                ),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<()> {
        if self.security_id.trim().is_empty() {
            return Err(CollectorError::Config(
                "FLOW_SECURITY_ID가 비어 있습니다".to_string(),
            ));
        }
        if self.reconcile.retention_cap == 0 {
            return Err(CollectorError::Config(
                "FLOW_RETENTION_CAP은 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.reconcile.request_delay_min_ms > self.reconcile.request_delay_max_ms {
            return Err(CollectorError::Config(format!(
                "요청 딜레이 범위가 잘못되었습니다: {}ms > {}ms",
                self.reconcile.request_delay_min_ms, self.reconcile.request_delay_max_ms
            )));
        }
        if self.provider.shares_per_lot < 1 {
            return Err(CollectorError::Config(
                "FLOW_SHARES_PER_LOT은 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 거래소 타임존 기준 오늘 날짜
    pub fn today(&self) -> NaiveDate {
        local_date(Utc::now(), self.timezone)
    }
}

impl ProviderSettings {
    /// 클라이언트 설정으로 변환
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            market: self.market,
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            shares_per_lot: self.shares_per_lot,
            columns: None,
        }
    }
}

impl ReconcileConfig {
    /// 다음 API 요청 전 대기 시간 (최소~최대 사이 무작위)
    pub fn request_delay(&self) -> Duration {
        let min = self.request_delay_min_ms;
        let max = self.request_delay_max_ms.max(min);
        if min == max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
