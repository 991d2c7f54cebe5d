//! 단일 종목 기관 순매수 일별 수집기.
//!
//! 실행할 때마다 최근 조회 구간에서 누락된 거래일을 보충해
//! JSON 이력 파일에 병합합니다.

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{CollectorConfig, PersistConfig, ProviderSettings, ReconcileConfig, RewritePolicy};
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
