//! TPEx/TWSE 삼대 법인 매매 일보 클라이언트.
//!
//! 원천 API는 종목 필터를 지원하지 않아 해당 일자의 전 종목 표를 받아
//! 대상 종목 행을 찾습니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use flow_data::provider::{FlowProvider, InstitutionalTradeClient, ProviderConfig};
//!
//! let client = InstitutionalTradeClient::new(ProviderConfig::default())?;
//! let outcome = client.fetch("4749", date).await;
//! ```

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use flow_core::calendar::{to_compact_date, to_roc_date};
use reqwest::Client;
use tracing::{debug, warn};

use super::{
    table::{extract_record, parse_table, ColumnMap, SourceTable},
    FetchOutcome, FlowProvider,
};
use crate::error::{DataError, Result};

/// 시장 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// 證券櫃檯買賣中心 (장외/상장 전 포함)
    Tpex,
    /// 臺灣證券交易所
    Twse,
}

impl Market {
    /// 기본 API Base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Market::Tpex => "https://www.tpex.org.tw",
            Market::Twse => "https://www.twse.com.tw",
        }
    }

    /// 일보 경로
    pub fn path(&self) -> &'static str {
        match self {
            Market::Tpex => "/web/stock/3insti/daily_trade/3itrade_hedge_result.php",
            Market::Twse => "/rwd/zh/fund/T86",
        }
    }

    /// 기본 컬럼 매핑
    pub fn column_map(&self) -> ColumnMap {
        match self {
            Market::Tpex => ColumnMap::TPEX,
            Market::Twse => ColumnMap::TWSE,
        }
    }

    /// 일자별 쿼리 파라미터.
    ///
    /// TPEx는 민국 기년(YYY/MM/DD), TWSE는 서기(YYYYMMDD)를 사용합니다.
    pub fn query(&self, date: NaiveDate) -> Result<Vec<(&'static str, String)>> {
        match self {
            Market::Tpex => {
                let roc = to_roc_date(date).ok_or(DataError::DateConversion(date))?;
                Ok(vec![
                    ("l", "zh-tw".to_string()),
                    ("o", "json".to_string()),
                    ("se", "EW".to_string()),
                    ("t", "D".to_string()),
                    ("d", roc),
                ])
            }
            Market::Twse => Ok(vec![
                ("date", to_compact_date(date)),
                ("selectType", "ALLBUT0999".to_string()),
                ("response", "json".to_string()),
            ]),
        }
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TPEX" | "OTC" => Ok(Market::Tpex),
            "TWSE" | "TSE" => Ok(Market::Twse),
            other => Err(format!("알 수 없는 시장: {}", other)),
        }
    }
}

/// 클라이언트 설정
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// 시장 구분
    pub market: Market,
    /// Base URL (None이면 시장 기본값)
    pub base_url: Option<String>,
    /// HTTP 타임아웃
    pub timeout: Duration,
    /// 장당 주식 수 (1이면 주 단위 그대로 저장)
    pub shares_per_lot: i64,
    /// 컬럼 매핑 (None이면 시장 기본값)
    pub columns: Option<ColumnMap>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            market: Market::Tpex,
            base_url: None,
            timeout: Duration::from_secs(30),
            shares_per_lot: 1000,
            columns: None,
        }
    }
}

/// 삼대 법인 매매 일보 클라이언트.
#[derive(Debug, Clone)]
pub struct InstitutionalTradeClient {
    client: Client,
    market: Market,
    base_url: String,
    columns: ColumnMap,
    shares_per_lot: i64,
}

impl InstitutionalTradeClient {
    /// 새 클라이언트 생성.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("flow-collector/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            market: config.market,
            base_url: config
                .base_url
                .unwrap_or_else(|| config.market.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            columns: config.columns.unwrap_or_else(|| config.market.column_map()),
            shares_per_lot: config.shares_per_lot.max(1),
        })
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// 해당 일자 전 종목 표 조회.
    pub async fn fetch_table(&self, date: NaiveDate) -> Result<SourceTable> {
        let url = format!("{}{}", self.base_url, self.market.path());
        let params = self.market.query(date)?;

        debug!(market = ?self.market, url = %url, date = %date, "일보 요청");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DataError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_table(&body)
    }

    /// 표 조회 후 종목 행 추출. 행이 없으면 `Ok(None)`.
    pub async fn fetch_record(
        &self,
        security_id: &str,
        date: NaiveDate,
    ) -> Result<Option<flow_core::FlowRecord>> {
        let table = self.fetch_table(date).await?;

        let Some(row) = table.find_row(security_id, self.columns.security_id) else {
            debug!(
                security_id,
                date = %date,
                rows = table.rows.len(),
                "표에 종목 없음 (휴장일 또는 미상장)"
            );
            return Ok(None);
        };

        extract_record(row, &self.columns, date, self.shares_per_lot).map(Some)
    }
}

#[async_trait]
impl FlowProvider for InstitutionalTradeClient {
    fn name(&self) -> &str {
        match self.market {
            Market::Tpex => "tpex",
            Market::Twse => "twse",
        }
    }

    async fn fetch(&self, security_id: &str, date: NaiveDate) -> FetchOutcome {
        match self.fetch_record(security_id, date).await {
            Ok(Some(record)) => FetchOutcome::Found(record),
            Ok(None) => FetchOutcome::not_found(),
            Err(e) => {
                warn!(
                    provider = self.name(),
                    security_id,
                    date = %date,
                    error = %e,
                    "일보 조회 실패"
                );
                FetchOutcome::Absent(e.into_absent_reason())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_from_str() {
        assert_eq!("tpex".parse::<Market>().unwrap(), Market::Tpex);
        assert_eq!(" TWSE ".parse::<Market>().unwrap(), Market::Twse);
        assert!("NYSE".parse::<Market>().is_err());
    }

    #[test]
    fn test_market_query_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let tpex = Market::Tpex.query(date).unwrap();
        assert!(tpex.contains(&("d", "113/01/10".to_string())));

        let twse = Market::Twse.query(date).unwrap();
        assert!(twse.contains(&("date", "20240110".to_string())));
    }

    #[test]
    fn test_market_query_rejects_pre_roc_date() {
        let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert!(matches!(
            Market::Tpex.query(date),
            Err(DataError::DateConversion(_))
        ));
    }
}
