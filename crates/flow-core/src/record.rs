//! 일별 법인 순매수 레코드.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 한 종목의 한 거래일 삼대 법인(외국인, 투신, 자영상) 순매수 수량.
///
/// 수량 단위는 장(lot)이며 양수는 순매수, 음수는 순매도입니다.
/// 직렬화 필드 순서는 저장 파일 포맷의 일부이므로 변경하지 마세요.
///
/// 구버전 스크립트가 남긴 필드명(`stock_id`, `foreign_investors`,
/// `investment_trust`, `dealer`)도 읽을 수 있지만, 저장은 항상 현재 필드명으로 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// 거래일 (YYYY-MM-DD)
    pub date: NaiveDate,
    /// 종목 코드
    #[serde(alias = "stock_id")]
    pub security_id: String,
    /// 외국인 순매수
    #[serde(alias = "foreign_investors")]
    pub foreign_net: i64,
    /// 투신 순매수
    #[serde(alias = "investment_trust")]
    pub trust_net: i64,
    /// 자영상 순매수
    #[serde(alias = "dealer")]
    pub dealer_net: i64,
    /// 삼대 법인 합계 (원천 데이터가 제공할 때만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_net: Option<i64>,
}

impl FlowRecord {
    /// 새 레코드 생성 (합계 없음).
    pub fn new(
        date: NaiveDate,
        security_id: impl Into<String>,
        foreign_net: i64,
        trust_net: i64,
        dealer_net: i64,
    ) -> Self {
        Self {
            date,
            security_id: security_id.into(),
            foreign_net,
            trust_net,
            dealer_net,
            total_net: None,
        }
    }

    /// 합계 설정.
    pub fn with_total(mut self, total_net: i64) -> Self {
        self.total_net = Some(total_net);
        self
    }

    /// 세 카테고리 순매수의 단순 합.
    ///
    /// 원천 합계(`total_net`)는 외국인 자영상 등이 포함되어 이 값과 다를 수 있습니다.
    pub fn category_sum(&self) -> i64 {
        self.foreign_net + self.trust_net + self.dealer_net
    }
}
