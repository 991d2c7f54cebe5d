//! 삼대 법인 일별 매매 표 파싱.
//!
//! 원천 API는 필드명 없는 값 배열로 행을 돌려주므로 컬럼 위치만으로
//! 값을 찾습니다. 위치는 원천 측에서 예고 없이 바뀔 수 있어
//! [`ColumnMap`] 한 곳에만 정의하고, 주기적으로 `flow-collector fetch`로
//! 실제 응답과 대조해야 합니다.
//!
//! # 허용하는 응답 구조
//!
//! ```text
//! {"tables":[{"fields":[..],"data":[[..],..]}]}   TPEx 신규
//! {"fields":[..],"data":[[..],..],"stat":"OK"}      TWSE
//! {"aaData":[[..],..]}                             TPEx 구버전
//! {"stat":"很抱歉，沒有符合條件的資料!"}             데이터 없음 → 빈 표
//! ```

use chrono::NaiveDate;
use flow_core::FlowRecord;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{DataError, Result};

/// 컬럼 위치 → 필드 매핑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    /// 종목 코드
    pub security_id: usize,
    /// 외국인 순매수 (외국인 자영상 제외)
    pub foreign_net: usize,
    /// 투신 순매수
    pub trust_net: usize,
    /// 자영상 순매수 (자기매매 + 헤지 합계)
    pub dealer_net: usize,
    /// 삼대 법인 합계 (선택)
    pub total_net: Option<usize>,
}

impl ColumnMap {
    /// TPEx `3itrade_hedge_result` (24컬럼).
    ///
    /// ```text
    /// 0 代號  1 名稱
    /// 2-4   外資及陸資(不含外資自營商) 買進/賣出/買賣超
    /// 5-7   外資自營商 買進/賣出/買賣超
    /// 8-10  外資及陸資 合計 買進/賣出/買賣超
    /// 11-13 投信 買進/賣出/買賣超
    /// 14-16 自營商(自行買賣) 買進/賣出/買賣超
    /// 17-19 自營商(避險) 買進/賣出/買賣超
    /// 20-22 自營商 合計 買進/賣出/買賣超
    /// 23    三大法人買賣超股數合計
    /// ```
    pub const TPEX: Self = Self {
        security_id: 0,
        foreign_net: 4,
        trust_net: 13,
        dealer_net: 22,
        total_net: Some(23),
    };

    /// TWSE `T86` (19컬럼).
    ///
    /// ```text
    /// 0 證券代號  1 證券名稱
    /// 2-4   外陸資(不含外資自營商) 買進/賣出/買賣超
    /// 5-7   外資自營商 買進/賣出/買賣超
    /// 8-10  投信 買進/賣出/買賣超
    /// 11    自營商買賣超
    /// 12-14 自營商(自行買賣) 買進/賣出/買賣超
    /// 15-17 自營商(避險) 買進/賣出/買賣超
    /// 18    三大法人買賣超股數
    /// ```
    pub const TWSE: Self = Self {
        security_id: 0,
        foreign_net: 4,
        trust_net: 10,
        dealer_net: 11,
        total_net: Some(18),
    };

    /// 필수 컬럼을 모두 담기 위한 최소 컬럼 수 (합계 컬럼 제외)
    pub fn min_columns(&self) -> usize {
        [
            self.security_id,
            self.foreign_net,
            self.trust_net,
            self.dealer_net,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

/// 정규화된 표 (모든 셀은 문자열)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    /// 컬럼명 (응답에 있을 때만)
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 지정 컬럼 값이 종목 코드와 일치하는 첫 행
    pub fn find_row(&self, security_id: &str, column: usize) -> Option<&[String]> {
        let target = security_id.trim();
        self.rows
            .iter()
            .find(|row| row.get(column).is_some_and(|cell| cell.trim() == target))
            .map(Vec::as_slice)
    }
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    fields: Vec<Value>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    tables: Option<Vec<RawTable>>,
    #[serde(default)]
    fields: Option<Vec<Value>>,
    #[serde(default)]
    data: Option<Vec<Vec<Value>>>,
    #[serde(rename = "aaData", default)]
    aa_data: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    stat: Option<Value>,
}

/// 응답 본문을 표로 정규화.
pub fn parse_table(body: &str) -> Result<SourceTable> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(DataError::UnexpectedShape(format!(
            "최상위 값이 객체가 아님: {}",
            value_kind(&value)
        )));
    }

    let raw: RawEnvelope = serde_json::from_value(value)?;

    if let Some(tables) = raw.tables {
        let fields = tables
            .iter()
            .find(|t| !t.fields.is_empty())
            .map(|t| t.fields.iter().map(cell_text).collect())
            .unwrap_or_default();
        let rows = tables
            .into_iter()
            .flat_map(|t| t.data)
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        return Ok(SourceTable { fields, rows });
    }

    if let Some(data) = raw.data {
        return Ok(SourceTable {
            fields: raw
                .fields
                .unwrap_or_default()
                .iter()
                .map(cell_text)
                .collect(),
            rows: to_rows(data),
        });
    }

    if let Some(data) = raw.aa_data {
        return Ok(SourceTable {
            fields: Vec::new(),
            rows: to_rows(data),
        });
    }

    // 조회 결과 없음 메시지만 있는 응답
    if raw.stat.is_some() {
        return Ok(SourceTable::default());
    }

    Err(DataError::UnexpectedShape(
        "tables/data/aaData 키가 없습니다".to_string(),
    ))
}

/// 행에서 레코드 추출.
///
/// 컬럼 수가 부족하거나 필수 숫자 컬럼이 파싱되지 않으면 에러를 반환하며,
/// 값을 추측해서 채우지 않습니다. 합계 컬럼은 선택이므로 없거나 파싱 실패 시 `None`.
pub fn extract_record(
    row: &[String],
    columns: &ColumnMap,
    date: NaiveDate,
    shares_per_lot: i64,
) -> Result<FlowRecord> {
    let min = columns.min_columns();
    if row.len() < min {
        return Err(DataError::RowTooShort {
            len: row.len(),
            min,
        });
    }

    let lots = |column: usize| -> Result<i64> {
        parse_share_count(&row[column])
            .map(|shares| shares_to_lots(shares, shares_per_lot))
            .ok_or_else(|| DataError::InvalidNumber {
                column,
                value: row[column].clone(),
            })
    };

    let mut record = FlowRecord::new(
        date,
        row[columns.security_id].trim(),
        lots(columns.foreign_net)?,
        lots(columns.trust_net)?,
        lots(columns.dealer_net)?,
    );
    record.total_net = columns
        .total_net
        .and_then(|column| row.get(column))
        .and_then(|cell| parse_share_count(cell))
        .map(|shares| shares_to_lots(shares, shares_per_lot));

    Ok(record)
}

/// 천 단위 구분자가 포함된 정수 파싱 (예: "1,234" → 1234, "-56" → -56).
pub fn parse_share_count(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// 주식 수를 장 단위로 변환 (반올림, 0.5는 0에서 먼 쪽).
///
/// `shares_per_lot`이 1 이하이면 변환하지 않습니다.
pub fn shares_to_lots(shares: i64, shares_per_lot: i64) -> i64 {
    if shares_per_lot <= 1 {
        return shares;
    }
    let half = shares_per_lot / 2;
    if shares >= 0 {
        shares.saturating_add(half) / shares_per_lot
    } else {
        shares.saturating_sub(half) / shares_per_lot
    }
}

fn to_rows(data: Vec<Vec<Value>>) -> Vec<Vec<String>> {
    data.into_iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
