//! Standalone institutional flow collector CLI.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use flow_collector::{modules, CollectorConfig};
use flow_core::History;
use flow_data::{provider::table::extract_record, InstitutionalTradeClient, JsonStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "flow-collector")]
#[command(about = "기관 순매수 일별 수집기", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 조회 구간 내 누락 일자 수집 후 저장 (기본 명령)
    Run {
        /// 오늘 포함 조회할 과거 일수
        #[arg(long)]
        lookback_days: Option<u32>,

        /// 보존할 최대 레코드 수
        #[arg(long)]
        retention_cap: Option<usize>,

        /// 기준일 재정의 (YYYY-MM-DD, 기본값: 거래소 타임존 기준 오늘)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// 저장된 이력 출력 (네트워크 사용 안 함)
    Show {
        /// 최근 N건만 출력
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// 단일 일자 조회 결과 출력 (저장하지 않음, 컬럼 위치 점검용)
    Fetch {
        /// 조회 일자 (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    // 로깅 초기화 (FLOW_LOG_FORMAT=json 이면 JSON 한 줄 포맷)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "flow_collector={},flow_data={},flow_core={}",
            cli.log_level, cli.log_level, cli.log_level
        )
        .into()
    });
    let json_logs = std::env::var("FLOW_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = CollectorConfig::from_env()?;
    let store = JsonStore::new(&config.store_path);

    let command = cli.command.unwrap_or(Commands::Run {
        lookback_days: None,
        retention_cap: None,
        date: None,
    });

    match command {
        Commands::Run {
            lookback_days,
            retention_cap,
            date,
        } => {
            if let Some(days) = lookback_days {
                config.reconcile.lookback_days = days;
            }
            if let Some(cap) = retention_cap {
                config.reconcile.retention_cap = cap;
            }
            config.validate()?;

            tracing::info!(
                security_id = %config.security_id,
                market = ?config.provider.market,
                store = %config.store_path.display(),
                "기관 순매수 수집기 시작"
            );

            let provider = InstitutionalTradeClient::new(config.provider.to_provider_config())?;
            let today = date.unwrap_or_else(|| config.today());
            let report = modules::collect_flows(&config, &provider, &store, today).await?;

            tracing::info!(
                persisted = report.persisted,
                changed = report.changed,
                records = report.record_count,
                "실행 완료"
            );
        }
        Commands::Show { limit } => {
            // 조회 전용: 손상 파일도 격리하지 않고 에러만 보고
            let history = match store.try_load() {
                Ok(records) => History::from_records(records.unwrap_or_default()),
                Err(e) => {
                    println!("❌ {} 읽기 실패: {}", store.path().display(), e);
                    return Err(e.into());
                }
            };
            if history.is_empty() {
                println!("저장된 레코드가 없습니다.");
                return Ok(());
            }

            let skip = history.len().saturating_sub(limit);
            println!(
                "\n📋 {} 기관 순매수 ({}건 중 최근 {}건)",
                config.security_id,
                history.len(),
                history.len() - skip
            );
            println!("{:-<72}", "");
            println!(
                "{:<12} {:>12} {:>12} {:>12} {:>12}",
                "일자", "외국인", "투신", "자영상", "합계"
            );
            for record in history.records().iter().skip(skip) {
                let total = record
                    .total_net
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<12} {:>12} {:>12} {:>12} {:>12}",
                    record.date.to_string(),
                    record.foreign_net,
                    record.trust_net,
                    record.dealer_net,
                    total
                );
            }
            println!("{:-<72}", "");
        }
        Commands::Fetch { date } => {
            let provider_config = config.provider.to_provider_config();
            let shares_per_lot = provider_config.shares_per_lot;
            let client = InstitutionalTradeClient::new(provider_config)?;
            let columns = *client.columns();

            let table = match client.fetch_table(date).await {
                Ok(table) => table,
                Err(e) => {
                    println!("❌ {} 조회 실패: {}", date, e);
                    return Ok(());
                }
            };

            println!("\n📋 {} 응답 표: {}행", date, table.rows.len());
            for (idx, field) in table.fields.iter().enumerate() {
                println!("  [{:>2}] {}", idx, field);
            }

            let Some(row) = table.find_row(&config.security_id, columns.security_id) else {
                println!("\n⚠️ {} 종목이 표에 없습니다 (휴장일 또는 미상장)", config.security_id);
                return Ok(());
            };

            println!("\n{} 행 원본:", config.security_id);
            for (idx, cell) in row.iter().enumerate() {
                println!("  [{:>2}] {}", idx, cell);
            }

            match extract_record(row, &columns, date, shares_per_lot) {
                Ok(record) => {
                    println!("\n✅ 파싱 결과");
                    println!("  외국인: {}", record.foreign_net);
                    println!("  투신: {}", record.trust_net);
                    println!("  자영상: {}", record.dealer_net);
                    println!("  합계: {:?}", record.total_net);
                    println!("  세 항목 합: {}", record.category_sum());
                }
                Err(e) => println!("\n❌ 파싱 실패: {}", e),
            }
        }
    }

    Ok(())
}
