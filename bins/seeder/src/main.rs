//! Database seeder for Hazina development and testing.
//!
//! Seeds a small demo season: three members contributing savings, a
//! small loan running through approval, disbursement, and repayment,
//! a large loan going through committee review, and a dividend
//! distribution of the interest earned.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use rust_decimal_macros::dec;
use tracing::info;
use uuid::Uuid;

use hazina_core::audit::TracingAuditSink;
use hazina_core::governance::VoteDecision;
use hazina_core::loan::LoanStatus;
use hazina_db::{
    ContributionRepository, DividendRepository, GovernanceRepository, LoanRepository,
    RepaymentRepository, ReportsRepository,
};
use hazina_shared::types::{LoanId, MemberId};

/// Treasurer recording the demo season (consistent for all seeds).
const TREASURER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo members.
const MEMBER_IDS: [&str; 3] = [
    "00000000-0000-0000-0000-000000000011",
    "00000000-0000-0000-0000-000000000012",
    "00000000-0000-0000-0000-000000000013",
];
/// Committee members voting on the large loan.
const COMMITTEE_IDS: [&str; 2] = [
    "00000000-0000-0000-0000-000000000021",
    "00000000-0000-0000-0000-000000000022",
];

fn member(id: &str) -> MemberId {
    MemberId::from_uuid(Uuid::parse_str(id).expect("seed UUID is valid"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hazina=info,seeder=info".into()),
        )
        .init();

    let database_url = match hazina_shared::AppConfig::load() {
        Ok(config) => config.database.url,
        Err(_) => std::env::var("DATABASE_URL")
            .context("set HAZINA__DATABASE__URL or DATABASE_URL in the environment")?,
    };

    info!("Connecting to database...");
    let db = hazina_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let audit = Arc::new(TracingAuditSink);
    let contributions = ContributionRepository::new(db.clone(), audit.clone());
    let loans = LoanRepository::new(db.clone(), audit.clone());
    let governance = GovernanceRepository::new(db.clone());
    let repayments = RepaymentRepository::new(db.clone(), audit.clone());
    let dividends = DividendRepository::new(db.clone(), audit);
    let reports = ReportsRepository::new(db.clone());

    let treasurer = member(TREASURER_ID);

    // Skip if the demo season is already in place.
    let stats = reports.global_stats().await?;
    if !stats.liquidity.is_zero() {
        info!("Ledger already has activity, skipping seed");
        return Ok(());
    }

    info!("Seeding contributions...");
    for month in ["Jan-2026", "Feb-2026", "Mar-2026"] {
        for id in MEMBER_IDS {
            contributions
                .deposit(member(id), dec!(5000), month, treasurer, None)
                .await?;
        }
    }

    info!("Seeding a small loan through its full lifecycle...");
    let small = loans
        .apply_for_loan(member(MEMBER_IDS[0]), dec!(10000), dec!(0.05), dec!(10500))
        .await?;
    let small_id = LoanId::from_uuid(small.id);
    loans
        .update_status(small_id, LoanStatus::Approved, treasurer, None)
        .await?;
    loans
        .update_status(small_id, LoanStatus::Disbursed, treasurer, None)
        .await?;
    repayments
        .repay(small_id, dec!(4000), treasurer, None)
        .await?;
    repayments
        .repay(small_id, dec!(6500), treasurer, None)
        .await?;

    info!("Seeding a large loan through committee review...");
    let large = loans
        .apply_for_loan(member(MEMBER_IDS[1]), dec!(150000), dec!(0.08), dec!(162000))
        .await?;
    let large_id = LoanId::from_uuid(large.id);
    for id in COMMITTEE_IDS {
        governance
            .cast_vote(large_id, member(id), VoteDecision::Approve, None)
            .await?;
    }
    loans
        .update_status(large_id, LoanStatus::Approved, treasurer, None)
        .await?;

    info!("Distributing the interest income...");
    let distribution = dividends.distribute(treasurer, None).await?;
    info!(
        entry_id = %distribution.entry.id,
        members = distribution.breakdown.len(),
        "dividend distribution posted"
    );

    let stats = reports.global_stats().await?;
    info!(
        liquidity = %stats.liquidity,
        total_income = %stats.total_income,
        awaiting_disbursement = stats.awaiting_disbursement,
        "Seeding complete!"
    );

    Ok(())
}
