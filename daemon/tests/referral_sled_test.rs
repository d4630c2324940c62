//! Referral commission engine over sled
//!
//! A. Registration: paths, levels and downline counts
//! B. Commission distribution and uniqueness per (source, earner)
//! C. Redemption to the cash wallet
//! D. Earning moderation

#![allow(clippy::disallowed_methods)]

mod common;

use common::*;
use meridian_common::{
    id::Id,
    referral::{
        EarningFilter, EarningStatus, ProfileMutation, ReferralError, ReferralRates, SourceType,
    },
    transaction::{TransactionCategory, TransactionFilter, TransactionStatus, TransactionType},
};
use meridian_daemon::core::{
    config::LedgerConfig,
    error::LedgerError,
    referral::ReferralEngine,
    storage::{EarningProvider, ReferralProvider},
};
use tempdir::TempDir;

// ============================================================================
// A. Registration
// ============================================================================

#[tokio::test]
async fn test_registration_builds_nearest_first_path() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (root, a, b, buyer) = (&chain[0], &chain[1], &chain[2], &chain[3]);

    assert_eq!(root.referral_level, 0);
    assert!(root.referral_path.is_empty());
    assert!(!root.has_referrer());

    assert_eq!(buyer.referred_by, Some(b.user));
    assert_eq!(buyer.referral_level, 3);
    assert_eq!(buyer.referral_path, vec![b.user, a.user, root.user]);
}

#[tokio::test]
async fn test_registration_updates_downline_counts() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    // A second direct referral of the root
    register(&backend, Some(&chain[0])).await;

    let root = backend.referral.summary(&chain[0].user).await.unwrap();
    assert_eq!(root.downline_counts[1], 2);
    assert_eq!(root.downline_counts[2], 1);
    assert_eq!(root.downline_counts[3], 1);
    assert_eq!(root.total_downline, 4);

    let a = backend.referral.summary(&chain[1].user).await.unwrap();
    assert_eq!(a.downline_counts[1], 1);
    assert_eq!(a.downline_counts[2], 1);
    assert_eq!(a.total_downline, 2);
}

#[tokio::test]
async fn test_referral_code_is_case_insensitive() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let root = register(&backend, None).await;

    let user = Id::random();
    let code = format!("  {} ", root.referral_code.to_ascii_lowercase());
    let profile = backend
        .referral
        .register_profile(&user, Some(&code))
        .await
        .unwrap();
    assert_eq!(profile.referred_by, Some(root.user));
}

#[tokio::test]
async fn test_registration_errors() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let root = register(&backend, None).await;

    let result = backend
        .referral
        .register_profile(&root.user, None)
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::Referral(ReferralError::AlreadyRegistered))
    ));

    let user = Id::random();
    let result = backend
        .referral
        .register_profile(&user, Some("ZZZZZZZZ"))
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::Referral(ReferralError::ReferrerNotFound))
    ));
    // Nothing was stored for the rejected user
    assert!(backend.referral.profile(&user).await.unwrap().is_none());

    let result = backend.referral.register_profile(&user, Some("bad")).await;
    assert!(matches!(
        result,
        Err(LedgerError::Referral(ReferralError::InvalidCode(_)))
    ));
}

#[tokio::test]
async fn test_codes_resolve_to_their_owner() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let root = register(&backend, None).await;

    let owner = backend
        .storage
        .get_user_by_referral_code(&root.referral_code)
        .await
        .unwrap();
    assert_eq!(owner, Some(root.user));
}

#[tokio::test]
async fn test_engine_rejects_invalid_rates() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);

    let result = ReferralEngine::new(
        backend.storage.clone(),
        backend.ledger.clone(),
        backend.log.clone(),
        ReferralRates::new(vec![500, 1000]),
        2,
    );
    assert!(matches!(
        result,
        Err(LedgerError::Referral(ReferralError::RatiosIncreasing { depth: 2 }))
    ));
}

// ============================================================================
// B. Commission distribution
// ============================================================================

#[tokio::test]
async fn test_distribute_pays_each_depth() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (root, a, b, buyer) = (&chain[0], &chain[1], &chain[2], &chain[3]);
    let source = Id::random();

    let report = backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Order, &source)
        .await
        .unwrap();
    assert_eq!(report.levels_rewarded(), 2);
    assert_eq!(report.total_distributed, 150);
    assert!(!report.has_failures());
    assert_eq!(report.distributions[0].recipient, b.user);
    assert_eq!(report.distributions[0].amount, 100);
    assert_eq!(report.distributions[0].depth, 1);
    assert_eq!(report.distributions[1].recipient, a.user);
    assert_eq!(report.distributions[1].amount, 50);

    let summary = backend.referral.summary(&b.user).await.unwrap();
    assert_eq!(summary.wallet_balance, 100);
    assert_eq!(summary.total_earned, 100);
    assert_eq!(referral_balance(&backend, &root.user).await, 0);

    let earning = backend
        .storage
        .get_earning_for_source(&source, &a.user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(earning.depth, 2);
    assert_eq!(earning.source_user, buyer.user);
    assert_eq!(earning.status, EarningStatus::Credited);
}

#[tokio::test]
async fn test_distribute_twice_pays_once() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (b, buyer) = (&chain[2], &chain[3]);
    let source = Id::random();

    backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Ico, &source)
        .await
        .unwrap();
    let again = backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Ico, &source)
        .await
        .unwrap();
    assert!(again.distributions.is_empty());
    assert_eq!(again.skipped.len(), 2);
    assert_eq!(again.total_distributed, 0);

    assert_eq!(referral_balance(&backend, &b.user).await, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distribute_one_earning_per_ancestor() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (a, b, buyer) = (&chain[1], &chain[2], chain[3].user);
    let source = Id::random();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let referral = backend.referral.clone();
        handles.push(tokio::spawn(async move {
            referral
                .distribute(&buyer, 1000, SourceType::Order, &source)
                .await
                .unwrap()
        }));
    }

    let mut paid = 0;
    for handle in handles {
        paid += handle.await.unwrap().total_distributed;
    }
    assert_eq!(paid, 150);

    let earnings = backend
        .referral
        .all_earnings(&EarningFilter {
            source_user: Some(buyer),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(earnings.len(), 2);
    assert_eq!(referral_balance(&backend, &b.user).await, 100);
    assert_eq!(referral_balance(&backend, &a.user).await, 50);
}

#[tokio::test]
async fn test_no_profile_no_commission() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);

    let report = backend
        .referral
        .distribute(&Id::random(), 1000, SourceType::Order, &Id::random())
        .await
        .unwrap();
    assert!(report.distributions.is_empty());
    assert_eq!(report.total_distributed, 0);
}

#[tokio::test]
async fn test_rounded_down_commission_is_skipped() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (a, b, buyer) = (&chain[1], &chain[2], &chain[3]);

    // 10% of 15 = 1, 5% of 15 rounds down to 0
    let report = backend
        .referral
        .distribute(&buyer.user, 15, SourceType::Order, &Id::random())
        .await
        .unwrap();
    assert_eq!(report.levels_rewarded(), 1);
    assert_eq!(referral_balance(&backend, &b.user).await, 1);
    assert_eq!(referral_balance(&backend, &a.user).await, 0);
}

#[tokio::test]
async fn test_depth_limited_by_config() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let config = LedgerConfig {
        max_referral_depth: 1,
        ..test_ledger_config()
    };
    let backend = create_backend_with(&temp_dir, config, false);
    let chain = referral_chain(&backend).await;
    let (a, b, buyer) = (&chain[1], &chain[2], &chain[3]);

    backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Order, &Id::random())
        .await
        .unwrap();
    assert_eq!(referral_balance(&backend, &b.user).await, 100);
    assert_eq!(referral_balance(&backend, &a.user).await, 0);
}

#[tokio::test]
async fn test_failed_credit_leaves_no_earning() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (a, b, buyer) = (&chain[1], &chain[2], &chain[3]);
    let source = Id::random();

    // b cannot take another commission without overflowing
    let full = u64::MAX - 10;
    backend
        .storage
        .update_referral_profile(&b.user, ProfileMutation::Restore(full))
        .await
        .unwrap();

    let report = backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Order, &source)
        .await
        .unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].earner, b.user);
    assert_eq!(report.failures[0].depth, 1);
    assert_eq!(report.distributions.len(), 1);
    assert_eq!(report.distributions[0].recipient, a.user);
    assert_eq!(report.total_distributed, 50);
    assert!(report.skipped.is_empty());

    assert!(backend
        .storage
        .get_earning_for_source(&source, &b.user)
        .await
        .unwrap()
        .is_none());
    assert_eq!(referral_balance(&backend, &b.user).await, full);
    assert_eq!(referral_balance(&backend, &a.user).await, 50);

    // Once b can be credited again the same source pays it
    backend.referral.redeem(&b.user).await.unwrap();
    let report = backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Order, &source)
        .await
        .unwrap();
    assert!(!report.has_failures());
    assert_eq!(report.skipped, vec![a.user]);
    assert_eq!(report.distributions.len(), 1);
    assert_eq!(report.distributions[0].recipient, b.user);
    assert_eq!(report.distributions[0].amount, 100);

    let earning = backend
        .storage
        .get_earning_for_source(&source, &b.user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(earning.status, EarningStatus::Credited);
    assert_eq!(referral_balance(&backend, &b.user).await, 100);
    assert_eq!(referral_balance(&backend, &a.user).await, 50);
}

// ============================================================================
// C. Redemption
// ============================================================================

#[tokio::test]
async fn test_redeem_moves_balance_once() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (b, buyer) = (&chain[2], &chain[3]);

    for _ in 0..3 {
        backend
            .referral
            .distribute(&buyer.user, 1000, SourceType::Order, &Id::random())
            .await
            .unwrap();
    }

    let result = backend.referral.redeem(&b.user).await.unwrap();
    assert_eq!(result.amount, 300);
    assert_eq!(result.wallet.balance, 300);
    assert_eq!(result.redeemed_earnings, 3);
    assert_eq!(result.transaction.kind, TransactionType::Credit);
    assert_eq!(result.transaction.category, TransactionCategory::Adjustment);
    assert_eq!(result.transaction.status, TransactionStatus::Completed);

    assert!(matches!(
        backend.referral.redeem(&b.user).await,
        Err(LedgerError::NothingToRedeem)
    ));

    let summary = backend.referral.summary(&b.user).await.unwrap();
    assert_eq!(summary.wallet_balance, 0);
    assert_eq!(summary.total_earned, 300);

    let earnings = backend
        .referral
        .all_earnings(&EarningFilter::for_earner(b.user))
        .await
        .unwrap();
    assert!(earnings.iter().all(|e| e.status == EarningStatus::Redeemed));

    let txs = backend
        .log
        .all_wallet(&TransactionFilter::for_user(b.user))
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redeem_credits_once() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (b, buyer) = (chain[2].user, &chain[3]);

    backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Order, &Id::random())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let referral = backend.referral.clone();
        handles.push(tokio::spawn(async move { referral.redeem(&b).await.is_ok() }));
    }
    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);

    let wallet = backend.ledger.get_or_create(&b).await.unwrap();
    assert_eq!(wallet.balance, 100);
}

#[tokio::test]
async fn test_redeem_restores_balance_when_wallet_rejects_credit() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (b, buyer) = (&chain[2], &chain[3]);
    backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Order, &Id::random())
        .await
        .unwrap();
    let full = u64::MAX - 10;
    fund(&backend, &b.user, full).await;

    assert!(matches!(
        backend.referral.redeem(&b.user).await,
        Err(LedgerError::Overflow)
    ));

    let summary = backend.referral.summary(&b.user).await.unwrap();
    assert_eq!(summary.wallet_balance, 100);
    assert_eq!(summary.total_earned, 100);
    assert_eq!(backend.ledger.get_or_create(&b.user).await.unwrap().balance, full);

    let earnings = backend
        .referral
        .all_earnings(&EarningFilter::for_earner(b.user))
        .await
        .unwrap();
    assert_eq!(earnings.len(), 1);
    assert_eq!(earnings[0].status, EarningStatus::Credited);
    assert!(backend
        .log
        .all_wallet(&TransactionFilter::for_user(b.user))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_redeem_without_profile() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let root = register(&backend, None).await;

    assert!(matches!(
        backend.referral.redeem(&Id::random()).await,
        Err(LedgerError::Referral(ReferralError::UserNotFound))
    ));
    assert!(matches!(
        backend.referral.redeem(&root.user).await,
        Err(LedgerError::NothingToRedeem)
    ));
}

// ============================================================================
// D. Earning moderation
// ============================================================================

#[tokio::test]
async fn test_update_earning_status() {
    let temp_dir = TempDir::new("meridian_referral").unwrap();
    let backend = create_test_backend(&temp_dir);
    let chain = referral_chain(&backend).await;
    let (b, buyer) = (&chain[2], &chain[3]);

    let report = backend
        .referral
        .distribute(&buyer.user, 1000, SourceType::Order, &Id::random())
        .await
        .unwrap();
    let id = report.distributions[0].earning_id;

    let earning = backend
        .admin
        .update_earning(&id, EarningStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(earning.status, EarningStatus::Cancelled);
    assert_eq!(
        backend.storage.get_earning(&id).await.unwrap().unwrap().status,
        EarningStatus::Cancelled
    );
    // Bookkeeping only
    assert_eq!(referral_balance(&backend, &b.user).await, 100);

    assert!(matches!(
        backend
            .admin
            .update_earning(&Id::random(), EarningStatus::Credited)
            .await,
        Err(LedgerError::Referral(ReferralError::EarningNotFound))
    ));
}
