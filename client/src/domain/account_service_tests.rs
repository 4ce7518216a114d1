//! Tests for the account synchronisation service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::domain::ports::MockAccountGateway;
use crate::domain::sync::EntryState;
use rstest::rstest;

fn id(raw: &str) -> AccountId {
    AccountId::new(raw).expect("valid id")
}

fn account(raw_id: &str, holder: &str, balance: f64, active: bool) -> Account {
    Account::new(id(raw_id), holder, balance, active).expect("valid account")
}

fn amount(raw: f64) -> Amount {
    Amount::new(raw).expect("valid amount")
}

fn make_service(gateway: MockAccountGateway) -> AccountSyncService<MockAccountGateway> {
    AccountSyncService::new(Arc::new(gateway), AccountStore::default())
}

fn list_state(service: &AccountSyncService<MockAccountGateway>) -> Option<EntryState> {
    service.store().state(&AccountCacheKey::List)
}

#[tokio::test]
async fn deposit_replaces_detail_entry_and_marks_list_stale() {
    let mut gateway = MockAccountGateway::new();
    gateway
        .expect_fetch_all()
        .times(1)
        .return_once(|| Ok(vec![account("acc-1", "Alice", 100.0, true)]));
    gateway
        .expect_deposit()
        .withf(|id, amount| id.as_str() == "acc-1" && amount.get() == 25.0)
        .times(1)
        .return_once(|_, _| Ok(account("acc-1", "Alice", 125.0, true)));

    let service = make_service(gateway);
    service.list_accounts().await.expect("list primes the store");
    assert_eq!(list_state(&service), Some(EntryState::Fresh));

    let updated = service
        .deposit(&id("acc-1"), amount(25.0))
        .await
        .expect("deposit succeeds");

    assert_eq!(updated.balance(), 125.0);
    assert_eq!(service.store().peek_account(&id("acc-1")), Some(updated));
    assert_eq!(
        service.store().state(&AccountCacheKey::detail(&id("acc-1"))),
        Some(EntryState::Fresh)
    );
    assert_eq!(list_state(&service), Some(EntryState::Stale));
}

#[tokio::test]
async fn withdraw_replaces_detail_entry_and_marks_list_stale() {
    let mut gateway = MockAccountGateway::new();
    gateway
        .expect_withdraw()
        .withf(|id, amount| id.as_str() == "acc-1" && amount.get() == 40.0)
        .times(1)
        .return_once(|_, _| Ok(account("acc-1", "Alice", 60.0, true)));

    let service = make_service(gateway);
    let updated = service
        .withdraw(&id("acc-1"), amount(40.0))
        .await
        .expect("withdraw succeeds");

    assert_eq!(service.store().peek_account(&id("acc-1")), Some(updated));
    assert_eq!(list_state(&service), Some(EntryState::Stale));
}

#[tokio::test]
async fn list_read_after_mutation_refetches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut gateway = MockAccountGateway::new();
    gateway.expect_fetch_all().times(2).returning(move || {
        let balance = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            100.0
        } else {
            110.0
        };
        Ok(vec![account("acc-1", "Alice", balance, true)])
    });
    gateway
        .expect_deposit()
        .times(1)
        .return_once(|_, _| Ok(account("acc-1", "Alice", 110.0, true)));

    let service = make_service(gateway);
    service.list_accounts().await.expect("first list");
    service
        .deposit(&id("acc-1"), amount(10.0))
        .await
        .expect("deposit succeeds");
    let listed = service.list_accounts().await.expect("second list");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(listed, vec![account("acc-1", "Alice", 110.0, true)]);
}

#[tokio::test]
async fn created_account_is_served_from_store_without_refetch() {
    let mut gateway = MockAccountGateway::new();
    gateway
        .expect_create()
        .withf(|new_account| {
            new_account.holder.as_str() == "Alice" && new_account.initial_balance.get() == 100.0
        })
        .times(1)
        .return_once(|_| Ok(account("acc-9", "Alice", 100.0, true)));
    gateway.expect_fetch_one().never();

    let service = make_service(gateway);
    let request = NewAccount::new("Alice", 100.0).expect("valid request");
    let created = service
        .create_account(&request)
        .await
        .expect("create succeeds");

    assert_eq!(created.account_holder(), "Alice");
    assert_eq!(created.balance(), 100.0);
    assert!(created.is_active());
    assert_eq!(list_state(&service), Some(EntryState::Stale));

    let fetched = service.account(&id("acc-9")).await.expect("served from store");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn same_account_transfer_is_rejected_before_any_request() {
    let mut gateway = MockAccountGateway::new();
    gateway.expect_transfer().never();

    let service = make_service(gateway);
    let error = service
        .transfer(&id("acc-1"), &id("acc-1"), amount(5.0))
        .await
        .expect_err("same-account transfer rejected");

    assert_eq!(
        error,
        AccountSyncError::Validation(crate::domain::AccountValidationError::SameAccountTransfer)
    );
    assert_eq!(list_state(&service), None);
}

#[tokio::test]
async fn successful_transfer_marks_participants_and_list_stale() {
    let mut gateway = MockAccountGateway::new();
    gateway
        .expect_transfer()
        .withf(|transfer| {
            transfer.from_account().as_str() == "acc-1"
                && transfer.to_account().as_str() == "acc-2"
                && transfer.amount().get() == 30.0
        })
        .times(1)
        .return_once(|_| Ok(true));

    let service = make_service(gateway);
    service.store().write_account(account("acc-1", "Alice", 100.0, true));
    service.store().write_account(account("acc-2", "Bob", 10.0, true));

    let succeeded = service
        .transfer(&id("acc-1"), &id("acc-2"), amount(30.0))
        .await
        .expect("transfer succeeds");

    assert!(succeeded);
    for key in [
        AccountCacheKey::detail(&id("acc-1")),
        AccountCacheKey::detail(&id("acc-2")),
        AccountCacheKey::List,
    ] {
        assert_eq!(service.store().state(&key), Some(EntryState::Stale), "{key}");
    }
    assert_eq!(
        service.store().peek_account(&id("acc-1")).map(|a| a.balance()),
        Some(100.0),
        "no balance is computed locally"
    );
}

#[tokio::test]
async fn declined_transfer_leaves_store_untouched() {
    let mut gateway = MockAccountGateway::new();
    gateway.expect_transfer().times(1).return_once(|_| Ok(false));

    let service = make_service(gateway);
    service.store().write_account(account("acc-1", "Alice", 100.0, true));

    let succeeded = service
        .transfer(&id("acc-1"), &id("acc-2"), amount(30.0))
        .await
        .expect("call succeeds");

    assert!(!succeeded);
    assert_eq!(
        service.store().state(&AccountCacheKey::detail(&id("acc-1"))),
        Some(EntryState::Fresh)
    );
    assert_eq!(list_state(&service), None);
}

#[rstest]
#[case::transport(AccountGatewayError::transport("status 500"))]
#[case::decode(AccountGatewayError::decode("missing field `balance`"))]
#[tokio::test]
async fn failed_deposit_leaves_store_untouched(#[case] failure: AccountGatewayError) {
    let mut gateway = MockAccountGateway::new();
    let returned = failure.clone();
    gateway
        .expect_deposit()
        .times(1)
        .return_once(move |_, _| Err(returned));

    let service = make_service(gateway);
    service.store().write_account(account("acc-1", "Alice", 100.0, true));

    let error = service
        .deposit(&id("acc-1"), amount(1.0))
        .await
        .expect_err("deposit fails");

    assert_eq!(error, AccountSyncError::Gateway(failure));
    assert_eq!(
        service.store().peek_account(&id("acc-1")).map(|a| a.balance()),
        Some(100.0)
    );
    assert_eq!(list_state(&service), None);
}

#[tokio::test]
async fn mismatched_account_response_is_a_decode_error() {
    let mut gateway = MockAccountGateway::new();
    gateway
        .expect_fetch_one()
        .times(1)
        .return_once(|_| Ok(account("acc-2", "Bob", 1.0, true)));

    let service = make_service(gateway);
    let error = service
        .account(&id("acc-1"))
        .await
        .expect_err("mismatch rejected");

    assert!(error.is_decode());
    assert_eq!(
        service.store().state(&AccountCacheKey::detail(&id("acc-1"))),
        Some(EntryState::Stale)
    );
    assert!(service.store().peek_account(&id("acc-2")).is_none());
}

#[tokio::test]
async fn active_accounts_excludes_inactive_records() {
    let mut gateway = MockAccountGateway::new();
    gateway.expect_fetch_all().times(1).return_once(|| {
        Ok(vec![
            account("acc-1", "Alice", 1.0, true),
            account("acc-2", "Bob", 2.0, false),
            account("acc-3", "Carol", 3.0, true),
        ])
    });

    let service = make_service(gateway);
    let active = service.active_accounts().await.expect("list succeeds");

    let ids: Vec<&str> = active.iter().map(|a| a.account_id().as_str()).collect();
    assert_eq!(ids, vec!["acc-1", "acc-3"]);
}
