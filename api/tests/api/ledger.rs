use payloads::requests;
use reqwest::StatusCode;
use test_helpers::{assert_status_code, spawn_app};

#[tokio::test]
async fn add_points_then_balance_reflects_deposit() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    app.client
        .add_points(&requests::AddPoints {
            user_id,
            amount: 100,
            ttl_days: 30,
        })
        .await?;

    let balance = app.client.get_balance(&user_id).await?;
    assert_eq!(balance.total, 100);

    Ok(())
}

#[tokio::test]
async fn withdraw_consumes_available_balance() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    app.client
        .add_points(&requests::AddPoints {
            user_id,
            amount: 100,
            ttl_days: 30,
        })
        .await?;
    app.client
        .withdraw_points(&requests::WithdrawPoints {
            user_id,
            amount: 40,
        })
        .await?;

    let balance = app.client.get_balance(&user_id).await?;
    assert_eq!(balance.total, 60);

    Ok(())
}

#[tokio::test]
async fn withdraw_more_than_balance_is_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    app.client
        .add_points(&requests::AddPoints {
            user_id,
            amount: 10,
            ttl_days: 30,
        })
        .await?;

    let result = app
        .client
        .withdraw_points(&requests::WithdrawPoints {
            user_id,
            amount: 50,
        })
        .await;

    assert_status_code(result, StatusCode::BAD_REQUEST);

    let balance = app.client.get_balance(&user_id).await?;
    assert_eq!(balance.total, 10);

    Ok(())
}

#[tokio::test]
async fn add_points_with_non_positive_amount_is_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    let result = app
        .client
        .add_points(&requests::AddPoints {
            user_id,
            amount: 0,
            ttl_days: 30,
        })
        .await;

    assert_status_code(result, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn reserve_then_commit_leaves_balance_reduced() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    app.client
        .add_points(&requests::AddPoints {
            user_id,
            amount: 100,
            ttl_days: 30,
        })
        .await?;

    let reservation = app
        .client
        .reserve_points(&requests::ReservePoints {
            user_id,
            amount: 30,
        })
        .await?;

    // Reserved points are unavailable while held.
    let balance = app.client.get_balance(&user_id).await?;
    assert_eq!(balance.total, 70);

    app.client
        .commit_reservation(&reservation.reservation_id)
        .await?;

    let balance = app.client.get_balance(&user_id).await?;
    assert_eq!(balance.total, 70);

    Ok(())
}

#[tokio::test]
async fn reserve_then_rollback_restores_balance() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    app.client
        .add_points(&requests::AddPoints {
            user_id,
            amount: 100,
            ttl_days: 30,
        })
        .await?;

    let reservation = app
        .client
        .reserve_points(&requests::ReservePoints {
            user_id,
            amount: 30,
        })
        .await?;

    app.client
        .rollback_reservation(&reservation.reservation_id)
        .await?;

    let balance = app.client.get_balance(&user_id).await?;
    assert_eq!(balance.total, 100);

    Ok(())
}

#[tokio::test]
async fn committing_an_unknown_reservation_is_not_found() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let bogus = ledger::ReservationId::new();

    let result = app.client.commit_reservation(&bogus).await;

    assert_status_code(result, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn expiring_points_reports_the_deposit_s_expiry() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    app.client
        .add_points(&requests::AddPoints {
            user_id,
            amount: 50,
            ttl_days: 7,
        })
        .await?;

    let buckets = app
        .client
        .get_expiring_points(&requests::GetExpiringPoints { user_id, days: 10 })
        .await?;

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].amount, 50);

    Ok(())
}

#[tokio::test]
async fn transaction_history_reflects_deposits_and_withdrawals() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    app.client
        .add_points(&requests::AddPoints {
            user_id,
            amount: 100,
            ttl_days: 30,
        })
        .await?;
    app.client
        .withdraw_points(&requests::WithdrawPoints {
            user_id,
            amount: 20,
        })
        .await?;

    let history = app
        .client
        .get_transaction_history(&requests::GetTransactionHistory {
            user_id,
            limit: 50,
            offset: 0,
        })
        .await?;

    assert_eq!(history.len(), 2);
    // most-recent first
    assert_eq!(history[0].type_, payloads::responses::TransactionType::Withdrawal);
    assert_eq!(history[1].type_, payloads::responses::TransactionType::Deposit);

    Ok(())
}

#[tokio::test]
async fn balance_for_unknown_user_is_zero() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let user_id = app.new_user();

    let balance = app.client.get_balance(&user_id).await?;
    assert_eq!(balance.total, 0);

    Ok(())
}
