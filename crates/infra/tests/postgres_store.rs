//! Runs against a real Postgres. Set `TEST_DATABASE_URL` (or put it in `.env`) to enable;
//! without it every test returns early.

use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use diesel::{PgConnection, RunQueryDsl, sql_query};
use diesel_migrations::MigrationHarness;
use serde_json::json;
use std::{str::FromStr, sync::Arc, sync::OnceLock};
use uuid::Uuid;

use application::usecases::{
    linkedin_oauth::LinkedInOAuthUseCase,
    oauth_state_cleanup::{OAuthStateCleanupParams, OAuthStateCleanupUseCase},
    payments::PaymentsUseCase,
    schema_migration::SchemaMigrationUseCase,
};
use domain::{
    entities::{
        linkedin_posts::InsertLinkedInPostEntity,
        linkedin_tokens::{InsertLinkedInTokenEntity, RotateLinkedInTokenEntity},
        oauth_states::InsertOAuthStateEntity,
        payments::{InsertPaymentEntity, UpdatePaymentStatusEntity},
    },
    errors::{OAuthFlowError, StoreError, is_unique_violation},
    repositories::{
        linkedin_posts::LinkedInPostRepository, linkedin_tokens::LinkedInTokenRepository,
        oauth_states::OAuthStateRepository, payments::PaymentRepository,
        schema::SchemaRepository,
    },
    value_objects::{linkedin::TokenGrantModel, payments::CheckoutPaymentModel},
};
use infra::postgres::{
    postgres_connection::{PgPoolSquad, PoolSettings, establish_connection, establish_connection_with},
    repositories::{
        linkedin_posts::LinkedInPostPostgres, linkedin_tokens::LinkedInTokenPostgres,
        oauth_states::OAuthStatePostgres, payments::PaymentPostgres,
        schema::{MIGRATIONS, SchemaPostgres},
    },
};

static POOL: OnceLock<Option<Arc<PgPoolSquad>>> = OnceLock::new();

fn test_database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Migrated once per test binary so parallel tests never race on the migration table.
fn test_pool() -> Option<Arc<PgPoolSquad>> {
    POOL.get_or_init(|| {
        let url = test_database_url()?;

        let pool = establish_connection(&url).expect("test database pool");
        {
            let mut pooled = pool.get().expect("test database connection");
            let conn: &mut PgConnection = &mut pooled;
            conn.run_pending_migrations(MIGRATIONS)
                .expect("migrations apply");
        }
        Some(Arc::new(pool))
    })
    .clone()
}

macro_rules! pool_or_skip {
    () => {
        match test_pool() {
            Some(pool) => pool,
            None => {
                eprintln!("TEST_DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

/// Exactly one call won; the other lost on a unique constraint.
fn assert_single_winner<T: std::fmt::Debug>(first: anyhow::Result<T>, second: anyhow::Result<T>) {
    let results = [first, second];
    assert_eq!(
        results.iter().filter(|r| r.is_ok()).count(),
        1,
        "{results:?}"
    );
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(is_unique_violation),
        "{results:?}"
    );
}

fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

fn checkout(intent_id: &str) -> CheckoutPaymentModel {
    CheckoutPaymentModel {
        stripe_payment_intent_id: intent_id.to_string(),
        stripe_customer_id: Some("cus_1".to_string()),
        customer_email: "a@b.com".to_string(),
        customer_name: None,
        amount_total_minor: 1000,
        amount_subtotal_minor: 900,
        currency: "usd".to_string(),
        payment_status: "succeeded".to_string(),
        product_id: "p1".to_string(),
        product_name: "Widget".to_string(),
        payment_method: None,
        metadata: json!({}),
    }
}

fn token(user_id: Uuid, access_token: &str) -> InsertLinkedInTokenEntity {
    InsertLinkedInTokenEntity {
        user_id,
        access_token: access_token.to_string(),
        refresh_token: Some("refresh".to_string()),
        expires_at: Utc::now().timestamp() + 3600,
    }
}

async fn pause() {
    // `now()` is the transaction start; separate statements need distinct instants.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}

#[tokio::test]
async fn migrations_are_idempotent_and_shape_verifies() {
    let pool = pool_or_skip!();

    let report = SchemaMigrationUseCase::new(Arc::new(SchemaPostgres::new(pool)))
        .run()
        .await
        .unwrap();

    assert!(report.applied.is_empty());
    assert_eq!(
        report.verified_tables,
        vec!["payments", "oauth_states", "linkedin_tokens", "linkedin_posts"]
    );
}

#[tokio::test]
async fn recorded_payment_round_trips_with_defaults() {
    let pool = pool_or_skip!();
    let repo = Arc::new(PaymentPostgres::new(pool));
    let intent_id = unique("pi_123");

    let entity = checkout(&intent_id).into_insert_entity().unwrap();
    let payment_id = repo.insert_payment(entity).await.unwrap();

    let stored = repo
        .find_by_payment_intent_id(intent_id.clone())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stored.id, payment_id);
    assert_eq!(stored.amount_total, BigDecimal::from_str("10.00").unwrap());
    assert_eq!(stored.amount_subtotal, BigDecimal::from_str("9.00").unwrap());
    assert_eq!(stored.currency, "USD");
    assert_eq!(stored.status, "completed");
    assert_eq!(stored.metadata, json!({}));
    assert_eq!(stored.created_at, stored.updated_at);
}

#[tokio::test]
async fn duplicate_payment_intent_is_rejected() {
    let pool = pool_or_skip!();
    let repo = Arc::new(PaymentPostgres::new(pool));
    let intent_id = unique("pi_dup");

    repo.insert_payment(checkout(&intent_id).into_insert_entity().unwrap())
        .await
        .unwrap();
    let err = repo
        .insert_payment(checkout(&intent_id).into_insert_entity().unwrap())
        .await
        .unwrap_err();

    assert!(domain::errors::is_unique_violation(&err));
}

#[tokio::test]
async fn replayed_checkout_resolves_to_first_row() {
    let pool = pool_or_skip!();
    let usecase = PaymentsUseCase::new(Arc::new(PaymentPostgres::new(pool)));
    let intent_id = unique("pi_replay");

    let first = usecase
        .record_checkout_payment(checkout(&intent_id))
        .await
        .unwrap();
    let second = usecase
        .record_checkout_payment(checkout(&intent_id))
        .await
        .unwrap();

    assert!(!first.is_replay());
    assert!(second.is_replay());
    assert_eq!(first.payment_id(), second.payment_id());
}

#[tokio::test]
async fn negative_amount_hits_check_constraint() {
    let pool = pool_or_skip!();
    let repo = Arc::new(PaymentPostgres::new(pool));

    let mut entity = checkout(&unique("pi_neg")).into_insert_entity().unwrap();
    entity.amount_total = BigDecimal::from_str("-1.00").unwrap();

    let err = repo.insert_payment(entity).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::CheckViolation { .. })
    ));
}

#[tokio::test]
async fn non_object_metadata_hits_check_constraint() {
    let pool = pool_or_skip!();
    let repo = Arc::new(PaymentPostgres::new(pool));

    let entity = InsertPaymentEntity {
        metadata: json!(["not", "an", "object"]),
        ..checkout(&unique("pi_meta")).into_insert_entity().unwrap()
    };

    let err = repo.insert_payment(entity).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::CheckViolation { .. })
    ));
}

#[tokio::test]
async fn payment_update_refreshes_updated_at() {
    let pool = pool_or_skip!();
    let repo = Arc::new(PaymentPostgres::new(pool));
    let intent_id = unique("pi_upd");

    repo.insert_payment(checkout(&intent_id).into_insert_entity().unwrap())
        .await
        .unwrap();
    let before = repo
        .find_by_payment_intent_id(intent_id.clone())
        .await
        .unwrap()
        .unwrap();

    pause().await;
    let after = repo
        .update_status(
            intent_id,
            UpdatePaymentStatusEntity {
                payment_status: None,
                status: Some("refunded".to_string()),
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(after.status, "refunded");
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn deleted_state_reads_as_absent() {
    let pool = pool_or_skip!();
    let repo = Arc::new(OAuthStatePostgres::new(pool));
    let state = unique("state");

    repo.insert_state(InsertOAuthStateEntity {
        state: state.clone(),
        user_id: Uuid::new_v4(),
        expires_at: Utc::now() + Duration::minutes(10),
    })
    .await
    .unwrap();

    assert!(repo.find_state(state.clone()).await.unwrap().is_some());
    assert!(repo.delete_state(state.clone()).await.unwrap());
    assert!(repo.find_state(state.clone()).await.unwrap().is_none());
    assert!(!repo.delete_state(state).await.unwrap());
}

#[tokio::test]
async fn state_is_consumed_once() {
    let pool = pool_or_skip!();
    let usecase = LinkedInOAuthUseCase::new(
        Arc::new(OAuthStatePostgres::new(Arc::clone(&pool))),
        Arc::new(LinkedInTokenPostgres::new(pool)),
        600,
    );
    let user_id = Uuid::new_v4();

    let state = usecase.issue_state(user_id).await.unwrap();
    assert_eq!(usecase.consume_state(&state).await.unwrap(), user_id);

    let err = usecase.consume_state(&state).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<OAuthFlowError>(),
        Some(&OAuthFlowError::InvalidState)
    );
}

#[tokio::test]
async fn sweep_removes_only_expired_states() {
    let pool = pool_or_skip!();
    let repo = Arc::new(OAuthStatePostgres::new(pool));
    let expired = unique("expired");
    let live = unique("live");

    for (state, expires_at) in [
        (&expired, Utc::now() - Duration::minutes(5)),
        (&live, Utc::now() + Duration::minutes(5)),
    ] {
        repo.insert_state(InsertOAuthStateEntity {
            state: state.clone(),
            user_id: Uuid::new_v4(),
            expires_at,
        })
        .await
        .unwrap();
    }

    let result = OAuthStateCleanupUseCase::new(Arc::clone(&repo))
        .run(OAuthStateCleanupParams {
            grace_seconds: 0,
            limit: Some(1000),
        })
        .await
        .unwrap();

    assert!(result.deleted >= 1);
    assert!(repo.find_state(expired).await.unwrap().is_none());
    assert!(repo.find_state(live).await.unwrap().is_some());
}

#[tokio::test]
async fn second_token_for_user_is_rejected_but_rotation_succeeds() {
    let pool = pool_or_skip!();
    let repo = Arc::new(LinkedInTokenPostgres::new(pool));
    let user_id = Uuid::new_v4();

    repo.insert_token(token(user_id, "first")).await.unwrap();
    let err = repo.insert_token(token(user_id, "second")).await.unwrap_err();
    assert!(domain::errors::is_unique_violation(&err));

    let before = repo.find_token(user_id).await.unwrap().unwrap();
    assert_eq!(before.created_at, before.updated_at);

    pause().await;
    let rotated = repo
        .rotate_token(
            user_id,
            RotateLinkedInTokenEntity {
                access_token: "second".to_string(),
                refresh_token: None,
                expires_at: Utc::now().timestamp() + 7200,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(rotated.access_token, "second");
    assert_eq!(rotated.refresh_token, None);
    assert!(rotated.updated_at > before.updated_at);
    assert_eq!(rotated.created_at, before.created_at);
}

#[tokio::test]
async fn storing_tokens_twice_keeps_one_row() {
    let pool = pool_or_skip!();
    let repo = Arc::new(LinkedInTokenPostgres::new(Arc::clone(&pool)));
    let usecase = LinkedInOAuthUseCase::new(
        Arc::new(OAuthStatePostgres::new(pool)),
        Arc::clone(&repo),
        600,
    );
    let user_id = Uuid::new_v4();
    let grant = |access_token: &str| TokenGrantModel {
        access_token: access_token.to_string(),
        refresh_token: None,
        expires_in: Some(60),
    };

    let first = usecase.store_tokens(user_id, grant("a")).await.unwrap();
    pause().await;
    let second = usecase.store_tokens(user_id, grant("b")).await.unwrap();

    assert_eq!(second.access_token, "b");
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(usecase.usable_access_token(user_id).await.unwrap(), "b");

    assert!(usecase.disconnect(user_id).await.unwrap());
    assert!(repo.find_token(user_id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_post_urn_is_rejected() {
    let pool = pool_or_skip!();
    let repo = Arc::new(LinkedInPostPostgres::new(pool));
    let post_urn = format!("urn:li:share:{}", Uuid::new_v4().simple());
    let post = |user_id| InsertLinkedInPostEntity {
        user_id,
        post_urn: post_urn.clone(),
        posted_at: Utc::now(),
    };

    let user_id = Uuid::new_v4();
    let post_id = repo.insert_post(post(user_id)).await.unwrap();
    let err = repo.insert_post(post(Uuid::new_v4())).await.unwrap_err();

    assert!(domain::errors::is_unique_violation(&err));
    let stored = repo.find_by_urn(post_urn.clone()).await.unwrap().unwrap();
    assert_eq!(stored.id, post_id);
    assert_eq!(stored.user_id, user_id);
}

#[tokio::test]
async fn user_posts_are_listed_newest_first() {
    let pool = pool_or_skip!();
    let repo = Arc::new(LinkedInPostPostgres::new(pool));
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    for hours_ago in [3, 1, 2] {
        repo.insert_post(InsertLinkedInPostEntity {
            user_id,
            post_urn: format!("urn:li:share:{}", Uuid::new_v4().simple()),
            posted_at: now - Duration::hours(hours_ago),
        })
        .await
        .unwrap();
    }

    let posts = repo.list_by_user(user_id, Some(2)).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert!(posts[0].posted_at > posts[1].posted_at);
    assert!(posts[0].posted_at > now - Duration::hours(2));

    for limit in [None, Some(0), Some(-1)] {
        let posts = repo.list_by_user(user_id, limit).await.unwrap();
        assert_eq!(posts.len(), 3, "limit {limit:?}");
    }
}

#[tokio::test]
async fn concurrent_inserts_of_one_intent_id_admit_exactly_one() {
    let pool = pool_or_skip!();
    let repo = Arc::new(PaymentPostgres::new(pool));
    let intent_id = unique("pi_race");

    let (first, second) = tokio::join!(
        repo.insert_payment(checkout(&intent_id).into_insert_entity().unwrap()),
        repo.insert_payment(checkout(&intent_id).into_insert_entity().unwrap()),
    );

    assert_single_winner(first, second);
    let stored = repo.list_by_customer_email("a@b.com".to_string()).await.unwrap();
    assert_eq!(
        stored
            .iter()
            .filter(|p| p.stripe_payment_intent_id == intent_id)
            .count(),
        1
    );
}

#[tokio::test]
async fn concurrent_inserts_of_one_post_urn_admit_exactly_one() {
    let pool = pool_or_skip!();
    let repo = Arc::new(LinkedInPostPostgres::new(pool));
    let post_urn = format!("urn:li:share:{}", Uuid::new_v4().simple());
    let post = || InsertLinkedInPostEntity {
        user_id: Uuid::new_v4(),
        post_urn: post_urn.clone(),
        posted_at: Utc::now(),
    };

    let (first, second) = tokio::join!(repo.insert_post(post()), repo.insert_post(post()));

    assert_single_winner(first, second);
}

#[tokio::test]
async fn concurrent_checkout_deliveries_resolve_to_one_payment() {
    let pool = pool_or_skip!();
    let usecase = PaymentsUseCase::new(Arc::new(PaymentPostgres::new(pool)));
    let intent_id = unique("pi_webhook");

    let (first, second) = tokio::join!(
        usecase.record_checkout_payment(checkout(&intent_id)),
        usecase.record_checkout_payment(checkout(&intent_id)),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.payment_id(), second.payment_id());
    assert_eq!(
        [first, second].iter().filter(|o| !o.is_replay()).count(),
        1
    );
}

const DRIFTED_PAYMENTS_SQL: &str = r#"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT uuid_generate_v4(),
    stripe_payment_intent_id TEXT NOT NULL,
    stripe_customer_id TEXT,
    customer_email TEXT NOT NULL,
    customer_name TEXT,
    amount_total NUMERIC(10, 2) NOT NULL,
    amount_subtotal NUMERIC(10, 2) NOT NULL,
    currency TEXT NOT NULL,
    payment_status TEXT NOT NULL,
    product_id TEXT NOT NULL,
    product_name TEXT NOT NULL,
    payment_method TEXT,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    status TEXT NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

#[tokio::test]
async fn pre_existing_table_without_constraints_fails_verification() {
    // Shared pool first: it installs the extension the migrations reference.
    let _ = pool_or_skip!();
    let Some(url) = test_database_url() else {
        return;
    };

    // One connection, so the session search_path applies to every query below.
    let pool = Arc::new(
        establish_connection_with(
            &url,
            PoolSettings {
                max_size: 1,
                ..PoolSettings::default()
            },
        )
        .unwrap(),
    );
    let schema = unique("drift");
    {
        let mut conn = pool.get().unwrap();
        for statement in [
            format!("CREATE SCHEMA {schema}"),
            format!("SET search_path TO {schema}, public"),
            DRIFTED_PAYMENTS_SQL.to_string(),
        ] {
            sql_query(statement).execute(&mut conn).unwrap();
        }
    }

    let result = SchemaMigrationUseCase::new(Arc::new(SchemaPostgres::new(Arc::clone(&pool))))
        .run()
        .await;

    {
        let mut conn = pool.get().unwrap();
        sql_query(format!("DROP SCHEMA {schema} CASCADE"))
            .execute(&mut conn)
            .unwrap();
    }

    let err = result.unwrap_err();
    let Some(StoreError::SchemaMismatch { table, detail }) = err.downcast_ref::<StoreError>() else {
        panic!("expected a schema mismatch, got {err:#}");
    };
    assert_eq!(table, "payments");
    assert!(
        detail.contains("missing unique constraint on (stripe_payment_intent_id)"),
        "{detail}"
    );
    assert!(detail.contains("missing check constraint on `amount_total`"), "{detail}");
    assert!(detail.contains("missing check constraint on `metadata`"), "{detail}");
    assert!(!detail.contains("missing column"), "{detail}");
}

#[tokio::test]
async fn missing_table_is_reported_as_absent() {
    let pool = pool_or_skip!();

    let shape = SchemaPostgres::new(pool)
        .describe_table(unique("no_such_table"))
        .await
        .unwrap();

    assert!(shape.is_none());
}
