//! End-to-end lifecycle tests over in-memory processor and store.

use common::{IntentId, UserId};
use lifecycle::{
    ConfirmOutcome, CreatePayment, PaymentLifecycle, WebhookIngestor, WebhookOutcome,
};
use processor::{InMemoryProcessor, ProcessorClient};
use store::{InMemoryPaymentStore, PaymentStatus, PaymentStore};

fn setup() -> (
    PaymentLifecycle<InMemoryProcessor, InMemoryPaymentStore>,
    WebhookIngestor<InMemoryProcessor, InMemoryPaymentStore>,
) {
    let lifecycle = PaymentLifecycle::new(InMemoryProcessor::new(), InMemoryPaymentStore::new());
    let ingestor = WebhookIngestor::new(lifecycle.clone());
    (lifecycle, ingestor)
}

fn payment_for(user: &str) -> CreatePayment {
    CreatePayment {
        amount: 1000,
        currency: "usd".to_string(),
        user_id: UserId::new(user),
        payment_method: "pm_1".to_string(),
    }
}

#[tokio::test]
async fn create_confirm_refund_full_flow() {
    let (lifecycle, _) = setup();

    // create: record is pending, intent id matches the gateway's
    let created = lifecycle.create(payment_for("user-9")).await.unwrap();
    let record = lifecycle
        .store()
        .find_by_intent(&created.intent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, PaymentStatus::Pending);
    assert_eq!(record.intent_id, created.intent_id);

    // confirm: record transitions to succeeded
    let outcome = lifecycle.confirm(&created.intent_id).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Confirmed { .. }));
    let record = lifecycle
        .store()
        .find_by_intent(&created.intent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, PaymentStatus::Succeeded);

    // refund: refund object returned, record status unchanged
    let refund = lifecycle.refund(&created.intent_id).await.unwrap();
    assert_eq!(refund.object["payment_intent"], created.intent_id.as_str());
    let record = lifecycle
        .store()
        .find_by_intent(&created.intent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, PaymentStatus::Succeeded);
}

#[tokio::test]
async fn webhook_converges_state_without_local_confirm() {
    let (lifecycle, ingestor) = setup();

    let created = lifecycle.create(payment_for("user-3")).await.unwrap();

    // The front end confirmed directly with the gateway; this service only
    // hears about it via the webhook.
    lifecycle
        .processor()
        .confirm_intent(&created.intent_id)
        .await
        .unwrap();

    let payload = serde_json::to_vec(&serde_json::json!({
        "id": "evt_hook",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": created.intent_id.as_str()}}
    }))
    .unwrap();
    let header = lifecycle.processor().sign(&payload);

    let outcome = ingestor.handle(&payload, &header).await.unwrap();
    assert!(matches!(outcome, WebhookOutcome::Applied { .. }));

    let record = lifecycle
        .store()
        .find_by_intent(&created.intent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, PaymentStatus::Succeeded);
}

#[tokio::test]
async fn confirm_races_webhook_for_same_intent() {
    let (lifecycle, ingestor) = setup();
    let created = lifecycle.create(payment_for("user-7")).await.unwrap();

    let payload = serde_json::to_vec(&serde_json::json!({
        "id": "evt_race",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": created.intent_id.as_str()}}
    }))
    .unwrap();
    let header = lifecycle.processor().sign(&payload);

    let confirm = {
        let lifecycle = lifecycle.clone();
        let id = created.intent_id.clone();
        tokio::spawn(async move { lifecycle.confirm(&id).await })
    };
    let webhook = {
        let ingestor = ingestor.clone();
        tokio::spawn(async move { ingestor.handle(&payload, &header).await })
    };

    confirm.await.unwrap().unwrap();
    webhook.await.unwrap().unwrap();

    // Both attempted pending -> succeeded; the record settles in one
    // terminal state either way.
    let record = lifecycle
        .store()
        .find_by_intent(&created.intent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, PaymentStatus::Succeeded);
}

#[tokio::test]
async fn operations_on_distinct_intents_are_independent() {
    let (lifecycle, _) = setup();

    let a = lifecycle.create(payment_for("user-a")).await.unwrap();
    let b = lifecycle.create(payment_for("user-b")).await.unwrap();
    assert_ne!(a.intent_id, b.intent_id);

    lifecycle.confirm(&a.intent_id).await.unwrap();

    let record_a = lifecycle
        .store()
        .find_by_intent(&a.intent_id)
        .await
        .unwrap()
        .unwrap();
    let record_b = lifecycle
        .store()
        .find_by_intent(&b.intent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record_a.status, PaymentStatus::Succeeded);
    assert_eq!(record_b.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn orphan_intent_confirm_reports_and_stores_nothing() {
    let (lifecycle, _) = setup();

    let handle = lifecycle
        .processor()
        .create_intent(2500, "eur", "pm_9")
        .await
        .unwrap();

    let outcome = lifecycle.confirm(&handle.id).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Confirmed { .. }));
    assert!(
        lifecycle
            .store()
            .find_by_intent(&handle.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn refund_of_pending_intent_never_reaches_refund_call() {
    let (lifecycle, _) = setup();
    let created = lifecycle.create(payment_for("user-5")).await.unwrap();

    let result = lifecycle.refund(&created.intent_id).await;
    assert!(result.is_err());
    assert_eq!(lifecycle.processor().refund_count(), 0);
}

#[tokio::test]
async fn unknown_refund_target_is_not_found() {
    let (lifecycle, _) = setup();
    let err = lifecycle
        .refund(&IntentId::new("pi_nowhere"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}
