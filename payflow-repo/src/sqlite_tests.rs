//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use payflow_types::{
        GatewayConfig, Payment, PaymentId, PaymentRepository, PaymentStatus, RepoError,
        StatusFacts, Token, TokenHash,
    };
    use serde_json::{Map, json};

    use crate::SqliteRepo;
    use crate::security::generate_token_hash;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn capture_token(payment: &PaymentId) -> Token {
        let hash = generate_token_hash();
        let target = format!("http://localhost/payment/capture/{}", hash);
        Token::new(hash, "paypal", payment.clone(), target)
            .with_after_url(Some("http://shop.test/done".into()))
    }

    fn details() -> Map<String, serde_json::Value> {
        match json!({"meta": {"name": "paypal"}, "payment": {"amount": 10}}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tokens
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_insert_and_find_token() {
        let repo = setup_repo().await;
        let token = capture_token(&PaymentId::new("p-1"))
            .with_gateway_name(Some("FooGateway".into()));

        repo.insert_token(&token).await.unwrap();
        let found = repo.find_token(&token.hash).await.unwrap().unwrap();

        assert_eq!(found.hash, token.hash);
        assert_eq!(found.details, PaymentId::new("p-1"));
        assert_eq!(found.after_url.as_deref(), Some("http://shop.test/done"));
        assert_eq!(found.gateway_name.as_deref(), Some("FooGateway"));
    }

    #[tokio::test]
    async fn test_find_token_does_not_consume() {
        let repo = setup_repo().await;
        let token = capture_token(&PaymentId::new("p-1"));
        repo.insert_token(&token).await.unwrap();

        repo.find_token(&token.hash).await.unwrap();

        assert!(repo.find_token(&token.hash).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_claim_token_is_single_use() {
        let repo = setup_repo().await;
        let token = capture_token(&PaymentId::new("p-1"));
        repo.insert_token(&token).await.unwrap();

        let first = repo.claim_token(&token.hash).await.unwrap();
        let second = repo.claim_token(&token.hash).await.unwrap();

        assert_eq!(first.map(|t| t.hash), Some(token.hash.clone()));
        assert!(second.is_none());
        assert!(repo.find_token(&token.hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_claims_single_winner() {
        let repo = Arc::new(setup_repo().await);
        let token = capture_token(&PaymentId::new("p-1"));
        repo.insert_token(&token).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = Arc::clone(&repo);
            let hash = token.hash.clone();
            handles.push(tokio::spawn(async move { repo.claim_token(&hash).await }));
        }

        let mut winners = 0;
        for handle in handles {
            if let Ok(Some(_)) = handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_duplicate_token_rejected() {
        let repo = setup_repo().await;
        let token = capture_token(&PaymentId::new("p-1"));
        repo.insert_token(&token).await.unwrap();

        let result = repo.insert_token(&token).await;

        assert!(matches!(result, Err(RepoError::DuplicateKey(_))));
    }

    #[tokio::test]
    async fn test_delete_token_is_idempotent() {
        let repo = setup_repo().await;
        let token = capture_token(&PaymentId::new("p-1"));
        repo.insert_token(&token).await.unwrap();

        assert!(repo.delete_token(&token.hash).await.unwrap());
        assert!(!repo.delete_token(&token.hash).await.unwrap());
        assert!(!repo.delete_token(&TokenHash::new("never-issued")).await.unwrap());
    }

    #[tokio::test]
    async fn test_released_token_can_be_claimed_again() {
        let repo = setup_repo().await;
        let token = capture_token(&PaymentId::new("p-1"));
        repo.insert_token(&token).await.unwrap();

        let claimed = repo.claim_token(&token.hash).await.unwrap().unwrap();
        repo.insert_token(&claimed).await.unwrap();

        assert!(repo.claim_token(&token.hash).await.unwrap().is_some());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_insert_payment_assigns_version() {
        let repo = setup_repo().await;
        let payment = Payment::with_details(PaymentId::generate(), details()).unwrap();
        assert!(!payment.is_persisted());

        let stored = repo.insert_payment(&payment).await.unwrap();

        assert!(stored.is_persisted());
        assert_eq!(stored.version, 1);

        let fetched = repo.find_payment(&payment.id).await.unwrap().unwrap();
        assert_eq!(fetched.details["payment"]["amount"], 10);
        assert_eq!(fetched.status(), PaymentStatus::Unknown);
        assert!(fetched.gateway_name.is_none());
    }

    #[tokio::test]
    async fn test_find_payment_not_found() {
        let repo = setup_repo().await;

        let result = repo.find_payment(&PaymentId::new("missing")).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_payment_persists_facts_and_gateway() {
        let repo = setup_repo().await;
        let payment = Payment::with_details(PaymentId::generate(), details()).unwrap();
        let mut stored = repo.insert_payment(&payment).await.unwrap();

        stored.gateway_name = Some("BarGateway".into());
        stored.mark(StatusFacts::CAPTURED);
        let updated = repo.update_payment(&stored).await.unwrap();

        assert_eq!(updated.version, 2);
        let fetched = repo.find_payment(&payment.id).await.unwrap().unwrap();
        assert_eq!(fetched.status(), PaymentStatus::Captured);
        assert_eq!(fetched.gateway_name.as_deref(), Some("BarGateway"));
        assert_eq!(fetched.version, 2);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let repo = setup_repo().await;
        let payment = Payment::with_details(PaymentId::generate(), details()).unwrap();
        let stored = repo.insert_payment(&payment).await.unwrap();

        let mut first = stored.clone();
        first.mark(StatusFacts::CAPTURED);
        repo.update_payment(&first).await.unwrap();

        let mut second = stored;
        second.mark(StatusFacts::FAILED);
        let result = repo.update_payment(&second).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
        let fetched = repo.find_payment(&payment.id).await.unwrap().unwrap();
        assert_eq!(fetched.status(), PaymentStatus::Captured);
    }

    #[tokio::test]
    async fn test_update_missing_payment_not_found() {
        let repo = setup_repo().await;
        let mut payment = Payment::new(PaymentId::new("ghost"));
        payment.version = 1;

        let result = repo.update_payment(&payment).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Gateway configs
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_gateway_configs_listed_in_insertion_order() {
        let repo = setup_repo().await;
        for name in ["FooGateway", "BarGateway", "AbcGateway"] {
            let config = GatewayConfig::new("offline", name, Map::new()).unwrap();
            repo.insert_gateway_config(&config).await.unwrap();
        }

        let names: Vec<String> = repo
            .list_gateway_configs()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.gateway_name)
            .collect();

        assert_eq!(names, vec!["FooGateway", "BarGateway", "AbcGateway"]);
    }

    #[tokio::test]
    async fn test_duplicate_gateway_name_rejected() {
        let repo = setup_repo().await;
        let first = GatewayConfig::new("offline", "FooGateway", Map::new()).unwrap();
        let second = GatewayConfig::new("hosted_checkout", "FooGateway", Map::new()).unwrap();
        repo.insert_gateway_config(&first).await.unwrap();

        let result = repo.insert_gateway_config(&second).await;

        assert!(matches!(result, Err(RepoError::DuplicateKey(key)) if key.contains("FooGateway")));
    }

    #[tokio::test]
    async fn test_find_gateway_config_round_trips_settings() {
        let repo = setup_repo().await;
        let mut settings = Map::new();
        settings.insert("checkout_url".into(), json!("https://checkout.test/pay"));
        let config = GatewayConfig::new("hosted_checkout", "Hosted", settings).unwrap();
        repo.insert_gateway_config(&config).await.unwrap();

        let found = repo.find_gateway_config("Hosted").await.unwrap().unwrap();

        assert_eq!(found.id, config.id);
        assert_eq!(found.setting("checkout_url"), Some("https://checkout.test/pay"));
        assert!(repo.find_gateway_config("Nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_gateway_config() {
        let repo = setup_repo().await;
        let config = GatewayConfig::new("offline", "FooGateway", Map::new()).unwrap();
        repo.insert_gateway_config(&config).await.unwrap();

        assert!(repo.delete_gateway_config("FooGateway").await.unwrap());
        assert!(!repo.delete_gateway_config("FooGateway").await.unwrap());
        assert!(repo.list_gateway_configs().await.unwrap().is_empty());
    }
}
