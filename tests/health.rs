use food_platform_api::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    let body = serde_json::to_value(&response.0).unwrap();

    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "ok");
    assert!(body.get("total").is_none());
}
