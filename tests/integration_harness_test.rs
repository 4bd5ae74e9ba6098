mod common;

use axum::http::StatusCode;
use common::{auth_request, create_test_user, login_user, parse_body, setup_test_app};

#[tokio::test]
async fn fixtures_bootstrap_auth() -> anyhow::Result<()> {
    let test_app = setup_test_app().await?;

    let user1_id = create_test_user(&test_app.state, "first@example.com", "password123").await?;
    let user2_id = create_test_user(&test_app.state, "second@example.com", "password456").await?;
    assert_ne!(user1_id, user2_id);

    let token1 = login_user(&test_app.router, "first@example.com", "password123").await?;
    let token2 = login_user(&test_app.router, "second@example.com", "password456").await?;

    let (status1, body1) = auth_request(&test_app.router, "GET", "/user", &token1).await?;
    assert_eq!(status1, StatusCode::OK);
    assert_eq!(parse_body(&body1)?["id"], user1_id);

    let (status2, body2) = auth_request(&test_app.router, "GET", "/user", &token2).await?;
    assert_eq!(status2, StatusCode::OK);
    assert_eq!(parse_body(&body2)?["id"], user2_id);

    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() -> anyhow::Result<()> {
    let test_app = setup_test_app().await?;

    for uri in ["/user", "/client", "/record", "/home", "/client/1", "/record/1"] {
        let (status, body) = auth_request(&test_app.router, "GET", uri, "").await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "GET {uri} without token");
        assert_eq!(parse_body(&body)?["message"], "Unauthorized!");
    }

    let (status, _) = auth_request(&test_app.router, "GET", "/user", "garbage.token.value").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn token_of_deleted_user_is_rejected() -> anyhow::Result<()> {
    let test_app = setup_test_app().await?;
    create_test_user(&test_app.state, "gone@example.com", "password123").await?;
    let token = login_user(&test_app.router, "gone@example.com", "password123").await?;

    let (status, _) = auth_request(&test_app.router, "DELETE", "/user", &token).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = auth_request(&test_app.router, "GET", "/user", &token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
