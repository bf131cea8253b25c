mod common;

use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use caminar_api::auth::SessionKey;

use common::{TestApp, PASSWORD};

#[tokio::test]
async fn no_session_redirects_to_business_login() -> Result<()> {
    let app = TestApp::new()?;

    let res = app.get("/business/dashboard/profile", None).await?;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/business/login"));
    assert_eq!(res.body["code"], "NOT_AUTHENTICATED");
    Ok(())
}

#[tokio::test]
async fn pending_business_reaches_its_dashboard() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.business_owner("owner@cafe.ar", Some("pending"));

    let login = app
        .post_json("/business/login", json!({ "email": "owner@cafe.ar", "password": PASSWORD }), None)
        .await?;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["data"]["redirect"], "/business/dashboard");
    let cookie = login.session_cookie().expect("session cookie");

    let res = app.get("/business/dashboard/profile", Some(&cookie)).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["status"], "pending");
    assert_eq!(res.body["data"]["auth_user_id"], owner.to_string());
    assert_eq!(res.body["data"]["name"], "Café del Cerro");
    Ok(())
}

#[tokio::test]
async fn suspended_business_cannot_sign_in() -> Result<()> {
    let app = TestApp::new()?;
    app.business_owner("owner@cafe.ar", Some("suspended"));

    let res = app
        .post_json("/business/login", json!({ "email": "owner@cafe.ar", "password": PASSWORD }), None)
        .await?;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["code"], "ACCESS_DENIED");
    assert!(res.session_cookie().is_none());
    Ok(())
}

#[tokio::test]
async fn business_with_unset_status_is_denied() -> Result<()> {
    let app = TestApp::new()?;
    app.business_owner("owner@cafe.ar", None);

    let res = app
        .post_json("/business/login", json!({ "email": "owner@cafe.ar", "password": PASSWORD }), None)
        .await?;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_session_does_not_open_business_dashboard() -> Result<()> {
    let app = TestApp::new()?;
    app.admin("ana@caminar.ar", Some("active"));
    let cookie = app.login("/admin/login", "ana@caminar.ar").await?;

    let res = app.get("/business/dashboard/profile", Some(&cookie)).await?;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/business/login"));
    assert_eq!(res.body["code"], "ACCESS_DENIED");
    Ok(())
}

#[tokio::test]
async fn logout_ends_access_and_unmounts_contexts() -> Result<()> {
    let app = TestApp::new()?;
    app.business_owner("owner@cafe.ar", Some("active"));
    let cookie = app.login("/business/login", "owner@cafe.ar").await?;

    let res = app.get("/business/dashboard/profile", Some(&cookie)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.state.contexts.mounted().await, 1);

    let logout = app.post_json("/auth/logout", json!({}), Some(&cookie)).await?;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["data"]["signed_out"], true);
    assert!(logout.session_cookie().is_none());
    assert_eq!(app.state.contexts.mounted().await, 0);

    let res = app.get("/business/dashboard/profile", Some(&cookie)).await?;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/business/login"));
    assert_eq!(res.body["code"], "NOT_AUTHENTICATED");
    Ok(())
}

#[tokio::test]
async fn business_context_clears_on_logout() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.business_owner("owner@cafe.ar", Some("active"));
    let cookie = app.login("/business/login", "owner@cafe.ar").await?;

    let me = app.get("/business/dashboard/me", Some(&cookie)).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["loading"], false);
    assert_eq!(me.body["data"]["record"]["auth_user_id"], owner.to_string());

    let key = SessionKey::parse(cookie.trim_start_matches("caminar_session=")).expect("session key");
    let context = app.state.contexts.mounted_business(key).await.expect("mounted context");
    let mut rx = context.subscribe();
    assert!(rx.borrow_and_update().record.is_some());

    let logout = app.post_json("/auth/logout", json!({}), Some(&cookie)).await?;
    assert_eq!(logout.status, StatusCode::OK);

    let cleared = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.record.is_none()))
        .await?
        .is_ok();
    assert!(cleared);
    assert!(app.state.contexts.mounted_business(key).await.is_none());

    let res = app.get("/business/dashboard/me", Some(&cookie)).await?;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/business/login"));
    Ok(())
}

#[tokio::test]
async fn revoked_identity_is_signed_out() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.business_owner("owner@cafe.ar", Some("active"));
    let cookie = app.login("/business/login", "owner@cafe.ar").await?;

    app.auth.revoke_user(owner);
    let res = app.get("/business/dashboard/profile", Some(&cookie)).await?;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.body["code"], "NOT_AUTHENTICATED");
    Ok(())
}

#[tokio::test]
async fn refresh_keeps_the_session_usable() -> Result<()> {
    let app = TestApp::new()?;
    app.business_owner("owner@cafe.ar", Some("active"));
    let cookie = app.login("/business/login", "owner@cafe.ar").await?;

    let res = app.post_json("/auth/refresh", json!({}), Some(&cookie)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["user"]["email"], "owner@cafe.ar");
    assert_eq!(res.session_cookie().as_deref(), Some(cookie.as_str()));

    let res = app.get("/business/dashboard/profile", Some(&cookie)).await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}
