mod common;

use axum::http::StatusCode;
use pitchcraft::store::{MessageStore, Sender};
use tower::util::ServiceExt; // for `oneshot`

use common::{body_text, get, harness, location, post_form, session_cookie};

/// Signs up and logs in `email`, returning the session cookie.
async fn signed_in(app: &axum::Router, email: &str) -> String {
    let email = email.replace('@', "%40").replace('{', "%7B").replace('}', "%7D");
    let body = format!("email={email}&password=hunter22");
    app.clone().oneshot(post_form("/signup", &body, None)).await.unwrap();
    let response = app.clone().oneshot(post_form("/login", &body, None)).await.unwrap();
    session_cookie(&response).expect("login sets a session cookie")
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let h = harness().await;

    let response = h.app.oneshot(get("/nope/nothing-here", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Oops! Page Not Found"));
    assert!(body.contains(r#"href="/""#));
}

#[tokio::test]
async fn entry_pages_render_for_anonymous_users() {
    let h = harness().await;

    for (path, heading) in [("/", "Welcome Back"), ("/login", "Welcome Back"), ("/signup", "Create Account")] {
        let response = h.app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(body_text(response).await.contains(heading), "{path}");
    }
}

#[tokio::test]
async fn anonymous_dashboard_redirects_to_login() {
    let h = harness().await;

    for path in ["/dashboard", "/dashboard/ws"] {
        let response = h.app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/login"));
    }

    let response = h.app.oneshot(post_form("/dashboard", "text=hi", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(h.store.list_ordered("uid-nobody").await.unwrap().len(), 0);
}

#[tokio::test]
async fn blank_submissions_never_reach_the_identity_provider() {
    let h = harness().await;

    let blanks = ["", "email=&password=", "email=%20%20&password=hunter22", "email=a%40b.c&password=%20%09", "password=hunter22"];
    for body in blanks {
        let response = h.app.clone().oneshot(post_form("/login", body, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Please fill in all fields!"), "login {body:?}");

        let response = h.app.clone().oneshot(post_form("/signup", body, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Please fill out all fields"), "signup {body:?}");
    }

    assert_eq!(h.identity.calls(), 0);
}

#[tokio::test]
async fn provider_errors_are_translated() {
    let h = harness().await;

    let response = h.app.clone().oneshot(post_form("/signup", "email=a%40b.c&password=123", None)).await.unwrap();
    assert!(body_text(response).await.contains("Password should be at least 6 characters."));

    h.app.clone().oneshot(post_form("/signup", "email=a%40b.c&password=hunter22", None)).await.unwrap();
    let response = h.app.clone().oneshot(post_form("/signup", "email=a%40b.c&password=hunter22", None)).await.unwrap();
    assert!(body_text(response).await.contains("Email already in use. Try logging in."));

    let response = h.app.clone().oneshot(post_form("/login", "email=a%40b.c&password=wrong1", None)).await.unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Invalid email or password."));
    assert!(body.contains(r#"value="a@b.c""#));
}

#[tokio::test]
async fn unknown_provider_codes_show_only_the_generic_message() {
    let h = harness().await;

    let response = h.app.oneshot(post_form("/signup", "email=quota%40b.c&password=hunter22", None)).await.unwrap();
    let body = body_text(response).await;

    assert!(body.contains("Sign-up failed. Please try again."));
    assert!(!body.contains("QUOTA_EXCEEDED"));
}

#[tokio::test]
async fn existing_session_skips_the_entry_pages() {
    let h = harness().await;
    let cookie = signed_in(&h.app, "ada@example.com").await;
    let calls = h.identity.calls();

    for path in ["/", "/login", "/signup"] {
        let response = h.app.clone().oneshot(get(path, Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/dashboard"));
    }

    let response = h.app.clone().oneshot(post_form("/login", "email=x%40y.z&password=hunter22", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), Some("/dashboard"));
    assert_eq!(h.identity.calls(), calls);
}

#[tokio::test]
async fn sign_up_log_in_and_pitch() {
    let h = harness().await;
    let credentials = "email=ada%40example.com&password=hunter22";

    let response = h.app.clone().oneshot(post_form("/signup", credentials, None)).await.unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Sign-up successful!"));
    assert!(body.contains(r#"data-redirect="/login""#));

    let response = h.app.clone().oneshot(post_form("/login", credentials, None)).await.unwrap();
    let cookie = session_cookie(&response).unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Login successful!"));
    assert!(body.contains(r#"data-redirect="/dashboard""#));
    assert!(body.contains(r#"data-delay="800""#));

    let response = h.app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No chats yet. Start typing below!"));

    let response = h.app.clone().oneshot(post_form("/dashboard", "text=coffee+delivery+app", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard"));

    let response = h.app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    let body = body_text(response).await;
    assert!(body.contains("coffee delivery app"));
    for heading in ["Name", "Tagline", "Pitch", "Target Audience", "Landing Copy"] {
        assert!(body.contains(&format!("<h2>{heading}</h2>")), "{heading}");
    }
    assert!(body.find("coffee delivery app").unwrap() < body.find("<h2>Name</h2>").unwrap());

    let history = h.store.list_ordered("uid-ada@example.com").await.unwrap();
    let senders: Vec<_> = history.iter().map(|m| m.sender).collect();
    assert_eq!(senders, vec![Sender::User, Sender::Ai]);
}

#[tokio::test]
async fn failed_generation_shows_fallback_reply() {
    let h = harness().await;
    let cookie = signed_in(&h.app, "bob@example.com").await;

    h.app.clone().oneshot(post_form("/dashboard", "text=fail+please", Some(&cookie))).await.unwrap();

    let history = h.store.list_ordered("uid-bob@example.com").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[1].sender, Sender::Ai);
    assert_eq!(history[1].text, "⚠️ Something went wrong! Please try again.");

    let body = body_text(h.app.oneshot(get("/dashboard", Some(&cookie))).await.unwrap()).await;
    assert!(body.contains("Something went wrong! Please try again."));
    assert!(!body.contains("internal"));
}

#[tokio::test]
async fn blank_chat_send_persists_nothing() {
    let h = harness().await;
    let cookie = signed_in(&h.app, "cy@example.com").await;

    let response = h.app.oneshot(post_form("/dashboard", "text=%20%20", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(h.store.list_ordered("uid-cy@example.com").await.unwrap().is_empty());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let h = harness().await;
    let cookie = signed_in(&h.app, "dee@example.com").await;

    let response = h.app.clone().oneshot(post_form("/logout", "", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = h.app.oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn failed_logout_keeps_the_user_on_the_dashboard() {
    let h = harness().await;
    let cookie = signed_in(&h.app, "stuck@example.com").await;

    let response = h.app.clone().oneshot(post_form("/logout", "", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard"));

    let response = h.app.oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Error logging out!"));
}

#[tokio::test]
async fn display_name_cannot_fill_page_placeholders() {
    let h = harness().await;
    let cookie = signed_in(&h.app, "{messages}@example.com").await;

    let body = body_text(h.app.oneshot(get("/dashboard", Some(&cookie))).await.unwrap()).await;

    assert!(body.contains("&#123;messages&#125;@example.com"));
    assert_eq!(body.matches("No chats yet").count(), 1);
}

#[tokio::test]
async fn unconfigured_google_sign_in_reports_failure() {
    let h = harness().await;

    let response = h.app.clone().oneshot(get("/login/google", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    let cookie = session_cookie(&response).unwrap();

    let body = body_text(h.app.clone().oneshot(get("/login", Some(&cookie))).await.unwrap()).await;
    assert!(body.contains("Google sign-in failed. Try again."));

    // shown once
    let body = body_text(h.app.oneshot(get("/login", Some(&cookie))).await.unwrap()).await;
    assert!(!body.contains("Google sign-in failed. Try again."));
}

#[tokio::test]
async fn oauth_callback_without_state_fails_cleanly() {
    let h = harness().await;

    let response = h.app.oneshot(get("/lockin/google?code=abc", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert_eq!(h.identity.calls(), 0);
}

#[tokio::test]
async fn static_assets_are_served() {
    let h = harness().await;

    let response = h.app.clone().oneshot(get("/static/dashboard.js", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"].to_str().unwrap().starts_with("text/javascript"));

    let response = h.app.oneshot(get("/static/secrets.env", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
