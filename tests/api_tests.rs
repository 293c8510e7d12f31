// tests/api_tests.rs

use arduino_course_backend::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
///
/// Requires a running Postgres reachable through DATABASE_URL; when the
/// variable is unset the caller should skip the test.
async fn spawn_app() -> Option<String> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping API test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        frontend_origin: "http://localhost:3000".to_string(),
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(address)
}

/// Registers a fresh user and logs in. Returns (bearer token, user id).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (String, i64) {
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let register_resp = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": email,
            "name": "Test User",
            "password": password
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(register_resp.status().as_u16(), 201);
    let body: serde_json::Value = register_resp.json().await.unwrap();
    let user_id = body["data"]["id"].as_i64().expect("user id missing");

    let login_body: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");
    let token = login_body["data"]["token"]
        .as_str()
        .expect("token missing")
        .to_string();

    (token, user_id)
}

#[tokio::test]
async fn health_check_works() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_does_not_leak_password() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": email,
            "name": "Test User",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], email);
    assert!(body["data"]["password"].is_null());
}

#[tokio::test]
async fn register_fails_validation() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    // Act: not an email address
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": "not-an-email",
            "name": "Test User",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let payload = serde_json::json!({
        "email": email,
        "name": "Test User",
        "password": "password123"
    });

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": email,
            "name": "Test User",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn me_returns_current_user() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (token, user_id) = register_and_login(&client, &address).await;

    let body: serde_json::Value = client
        .get(format!("{}/api/auth/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"].as_i64(), Some(user_id));
}

#[tokio::test]
async fn progress_routes_require_auth() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/progress/day01/activity", address))
        .json(&serde_json::json!({ "activityId": "blink-led" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn invalid_lesson_id_is_rejected() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address).await;

    for bad_id in ["day00", "day31", "day1", "dayXX"] {
        let response = client
            .post(format!("{}/api/progress/{}/activity", address, bad_id))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({ "activityId": "blink-led" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400, "lesson id {} was accepted", bad_id);
    }
}

#[tokio::test]
async fn completing_an_activity_twice_stores_it_once() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (token, user_id) = register_and_login(&client, &address).await;

    for _ in 0..2 {
        let response = client
            .post(format!("{}/api/progress/day01/activity", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({ "activityId": "blink-led" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let body: serde_json::Value = client
        .get(format!("{}/api/progress/{}", address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["lessonId"], "day01");
    assert_eq!(
        records[0]["completedActivities"],
        serde_json::json!(["blink-led"])
    );
}

#[tokio::test]
async fn eleven_snapshots_keep_the_last_ten() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (token, user_id) = register_and_login(&client, &address).await;

    for i in 1..=11 {
        let response = client
            .post(format!("{}/api/progress/day02/code", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({
                "code": format!("// revision {}", i),
                "editorId": "editor-1"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let body: serde_json::Value = client
        .get(format!("{}/api/progress/{}", address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let snapshots = body["data"][0]["codeSnapshots"].as_array().unwrap();
    assert_eq!(snapshots.len(), 10);
    assert_eq!(snapshots[0]["code"], "// revision 2");
    assert_eq!(snapshots[9]["code"], "// revision 11");
}

#[tokio::test]
async fn resubmitted_question_keeps_only_the_latest_answer() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (token, user_id) = register_and_login(&client, &address).await;

    let first = client
        .post(format!("{}/api/progress/day03/quiz", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "answers": [
                { "questionId": "q1", "answer": "B", "correct": false },
                { "questionId": "q2", "answer": "C", "correct": true }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 200);

    let second = client
        .post(format!("{}/api/progress/day03/quiz", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "answers": [
                { "questionId": "q1", "answer": "A", "correct": true }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 200);

    let body: serde_json::Value = client
        .get(format!("{}/api/progress/{}", address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let scores = body["data"][0]["quizScores"].as_array().unwrap();
    assert_eq!(scores.len(), 2);
    let q1 = scores
        .iter()
        .find(|s| s["questionId"] == "q1")
        .expect("q1 missing");
    assert_eq!(q1["correct"], true);
    assert_eq!(q1["answer"], "A");
}

#[tokio::test]
async fn watching_a_video_is_idempotent_per_url() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (token, user_id) = register_and_login(&client, &address).await;

    for _ in 0..2 {
        let response = client
            .post(format!("{}/api/progress/day04/video", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({
                "videoUrl": "https://www.youtube.com/watch?v=abc123"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let body: serde_json::Value = client
        .get(format!("{}/api/progress/{}", address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let videos = body["data"][0]["watchedVideos"].as_array().unwrap();
    assert_eq!(videos.len(), 1);
}

#[tokio::test]
async fn analytics_overview_reflects_progress() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (token, user_id) = register_and_login(&client, &address).await;

    // Complete day06 (twice, to confirm idempotence) and submit two quizzes
    // scoring 0% and 100%.
    for _ in 0..2 {
        let response = client
            .put(format!("{}/api/progress/day06/complete", address))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    client
        .post(format!("{}/api/progress/day06/quiz", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "answers": [{ "questionId": "q1", "answer": "B", "correct": false }]
        }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/api/progress/day06/quiz", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "answers": [{ "questionId": "q1", "answer": "A", "correct": true }]
        }))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = client
        .get(format!("{}/api/analytics/{}/overview", address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let data = &body["data"];
    assert_eq!(data["totalLessons"], 30);
    assert_eq!(data["completedLessons"], 1);
    assert_eq!(data["completionPercentage"], 3); // round(1/30*100)
    assert_eq!(data["averageQuizScore"], 50); // mean of 0% and 100%
    assert_eq!(data["currentStreak"], 1); // activity today only

    let recent = data["recentActivity"].as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["lessonId"], "day06");
    assert_eq!(recent[0]["completed"], true);

    let categories = data["progressByCategory"].as_array().unwrap();
    let foundation = categories
        .iter()
        .find(|c| c["name"] == "Foundation")
        .unwrap();
    let sensors = categories
        .iter()
        .find(|c| c["name"] == "Environmental Sensors")
        .unwrap();
    assert_eq!(foundation["completed"], 0);
    assert_eq!(sensors["completed"], 1);
    assert_eq!(sensors["percentage"], 25);
}

#[tokio::test]
async fn cross_user_reads_are_forbidden() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address).await;
    let (_, other_user_id) = register_and_login(&client, &address).await;

    let progress = client
        .get(format!("{}/api/progress/{}", address, other_user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(progress.status().as_u16(), 403);

    let analytics = client
        .get(format!("{}/api/analytics/{}/overview", address, other_user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(analytics.status().as_u16(), 403);
}

#[tokio::test]
async fn lessons_metadata_endpoints() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let list: serde_json::Value = client
        .get(format!("{}/api/lessons", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["success"], true);
    assert_eq!(list["data"]["totalLessons"], 30);

    let lesson: serde_json::Value = client
        .get(format!("{}/api/lessons/day07", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(lesson["data"]["lessonId"], "day07");

    let bad = client
        .get(format!("{}/api/lessons/day99", address))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);
}
