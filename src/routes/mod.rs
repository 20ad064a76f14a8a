pub mod error;
pub mod health;
pub mod playlist;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_mb * 1024 * 1024;
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/live", get(health::live))
        // Account endpoints
        .route("/api/register", post(session::register))
        .route("/api/login", post(session::login))
        .route("/api/check-auth", get(session::check_auth))
        .route("/api/logout", post(session::logout))
        // Playlist endpoints
        .route("/api/upload-m3u", post(playlist::upload_m3u))
        .route(
            "/api/xtream-playlist",
            post(playlist::create_xtream_playlist),
        )
        .route("/api/playlists", get(playlist::list_playlists))
        .route("/api/playlist/:id", get(playlist::get_playlist))
        .route("/api/download/:id", get(playlist::download_playlist))
        // Web UI
        .fallback_service(static_files)
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body, Bytes},
        extract::Query,
        http::{header, HeaderMap, Request, StatusCode},
        response::IntoResponse,
        Json,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "XSTREAMBOUNDARY";

    const SAMPLE: &str = "#EXTM3U\n#EXTINF:-1 tvg-id=\"1\" tvg-name=\"News\" tvg-logo=\"logo.png\" group-title=\"News\",News Channel\nhttp://example.com/stream1\n";

    fn test_app() -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            port: 0,
            node_env: "test".to_string(),
            base_url: "http://localhost:3000".to_string(),
            static_dir: dir.path().join("public"),
            upload_dir: dir.path().join("uploads"),
            max_upload_mb: 1,
            xtream_api_base: "http://api.local".to_string(),
            session_ttl_seconds: 3600,
            fetch_timeout_ms: 2000,
            user_agent: "test".to_string(),
        };
        let state = AppState::in_memory(config, reqwest::Client::new());
        (router(Arc::new(state)), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body)
    }

    fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn upload_request(cookie: Option<&str>, file_name: &str, name: Option<&str>, content: &str) -> Request<Body> {
        let mut body = String::new();
        if let Some(name) = name {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"m3uFile\"; filename=\"{file_name}\"\r\nContent-Type: audio/x-mpegurl\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        ));

        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/upload-m3u")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn session_cookie(headers: &HeaderMap) -> String {
        headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string()
    }

    fn parse(body: &Bytes) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    async fn register(app: &Router, username: &str) -> String {
        let (status, headers, _) = send(
            app,
            json_request(
                "POST",
                "/api/register",
                None,
                json!({ "username": username, "password": "secret" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        session_cookie(&headers)
    }

    #[tokio::test]
    async fn test_register_login_logout() {
        let (app, _dir) = test_app();

        let cookie = register(&app, "alice").await;
        assert!(cookie.starts_with("sid="));

        let (_, _, body) = send(&app, get_request("/api/check-auth", Some(&cookie))).await;
        assert_eq!(parse(&body), json!({ "authenticated": true, "username": "alice" }));

        let (status, _, _) = send(
            &app,
            json_request("POST", "/api/register", None, json!({ "username": "alice", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, body) = send(
            &app,
            json_request("POST", "/api/login", None, json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(parse(&body)["error"], "Invalid username or password");

        let (status, headers, _) = send(
            &app,
            json_request("POST", "/api/login", None, json!({ "username": "alice", "password": "secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let second = session_cookie(&headers);

        let (status, _, _) = send(&app, json_request("POST", "/api/logout", Some(&second), json!({}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, body) = send(&app, get_request("/api/check-auth", Some(&second))).await;
        assert_eq!(parse(&body), json!({ "authenticated": false }));

        // The first session is independent of the one that logged out
        let (_, _, body) = send(&app, get_request("/api/check-auth", Some(&cookie))).await;
        assert_eq!(parse(&body)["authenticated"], true);
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let (app, _dir) = test_app();

        let (status, _, body) = send(
            &app,
            json_request("POST", "/api/register", None, json!({ "username": "bob" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(parse(&body)["error"], "Username and password are required");
    }

    #[tokio::test]
    async fn test_playlist_routes_require_session() {
        let (app, _dir) = test_app();

        for uri in ["/api/playlists", "/api/playlist/x", "/api/download/x"] {
            let (status, _, body) = send(&app, get_request(uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(parse(&body)["error"], "Unauthorized");
        }

        let (status, _, _) = send(&app, upload_request(None, "a.m3u", None, SAMPLE)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(
            &app,
            get_request("/api/playlists", Some("sid=not-a-uuid")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_list_get_download() {
        let (app, _dir) = test_app();
        let cookie = register(&app, "alice").await;

        let (status, _, body) = send(&app, upload_request(Some(&cookie), "news.m3u", None, SAMPLE)).await;
        assert_eq!(status, StatusCode::OK);
        let created = parse(&body);
        assert_eq!(created["channelCount"], 1);
        let id = created["playlistId"].as_str().unwrap().to_string();
        assert_eq!(
            created["playlistUrl"],
            format!("http://localhost:3000/api/download/{}", id)
        );
        let api_url = created["xtreamApiUrl"].as_str().unwrap();
        assert!(api_url.starts_with("http://api.local/api/xtream?username=alice&password=defaultPass&channels="));

        let (_, _, body) = send(&app, get_request("/api/playlists", Some(&cookie))).await;
        assert_eq!(parse(&body), json!([{ "id": id, "name": "news", "channelCount": 1 }]));

        let (status, _, body) = send(&app, get_request(&format!("/api/playlist/{}", id), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        let playlist = parse(&body);
        assert_eq!(
            playlist["channels"][0],
            json!({
                "duration": "-1",
                "tvgId": "1",
                "tvgName": "News",
                "tvgLogo": "logo.png",
                "groupTitle": "News",
                "title": "News Channel",
                "url": "http://example.com/stream1"
            })
        );
        assert_eq!(playlist["source"]["type"], "upload");

        let (status, headers, body) = send(&app, get_request(&format!("/api/download/{}", id), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "audio/x-mpegurl");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"news.m3u\""));
        assert_eq!(&body[..], SAMPLE.as_bytes());

        // Another user sees nothing
        let other = register(&app, "bob").await;
        let (status, _, _) = send(&app, get_request(&format!("/api/playlist/{}", id), Some(&other))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, _, body) = send(&app, get_request("/api/playlists", Some(&other))).await;
        assert_eq!(parse(&body), json!([]));
    }

    #[tokio::test]
    async fn test_upload_uses_given_name() {
        let (app, _dir) = test_app();
        let cookie = register(&app, "alice").await;

        let (status, _, _) = send(
            &app,
            upload_request(Some(&cookie), "x.M3U", Some("  Favourites "), SAMPLE),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, body) = send(&app, get_request("/api/playlists", Some(&cookie))).await;
        assert_eq!(parse(&body)[0]["name"], "Favourites");
    }

    #[tokio::test]
    async fn test_upload_rejects_other_extensions() {
        let (app, _dir) = test_app();
        let cookie = register(&app, "alice").await;

        let (status, _, body) = send(&app, upload_request(Some(&cookie), "list.txt", None, SAMPLE)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(parse(&body)["error"], "Only .m3u files are allowed");
    }

    #[tokio::test]
    async fn test_xtream_playlist_validation_and_provider_failure() {
        let (app, _dir) = test_app();
        let cookie = register(&app, "alice").await;

        let (status, _, _) = send(
            &app,
            json_request("POST", "/api/xtream-playlist", Some(&cookie), json!({ "apiUrl": "http://x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &app,
            json_request(
                "POST",
                "/api/xtream-playlist",
                Some(&cookie),
                json!({ "apiUrl": "http://127.0.0.1:1", "username": "u", "password": "p" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    /// Serve a fake `player_api.php` on a random local port
    async fn spawn_provider(auth: i64, categories_ok: bool) -> String {
        let provider = Router::new().route(
            "/player_api.php",
            get(move |Query(params): Query<HashMap<String, String>>| async move {
                match params.get("action").map(String::as_str) {
                    None => Json(json!({
                        "user_info": { "auth": auth, "status": "Active", "max_connections": 1 },
                        "server_info": { "port": 8080 }
                    }))
                    .into_response(),
                    Some("get_live_streams") => Json(json!([
                        {
                            "num": 1,
                            "name": "One, Two",
                            "stream_id": 1,
                            "stream_icon": "http://logo/1.png",
                            "epg_channel_id": "one.tv",
                            "category_id": "1"
                        },
                        { "name": "Second", "stream_id": "2", "category_id": 2 }
                    ]))
                    .into_response(),
                    Some("get_live_categories") if categories_ok => Json(json!([
                        { "category_id": "1", "category_name": "Sports" },
                        { "category_id": 2, "category_name": "News" }
                    ]))
                    .into_response(),
                    _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, provider).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn xtream_request(cookie: &str, server: &str) -> Request<Body> {
        json_request(
            "POST",
            "/api/xtream-playlist",
            Some(cookie),
            json!({ "apiUrl": format!("{server}/"), "username": "u", "password": "p" }),
        )
    }

    #[tokio::test]
    async fn test_xtream_playlist_from_provider() {
        let (app, dir) = test_app();
        let cookie = register(&app, "alice").await;
        let server = spawn_provider(1, true).await;

        let (status, _, body) = send(&app, xtream_request(&cookie, &server)).await;
        assert_eq!(status, StatusCode::OK);
        let created = parse(&body);
        assert_eq!(created["channelCount"], 2);
        let id = created["playlistId"].as_str().unwrap().to_string();

        let (status, _, body) = send(&app, get_request(&format!("/api/playlist/{id}"), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        let playlist = parse(&body);
        assert!(playlist["name"].as_str().unwrap().starts_with("Xtream Playlist ("));
        assert_eq!(playlist["source"]["type"], "xtream");

        let channels = playlist["channels"].as_array().unwrap();
        assert_eq!(channels[0]["title"], "One, Two");
        assert_eq!(channels[0]["tvgName"], "One, Two");
        assert_eq!(channels[0]["tvgId"], "one.tv");
        assert_eq!(channels[0]["tvgLogo"], "http://logo/1.png");
        assert_eq!(channels[0]["groupTitle"], "Sports");
        assert_eq!(channels[0]["url"], format!("{server}/u/p/1"));
        assert_eq!(channels[1]["groupTitle"], "News");
        assert_eq!(channels[1]["url"], format!("{server}/u/p/2"));

        let stored: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(stored.len(), 1);
        let file_name = stored[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("xtream-"));
        let content = std::fs::read_to_string(&stored[0]).unwrap();
        assert!(content.starts_with("#EXTM3U\n"));
        assert!(content.contains("group-title=\"Sports\",One, Two\n"));

        let (status, _, body) = send(&app, get_request(&format!("/api/download/{id}"), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), content);
    }

    #[tokio::test]
    async fn test_xtream_playlist_without_categories() {
        let (app, _dir) = test_app();
        let cookie = register(&app, "alice").await;
        let server = spawn_provider(1, false).await;

        let (status, _, body) = send(&app, xtream_request(&cookie, &server)).await;
        assert_eq!(status, StatusCode::OK);
        let id = parse(&body)["playlistId"].as_str().unwrap().to_string();

        let (_, _, body) = send(&app, get_request(&format!("/api/playlist/{id}"), Some(&cookie))).await;
        let playlist = parse(&body);
        let channels = playlist["channels"].as_array().unwrap();
        assert_eq!(channels.len(), 2);
        assert!(channels.iter().all(|c| c["groupTitle"] == ""));
    }

    #[tokio::test]
    async fn test_xtream_playlist_rejected_credentials() {
        let (app, _dir) = test_app();
        let cookie = register(&app, "alice").await;
        let server = spawn_provider(0, true).await;

        let (status, _, body) = send(&app, xtream_request(&cookie, &server)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(parse(&body)["error"].is_string());

        let (_, _, body) = send(&app, get_request("/api/playlists", Some(&cookie))).await;
        assert_eq!(parse(&body), json!([]));
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = test_app();
        register(&app, "alice").await;

        let (status, _, body) = send(&app, get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        let health = parse(&body);
        assert_eq!(health["status"], "ok");
        assert_eq!(health["users"], 1);
        assert_eq!(health["playlists"], 0);

        let (status, _, _) = send(&app, get_request("/live", None)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
