mod common;

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::{serve, RequestLog};
use futures::TryStreamExt;
use serde_json::json;
use std::collections::HashMap;
use tracklift::{
    apple_music::{AppleMusicClient, AppleMusicClientBuilder},
    error::CatalogError,
    AccessToken, SourceCatalog,
};

async fn playlist_tracks(
    State(log): State<RequestLog>,
    Path((storefront, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let offset = params.get("offset").cloned().unwrap_or_else(|| "0".to_string());
    log.push(format!(
        "{storefront} {id} limit={} offset={offset} auth={bearer}",
        params.get("limit").cloned().unwrap_or_default()
    ));

    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"errors": [{"status": "404", "title": "Resource Not Found"}]})),
        )
            .into_response();
    }

    if id != "pl.abc" {
        Json(json!({"data": []})).into_response()
    } else if offset == "0" {
        Json(json!({
            "data": [
                {"id": "1", "type": "songs", "attributes": {
                    "name": "Song 1",
                    "artistName": "Artist A",
                    "albumName": "Album X",
                    "isrc": "GBAYE0601498"
                }},
                {"id": "2", "type": "songs"}
            ],
            "next": format!("/v1/catalog/{storefront}/playlists/{id}/tracks?offset=2")
        }))
        .into_response()
    } else {
        Json(json!({
            "data": [
                {"id": "3", "type": "songs", "attributes": {
                    "name": "Song 2 (feat. Artist C)",
                    "artistName": "Artist B",
                    "albumName": ""
                }}
            ]
        }))
        .into_response()
    }
}

async fn start() -> (AppleMusicClient, RequestLog) {
    let log = RequestLog::default();
    let state = log.clone();
    let base = serve(move |_| {
        Router::new()
            .route(
                "/v1/catalog/{storefront}/playlists/{id}/tracks",
                get(playlist_tracks),
            )
            .with_state(state)
    })
    .await;
    let client = AppleMusicClientBuilder::new()
        .base_url(&base)
        .developer_token(AccessToken::new("dev-token"))
        .storefront("gb")
        .page_size(2)
        .build()
        .unwrap();
    (client, log)
}

#[tokio::test]
async fn follows_relative_next_links() {
    let (apple, log) = start().await;

    let tracks: Vec<_> = apple.tracks("pl.abc").try_collect().await.unwrap();

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "Song 1");
    assert_eq!(tracks[0].artist, "Artist A");
    assert_eq!(tracks[0].album.as_deref(), Some("Album X"));
    assert_eq!(tracks[0].unique_id.as_deref(), Some("GBAYE0601498"));
    assert_eq!(tracks[1].artist, "Artist B");
    assert_eq!(tracks[1].album, None);
    assert_eq!(tracks[1].unique_id, None);
    assert_eq!(
        log.entries(),
        vec![
            "gb pl.abc limit=2 offset=0 auth=Bearer dev-token".to_string(),
            "gb pl.abc limit=2 offset=2 auth=Bearer dev-token".to_string(),
        ]
    );
}

#[tokio::test]
async fn missing_playlist_surfaces_api_error() {
    let (apple, _) = start().await;

    let err = apple
        .tracks("missing")
        .try_collect::<Vec<_>>()
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Api { status: 404, .. }));
}

#[tokio::test]
async fn playlist_id_is_sent_as_one_path_segment() {
    let (apple, log) = start().await;

    let tracks: Vec<_> = apple.tracks("pl.x#y?z").try_collect().await.unwrap();

    assert!(tracks.is_empty());
    assert_eq!(
        log.entries(),
        vec!["gb pl.x#y?z limit=2 offset=0 auth=Bearer dev-token".to_string()]
    );
}
