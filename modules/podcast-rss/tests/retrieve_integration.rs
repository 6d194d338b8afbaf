//! End-to-end coverage of the RSS retrieval stage's network paths
//! (feed fetch + audio download), mocked with `wiremock` rather than
//! hitting a real feed/CDN.

use podcast_blobstore::{BlobStore, LocalBlobStore};
use podcast_common::{FeedConfig, Site};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
<title>Test Feed</title>
<item>
<title>Episode One</title>
<enclosure url="{AUDIO_URL}" type="audio/mpeg"/>
<pubDate>Mon, 06 Jan 2020 00:00:00 GMT</pubDate>
</item>
</channel>
</rss>"#;

#[tokio::test]
async fn retrieve_discovers_and_downloads_one_episode() {
    let server = MockServer::start().await;

    let audio_url = format!("{}/audio/ep1.mp3", server.uri());
    let feed_body = FEED_XML.replace("{AUDIO_URL}", &audio_url);

    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed_body))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/audio/ep1.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake audio bytes".to_vec()))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path().to_str().unwrap(), "site-a");

    let site = Site {
        site_id: "site-a".to_string(),
        title: "Test Site".to_string(),
        feeds: vec![FeedConfig { feed_id: "feedA".to_string(), url: format!("{}/feed.xml", server.uri()) }],
        domain: None,
        corrections_path: None,
    };

    let outcome = podcast_rss::retrieve(&site, &store).await.unwrap();

    assert_eq!(outcome.episodes_discovered, 1);
    assert_eq!(outcome.new_audio_keys.len(), 1);
    assert!(outcome.has_new_audio);

    let audio = store.get(&outcome.new_audio_keys[0]).await.unwrap();
    assert_eq!(audio.unwrap().as_ref(), b"fake audio bytes");
}

#[tokio::test]
async fn retrieve_isolates_a_feed_that_returns_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path().to_str().unwrap(), "site-a");

    let site = Site {
        site_id: "site-a".to_string(),
        title: "Test Site".to_string(),
        feeds: vec![FeedConfig { feed_id: "broken".to_string(), url: format!("{}/broken.xml", server.uri()) }],
        domain: None,
        corrections_path: None,
    };

    let outcome = podcast_rss::retrieve(&site, &store).await.unwrap();

    assert_eq!(outcome.episodes_discovered, 0);
    assert!(!outcome.has_new_audio);
}
