//! E2E tests for outbound federation
//!
//! Local content converted on one node is ingested by another.

mod common;

use chrono::Utc;
use common::{DirectoryFetcher, TestNode, remote_profile};
use fedbridge::data::{Content, EntityId, Profile, Visibility};
use fedbridge::federation::{InboundEntity, InboxPayload, OutboundConverter, RetractionSkip};
use fedbridge::federation::{Handled, RetractionOutcome};

async fn local_author(node: &TestNode, handle: &str) -> Profile {
    let now = Utc::now();
    let profile = Profile {
        id: EntityId::new().0,
        handle: handle.to_string(),
        name: "Local Author".to_string(),
        guid: format!("guid-{}", handle),
        visibility: Visibility::Public,
        rsa_public_key: String::new(),
        image_url_small: String::new(),
        image_url_medium: String::new(),
        image_url_large: String::new(),
        location: String::new(),
        email: None,
        created_at: now,
        updated_at: now,
    };
    node.db.insert_profile(&profile).await.unwrap();
    profile
}

async fn local_content(node: &TestNode, author: &Profile, guid: &str, text: &str) -> Content {
    let now = Utc::now();
    let content = Content {
        id: EntityId::new().0,
        guid: guid.to_string(),
        author_id: author.id.clone(),
        text: text.to_string(),
        visibility: Visibility::Limited,
        remote_created: None,
        service_label: String::new(),
        is_local: true,
        created_at: now,
        updated_at: now,
    };
    node.db.insert_content(&content).await.unwrap();
    content
}

#[tokio::test]
async fn test_post_round_trip_between_nodes() {
    let origin = TestNode::new(DirectoryFetcher::default()).await;
    let author = local_author(&origin, "carol@origin.example").await;
    let content = local_content(&origin, &author, "c1", "Hello **fediverse**").await;

    let converter = OutboundConverter::new("Origin");
    let post = converter
        .make_federable_post(&content, &author)
        .expect("content should convert");

    let receiver = TestNode::new(DirectoryFetcher::new(vec![remote_profile(
        "carol@origin.example",
        "Carol",
        true,
    )]))
    .await;
    let report = receiver
        .inbox
        .receive(&InboxPayload {
            sender: post.handle.clone(),
            entities: vec![InboundEntity::Post(post).into()],
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.failure_count(), 0);

    let mirrored = receiver.db.get_content_by_guid("c1").await.unwrap().unwrap();
    assert_eq!(mirrored.text, content.text);
    assert_eq!(mirrored.guid, content.guid);
    assert_eq!(mirrored.visibility, Visibility::Public);
    assert_eq!(mirrored.service_label, "Origin");
    assert_eq!(mirrored.remote_created, Some(content.created_at));
    assert!(!mirrored.is_local);
}

#[tokio::test]
async fn test_retraction_round_trip_between_nodes() {
    let origin = TestNode::new(DirectoryFetcher::default()).await;
    let author = local_author(&origin, "carol@origin.example").await;
    let content = local_content(&origin, &author, "c2", "short-lived").await;

    let converter = OutboundConverter::default();
    let post = converter.make_federable_post(&content, &author).unwrap();
    let retraction = converter
        .make_federable_retraction(&content, &author)
        .unwrap();

    let receiver = TestNode::new(DirectoryFetcher::new(vec![remote_profile(
        "carol@origin.example",
        "Carol",
        true,
    )]))
    .await;
    let report = receiver
        .inbox
        .receive(&InboxPayload {
            sender: "carol@origin.example".to_string(),
            entities: vec![
                InboundEntity::Post(post).into(),
                InboundEntity::Retraction(retraction).into(),
            ],
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        report.outcomes[1].result.as_ref().unwrap(),
        &Handled::Retraction(RetractionOutcome::Deleted)
    );
    assert_eq!(receiver.db.count_content().await.unwrap(), 0);
}

#[tokio::test]
async fn test_remote_retraction_cannot_touch_local_content() {
    let node = TestNode::new(DirectoryFetcher::default()).await;
    let author = local_author(&node, "carol@origin.example").await;
    let content = local_content(&node, &author, "c3", "authoritative").await;

    // A spoofed retraction naming the local author.
    let retraction = OutboundConverter::default()
        .make_federable_retraction(&content, &author)
        .unwrap();
    let report = node
        .inbox
        .receive(&InboxPayload {
            sender: author.handle.clone(),
            entities: vec![InboundEntity::Retraction(retraction).into()],
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        report.outcomes[0].result.as_ref().unwrap(),
        &Handled::Retraction(RetractionOutcome::Ignored(RetractionSkip::LocalContent))
    );
    assert_eq!(node.db.count_content().await.unwrap(), 1);
    assert!(node.fetcher.calls().is_empty());
}
