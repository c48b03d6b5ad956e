mod common;

use breastie::community::{communities_collection, memberships_collection, posts_collection, PostImage};
use breastie::store::{fields, DocumentStore};
use serde_json::json;

async fn seed(env: &common::Offline) {
    for (id, name) in [("c1", "Newly Diagnosed"), ("c2", "Survivors"), ("c3", "Caregivers")] {
        env.store
            .set(&communities_collection(), id, fields([("name", json!(name)), ("memberCount", json!(0))]))
            .await
            .unwrap();
    }
    for (community, created, content) in [("c1", 1, "first"), ("c2", 2, "second"), ("c3", 3, "elsewhere")] {
        env.store
            .add(
                &posts_collection(),
                fields([
                    ("communityId", json!(community)),
                    ("authorId", json!("someone")),
                    ("content", json!(content)),
                    ("createdAt", json!(created)),
                ]),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn stored_memberships_trigger_exactly_one_reload() {
    let env = common::offline();
    seed(&env).await;
    for id in ["c1", "c2"] {
        env.store
            .set(&memberships_collection("u1"), id, fields([("joinedAt", json!(0))]))
            .await
            .unwrap();
    }

    let mut feed = env.breastie.community();
    feed.load_memberships().await.unwrap();
    assert_eq!(env.store.queries_on(&posts_collection()), 1);

    let state = feed.feed();
    let contents: Vec<&str> = state.posts.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, ["second", "first"]);
    assert_eq!(state.scope.len(), 2);

    // Same set again: no new snapshot, no reload
    feed.load_memberships().await.unwrap();
    assert_eq!(env.store.queries_on(&posts_collection()), 1);
}

#[tokio::test]
async fn no_memberships_means_no_feed_query() {
    let env = common::offline();
    seed(&env).await;

    let mut feed = env.breastie.community();
    feed.load_memberships().await.unwrap();
    feed.join("c3").await.unwrap();
    feed.leave("c3").await.unwrap();

    // Only the join reloads; leaving the last community clears locally
    assert_eq!(env.store.queries_on(&posts_collection()), 1);
    assert!(feed.feed().posts.is_empty());
    assert!(feed.joined().is_empty());
}

#[tokio::test]
async fn subscribers_see_every_snapshot() {
    let env = common::offline();
    seed(&env).await;

    let mut feed = env.breastie.community();
    let mut joined = feed.subscribe_joined();
    let mut posts = feed.subscribe();

    feed.join("c1").await.unwrap();
    assert!(joined.has_changed().unwrap());
    assert!(joined.borrow_and_update().contains("c1"));
    assert_eq!(posts.borrow_and_update().posts.len(), 1);

    feed.join("c2").await.unwrap();
    assert_eq!(joined.borrow_and_update().len(), 2);
    assert_eq!(posts.borrow_and_update().posts.len(), 2);
}

#[tokio::test]
async fn posting_with_image_in_joined_community() {
    let env = common::offline();
    seed(&env).await;
    env.breastie
        .profile()
        .update(breastie::profile::ProfileUpdate {
            display_name: Some("Rina".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut feed = env.breastie.community();
    feed.join("c2").await.unwrap();
    let post = feed
        .create_post("c2", "Finished radiation today!", Some(PostImage::new(vec![9; 16], "image/png")))
        .await
        .unwrap();

    assert_eq!(post.author_name, "Rina");
    let url = post.image_url.clone().unwrap();
    assert!(url.starts_with("memory://media/posts/u1/"));
    assert_eq!(env.blobs.object(&url).await.map(|(ct, _)| ct), Some("image/png".to_string()));
    assert_eq!(feed.feed().posts[0].id, post.id);

    feed.like_post(&post.id).await.unwrap();
    assert_eq!(feed.feed().posts[0].likes, 1);

    let communities = feed.list_communities().await.unwrap();
    let survivors = communities.iter().find(|c| c.id == "c2").unwrap();
    assert_eq!(survivors.member_count, 1);
}

#[tokio::test]
async fn retry_reloads_the_current_scope() {
    let env = common::offline();
    seed(&env).await;

    let mut feed = env.breastie.community();
    feed.join("c1").await.unwrap();
    assert_eq!(feed.feed().posts.len(), 1);

    feed.retry().await.unwrap();
    assert_eq!(feed.feed().posts.len(), 1);
    assert!(feed.feed().error.is_none());
    assert_eq!(env.store.queries_on(&posts_collection()), 2);
}
