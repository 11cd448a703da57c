use std::sync::Arc;

use tempfile::TempDir;

use cradle::auth::{register, Identity, Registration, SessionResolver};
use cradle::db;
use cradle::db::models::{NewPost, ReactionKind, Subject, NO_LOCATION};
use cradle::donations::{should_show_donated_label, update_country_preferences};
use cradle::feed::FeedAssembler;
use cradle::reactions::{ReactionAction, ReactionEngine};
use cradle::repository::{PostFilter, PostRepository, SqliteStore, UserRepository};

struct Forum {
    store: Arc<SqliteStore>,
    sessions: SessionResolver,
    reactions: ReactionEngine,
    feed: FeedAssembler,
    _dir: TempDir,
}

fn forum() -> Forum {
    let dir = TempDir::new().unwrap();
    let pool = db::create_pool(&dir.path().join("forum.db"))
        .expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let store = Arc::new(SqliteStore::new(pool));
    let reactions = ReactionEngine::new(store.clone());
    Forum {
        sessions: SessionResolver::new(store.clone(), store.clone()),
        feed: FeedAssembler::new(reactions.clone(), store.clone()),
        reactions,
        store,
        _dir: dir,
    }
}

async fn sign_up(forum: &Forum, name: &str) -> Identity {
    register(
        &*forum.store,
        &Registration {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password: "secret".to_string(),
        },
        4,
    )
    .await
    .unwrap();
    let token = forum
        .sessions
        .login(&format!("{name}@example.com"), "secret")
        .await
        .unwrap();
    forum.sessions.resolve(Some(&token)).await.unwrap()
}

async fn set_country(forum: &Forum, who: &Identity, country: &str, local_only: bool) -> Identity {
    let user = who.user().unwrap();
    update_country_preferences(&*forum.store, user, country, local_only)
        .await
        .unwrap();
    let fresh = forum.store.find_user_by_id(user.id).await.unwrap().unwrap();
    Identity::Authenticated(fresh.into())
}

#[tokio::test]
async fn donation_country_follows_the_author() {
    let forum = forum();

    // ana registers with no country and posts a donation
    let ana = sign_up(&forum, "ana").await;
    let ana_id = ana.user_id().unwrap();
    assert_eq!(ana.user().unwrap().country, NO_LOCATION);

    let post_id = forum
        .store
        .create_post(&NewPost {
            user_id: ana_id,
            title: "Moses basket".to_string(),
            content: "Collection only".to_string(),
            category: "gear".to_string(),
            is_donation: true,
            donation_country: NO_LOCATION.to_string(),
        })
        .await
        .unwrap();

    // she moves to ES and restricts donations to her country
    let ana = set_country(&forum, &ana, "ES", true).await;
    let post = forum.store.find_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.donation_country, "ES");

    let es_reader = sign_up(&forum, "bea").await;
    let es_reader = set_country(&forum, &es_reader, "ES", true).await;
    let fr_reader = sign_up(&forum, "cat").await;
    let fr_reader = set_country(&forum, &fr_reader, "FR", true).await;
    let open_reader = sign_up(&forum, "dan").await;
    let open_reader = set_country(&forum, &open_reader, "FR", false).await;

    assert!(should_show_donated_label(&post, &ana));
    assert!(should_show_donated_label(&post, &es_reader));
    assert!(!should_show_donated_label(&post, &fr_reader));
    assert!(should_show_donated_label(&post, &open_reader));
    assert!(should_show_donated_label(&post, &Identity::Anonymous));

    // every listing agrees
    forum
        .reactions
        .set_reaction(es_reader.user_id().unwrap(), Subject::Post(post_id), ReactionKind::Like)
        .await
        .unwrap();
    let listings = vec![
        forum.store.filter_posts(&PostFilter::default()).await.unwrap(),
        forum.store.top_liked_posts(5).await.unwrap(),
        forum.store.search_posts("basket").await.unwrap(),
        forum
            .store
            .posts_reacted_by(es_reader.user_id().unwrap(), ReactionKind::Like)
            .await
            .unwrap(),
    ];
    for posts in listings {
        let for_es = forum.feed.cards(posts.clone(), &es_reader, false).await.unwrap();
        let for_fr = forum.feed.cards(posts, &fr_reader, false).await.unwrap();
        assert!(for_es[0].show_donated_label);
        assert!(!for_fr[0].show_donated_label);
    }
}

#[tokio::test]
async fn reactions_survive_a_real_database() {
    let forum = forum();
    let ana = sign_up(&forum, "ana").await;
    let bea = sign_up(&forum, "bea").await;
    let post_id = forum
        .store
        .create_post(&NewPost {
            user_id: ana.user_id().unwrap(),
            title: "Night feeds".to_string(),
            content: "Any tips?".to_string(),
            category: "sleep".to_string(),
            is_donation: false,
            donation_country: NO_LOCATION.to_string(),
        })
        .await
        .unwrap();
    let post = Subject::Post(post_id);
    let bea_id = bea.user_id().unwrap();

    let steps = [
        (ReactionKind::Like, ReactionAction::Insert),
        (ReactionKind::Like, ReactionAction::Noop),
        (ReactionKind::Dislike, ReactionAction::Update),
        (ReactionKind::Like, ReactionAction::Update),
    ];
    for (kind, expected) in steps {
        assert_eq!(
            forum.reactions.set_reaction(bea_id, post, kind).await.unwrap(),
            expected
        );
    }

    let counts = forum.reactions.count_reactions(post).await.unwrap();
    assert_eq!((counts.likes, counts.dislikes), (1, 0));
    assert_eq!(
        forum.reactions.user_reaction(bea_id, post).await.unwrap(),
        Some(ReactionKind::Like)
    );
    assert_eq!(
        forum
            .reactions
            .user_reaction(ana.user_id().unwrap(), post)
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn sessions_are_single_use_per_user() {
    let forum = forum();
    sign_up(&forum, "ana").await;

    let laptop = forum.sessions.login("ana@example.com", "secret").await.unwrap();
    let phone = forum.sessions.login("ana@example.com", "secret").await.unwrap();

    assert_eq!(
        forum.sessions.resolve(Some(&laptop)).await.unwrap(),
        Identity::Anonymous
    );
    assert!(forum.sessions.resolve(Some(&phone)).await.unwrap().is_authenticated());

    let guest = forum.sessions.issue_guest_token();
    assert_eq!(
        forum.sessions.resolve(Some(&guest)).await.unwrap(),
        Identity::Anonymous
    );
}
