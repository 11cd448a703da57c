//! Who sees the "donated" badge on a post.
//!
//! The badge is shown on every donation post unless the viewer is signed in
//! and has opted into seeing only donations from their own country. In that
//! case the post's donation country must be a real country equal to the
//! viewer's. The decision is a pure function of the post and the viewer so
//! that every listing gives the same answer for the same pair.

use crate::auth::{Identity, SessionUser};
use crate::db::models::Post;
use crate::repository::{StoreError, UserRepository};

pub use crate::db::models::NO_LOCATION;

pub fn is_real_country(country: &str) -> bool {
    !country.is_empty() && country != NO_LOCATION
}

/// Form input to stored value: blank means "no location".
pub fn normalize_country(input: &str) -> String {
    let trimmed = input.trim();
    if is_real_country(trimmed) {
        trimmed.to_string()
    } else {
        NO_LOCATION.to_string()
    }
}

pub fn should_show_donated_label(post: &Post, viewer: &Identity) -> bool {
    if !post.is_donation {
        return false;
    }

    match viewer {
        Identity::Anonymous => true,
        Identity::Authenticated(user) if !user.show_donations_in_country_only => true,
        Identity::Authenticated(user) => {
            is_real_country(&post.donation_country) && post.donation_country == user.country
        }
    }
}

/// Save a user's country settings. A changed country is pushed onto all of
/// the user's existing posts in the same write as the preference itself.
pub async fn update_country_preferences(
    users: &dyn UserRepository,
    user: &SessionUser,
    country: &str,
    show_donations_in_country_only: bool,
) -> Result<String, StoreError> {
    let country = normalize_country(country);
    let moved = country != user.country;

    let touched = users
        .save_country_preferences(user.id, &country, show_donations_in_country_only, moved)
        .await?;
    if moved {
        tracing::info!(
            "User {} moved to {}, rewrote {} post(s)",
            user.id,
            country,
            touched
        );
    }
    Ok(country)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donation(country: &str) -> Post {
        Post {
            id: 1,
            user_id: 1,
            username: "ana".to_string(),
            profile_picture: "1.png".to_string(),
            title: "Cot".to_string(),
            content: "Free to collect".to_string(),
            category: "gear".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            is_donation: true,
            donation_country: country.to_string(),
        }
    }

    fn member(country: &str, local_only: bool) -> Identity {
        Identity::Authenticated(SessionUser {
            id: 2,
            username: "viewer".to_string(),
            profile_picture: "2.png".to_string(),
            country: country.to_string(),
            show_donations_in_country_only: local_only,
        })
    }

    #[test]
    fn non_donations_never_show_the_badge() {
        let mut post = donation("DE");
        post.is_donation = false;
        assert!(!should_show_donated_label(&post, &Identity::Anonymous));
        assert!(!should_show_donated_label(&post, &member("DE", false)));
        assert!(!should_show_donated_label(&post, &member("DE", true)));
    }

    #[test]
    fn anonymous_viewers_see_every_donation() {
        assert!(should_show_donated_label(&donation("DE"), &Identity::Anonymous));
        assert!(should_show_donated_label(&donation(NO_LOCATION), &Identity::Anonymous));
    }

    #[test]
    fn unrestricted_members_see_every_donation() {
        assert!(should_show_donated_label(&donation("DE"), &member("FR", false)));
        assert!(should_show_donated_label(&donation("DE"), &member(NO_LOCATION, false)));
    }

    #[test]
    fn restricted_members_see_only_their_country() {
        assert!(should_show_donated_label(&donation("DE"), &member("DE", true)));
        assert!(!should_show_donated_label(&donation("DE"), &member("FR", true)));
    }

    #[test]
    fn placeholder_countries_never_match() {
        assert!(!should_show_donated_label(
            &donation(NO_LOCATION),
            &member(NO_LOCATION, true)
        ));
        assert!(!should_show_donated_label(&donation(""), &member("", true)));
    }

    #[test]
    fn normalize_country_maps_blank_to_no_location() {
        assert_eq!(normalize_country(""), NO_LOCATION);
        assert_eq!(normalize_country("   "), NO_LOCATION);
        assert_eq!(normalize_country(" ES "), "ES");
    }

    mod preferences {
        use crate::auth::SessionUser;
        use crate::db::models::{NewPost, NewUser, UserId, NO_LOCATION};
        use crate::db::test_pool;
        use crate::donations::update_country_preferences;
        use crate::repository::{PostFilter, PostRepository, SqliteStore, UserRepository};

        async fn user_with_posts(store: &SqliteStore, name: &str, posts: usize) -> SessionUser {
            let id = store
                .create_user(&NewUser {
                    username: name.to_string(),
                    email: format!("{name}@example.com"),
                    password_hash: "hash".to_string(),
                    profile_picture: "1.png".to_string(),
                })
                .await
                .unwrap();
            for i in 0..posts {
                store
                    .create_post(&NewPost {
                        user_id: id,
                        title: format!("Post {i}"),
                        content: "Body".to_string(),
                        category: "gear".to_string(),
                        is_donation: i % 2 == 0,
                        donation_country: NO_LOCATION.to_string(),
                    })
                    .await
                    .unwrap();
            }
            store.find_user_by_id(id).await.unwrap().unwrap().into()
        }

        async fn countries_of(store: &SqliteStore, author: UserId) -> Vec<String> {
            store
                .filter_posts(&PostFilter {
                    created_by: Some(author),
                    ..Default::default()
                })
                .await
                .unwrap()
                .into_iter()
                .map(|p| p.donation_country)
                .collect()
        }

        #[tokio::test]
        async fn country_change_rewrites_every_post_by_the_author() {
            let store = SqliteStore::new(test_pool());
            let ana = user_with_posts(&store, "ana", 3).await;
            let bea = user_with_posts(&store, "bea", 1).await;

            let saved = update_country_preferences(&store, &ana, "ES", true)
                .await
                .unwrap();
            assert_eq!(saved, "ES");

            assert_eq!(countries_of(&store, ana.id).await, vec!["ES"; 3]);
            assert_eq!(countries_of(&store, bea.id).await, vec![NO_LOCATION]);

            let stored = store.find_user_by_id(ana.id).await.unwrap().unwrap();
            assert_eq!(stored.country, "ES");
            assert!(stored.show_donations_in_country_only);
        }

        #[tokio::test]
        async fn blank_country_is_saved_as_no_location() {
            let store = SqliteStore::new(test_pool());
            let ana = user_with_posts(&store, "ana", 1).await;
            update_country_preferences(&store, &ana, "DE", false)
                .await
                .unwrap();

            let ana: SessionUser = store.find_user_by_id(ana.id).await.unwrap().unwrap().into();
            update_country_preferences(&store, &ana, "", false)
                .await
                .unwrap();

            assert_eq!(countries_of(&store, ana.id).await, vec![NO_LOCATION]);
            let stored = store.find_user_by_id(ana.id).await.unwrap().unwrap();
            assert_eq!(stored.country, NO_LOCATION);
        }

        #[tokio::test]
        async fn unchanged_country_only_updates_the_flag() {
            let store = SqliteStore::new(test_pool());
            let ana = user_with_posts(&store, "ana", 1).await;

            update_country_preferences(&store, &ana, NO_LOCATION, true)
                .await
                .unwrap();

            let stored = store.find_user_by_id(ana.id).await.unwrap().unwrap();
            assert_eq!(stored.country, NO_LOCATION);
            assert!(stored.show_donations_in_country_only);
        }

        #[tokio::test]
        async fn failed_preference_write_leaves_posts_untouched() {
            let pool = test_pool();
            let store = SqliteStore::new(pool.clone());
            let ana = user_with_posts(&store, "ana", 2).await;
            pool.get()
                .unwrap()
                .execute_batch(
                    "CREATE TRIGGER users_locked BEFORE UPDATE ON users
                     BEGIN SELECT RAISE(ABORT, 'users locked'); END;",
                )
                .unwrap();

            let result = update_country_preferences(&store, &ana, "ES", true).await;
            assert!(result.is_err());
            assert_eq!(countries_of(&store, ana.id).await, vec![NO_LOCATION; 2]);
        }
    }
}
