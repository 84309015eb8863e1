//! Demo dataset injected at startup into an empty store.

use crate::domain::post::{NewPost, PostStatus};

pub struct SeedUser {
    pub username: &'static str,
    pub email: &'static str,
    pub password: &'static str,
}

pub fn demo_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            username: "admin",
            email: "admin@example.com",
            password: "admin123",
        },
        SeedUser {
            username: "test",
            email: "test@example.com",
            password: "test123",
        },
    ]
}

/// Posts created in order; the `published` ones are then run through publish
/// so they carry simulated engagement.
pub fn demo_posts() -> Vec<NewPost> {
    vec![
        NewPost {
            status: Some(PostStatus::Published),
            hashtags: vec!["#AI".into(), "#SocialMedia".into()],
            ..NewPost::new(
                "Great content written by AI",
                "A Facebook post generated end to end by AI, packed with marketing hooks and copy that grabs attention. 🚀",
            )
        },
        NewPost {
            status: Some(PostStatus::Scheduled),
            hashtags: vec!["#Automation".into(), "#Testing".into()],
            ..NewPost::new(
                "Automated posting test",
                "Exercising the automated posting flow, including scheduled publishing and live monitoring. 📅",
            )
        },
        NewPost {
            hashtags: vec!["#Marketing".into(), "#Strategy".into()],
            ..NewPost::new(
                "Facebook marketing strategy",
                "The latest Facebook marketing strategies and tricks for lifting follower engagement. 📊",
            )
        },
    ]
}
