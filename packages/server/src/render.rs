//! HTML views.
//!
//! Templates are compiled into the binary and rendered with Tera. Every page
//! gets the same base context ([`PageLocals`]): the logged-in user, their
//! follow counts, the ids they follow, and the OAuth providers offered on the
//! login form.

use axum::http::StatusCode;
use devtalk::{Provider, User, UserId};
use tera::{Context, Tera};

use crate::{
    config::ServerConfig,
    storage::{Storage, StorageError},
};

const TEMPLATES: [(&str, &str); 5] = [
    ("layout.html", include_str!("../templates/layout.html")),
    ("main.html", include_str!("../templates/main.html")),
    ("profile.html", include_str!("../templates/profile.html")),
    ("join.html", include_str!("../templates/join.html")),
    ("error.html", include_str!("../templates/error.html")),
];

/// The compiled view set.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, ctx: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, ctx)
    }

    /// The error view. Rendered without a user so it cannot fail on storage.
    pub fn render_error(&self, status: StatusCode, message: &str) -> Result<String, tera::Error> {
        let mut ctx = PageLocals::default().context("DevTalk");
        ctx.insert("status", &status.as_u16());
        ctx.insert("message", message);
        self.render("error.html", &ctx)
    }
}

/// Values every view can rely on.
#[derive(Debug, Default)]
pub struct PageLocals {
    pub user: Option<User>,
    pub follower_count: usize,
    pub following_count: usize,
    pub following_id_list: Vec<UserId>,
    /// Configured OAuth providers, by wire name.
    pub providers: Vec<&'static str>,
}

impl PageLocals {
    /// Build the locals for `user` (or a guest).
    pub async fn load(
        storage: &dyn Storage,
        config: &ServerConfig,
        user: Option<User>,
    ) -> Result<Self, StorageError> {
        let providers = Provider::OAUTH
            .into_iter()
            .filter(|p| config.credentials(*p).is_some())
            .map(|p| p.as_str())
            .collect();

        let Some(user) = user else {
            return Ok(Self {
                providers,
                ..Default::default()
            });
        };

        let followers = storage.list_followers(user.id).await?;
        let followings = storage.list_followings(user.id).await?;
        Ok(Self {
            user: Some(user),
            follower_count: followers.len(),
            following_count: followings.len(),
            following_id_list: followings.iter().map(|u| u.id).collect(),
            providers,
        })
    }

    /// A Tera context holding these locals and the page `title`.
    pub fn context(&self, title: &str) -> Context {
        let mut ctx = Context::new();
        ctx.insert("title", title);
        ctx.insert("user", &self.user);
        ctx.insert("followerCount", &self.follower_count);
        ctx.insert("followingCount", &self.following_count);
        ctx.insert("followingIdList", &self.following_id_list);
        ctx.insert("providers", &self.providers);
        ctx.insert("notice", &None::<String>);
        ctx
    }
}
