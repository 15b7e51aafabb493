// Client-side projection of the server's remaining-heroes pool, plus the
// per-hero avatar fallback used when rendering it.

use crate::gateway::types::HeroesRemaining;
use crate::gateway::{Gateway, RemoteError};

/// Last successfully fetched snapshot of the remaining pool.
///
/// Read-only cache: selection never edits it. To reflect a pick, call
/// `markUsed` on the backend and re-fetch (`mark_used_and_refresh`).
#[derive(Debug, Clone, Default)]
pub struct HeroPoolView {
    snapshot: Option<HeroesRemaining>,
    loading: bool,
}

impl HeroPoolView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&HeroesRemaining> {
        self.snapshot.as_ref()
    }

    pub fn remaining(&self) -> &[String] {
        self.snapshot
            .as_ref()
            .map(|s| s.remaining.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, hero: &str) -> bool {
        self.remaining().iter().any(|h| h == hero)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Show the loading indicator only while nothing is displayed yet.
    pub fn show_loading_indicator(&self) -> bool {
        self.loading && self.remaining().is_empty()
    }

    /// Mark a fetch as outstanding.
    pub fn begin_refresh(&mut self) {
        self.loading = true;
    }

    /// Apply the result of a fetch. A failure keeps the previous snapshot.
    pub fn finish_refresh(
        &mut self,
        result: Result<HeroesRemaining, RemoteError>,
    ) -> Result<&HeroesRemaining, RemoteError> {
        self.loading = false;
        let fresh = result?;
        Ok(self.snapshot.insert(fresh))
    }

    /// Drop the cached snapshot; the next render fetches again.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    pub async fn refresh(&mut self, gateway: &Gateway) -> Result<&HeroesRemaining, RemoteError> {
        self.begin_refresh();
        let result = gateway.heroes_remaining().await;
        self.finish_refresh(result)
    }

    /// Record `hero` as used on the backend, then re-fetch. The local
    /// snapshot only changes through the re-fetch.
    pub async fn mark_used_and_refresh(
        &mut self,
        gateway: &Gateway,
        hero: &str,
    ) -> Result<&HeroesRemaining, RemoteError> {
        gateway.mark_used(hero).await?;
        self.refresh(gateway).await
    }
}

/// Turn a hero name into an image slug: lowercase, runs of anything other
/// than `a-z0-9` become one `-`, no leading/trailing `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// What to draw for one hero tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarDisplay {
    Image(String),
    Initial(char),
}

/// Per-tile display state. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroAvatar {
    pub name: String,
    pub slug: String,
    image_failed: bool,
}

impl HeroAvatar {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            image_failed: false,
        }
    }

    pub fn image_path(&self) -> String {
        format!("/heroes/{}.png", self.slug)
    }

    /// Called when the image could not be loaded.
    pub fn on_image_error(&mut self) {
        self.image_failed = true;
    }

    pub fn display(&self) -> AvatarDisplay {
        if self.image_failed || self.slug.is_empty() {
            let initial = self
                .name
                .chars()
                .next()
                .and_then(|c| c.to_uppercase().next())
                .unwrap_or('?');
            AvatarDisplay::Initial(initial)
        } else {
            AvatarDisplay::Image(self.image_path())
        }
    }
}
