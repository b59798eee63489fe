//! Static content store for the portfolio site.
//!
//! DESIGN
//! ======
//! Every record is a `&'static` value compiled into the binary. Nothing is
//! mutated after load and records have no identity beyond their `id` (or
//! array position for the small link lists). The [`Catalog`] bundles the
//! sections so the server and the assistant preamble read from one place.

mod data;
pub mod preamble;

use serde::Serialize;

// =============================================================================
// RECORDS
// =============================================================================

/// Owner of the site, shown in the hero and used by the assistant persona.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Profile {
    pub name: &'static str,
    pub title: &'static str,
    pub tagline: &'static str,
    pub email: &'static str,
    pub location: &'static str,
}

/// A service offering listed on the landing page.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Service {
    pub title: &'static str,
    pub description: &'static str,
}

/// A portfolio case study.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Project {
    pub id: u32,
    pub title: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    pub tags: &'static [&'static str],
    pub link: Option<&'static str>,
}

/// A tool or platform from the "stack" marquee.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Tool {
    pub name: &'static str,
    pub category: &'static str,
    pub icon: &'static str,
}

/// A headline result ("+240% qualified leads").
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResultMetric {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// One lesson inside a [`Course`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Video {
    pub id: u32,
    pub title: &'static str,
    pub duration: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Course {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub level: &'static str,
    pub duration: &'static str,
    pub videos: &'static [Video],
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BlogPost {
    pub id: u32,
    pub title: &'static str,
    pub excerpt: &'static str,
    pub date: &'static str,
    pub read_time: &'static str,
    pub category: &'static str,
    pub image: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SocialLink {
    pub platform: &'static str,
    pub url: &'static str,
    pub icon: &'static str,
}

// =============================================================================
// CATALOG
// =============================================================================

/// Read-only view over every content section.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Catalog {
    pub profile: Profile,
    pub services: &'static [Service],
    pub projects: &'static [Project],
    pub tools: &'static [Tool],
    pub metrics: &'static [ResultMetric],
    pub courses: &'static [Course],
    pub posts: &'static [BlogPost],
    pub nav: &'static [NavItem],
    pub social: &'static [SocialLink],
}

/// Section names accepted by [`Catalog::section`].
pub const SECTIONS: &[&str] = &["profile", "services", "projects", "tools", "metrics", "courses", "posts", "nav", "social"];

/// The compiled-in site catalog.
#[must_use]
pub fn catalog() -> Catalog {
    Catalog {
        profile: data::PROFILE,
        services: data::SERVICES,
        projects: data::PROJECTS,
        tools: data::TOOLS,
        metrics: data::METRICS,
        courses: data::COURSES,
        posts: data::POSTS,
        nav: data::NAV,
        social: data::SOCIAL,
    }
}

impl Catalog {
    #[must_use]
    pub fn project(&self, id: u32) -> Option<&'static Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn course(&self, id: u32) -> Option<&'static Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn post(&self, id: u32) -> Option<&'static BlogPost> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// Serialize a single named section. Returns `None` for unknown names.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<serde_json::Value> {
        let value = match name {
            "profile" => serde_json::to_value(self.profile),
            "services" => serde_json::to_value(self.services),
            "projects" => serde_json::to_value(self.projects),
            "tools" => serde_json::to_value(self.tools),
            "metrics" => serde_json::to_value(self.metrics),
            "courses" => serde_json::to_value(self.courses),
            "posts" => serde_json::to_value(self.posts),
            "nav" => serde_json::to_value(self.nav),
            "social" => serde_json::to_value(self.social),
            _ => return None,
        };
        value.ok()
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
