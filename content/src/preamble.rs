//! Assistant system preamble assembled from the catalog.
//!
//! Both the text chat and the voice session describe the site with the same
//! facts; the voice variant only adds delivery guidance.

use std::fmt::Write;

use super::Catalog;

/// Build the system instruction for the text-chat assistant.
#[must_use]
pub fn system_preamble(catalog: &Catalog) -> String {
    let profile = &catalog.profile;
    let mut out = format!(
        "You are the AI assistant on the portfolio website of {name}, {title}.\n\
         Answer visitor questions about {name}'s services, projects, results, courses and blog.\n\
         Be friendly and concise. If a question is unrelated to the site, answer briefly and steer \
         back to how {name} can help. Never invent projects, prices or results that are not listed below.\n\
         For bookings or quotes, point visitors to {email}.\n",
        name = profile.name,
        title = profile.title,
        email = profile.email,
    );

    let _ = writeln!(out, "\nTagline: {}\nBased in: {}", profile.tagline, profile.location);

    out.push_str("\nServices:\n");
    for service in catalog.services {
        let _ = writeln!(out, "- {}: {}", service.title, service.description);
    }

    out.push_str("\nPortfolio projects:\n");
    for project in catalog.projects {
        let _ = writeln!(
            out,
            "- {} [{}] {} (tags: {})",
            project.title,
            project.category,
            project.description,
            project.tags.join(", ")
        );
    }

    out.push_str("\nTools:\n");
    let tools: Vec<&str> = catalog.tools.iter().map(|t| t.name).collect();
    let _ = writeln!(out, "{}", tools.join(", "));

    out.push_str("\nResults:\n");
    for metric in catalog.metrics {
        let _ = writeln!(out, "- {} {}: {}", metric.value, metric.label, metric.description);
    }

    out.push_str("\nCourses:\n");
    for course in catalog.courses {
        let _ = writeln!(
            out,
            "- {} ({}, {}, {} lessons): {}",
            course.title,
            course.level,
            course.duration,
            course.videos.len(),
            course.description
        );
    }

    out.push_str("\nBlog posts:\n");
    for post in catalog.posts {
        let _ = writeln!(out, "- \"{}\" ({}): {}", post.title, post.date, post.excerpt);
    }

    out
}

/// Build the system instruction for the real-time voice session.
#[must_use]
pub fn voice_instruction(catalog: &Catalog) -> String {
    let mut out = system_preamble(catalog);
    out.push_str(
        "\nYou are speaking out loud. Keep each answer to two or three short sentences, \
         avoid lists, URLs and markdown, and ask one follow-up question when it helps.\n",
    );
    out
}

/// Scripted first utterance for voice sessions that open with a greeting.
#[must_use]
pub fn voice_greeting(catalog: &Catalog) -> String {
    format!(
        "Greet the visitor warmly in one sentence as {}'s assistant and ask how you can help.",
        catalog.profile.name
    )
}
