//! Compiled-in site content.

use super::{BlogPost, Course, NavItem, Profile, Project, ResultMetric, Service, SocialLink, Tool, Video};

pub(crate) const PROFILE: Profile = Profile {
    name: "Alex Moreau",
    title: "Growth Designer & AI Automation Consultant",
    tagline: "Brands, funnels and AI workflows that turn attention into revenue.",
    email: "hello@alexmoreau.studio",
    location: "Lisbon, Portugal (remote worldwide)",
};

pub(crate) const SERVICES: &[Service] = &[
    Service {
        title: "Brand & Web Design",
        description: "Visual identity, landing pages and design systems built to convert.",
    },
    Service {
        title: "Performance Marketing",
        description: "Paid social and search campaigns with creative testing and weekly reporting.",
    },
    Service {
        title: "AI Automation",
        description: "Chat and voice assistants, lead qualification bots and back-office automations.",
    },
    Service {
        title: "Content & Video",
        description: "Short-form video, editing and content calendars for founders and teams.",
    },
];

pub(crate) const PROJECTS: &[Project] = &[
    Project {
        id: 1,
        title: "Aurora Skincare Relaunch",
        category: "Branding",
        description: "Full rebrand and Shopify storefront for a clean-beauty label, including packaging and launch campaign.",
        image: "/images/projects/aurora.webp",
        tags: &["Branding", "Shopify", "Packaging"],
        link: Some("https://aurora-skin.example.com"),
    },
    Project {
        id: 2,
        title: "Nimbus SaaS Funnel",
        category: "Web Design",
        description: "Landing page system and onboarding flow for a B2B analytics product; trial sign-ups doubled in six weeks.",
        image: "/images/projects/nimbus.webp",
        tags: &["Figma", "Webflow", "CRO"],
        link: None,
    },
    Project {
        id: 3,
        title: "Casa Verde Lead Assistant",
        category: "AI Automation",
        description: "WhatsApp and web voice assistant that qualifies real-estate leads and books viewings automatically.",
        image: "/images/projects/casa-verde.webp",
        tags: &["Gemini", "n8n", "WhatsApp"],
        link: None,
    },
    Project {
        id: 4,
        title: "Pulse Fitness Ads",
        category: "Marketing",
        description: "Meta and TikTok ad creative program for a boutique gym chain across four cities.",
        image: "/images/projects/pulse.webp",
        tags: &["Meta Ads", "TikTok", "Video"],
        link: None,
    },
    Project {
        id: 5,
        title: "Orbit Podcast Studio",
        category: "Content",
        description: "Editing pipeline and clip automation for a weekly tech podcast, 40 clips a month.",
        image: "/images/projects/orbit.webp",
        tags: &["Premiere", "Descript", "Automation"],
        link: Some("https://orbit-podcast.example.com"),
    },
];

pub(crate) const TOOLS: &[Tool] = &[
    Tool { name: "Figma", category: "Design", icon: "figma" },
    Tool { name: "Webflow", category: "Web", icon: "webflow" },
    Tool { name: "Shopify", category: "Commerce", icon: "shopify" },
    Tool { name: "Meta Ads", category: "Marketing", icon: "meta" },
    Tool { name: "Google Ads", category: "Marketing", icon: "google-ads" },
    Tool { name: "n8n", category: "Automation", icon: "n8n" },
    Tool { name: "Gemini", category: "AI", icon: "gemini" },
    Tool { name: "Premiere Pro", category: "Video", icon: "premiere" },
];

pub(crate) const METRICS: &[ResultMetric] = &[
    ResultMetric {
        value: "120+",
        label: "Projects delivered",
        description: "Brands, funnels and automations shipped since 2017.",
    },
    ResultMetric {
        value: "+240%",
        label: "Qualified leads",
        description: "Average lift for clients after funnel and assistant rollout.",
    },
    ResultMetric {
        value: "3.8x",
        label: "Return on ad spend",
        description: "Median ROAS across managed paid social accounts in 2024.",
    },
    ResultMetric {
        value: "24/7",
        label: "Assistant coverage",
        description: "AI assistants answering customers outside office hours.",
    },
];

const AUTOMATION_VIDEOS: &[Video] = &[
    Video { id: 1, title: "Mapping a lead funnel", duration: "12:40", url: "https://videos.example.com/ai-101/1" },
    Video { id: 2, title: "Your first chatbot", duration: "18:05", url: "https://videos.example.com/ai-101/2" },
    Video { id: 3, title: "Adding voice", duration: "21:30", url: "https://videos.example.com/ai-101/3" },
];

const ADS_VIDEOS: &[Video] = &[
    Video { id: 1, title: "Account structure", duration: "09:15", url: "https://videos.example.com/ads/1" },
    Video { id: 2, title: "Creative testing", duration: "16:50", url: "https://videos.example.com/ads/2" },
];

pub(crate) const COURSES: &[Course] = &[
    Course {
        id: 1,
        title: "AI Automation for Small Business",
        description: "Build chat and voice assistants that answer customers and capture leads without code.",
        level: "Beginner",
        duration: "52 min",
        videos: AUTOMATION_VIDEOS,
    },
    Course {
        id: 2,
        title: "Paid Social That Pays",
        description: "A practical system for structuring, testing and scaling Meta ad accounts.",
        level: "Intermediate",
        duration: "26 min",
        videos: ADS_VIDEOS,
    },
];

pub(crate) const POSTS: &[BlogPost] = &[
    BlogPost {
        id: 1,
        title: "Why every landing page needs a voice assistant in 2025",
        excerpt: "Visitors ask questions faster than they read. Here is how a voice layer lifts conversion.",
        date: "2025-03-14",
        read_time: "6 min",
        category: "AI",
        image: "/images/blog/voice.webp",
    },
    BlogPost {
        id: 2,
        title: "The three-creative rule for ad testing",
        excerpt: "A lightweight testing cadence that keeps spend efficient without burning out your team.",
        date: "2025-01-22",
        read_time: "4 min",
        category: "Marketing",
        image: "/images/blog/creative.webp",
    },
    BlogPost {
        id: 3,
        title: "Design systems for one-person teams",
        excerpt: "You do not need a design ops department to stay consistent. Start with these five tokens.",
        date: "2024-11-08",
        read_time: "5 min",
        category: "Design",
        image: "/images/blog/tokens.webp",
    },
];

pub(crate) const NAV: &[NavItem] = &[
    NavItem { label: "Home", href: "#home" },
    NavItem { label: "Services", href: "#services" },
    NavItem { label: "Portfolio", href: "#portfolio" },
    NavItem { label: "Results", href: "#results" },
    NavItem { label: "Blog", href: "#blog" },
    NavItem { label: "Courses", href: "#courses" },
    NavItem { label: "AI Assistant", href: "#ai" },
];

pub(crate) const SOCIAL: &[SocialLink] = &[
    SocialLink { platform: "Instagram", url: "https://instagram.com/alexmoreau.studio", icon: "instagram" },
    SocialLink { platform: "LinkedIn", url: "https://linkedin.com/in/alexmoreau-studio", icon: "linkedin" },
    SocialLink { platform: "YouTube", url: "https://youtube.com/@alexmoreaustudio", icon: "youtube" },
    SocialLink { platform: "WhatsApp", url: "https://wa.me/351900000000", icon: "whatsapp" },
];
