// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Built-in sample documents used by `--demo`, tests and benches.

use super::blueprint::{Blueprint, Theme};
use super::ids::{BlueprintId, PageSlug, SectionId};
use super::page::{ContentValue, Page, Section, SectionKind};

pub const SAMPLE_ASSET_HOST: &str = "https://cdn.example.com";

fn sid(value: &str) -> SectionId {
    SectionId::new(value).expect("section id")
}

pub fn owned_asset_url(blueprint_id: &BlueprintId, file_name: &str) -> String {
    format!("{SAMPLE_ASSET_HOST}/blueprint-assets/{blueprint_id}/{file_name}")
}

/// A one-page bakery site: hero, features, testimonials, contact.
pub fn sample_blueprint() -> Blueprint {
    let id = BlueprintId::new("bp-1").expect("blueprint id");
    let hero_image = owned_asset_url(&id, "hero.jpg");

    let home = Page::new(PageSlug::new("home").expect("page slug"), "Home")
        .with_section(
            Section::new(sid("hero-1"), SectionKind::Hero)
                .with_field("headline", "Welcome")
                .with_field("subheadline", "Fresh bread every morning")
                .with_field("ctaText", "Order now")
                .with_field("image", hero_image),
        )
        .with_section(
            Section::new(sid("features-1"), SectionKind::Features)
                .with_field("title", "Why Rosie's")
                .with_field("item1", "Sourdough starter since 1987")
                .with_field("item2", "Local flour")
                .with_field("columns", 2_i64),
        )
        .with_section(
            Section::new(sid("testimonials-1"), SectionKind::Testimonials)
                .with_field("title", "What neighbours say")
                .with_field("quote1", "The best croissant in town."),
        )
        .with_section(
            Section::new(sid("contact-1"), SectionKind::Contact)
                .with_field("title", "Visit us")
                .with_field("email", "hello@rosies.example")
                .with_field("showMap", true),
        );

    let mut blueprint = Blueprint::new(id, "Rosie's Bakery", Theme::default(), home);
    blueprint
        .metadata_mut()
        .insert("description".to_owned(), ContentValue::from("Neighbourhood bakery"));
    blueprint
}
