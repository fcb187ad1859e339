// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::fixtures::sample_blueprint;
use crate::model::{
    ColorSlot, ContentValue, Page, PageSlug, Section, SectionId, SectionKind, ThemeMode,
};

use super::{
    apply_ops, diff, normalize_color, ApplyError, DocumentOp, Op, SectionOp, ThemeOp,
};

fn sid(value: &str) -> SectionId {
    SectionId::new(value).expect("section id")
}

fn home() -> PageSlug {
    PageSlug::new("home").expect("page slug")
}

fn layout(document: &crate::model::Blueprint) -> Vec<String> {
    document
        .home_page()
        .expect("home page")
        .sections()
        .iter()
        .map(|section| section.id().to_string())
        .collect()
}

#[test]
fn set_field_updates_only_the_target_section() {
    let before = sample_blueprint();
    let ops = [Op::Section(SectionOp::SetField {
        section_id: sid("hero-1"),
        key: "headline".to_owned(),
        value: ContentValue::from("Hello"),
    })];

    let result = apply_ops(&before, &ops).expect("apply");
    assert_eq!(result.applied, 1);
    assert_eq!(result.delta.updated, vec![sid("hero-1")]);
    assert!(!result.delta.theme);

    let (_, _, hero) = result.document.find_section(&sid("hero-1")).expect("hero");
    assert_eq!(hero.text("headline"), Some("Hello"));

    // Input is untouched.
    let (_, _, hero) = before.find_section(&sid("hero-1")).expect("hero");
    assert_eq!(hero.text("headline"), Some("Welcome"));
}

#[test]
fn writing_an_equal_value_records_nothing() {
    let before = sample_blueprint();
    let ops = [
        Op::Section(SectionOp::SetField {
            section_id: sid("hero-1"),
            key: "headline".to_owned(),
            value: ContentValue::from("Welcome"),
        }),
        Op::Theme(ThemeOp::SetMode { mode: ThemeMode::Light }),
        Op::Document(DocumentOp::Rename { name: "Rosie's Bakery".to_owned() }),
    ];

    let result = apply_ops(&before, &ops).expect("apply");
    assert!(result.delta.is_empty());
    assert_eq!(result.document, before);
}

#[test]
fn failing_op_leaves_input_untouched() {
    let before = sample_blueprint();
    let ops = [
        Op::Theme(ThemeOp::SetColor { slot: ColorSlot::Primary, value: "#000".to_owned() }),
        Op::Section(SectionOp::Remove { section_id: sid("missing-1") }),
    ];

    let err = apply_ops(&before, &ops).unwrap_err();
    assert_eq!(err, ApplyError::SectionNotFound { section_id: sid("missing-1") });
    assert_eq!(before.theme().primary, "#3b82f6");
}

#[test]
fn set_color_validates_and_normalizes() {
    let before = sample_blueprint();
    let ops = [Op::Theme(ThemeOp::SetColor {
        slot: ColorSlot::Accent,
        value: "#FF8800".to_owned(),
    })];
    let result = apply_ops(&before, &ops).expect("apply");
    assert!(result.delta.theme);
    assert_eq!(result.document.theme().accent, "#ff8800");

    let bad = [Op::Theme(ThemeOp::SetColor {
        slot: ColorSlot::Accent,
        value: "orange-ish".to_owned(),
    })];
    assert!(matches!(apply_ops(&before, &bad), Err(ApplyError::InvalidColor { .. })));

    assert_eq!(normalize_color("abc").expect("short form"), "#abc");
    assert!(normalize_color("#abcd").is_err());
}

#[test]
fn move_section_reorders_layout() {
    let before = sample_blueprint();
    let ops = [Op::Section(SectionOp::Move { section_id: sid("contact-1"), to_index: 0 })];

    let result = apply_ops(&before, &ops).expect("apply");
    assert_eq!(
        layout(&result.document),
        vec!["contact-1", "hero-1", "features-1", "testimonials-1"]
    );
    assert_eq!(result.delta.updated, vec![sid("contact-1")]);

    let out_of_range = [Op::Section(SectionOp::Move { section_id: sid("hero-1"), to_index: 4 })];
    assert_eq!(
        apply_ops(&before, &out_of_range).unwrap_err(),
        ApplyError::IndexOutOfRange { index: 4, len: 4 }
    );
}

#[test]
fn move_to_current_index_is_a_no_op() {
    let before = sample_blueprint();
    let ops = [Op::Section(SectionOp::Move { section_id: sid("features-1"), to_index: 1 })];
    let result = apply_ops(&before, &ops).expect("apply");
    assert!(result.delta.is_empty());
}

#[test]
fn insert_rejects_duplicate_ids_and_bad_pages() {
    let before = sample_blueprint();
    let pricing = Section::new(sid("pricing-1"), SectionKind::Pricing).with_field("title", "Plans");

    let ops = [Op::Section(SectionOp::Insert { page: home(), index: 2, section: pricing.clone() })];
    let result = apply_ops(&before, &ops).expect("apply");
    assert_eq!(result.delta.added, vec![sid("pricing-1")]);
    assert_eq!(layout(&result.document)[2], "pricing-1");

    let duplicate = Section::new(sid("hero-1"), SectionKind::Hero);
    let ops = [Op::Section(SectionOp::Insert { page: home(), index: 0, section: duplicate })];
    assert_eq!(
        apply_ops(&before, &ops).unwrap_err(),
        ApplyError::DuplicateSectionId { section_id: sid("hero-1") }
    );

    let about = PageSlug::new("about").expect("slug");
    let ops = [Op::Section(SectionOp::Insert { page: about.clone(), index: 0, section: pricing })];
    assert_eq!(apply_ops(&before, &ops).unwrap_err(), ApplyError::PageNotFound { slug: about });
}

#[test]
fn remove_then_insert_same_id_is_reported_as_update() {
    let before = sample_blueprint();
    let replacement = Section::new(sid("hero-1"), SectionKind::Hero).with_field("headline", "New");
    let ops = [
        Op::Section(SectionOp::Remove { section_id: sid("hero-1") }),
        Op::Section(SectionOp::Insert { page: home(), index: 0, section: replacement }),
    ];

    let result = apply_ops(&before, &ops).expect("apply");
    assert!(result.delta.added.is_empty());
    assert!(result.delta.removed.is_empty());
    assert_eq!(result.delta.updated, vec![sid("hero-1")]);
}

#[test]
fn replace_text_touches_every_matching_section() {
    let before = sample_blueprint();
    let ops = [Op::Document(DocumentOp::ReplaceText {
        find: "Rosie's".to_owned(),
        replace: "Marta's".to_owned(),
    })];

    let result = apply_ops(&before, &ops).expect("apply");
    assert_eq!(result.delta.updated, vec![sid("features-1")]);
    let (_, _, features) = result.document.find_section(&sid("features-1")).expect("features");
    assert_eq!(features.text("title"), Some("Why Marta's"));

    let empty = [Op::Document(DocumentOp::ReplaceText {
        find: String::new(),
        replace: "x".to_owned(),
    })];
    assert_eq!(apply_ops(&before, &empty).unwrap_err(), ApplyError::EmptySearchText);
}

#[test]
fn metadata_ops_flag_document_changes() {
    let before = sample_blueprint();
    let ops = [Op::Document(DocumentOp::SetMetadata { key: "description".to_owned(), value: None })];
    let result = apply_ops(&before, &ops).expect("apply");
    assert!(result.delta.document);
    assert!(result.document.metadata().is_empty());

    let missing = [Op::Document(DocumentOp::SetMetadata { key: "nope".to_owned(), value: None })];
    assert!(apply_ops(&before, &missing).expect("apply").delta.is_empty());
}

#[test]
fn diff_matches_apply_delta() {
    let before = sample_blueprint();
    let ops = [
        Op::Section(SectionOp::Remove { section_id: sid("testimonials-1") }),
        Op::Section(SectionOp::SetField {
            section_id: sid("contact-1"),
            key: "title".to_owned(),
            value: ContentValue::from("Come by"),
        }),
        Op::Theme(ThemeOp::SetFont { font: "Lora".to_owned() }),
    ];
    let result = apply_ops(&before, &ops).expect("apply");

    let computed = diff(&before, &result.document);
    assert_eq!(computed.removed, vec![sid("testimonials-1")]);
    // Removing a section shifts the ones below it.
    assert!(computed.updated.contains(&sid("contact-1")));
    assert!(computed.theme);
    assert!(!computed.document);
    assert!(diff(&before, &before).is_empty());
}

#[test]
fn page_ops_flag_page_changes() {
    let mut before = sample_blueprint();
    let menu = PageSlug::new("menu").expect("page slug");
    before.insert_page(Page::new(menu.clone(), "Menu"));

    let ops = [
        Op::Document(DocumentOp::SetPageTitle { page: home(), title: "Start".to_owned() }),
        Op::Document(DocumentOp::SetHomePage { page: menu.clone() }),
    ];
    let result = apply_ops(&before, &ops).expect("apply");
    assert!(result.delta.pages);
    assert!(!result.delta.document);
    assert_eq!(result.document.home_page_slug(), &menu);
    assert_eq!(result.document.page(&home()).expect("home").title(), "Start");
    assert_eq!(diff(&before, &result.document), result.delta);

    let same = [Op::Document(DocumentOp::SetHomePage { page: home() })];
    assert!(apply_ops(&before, &same).expect("apply").delta.is_empty());

    let missing = PageSlug::new("blog").expect("page slug");
    let err = apply_ops(&before, &[Op::Document(DocumentOp::SetHomePage { page: missing.clone() })])
        .unwrap_err();
    assert_eq!(err, ApplyError::PageNotFound { slug: missing });
}

#[test]
fn diff_sees_page_title_changes() {
    let before = sample_blueprint();
    let mut after = before.clone();
    after.page_mut(&home()).expect("home").set_title("Start");

    let delta = diff(&before, &after);
    assert!(delta.pages);
    assert!(!delta.is_empty());
    assert!(delta.updated.is_empty());
}

#[test]
fn ops_round_trip_through_json() {
    let op = Op::Section(SectionOp::Move { section_id: sid("hero-1"), to_index: 2 });
    let json = serde_json::to_value(&op).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({ "scope": "section", "op": "move", "section_id": "hero-1", "to_index": 2 })
    );
    let parsed: Op = serde_json::from_value(json).expect("deserialize");
    assert_eq!(parsed, op);
}
