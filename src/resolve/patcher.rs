// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deterministic command patcher.
//!
//! Matches an instruction against a fixed grammar of simple edits and turns a match into ops.
//! Pure and synchronous: no I/O, no state. A match that would not change the document (for
//! example a headline edit on a document without a hero section) is reported as not handled.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::{Captures, Regex, RegexBuilder};
use smallvec::SmallVec;

use super::{BusinessContext, Decline, Instruction, Resolution, Tier, TierKind};
use crate::model::{
    Blueprint, ColorSlot, ContentValue, Section, SectionId, SectionKind, ThemeMode,
};
use crate::ops::{apply_ops, normalize_color, Delta, DocumentOp, Op, SectionOp, ThemeOp};

pub type PatchOps = SmallVec<[Op; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Handled { document: Blueprint, ops: PatchOps, delta: Delta, message: String },
    NotHandled,
}

impl PatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }

    pub fn ops_applied(&self) -> usize {
        match self {
            Self::Handled { ops, .. } => ops.len(),
            Self::NotHandled => 0,
        }
    }
}

/// A named color and the primary/accent pair it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub primary: &'static str,
    pub accent: &'static str,
}

pub const PALETTES: &[Palette] = &[
    Palette { name: "blue", primary: "#2563eb", accent: "#60a5fa" },
    Palette { name: "red", primary: "#dc2626", accent: "#f87171" },
    Palette { name: "green", primary: "#16a34a", accent: "#4ade80" },
    Palette { name: "purple", primary: "#7c3aed", accent: "#a78bfa" },
    Palette { name: "orange", primary: "#ea580c", accent: "#fb923c" },
    Palette { name: "pink", primary: "#db2777", accent: "#f472b6" },
    Palette { name: "teal", primary: "#0d9488", accent: "#2dd4bf" },
    Palette { name: "yellow", primary: "#ca8a04", accent: "#facc15" },
    Palette { name: "gray", primary: "#4b5563", accent: "#9ca3af" },
    Palette { name: "black", primary: "#111827", accent: "#374151" },
];

pub fn palette(name: &str) -> Option<&'static Palette> {
    let name = name.trim().to_ascii_lowercase();
    let name = if name == "grey" { "gray" } else { name.as_str() };
    PALETTES.iter().find(|palette| palette.name == name)
}

struct Grammar {
    hero_field: Regex,
    make_it: Regex,
    color_slot: Regex,
    mode: Regex,
    font: Regex,
    replace: Regex,
    move_section: Regex,
    remove_section: Regex,
    add_section: Regex,
    rename: Regex,
}

fn pattern(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|err| panic!("invalid patcher pattern {source:?}: {err}"))
}

fn grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| Grammar {
        hero_field: pattern(
            r"^(?:change|set|update|make)\s+(?:the\s+)?(?:hero\s+)?(?P<field>headline|heading|title|subheadline|sub-headline|subtitle|tagline|button\s+text|button|cta\s+text|cta)\s+(?:to|to\s+say|say|=|:)\s+(?P<value>.+)$",
        ),
        make_it: pattern(
            r"^make\s+(?:it|everything|the\s+(?:site|website|page|theme|design))\s+(?:more\s+)?(?P<word>[a-z]+)$",
        ),
        color_slot: pattern(
            r"^(?:change|set|make)\s+(?:the\s+)?(?P<slot>primary|main|brand|secondary|accent)\s+colou?r\s+(?:to\s+)?(?P<value>#?[0-9a-f]{3}|#?[0-9a-f]{6}|[a-z]+)$",
        ),
        mode: pattern(
            r"^(?:(?:switch|change|go)\s+to|use|enable)\s+(?:a\s+)?(?P<mode>[a-z]+)\s+(?:mode|theme|style)$",
        ),
        font: pattern(
            r"^(?:(?:change|set|switch)\s+(?:the\s+)?font\s+to\s+(?P<to>.+)|use\s+(?:the\s+)?(?P<use>.+?)\s+font)$",
        ),
        replace: pattern(r"^replace\s+(?P<find>.+?)\s+with\s+(?P<replace>.+)$"),
        move_section: pattern(
            r"^move\s+(?:the\s+)?(?P<section>.+?)\s+section\s+(?:(?P<dir>up|down)|to\s+the\s+(?P<edge>top|bottom)|(?P<rel>above|before|below|after)\s+(?:the\s+)?(?P<anchor>.+?)(?:\s+section)?)$",
        ),
        remove_section: pattern(
            r"^(?:remove|delete|hide|drop)\s+(?:the\s+)?(?P<section>.+?)\s+section$",
        ),
        add_section: pattern(
            r"^add\s+(?:a|an|another)\s+(?:new\s+)?(?P<section>.+?)\s+section(?:\s+(?:at|to)\s+the\s+(?P<edge>top|bottom|end))?$",
        ),
        rename: pattern(
            r"^rename\s+(?:the\s+)?(?:business|site|website|company|shop)\s+to\s+(?P<name>.+)$",
        ),
    })
}

/// Strips one pair of matching quotes.
pub fn unquote(raw: &str) -> &str {
    let trimmed = raw.trim();
    for (open, close) in [('\'', '\''), ('"', '"'), ('“', '”'), ('‘', '’')] {
        if let Some(inner) = trimmed.strip_prefix(open).and_then(|rest| rest.strip_suffix(close)) {
            return inner;
        }
    }
    trimmed
}

fn text_field(field: &str) -> &'static str {
    match field.to_ascii_lowercase().as_str() {
        "subheadline" | "sub-headline" | "subtitle" | "tagline" => "subheadline",
        "button" | "button text" | "cta" | "cta text" => "ctaText",
        _ => "headline",
    }
}

fn section_of_kind(document: &Blueprint, phrase: &str) -> Option<SectionId> {
    let kind = SectionKind::from_phrase(unquote(phrase))?;
    document.first_section_of_kind(&kind).map(|section| section.id().clone())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandPatcher;

impl CommandPatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn patch(&self, document: &Blueprint, instruction: &Instruction) -> PatchOutcome {
        let Some((ops, message)) = match_instruction(document, instruction) else {
            return PatchOutcome::NotHandled;
        };
        match apply_ops(document, &ops) {
            Ok(result) if !result.delta.is_empty() => PatchOutcome::Handled {
                document: result.document,
                ops,
                delta: result.delta,
                message,
            },
            Ok(_) => PatchOutcome::NotHandled,
            Err(err) => {
                tracing::debug!(%err, "patch did not apply");
                PatchOutcome::NotHandled
            }
        }
    }
}

fn match_instruction(document: &Blueprint, instruction: &Instruction) -> Option<(PatchOps, String)> {
    let grammar = grammar();
    let command = instruction.command();

    if let Some(caps) = grammar.hero_field.captures(command) {
        return hero_field(document, instruction, &caps);
    }
    if let Some(caps) = grammar.color_slot.captures(command) {
        return color_slot(&caps);
    }
    if let Some(caps) = grammar.make_it.captures(command) {
        return make_it(&caps["word"]);
    }
    if let Some(caps) = grammar.mode.captures(command) {
        let mode = ThemeMode::from_word(&caps["mode"])?;
        return Some(set_mode(mode));
    }
    if let Some(caps) = grammar.font.captures(command) {
        let font = caps.name("to").or_else(|| caps.name("use"))?.as_str();
        let font = unquote(font);
        if font.is_empty() {
            return None;
        }
        let ops = PatchOps::from_iter([Op::Theme(ThemeOp::SetFont { font: font.to_owned() })]);
        return Some((ops, format!("Switched the font to {font}")));
    }
    if let Some(caps) = grammar.replace.captures(command) {
        let find = unquote(&caps["find"]).to_owned();
        let replace = instruction.trailing_value(&caps["replace"]);
        let message = format!("Replaced \"{find}\" with \"{replace}\"");
        let ops = PatchOps::from_iter([Op::Document(DocumentOp::ReplaceText { find, replace })]);
        return Some((ops, message));
    }
    if let Some(caps) = grammar.move_section.captures(command) {
        return move_section(document, &caps);
    }
    if let Some(caps) = grammar.remove_section.captures(command) {
        let section_id = section_of_kind(document, &caps["section"])?;
        let message = format!("Removed the {} section", &caps["section"]);
        let ops = PatchOps::from_iter([Op::Section(SectionOp::Remove { section_id })]);
        return Some((ops, message));
    }
    if let Some(caps) = grammar.add_section.captures(command) {
        return add_section(document, &caps);
    }
    if let Some(caps) = grammar.rename.captures(command) {
        let name = instruction.trailing_value(&caps["name"]);
        let message = format!("Renamed the business to {name}");
        let ops = PatchOps::from_iter([Op::Document(DocumentOp::Rename { name })]);
        return Some((ops, message));
    }
    None
}

fn hero_field(
    document: &Blueprint,
    instruction: &Instruction,
    caps: &Captures<'_>,
) -> Option<(PatchOps, String)> {
    let hero = document.first_section_of_kind(&SectionKind::Hero)?;
    let key = text_field(&caps["field"]);
    let value = instruction.trailing_value(&caps["value"]);
    let ops = PatchOps::from_iter([Op::Section(SectionOp::SetField {
        section_id: hero.id().clone(),
        key: key.to_owned(),
        value: ContentValue::from(value.as_str()),
    })]);
    Some((ops, format!("Updated the hero {key} to \"{value}\"")))
}

fn add_section(document: &Blueprint, caps: &Captures<'_>) -> Option<(PatchOps, String)> {
    let kind = SectionKind::from_phrase(unquote(&caps["section"]))?;
    let page = document.home_page()?;
    let at_top = caps.name("edge").is_some_and(|edge| edge.as_str().eq_ignore_ascii_case("top"));
    let index = if at_top { 0 } else { page.sections().len() };

    let section = Section::new(document.allocate_section_id(&kind), kind);
    let message = format!("Added a {} section", &caps["section"]);
    let ops = PatchOps::from_iter([Op::Section(SectionOp::Insert {
        page: page.slug().clone(),
        index,
        section,
    })]);
    Some((ops, message))
}

fn color_slot(caps: &Captures<'_>) -> Option<(PatchOps, String)> {
    let slot = match caps["slot"].to_ascii_lowercase().as_str() {
        "secondary" => ColorSlot::Secondary,
        "accent" => ColorSlot::Accent,
        _ => ColorSlot::Primary,
    };
    let raw = &caps["value"];
    let value = match palette(raw) {
        Some(palette) => palette.primary.to_owned(),
        None => normalize_color(raw).ok()?,
    };
    let message = format!("Set the {} color to {value}", slot.as_str());
    let ops = PatchOps::from_iter([Op::Theme(ThemeOp::SetColor { slot, value })]);
    Some((ops, message))
}

fn make_it(word: &str) -> Option<(PatchOps, String)> {
    if let Some(palette) = palette(word) {
        let ops = PatchOps::from_iter([
            Op::Theme(ThemeOp::SetColor {
                slot: ColorSlot::Primary,
                value: palette.primary.to_owned(),
            }),
            Op::Theme(ThemeOp::SetColor {
                slot: ColorSlot::Accent,
                value: palette.accent.to_owned(),
            }),
        ]);
        return Some((ops, format!("Applied the {} palette", palette.name)));
    }
    ThemeMode::from_word(word).map(set_mode)
}

fn set_mode(mode: ThemeMode) -> (PatchOps, String) {
    let ops = PatchOps::from_iter([Op::Theme(ThemeOp::SetMode { mode })]);
    (ops, format!("Switched to {} mode", mode.as_str()))
}

fn move_section(document: &Blueprint, caps: &Captures<'_>) -> Option<(PatchOps, String)> {
    let section_id = section_of_kind(document, &caps["section"])?;
    let (slug, from, _) = document.find_section(&section_id)?;
    let len = document.page(slug)?.sections().len();

    let to_index = if let Some(dir) = caps.name("dir") {
        if dir.as_str().eq_ignore_ascii_case("up") {
            from.checked_sub(1)?
        } else {
            (from + 1 < len).then_some(from + 1)?
        }
    } else if let Some(edge) = caps.name("edge") {
        if edge.as_str().eq_ignore_ascii_case("top") {
            0
        } else {
            len.checked_sub(1)?
        }
    } else {
        let anchor_id = section_of_kind(document, caps.name("anchor")?.as_str())?;
        let (anchor_slug, anchor, _) = document.find_section(&anchor_id)?;
        if anchor_slug != slug || anchor_id == section_id {
            return None;
        }
        let rel = caps.name("rel")?.as_str().to_ascii_lowercase();
        let above = matches!(rel.as_str(), "above" | "before");
        // Positions after the moved section shift left once it is taken out.
        match (above, from < anchor) {
            (true, true) => anchor - 1,
            (true, false) => anchor,
            (false, true) => anchor,
            (false, false) => anchor + 1,
        }
    };

    let message = format!("Moved the {} section", &caps["section"]);
    let ops = PatchOps::from_iter([Op::Section(SectionOp::Move { section_id, to_index })]);
    Some((ops, message))
}

#[async_trait]
impl Tier for CommandPatcher {
    fn kind(&self) -> TierKind {
        TierKind::Patcher
    }

    async fn resolve(
        &mut self,
        document: &Blueprint,
        instruction: &Instruction,
        _context: &BusinessContext,
    ) -> Result<Resolution, Decline> {
        match self.patch(document, instruction) {
            PatchOutcome::Handled { document, ops, delta, message } => Ok(Resolution {
                document,
                tier: TierKind::Patcher,
                message,
                ops: ops.into_vec(),
                delta,
            }),
            PatchOutcome::NotHandled => Err(Decline::PatchNotApplicable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{palette, unquote, CommandPatcher, PatchOutcome};
    use crate::model::fixtures::sample_blueprint;
    use crate::model::{Blueprint, SectionId, SectionKind, ThemeMode};
    use crate::ops::{apply_ops, Op, SectionOp};
    use crate::resolve::Instruction;

    fn patch(document: &Blueprint, text: &str) -> PatchOutcome {
        CommandPatcher::new().patch(document, &Instruction::new(text))
    }

    fn handled(document: &Blueprint, text: &str) -> Blueprint {
        match patch(document, text) {
            PatchOutcome::Handled { document, .. } => document,
            PatchOutcome::NotHandled => panic!("expected {text:?} to be handled"),
        }
    }

    fn layout(document: &Blueprint) -> Vec<String> {
        document
            .home_page()
            .expect("home")
            .sections()
            .iter()
            .map(|section| section.kind().to_string())
            .collect()
    }

    #[test]
    fn headline_change_touches_only_the_hero_headline() {
        let before = sample_blueprint();
        let outcome = patch(&before, "Change the headline to 'Hello'");
        assert_eq!(outcome.ops_applied(), 1);

        let PatchOutcome::Handled { document, delta, .. } = outcome else {
            panic!("expected handled");
        };
        let hero = SectionId::new("hero-1").expect("id");
        assert_eq!(delta.updated, vec![hero.clone()]);

        let expected = apply_ops(
            &before,
            &[Op::Section(SectionOp::SetField {
                section_id: hero,
                key: "headline".to_owned(),
                value: "Hello".into(),
            })],
        )
        .expect("apply")
        .document;
        assert_eq!(document, expected);
    }

    #[test]
    fn quoted_values_keep_their_case() {
        let after = handled(&sample_blueprint(), "please set the button text to “Book A Table”.");
        let hero = after.first_section_of_kind(&SectionKind::Hero).expect("hero");
        assert_eq!(hero.text("ctaText"), Some("Book A Table"));
    }

    #[test]
    fn unquoted_values_keep_exclamation_marks() {
        let after = handled(&sample_blueprint(), "change the headline to Hello!");
        let hero = after.first_section_of_kind(&SectionKind::Hero).expect("hero");
        assert_eq!(hero.text("headline"), Some("Hello!"));

        let after = handled(&sample_blueprint(), "change the headline to 'Hello'!");
        let hero = after.first_section_of_kind(&SectionKind::Hero).expect("hero");
        assert_eq!(hero.text("headline"), Some("Hello"));
    }

    #[test]
    fn headline_without_hero_is_not_handled() {
        let mut document = sample_blueprint();
        let hero = SectionId::new("hero-1").expect("id");
        document = apply_ops(&document, &[Op::Section(SectionOp::Remove { section_id: hero })])
            .expect("apply")
            .document;
        assert!(document.first_section_of_kind(&SectionKind::Hero).is_none());

        assert_eq!(patch(&document, "change the headline to Hello"), PatchOutcome::NotHandled);
    }

    #[test]
    fn make_it_blue_sets_primary_and_accent() {
        let before = sample_blueprint();
        let after = handled(&before, "Make it blue");
        let blue = palette("blue").expect("palette");
        assert_eq!(after.theme().primary, blue.primary);
        assert_eq!(after.theme().accent, blue.accent);
        assert_eq!(after.theme().secondary, before.theme().secondary);
        assert_eq!(after.sections().count(), before.sections().count());
    }

    #[test]
    fn unchanged_result_is_not_handled() {
        let blue = handled(&sample_blueprint(), "make it blue");
        assert_eq!(patch(&blue, "make it blue"), PatchOutcome::NotHandled);
    }

    #[test]
    fn modes_and_fonts() {
        let after = handled(&sample_blueprint(), "switch to dark mode");
        assert_eq!(after.theme().mode, ThemeMode::Dark);
        let after = handled(&after, "make it elegant");
        assert_eq!(after.theme().mode, ThemeMode::Elegant);
        let after = handled(&after, "use Playfair Display font");
        assert_eq!(after.theme().font, "Playfair Display");
        let after = handled(&after, "change the font to 'Lora'");
        assert_eq!(after.theme().font, "Lora");
    }

    #[test]
    fn color_slot_accepts_hex_and_palette_names() {
        let after = handled(&sample_blueprint(), "change the accent color to #FF8800");
        assert_eq!(after.theme().accent, "#ff8800");
        let after = handled(&after, "set the secondary colour to green");
        assert_eq!(after.theme().secondary, palette("green").expect("palette").primary);
        assert_eq!(patch(&after, "change the accent color to banana"), PatchOutcome::NotHandled);
    }

    #[test]
    fn replace_text_and_rename() {
        let after = handled(&sample_blueprint(), "replace 'Local flour' with 'Organic flour'");
        let features = after.first_section_of_kind(&SectionKind::Features).expect("features");
        assert_eq!(features.text("item2"), Some("Organic flour"));

        let after = handled(&after, "rename the business to Marta's Bakery");
        assert_eq!(after.name(), "Marta's Bakery");
    }

    #[test]
    fn section_moves() {
        let before = sample_blueprint();
        let after = handled(&before, "move the contact section to the top");
        assert_eq!(layout(&after), ["contact", "hero", "features", "testimonials"]);

        let after = handled(&before, "move the reviews section up");
        assert_eq!(layout(&after), ["hero", "testimonials", "features", "contact"]);

        let after = handled(&before, "move the hero section below the features section");
        assert_eq!(layout(&after), ["features", "hero", "testimonials", "contact"]);

        let after = handled(&before, "move the contact section above the features");
        assert_eq!(layout(&after), ["hero", "contact", "features", "testimonials"]);

        assert_eq!(patch(&before, "move the hero section up"), PatchOutcome::NotHandled);
        assert_eq!(patch(&before, "move the pricing section down"), PatchOutcome::NotHandled);
    }

    #[test]
    fn section_removal_by_kind() {
        let after = handled(&sample_blueprint(), "Remove the testimonials section");
        assert!(after.first_section_of_kind(&SectionKind::Testimonials).is_none());
        assert_eq!(patch(&after, "remove the testimonials section"), PatchOutcome::NotHandled);
    }

    #[test]
    fn sections_are_added_with_fresh_ids() {
        let before = sample_blueprint();
        let PatchOutcome::Handled { document, delta, .. } = patch(&before, "add a FAQ section") else {
            panic!("expected handled");
        };
        assert_eq!(layout(&document), ["hero", "features", "testimonials", "contact", "faq"]);
        assert_eq!(delta.added, vec![SectionId::new("faq-1").expect("id")]);

        let after = handled(&before, "add another hero section at the top");
        let first = &after.home_page().expect("home").sections()[0];
        assert_eq!(first.id().as_str(), "hero-2");
        assert_eq!(layout(&after)[..2], ["hero", "hero"]);

        assert_eq!(patch(&before, "add a spaceship section"), PatchOutcome::NotHandled);
    }

    #[test]
    fn unknown_instructions_are_not_handled() {
        let document = sample_blueprint();
        for text in ["make it pop", "add a blog", "", "make the second one bigger"] {
            assert_eq!(patch(&document, text), PatchOutcome::NotHandled, "{text}");
        }
    }

    #[test]
    fn unquote_strips_one_pair() {
        assert_eq!(unquote("'Hello'"), "Hello");
        assert_eq!(unquote("\"Hi\""), "Hi");
        assert_eq!(unquote("“Smart”"), "Smart");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("'unbalanced"), "'unbalanced");
    }
}
