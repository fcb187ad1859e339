// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Conversational refinement.
//!
//! Keeps a short rolling memory of applied instructions and uses it to resolve follow-ups that
//! only make sense in context: "change it back", "do it again", "make the second one bigger",
//! "remove the testimonals section".

use std::collections::{BTreeMap, VecDeque};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use super::patcher::unquote;
use super::{AppliedInstruction, BusinessContext, Decline, Instruction, Resolution, Tier, TierKind};
use crate::model::{Blueprint, ContentValue, PageSlug, Section, SectionId, SectionKind};
use crate::ops::{apply_ops, diff, DocumentOp, Op, SectionOp, ThemeOp};

pub const DEFAULT_REFINEMENT_MEMORY: usize = 5;

/// Minimum `rapidfuzz` ratio for a fuzzy section reference.
const FUZZY_THRESHOLD: f64 = 0.75;

const SIZE_STEPS: [&str; 5] = ["xs", "sm", "md", "lg", "xl"];
const DEFAULT_SIZE: &str = "md";

struct Rules {
    revert: Regex,
    repeat: Regex,
    resize: Regex,
    remove: Regex,
    move_to: Regex,
    set_its: Regex,
    set_of: Regex,
    ordinal: Regex,
}

fn pattern(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|err| panic!("invalid refinement pattern {source:?}: {err}"))
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        revert: pattern(
            r"^(?:(?:change|put|set|turn)\s+(?:it|that|this|them)\s+back(?:\s+to\s+how\s+it\s+was)?|(?:undo|revert)\s+(?:that|it|this|the\s+last\s+change)|go\s+back|never\s*mind)$",
        ),
        repeat: pattern(r"^(?:(?:do|try)\s+(?:it|that)\s+again|again|one\s+more\s+time|repeat(?:\s+that)?)$"),
        resize: pattern(
            r"^make\s+(?P<target>.+?)\s+(?:a\s+bit\s+|a\s+little\s+|even\s+)?(?P<dir>bigger|larger|smaller|tinier)$",
        ),
        remove: pattern(r"^(?:remove|delete|hide|drop)\s+(?P<target>.+)$"),
        move_to: pattern(
            r"^move\s+(?P<target>.+?)\s+(?:(?P<dir>up|down)|to\s+the\s+(?P<edge>top|bottom))$",
        ),
        set_its: pattern(
            r"^(?:change|set|update|make)\s+(?P<target>its|their)\s+(?P<field>[a-z][a-z ]*?)\s+(?:to|to\s+say)\s+(?P<value>.+)$",
        ),
        set_of: pattern(
            r"^(?:change|set|update)\s+the\s+(?P<field>[a-z][a-z ]*?)\s+(?:of|in|on)\s+(?P<target>.+?)\s+to\s+(?P<value>.+)$",
        ),
        ordinal: pattern(
            r"^(?:the\s+)?(?P<nth>first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|last|\d+(?:st|nd|rd|th))\s+(?:one|section|block)$",
        ),
    })
}

#[derive(Debug, Clone)]
pub struct RefinementEngine {
    memory: VecDeque<AppliedInstruction>,
    limit: usize,
}

impl RefinementEngine {
    pub fn new(limit: usize) -> Self {
        Self { memory: VecDeque::new(), limit: limit.max(1) }
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    pub fn remember(&mut self, applied: AppliedInstruction) {
        self.memory.push_back(applied);
        while self.memory.len() > self.limit {
            self.memory.pop_front();
        }
    }

    pub fn forget(&mut self) {
        self.memory.clear();
    }

    pub fn refine(
        &self,
        document: &Blueprint,
        instruction: &Instruction,
    ) -> Result<Resolution, Decline> {
        let rules = rules();
        let command = instruction.command();

        if rules.revert.is_match(command) {
            return self.revert(document);
        }
        if rules.repeat.is_match(command) {
            return self.repeat(document);
        }
        if let Some(caps) = rules.resize.captures(command) {
            let section_id = self.target(document, &caps["target"])?;
            let bigger = matches!(caps["dir"].to_ascii_lowercase().as_str(), "bigger" | "larger");
            return self.resize(document, &section_id, bigger);
        }
        if let Some(caps) = rules.set_its.captures(command).or_else(|| rules.set_of.captures(command)) {
            let section_id = self.target(document, &caps["target"])?;
            let value = instruction.trailing_value(&caps["value"]);
            return self.set_field(document, &section_id, &caps["field"], &value);
        }
        if let Some(caps) = rules.move_to.captures(command) {
            let section_id = self.target(document, &caps["target"])?;
            return self.move_section(
                document,
                &section_id,
                caps.name("dir").map(|m| m.as_str().to_ascii_lowercase()),
                caps.name("edge").map(|m| m.as_str().to_ascii_lowercase()),
            );
        }
        if let Some(caps) = rules.remove.captures(command) {
            let section_id = self.target(document, &caps["target"])?;
            let label = section_label(document, &section_id);
            let ops = vec![Op::Section(SectionOp::Remove { section_id })];
            return finish(document, ops, format!("Removed the {label}"));
        }

        Err(ambiguous("no follow-up rule matches"))
    }

    fn last(&self) -> Result<&AppliedInstruction, Decline> {
        self.memory.back().ok_or_else(|| ambiguous("no earlier instruction to refer to"))
    }

    fn revert(&self, document: &Blueprint) -> Result<Resolution, Decline> {
        let last = self.last()?;
        let message = format!("Reverted \"{}\"", last.instruction.text());

        if document == &*last.after {
            // Nothing happened since the last instruction: restore its input wholesale.
            let mut restored = last.before.to_blueprint();
            restored.touch(document.updated_at());
            let delta = diff(document, &restored);
            return Ok(Resolution {
                document: restored,
                tier: TierKind::Refinement,
                message,
                ops: Vec::new(),
                delta,
            });
        }

        let ops = restore_ops(&last.before, document, last);
        if ops.is_empty() {
            return Err(ambiguous("the last change no longer applies"));
        }
        finish(document, ops, message)
    }

    fn repeat(&self, document: &Blueprint) -> Result<Resolution, Decline> {
        let last = self.last()?;
        if last.ops.is_empty() {
            return Err(ambiguous("the last change cannot be repeated locally"));
        }

        // Resizes step relative to the current value, so they are recomputed.
        let mut ops = Vec::with_capacity(last.ops.len());
        for op in &last.ops {
            match op {
                Op::Section(SectionOp::SetField { section_id, key, value }) if key == "size" => {
                    let before = last
                        .before
                        .find_section(section_id)
                        .and_then(|(_, _, section)| section.text("size"))
                        .unwrap_or(DEFAULT_SIZE);
                    let bigger = size_index(value.as_text().unwrap_or(DEFAULT_SIZE))
                        > size_index(before);
                    let current = document
                        .find_section(section_id)
                        .ok_or_else(|| ambiguous("the section no longer exists"))?
                        .2;
                    let Some(next) = step_size(current, bigger) else {
                        return Err(ambiguous("the section is already at its limit"));
                    };
                    ops.push(Op::Section(SectionOp::SetField {
                        section_id: section_id.clone(),
                        key: key.clone(),
                        value: ContentValue::from(next),
                    }));
                }
                other => ops.push(other.clone()),
            }
        }
        finish(document, ops, format!("Repeated \"{}\"", last.instruction.text()))
    }

    fn resize(
        &self,
        document: &Blueprint,
        section_id: &SectionId,
        bigger: bool,
    ) -> Result<Resolution, Decline> {
        let (_, _, section) =
            document.find_section(section_id).ok_or_else(|| ambiguous("section is gone"))?;
        let Some(next) = step_size(section, bigger) else {
            return Err(ambiguous("the section is already at its limit"));
        };
        let label = section_label(document, section_id);
        let ops = vec![Op::Section(SectionOp::SetField {
            section_id: section_id.clone(),
            key: "size".to_owned(),
            value: ContentValue::from(next),
        })];
        let verb = if bigger { "bigger" } else { "smaller" };
        finish(document, ops, format!("Made the {label} {verb}"))
    }

    fn set_field(
        &self,
        document: &Blueprint,
        section_id: &SectionId,
        field: &str,
        value: &str,
    ) -> Result<Resolution, Decline> {
        let (_, _, section) =
            document.find_section(section_id).ok_or_else(|| ambiguous("section is gone"))?;
        let key = field_key(section, field);
        let label = section_label(document, section_id);
        let ops = vec![Op::Section(SectionOp::SetField {
            section_id: section_id.clone(),
            key: key.clone(),
            value: ContentValue::from(value),
        })];
        finish(document, ops, format!("Set the {label} {key} to \"{value}\""))
    }

    fn move_section(
        &self,
        document: &Blueprint,
        section_id: &SectionId,
        dir: Option<String>,
        edge: Option<String>,
    ) -> Result<Resolution, Decline> {
        let (slug, from, _) =
            document.find_section(section_id).ok_or_else(|| ambiguous("section is gone"))?;
        let len = document.page(slug).map_or(0, |page| page.sections().len());
        let to_index = match (dir.as_deref(), edge.as_deref()) {
            (Some("up"), _) => from.checked_sub(1),
            (Some(_), _) => (from + 1 < len).then_some(from + 1),
            (None, Some("top")) => Some(0),
            (None, _) => len.checked_sub(1),
        }
        .ok_or_else(|| ambiguous("the section cannot move further"))?;

        let label = section_label(document, section_id);
        let ops = vec![Op::Section(SectionOp::Move { section_id: section_id.clone(), to_index })];
        finish(document, ops, format!("Moved the {label}"))
    }

    /// Resolves a pronoun, ordinal or fuzzy section reference.
    fn target(&self, document: &Blueprint, phrase: &str) -> Result<SectionId, Decline> {
        let phrase = unquote(phrase).trim().to_lowercase();

        if matches!(
            phrase.as_str(),
            "it" | "its" | "that" | "this" | "them" | "their" | "that section" | "this section"
                | "the section" | "that one" | "this one"
        ) {
            return self.focus(document).ok_or_else(|| ambiguous("nothing is in focus"));
        }

        if let Some(caps) = rules().ordinal.captures(&phrase) {
            let page = self.focus_page(document);
            let sections = document.page(&page).map(|page| page.sections()).unwrap_or_default();
            let nth = caps["nth"].to_ascii_lowercase();
            let index = if nth == "last" {
                sections.len().checked_sub(1)
            } else {
                ordinal_index(&nth)
            };
            return index
                .and_then(|index| sections.get(index))
                .map(|section| section.id().clone())
                .ok_or_else(|| ambiguous(format!("there is no {nth} section")));
        }

        fuzzy_section(document, &phrase)
            .ok_or_else(|| ambiguous(format!("no section matches \"{phrase}\"")))
    }

    /// Most recently focused section that still exists.
    fn focus(&self, document: &Blueprint) -> Option<SectionId> {
        self.memory
            .iter()
            .rev()
            .filter_map(|applied| applied.delta.focus())
            .find(|section_id| document.find_section(section_id).is_some())
            .cloned()
    }

    fn focus_page(&self, document: &Blueprint) -> PageSlug {
        self.focus(document)
            .and_then(|section_id| document.find_section(&section_id).map(|(slug, _, _)| slug.clone()))
            .unwrap_or_else(|| document.home_page_slug().clone())
    }
}

fn ambiguous(reason: impl Into<String>) -> Decline {
    Decline::RefinementAmbiguous { reason: reason.into() }
}

fn finish(document: &Blueprint, ops: Vec<Op>, message: String) -> Result<Resolution, Decline> {
    let result = apply_ops(document, &ops).map_err(|err| ambiguous(err.to_string()))?;
    Ok(Resolution {
        document: result.document,
        tier: TierKind::Refinement,
        message,
        ops,
        delta: result.delta,
    })
}

fn section_label(document: &Blueprint, section_id: &SectionId) -> String {
    document
        .find_section(section_id)
        .map(|(_, _, section)| format!("{} section", section.kind()))
        .unwrap_or_else(|| format!("section {section_id}"))
}

fn ordinal_index(word: &str) -> Option<usize> {
    const WORDS: [&str; 10] = [
        "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
        "tenth",
    ];
    if let Some(index) = WORDS.iter().position(|candidate| *candidate == word) {
        return Some(index);
    }
    let digits = word.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    digits.parse::<usize>().ok()?.checked_sub(1)
}

fn size_index(size: &str) -> usize {
    SIZE_STEPS.iter().position(|step| *step == size).unwrap_or(2)
}

fn step_size(section: &Section, bigger: bool) -> Option<&'static str> {
    let current = size_index(section.text("size").unwrap_or(DEFAULT_SIZE));
    let next = if bigger { current.checked_add(1)? } else { current.checked_sub(1)? };
    SIZE_STEPS.get(next).copied()
}

/// Maps a spoken field name onto a key the section actually uses.
fn field_key(section: &Section, field: &str) -> String {
    let field = field.trim().to_lowercase();
    let candidates: &[&str] = match field.as_str() {
        "headline" | "title" | "heading" => &["headline", "title", "heading"],
        "subheadline" | "subtitle" | "tagline" => &["subheadline", "subtitle", "tagline"],
        "button" | "button text" | "cta" => &["ctaText", "buttonText"],
        _ => &[],
    };
    if let Some(existing) = candidates.iter().find(|key| section.field(key).is_some()) {
        return (*existing).to_owned();
    }
    if let Some(first) = candidates.first() {
        return (*first).to_owned();
    }

    // "image url" -> "imageUrl"
    let mut key = String::new();
    for (idx, word) in field.split_whitespace().enumerate() {
        if idx == 0 {
            key.push_str(word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                key.extend(first.to_uppercase());
                key.push_str(chars.as_str());
            }
        }
    }
    key
}

fn fuzzy_section(document: &Blueprint, phrase: &str) -> Option<SectionId> {
    let phrase = phrase.strip_prefix("the ").unwrap_or(phrase);
    let phrase = phrase
        .strip_suffix(" section")
        .or_else(|| phrase.strip_suffix(" block"))
        .unwrap_or(phrase)
        .trim();
    let phrase = unquote(phrase).to_lowercase();
    if phrase.is_empty() {
        return None;
    }

    if let Some(kind) = SectionKind::from_phrase(&phrase) {
        if let Some(section) = document.first_section_of_kind(&kind) {
            return Some(section.id().clone());
        }
    }

    let mut best: Option<(f64, SectionId)> = None;
    for (_, section) in document.sections() {
        let mut candidates = vec![section.kind().as_str().to_lowercase()];
        if let Some(title) = section.display_title() {
            candidates.push(title.to_lowercase());
        }
        for candidate in candidates {
            let score = rapidfuzz::fuzz::ratio(phrase.chars(), candidate.chars());
            if score >= FUZZY_THRESHOLD && best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, section.id().clone()));
            }
        }
    }
    best.map(|(_, section_id)| section_id)
}

/// Ops that restore whatever `last` changed, using `before` as the source of truth.
fn restore_ops(before: &Blueprint, current: &Blueprint, last: &AppliedInstruction) -> Vec<Op> {
    let mut ops = Vec::new();

    if last.delta.theme {
        let theme = before.theme();
        for slot in [
            crate::model::ColorSlot::Primary,
            crate::model::ColorSlot::Secondary,
            crate::model::ColorSlot::Accent,
        ] {
            ops.push(Op::Theme(ThemeOp::SetColor { slot, value: theme.color(slot).to_owned() }));
        }
        ops.push(Op::Theme(ThemeOp::SetFont { font: theme.font.clone() }));
        ops.push(Op::Theme(ThemeOp::SetMode { mode: theme.mode }));
    }

    if last.delta.document {
        ops.push(Op::Document(DocumentOp::Rename { name: before.name().to_owned() }));
        for (key, value) in before.metadata() {
            ops.push(Op::Document(DocumentOp::SetMetadata {
                key: key.clone(),
                value: Some(value.clone()),
            }));
        }
        for key in current.metadata().keys().filter(|key| !before.metadata().contains_key(*key)) {
            ops.push(Op::Document(DocumentOp::SetMetadata { key: key.clone(), value: None }));
        }
    }

    if last.delta.pages {
        for (slug, page) in before.pages() {
            if current.page(slug).is_some_and(|now| now.title() != page.title()) {
                ops.push(Op::Document(DocumentOp::SetPageTitle {
                    page: slug.clone(),
                    title: page.title().to_owned(),
                }));
            }
        }
        let home = before.home_page_slug();
        if home != current.home_page_slug() && current.page(home).is_some() {
            ops.push(Op::Document(DocumentOp::SetHomePage { page: home.clone() }));
        }
    }

    // Page lengths as the structural ops below leave them.
    let mut lengths = current
        .pages()
        .iter()
        .map(|(slug, page)| (slug.clone(), page.sections().len()))
        .collect::<BTreeMap<_, _>>();

    for section_id in &last.delta.added {
        if let Some((slug, _, _)) = current.find_section(section_id) {
            if let Some(len) = lengths.get_mut(slug) {
                *len -= 1;
            }
            ops.push(Op::Section(SectionOp::Remove { section_id: section_id.clone() }));
        }
    }

    let mut removed = last
        .delta
        .removed
        .iter()
        .filter(|section_id| current.find_section(section_id).is_none())
        .filter_map(|section_id| before.find_section(section_id))
        .collect::<Vec<_>>();
    removed.sort_by_key(|(_, index, _)| *index);
    for (slug, index, section) in removed {
        let Some(len) = lengths.get_mut(slug) else {
            continue;
        };
        ops.push(Op::Section(SectionOp::Insert {
            page: slug.clone(),
            index: index.min(*len),
            section: section.clone(),
        }));
        *len += 1;
    }

    for section_id in &last.delta.updated {
        let (Some((before_slug, before_index, old)), Some((slug, _, now))) =
            (before.find_section(section_id), current.find_section(section_id))
        else {
            continue;
        };
        for (key, value) in old.content() {
            ops.push(Op::Section(SectionOp::SetField {
                section_id: section_id.clone(),
                key: key.clone(),
                value: value.clone(),
            }));
        }
        for key in now.content().keys().filter(|key| old.field(key).is_none()) {
            ops.push(Op::Section(SectionOp::RemoveField {
                section_id: section_id.clone(),
                key: key.clone(),
            }));
        }
        let len = lengths.get(slug).copied().unwrap_or(0);
        if before_slug == slug && before_index < len {
            ops.push(Op::Section(SectionOp::Move {
                section_id: section_id.clone(),
                to_index: before_index,
            }));
        }
    }

    ops
}

#[async_trait]
impl Tier for RefinementEngine {
    fn kind(&self) -> TierKind {
        TierKind::Refinement
    }

    async fn resolve(
        &mut self,
        document: &Blueprint,
        instruction: &Instruction,
        _context: &BusinessContext,
    ) -> Result<Resolution, Decline> {
        self.refine(document, instruction)
    }

    fn observe(&mut self, applied: &AppliedInstruction) {
        self.remember(applied.clone());
    }

    fn reset(&mut self) {
        self.forget();
    }
}

#[cfg(test)]
mod tests {
    use super::{RefinementEngine, DEFAULT_REFINEMENT_MEMORY};
    use crate::history::Snapshot;
    use crate::model::fixtures::sample_blueprint;
    use crate::model::{Blueprint, ContentValue, Section, SectionId, SectionKind};
    use crate::ops::{apply_ops, diff, Op, SectionOp};
    use crate::resolve::patcher::CommandPatcher;
    use crate::resolve::{AppliedInstruction, Decline, Instruction, PatchOutcome, TierKind};

    fn sid(value: &str) -> SectionId {
        SectionId::new(value).expect("section id")
    }

    struct Conversation {
        engine: RefinementEngine,
        document: Blueprint,
    }

    impl Conversation {
        fn new() -> Self {
            Self { engine: RefinementEngine::new(DEFAULT_REFINEMENT_MEMORY), document: sample_blueprint() }
        }

        /// Applies an instruction through the patcher, then refinement, and records it.
        fn say(&mut self, text: &str) -> Result<String, Decline> {
            let instruction = Instruction::new(text);
            let (document, tier, ops, delta, message) =
                match CommandPatcher::new().patch(&self.document, &instruction) {
                    PatchOutcome::Handled { document, ops, delta, message } => {
                        (document, TierKind::Patcher, ops.into_vec(), delta, message)
                    }
                    PatchOutcome::NotHandled => {
                        let resolution = self.engine.refine(&self.document, &instruction)?;
                        (
                            resolution.document,
                            resolution.tier,
                            resolution.ops,
                            resolution.delta,
                            resolution.message,
                        )
                    }
                };
            if delta.is_empty() {
                return Err(Decline::RefinementAmbiguous { reason: "no change".to_owned() });
            }
            self.engine.remember(AppliedInstruction {
                instruction,
                tier,
                before: Snapshot::new(self.document.clone()),
                after: Snapshot::new(document.clone()),
                ops,
                delta,
            });
            self.document = document;
            Ok(message)
        }

        fn size_of(&self, id: &str) -> Option<String> {
            self.document
                .find_section(&sid(id))
                .and_then(|(_, _, section)| section.text("size").map(str::to_owned))
        }
    }

    #[test]
    fn change_it_back_restores_the_previous_document() {
        let mut chat = Conversation::new();
        let original = chat.document.clone();
        chat.say("make it blue").expect("patch");
        assert_ne!(chat.document.theme(), original.theme());

        chat.say("change it back").expect("revert");
        assert_eq!(chat.document, original);
    }

    #[test]
    fn revert_only_touches_fields_of_the_last_change() {
        let mut chat = Conversation::new();
        chat.say("change the headline to 'Hello'").expect("patch");

        // Edit made outside the conversation after the instruction.
        chat.document = apply_ops(
            &chat.document,
            &[Op::Section(SectionOp::SetField {
                section_id: sid("contact-1"),
                key: "title".to_owned(),
                value: ContentValue::from("Drop by"),
            })],
        )
        .expect("apply")
        .document;

        chat.say("undo that").expect("revert");
        let (_, _, hero) = chat.document.find_section(&sid("hero-1")).expect("hero");
        assert_eq!(hero.text("headline"), Some("Welcome"));
        let (_, _, contact) = chat.document.find_section(&sid("contact-1")).expect("contact");
        assert_eq!(contact.text("title"), Some("Drop by"));
    }

    #[test]
    fn revert_restores_a_removed_section_in_place() {
        let mut chat = Conversation::new();
        chat.say("remove the testimonials section").expect("patch");
        assert!(chat.document.find_section(&sid("testimonials-1")).is_none());

        chat.document = apply_ops(
            &chat.document,
            &[Op::Section(SectionOp::SetField {
                section_id: sid("contact-1"),
                key: "title".to_owned(),
                value: ContentValue::from("Drop by"),
            })],
        )
        .expect("apply")
        .document;

        chat.say("change it back").expect("revert");
        let (_, index, _) = chat.document.find_section(&sid("testimonials-1")).expect("restored");
        assert_eq!(index, 2);
        let (_, _, contact) = chat.document.find_section(&sid("contact-1")).expect("contact");
        assert_eq!(contact.text("title"), Some("Drop by"));
    }

    #[test]
    fn revert_drops_an_added_section_and_restores_page_titles() {
        let original = sample_blueprint();
        let home = original.home_page_slug().clone();
        let faq = Section::new(sid("faq-1"), SectionKind::Faq);
        let mut generated = apply_ops(
            &original,
            &[Op::Section(SectionOp::Insert { page: home.clone(), index: 1, section: faq })],
        )
        .expect("apply")
        .document;
        generated.page_mut(&home).expect("home").set_title("Start");

        let mut engine = RefinementEngine::new(DEFAULT_REFINEMENT_MEMORY);
        engine.remember(AppliedInstruction {
            instruction: Instruction::new("add a faq and call the page Start"),
            tier: TierKind::Remote,
            before: Snapshot::new(original.clone()),
            after: Snapshot::new(generated.clone()),
            ops: Vec::new(),
            delta: diff(&original, &generated),
        });

        let current = apply_ops(
            &generated,
            &[Op::Section(SectionOp::SetField {
                section_id: sid("contact-1"),
                key: "title".to_owned(),
                value: ContentValue::from("Drop by"),
            })],
        )
        .expect("apply")
        .document;

        let resolution =
            engine.refine(&current, &Instruction::new("change it back")).expect("revert");
        let document = resolution.document;
        assert!(document.find_section(&sid("faq-1")).is_none());
        let title = |document: &Blueprint| document.page(&home).expect("home").title().to_owned();
        assert_eq!(title(&document), title(&original));
        let (_, _, contact) = document.find_section(&sid("contact-1")).expect("contact");
        assert_eq!(contact.text("title"), Some("Drop by"));
        assert!(resolution.delta.pages);
        assert_eq!(resolution.delta.removed, vec![sid("faq-1")]);
    }

    #[test]
    fn ordinal_and_pronoun_references_resize() {
        let mut chat = Conversation::new();
        chat.say("make the second one bigger").expect("resize");
        assert_eq!(chat.size_of("features-1").as_deref(), Some("lg"));

        chat.say("make it bigger").expect("resize focus");
        assert_eq!(chat.size_of("features-1").as_deref(), Some("xl"));

        let err = chat.say("make it bigger").unwrap_err();
        assert!(matches!(err, Decline::RefinementAmbiguous { .. }));

        chat.say("make the last section smaller").expect("resize last");
        assert_eq!(chat.size_of("contact-1").as_deref(), Some("sm"));
    }

    #[test]
    fn do_it_again_steps_once_more() {
        let mut chat = Conversation::new();
        chat.say("make the first one smaller").expect("resize");
        chat.say("do it again").expect("repeat");
        assert_eq!(chat.size_of("hero-1").as_deref(), Some("xs"));
    }

    #[test]
    fn fuzzy_names_resolve_sections() {
        let mut chat = Conversation::new();
        chat.say("remove the testimonals section").expect("fuzzy remove");
        assert!(chat.document.first_section_of_kind(&SectionKind::Testimonials).is_none());

        chat.say("set the title of the 'Visit us' section to Find us!").expect("title match");
        let (_, _, contact) = chat.document.find_section(&sid("contact-1")).expect("contact");
        assert_eq!(contact.text("title"), Some("Find us!"));

        chat.say("change its email to 'bake@rosies.example'").expect("pronoun");
        let (_, _, contact) = chat.document.find_section(&sid("contact-1")).expect("contact");
        assert_eq!(contact.text("email"), Some("bake@rosies.example"));
    }

    #[test]
    fn move_focus_to_the_top() {
        let mut chat = Conversation::new();
        chat.say("change the title of the third one to Kind words").expect("set");
        chat.say("move it to the top").expect("move");
        let first = &chat.document.home_page().expect("home").sections()[0];
        assert_eq!(first.id(), &sid("testimonials-1"));
    }

    #[test]
    fn unresolvable_follow_ups_are_ambiguous() {
        let mut chat = Conversation::new();
        for text in ["change it back", "make it bigger", "make the ninth one bigger", "add a blog"] {
            let err = chat.say(text).unwrap_err();
            assert!(matches!(err, Decline::RefinementAmbiguous { .. }), "{text}");
        }
        assert_eq!(chat.document, sample_blueprint());
    }

    #[test]
    fn memory_is_bounded() {
        let mut chat = Conversation { engine: RefinementEngine::new(2), document: sample_blueprint() };
        chat.say("make it blue").expect("1");
        chat.say("make it red").expect("2");
        chat.say("make it green").expect("3");
        assert_eq!(chat.engine.memory_len(), 2);
    }
}
