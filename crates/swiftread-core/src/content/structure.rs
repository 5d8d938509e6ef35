//! Chapter and table-of-contents reconstruction.
//!
//! Decoders hand over sections in reading order and, when the format has one,
//! a native outline. Outline entries are matched to sections by reference,
//! then by file name. Sections that no entry claims are still kept: content
//! before the first claimed section becomes front matter, later unclaimed
//! sections get a numbered title, and empty ones are folded into a neighbour.

use log::{debug, warn};

use super::{
    Chapter, DocumentStructure, ImageMarker, TocEntry,
    decoder::{OutlineEntry, Section, SectionLayout},
    html::sanitize_html,
    markup::render_chapter_markup,
    pages::{join_page_lines, page_range_label},
    word_stream::{build_word_stream, slot_of_real_word},
};
use crate::text_policy::{fallback_chapter_title, preview_compact};

pub const PAGES_PER_CHAPTER: usize = 10;
pub const FRONT_MATTER_TITLE: &str = "Front Matter";

/// Image waiting for its chapter's word offsets.
#[derive(Clone, Debug)]
struct PendingImage {
    source_ref: String,
    alt_text: String,
    /// Real words preceding the image within its chapter.
    real_ordinal: usize,
    available: bool,
}

/// Section text after markup removal.
#[derive(Clone, Debug)]
struct PreparedSection {
    source_ref: String,
    text: String,
    heading: Option<String>,
    images: Vec<PendingImage>,
    real_words: usize,
}

impl PreparedSection {
    fn has_content(&self) -> bool {
        self.real_words > 0 || !self.images.is_empty()
    }
}

/// Chapter under construction.
#[derive(Clone, Debug)]
pub(crate) struct ChapterDraft {
    title: String,
    level: u8,
    source_ref: String,
    raw_text: String,
    real_words: usize,
    images: Vec<PendingImage>,
}

impl ChapterDraft {
    pub(crate) fn new(title: String, level: u8, source_ref: String, raw_text: String) -> Self {
        let real_words = raw_text.split_whitespace().count();
        Self {
            title,
            level,
            source_ref,
            raw_text,
            real_words,
            images: Vec::new(),
        }
    }

    fn push_section(&mut self, section: &PreparedSection) {
        for image in &section.images {
            let mut image = image.clone();
            image.real_ordinal += self.real_words;
            self.images.push(image);
        }
        if !section.text.is_empty() {
            if !self.raw_text.is_empty() {
                self.raw_text.push('\n');
            }
            self.raw_text.push_str(&section.text);
        }
        self.real_words += section.real_words;
    }
}

struct FlatEntry<'a> {
    title: &'a str,
    destination_ref: &'a str,
    level: u8,
}

/// Build chapters, TOC and global word boundaries from decoder output.
pub fn structure(
    sections: &[Section],
    outline: Option<&[OutlineEntry]>,
    assets: &[String],
    layout: SectionLayout,
) -> DocumentStructure {
    let prepared = sections
        .iter()
        .map(|section| prepare_section(section, assets))
        .collect::<Vec<_>>();

    if let Some(outline) = outline.filter(|outline| !outline.is_empty()) {
        let entries = flatten_outline(outline);
        let owners = assign_entries(&entries, &prepared);
        if owners.iter().any(Option::is_some) {
            let drafts = drafts_from_outline(&prepared, &entries, &owners);
            return finalize(drafts, true);
        }
        warn!(
            "structure: none of {} outline entries matched a section; synthesising chapters",
            entries.len()
        );
    }

    let drafts = match layout {
        SectionLayout::Logical => drafts_from_sections(&prepared),
        SectionLayout::Paged => drafts_from_pages(&prepared),
    };
    finalize(drafts, false)
}

fn prepare_section(section: &Section, assets: &[String]) -> PreparedSection {
    let (text, heading, images) = match section.html.as_deref() {
        Some(html) => {
            let sanitized = sanitize_html(html);
            let images = sanitized
                .images
                .into_iter()
                .map(|image| {
                    let (source_ref, available) =
                        resolve_asset(&section.source_ref, &image.src, assets);
                    if !available {
                        debug!(
                            "structure: image unresolved section={} src={}",
                            section.source_ref, image.src
                        );
                    }
                    PendingImage {
                        source_ref,
                        alt_text: image.alt,
                        real_ordinal: image.words_before,
                        available,
                    }
                })
                .collect();
            (sanitized.text, sanitized.heading, images)
        }
        None => match section.lines.as_deref() {
            Some(lines) => (join_page_lines(lines), None, Vec::new()),
            None => (section.text.clone(), None, Vec::new()),
        },
    };

    let real_words = text.split_whitespace().count();
    PreparedSection {
        source_ref: section.source_ref.clone(),
        text,
        heading,
        images,
        real_words,
    }
}

fn flatten_outline(outline: &[OutlineEntry]) -> Vec<FlatEntry<'_>> {
    let mut flat = Vec::new();
    let mut stack = outline
        .iter()
        .rev()
        .map(|entry| (entry, 0u8))
        .collect::<Vec<_>>();

    while let Some((entry, level)) = stack.pop() {
        flat.push(FlatEntry {
            title: entry.title.trim(),
            destination_ref: &entry.destination_ref,
            level,
        });
        stack.extend(
            entry
                .children
                .iter()
                .rev()
                .map(|child| (child, level.saturating_add(1))),
        );
    }

    flat
}

/// Owning outline entry for every section; the first entry to claim a
/// section wins.
fn assign_entries(entries: &[FlatEntry<'_>], sections: &[PreparedSection]) -> Vec<Option<usize>> {
    let mut owners = vec![None; sections.len()];

    for (entry_index, entry) in entries.iter().enumerate() {
        let target = strip_fragment(entry.destination_ref);
        let exact = sections
            .iter()
            .position(|section| strip_fragment(&section.source_ref) == target);
        let resolved = exact.or_else(|| {
            let stem = file_stem(target);
            sections
                .iter()
                .position(|section| file_stem(&section.source_ref).eq_ignore_ascii_case(stem))
        });

        match resolved {
            Some(section_index) if owners[section_index].is_none() => {
                owners[section_index] = Some(entry_index);
            }
            Some(section_index) => warn!(
                "structure: dropping outline entry {:?} -> {:?}; section {} already belongs to an earlier entry",
                entry.title, entry.destination_ref, section_index
            ),
            None => debug!(
                "structure: outline entry {:?} -> {:?} matched no section",
                entry.title, entry.destination_ref
            ),
        }
    }

    owners
}

fn drafts_from_outline(
    sections: &[PreparedSection],
    entries: &[FlatEntry<'_>],
    owners: &[Option<usize>],
) -> Vec<ChapterDraft> {
    let first_owned = owners.iter().position(Option::is_some).unwrap_or(0);
    let mut drafts = Vec::new();
    let mut folded: Vec<&PreparedSection> = Vec::new();

    let front = &sections[..first_owned];
    if front.iter().any(PreparedSection::has_content) {
        let mut draft = ChapterDraft::new(
            FRONT_MATTER_TITLE.into(),
            0,
            front[0].source_ref.clone(),
            String::new(),
        );
        front.iter().for_each(|section| draft.push_section(section));
        drafts.push(draft);
    } else {
        folded.extend(front);
    }

    for (section, owner) in sections.iter().zip(owners).skip(first_owned) {
        match owner {
            Some(entry_index) => {
                let entry = &entries[*entry_index];
                let title = if entry.title.is_empty() {
                    fallback_chapter_title(drafts.len() + 1)
                } else {
                    entry.title.to_owned()
                };
                drafts.push(ChapterDraft::new(
                    title,
                    entry.level,
                    section.source_ref.clone(),
                    String::new(),
                ));
            }
            None if section.has_content() => {
                drafts.push(ChapterDraft::new(
                    fallback_chapter_title(drafts.len() + 1),
                    0,
                    section.source_ref.clone(),
                    String::new(),
                ));
            }
            None => {}
        }

        if let Some(draft) = drafts.last_mut() {
            for leading in folded.drain(..) {
                draft.push_section(leading);
            }
            draft.push_section(section);
        }
    }

    drafts
}

fn drafts_from_sections(sections: &[PreparedSection]) -> Vec<ChapterDraft> {
    let mut drafts: Vec<ChapterDraft> = Vec::new();
    let mut folded: Vec<&PreparedSection> = Vec::new();

    for section in sections {
        if section.has_content() {
            let title = section
                .heading
                .clone()
                .unwrap_or_else(|| fallback_chapter_title(drafts.len() + 1));
            drafts.push(ChapterDraft::new(
                title,
                0,
                section.source_ref.clone(),
                String::new(),
            ));
        }

        match drafts.last_mut() {
            Some(draft) => {
                for leading in folded.drain(..) {
                    draft.push_section(leading);
                }
                draft.push_section(section);
            }
            None => folded.push(section),
        }
    }

    drafts
}

fn drafts_from_pages(pages: &[PreparedSection]) -> Vec<ChapterDraft> {
    pages
        .chunks(PAGES_PER_CHAPTER)
        .enumerate()
        .map(|(chunk_index, chunk)| {
            let first_page = chunk_index * PAGES_PER_CHAPTER + 1;
            let mut draft = ChapterDraft::new(
                page_range_label(first_page, first_page + chunk.len() - 1),
                0,
                chunk[0].source_ref.clone(),
                String::new(),
            );
            chunk.iter().for_each(|page| draft.push_section(page));
            draft
        })
        .collect()
}

/// Assign global word boundaries and produce the final chapter list.
pub(crate) fn finalize(drafts: Vec<ChapterDraft>, has_native_structure: bool) -> DocumentStructure {
    let mut chapters = Vec::with_capacity(drafts.len());
    let mut toc = Vec::with_capacity(drafts.len());
    let mut offset = 0usize;

    for (index, draft) in drafts.into_iter().enumerate() {
        let tokens = build_word_stream(&draft.raw_text);
        let start = offset;
        let end = start + tokens.len();
        let images = draft
            .images
            .into_iter()
            .map(|image| ImageMarker {
                source_ref: image.source_ref,
                alt_text: image.alt_text,
                word_position: start + slot_of_real_word(&tokens, image.real_ordinal),
                available: image.available,
            })
            .collect();

        let id = format!("chapter-{index}");
        toc.push(TocEntry {
            id: id.clone(),
            title: draft.title.clone(),
            level: draft.level,
            chapter_index: index,
            start_word_index: start,
            word_count: tokens.len(),
            preview: preview_compact(&draft.raw_text),
        });
        chapters.push(Chapter {
            id,
            title: draft.title,
            level: draft.level,
            source_ref: draft.source_ref,
            renderable_content: render_chapter_markup(&draft.raw_text, start),
            raw_text: draft.raw_text,
            start_word_index: start,
            end_word_index: end,
            word_count: tokens.len(),
            images,
        });
        offset = end;
    }

    DocumentStructure {
        chapters,
        toc,
        has_native_structure,
    }
}

fn strip_fragment(reference: &str) -> &str {
    reference
        .split(['#', '?'])
        .next()
        .unwrap_or(reference)
        .trim_start_matches("./")
}

/// File name without directories or extension.
fn file_stem(reference: &str) -> &str {
    let name = strip_fragment(reference)
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(reference);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Resolve an image `src` against the section it appears in.
///
/// Returns the normalised reference and whether the decoder can serve it.
fn resolve_asset(section_ref: &str, src: &str, assets: &[String]) -> (String, bool) {
    if src.starts_with("data:") {
        return (src.to_owned(), true);
    }

    let src = strip_fragment(src);
    let joined = if let Some(absolute) = src.strip_prefix('/') {
        normalize_path(absolute)
    } else {
        let base = strip_fragment(section_ref)
            .rsplit_once('/')
            .map_or("", |(dir, _)| dir);
        normalize_path(&format!("{base}/{src}"))
    };

    if assets.iter().any(|asset| *asset == joined) {
        return (joined, true);
    }

    let name = joined.rsplit('/').next().unwrap_or(&joined);
    match assets
        .iter()
        .find(|asset| asset.rsplit('/').next() == Some(name))
    {
        Some(asset) => (asset.clone(), true),
        None => (joined, false),
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}
