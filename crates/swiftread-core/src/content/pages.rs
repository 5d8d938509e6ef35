//! Paragraph recovery for page-oriented sources.
//!
//! Formats that only expose positioned text lines carry no paragraph markup.
//! Paragraphs are inferred from vertical spacing, measured against each
//! page's own average line gap since font size and layout vary per page.

const PARAGRAPH_GAP_RATIO: f32 = 1.5;
const CONTINUATION_GAP_RATIO: f32 = 0.5;

/// One positioned run of text on a page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageLine {
    pub text: String,
    /// Top edge, growing downwards.
    pub top: f32,
}

impl PageLine {
    pub fn new(text: &str, top: f32) -> Self {
        Self {
            text: text.to_owned(),
            top,
        }
    }
}

/// Join a page's lines into text with one paragraph per line.
///
/// A gap above 1.5x the page average starts a new paragraph and a gap above
/// 0.5x continues the paragraph with a space. Smaller positive gaps (runs
/// split just below the baseline) are joined without a separator. Lines at
/// the same height or higher up, such as the top of a new column, are
/// joined with a space.
pub fn join_page_lines(lines: &[PageLine]) -> String {
    let mut out = String::new();
    let Some(first) = lines.first() else {
        return out;
    };

    let gaps = lines
        .windows(2)
        .map(|pair| pair[1].top - pair[0].top)
        .filter(|gap| *gap > 0.0)
        .collect::<Vec<_>>();
    let average_gap = if gaps.is_empty() {
        0.0
    } else {
        gaps.iter().sum::<f32>() / gaps.len() as f32
    };

    out.push_str(first.text.trim());
    for pair in lines.windows(2) {
        let gap = pair[1].top - pair[0].top;
        let text = pair[1].text.trim();
        if text.is_empty() {
            continue;
        }
        let separator = if gap > 0.0 {
            if gap > average_gap * PARAGRAPH_GAP_RATIO {
                Some('\n')
            } else if gap > average_gap * CONTINUATION_GAP_RATIO {
                Some(' ')
            } else {
                None
            }
        } else {
            Some(' ')
        };
        out.extend(separator);
        out.push_str(text);
    }

    out
}

/// Page number span label used for chapters synthesised from page groups.
pub fn page_range_label(first_page: usize, last_page: usize) -> String {
    if first_page == last_page {
        format!("Page {first_page}")
    } else {
        format!("Pages {first_page}-{last_page}")
    }
}
