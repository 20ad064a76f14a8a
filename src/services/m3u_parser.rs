use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{Channel, UNKNOWN_DURATION};

const EXTINF_MARKER: &str = "#EXTINF:";

lazy_static! {
    /// Signed integer right after `#EXTINF:`
    static ref DURATION_REGEX: Regex = Regex::new(r"^-?\d+").unwrap();

    // One search per attribute so their relative order does not matter
    static ref TVG_ID_REGEX: Regex = Regex::new(r#"\btvg-id="([^"]*)""#).unwrap();
    static ref TVG_NAME_REGEX: Regex = Regex::new(r#"\btvg-name="([^"]*)""#).unwrap();
    static ref TVG_LOGO_REGEX: Regex = Regex::new(r#"\btvg-logo="([^"]*)""#).unwrap();
    static ref GROUP_TITLE_REGEX: Regex = Regex::new(r#"\bgroup-title="([^"]*)""#).unwrap();
}

/// Metadata pulled from one EXTINF line, waiting for its URL line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtinfDraft {
    pub duration: String,
    pub tvg_id: String,
    pub tvg_name: String,
    pub tvg_logo: String,
    pub group_title: String,
    pub title: String,
}

impl ExtinfDraft {
    /// Close out the draft with its stream URL
    pub fn into_channel(self, url: &str) -> Channel {
        Channel {
            duration: self.duration,
            tvg_id: self.tvg_id,
            tvg_name: self.tvg_name,
            tvg_logo: self.tvg_logo,
            group_title: self.group_title,
            title: self.title,
            url: url.to_string(),
        }
    }
}

/// Strategy output before the title fallback is applied
#[derive(Debug, Default)]
struct Extracted {
    duration: Option<String>,
    tvg_id: String,
    tvg_name: String,
    tvg_logo: String,
    group_title: String,
    title: Option<String>,
}

type ExtractionStrategy = fn(&str) -> Option<Extracted>;

/// Tried in order on the text after `#EXTINF:`; the first `Some` wins
const EXTRACTION_STRATEGIES: [ExtractionStrategy; 3] =
    [extract_tagged, extract_title_only, extract_bare];

/// Split `-1 tvg-id="a,b" ...,Title` at the first comma outside quotes.
///
/// Unbalanced quotes hide every comma, so fall back to the last one.
fn split_header(body: &str) -> (&str, Option<&str>) {
    let mut in_quotes = false;
    for (i, c) in body.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return (&body[..i], Some(&body[i + 1..])),
            _ => {}
        }
    }
    match body.rfind(',') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    }
}

fn find_attribute(regex: &Regex, header: &str) -> String {
    regex
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Duration plus any of the four known attributes
fn extract_tagged(body: &str) -> Option<Extracted> {
    let duration = DURATION_REGEX.find(body)?.as_str().to_string();
    let (header, title) = split_header(body);

    Some(Extracted {
        duration: Some(duration),
        tvg_id: find_attribute(&TVG_ID_REGEX, header),
        tvg_name: find_attribute(&TVG_NAME_REGEX, header),
        tvg_logo: find_attribute(&TVG_LOGO_REGEX, header),
        group_title: find_attribute(&GROUP_TITLE_REGEX, header),
        title: title.and_then(non_empty),
    })
}

/// No usable duration: keep whatever follows the last comma
fn extract_title_only(body: &str) -> Option<Extracted> {
    let comma = body.rfind(',')?;
    Some(Extracted {
        title: non_empty(&body[comma + 1..]),
        ..Default::default()
    })
}

fn extract_bare(_body: &str) -> Option<Extracted> {
    Some(Extracted::default())
}

/// Extract metadata from a trimmed line.
///
/// Returns `None` unless the line starts with `#EXTINF:`. Never fails
/// otherwise: malformed lines degrade through [`EXTRACTION_STRATEGIES`], and
/// a missing title becomes `Channel <finalized + 1>`.
pub fn extract_metadata(line: &str, finalized: usize) -> Option<ExtinfDraft> {
    let body = line.strip_prefix(EXTINF_MARKER)?;

    let extracted = EXTRACTION_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(body))
        .unwrap_or_default();

    Some(ExtinfDraft {
        duration: extracted
            .duration
            .unwrap_or_else(|| UNKNOWN_DURATION.to_string()),
        tvg_id: extracted.tvg_id,
        tvg_name: extracted.tvg_name,
        tvg_logo: extracted.tvg_logo,
        group_title: extracted.group_title,
        title: extracted
            .title
            .unwrap_or_else(|| format!("Channel {}", finalized + 1)),
    })
}

/// Lazily assembles channels from playlist text.
///
/// Holds at most one pending draft. A new EXTINF line replaces an unclosed
/// draft, and a draft still pending at end of input is dropped.
pub struct ChannelAssembler<'a> {
    lines: std::str::Split<'a, char>,
    pending: Option<ExtinfDraft>,
    finalized: usize,
}

impl<'a> ChannelAssembler<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.split('\n'),
            pending: None,
            finalized: 0,
        }
    }
}

impl Iterator for ChannelAssembler<'_> {
    type Item = Channel;

    fn next(&mut self) -> Option<Channel> {
        for raw in self.lines.by_ref() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(draft) = extract_metadata(line, self.finalized) {
                self.pending = Some(draft);
                continue;
            }

            // #EXTM3U, #EXTVLCOPT and friends
            if line.starts_with('#') {
                continue;
            }

            if let Some(draft) = self.pending.take() {
                self.finalized += 1;
                return Some(draft.into_channel(line));
            }
        }

        None
    }
}

/// Parse a whole playlist buffer into its channels, in source order
pub fn parse_m3u(content: &str) -> Vec<Channel> {
    ChannelAssembler::new(content).collect()
}
