use std::borrow::Cow;
use std::collections::HashMap;

use crate::services::xtream::{XtreamCategory, XtreamLiveStream};

/// Provider-side channel used as generator input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub stream_id: String,
    pub name: String,
    pub epg_channel_id: Option<String>,
    pub stream_icon: Option<String>,
    pub category_name: Option<String>,
}

impl StreamDescriptor {
    /// Build descriptors from live streams, resolving `category_id` against the
    /// provider's category list
    pub fn from_live_streams(
        streams: Vec<XtreamLiveStream>,
        categories: &[XtreamCategory],
    ) -> Vec<Self> {
        let names: HashMap<&str, &str> = categories
            .iter()
            .map(|c| (c.category_id.as_str(), c.category_name.as_str()))
            .collect();

        streams
            .into_iter()
            .map(|stream| {
                let category_name = stream
                    .category_id
                    .as_deref()
                    .and_then(|id| names.get(id))
                    .map(|name| name.to_string());

                StreamDescriptor {
                    stream_id: stream.stream_id.to_string(),
                    name: stream.name,
                    epg_channel_id: stream.epg_channel_id,
                    stream_icon: stream.stream_icon,
                    category_name,
                }
            })
            .collect()
    }
}

/// Make a value safe to place between attribute quotes
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '\r', '\n']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' | '\n' => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Titles follow the comma, so only line breaks need neutralizing
fn escape_title(value: &str) -> Cow<'_, str> {
    if value.contains(['\r', '\n']) {
        Cow::Owned(value.replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

/// Render an M3U playlist for the given streams.
///
/// Each stream becomes an `#EXTINF:-1` line with `tvg-id`, `tvg-name`,
/// `tvg-logo` and `group-title` (empty when unknown) followed by
/// `<base_url>/<username>/<password>/<stream_id>`.
pub fn generate_m3u(
    streams: &[StreamDescriptor],
    base_url: &str,
    username: &str,
    password: &str,
) -> String {
    let mut out = String::with_capacity(16 + streams.len() * 192);
    out.push_str("#EXTM3U\n");

    for stream in streams {
        out.push_str(&format!(
            "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}\n",
            escape_attribute(stream.epg_channel_id.as_deref().unwrap_or_default()),
            escape_attribute(&stream.name),
            escape_attribute(stream.stream_icon.as_deref().unwrap_or_default()),
            escape_attribute(stream.category_name.as_deref().unwrap_or_default()),
            escape_title(&stream.name),
        ));
        out.push_str(&format!(
            "{}/{}/{}/{}\n",
            base_url, username, password, stream.stream_id
        ));
    }

    out
}
