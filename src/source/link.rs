//! `Link` header pagination parsing
//!
//! GitHub advertises pagination through an RFC 8288 `Link` header:
//!
//! ```text
//! <https://api.github.com/repositories/1/stargazers?per_page=100&page=2>; rel="next",
//! <https://api.github.com/repositories/1/stargazers?per_page=100&page=9>; rel="last"
//! ```
//!
//! Each relation is reduced to the value of its `page` query parameter.

use reqwest::Url;
use super::PageInfo;

/// Parse a `Link` header value into page indices. Unknown relations and
/// malformed entries are ignored; `first` defaults to 1.
pub fn parse_link_header(value: &str) -> PageInfo {
    let mut info = PageInfo::default();

    for entry in value.split(',') {
        let mut parts = entry.split(';');
        let target = match parts.next() {
            Some(target) => target.trim(),
            None => continue,
        };
        let url = match target.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            Some(url) => url,
            None => continue,
        };
        let page = match page_param(url) {
            Some(page) => page,
            None => continue,
        };

        for param in parts {
            let param = param.trim();
            let rel = match param.strip_prefix("rel=") {
                Some(rel) => rel.trim_matches('"'),
                None => continue,
            };
            // A single rel may carry several space separated relation types
            for relation in rel.split_whitespace() {
                match relation {
                    "first" => info.first = page,
                    "last" => info.last = Some(page),
                    "prev" => info.prev = Some(page),
                    "next" => info.next = Some(page),
                    _ => {}
                }
            }
        }
    }

    info
}

fn page_param(url: &str) -> Option<u32> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}
