//! Pulls the per-server median out of an FFXIAH item page. The page embeds a
//! javascript array of per-server sale stats; this scans it as plain text
//! rather than pretending the page is well-formed JSON.

const MARKER: &str = "Item.server_medians";
const SERVER_KEY: &str = "\"server_name\":\"";
const MEDIAN_KEY: &str = "\"median\":";

/// Groups digits with commas ("1234567" -> "1,234,567"), matching how
/// FFXIAH renders prices on the site.
pub fn format_number_with_commas(mut value: u64) -> String {
    let mut groups = String::new();
    while value >= 1000 {
        groups = format!(",{:03}{}", value % 1000, groups);
        value /= 1000;
    }
    format!("{}{}", value, groups)
}

/// Scans an item page body for `server`'s median price, comma-formatted.
/// Server names compare case-insensitively. A record that names the server
/// but carries no median doesn't end the scan; a later record may still
/// match. `None` when the page has no usable median for that server.
pub fn extract_median_for_server(body: &str, server: &str) -> Option<String> {
    let marker = body.find(MARKER)? + MARKER.len();
    let rest = &body[marker..];
    let open = rest.find('[')? + 1;
    let close = rest.find("];")?;
    if close < open {
        return None;
    }
    let list = &rest[open..close];

    let mut cursor = 0;
    while let Some(offset) = list[cursor..].find('{') {
        let start = cursor + offset + 1;
        let Some(length) = list[start..].find('}') else {
            break;
        };
        let object = &list[start..start + length];
        cursor = start + length + 1;

        let Some(name_at) = object.find(SERVER_KEY) else {
            continue;
        };
        let name_rest = &object[name_at + SERVER_KEY.len()..];
        let Some(quote) = name_rest.find('"') else {
            continue;
        };
        if !name_rest[..quote].eq_ignore_ascii_case(server) {
            continue;
        }

        let Some(median_at) = object.find(MEDIAN_KEY) else {
            continue;
        };
        let digits: String = object[median_at + MEDIAN_KEY.len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            continue;
        }
        let value: u64 = digits.parse().ok()?;
        return Some(format_number_with_commas(value));
    }
    None
}
