//! PROPFIND request bodies and multistatus parsing.

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};
use url::Url;

pub const CURRENT_USER_PRINCIPAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:current-user-principal/>
  </d:prop>
</d:propfind>"#;

pub const CALENDAR_HOME_SET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <c:calendar-home-set/>
  </d:prop>
</d:propfind>"#;

pub const LIST_CALENDARS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" xmlns:cs="http://calendarserver.org/ns/">
  <d:prop>
    <d:displayname/>
    <d:resourcetype/>
    <d:current-user-privilege-set/>
  </d:prop>
</d:propfind>"#;

/// `calendar-query` REPORT body for events overlapping `[start, end)`.
pub fn calendar_query(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop>
    <D:getetag/>
    <C:calendar-data/>
  </D:prop>
  <C:filter>
    <C:comp-filter name="VCALENDAR">
      <C:comp-filter name="VEVENT">
        <C:time-range start="{}" end="{}"/>
      </C:comp-filter>
    </C:comp-filter>
  </C:filter>
</C:calendar-query>"#,
        caldav_time(start),
        caldav_time(end)
    )
}

fn caldav_time(time: DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Privileges that allow creating a resource in a collection.
const WRITE_PRIVILEGES: &[&str] = &["write", "write-content", "bind", "all"];

/// Display-name fragments of calendars that servers generate read-only
/// without reporting privileges (e.g. contact birthdays).
const READ_ONLY_NAME_HINTS: &[&str] = &["birthday", "geburtstag"];

/// A calendar collection found on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCollection {
    pub url: Url,
    pub name: Option<String>,
    pub read_only: bool,
}

/// Extract the first `<href>` inside `property` (e.g. `current-user-principal`),
/// resolved against `base`.
pub fn parse_href_property(xml: &str, property: &str, base: &Url) -> Option<Url> {
    let doc = Document::parse(xml).ok()?;
    let href = doc
        .descendants()
        .filter(|n| n.tag_name().name() == property)
        .flat_map(|n| n.descendants())
        .find(|n| n.tag_name().name() == "href")
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|h| !h.is_empty())?;
    base.join(href).ok()
}

/// Parse the calendar collections out of a Depth 1 PROPFIND response.
///
/// Non-calendar resources (the home collection itself, inboxes, address books)
/// are skipped.
pub fn parse_calendar_list(xml: &str, base: &Url) -> Result<Vec<CalendarCollection>, String> {
    let doc = Document::parse(xml).map_err(|e| format!("Invalid multistatus XML: {e}"))?;

    let mut calendars = Vec::new();

    for response in doc.descendants().filter(|n| n.tag_name().name() == "response") {
        let Some(href) = child_text(response, "href") else {
            continue;
        };

        let Some(resource_type) = find(response, "resourcetype") else {
            continue;
        };
        let types: Vec<&str> = resource_type
            .children()
            .filter(Node::is_element)
            .map(|n| n.tag_name().name())
            .collect();
        if !types.contains(&"calendar") {
            continue;
        }

        let Ok(url) = base.join(&href) else {
            continue;
        };

        let name = find(response, "displayname")
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let read_only = is_read_only(response, &types, name.as_deref());

        calendars.push(CalendarCollection {
            url,
            name,
            read_only,
        });
    }

    Ok(calendars)
}

/// The `calendar-data` of every resource in a REPORT response, with CRLF
/// line endings restored (XML parsing normalizes them to LF).
pub fn parse_calendar_data(xml: &str) -> Result<Vec<String>, String> {
    let doc = Document::parse(xml).map_err(|e| format!("Invalid multistatus XML: {e}"))?;

    Ok(doc
        .descendants()
        .filter(|n| n.tag_name().name() == "response")
        .filter_map(|response| find(response, "calendar-data"))
        .filter_map(|n| n.text())
        .filter(|data| !data.trim().is_empty())
        .map(|data| data.replace("\r\n", "\n").replace('\n', "\r\n"))
        .collect())
}

fn is_read_only(response: Node, types: &[&str], name: Option<&str>) -> bool {
    if types.contains(&"subscribed") {
        return true;
    }

    let privileges: Vec<&str> = find(response, "current-user-privilege-set")
        .map(|set| {
            set.descendants()
                .filter(|n| n.tag_name().name() == "privilege")
                .flat_map(|p| p.children().filter(Node::is_element))
                .map(|n| n.tag_name().name())
                .collect()
        })
        .unwrap_or_default();

    if !privileges.is_empty() {
        return !privileges.iter().any(|p| WRITE_PRIVILEGES.contains(p));
    }

    let lower = name.unwrap_or_default().to_lowercase();
    READ_ONLY_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}

fn find<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| n.tag_name().name() == name)
}

/// Text of the first `name` element directly below `node`.
fn child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
}
