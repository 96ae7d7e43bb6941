#![allow(dead_code)]

use std::time::Duration;

use agendum_core::config::CalDavSettings;
use agendum_provider_caldav::CalDavRemote;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PRINCIPAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/dav/</d:href>
    <d:propstat>
      <d:prop><d:current-user-principal><d:href>/principals/me/</d:href></d:current-user-principal></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

pub const HOME: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/principals/me/</d:href>
    <d:propstat>
      <d:prop><c:calendar-home-set><d:href>/calendars/me/</d:href></c:calendar-home-set></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

pub const WRITABLE_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/calendars/me/</d:href>
    <d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop>
    <d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
  <d:response>
    <d:href>/calendars/me/birthdays/</d:href>
    <d:propstat><d:prop>
      <d:displayname>Birthdays</d:displayname>
      <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
      <d:current-user-privilege-set><d:privilege><d:read/></d:privilege></d:current-user-privilege-set>
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
  <d:response>
    <d:href>/calendars/me/personal/</d:href>
    <d:propstat><d:prop>
      <d:displayname>Personal</d:displayname>
      <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
      <d:current-user-privilege-set>
        <d:privilege><d:read/></d:privilege>
        <d:privilege><d:write/></d:privilege>
      </d:current-user-privilege-set>
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
</d:multistatus>"#;

pub const READ_ONLY_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/calendars/me/birthdays/</d:href>
    <d:propstat><d:prop>
      <d:displayname>Birthdays</d:displayname>
      <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
      <d:current-user-privilege-set><d:privilege><d:read/></d:privilege></d:current-user-privilege-set>
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
</d:multistatus>"#;

pub fn settings(server: &MockServer, timeout: Duration) -> CalDavSettings {
    CalDavSettings {
        url: format!("{}/dav/", server.uri()),
        account: "me@example.com".to_string(),
        password: "app-password".to_string(),
        request_timeout: timeout,
    }
}

pub fn remote(server: &MockServer) -> CalDavRemote {
    CalDavRemote::new(&settings(server, Duration::from_secs(5))).unwrap()
}

/// Mount principal, home and collection listing responses.
pub async fn mount_discovery(server: &MockServer, listing: &'static str) {
    Mock::given(method("PROPFIND"))
        .and(path("/dav/"))
        .and(header("Depth", "0"))
        .respond_with(ResponseTemplate::new(207).set_body_string(PRINCIPAL))
        .mount(server)
        .await;

    Mock::given(method("PROPFIND"))
        .and(path("/principals/me/"))
        .and(header("Depth", "0"))
        .respond_with(ResponseTemplate::new(207).set_body_string(HOME))
        .mount(server)
        .await;

    Mock::given(method("PROPFIND"))
        .and(path("/calendars/me/"))
        .and(header("Depth", "1"))
        .respond_with(ResponseTemplate::new(207).set_body_string(listing))
        .mount(server)
        .await;
}
