//! `CalendarRemote` implementation for CalDAV servers.

use agendum_core::config::CalDavSettings;
use agendum_core::ics::DecodedEvent;
use agendum_core::{CalendarDocument, CalendarRemote, SyncError, SyncReceipt};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use url::Url;

use crate::caldav::{Session, create_http_client, event_url};
use crate::discovery::{
    CALENDAR_HOME_SET, CURRENT_USER_PRINCIPAL, CalendarCollection, LIST_CALENDARS,
    calendar_query, parse_calendar_data, parse_calendar_list, parse_href_property,
};

/// An event read back from one of the account's calendars.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    /// Display name of the calendar, or its URL when it has none.
    pub calendar: String,
    pub event: DecodedEvent,
}

/// A CalDAV account. Every submission runs discovery from scratch; nothing
/// learned from the server is cached between calls.
#[derive(Clone)]
pub struct CalDavRemote {
    base_url: Url,
    session: Session,
}

impl std::fmt::Debug for CalDavRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalDavRemote")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CalDavRemote {
    pub fn new(settings: &CalDavSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.url)
            .with_context(|| format!("Invalid CalDAV URL: {}", settings.url))?;
        let http = create_http_client(settings.request_timeout)?;
        let session = Session::new(
            http,
            &settings.account,
            &settings.password,
            settings.request_timeout,
        );

        Ok(Self { base_url, session })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Discover every calendar collection of the account.
    ///
    /// principal (`current-user-principal` on the base URL) → calendar home
    /// (`calendar-home-set` on the principal) → Depth 1 listing of the home.
    /// Servers that report neither are treated as if the base URL were the home.
    pub async fn calendars(&self) -> Result<Vec<CalendarCollection>, SyncError> {
        let principal_xml = self
            .session
            .propfind(&self.base_url, 0, CURRENT_USER_PRINCIPAL)
            .await?;
        let principal = parse_href_property(&principal_xml, "current-user-principal", &self.base_url);
        tracing::debug!(principal = ?principal.as_ref().map(Url::as_str), "CalDAV principal");

        let home = match principal {
            Some(principal) => match self.session.propfind(&principal, 0, CALENDAR_HOME_SET).await {
                Ok(home_xml) => parse_href_property(&home_xml, "calendar-home-set", &principal)
                    .unwrap_or_else(|| self.base_url.clone()),
                Err(SyncError::Rejected { status, .. }) => {
                    tracing::debug!(status, "calendar-home-set refused, using base URL");
                    self.base_url.clone()
                }
                Err(err) => return Err(err),
            },
            None => self.base_url.clone(),
        };
        tracing::debug!(home = home.as_str(), "CalDAV calendar home");

        let list_xml = self.session.propfind(&home, 1, LIST_CALENDARS).await?;
        let calendars =
            parse_calendar_list(&list_xml, &home).map_err(SyncError::InvalidResponse)?;

        tracing::debug!(count = calendars.len(), "CalDAV calendars discovered");
        Ok(calendars)
    }

    /// Events overlapping `[start, end)` across every calendar, sorted by start.
    ///
    /// A calendar that fails to answer is skipped, as is any resource that
    /// can't be decoded (all-day events included).
    pub async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>, SyncError> {
        let calendars = self.calendars().await?;
        let query = calendar_query(start, end);
        let mut events = Vec::new();

        for calendar in &calendars {
            let label = calendar
                .name
                .clone()
                .unwrap_or_else(|| calendar.url.to_string());

            let xml = match self.session.report(&calendar.url, 1, query.clone()).await {
                Ok(xml) => xml,
                Err(err) => {
                    tracing::warn!(calendar = %label, error = %err, "skipping calendar");
                    continue;
                }
            };
            let resources = match parse_calendar_data(&xml) {
                Ok(resources) => resources,
                Err(message) => {
                    tracing::warn!(calendar = %label, error = %message, "skipping calendar");
                    continue;
                }
            };

            for ics in resources {
                match CalendarDocument::decode(&ics) {
                    Some(event) => events.push(RemoteEvent {
                        calendar: label.clone(),
                        event,
                    }),
                    None => tracing::debug!(calendar = %label, "skipping undecodable event"),
                }
            }
        }

        events.sort_by_key(|e| e.event.start);
        Ok(events)
    }

    /// Events in the next `days` days.
    pub async fn upcoming(&self, days: u32) -> Result<Vec<RemoteEvent>, SyncError> {
        let start = Utc::now();
        self.events_between(start, start + chrono::Duration::days(i64::from(days)))
            .await
    }
}

impl CalendarRemote for CalDavRemote {
    async fn submit(&self, document: &CalendarDocument) -> Result<SyncReceipt, SyncError> {
        let calendars = self.calendars().await?;

        let calendar = calendars
            .into_iter()
            .find(|c| !c.read_only)
            .ok_or(SyncError::NoWritableCalendar)?;

        let resource = event_url(&calendar.url, document.uid())?;
        tracing::debug!(url = resource.as_str(), "submitting event");

        self.session
            .put_calendar(&resource, document.as_str().to_string())
            .await?;

        Ok(SyncReceipt {
            calendar_url: calendar.url.to_string(),
            calendar_name: calendar.name,
            resource_url: resource.to_string(),
        })
    }
}
