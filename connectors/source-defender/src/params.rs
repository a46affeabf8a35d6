//! Query parameters of the parameterised alerts listing.
//!
//! Unlike the `$filter` listing used by the watch engine, this form asks the
//! API to select alerts itself: by time bounds or an `ago` duration, a
//! result limit, and machine group or tag scoping.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

/// `P[nY][nM][nW][nD][T[nH][nM][nS]]`, whole numbers only.
static ISO8601_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:\d+Y)?(?:\d+M)?(?:\d+W)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+S)?)?$")
        .expect("valid duration regex")
});

/// Rejected parameter combinations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("ago and since/until time bounds are mutually exclusive")]
    AgoWithTimeBounds,

    #[error("ago '{0}' is not an ISO 8601 duration (e.g. PT12H, P1DT6H)")]
    InvalidDuration(String),

    #[error("since ({since}) must be before until ({until})")]
    InvertedBounds {
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    },

    #[error("limit must be > 0")]
    ZeroLimit,
}

/// Parameters for [`DefenderClient::fetch_alerts`](crate::DefenderClient::fetch_alerts).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    /// Lower time bound.
    pub since: Option<DateTime<Utc>>,
    /// Upper time bound.
    pub until: Option<DateTime<Utc>>,
    /// ISO 8601 duration reaching back from now. Excludes `since`/`until`.
    pub ago: Option<String>,
    /// Maximum number of alerts, most recent first.
    pub limit: Option<u32>,
    pub machine_groups: Vec<String>,
    /// A single machine tag from the registry.
    pub device_created_machine_tags: Option<String>,
    pub cloud_created_machine_tags: Vec<String>,
}

/// Validated, ordered query pairs ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery(Vec<(&'static str, String)>);

impl FetchQuery {
    #[must_use]
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

impl FetchParams {
    /// Validate the combination and render it as query pairs. Repeated
    /// list values become repeated keys.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] when `ago` is combined with time bounds or is
    /// not a duration, when `since` is not before `until`, or when `limit`
    /// is zero.
    pub fn to_query(&self) -> Result<FetchQuery, ParamsError> {
        let ago = self.ago.as_deref().map(str::trim).filter(|a| !a.is_empty());
        if let Some(ago) = ago {
            if self.since.is_some() || self.until.is_some() {
                return Err(ParamsError::AgoWithTimeBounds);
            }
            if !is_iso8601_duration(ago) {
                return Err(ParamsError::InvalidDuration(ago.to_string()));
            }
        }
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since >= until {
                return Err(ParamsError::InvertedBounds { since, until });
            }
        }
        if self.limit == Some(0) {
            return Err(ParamsError::ZeroLimit);
        }

        let mut pairs = Vec::new();
        if let Some(since) = self.since {
            pairs.push(("sinceTimeUtc", format_param_time(since)));
        }
        if let Some(until) = self.until {
            pairs.push(("untilTimeUtc", format_param_time(until)));
        }
        if let Some(ago) = ago {
            pairs.push(("ago", ago.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        for group in non_blank(&self.machine_groups) {
            pairs.push(("machinegroups", group.to_string()));
        }
        if let Some(tag) = self
            .device_created_machine_tags
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            pairs.push(("DeviceCreatedMachineTags", tag.to_string()));
        }
        for tag in non_blank(&self.cloud_created_machine_tags) {
            pairs.push(("CloudCreatedMachineTags", tag.to_string()));
        }
        Ok(FetchQuery(pairs))
    }
}

fn non_blank(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Whether `s` is a whole-number ISO 8601 duration with at least one
/// component.
#[must_use]
pub fn is_iso8601_duration(s: &str) -> bool {
    ISO8601_DURATION.is_match(s) && s != "P" && !s.ends_with('T')
}

/// UTC time without zone suffix, milliseconds with trailing zeros trimmed:
/// `2026-01-02T03:04:05.12`, or `2026-01-02T03:04:05` on a whole second.
fn format_param_time(t: DateTime<Utc>) -> String {
    let rendered = t.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn renders_every_parameter_in_order() {
        let params = FetchParams {
            since: Some(t()),
            until: Some(t() + TimeDelta::milliseconds(1_120)),
            limit: Some(50),
            machine_groups: vec!["servers".into(), " ".into(), "laptops".into()],
            device_created_machine_tags: Some("finance".into()),
            cloud_created_machine_tags: vec!["tier0".into(), "dmz".into()],
            ..FetchParams::default()
        };
        let query = params.to_query().unwrap();
        let pairs: Vec<(&str, &str)> = query.pairs().iter().map(|(k, v)| (*k, v.as_str())).collect();
        assert_eq!(
            pairs,
            [
                ("sinceTimeUtc", "2026-01-02T03:04:05"),
                ("untilTimeUtc", "2026-01-02T03:04:06.12"),
                ("limit", "50"),
                ("machinegroups", "servers"),
                ("machinegroups", "laptops"),
                ("DeviceCreatedMachineTags", "finance"),
                ("CloudCreatedMachineTags", "tier0"),
                ("CloudCreatedMachineTags", "dmz"),
            ]
        );
    }

    #[test]
    fn ago_excludes_time_bounds() {
        for params in [
            FetchParams {
                ago: Some("PT1H".into()),
                since: Some(t()),
                ..FetchParams::default()
            },
            FetchParams {
                ago: Some("PT1H".into()),
                until: Some(t()),
                ..FetchParams::default()
            },
        ] {
            assert_eq!(params.to_query(), Err(ParamsError::AgoWithTimeBounds));
        }
    }

    #[test]
    fn ago_alone_is_passed_through() {
        let params = FetchParams {
            ago: Some("P1DT12H".into()),
            ..FetchParams::default()
        };
        assert_eq!(
            params.to_query().unwrap().pairs(),
            [("ago", "P1DT12H".to_string())]
        );
    }

    #[test]
    fn duration_syntax() {
        for ok in ["PT12H", "P1D", "P2W", "P1Y2M3DT4H5M6S", "PT30S"] {
            assert!(is_iso8601_duration(ok), "{ok} should parse");
        }
        for bad in ["", "P", "PT", "12h", "P1DT", "PT1.5H", "-PT1H", "P1H"] {
            assert!(!is_iso8601_duration(bad), "{bad} should be rejected");
        }
        let params = FetchParams {
            ago: Some("1 day".into()),
            ..FetchParams::default()
        };
        assert_eq!(
            params.to_query(),
            Err(ParamsError::InvalidDuration("1 day".into()))
        );
    }

    #[test]
    fn inverted_bounds_and_zero_limit_are_rejected() {
        let inverted = FetchParams {
            since: Some(t()),
            until: Some(t()),
            ..FetchParams::default()
        };
        assert!(matches!(
            inverted.to_query(),
            Err(ParamsError::InvertedBounds { .. })
        ));

        let zero = FetchParams {
            limit: Some(0),
            ..FetchParams::default()
        };
        assert_eq!(zero.to_query(), Err(ParamsError::ZeroLimit));
    }

    #[test]
    fn empty_params_are_an_empty_query() {
        assert!(FetchParams::default().to_query().unwrap().pairs().is_empty());
    }
}
