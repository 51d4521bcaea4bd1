use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::LocatorError;

/// Identifiers of one recording session, taken from a captured segment URL.
///
/// The URL shape is
/// `{scheme}://{domain}/{tag}/{user}/{playlist}/{video}/{quality}/{n}.ts?vsid=..&vpuid=..`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTarget {
    pub user_hash: String,
    pub playlist_hash: String,
    pub video_hash: String,
    /// `vsid` up to (not including) its first `x`.
    pub vsid: String,
    pub vpuid: String,
}

impl StreamTarget {
    const PATH_SEGMENTS: usize = 6;

    pub fn parse(stream_url: &str) -> Result<Self, LocatorError> {
        let url = Url::parse(stream_url.trim())?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() < Self::PATH_SEGMENTS {
            return Err(LocatorError::TooFewSegments {
                found: segments.len(),
                expected: Self::PATH_SEGMENTS,
            });
        }

        let query = |name: &'static str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .ok_or(LocatorError::MissingQuery(name))
        };

        let vsid = query("vsid")?;
        let vsid = match vsid.find('x') {
            Some(cut) => vsid[..cut].to_string(),
            None => vsid,
        };

        Ok(Self {
            user_hash: segments[1].to_string(),
            playlist_hash: segments[2].to_string(),
            video_hash: segments[3].to_string(),
            vsid,
            vpuid: query("vpuid")?,
        })
    }
}
