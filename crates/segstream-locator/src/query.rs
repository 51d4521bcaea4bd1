use serde::{Deserialize, Serialize};

/// Signed query parameters attached to every segment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub vsid: String,
    pub vpuid: String,
    pub source_index: u32,
    pub session_data: u32,
    pub preview: u32,
    /// Request timestamp in Unix milliseconds.
    pub t: i64,
    pub ab: u32,
}

impl QueryParams {
    pub const DEFAULT_CLIENT_TAG: &'static str = "xWEB";
    pub const DEFAULT_BUILD_TAG: &'static str = "x2402";

    /// Build the template for a session.
    ///
    /// `vsid` becomes `{hash}{client_tag}{build_tag}x{session_start_secs}`.
    /// An empty or `"default"` tag selects the built-in one.
    pub fn new(
        hash: &str,
        client_tag: &str,
        build_tag: &str,
        vpuid: &str,
        session_start_secs: i64,
        now_ms: i64,
    ) -> Self {
        let client_tag = or_default(client_tag, Self::DEFAULT_CLIENT_TAG);
        let build_tag = or_default(build_tag, Self::DEFAULT_BUILD_TAG);

        Self {
            vsid: format!("{hash}{client_tag}{build_tag}x{session_start_secs}"),
            vpuid: vpuid.to_string(),
            source_index: 0,
            session_data: 1,
            preview: 1,
            t: now_ms,
            ab: 1,
        }
    }

    /// Copy with a different timestamp; the template itself is never mutated.
    #[must_use]
    pub fn stamped(&self, t: i64) -> Self {
        Self { t, ..self.clone() }
    }

    /// Pairs in wire order.
    pub fn pairs(&self) -> [(&'static str, String); 7] {
        [
            ("vsid", self.vsid.clone()),
            ("vpuid", self.vpuid.clone()),
            ("source_index", self.source_index.to_string()),
            ("session_data", self.session_data.to_string()),
            ("preview", self.preview.to_string()),
            ("t", self.t.to_string()),
            ("ab", self.ab.to_string()),
        ]
    }
}

fn or_default<'a>(tag: &'a str, default: &'a str) -> &'a str {
    match tag {
        "" | "default" => default,
        tag => tag,
    }
}
