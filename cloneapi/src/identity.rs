//! Identity resolution and voice listing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{error::Result, http::HttpClient};

/// Identity service: translate target identities into voice references and
/// list voices available for cloning.
pub struct IdentityService {
    http: Arc<HttpClient>,
}

impl IdentityService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Resolves a target identity into the voice reference required by
    /// clone-job submission.
    pub async fn resolve(&self, identity_id: &str) -> Result<ResolvedVoice> {
        #[derive(Serialize)]
        struct Request<'a> {
            identity_id: &'a str,
        }

        self.http
            .request("POST", "/v1/identities/resolve", Some(&Request { identity_id }))
            .await
    }

    /// Lists voices known to the service.
    pub async fn voices(&self) -> Result<Vec<VoiceInfo>> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            voices: Vec<VoiceInfo>,
        }

        let resp: Response = self.http.request::<(), _>("GET", "/v1/voices", None).await?;
        Ok(resp.voices)
    }
}

/// Voice reference for a resolved identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedVoice {
    pub voice_ref: String,
}

/// Information about a voice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Voice identifier.
    pub voice_id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Preview audio URL, when available.
    #[serde(default)]
    pub preview_url: Option<String>,
}
