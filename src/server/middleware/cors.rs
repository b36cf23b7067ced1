use crate::config::Config;
use axum::http::{HeaderValue, request::Parts};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use url::Url;

/// Origins always allowed, before `FRONTEND_URL` is appended.
pub const DEFAULT_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

/// Any `https://<label>.vercel.app` preview deployment is allowed.
pub const PREVIEW_HOST_SUFFIX: &str = ".vercel.app";

/// CORS allow-list: exact origins plus the preview-deployment pattern.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    exact: Vec<String>,
}

impl OriginPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        let mut exact: Vec<String> = DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect();
        let frontend = cfg
            .frontend_url
            .as_deref()
            .map(normalize)
            .filter(|f| !f.is_empty() && !DEFAULT_ORIGINS.contains(f));
        exact.extend(frontend.map(str::to_string));
        Self { exact }
    }

    pub fn allows(&self, origin: &str) -> bool {
        let origin = normalize(origin);
        self.exact.iter().any(|allowed| allowed == origin) || is_preview_origin(origin)
    }
}

fn normalize(origin: &str) -> &str {
    origin.trim().trim_end_matches('/')
}

fn is_preview_origin(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    if url.scheme() != "https" || url.port().is_some() || url.path() != "/" {
        return false;
    }
    url.host_str()
        .and_then(|host| host.strip_suffix(PREVIEW_HOST_SUFFIX))
        .is_some_and(|label| !label.is_empty() && !label.starts_with('.') && !label.ends_with('.'))
}

pub fn cors_layer(policy: OriginPolicy) -> CorsLayer {
    let policy = Arc::new(policy);
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin.to_str().is_ok_and(|origin| policy.allows(origin))
            },
        ))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> OriginPolicy {
        OriginPolicy::from_config(&Config {
            frontend_url: Some("https://shop.example.com/".to_string()),
            ..Config::default()
        })
    }

    #[test]
    fn exact_origins_and_frontend_override_are_allowed() {
        let policy = policy();
        assert!(policy.allows("http://localhost:3000"));
        assert!(policy.allows("http://localhost:5173"));
        assert!(policy.allows("https://shop.example.com"));
        assert!(!policy.allows("http://localhost:4000"));
    }

    #[test]
    fn preview_subdomains_match_the_pattern() {
        let policy = policy();
        assert!(policy.allows("https://foo.vercel.app"));
        assert!(policy.allows("https://my-shop-git-main.vercel.app"));
        assert!(!policy.allows("https://vercel.app"));
        assert!(!policy.allows("http://foo.vercel.app"));
        assert!(!policy.allows("https://foo.vercel.app.evil.example"));
        assert!(!policy.allows("https://foovercel.app"));
    }

    #[test]
    fn unrelated_origins_are_rejected() {
        let policy = policy();
        assert!(!policy.allows("https://evil.example"));
        assert!(!policy.allows("null"));
        assert!(!policy.allows(""));
    }
}
