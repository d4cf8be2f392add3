//! Public base URL resolution and auth redirect targets.

use std::env;

const LOCAL_URL: &str = "http://localhost:3000";
const CALLBACK_PATH: &str = "/auth/callback";
const AUTH_FAILED_PATH: &str = "/login?error=auth_failed";

/// Environment variables checked, in order, for an explicitly configured URL.
pub const CONFIGURED_URL_ENV: [&str; 2] = ["LINKSHELF_APP_URL", "SITE_URL"];
/// Environment variable naming the host of a hosted deployment.
pub const DEPLOYMENT_HOST_ENV: &str = "LINKSHELF_DEPLOYMENT_HOST";

/// Inputs for base URL resolution, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlSources {
    pub configured: Option<String>,
    pub forwarded_host: Option<String>,
    pub forwarded_proto: Option<String>,
    pub deployment_host: Option<String>,
}

impl UrlSources {
    /// Reads the environment, falling back to `settings_url` when no
    /// variable is set.
    pub fn from_env(settings_url: Option<&str>) -> Self {
        let configured = CONFIGURED_URL_ENV
            .iter()
            .find_map(|name| non_empty(env::var(name).ok()))
            .or_else(|| non_empty(settings_url.map(str::to_string)));

        Self {
            configured,
            forwarded_host: None,
            forwarded_proto: None,
            deployment_host: non_empty(env::var(DEPLOYMENT_HOST_ENV).ok()),
        }
    }

    /// Attaches `x-forwarded-host` / `x-forwarded-proto` values of a request.
    pub fn with_forwarded(mut self, host: Option<&str>, proto: Option<&str>) -> Self {
        self.forwarded_host = non_empty(host.map(str::to_string));
        self.forwarded_proto = non_empty(proto.map(str::to_string));
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves the public base URL, never ending in `/`.
pub fn resolve_base_url(sources: &UrlSources) -> String {
    if let Some(configured) = &sources.configured {
        return configured.strip_suffix('/').unwrap_or(configured).to_string();
    }
    if let Some(host) = &sources.forwarded_host {
        let proto = sources.forwarded_proto.as_deref().unwrap_or("https");
        return format!("{}://{}", proto, host);
    }
    if let Some(host) = &sources.deployment_host {
        return format!("https://{}", host);
    }
    LOCAL_URL.to_string()
}

pub fn auth_callback_url(sources: &UrlSources) -> String {
    format!("{}{}", resolve_base_url(sources), CALLBACK_PATH)
}

/// Keeps `next` only when it is a same-site absolute path.
pub fn safe_next_path(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

/// Where the auth callback sends the browser after a code exchange.
pub fn auth_redirect(sources: &UrlSources, next: Option<&str>, exchanged: bool) -> String {
    let base = resolve_base_url(sources);
    if exchanged {
        format!("{}{}", base, safe_next_path(next))
    } else {
        format!("{}{}", base, AUTH_FAILED_PATH)
    }
}
