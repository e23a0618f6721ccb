//! Known hosting services and archive URL synthesis.
//!
//! A static table describes each hosting service the classifier knows
//! how to turn into a direct archive download: how its domain may appear
//! in user input, which suffixes mean the user already pasted an archive
//! link, and the URL template that produces one.

pub mod branch;

pub use branch::{DefaultBranch, HttpBranchLookup, version_branch};

use tracing::debug;

/// Static descriptor for a known hosting service.
#[derive(Debug)]
pub struct HostService {
    /// Human-readable service name
    pub name: &'static str,
    /// Domain the input must start with (after an accepted prefix)
    pub domain: &'static str,
    /// Accepted input prefixes before the domain
    pub possible_starts: &'static [&'static str],
    /// Suffixes that disqualify the templated path (direct archive links)
    pub ignored_suffixes: &'static [&'static str],
    /// Scheme prepended when the input carries none
    pub url_start: &'static str,
    /// Suffix template; `{name}` and `{branch}` are substituted
    pub url_end: &'static str,
}

/// The registry, iterated in declared order.
pub const KNOWN_HOST_SERVICES: &[HostService] = &[
    HostService {
        name: "OSGeo Trac",
        domain: "trac.osgeo.org",
        possible_starts: &["", "https://", "http://"],
        ignored_suffixes: &["format=zip"],
        url_start: "https://",
        url_end: "?format=zip",
    },
    HostService {
        name: "GitHub",
        domain: "github.com",
        possible_starts: &["", "https://", "http://"],
        ignored_suffixes: &[".zip", ".tar.gz"],
        url_start: "https://",
        url_end: "/archive/{branch}.zip",
    },
    HostService {
        name: "GitLab",
        domain: "gitlab.com",
        possible_starts: &["", "https://", "http://"],
        ignored_suffixes: &[".zip", ".tar.gz", ".tar.bz2", ".tar"],
        url_start: "https://",
        url_end: "/-/archive/{branch}/{name}-{branch}.zip",
    },
    HostService {
        name: "Bitbucket",
        domain: "bitbucket.org",
        possible_starts: &["", "https://", "http://"],
        ignored_suffixes: &[".zip", ".tar.gz", ".gz", ".bz2"],
        url_start: "https://",
        url_end: "/get/{branch}.zip",
    },
];

/// Match a raw input against the registry.
///
/// Returns the matched service and the prefix the input actually used.
/// An input that matches a domain but ends with one of the service's
/// disqualifying suffixes returns `None`; the caller handles direct
/// archive links by literal-suffix detection instead.
pub fn match_service(raw: &str) -> Option<(&'static HostService, &'static str)> {
    let mut matched = None;
    for service in KNOWN_HOST_SERVICES {
        for start in service.possible_starts {
            if raw.starts_with(&format!("{}{}", start, service.domain)) {
                debug!(service = service.name, "identified known hosting service");
                matched = Some((service, *start));
                for suffix in service.ignored_suffixes {
                    if raw.ends_with(suffix) {
                        debug!(
                            service = service.name,
                            suffix, "not using hosting service template, URL ends with suffix"
                        );
                        return None;
                    }
                }
            }
        }
    }
    matched
}

/// Build the archive download URL for a known hosting service.
///
/// Returns `None` when no service matches or the match is disqualified.
/// When the service template needs a branch and none was supplied, the
/// default branch is resolved via `branches` (which never fails; it
/// degrades to a literal `"main"`).
pub fn resolve_archive_url(
    raw: &str,
    name: &str,
    branch: Option<&str>,
    branches: &dyn DefaultBranch,
) -> Option<String> {
    let (service, actual_start) = match_service(raw)?;

    // Prepend the scheme only when the input carried none.
    let prefix = if actual_start.is_empty() {
        service.url_start
    } else {
        ""
    };

    let suffix = if service.url_end.contains("{branch}") {
        let branch = match branch {
            Some(b) => b.to_string(),
            None => branches.default_branch(raw),
        };
        service
            .url_end
            .replace("{name}", name)
            .replace("{branch}", &branch)
    } else {
        service.url_end.replace("{name}", name)
    };

    let url = format!("{}{}{}", prefix, raw.trim_end_matches('/'), suffix);
    debug!(url = %url, "will use the following URL for download");
    Some(url)
}
