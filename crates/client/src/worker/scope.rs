//! Deployment scope derived from the worker's own registration URL.
//!
//! The scope is the directory the worker script was served from. Shell asset
//! paths are resolved against it, so the same configuration works whether the
//! app lives at `/` or under a sub-path such as `/app/`.

use sharecache_core::Error;
use url::{Origin, Url};

/// Where the worker is deployed and which same-origin paths belong to the app shell.
#[derive(Debug, Clone)]
pub struct Scope {
    base: Url,
    origin: Origin,
    shell_paths: Vec<String>,
}

impl Scope {
    /// Derive the scope from the worker script URL.
    ///
    /// `shell_assets` are relative paths such as `script.js` or `index.html`.
    pub fn from_worker_url(worker_url: &Url, shell_assets: &[String]) -> Result<Self, Error> {
        if worker_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!("worker URL has no path: {worker_url}")));
        }

        let mut base = worker_url.join("./").map_err(|e| Error::InvalidUrl(e.to_string()))?;
        base.set_query(None);
        base.set_fragment(None);

        let mut shell_paths = Vec::with_capacity(shell_assets.len() + 1);
        shell_paths.push(base.path().to_string());
        for asset in shell_assets {
            let resolved = base
                .join(asset.trim())
                .map_err(|e| Error::InvalidUrl(format!("{asset}: {e}")))?;
            if resolved.origin() != base.origin() {
                return Err(Error::InvalidUrl(format!("{asset}: shell assets must be same-origin")));
            }
            shell_paths.push(resolved.path().to_string());
        }
        shell_paths.dedup();

        Ok(Self { origin: base.origin(), base, shell_paths })
    }

    /// The scope URL, always ending in `/`.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The scope path, e.g. `/` or `/app/`.
    pub fn base_path(&self) -> &str {
        self.base.path()
    }

    /// Absolute paths that count as shell assets, the scope root first.
    pub fn shell_paths(&self) -> &[String] {
        &self.shell_paths
    }

    /// Whether `url` is one of the app's own shell resources.
    ///
    /// Matching is exact on origin and path; the query string is ignored so
    /// cache-busting parameters do not change the classification.
    pub fn is_shell_url(&self, url: &Url) -> bool {
        url.origin() == self.origin && self.shell_paths.iter().any(|p| p == url.path())
    }

    /// Whether `url` falls inside the scope at all.
    pub fn contains(&self, url: &Url) -> bool {
        url.origin() == self.origin && url.path().starts_with(self.base.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> Vec<String> {
        vec!["index.html".into(), "script.js".into(), "style.css".into()]
    }

    fn scope(worker: &str) -> Scope {
        Scope::from_worker_url(&Url::parse(worker).unwrap(), &assets()).unwrap()
    }

    #[test]
    fn test_root_scope() {
        let scope = scope("https://shares.example.com/service-worker.js");
        assert_eq!(scope.base_path(), "/");
        assert_eq!(scope.shell_paths(), ["/", "/index.html", "/script.js", "/style.css"]);
    }

    #[test]
    fn test_sub_path_scope() {
        let scope = scope("https://user.github.io/app/service-worker.js?v=3");
        assert_eq!(scope.base_path(), "/app/");
        assert_eq!(scope.base().as_str(), "https://user.github.io/app/");
        assert!(scope.shell_paths().contains(&"/app/script.js".to_string()));
    }

    #[test]
    fn test_shell_match_is_exact() {
        let scope = scope("https://shares.example.com/app/service-worker.js");
        let own = Url::parse("https://shares.example.com/app/script.js").unwrap();
        let nested = Url::parse("https://shares.example.com/app/vendor/script.js").unwrap();
        let foreign = Url::parse("https://cdn.example.com/app/script.js").unwrap();

        assert!(scope.is_shell_url(&own));
        assert!(!scope.is_shell_url(&nested));
        assert!(!scope.is_shell_url(&foreign));
    }

    #[test]
    fn test_shell_match_ignores_query() {
        let scope = scope("https://shares.example.com/service-worker.js");
        let busted = Url::parse("https://shares.example.com/style.css?v=42").unwrap();
        assert!(scope.is_shell_url(&busted));
    }

    #[test]
    fn test_cross_origin_asset_rejected() {
        let worker = Url::parse("https://shares.example.com/service-worker.js").unwrap();
        let result = Scope::from_worker_url(&worker, &["//cdn.example.com/script.js".to_string()]);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_contains() {
        let scope = scope("https://shares.example.com/app/service-worker.js");
        assert!(scope.contains(&Url::parse("https://shares.example.com/app/holdings").unwrap()));
        assert!(!scope.contains(&Url::parse("https://shares.example.com/other/").unwrap()));
    }
}
