//! Offline support: generated service worker.
//!
//! Every build with the `offline` plugin ships a `sw.js` using a
//! stale-while-revalidate strategy: visitors get instant loads from cache
//! while fresh content is fetched in the background. The cache name is
//! versioned by the build version string, so deploying a new build
//! invalidates old caches automatically (the activate handler deletes
//! them).
//!
//! The page shell — every generated page plus the manifest and icons — is
//! precached on install. Image renditions are cached lazily as they are
//! first requested.

/// Published service worker filename.
pub const SW_PATH: &str = "sw.js";

/// Generate the service worker script.
///
/// `version` becomes part of the cache name; `precache` lists the URLs
/// fetched on install.
pub fn service_worker(version: &str, precache: &[String]) -> String {
    let cache_name = format!("sublime-blog-{}", version);
    let urls = serde_json::to_string(precache).expect("precache list must serialize");

    format!(
        r#"// Generated by sublime-blog {version}
const CACHE = {cache_name:?};
const PRECACHE = {urls};

self.addEventListener("install", (event) => {{
    event.waitUntil(caches.open(CACHE).then((cache) => cache.addAll(PRECACHE)));
    self.skipWaiting();
}});

self.addEventListener("activate", (event) => {{
    event.waitUntil(
        caches.keys().then((names) =>
            Promise.all(names.filter((name) => name !== CACHE).map((name) => caches.delete(name)))
        )
    );
    self.clients.claim();
}});

// Stale-while-revalidate: serve from cache, refresh in the background
self.addEventListener("fetch", (event) => {{
    if (event.request.method !== "GET") return;
    event.respondWith(
        caches.open(CACHE).then((cache) =>
            cache.match(event.request).then((cached) => {{
                const refresh = fetch(event.request)
                    .then((response) => {{
                        if (response.ok) cache.put(event.request, response.clone());
                        return response;
                    }})
                    .catch(() => cached);
                return cached || refresh;
            }})
        )
    );
}});
"#
    )
}

/// Inline registration snippet embedded into every generated page.
pub const REGISTRATION_SNIPPET: &str = r#"if ("serviceWorker" in navigator) {
    window.addEventListener("load", () => {
        navigator.serviceWorker.register("/sw.js");
    });
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_name_includes_version() {
        let js = service_worker("1.2.3", &[]);
        assert!(js.contains(r#"const CACHE = "sublime-blog-1.2.3";"#));
    }

    #[test]
    fn precache_list_embedded_as_json() {
        let precache = vec!["/".to_string(), "/hello-world/".to_string()];
        let js = service_worker("dev", &precache);
        assert!(js.contains(r#"["/","/hello-world/"]"#));
    }

    #[test]
    fn lifecycle_handlers_present() {
        let js = service_worker("dev", &[]);
        assert!(js.contains(r#"addEventListener("install""#));
        assert!(js.contains(r#"addEventListener("activate""#));
        assert!(js.contains(r#"addEventListener("fetch""#));
        assert!(js.contains("caches.delete"));
    }

    #[test]
    fn registration_snippet_registers_sw() {
        assert!(REGISTRATION_SNIPPET.contains("navigator.serviceWorker.register"));
        assert!(REGISTRATION_SNIPPET.contains("/sw.js"));
    }

    #[test]
    fn different_versions_produce_different_caches() {
        let a = service_worker("1.0.0", &[]);
        let b = service_worker("1.0.1", &[]);
        assert_ne!(a, b);
    }
}
