//! In-page scripts evaluated by the Chromium backend.

use std::time::Duration;

/// Upper bound for the default readiness probe. The probe resolves on its own
/// once this elapses, so a broken image or font cannot hold the tab forever.
pub(crate) const READINESS_FALLBACK: Duration = Duration::from_secs(10);

/// Resolves once every `<img>` has loaded or errored and `document.fonts`
/// has settled, or after `__FALLBACK_MS__` milliseconds, whichever is first.
const READINESS_PROBE_TEMPLATE: &str = r#"
new Promise((resolve) => {
  const fallback = setTimeout(() => resolve(false), __FALLBACK_MS__);

  const pendingImages = Array.from(document.querySelectorAll('img'))
    .filter((img) => !img.complete)
    .map((img) => new Promise((done) => {
      img.addEventListener('load', done, { once: true });
      // Broken images count as settled.
      img.addEventListener('error', done, { once: true });
    }));

  const fonts = document.fonts && document.fonts.ready
    ? document.fonts.ready.catch(() => undefined)
    : Promise.resolve();

  Promise.all([Promise.all(pendingImages), fonts]).then(() => {
    clearTimeout(fallback);
    resolve(true);
  });
})
"#;

/// Builds the default readiness probe with the given fallback.
pub(crate) fn readiness_probe(fallback: Duration) -> String {
    READINESS_PROBE_TEMPLATE.replace("__FALLBACK_MS__", &fallback.as_millis().to_string())
}
