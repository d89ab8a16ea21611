/// Joins the configured public base URL with a blob-store key to form the
/// absolute URL published in the track index.
pub fn join(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
