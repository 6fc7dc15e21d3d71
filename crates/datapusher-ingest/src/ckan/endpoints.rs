//! CKAN action URL builders

/// Look up a resource by id
pub const RESOURCE_SHOW: &str = "resource_show";

/// Drop a resource's datastore table
pub const DATASTORE_DELETE: &str = "datastore_delete";

/// Create a datastore table / append records to it
pub const DATASTORE_CREATE: &str = "datastore_create";

/// Overwrite a resource's metadata
pub const RESOURCE_UPDATE: &str = "resource_update";

/// Actions served under the unversioned `/api/action/` path.
const UNVERSIONED_ACTIONS: [&str; 2] = [DATASTORE_DELETE, RESOURCE_UPDATE];

/// Normalize a catalog base address: default to `http://` when no scheme is
/// given, and drop trailing slashes.
pub fn normalize_base_url(ckan_url: &str) -> String {
    let ckan_url = ckan_url.trim();
    let with_scheme = if ckan_url.contains("://") {
        ckan_url.to_string()
    } else {
        format!("http://{}", ckan_url.trim_start_matches('/'))
    };

    with_scheme.trim_end_matches('/').to_string()
}

/// Build the URL for a CKAN action
pub fn action_url(ckan_url: &str, action: &str) -> String {
    let base = normalize_base_url(ckan_url);

    if UNVERSIONED_ACTIONS.contains(&action) {
        format!("{}/api/action/{}", base, action)
    } else {
        format!("{}/api/3/action/{}", base, action)
    }
}
