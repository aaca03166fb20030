//! The operator command that points the deployment at a new bundle.

use super::artifact::{BUNDLE_PREFIX, JS_EXTENSION};
use std::fmt;

/// Shown in place of the application name when none is configured.
pub const APP_NAME_PLACEHOLDER: &str = "<app name>";

/// Config var the deployed server reads to pick its client bundle.
pub const CLIENT_ID_VAR: &str = "CLIENT_JS_ID";

/// Recover the bundle identifier from an object key.
///
/// `app-abc123.js` becomes `abc123`. A key lacking the prefix or suffix keeps
/// whatever part is present.
pub fn client_id_from_key(key: &str) -> &str {
    let id = key.strip_prefix(BUNDLE_PREFIX).unwrap_or(key);
    id.strip_suffix(JS_EXTENSION).unwrap_or(id)
}

/// `heroku config:set` invocation for one uploaded bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivationCommand {
    /// Target application, if known.
    pub app_name: Option<String>,

    /// Identifier embedded in the bundle's file name.
    pub client_id: String,
}

impl ActivationCommand {
    pub fn for_key(key: &str, app_name: Option<&str>) -> Self {
        Self {
            app_name: app_name.map(str::to_string),
            client_id: client_id_from_key(key).to_string(),
        }
    }

    pub fn app_name_or_placeholder(&self) -> &str {
        self.app_name.as_deref().unwrap_or(APP_NAME_PLACEHOLDER)
    }
}

impl fmt::Display for ActivationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "heroku config:set -a {} {}={}",
            self.app_name_or_placeholder(),
            CLIENT_ID_VAR,
            self.client_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_suffix() {
        assert_eq!(client_id_from_key("app-abc123.js"), "abc123");
        assert_eq!(client_id_from_key("app-9f8e.js"), "9f8e");
    }

    #[test]
    fn keeps_key_without_known_affixes() {
        assert_eq!(client_id_from_key("bundle.mjs"), "bundle.mjs");
        assert_eq!(client_id_from_key("app-only"), "only");
    }

    #[test]
    fn only_outer_affixes_are_removed() {
        assert_eq!(client_id_from_key("app-app-x.js.js"), "app-x.js");
    }

    #[test]
    fn placeholder_when_app_name_missing() {
        let cmd = ActivationCommand::for_key("app-abc123.js", None);
        assert_eq!(
            cmd.to_string(),
            "heroku config:set -a <app name> CLIENT_JS_ID=abc123"
        );
    }

    #[test]
    fn embeds_app_name() {
        let cmd = ActivationCommand::for_key("app-abc123.js", Some("myapp"));
        assert_eq!(cmd.to_string(), "heroku config:set -a myapp CLIENT_JS_ID=abc123");
    }
}
