use anyhow::{Context, Result};
use tracing::{Span, instrument, warn};

use super::Session;
use crate::{
    Error,
    models::{PackageName, PackageScope},
};

/// Prefix adb prints before every package name or path in `pm` output.
pub const LISTING_MARKER: &str = "package:";

/// Returns what follows the listing marker, or `None` if `line` does not start with it.
///
/// Only the first marker is removed, so paths keep any further colons.
pub fn strip_marker(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix(LISTING_MARKER).map(str::trim)
}

/// Yields the marker-stripped remainder of every marker line in `output`, in order.
pub fn parse_listing(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter_map(strip_marker)
}

impl Session {
    /// Lists installed packages in the order adb reports them.
    ///
    /// Entries that are not valid package names are skipped with a warning.
    #[instrument(level = "debug", skip(self), fields(count), err)]
    pub async fn list_packages(&self, scope: PackageScope) -> Result<Vec<PackageName>> {
        let mut args = vec!["shell", "pm", "list", "packages"];
        args.extend(scope.flag());
        let output = self.bridge.run(&args, false).await.context("Failed to list packages")?;

        let packages = parse_listing(&output)
            .filter_map(|entry| match PackageName::parse(entry) {
                Ok(name) => Some(name),
                Err(e) => {
                    warn!(error = e.as_ref() as &dyn std::error::Error, "Skipping listing entry");
                    None
                }
            })
            .collect::<Vec<_>>();
        Span::current().record("count", packages.len());
        Ok(packages)
    }

    /// Returns the on-device path of `package`'s binary as reported by `pm path`.
    #[instrument(level = "debug", skip(self), ret, err)]
    pub async fn resolve_path(&self, package: &PackageName) -> Result<String> {
        let output = self
            .bridge
            .run(&["shell", "pm", "path", package.as_str()], false)
            .await
            .context("Failed to run 'pm path'")?;
        let path = parse_listing(&output).find(|path| !path.is_empty()).map(str::to_string);
        path.ok_or_else(|| Error::PathParse { package: package.to_string(), output }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{platform::Platform, testing::FakeBridge};

    #[test]
    fn marker_is_stripped_once() {
        assert_eq!(
            strip_marker("package:/data/app/com.dog.raider-2/base.apk"),
            Some("/data/app/com.dog.raider-2/base.apk")
        );
        assert_eq!(
            strip_marker("package:/data/app/~~abc==/com.a-x:y/split:config.apk"),
            Some("/data/app/~~abc==/com.a-x:y/split:config.apk")
        );
        assert_eq!(strip_marker("package:package:odd"), Some("package:odd"));
    }

    #[test]
    fn non_marker_lines_are_ignored() {
        let output = "WARNING: linker: something\npackage:com.a\n\n  \nerror: x\npackage:com.b\r";
        assert_eq!(parse_listing(output).collect::<Vec<_>>(), ["com.a", "com.b"]);
        assert_eq!(strip_marker("com.a"), None);
        assert_eq!(strip_marker("xpackage:com.a"), None);
    }

    #[test]
    fn parsing_is_idempotent() {
        let output = "package:com.a\npackage:com.b";
        let once = parse_listing(output).collect::<Vec<_>>();
        let rejoined =
            once.iter().map(|name| format!("{LISTING_MARKER}{name}")).collect::<Vec<_>>().join("\n");
        assert_eq!(parse_listing(&rejoined).collect::<Vec<_>>(), once);
    }

    #[tokio::test]
    async fn lists_packages_for_scope() {
        let bridge = FakeBridge::new(Platform::Linux, |args| match args {
            ["shell", "pm", "list", "packages", "-3"] => {
                (0, "package:com.b\npackage:com.a\npackage:not a package\n".to_string())
            }
            ["shell", "pm", "list", "packages", "-S"] => {
                (0, "package:android\npackage:com.android.systemui".to_string())
            }
            ["shell", "pm", "list", "packages"] => (0, "package:android".to_string()),
            _ => (1, String::new()),
        });
        let session = Session::new(Box::new(bridge.clone()));

        let user = session.list_packages(PackageScope::User).await.unwrap();
        let mut names = user.iter().map(PackageName::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        assert_eq!(names, ["com.a", "com.b"]);

        let system = session.list_packages(PackageScope::System).await.unwrap();
        let names = system.iter().map(PackageName::as_str).collect::<Vec<_>>();
        assert_eq!(names, ["android", "com.android.systemui"]);

        let all = session.list_packages(PackageScope::All).await.unwrap();
        assert_eq!(all.iter().map(PackageName::as_str).collect::<Vec<_>>(), ["android"]);
        assert_eq!(
            bridge.calls(),
            ["shell pm list packages -3", "shell pm list packages -S", "shell pm list packages"]
        );
    }

    #[tokio::test]
    async fn resolves_path_with_colons() {
        let bridge = FakeBridge::new(Platform::Linux, |_| {
            (0, "package:/data/app/com.dog.raider-2/base.apk\npackage:/data/app/com.dog.raider-2/split:a.apk".to_string())
        });
        let session = Session::new(Box::new(bridge));
        let name = PackageName::parse("com.dog.raider").unwrap();
        assert_eq!(session.resolve_path(&name).await.unwrap(), "/data/app/com.dog.raider-2/base.apk");
    }

    #[tokio::test]
    async fn missing_marker_is_a_parse_error() {
        let bridge = FakeBridge::new(Platform::Linux, |_| (0, "".to_string()));
        let session = Session::new(Box::new(bridge));
        let name = PackageName::parse("com.gone").unwrap();

        let err = session.resolve_path(&name).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::PathParse { package, .. }) if package == "com.gone"
        ));
    }
}
