//! Build identity of the relay binaries.
//!
//! `build.rs` exports git metadata through vergen; a build without git (a
//! crates.io tarball, say) reports `unknown` for branch and commit. The
//! identity appears in three places: the startup log line of both daemons,
//! the `User-Agent` sent to the forum, and `serverInfo.version` in the MCP
//! handshake (which carries the bare package version only).

use std::fmt;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Product token used in the upstream `User-Agent`.
pub const PRODUCT: &str = "discourse-relay";

const UNKNOWN: &str = "unknown";

/// Where a running binary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub branch: &'static str,
    /// Commit SHA, abbreviated to seven characters.
    pub commit: &'static str,
    pub dirty: bool,
}

impl BuildInfo {
    /// Metadata captured when this crate was compiled.
    pub fn current() -> Self {
        Self {
            version: PKG_VERSION,
            branch: match option_env!("VERGEN_GIT_BRANCH") {
                Some(branch) => branch,
                None => UNKNOWN,
            },
            commit: match option_env!("VERGEN_GIT_SHA") {
                Some(sha) => short_sha(sha),
                None => UNKNOWN,
            },
            dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
        }
    }

    /// `discourse-relay/<version>`, without build metadata.
    pub fn user_agent(&self) -> String {
        format!("{PRODUCT}/{}", self.version)
    }
}

/// Renders as `0.1.0+main.1a2b3c4`, or `0.1.0+main.1a2b3c4.dirty` for a
/// modified tree.
impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}.{}", self.version, self.branch, self.commit)?;
        if self.dirty {
            f.write_str(".dirty")?;
        }
        Ok(())
    }
}

fn short_sha(sha: &'static str) -> &'static str {
    sha.get(..7).unwrap_or(sha)
}

/// The full build identity of this binary, for logs.
pub fn version_string() -> String {
    BuildInfo::current().to_string()
}

/// `User-Agent` header sent on every forum request.
pub fn user_agent() -> String {
    BuildInfo::current().user_agent()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_version_branch_and_commit() {
        let info = BuildInfo {
            version: "0.3.1",
            branch: "main",
            commit: "1a2b3c4",
            dirty: false,
        };
        assert_eq!(info.to_string(), "0.3.1+main.1a2b3c4");

        let info = BuildInfo { dirty: true, ..info };
        assert_eq!(info.to_string(), "0.3.1+main.1a2b3c4.dirty");
    }

    #[test]
    fn commit_is_abbreviated() {
        assert_eq!(short_sha("1a2b3c4d5e6f"), "1a2b3c4");
        assert_eq!(short_sha("abc"), "abc");
        assert!(BuildInfo::current().commit.len() <= 7);
    }

    #[test]
    fn user_agent_names_product_and_version() {
        assert_eq!(user_agent(), format!("discourse-relay/{PKG_VERSION}"));
        assert!(version_string().starts_with(PKG_VERSION));
    }
}
