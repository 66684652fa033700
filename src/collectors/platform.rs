//! Guess target platform from release asset file names.

use regex::Regex;
use std::sync::LazyLock;

static OS_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("windows", r"(windows|win32|win64|[-_.]win[-_.]|\.exe$|\.msi$)"),
        ("macos", r"(darwin|macos|osx|apple|\.dmg$|\.pkg$)"),
        ("linux", r"(linux|\.deb$|\.rpm$|\.appimage$)"),
        ("freebsd", r"freebsd"),
        ("android", r"android"),
    ]
    .into_iter()
    .map(|(os, pattern)| (os, Regex::new(pattern).expect("invalid regex")))
    .collect()
});

static ARCH_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("arm64", r"(aarch64|arm64|armv8)"),
        ("armv7", r"(armv7|armhf|arm32)"),
        ("x86_64", r"(x86_64|x86-64|amd64|x64|win64)"),
        ("x86", r"(i386|i686|x86|win32|386)"),
        ("riscv64", r"riscv64"),
        ("ppc64le", r"ppc64le"),
        ("s390x", r"s390x"),
        ("universal", r"universal"),
    ]
    .into_iter()
    .map(|(arch, pattern)| (arch, Regex::new(pattern).expect("invalid regex")))
    .collect()
});

/// Operating system an asset targets, if its name says so
#[must_use]
pub fn guess_os(file_name: &str) -> Option<&'static str> {
    first_match(&OS_PATTERNS, file_name)
}

/// CPU architecture an asset targets, if its name says so
#[must_use]
pub fn guess_arch(file_name: &str) -> Option<&'static str> {
    first_match(&ARCH_PATTERNS, file_name)
}

fn first_match(patterns: &[(&'static str, Regex)], file_name: &str) -> Option<&'static str> {
    let file_name = file_name.to_ascii_lowercase();
    patterns.iter().find(|(_, re)| re.is_match(&file_name)).map(|(name, _)| *name)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_guess_os() {
        assert_eq!(guess_os("go1.22.0.linux-amd64.tar.gz"), Some("linux"));
        assert_eq!(guess_os("node-v20.0.0-darwin-arm64.tar.gz"), Some("macos"));
        assert_eq!(guess_os("deno-x86_64-pc-windows-msvc.zip"), Some("windows"));
        assert_eq!(guess_os("setup.exe"), Some("windows"));
        assert_eq!(guess_os("tool_1.0_amd64.deb"), Some("linux"));
        assert_eq!(guess_os("source.tar.gz"), None);
    }

    #[test]
    fn test_guess_arch() {
        assert_eq!(guess_arch("go1.22.0.linux-amd64.tar.gz"), Some("x86_64"));
        assert_eq!(guess_arch("node-v20.0.0-darwin-arm64.tar.gz"), Some("arm64"));
        assert_eq!(guess_arch("zig-linux-aarch64-0.13.0.tar.xz"), Some("arm64"));
        assert_eq!(guess_arch("tool-linux-armv7.tar.gz"), Some("armv7"));
        assert_eq!(guess_arch("tool-windows-i686.zip"), Some("x86"));
        assert_eq!(guess_arch("source.tar.gz"), None);
    }
}
