//! Host environment probes.

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS", "JENKINS_URL"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if running as root/admin.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() has no preconditions and cannot fail
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    {
        std::env::var_os("ADMIN").is_some()
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}

/// Whether spawned programs must go through `cmd /c`.
pub fn needs_cmd_wrapper() -> bool {
    cfg!(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn elevated_matches_euid() {
        let euid = unsafe { libc::geteuid() };
        assert_eq!(is_elevated(), euid == 0);
    }

    #[test]
    #[cfg(unix)]
    fn unix_needs_no_wrapper() {
        assert!(!needs_cmd_wrapper());
    }
}
