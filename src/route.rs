use regex::Regex;
use serde::Serialize;

use crate::error::HistoryError;

/// Which launcher an activated history command is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Run as-is in the command console.
    Shell,
    /// Open the tool's own dialog pre-filled with the recorded parameters.
    Tool,
}

/// Routes commands matching the ignored-command pattern to the shell.
#[derive(Debug, Clone, Default)]
pub struct Router {
    ignored: Option<Regex>,
}

impl Router {
    /// # Errors
    /// Returns [`HistoryError::InvalidFilterPattern`] if `pattern` does not compile.
    pub fn new(pattern: Option<&str>) -> Result<Self, HistoryError> {
        let ignored = pattern
            .filter(|p| !p.is_empty())
            .map(Regex::new)
            .transpose()
            .map_err(|e| HistoryError::InvalidFilterPattern(e.to_string()))?;
        Ok(Self { ignored })
    }

    pub fn route(&self, command: &str) -> Route {
        // Help and explicit UI requests always go to the tool launcher.
        let wants_ui = command.contains("--help") || command.contains("--ui");
        match &self.ignored {
            Some(re) if !wants_ui && re.is_match(command) => Route::Shell,
            _ => Route::Tool,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn no_pattern_routes_everything_to_tool() {
        let router = Router::default();
        assert_eq!(router.route("ls -la"), Route::Tool);
        assert_eq!(Router::new(Some("")).unwrap().route("ls"), Route::Tool);
    }

    #[test]
    fn ignored_commands_go_to_shell() {
        let router = Router::new(Some(r"^(cd|ls|pwd|r\.mapcalc)\b")).unwrap();
        assert_eq!(router.route("ls -la"), Route::Shell);
        assert_eq!(router.route("r.mapcalc \"a = b * 2\""), Route::Shell);
        assert_eq!(router.route("r.info map=a"), Route::Tool);
    }

    #[test]
    fn help_and_ui_override_pattern() {
        let router = Router::new(Some("^r\\.mapcalc")).unwrap();
        assert_eq!(router.route("r.mapcalc --help"), Route::Tool);
        assert_eq!(router.route("r.mapcalc --ui"), Route::Tool);
    }

    #[test]
    fn bad_pattern_is_rejected() {
        assert!(matches!(
            Router::new(Some("(")),
            Err(HistoryError::InvalidFilterPattern(_))
        ));
    }
}
