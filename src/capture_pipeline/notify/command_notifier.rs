use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::capture_pipeline::classify::SubjectColor;
use crate::capture_pipeline::notify::notifier::Notifier;

/// Runs `program args... <color> [evidence-path]` for each event.
///
/// Success is a zero exit status. The command runs to completion on the
/// capture thread, so it should hand slow work off on its own.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command(&self, color: SubjectColor, evidence: Option<&Path>) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(color.as_str());
        if let Some(path) = evidence {
            command.arg(path);
        }
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());
        command
    }
}

impl Notifier for CommandNotifier {
    fn notify(&mut self, color: SubjectColor, evidence: Option<&Path>) -> bool {
        let output = match self.command(color, evidence).output() {
            Ok(output) => output,
            Err(e) => {
                warn!(program = %self.program, "Failed to start notifier: {}", e);
                return false;
            }
        };

        if output.status.success() {
            debug!(program = %self.program, color = %color, "Notifier delivered event");
            true
        } else {
            warn!(
                program = %self.program,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Notifier reported failure"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_fails_softly() {
        let mut notifier = CommandNotifier::new("/nonexistent/notify-cat", Vec::new());
        assert!(!notifier.notify(SubjectColor::Light, None));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_success() {
        let mut ok = CommandNotifier::new("true", Vec::new());
        assert!(ok.notify(SubjectColor::Dark, Some(Path::new("photos/cat.jpg"))));

        let mut failing = CommandNotifier::new("false", Vec::new());
        assert!(!failing.notify(SubjectColor::Dark, None));
    }

    #[cfg(unix)]
    #[test]
    fn passes_color_and_path_as_trailing_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("args.txt");
        let script = format!("echo \"$@\" > {}", out.display());
        let mut notifier =
            CommandNotifier::new("sh", vec!["-c".to_string(), script, "notify".to_string()]);

        assert!(notifier.notify(SubjectColor::Light, Some(Path::new("photos/cat_1.jpg"))));
        let recorded = std::fs::read_to_string(&out).unwrap();
        assert_eq!(recorded.trim(), "light photos/cat_1.jpg");
    }
}
