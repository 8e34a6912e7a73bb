use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Transcript logging, enabled for the whole session with `--log`.
pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    /// When a path is given, verify it is writable up front so a bad path
    /// fails at startup instead of on the first message.
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let is_active = log_file.is_some();
        if let Some(path) = &log_file {
            test_file_access(path)?;
        }

        Ok(LoggingState {
            file_path: log_file,
            is_active,
        })
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        // Blank line between messages, matching the screen spacing
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn get_status_string(&self) -> String {
        match (&self.file_path, self.is_active) {
            (Some(path), true) => format!(
                "active ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
            _ => "disabled".to_string(),
        }
    }
}

fn test_file_access(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn logging_disabled_without_a_path() {
        let logging = LoggingState::new(None).unwrap();
        assert!(!logging.is_active());
        assert_eq!(logging.get_status_string(), "disabled");
        logging.log_message("dropped silently").unwrap();
    }

    #[test]
    fn messages_append_with_blank_line_spacing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.log");
        let logging = LoggingState::new(Some(path.to_string_lossy().into_owned())).unwrap();
        assert!(logging.is_active());

        logging.log_message("You: Hello").unwrap();
        logging.log_message("Hi there!").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "You: Hello\n\nHi there!\n\n");
        assert_eq!(logging.get_status_string(), "active (chat.log)");
    }

    #[test]
    fn unwritable_path_fails_at_startup() {
        let result = LoggingState::new(Some("/no/such/dir/chat.log".to_string()));
        assert!(result.is_err());
    }
}
