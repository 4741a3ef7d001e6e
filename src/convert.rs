/// External GPX to KML conversion
///
/// Legacy per-combination files can be converted by an external tool such
/// as gpsbabel instead of the native KML renderer. The tool is invoked as
/// `<command> -i gpx -o kml <input> <output>` and is killed if it runs past
/// its timeout.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::model::ServiceError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub struct Converter {
    command: String,
    timeout: Duration,
}

impl Converter {
    pub fn new(command: impl Into<String>, timeout_secs: u64) -> Self {
        Converter {
            command: command.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Arguments passed to the tool for one file pair.
    pub fn arguments(input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-i".into(),
            "gpx".into(),
            "-o".into(),
            "kml".into(),
            input.as_os_str().to_owned(),
            output.as_os_str().to_owned(),
        ]
    }

    /// Runs the tool and waits for it, polling until the timeout.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<(), ServiceError> {
        let mut child = Command::new(&self.command)
            .args(Self::arguments(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ServiceError::io(self.command.clone(), e))?;

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(ServiceError::ConvertFailed {
                        command: self.command.clone(),
                        status: status.to_string(),
                    });
                }
                Ok(None) => {
                    if started.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ServiceError::ConvertTimeout {
                            command: self.command.clone(),
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(ServiceError::io(self.command.clone(), e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_order() {
        let args = Converter::arguments(Path::new("in.gpx"), Path::new("out.kml"));
        let args: Vec<&str> = args.iter().filter_map(|a| a.to_str()).collect();
        assert_eq!(args, vec!["-i", "gpx", "-o", "kml", "in.gpx", "out.kml"]);
    }

    #[test]
    fn test_missing_tool_is_io_error() {
        let converter = Converter::new("nobil-no-such-converter", 5);
        let result = converter.convert(Path::new("in.gpx"), Path::new("out.kml"));
        assert!(matches!(result, Err(ServiceError::IoError { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_reported() {
        // `true` and `false` ignore their arguments
        let ok = Converter::new("true", 5);
        assert_eq!(ok.convert(Path::new("a"), Path::new("b")), Ok(()));

        let failing = Converter::new("false", 5);
        let result = failing.convert(Path::new("a"), Path::new("b"));
        assert!(matches!(result, Err(ServiceError::ConvertFailed { .. })));
    }
}
