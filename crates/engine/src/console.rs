//! Operator-facing console output.

use std::io::{self, IsTerminal, Stdout, Write};

use ansi_term::Color;
use iacheck_core::{CheckResult, CheckStatus, RunReport, TaskKind};

/// Prefixed line writer: `[+]` info, `[*]` progress, `[!]` warning, `[-]` error.
///
/// Prefixes are colored when the console is built with color enabled.
pub struct Console<W: Write> {
    out: W,
    color: bool,
}

impl Console<Stdout> {
    /// Console on standard output, colored when it is a terminal.
    pub fn stdout() -> Self {
        let out = io::stdout();
        let color = out.is_terminal();
        Self::new(out).with_color(color)
    }
}

impl<W: Write> Console<W> {
    /// Wrap a writer. Output is plain until [`with_color`](Self::with_color).
    pub fn new(out: W) -> Self {
        Self { out, color: false }
    }

    /// Enable or disable colored prefixes.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, prefix: &str, color: Color, msg: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}{}", color.paint(prefix), msg)
        } else {
            writeln!(self.out, "{}{}", prefix, msg)
        }
    }

    /// Informational line.
    pub fn info(&mut self, msg: &str) -> io::Result<()> {
        self.line("[+] ", Color::Blue, msg)
    }

    /// Progress line.
    pub fn debug(&mut self, msg: &str) -> io::Result<()> {
        self.line("[*] ", Color::White, msg)
    }

    /// Warning line.
    pub fn warning(&mut self, msg: &str) -> io::Result<()> {
        self.line("[!] ", Color::Yellow, msg)
    }

    /// Error line.
    pub fn error(&mut self, msg: &str) -> io::Result<()> {
        self.line("[-] ", Color::Red, msg)
    }

    /// Print one check result.
    pub fn result(&mut self, result: &CheckResult) -> io::Result<()> {
        let mut title = result.check.display().to_string();
        if let Some(target) = &result.target {
            title.push_str(&format!(" [{}]", target));
        }
        match &result.summary {
            Some(summary) => self.debug(&format!("{}: {}", title, summary))?,
            None => self.debug(&title)?,
        }

        match result.status {
            CheckStatus::Skipped => return self.warning("No task defined, skipping"),
            CheckStatus::Error => {
                return self.error(&format!(
                    "Error executing check: {}",
                    result.error.as_deref().unwrap_or("unknown error")
                ))
            }
            CheckStatus::Manual => {
                for note in result.output.lines() {
                    self.warning(note)?;
                }
                self.warning("")?;
                return self.warning("");
            }
            _ => {}
        }

        let label = match result.kind {
            Some(TaskKind::WebRequest) => match result.http_status {
                Some(status) => format!("Response ({})", status),
                None => "Response".to_string(),
            },
            _ => "Output of cmd".to_string(),
        };
        self.info(&format!("{}:\n{}", label, result.output))?;
        self.info("")?;
        self.info("")?;

        for (name, value) in &result.captures {
            self.info(&format!("{} = {}", name, value))?;
        }

        match result.status {
            CheckStatus::Passed => self.info("PASSED"),
            CheckStatus::Failed => self.error("FAILED: expectation not met"),
            _ => Ok(()),
        }
    }

    /// Print the closing summary.
    pub fn summary(&mut self, report: &RunReport) -> io::Result<()> {
        let c = report.counts();
        let line = format!(
            "{} checks: {} passed, {} failed, {} completed, {} manual, {} skipped, {} errors",
            c.total, c.passed, c.failed, c.completed, c.manual, c.skipped, c.errors
        );
        if report.succeeded() {
            self.info(&line)
        } else {
            self.error(&line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Console<Vec<u8>>) -> io::Result<()>) -> String {
        let mut console = Console::new(Vec::new());
        f(&mut console).unwrap();
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_prefixes() {
        let out = render(|c| {
            c.info("i")?;
            c.debug("d")?;
            c.warning("w")?;
            c.error("e")
        });
        assert_eq!(out, "[+] i\n[*] d\n[!] w\n[-] e\n");
    }

    #[test]
    fn test_colored_prefixes() {
        let mut console = Console::new(Vec::new()).with_color(true);
        console.info("i").unwrap();
        console.error("e").unwrap();
        let out = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(
            out,
            format!("{}i\n{}e\n", Color::Blue.paint("[+] "), Color::Red.paint("[-] "))
        );
        assert!(out.starts_with("\u{1b}[34m[+] \u{1b}[0mi\n"));
    }

    #[test]
    fn test_notes_result() {
        let mut result = CheckResult::new("n.yaml", CheckStatus::Manual);
        result.kind = Some(TaskKind::Notes);
        result.output = "step one\nstep two".to_string();
        let out = render(|c| c.result(&result));
        assert_eq!(out, "[*] n.yaml\n[!] step one\n[!] step two\n[!] \n[!] \n");
    }

    #[test]
    fn test_cmd_result_with_target() {
        let mut result = CheckResult::new("c.yaml", CheckStatus::Passed);
        result.kind = Some(TaskKind::Cmd);
        result.summary = Some("ssh".to_string());
        result.target = Some("h1".to_string());
        result.output = "ok".to_string();
        let out = render(|c| c.result(&result));
        assert!(out.starts_with("[*] c.yaml [h1]: ssh\n[+] Output of cmd:\nok\n"));
        assert!(out.ends_with("[+] PASSED\n"));
    }

    #[test]
    fn test_error_result() {
        let result = CheckResult::error("e.yaml", "unknown task type: ftp");
        let out = render(|c| c.result(&result));
        assert_eq!(out, "[*] e.yaml\n[-] Error executing check: unknown task type: ftp\n");
    }

    #[test]
    fn test_summary() {
        let mut report = RunReport::new();
        report.results.push(CheckResult::new("a", CheckStatus::Completed));
        let out = render(|c| c.summary(&report));
        assert!(out.starts_with("[+] 1 checks: 0 passed"));

        report.results.push(CheckResult::new("b", CheckStatus::Failed));
        let out = render(|c| c.summary(&report));
        assert!(out.starts_with("[-] 2 checks"));
    }
}
