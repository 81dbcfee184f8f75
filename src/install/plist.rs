//! launchd property list for the login agent.

use std::path::Path;

/// Everything that goes into the agent descriptor
#[derive(Debug, Clone)]
pub struct AgentDescriptor<'a> {
    pub label: &'a str,
    pub program: &'a Path,
    pub stdout_path: &'a Path,
    pub stderr_path: &'a Path,
}

impl AgentDescriptor<'_> {
    /// Render the descriptor as an XML property list. The agent starts at
    /// login and launchd restarts it whenever it exits.
    pub fn to_plist(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{program}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>KeepAlive</key>
    <true/>
    <key>ProcessType</key>
    <string>Interactive</string>
    <key>StandardOutPath</key>
    <string>{stdout}</string>
    <key>StandardErrorPath</key>
    <string>{stderr}</string>
</dict>
</plist>
"#,
            label = xml_escape(self.label),
            program = xml_escape(&self.program.to_string_lossy()),
            stdout = xml_escape(&self.stdout_path.to_string_lossy()),
            stderr = xml_escape(&self.stderr_path.to_string_lossy()),
        )
    }
}

/// Escape text for use inside an XML element
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
