use anyhow::{Context, Result};
use std::io::{self, Write};

/// Reduces a remote path to a usable local file name.
///
/// Only the final path segment survives, and traversal sequences are removed
/// from it, so a server-supplied path can never escape the output directory.
pub fn sanitize_filename(remote_path: &str) -> String {
    let base = remote_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(remote_path);
    base.replace("..", "")
}

/// Reads one credential line from stdin.
pub fn prompt_credential(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush().context("Failed to flush prompt")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read credential from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn format_size(bytes: u64) -> String {
    let size_in_mb = bytes as f64 / 1_048_576.0;
    if size_in_mb >= 1_024.0 {
        format!("{:.2} GB", size_in_mb / 1_024.0)
    } else if size_in_mb >= 1.0 {
        format!("{:.2} MB", size_in_mb)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_plain_basename() {
        assert_eq!(sanitize_filename("report.txt"), "report.txt");
        assert_eq!(sanitize_filename("dir/report.txt"), "report.txt");
        assert_eq!(sanitize_filename("a/b/c/archive.tar.gz"), "archive.tar.gz");
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..\\..\\secret.txt"), "secret.txt");
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename("dir/.."), "");
    }

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(5), "5 B");
        assert_eq!(format_size(2 * 1_048_576), "2.00 MB");
        assert_eq!(format_size(3 * 1_073_741_824), "3.00 GB");
    }
}
