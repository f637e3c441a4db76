use stowage_core::FileProgress;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render progress records as a fixed-width table.
pub fn progress_table(rows: &[FileProgress]) -> String {
    let mut out = format!(
        "{:<36}  {:<32}  {:>12}  {:>12}  {:>7}  {}\n",
        "ID", "FILENAME", "UPLOADED", "SIZE", "PERCENT", "STATUS"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<36}  {:<32}  {:>12}  {:>12}  {:>6.1}%  {}\n",
            row.id,
            truncate_string(&row.filename, 32),
            row.uploaded_size,
            row.file_size,
            row.percentage,
            row.status
        ));
    }
    out
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::UploadStatus;
    use uuid::Uuid;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
        assert_eq!(truncate_string("ééééé", 4), "é...");
    }

    #[test]
    fn progress_table_has_one_line_per_file() {
        let rows = vec![FileProgress {
            id: Uuid::nil(),
            filename: "data.csv".to_string(),
            uploaded_size: 5,
            file_size: 10,
            percentage: 50.0,
            status: UploadStatus::InProgress,
        }];

        let table = progress_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("data.csv"));
        assert!(lines[1].contains("50.0%"));
        assert!(lines[1].ends_with("in_progress"));
    }
}
