//! Plain-text narration of an analysis run.
//!
//! Everything is written to a caller-supplied [`Write`] so that the binary
//! can target stdout and tests can capture into a buffer.

use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

use episode_core::formatting::{format_duration, format_number};
use episode_data::analysis::AnalysisResult;
use episode_data::loader::EpisodeRecord;
use episode_data::reader::LoadFailure;
use episode_data::report::Report;

use crate::table_view::rows_from_report;

/// What the console printer shows besides the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// Print the meta block, instruction list and segment statistics of
    /// every surviving episode.
    pub verbose: bool,
}

/// Print the whole run: episode details when verbose, then failures and the
/// summary.
pub fn print_analysis<W: Write>(
    out: &mut W,
    result: &AnalysisResult,
    options: ConsoleOptions,
) -> io::Result<()> {
    if options.verbose {
        for record in &result.records {
            print_episode(out, record)?;
        }
    }
    print_failures(out, &result.report.failed_files)?;
    print_summary(out, &result.report)
}

/// Meta information, instructions and segment statistics of one episode.
pub fn print_episode<W: Write>(out: &mut W, record: &EpisodeRecord) -> io::Result<()> {
    let ep = &record.episode;

    writeln!(out, "=== Meta Information ===")?;
    writeln!(out, "Source          : {}", record.source_path.display())?;
    writeln!(out, "Bag path        : {}", ep.bag_path)?;
    writeln!(out, "HSR ID          : {}", ep.hsr_id)?;
    writeln!(out, "Version         : {}", ep.version)?;
    writeln!(out, "Location        : {}", ep.location_name)?;
    writeln!(out, "Interface       : {}", ep.interface)?;
    writeln!(out, "Git Branch      : {}", ep.git_branch)?;
    writeln!(out, "Git Hash        : {}", ep.git_hash)?;
    writeln!(out, "Date            : {}", ep.date.as_deref().unwrap_or("unknown"))?;
    writeln!(out)?;

    writeln!(out, "=== Instructions Summary ===")?;
    writeln!(out, "Total instructions: {}", record.instructions.len())?;
    writeln!(out)?;
    for (idx, label) in record.instructions.iter().enumerate() {
        writeln!(out, "{:02}: {}", idx, label)?;
    }
    writeln!(out)?;

    writeln!(out, "=== Segment Time Statistics ===")?;
    writeln!(
        out,
        "Total duration : {} ({:.2} sec)",
        format_duration(ep.total_time),
        ep.total_time
    )?;
    writeln!(out, "Mean duration  : {:.2} sec", ep.mean_duration)?;
    writeln!(out, "Max duration   : {:.2} sec", ep.max_duration)?;
    writeln!(out, "Min duration   : {:.2} sec", ep.min_duration)?;
    writeln!(out, "Total segments : {}", ep.total_segments)?;
    writeln!(out, "Suboptimal segments: {}", ep.suboptimal_segments)?;
    writeln!(out)?;

    if record.suboptimal.is_empty() {
        writeln!(out, "No suboptimal segments detected.")?;
    } else {
        writeln!(out, "=== Suboptimal Segments ===")?;
        let quoted: Vec<String> = record
            .suboptimal
            .iter()
            .map(|s| match &s.instruction {
                Some(label) => format!("\"{}\"", label),
                None => "(unknown)".to_string(),
            })
            .collect();
        let width = quoted.iter().map(|q| q.width()).max().unwrap_or(0);

        for (segment, label) in record.suboptimal.iter().zip(&quoted) {
            let index = segment
                .instructions_index
                .map(|i| format!("{:02}", i))
                .unwrap_or_else(|| "--".to_string());
            writeln!(
                out,
                "- Instruction {}: {} (Duration: {:.2} sec)",
                index,
                pad_to_width(label, width),
                segment.duration
            )?;
        }
    }
    writeln!(out)?;
    Ok(())
}

/// One line per skipped metadata file.
pub fn print_failures<W: Write>(out: &mut W, failures: &[LoadFailure]) -> io::Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(out, "=== Skipped Files ({}) ===", failures.len())?;
    for failure in failures {
        writeln!(out, "- {}: {}", failure.path, failure.reason)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Totals, the per-date table and the distinct value sets.
pub fn print_summary<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    writeln!(out, "=== Summary ===")?;
    writeln!(out, "Total duration : {:.2} (sec)", report.total_duration_sec)?;
    writeln!(
        out,
        "Total duration : {} (hours)",
        format_number(report.total_duration_hours, 2)
    )?;
    writeln!(
        out,
        "Episodes       : {} ({} undated)",
        report.total_episodes, report.undated_episodes
    )?;
    writeln!(
        out,
        "Segments       : {} ({} suboptimal)",
        report.total_segments, report.total_suboptimal_segments
    )?;
    if !report.filter_conditions.is_empty() {
        let conditions: Vec<String> = report
            .filter_conditions
            .conditions()
            .iter()
            .map(|(key, value)| match value.as_str() {
                Some(text) => format!("{}={}", key, text),
                None => format!("{}={}", key, value),
            })
            .collect();
        writeln!(out, "Filter         : {}", conditions.join(", "))?;
    }
    if let Some(date_from) = &report.date_from {
        writeln!(out, "Date from      : {}", date_from)?;
    }
    writeln!(out)?;

    let rows = rows_from_report(report);
    if !rows.is_empty() {
        writeln!(
            out,
            "{:<10}  {:>8}  {:>8}  {:>10}  {:>10}",
            "Date", "Episodes", "Hours", "Cum. Eps", "Cum. Hours"
        )?;
        for row in &rows {
            writeln!(
                out,
                "{:<10}  {:>8}  {:>8}  {:>10}  {:>10}",
                row.date,
                row.count,
                format_number(row.hours, 2),
                row.cumulative_count,
                format_number(row.cumulative_hours, 2)
            )?;
        }
        writeln!(out)?;
    }

    print_labelled_list(out, "HSR IDs", &report.unique_hsr_ids)?;
    print_labelled_list(out, "Locations", &report.unique_locations)?;
    print_labelled_list(out, "Subtask types", &report.subtask_types)?;
    Ok(())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn print_labelled_list<W: Write>(out: &mut W, label: &str, items: &[String]) -> io::Result<()> {
    let shown: Vec<&str> = items
        .iter()
        .map(|s| if s.is_empty() { "(empty)" } else { s.as_str() })
        .collect();
    let body = if shown.is_empty() {
        "-".to_string()
    } else {
        shown.join(", ")
    };
    writeln!(out, "{:<15}: {}", label, body)
}

/// Right-pad `s` with spaces to `width` terminal columns.
fn pad_to_width(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(pad))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_view::tests::{empty_report, make_report};
    use episode_core::models::Episode;
    use episode_data::loader::SuboptimalSegment;
    use std::path::PathBuf;

    fn make_record(suboptimal: Vec<SuboptimalSegment>) -> EpisodeRecord {
        EpisodeRecord {
            episode: Episode {
                date: Some("2024-06-01".to_string()),
                total_time: 3725.0,
                mean_duration: 1862.5,
                max_duration: 2000.0,
                min_duration: 1725.0,
                total_segments: 2,
                suboptimal_segments: suboptimal.len(),
                bag_path: "run-a-24-06-01-x/episode.bag".into(),
                hsr_id: "7".to_string(),
                version: "2.1".into(),
                location_name: "siteA".into(),
                interface: "vr".into(),
                git_branch: "main".into(),
                git_hash: "deadbeef".into(),
            },
            source_path: PathBuf::from("/data/run-a-24-06-01-x/meta.json"),
            instructions: vec!["コップを取る".to_string(), "place cup".to_string()],
            suboptimal,
        }
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ── print_episode ─────────────────────────────────────────────────────────

    #[test]
    fn test_print_episode_meta_and_instructions() {
        let text = render(|out| print_episode(out, &make_record(vec![])));

        assert!(text.contains("Bag path        : run-a-24-06-01-x/episode.bag"));
        assert!(text.contains("HSR ID          : 7"));
        assert!(text.contains("00: コップを取る"));
        assert!(text.contains("01: place cup"));
        assert!(text.contains("Total duration : 1:02:05 (3725.00 sec)"));
        assert!(text.contains("No suboptimal segments detected."));
    }

    #[test]
    fn test_print_episode_suboptimal_aligned_by_display_width() {
        let record = make_record(vec![
            SuboptimalSegment {
                instructions_index: Some(0),
                instruction: Some("コップを取る".to_string()),
                duration: 18.0,
            },
            SuboptimalSegment {
                instructions_index: Some(1),
                instruction: Some("place cup".to_string()),
                duration: 6.5,
            },
        ]);
        let text = render(|out| print_episode(out, &record));

        assert!(text.contains("=== Suboptimal Segments ==="));
        let lines: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("- Instruction"))
            .collect();
        assert_eq!(lines.len(), 2);
        let column = |line: &str| line.split("(Duration").next().unwrap().width();
        assert_eq!(column(lines[0]), column(lines[1]));
        assert!(lines[1].ends_with("(Duration: 6.50 sec)"));
    }

    #[test]
    fn test_print_episode_unresolved_instruction() {
        let record = make_record(vec![SuboptimalSegment {
            instructions_index: None,
            instruction: None,
            duration: 1.0,
        }]);
        let text = render(|out| print_episode(out, &record));
        assert!(text.contains("- Instruction --: (unknown) (Duration: 1.00 sec)"));
    }

    // ── print_failures ────────────────────────────────────────────────────────

    #[test]
    fn test_print_failures() {
        let failures = vec![LoadFailure {
            path: "/data/x/meta.json".to_string(),
            reason: "missing field `segments`".to_string(),
        }];
        let text = render(|out| print_failures(out, &failures));
        assert!(text.contains("=== Skipped Files (1) ==="));
        assert!(text.contains("- /data/x/meta.json: missing field `segments`"));

        assert!(render(|out| print_failures(out, &[])).is_empty());
    }

    // ── print_summary ─────────────────────────────────────────────────────────

    #[test]
    fn test_print_summary() {
        let text = render(|out| print_summary(out, &make_report()));

        assert!(text.contains("Total duration : 12600.00 (sec)"));
        assert!(text.contains("Total duration : 3.50 (hours)"));
        assert!(text.contains("Episodes       : 4 (1 undated)"));
        assert!(text.contains("2024-06-02"));
        assert!(text.contains("Locations      : siteA, siteB"));
        assert!(text.contains("Subtask types  : grasp"));
        assert!(!text.contains("Filter"));
    }

    #[test]
    fn test_print_summary_empty_report() {
        let text = render(|out| print_summary(out, &empty_report()));
        assert!(text.contains("Total duration : 0.00 (sec)"));
        assert!(!text.contains("Cum. Eps"));
        assert!(text.contains("HSR IDs        : -"));
    }

    #[test]
    fn test_print_summary_shows_filter_and_bound() {
        let mut report = make_report();
        report.filter_conditions.insert("location_name", "siteA");
        report.date_from = Some("2024-06-01".to_string());

        let text = render(|out| print_summary(out, &report));
        assert!(text.contains("Filter         : location_name=siteA"));
        assert!(text.contains("Date from      : 2024-06-01"));
    }

    #[test]
    fn test_pad_to_width_wide_characters() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("取る", 6), "取る  ");
        assert_eq!(pad_to_width("toolong", 3), "toolong");
    }
}
