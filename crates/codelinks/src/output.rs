//! Terminal summaries of analysis runs

use crate::ProjectOutcome;
use codelinks_core::AnalyseWarning;
use owo_colors::OwoColorize;

/// Per-project counts, one block per project
pub fn render_summary(outcomes: &[ProjectOutcome]) -> String {
    let mut output = String::new();

    for outcome in outcomes {
        let stats = &outcome.result.stats;
        output.push_str(&format!(
            "{} {} ({} files, {} comments)\n",
            "##".bold(),
            outcome.name.cyan().bold(),
            stats.files,
            stats.comments
        ));

        for (label, count) in [
            ("need-id-refs", stats.need_id_refs),
            ("one-line needs", stats.oneline_needs),
            ("marked rst blocks", stats.marked_rst),
        ] {
            if count > 0 {
                output.push_str(&format!(
                    "   {} {} {}\n",
                    "Found".green(),
                    count.to_string().green(),
                    label
                ));
            }
        }

        if stats.warnings > 0 {
            output.push_str(&format!(
                "   {} {} warnings\n",
                "!".yellow().bold(),
                stats.warnings.to_string().yellow()
            ));
        }
    }

    output
}

/// One line per warning; multi-line messages are indented below it
pub fn render_warnings(warnings: &[AnalyseWarning]) -> String {
    let mut output = String::new();
    for warning in warnings {
        let mut lines = warning.msg.lines();
        output.push_str(&format!(
            "   {}:{} [{}] {}\n",
            warning.file_path,
            warning.lineno,
            warning.sub_type.yellow(),
            lines.next().unwrap_or_default()
        ));
        for line in lines {
            output.push_str(&format!("      {}\n", line));
        }
    }
    output
}
