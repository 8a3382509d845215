//! Report stream structure over whole batches.

use movebench::routine::Word;
use movebench::{
    case_count, run_sweep, PerfCounter, Reference, ReportMode, Reporter, SweepConfig,
};

fn counter() -> PerfCounter {
    PerfCounter::enable(false).expect("enable counter")
}

fn sweep_text(report: ReportMode, data_len_limit: usize) -> String {
    let config = SweepConfig {
        capacity: 512,
        data_len_limit,
        report,
    };
    let counter = counter();
    let mut reporter = Reporter::new(Vec::new(), false);
    run_sweep(&config, &counter, &Reference, &Word, &mut reporter).expect("sweep I/O");
    String::from_utf8(reporter.into_inner()).expect("utf8 report")
}

#[test]
fn final_length_batch_has_header_lines_and_summary() {
    let limit = 5;
    let text = sweep_text(ReportMode::FinalLength, limit);
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("data_len"), "header first: {}", lines[0]);

    // One measurement line per case at the final length only.
    let final_offset_limit = 2 * (limit - 1) + 5;
    let expected_lines = final_offset_limit * final_offset_limit;
    assert_eq!(lines.len(), 1 + expected_lines + 1);

    // Every measurement line is at the final length.
    for line in &lines[1..lines.len() - 1] {
        assert!(
            line.starts_with(&format!("{:<10}", limit - 1)),
            "line not at final length: {line}"
        );
    }

    let summary = lines.last().unwrap();
    assert_eq!(
        *summary,
        format!("word: {0} cases, {0} passed, 0 failed", case_count(limit))
    );
}

#[test]
fn report_none_emits_only_the_summary() {
    let text = sweep_text(ReportMode::None, 4);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("word:"));
}

#[test]
fn report_all_emits_every_case() {
    let limit = 3;
    let text = sweep_text(ReportMode::All, limit);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + case_count(limit) + 1);
}
