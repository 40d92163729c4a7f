//! Integration tests running the whole analysis over a fixture project
#![cfg(feature = "walk")]

use codelinks_core::oneline::OneLineStyle;
use codelinks_core::{
    AnalyseConfig, FieldValue, GitInfo, Language, RecordPayload, SourceAnalyse, WalkSources,
    WarningType, dump_warnings, load_warnings,
};
use std::path::{Path, PathBuf};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn sample_dir() -> PathBuf {
    Path::new(FIXTURES_DIR).join("sample")
}

fn analyse_sample(configure: impl FnOnce(&mut AnalyseConfig)) -> codelinks_core::AnalysisResult {
    let mut config = AnalyseConfig::new(sample_dir(), Language::Cpp);
    configure(&mut config);
    config.validate().expect("sample config should be valid");

    SourceAnalyse::with_git(config, GitInfo::default())
        .run(
            WalkSources::new(sample_dir())
                .language(Language::Cpp)
                .exclude(["build/*"])
                .include(["build/keep.cpp"]),
        )
        .expect("analysis should succeed")
}

/// The fixture brackets one-line needs so they never collide with `@need-ids:`
fn bracketed_style() -> OneLineStyle {
    OneLineStyle {
        start_sequence: "[[".to_string(),
        end_sequence: "]]".to_string(),
        ..Default::default()
    }
}

fn relative(path: &Path) -> String {
    path.strip_prefix(sample_dir())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[test]
fn test_anchor_records_over_discovered_files() {
    let result = analyse_sample(|_| {});

    assert_eq!(result.stats.files, 3, "keep.cpp, parser.cpp and util.hpp");
    let found: Vec<(String, usize, Vec<String>)> = result
        .records
        .iter()
        .map(|r| match &r.payload {
            RecordPayload::NeedIdRefs { need_ids, .. } => {
                (relative(&r.filepath), r.start_row(), need_ids.clone())
            }
            other => panic!("unexpected payload {:?}", other),
        })
        .collect();

    assert_eq!(
        found,
        vec![
            ("build/keep.cpp".to_string(), 0, vec!["REQ_KEEP".to_string()]),
            (
                "src/parser.cpp".to_string(),
                2,
                vec!["REQ_PARSE_1".to_string(), "REQ_PARSE_2".to_string()]
            ),
            ("src/util.hpp".to_string(), 3, vec!["REQ_UTIL_1".to_string()]),
        ]
    );

    let parser = &result.records[1];
    assert!(
        parser
            .tagged_scope
            .as_deref()
            .is_some_and(|s| s.starts_with("int parse_header(")),
        "anchor should tag the following function: {:?}",
        parser.tagged_scope
    );
    assert!(result.warnings.is_empty());
}

#[test]
fn test_all_extractors_together() {
    let result = analyse_sample(|c| {
        c.get_oneline_needs = true;
        c.oneline_style = bracketed_style();
        c.get_rst = true;
    });

    let parser: Vec<_> = result
        .records
        .iter()
        .filter(|r| relative(&r.filepath) == "src/parser.cpp")
        .collect();
    let kinds: Vec<(&str, usize)> = parser
        .iter()
        .map(|r| (r.payload.type_name(), r.start_row()))
        .collect();
    assert_eq!(
        kinds,
        vec![("need-id-refs", 2), ("need", 7), ("rst", 14)],
        "records are ordered by row within a file"
    );

    let RecordPayload::Need { need } = &parser[1].payload else {
        panic!("expected a one-line need");
    };
    assert_eq!(need.get("id"), Some(&FieldValue::from("IMPL_CHECKSUM")));
    assert_eq!(
        need.get("links"),
        Some(&FieldValue::from(vec!["REQ_PARSE_3".to_string()]))
    );

    let RecordPayload::Rst { rst, need: Some(need) } = &parser[2].payload else {
        panic!("expected a parsed rst block");
    };
    assert!(rst.starts_with(".. impl:: Frame decoder"));
    assert_eq!(need.get("title"), Some(&FieldValue::from("Frame decoder")));
    assert_eq!(need.get("id"), Some(&FieldValue::from("IMPL_DECODE")));
    assert_eq!(
        need.get("links"),
        Some(&FieldValue::from(vec![
            "REQ_PARSE_1".to_string(),
            "REQ_PARSE_2".to_string()
        ]))
    );
    assert!(
        parser[2]
            .tagged_scope
            .as_deref()
            .is_some_and(|s| s.starts_with("void decode()"))
    );

    assert_eq!(result.warnings.len(), 1);
    let warning = &result.warnings[0];
    assert_eq!(warning.kind, WarningType::Need);
    assert_eq!(warning.sub_type, "too_many_fields");
    assert_eq!(warning.lineno, 22);
    assert!(warning.file_path.ends_with("parser.cpp"));
}

#[test]
fn test_warnings_file_round_trip() {
    let result = analyse_sample(|c| {
        c.get_oneline_needs = true;
        c.oneline_style = bracketed_style();
    });
    assert_eq!(result.warnings.len(), 1);
    let outdir = tempfile::tempdir().unwrap();

    let path = dump_warnings(outdir.path(), &result.warnings).unwrap();
    assert!(path.ends_with("warnings/codelinks_warnings.json"));
    assert_eq!(load_warnings(outdir.path()).unwrap(), Some(result.warnings));
}

#[test]
fn test_records_serialize_as_json_array() {
    let result = analyse_sample(|_| {});
    let json = serde_json::to_value(&result.records).unwrap();
    let first = &json[0];
    assert_eq!(first["type"], "need-id-refs");
    assert_eq!(first["marker"], "@need-ids:");
    assert_eq!(first["need_ids"], serde_json::json!(["REQ_KEEP"]));
    assert_eq!(first["remote_url"], serde_json::Value::Null);
    assert_eq!(first["source_map"]["start"]["row"], 0);
    assert!(first.get("comment").is_none());
}

fn analyse_language(language: Language, parallel: bool) -> codelinks_core::AnalysisResult {
    let mut config = AnalyseConfig::new(sample_dir(), language);
    config.get_oneline_needs = true;
    config.oneline_style = bracketed_style();
    config.get_rst = true;
    config.validate().expect("sample config should be valid");

    SourceAnalyse::with_git(config, GitInfo::default())
        .parallel(parallel)
        .run(
            WalkSources::new(sample_dir())
                .language(language)
                .exclude(["build/*"]),
        )
        .expect("analysis should succeed")
}

const SAMPLE_LANGUAGES: [Language; 3] = [Language::Cpp, Language::Python, Language::Rust];

fn as_json(result: &codelinks_core::AnalysisResult) -> String {
    serde_json::to_string_pretty(&result.records).unwrap()
}

#[test]
fn test_sample_languages_all_yield_records() {
    for language in SAMPLE_LANGUAGES {
        let result = analyse_language(language, true);
        let kinds: Vec<&str> = result.records.iter().map(|r| r.payload.type_name()).collect();
        assert!(kinds.contains(&"need-id-refs"), "{}: {:?}", language, kinds);
    }

    let python = analyse_language(Language::Python, true);
    assert!(
        python
            .records
            .iter()
            .all(|r| relative(&r.filepath) == "tools/check.py")
    );
    let kinds: Vec<&str> = python.records.iter().map(|r| r.payload.type_name()).collect();
    assert_eq!(kinds, vec!["need-id-refs", "need", "rst"]);
}

#[test]
fn test_repeated_runs_serialize_identically() {
    for language in SAMPLE_LANGUAGES {
        let first = analyse_language(language, true);
        let second = analyse_language(language, true);
        assert_eq!(as_json(&first), as_json(&second), "{}", language);
        assert_eq!(first.warnings, second.warnings, "{}", language);
        assert_eq!(first.stats, second.stats, "{}", language);
    }
}

#[test]
fn test_parallel_and_sequential_runs_agree() {
    for language in SAMPLE_LANGUAGES {
        let parallel = analyse_language(language, true);
        let sequential = analyse_language(language, false);
        assert_eq!(as_json(&parallel), as_json(&sequential), "{}", language);
        assert_eq!(parallel.warnings, sequential.warnings, "{}", language);
        assert_eq!(parallel.stats, sequential.stats, "{}", language);
    }
}

#[test]
fn test_source_maps_never_end_before_they_start() {
    for language in SAMPLE_LANGUAGES {
        let result = analyse_language(language, true);
        assert!(!result.records.is_empty(), "{}", language);
        for record in &result.records {
            let (start, end) = (record.source_map.start, record.source_map.end);
            assert!(
                start.row < end.row || (start.row == end.row && start.column <= end.column),
                "{} {}: {:?} ends before it starts",
                language,
                relative(&record.filepath),
                record.source_map
            );
        }
    }
}
