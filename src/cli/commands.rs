use std::time::Duration;

use crate::cli::config::AppConfig;
use crate::detect::detector::FormDetector;
use crate::detect::field_model::{DetectedFieldSnapshot, FieldType};
use crate::detect::quality::filter_fields;
use crate::detect::session::DetectionSession;
use crate::detect::website::classify_website;
use crate::dom::document::DomDocument;
use crate::dom::dom_model::DomSnapshot;
use crate::error::AutofillError;
use crate::fill::filler::{FillInstruction, FillRequest, fill_fields};
use crate::frames::collector::{collect_forms, frames_from_snapshot};
use crate::matching::ai::AiMatcher;
use crate::matching::compress::{compress_fields, compress_memories};
use crate::matching::fallback::FallbackMatcher;
use crate::matching::mapping_model::apply_confidence_threshold;
use crate::memory::capture::{capture_form_values, save_captured_memories};
use crate::memory::store::MemoryStore;
use crate::run_match_pipeline;
use crate::trace::logger::TraceLogger;

// ============================================================================
// detect subcommand
// ============================================================================

pub fn cmd_detect(
    dom_path: &str,
    output: Option<&str>,
    config: &AppConfig,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(dom_path)?;
    let frames = frames_from_snapshot(snapshot);

    if verbose > 0 {
        eprintln!("Collecting forms from {} frame(s)...", frames.len());
    }

    let result = collect_forms(
        frames,
        Duration::from_millis(config.frames.gather_timeout_ms),
    );

    if verbose > 0 {
        eprintln!(
            "{} forms, {} fields ({}/{} frames responded)",
            result.forms.len(),
            result.total_fields,
            result.frames_responded,
            result.frames_expected
        );
    }

    write_or_print(output, &serde_json::to_string_pretty(&result)?)
}

// ============================================================================
// match subcommand
// ============================================================================

pub fn cmd_match(
    dom_path: &str,
    memories_path: &str,
    backend: &str,
    output: Option<&str>,
    config: &AppConfig,
    ollama_endpoint: Option<&str>,
    ollama_model: Option<&str>,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(dom_path)?;
    let store = MemoryStore::load(std::path::Path::new(memories_path))?;
    let matcher = build_matcher(backend, config, ollama_endpoint, ollama_model)?;
    let tracer = build_tracer(config);

    let outcome = run_match_pipeline(
        snapshot,
        store.entries(),
        matcher.as_ref(),
        config.matching.confidence_threshold,
        Duration::from_millis(config.frames.gather_timeout_ms),
        &tracer,
    )?;

    if verbose > 0 {
        let matched = outcome.mappings.iter().filter(|m| m.value.is_some()).count();
        eprintln!(
            "{} fields kept of {} detected, {} matched",
            outcome.filter_stats.kept, outcome.filter_stats.total, matched
        );
    }

    write_or_print(output, &serde_json::to_string_pretty(&outcome.mappings)?)
}

// ============================================================================
// fill subcommand
// ============================================================================

/// Single-document fill: detect, match, then write the auto-fillable
/// values back into the snapshot through the session cache.
pub fn cmd_fill(
    dom_path: &str,
    memories_path: &str,
    backend: &str,
    output: Option<&str>,
    config: &AppConfig,
    ollama_endpoint: Option<&str>,
    ollama_model: Option<&str>,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(dom_path)?;
    let store = MemoryStore::load(std::path::Path::new(memories_path))?;
    let matcher = build_matcher(backend, config, ollama_endpoint, ollama_model)?;
    let tracer = build_tracer(config);

    let mut doc = DomDocument::from_snapshot(snapshot);
    let mut detector = FormDetector::new();
    let result = detector.detect_all(&mut doc);

    let mut session = DetectionSession::new();
    let generation = session.install(&result);

    let context = classify_website(doc.url(), doc.title(), &result.forms);

    let fields: Vec<DetectedFieldSnapshot> = result
        .forms
        .iter()
        .flat_map(|f| f.fields.iter().map(|field| field.to_snapshot(0.0, 0.0)))
        .filter(|f| f.metadata.field_type != FieldType::Password)
        .collect();
    let (kept, _) = filter_fields(fields);

    let compressed_fields = compress_fields(&kept);
    let compressed_memories = compress_memories(store.entries());

    let mut mappings = match &matcher {
        Some(ai) => ai.match_fields(&compressed_fields, &compressed_memories, Some(&context)),
        None => FallbackMatcher::match_fields(&compressed_fields, &compressed_memories),
    };
    apply_confidence_threshold(&mut mappings, config.matching.confidence_threshold);

    let request = FillRequest {
        generation,
        fields_to_fill: mappings
            .iter()
            .filter(|m| m.auto_fill)
            .filter_map(|m| {
                m.fill_value().map(|value| FillInstruction {
                    field_opid: m.field_opid.clone(),
                    value: value.to_string(),
                })
            })
            .collect(),
    };

    let fill_result = fill_fields(&mut doc, &session, &request, &tracer);

    if verbose > 0 {
        eprintln!(
            "Filled {} field(s), skipped {}",
            fill_result.filled,
            fill_result.skipped.len()
        );
    }

    let report = serde_json::json!({
        "mappings": mappings,
        "fill": fill_result,
    });
    write_or_print(output, &serde_json::to_string_pretty(&report)?)
}

// ============================================================================
// capture subcommand
// ============================================================================

pub fn cmd_capture(
    dom_path: &str,
    form_opid: Option<&str>,
    store_path: &str,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(dom_path)?;
    let mut doc = DomDocument::from_snapshot(snapshot);
    let mut detector = FormDetector::new();
    let result = detector.detect_all(&mut doc);

    let mut captured = Vec::new();
    for form in &result.forms {
        if form_opid.is_none_or(|opid| form.opid == opid) {
            captured.extend(capture_form_values(&doc, form));
        }
    }

    if let Some(opid) = form_opid {
        if !result.forms.iter().any(|f| f.opid == opid) {
            return Err(Box::new(AutofillError::FieldNotFound {
                opid: opid.to_string(),
                context: "no form with this opid in the snapshot".into(),
            }));
        }
    }

    let mut store = MemoryStore::load(std::path::Path::new(store_path))?;
    let save = save_captured_memories(&mut store, &captured);

    if verbose > 0 {
        eprintln!(
            "Captured {} field(s), saved {} memorie(s)",
            captured.len(),
            save.saved_count
        );
    }

    println!("{}", serde_json::to_string_pretty(&save)?);
    if !save.success {
        std::process::exit(1);
    }
    Ok(())
}

// ============================================================================
// Shared helpers
// ============================================================================

fn load_snapshot(path: &str) -> Result<DomSnapshot, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&content).map_err(|e| AutofillError::JsonParse {
        context: format!("DOM snapshot {}", path),
        source: e,
    })?;
    Ok(snapshot)
}

fn build_matcher(
    backend: &str,
    config: &AppConfig,
    cli_endpoint: Option<&str>,
    cli_model: Option<&str>,
) -> Result<Option<AiMatcher>, Box<dyn std::error::Error>> {
    match backend {
        "fallback" => Ok(None),
        "ollama" => {
            let endpoint = cli_endpoint
                .or(config.ollama.endpoint.as_deref())
                .unwrap_or("http://localhost:11434/api/generate");
            let model = cli_model
                .or(config.ollama.model.as_deref())
                .unwrap_or("qwen2.5:1.5b");
            Ok(Some(AiMatcher::with_ollama(endpoint, model)))
        }
        other => Err(format!("unknown backend '{}' (expected fallback or ollama)", other).into()),
    }
}

fn build_tracer(config: &AppConfig) -> TraceLogger {
    match config.trace_file.as_deref() {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    }
}

fn write_or_print(output: Option<&str>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => std::fs::write(path, content)?,
        None => println!("{}", content),
    }
    Ok(())
}
