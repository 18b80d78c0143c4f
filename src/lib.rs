use std::time::Duration;

use crate::detect::field_model::{DetectedFieldSnapshot, FieldType};
use crate::detect::quality::{FilterStats, filter_fields};
use crate::dom::dom_model::DomSnapshot;
use crate::error::AutofillError;
use crate::fill::progress::{ProgressState, ProgressTracker};
use crate::frames::collector::{CollectResult, collect_forms, frames_from_snapshot};
use crate::matching::ai::AiMatcher;
use crate::matching::compress::{compress_fields, compress_memories};
use crate::matching::fallback::FallbackMatcher;
use crate::matching::mapping_model::{FieldMapping, apply_confidence_threshold};
use crate::memory::memory_model::MemoryEntry;
use crate::trace::{logger::TraceLogger, trace::TraceEvent};

pub mod cli;
pub mod detect;
pub mod dom;
pub mod error;
pub mod fill;
pub mod frames;
pub mod matching;
pub mod memory;
pub mod trace;

/// Everything one detect-and-match run produces.
pub struct MatchOutcome {
    pub collect: CollectResult,
    pub filter_stats: FilterStats,
    pub mappings: Vec<FieldMapping>,
}

/// Full pipeline: collect forms across frames, filter for quality,
/// compress, match, then gate auto-fill against the user threshold.
///
/// With no matcher configured the fallback matcher runs directly; with a
/// matcher, any model failure downgrades the whole batch to the fallback
/// inside the matcher itself. Only a whole-operation failure (no frame
/// responded at all) surfaces as an error.
pub fn run_match_pipeline(
    snapshot: DomSnapshot,
    memories: &[MemoryEntry],
    matcher: Option<&AiMatcher>,
    confidence_threshold: f32,
    frame_timeout: Duration,
    tracer: &TraceLogger,
) -> Result<MatchOutcome, AutofillError> {
    let mut progress = ProgressTracker::new();
    progress.advance(ProgressState::Detecting, tracer)?;

    // ---- Collect across frames ----
    let frames = frames_from_snapshot(snapshot);
    let collect = collect_forms(frames, frame_timeout);
    tracer.log(
        &TraceEvent::stage("collect")
            .with_counts(collect.forms.len(), collect.total_fields)
            .with_detail(format!(
                "{}/{} frames responded",
                collect.frames_responded, collect.frames_expected
            )),
    );

    if !collect.success {
        let message = collect
            .error
            .clone()
            .unwrap_or_else(|| "form collection failed".into());
        progress.fail(&message, tracer)?;
        return Err(AutofillError::MissingState(message));
    }

    // ---- Filter and compress ----
    progress.advance(ProgressState::Analyzing, tracer)?;

    let all_fields: Vec<DetectedFieldSnapshot> = collect
        .forms
        .iter()
        .flat_map(|form| form.fields.iter().cloned())
        // Authoritative password exclusion; the model prompt only restates it.
        .filter(|field| field.metadata.field_type != FieldType::Password)
        .collect();

    let (kept, filter_stats) = filter_fields(all_fields);
    tracer.log(&TraceEvent::stage("detect").with_filter_stats(&filter_stats));

    let compressed_fields = compress_fields(&kept);
    let compressed_memories = compress_memories(memories);

    // ---- Match ----
    progress.advance(ProgressState::Matching, tracer)?;

    let mut mappings = match matcher {
        Some(ai) => ai.match_fields(
            &compressed_fields,
            &compressed_memories,
            collect.website_context.as_ref(),
        ),
        None => FallbackMatcher::match_fields(&compressed_fields, &compressed_memories),
    };

    let matched = mappings.iter().filter(|m| m.value.is_some()).count();
    tracer.log(
        &TraceEvent::stage("match")
            .with_counts(mappings.len(), matched)
            .with_detail(match matcher {
                Some(ai) => ai.provider().to_string(),
                None => "fallback".to_string(),
            }),
    );

    // ---- Threshold for the preview/autopilot UI ----
    progress.advance(ProgressState::ShowingPreview, tracer)?;
    apply_confidence_threshold(&mut mappings, confidence_threshold);

    progress.advance(ProgressState::Completed, tracer)?;

    Ok(MatchOutcome {
        collect,
        filter_stats,
        mappings,
    })
}
