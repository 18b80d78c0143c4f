use serde::{Deserialize, Serialize};

use crate::detect::field_model::{FieldType, OPID_ATTR};
use crate::detect::session::DetectionSession;
use crate::dom::document::DomDocument;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInstruction {
    pub field_opid: String,
    pub value: String,
}

/// A fill request against one cached detection result, identified by the
/// generation the mapping was produced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillRequest {
    pub generation: u64,
    pub fields_to_fill: Vec<FillInstruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillSkip {
    pub field_opid: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub success: bool,
    pub filled: usize,
    pub skipped: Vec<FillSkip>,
}

/// Write values into the document.
///
/// Lookup goes through the session cache first; a cache miss (stale
/// generation, removed element) falls back to the opid attribute the
/// detector stamped on the element. Failures are per-field: logged,
/// skipped, and never abort the rest of the batch.
pub fn fill_fields(
    doc: &mut DomDocument,
    session: &DetectionSession,
    request: &FillRequest,
    tracer: &TraceLogger,
) -> FillResult {
    let mut filled = 0usize;
    let mut skipped = Vec::new();

    for instruction in &request.fields_to_fill {
        let opid = &instruction.field_opid;

        let node = match session.lookup(opid, request.generation) {
            Ok(field) => {
                if field.metadata.field_type == FieldType::Password {
                    skipped.push(skip(tracer, opid, "refusing to fill a password field"));
                    continue;
                }
                Some(field.node)
            }
            // Stale cache or unknown opid: best-effort recovery via the
            // stamped attribute.
            Err(_) => doc.find_by_attr(OPID_ATTR, opid),
        };

        let Some(node) = node else {
            skipped.push(skip(tracer, opid, "target element not found"));
            continue;
        };

        if doc
            .attr(node, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("password"))
        {
            skipped.push(skip(tracer, opid, "refusing to fill a password field"));
            continue;
        }

        doc.set_value(node, &instruction.value);
        filled += 1;
        tracer.log(&TraceEvent::stage("fill").with_opid(opid).with_detail("applied"));
    }

    FillResult {
        success: true,
        filled,
        skipped,
    }
}

fn skip(tracer: &TraceLogger, opid: &str, reason: &str) -> FillSkip {
    tracer.log(&TraceEvent::stage("fill").with_opid(opid).with_detail(reason));
    FillSkip {
        field_opid: opid.to_string(),
        reason: reason.to_string(),
    }
}
