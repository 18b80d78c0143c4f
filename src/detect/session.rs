use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::detect::field_model::{DetectedField, DetectionResult};
use crate::error::AutofillError;

/// Re-detection waits for this quiet period after the last observed DOM
/// mutation. Re-detection invalidates every opid, so running it on each
/// mutation of a burst would thrash any in-flight fill.
pub const MUTATION_DEBOUNCE_MS: u64 = 500;

/// Owns the per-frame detection cache.
///
/// Every `install` replaces the cache wholesale and bumps the generation
/// counter; lookups carry the generation they were minted against, and a
/// stale generation is an error rather than a silently wrong element.
pub struct DetectionSession {
    generation: u64,
    fields: HashMap<String, DetectedField>,
    form_count: usize,
}

impl DetectionSession {
    pub fn new() -> Self {
        Self {
            generation: 0,
            fields: HashMap::new(),
            form_count: 0,
        }
    }

    /// Replace the cache with a fresh detection pass. Returns the new
    /// generation, which consumers must present on lookup.
    pub fn install(&mut self, result: &DetectionResult) -> u64 {
        self.generation += 1;
        self.fields.clear();
        self.form_count = result.forms.len();

        for form in &result.forms {
            for field in &form.fields {
                self.fields.insert(field.opid.clone(), field.clone());
            }
        }

        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn form_count(&self) -> usize {
        self.form_count
    }

    /// Look up a field by opid, rejecting lookups minted against an older
    /// detection pass.
    pub fn lookup(&self, opid: &str, generation: u64) -> Result<&DetectedField, AutofillError> {
        if generation != self.generation {
            return Err(AutofillError::StaleGeneration {
                opid: opid.to_string(),
                requested: generation,
                current: self.generation,
            });
        }
        self.fields.get(opid).ok_or_else(|| AutofillError::FieldNotFound {
            opid: opid.to_string(),
            context: "not present in the current detection cache".into(),
        })
    }

    /// All cached fields of one form, in no particular order.
    pub fn fields_of_form(&self, form_opid: &str) -> Vec<&DetectedField> {
        self.fields
            .values()
            .filter(|f| f.form_opid == form_opid)
            .collect()
    }
}

impl Default for DetectionSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Mutation debounce
// ============================================================================

/// Collapses a burst of DOM mutations into one re-detection trigger.
/// Time is injected so the policy is testable without sleeping.
pub struct MutationDebouncer {
    quiet: Duration,
    last_mutation: Option<Instant>,
}

impl MutationDebouncer {
    pub fn new() -> Self {
        Self::with_quiet_period(Duration::from_millis(MUTATION_DEBOUNCE_MS))
    }

    pub fn with_quiet_period(quiet: Duration) -> Self {
        Self {
            quiet,
            last_mutation: None,
        }
    }

    /// Record one observed mutation.
    pub fn record(&mut self, at: Instant) {
        self.last_mutation = Some(at);
    }

    /// Whether the quiet period has elapsed since the last mutation.
    /// Consumes the pending trigger when it fires.
    pub fn should_redetect(&mut self, now: Instant) -> bool {
        match self.last_mutation {
            Some(last) if now.duration_since(last) >= self.quiet => {
                self.last_mutation = None;
                true
            }
            _ => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.last_mutation.is_some()
    }
}

impl Default for MutationDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
