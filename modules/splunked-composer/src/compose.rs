//! SPL generation: a single pass over the request, stage by stage.
//!
//! Stage order is fixed (data sources, includes, excludes, time range, output)
//! because the explanation text follows it.

use std::collections::{HashMap, HashSet};

use splunked_common::{Catalog, DataSource, FilterObject, OutputShape, TimeRangePreset};
use tracing::debug;

use crate::explain::Explanation;
use crate::fragment::{is_generating, is_negated, normalize, wrap, wrap_if_or};
use crate::request::{Components, Composition, CompositionRequest};

/// Tokens always substituted alongside the configured placeholder.
const LEGACY_FIELD_PLACEHOLDERS: [&str; 2] = ["{field1}", "{field2}"];

// ---------------------------------------------------------------------------
// Catalog index
// ---------------------------------------------------------------------------

/// Id lookups over one catalog snapshot, built once per request.
///
/// Patterns and field values share one filter namespace. If an id appears in
/// both lists the pattern wins.
pub struct CatalogIndex<'a> {
    data_sources: HashMap<&'a str, &'a DataSource>,
    filters: HashMap<&'a str, &'a FilterObject>,
    output_shapes: HashMap<&'a str, &'a OutputShape>,
    time_ranges: HashMap<&'a str, &'a TimeRangePreset>,
}

impl<'a> CatalogIndex<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        let mut filters = HashMap::new();
        for filter in catalog.patterns.iter().chain(&catalog.field_values) {
            filters.entry(filter.id.as_str()).or_insert(filter);
        }

        Self {
            data_sources: catalog
                .data_sources
                .iter()
                .map(|ds| (ds.id.as_str(), ds))
                .collect(),
            filters,
            output_shapes: catalog
                .output_shapes
                .iter()
                .map(|os| (os.id.as_str(), os))
                .collect(),
            time_ranges: catalog
                .time_range_presets
                .iter()
                .map(|tr| (tr.id.as_str(), tr))
                .collect(),
        }
    }

    pub fn data_source(&self, id: &str) -> Option<&'a DataSource> {
        self.data_sources.get(id).copied()
    }

    pub fn filter(&self, id: &str) -> Option<&'a FilterObject> {
        self.filters.get(id).copied()
    }

    pub fn output_shape(&self, id: &str) -> Option<&'a OutputShape> {
        self.output_shapes.get(id).copied()
    }

    pub fn time_range(&self, id: &str) -> Option<&'a TimeRangePreset> {
        self.time_ranges.get(id).copied()
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The search that every filter attaches to.
#[derive(Debug, PartialEq)]
enum BaseSearch {
    Empty,
    /// First generating source; anchors the pipeline.
    Generating(String),
    /// Event-filter fragments, to be OR'd together.
    Events(Vec<String>),
}

/// Build an SPL query and its explanation from a composition request.
///
/// Never fails: ids that do not resolve, or resolve to an empty fragment, are
/// dropped from both the query and the explanation.
pub fn generate(request: &CompositionRequest, catalog: &Catalog) -> Composition {
    let index = CatalogIndex::new(catalog);
    let mut explanation = Explanation::default();

    let base = resolve_data_sources(&request.data_sources, &index, &mut explanation);

    let mut filter_parts = resolve_includes(&request.includes, &index, &mut explanation);
    filter_parts.extend(resolve_excludes(&request.excludes, &index, &mut explanation));

    let time = resolve_time_range(&request.time_range, &index, &mut explanation);

    let base_search = assemble_base_search(base, &filter_parts, time.as_deref());

    let output = request
        .output_shape
        .as_deref()
        .and_then(|id| resolve_output_shape(id, &request.output_field, &index, &mut explanation))
        .unwrap_or_default();

    let spl = if output.is_empty() {
        base_search.clone()
    } else {
        format!("{base_search} {output}")
    };

    Composition {
        spl,
        explanation: explanation.finish(),
        components: Components {
            base_search,
            output_shape: output,
        },
    }
}

/// Request id lists behave as sets: first occurrence wins, order kept.
fn unique(ids: &[String]) -> impl Iterator<Item = &str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.as_str())
        .filter(move |id| seen.insert(*id))
}

fn resolve_data_sources(
    ids: &[String],
    index: &CatalogIndex<'_>,
    explanation: &mut Explanation,
) -> BaseSearch {
    let mut generating: Vec<(&str, String)> = Vec::new();
    let mut events: Vec<(&str, String)> = Vec::new();
    let mut skipped = 0;

    for id in unique(ids) {
        let Some(ds) = index.data_source(id) else {
            skipped += 1;
            continue;
        };
        let spl = normalize(&ds.spl_fragment);
        if spl.is_empty() {
            skipped += 1;
        } else if is_generating(&spl) {
            generating.push((ds.name.as_str(), spl));
        } else {
            events.push((ds.name.as_str(), spl));
        }
    }
    log_skipped("data sources", skipped);

    // A generating command must start the pipeline; only the first is honored.
    if let Some((name, spl)) = generating.into_iter().next() {
        if !events.is_empty() {
            debug!(ignored = events.len(), "Generating data source overrides event sources");
        }
        explanation.record("Search in", &[name]);
        return BaseSearch::Generating(spl);
    }

    if events.is_empty() {
        return BaseSearch::Empty;
    }

    let names: Vec<&str> = events.iter().map(|(name, _)| *name).collect();
    explanation.record("Search in", &names);
    BaseSearch::Events(events.into_iter().map(|(_, spl)| spl).collect())
}

/// Filters that resolved to a usable fragment, plus how many ids did not.
struct ResolvedFilters<'a> {
    /// `(name, normalized fragment)` pairs in request order.
    found: Vec<(&'a str, String)>,
    skipped: usize,
}

fn resolve_filters<'a>(ids: &[String], index: &CatalogIndex<'a>) -> ResolvedFilters<'a> {
    let mut resolved = ResolvedFilters {
        found: Vec::new(),
        skipped: 0,
    };
    for id in unique(ids) {
        let spl = index
            .filter(id)
            .map(|filter| (filter.name.as_str(), normalize(&filter.spl_fragment)));
        match spl {
            Some((name, spl)) if !spl.is_empty() => resolved.found.push((name, spl)),
            _ => resolved.skipped += 1,
        }
    }
    resolved
}

/// One debug line per stage with the number of dropped ids.
fn log_skipped(stage: &str, skipped: usize) {
    if skipped > 0 {
        debug!(stage, skipped, "Skipped ids with no usable fragment");
    }
}

fn resolve_includes(
    ids: &[String],
    index: &CatalogIndex<'_>,
    explanation: &mut Explanation,
) -> Vec<String> {
    let resolved = resolve_filters(ids, index);
    log_skipped("includes", resolved.skipped);

    let (names, parts): (Vec<&str>, Vec<String>) = resolved
        .found
        .into_iter()
        .map(|(name, spl)| (name, wrap_if_or(&spl)))
        .unzip();
    explanation.record("Filter for", &names);
    parts
}

fn resolve_excludes(
    ids: &[String],
    index: &CatalogIndex<'_>,
    explanation: &mut Explanation,
) -> Vec<String> {
    let resolved = resolve_filters(ids, index);
    log_skipped("excludes", resolved.skipped);

    let (names, parts): (Vec<&str>, Vec<String>) = resolved
        .found
        .into_iter()
        .map(|(name, spl)| {
            let negated = if is_negated(&spl) {
                wrap_if_or(&spl)
            } else {
                format!("NOT {}", wrap(&spl))
            };
            (name, negated)
        })
        .unzip();
    explanation.record("Excluding", &names);
    parts
}

/// A preset id resolves to its fragment; anything else is custom SPL.
fn resolve_time_range(
    time_range: &str,
    index: &CatalogIndex<'_>,
    explanation: &mut Explanation,
) -> Option<String> {
    if time_range.trim().is_empty() {
        return None;
    }

    if let Some(preset) = index.time_range(time_range) {
        let spl = normalize(&preset.spl_fragment);
        if spl.is_empty() {
            log_skipped("time range", 1);
            return None;
        }
        explanation.record("Time range", &[preset.name.as_str()]);
        return Some(spl);
    }

    explanation.record("Time range", &[time_range]);
    Some(normalize(time_range))
}

fn resolve_output_shape(
    id: &str,
    output_field: &str,
    index: &CatalogIndex<'_>,
    explanation: &mut Explanation,
) -> Option<String> {
    let Some(shape) = index.output_shape(id) else {
        log_skipped("output shape", 1);
        return None;
    };

    let mut spl = normalize(&shape.spl_fragment);
    if spl.is_empty() {
        log_skipped("output shape", 1);
        return None;
    }

    // A blank field counts as not supplied; otherwise it is used as given.
    if shape.requires_field && !output_field.trim().is_empty() {
        if !shape.field_placeholder.is_empty() {
            spl = spl.replace(&shape.field_placeholder, output_field);
        }
        for token in LEGACY_FIELD_PLACEHOLDERS {
            spl = spl.replace(token, output_field);
        }
    }

    explanation.record("Output", &[shape.name.as_str()]);
    Some(spl)
}

/// Stitch data sources, time range, and filters into the base search.
fn assemble_base_search(base: BaseSearch, filter_parts: &[String], time: Option<&str>) -> String {
    match base {
        BaseSearch::Generating(mut search) => {
            if let Some(time) = time {
                search.push(' ');
                search.push_str(time);
            }
            if !filter_parts.is_empty() {
                search.push_str(" | search ");
                search.push_str(&filter_parts.join(" "));
            }
            search
        }
        BaseSearch::Events(sources) => {
            let group = sources.join(" OR ");
            let head = if sources.len() > 1 && (!filter_parts.is_empty() || time.is_some()) {
                wrap(&group)
            } else {
                group
            };
            join_terms(
                std::iter::once(head.as_str())
                    .chain(time)
                    .chain(filter_parts.iter().map(String::as_str)),
            )
        }
        BaseSearch::Empty if filter_parts.is_empty() => {
            join_terms(std::iter::once("*").chain(time))
        }
        BaseSearch::Empty => {
            let joined = join_terms(filter_parts.iter().map(String::as_str).chain(time));
            if joined.is_empty() {
                "*".to_string()
            } else {
                joined
            }
        }
    }
}

fn join_terms<'a>(terms: impl Iterator<Item = &'a str>) -> String {
    terms
        .filter(|term| !term.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
