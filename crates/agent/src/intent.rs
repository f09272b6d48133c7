//! Intent matcher: walks the template table in priority order against the
//! canonicalized message. First template whose pattern matches and whose
//! slots all resolve wins; slot failure disqualifies the template and the
//! walk continues. Pure function of (text, static registry).

use regex::Captures;

use licibot_core::domain::query::CandidateQuery;
use licibot_core::schema;

use crate::templates::{build_sql, SlotValues, TemplateKind, TemplateRegistry};

#[derive(Clone, Debug)]
pub struct IntentMatch {
    pub kind: TemplateKind,
    pub confidence: u8,
    pub slots: SlotValues,
    pub query: CandidateQuery,
}

pub struct IntentMatcher {
    registry: TemplateRegistry,
}

impl IntentMatcher {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Deterministic first-match-wins over the ordered registry. Expects
    /// text already passed through `normalize::canonicalize`.
    pub fn match_message(&self, canonical_text: &str) -> Option<IntentMatch> {
        for template in self.registry.templates() {
            let captures = template
                .patterns
                .iter()
                .find_map(|pattern| pattern.captures(canonical_text));

            let Some(captures) = captures else {
                continue;
            };

            // A matching pattern with an unresolvable slot disqualifies the
            // whole template, not just this pattern.
            let Some(slots) = extract_slots(template.kind, &captures) else {
                continue;
            };

            let query = build_sql(template.kind, &slots);
            return Some(IntentMatch {
                kind: template.kind,
                confidence: template.confidence,
                slots,
                query,
            });
        }

        None
    }
}

fn extract_slots(kind: TemplateKind, captures: &Captures<'_>) -> Option<SlotValues> {
    let mut slots = SlotValues::default();

    if let Some(raw) = capture(captures, "region") {
        slots.region = Some(schema::canonical_region(raw)?);
    }
    if let Some(raw) = capture(captures, "estado") {
        slots.estado = Some(schema::canonical_estado(raw)?);
    }
    if let Some(raw) = capture(captures, "tipo") {
        slots.tipo_proceso = Some(schema::canonical_tipo_proceso(raw)?);
    }
    if let Some(raw) = capture(captures, "anio") {
        let anio = raw.parse::<i32>().ok()?;
        if !(1998..=2100).contains(&anio) {
            return None;
        }
        slots.anio = Some(anio);
    }
    if let Some(raw) = capture(captures, "n") {
        let n = raw.parse::<u32>().ok()?;
        if n == 0 {
            return None;
        }
        slots.top_n = Some(n);
    }

    // Count-by-tipo exists only to catch tipo phrasings; without a
    // resolved tipo the generic count template should handle the text.
    if kind == TemplateKind::CountByTipo && slots.tipo_proceso.is_none() {
        return None;
    }

    Some(slots)
}

fn capture<'t>(captures: &'t Captures<'_>, name: &str) -> Option<&'t str> {
    captures.name(name).map(|m| m.as_str().trim()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use crate::normalize::canonicalize;
    use crate::templates::{TemplateKind, TemplateRegistry};

    use super::IntentMatcher;

    fn matcher() -> IntentMatcher {
        IntentMatcher::new(TemplateRegistry::standard().expect("registry"))
    }

    #[test]
    fn count_by_region_resolves_to_canonical_lima() {
        let matched = matcher()
            .match_message(&canonicalize("¿Cuántas licitaciones hay en Lima?"))
            .expect("should match");

        assert_eq!(matched.kind, TemplateKind::CountTenders);
        assert_eq!(matched.slots.region, Some("LIMA"));
        assert!(matched.query.sql.contains("region = 'LIMA'"));
        assert!(matched.query.sql.starts_with("SELECT COUNT(*)"));
    }

    #[test]
    fn matching_is_deterministic() {
        let text = canonicalize("¿Cuántas licitaciones hay en Lima?");
        let matcher = matcher();

        let first = matcher.match_message(&text).expect("first");
        let second = matcher.match_message(&text).expect("second");

        assert_eq!(first.kind, second.kind);
        assert_eq!(first.query.sql, second.query.sql);
        assert_eq!(first.confidence, second.confidence);
    }

    #[test]
    fn tipo_phrasing_wins_over_generic_count() {
        let matched = matcher()
            .match_message(&canonicalize("¿Cuántas licitaciones públicas hay en Lima?"))
            .expect("should match");

        assert_eq!(matched.kind, TemplateKind::CountByTipo);
        assert_eq!(matched.slots.tipo_proceso, Some("LICITACION PUBLICA"));
        assert!(matched.query.sql.contains("tipo_proceso = 'LICITACION PUBLICA'"));
    }

    #[test]
    fn estado_and_year_slots_resolve() {
        let matched = matcher()
            .match_message(&canonicalize("¿Cuántas licitaciones adjudicadas hay en Cusco en 2023?"))
            .expect("should match");

        assert_eq!(matched.kind, TemplateKind::CountTenders);
        assert_eq!(matched.slots.estado, Some("ADJUDICADO"));
        assert_eq!(matched.slots.region, Some("CUSCO"));
        assert_eq!(matched.slots.anio, Some(2023));
    }

    #[test]
    fn top_by_amount_with_synonym_region() {
        let matched = matcher()
            .match_message(&canonicalize("Top 5 licitaciones por monto en Lima Metropolitana"))
            .expect("should match");

        assert_eq!(matched.kind, TemplateKind::TopByAmount);
        assert_eq!(matched.slots.top_n, Some(5));
        assert_eq!(matched.slots.region, Some("LIMA"));
    }

    #[test]
    fn winners_question_via_buena_pro_synonym() {
        let matched = matcher()
            .match_message(&canonicalize("¿Qué empresa obtuvo la buena pro en Cusco?"))
            .expect("should match");

        assert_eq!(matched.kind, TemplateKind::TopWinners);
        assert_eq!(matched.slots.region, Some("CUSCO"));
    }

    #[test]
    fn unknown_region_disqualifies_and_yields_no_match() {
        assert!(matcher()
            .match_message(&canonicalize("¿Cuántas licitaciones hay en Mordor?"))
            .is_none());
    }

    #[test]
    fn free_form_questions_fall_through_to_the_llm_path() {
        assert!(matcher()
            .match_message(&canonicalize(
                "compara el gasto en obras viales entre la costa y la sierra"
            ))
            .is_none());
    }
}
