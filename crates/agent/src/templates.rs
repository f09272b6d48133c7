//! Declarative question-template table: one entry per recognized question
//! shape, evaluated in fixed priority order (most specific first). Adding a
//! new question shape is a data change here, not a code change in the
//! matcher.

use regex::Regex;

use licibot_core::domain::query::CandidateQuery;
use licibot_core::schema;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateKind {
    TopByAmount,
    TopWinners,
    SumAmount,
    CountByTipo,
    CountTenders,
}

/// Slot values extracted from user text, already resolved to canonical
/// dimension values. Unresolvable mentions never land here; they
/// disqualify the template instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotValues {
    pub region: Option<&'static str>,
    pub estado: Option<&'static str>,
    pub tipo_proceso: Option<&'static str>,
    pub anio: Option<i32>,
    pub top_n: Option<u32>,
}

pub struct QueryTemplate {
    pub kind: TemplateKind,
    pub patterns: Vec<Regex>,
    pub confidence: u8,
}

pub struct TemplateRegistry {
    templates: Vec<QueryTemplate>,
}

const MAX_TOP_N: u32 = 20;
const WINNERS_LIMIT: u32 = 10;

impl TemplateRegistry {
    /// The standard ordered table. Built once at startup; order is the
    /// priority (first match wins).
    pub fn standard() -> Result<Self, regex::Error> {
        let templates = vec![
            QueryTemplate {
                kind: TemplateKind::TopByAmount,
                patterns: compile(&[
                    r"^(?:cuales son |dame |muestrame )?(?:el top |top |las |los )(?P<n>\d{1,2})(?: licitaciones)?(?: mas grandes| mayores| de mayor monto| por monto(?: referencial)?)?(?: (?:en|de) (?P<region>[a-z ]+?))?(?: (?:en el |en |del )(?P<anio>\d{4}))?$",
                ])?,
                confidence: 90,
            },
            QueryTemplate {
                kind: TemplateKind::TopWinners,
                patterns: compile(&[
                    r"^(?:quien|quienes|que empresas?) (?:gano|ganaron|ha ganado|han ganado)(?: mas)?(?: licitaciones)?(?: (?:en|de) (?P<region>[a-z ]+?))?(?: (?:en el |en |del )(?P<anio>\d{4}))?$",
                    r"^(?:principales|mayores|top) ganadores(?: de licitaciones)?(?: (?:en|de) (?P<region>[a-z ]+?))?$",
                ])?,
                confidence: 85,
            },
            QueryTemplate {
                kind: TemplateKind::SumAmount,
                patterns: compile(&[
                    r"^(?:cual es el |cuanto es el )?monto (?:referencial )?total(?: de (?:las )?licitaciones)?(?: (?:en|de) (?P<region>[a-z ]+?))?(?: (?:en el |en |del )(?P<anio>\d{4}))?$",
                    r"^cuanto suman las licitaciones(?: (?:en|de) (?P<region>[a-z ]+?))?(?: (?:en el |en |del )(?P<anio>\d{4}))?$",
                ])?,
                confidence: 80,
            },
            QueryTemplate {
                kind: TemplateKind::CountByTipo,
                patterns: compile(&[
                    r"^cuant[ao]s (?P<tipo>[a-z ]+?) hay(?: (?:en|de) (?P<region>[a-z ]+?))?(?: (?:en el |en |del )(?P<anio>\d{4}))?$",
                ])?,
                confidence: 75,
            },
            QueryTemplate {
                kind: TemplateKind::CountTenders,
                patterns: compile(&[
                    r"^cuant[ao]s licitaciones(?: (?P<estado>[a-z ]+?))? hay(?: (?:en|de) (?P<region>[a-z ]+?))?(?: (?:en el |en |del )(?P<anio>\d{4}))?(?: en total)?$",
                    r"^cuant[ao]s licitaciones(?: (?P<estado>[a-z ]+?))? (?:existen|se registraron) (?:en|de) (?P<region>[a-z ]+?)(?: (?:en el |en |del )(?P<anio>\d{4}))?$",
                    r"^(?:numero|cantidad) de licitaciones(?: (?P<estado>[a-z ]+?))?(?: (?:en|de) (?P<region>[a-z ]+?))?(?: (?:en el |en |del )(?P<anio>\d{4}))?$",
                ])?,
                confidence: 70,
            },
        ];

        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[QueryTemplate] {
        &self.templates
    }
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|pattern| Regex::new(pattern)).collect()
}

/// Build the parameterized statement for a matched template. Slot values
/// are canonical whitelist members, so inlining them as literals is safe
/// and keeps the surfaced SQL self-contained.
pub fn build_sql(kind: TemplateKind, slots: &SlotValues) -> CandidateQuery {
    let mut conditions: Vec<String> = Vec::new();
    let mut bindings: Vec<(&'static str, String)> = Vec::new();

    let column_prefix = if kind == TemplateKind::TopWinners { "l." } else { "" };

    if let Some(estado) = slots.estado {
        conditions.push(format!("{column_prefix}estado = '{estado}'"));
        bindings.push(("estado", estado.to_string()));
    }
    if let Some(tipo) = slots.tipo_proceso {
        conditions.push(format!("{column_prefix}tipo_proceso = '{tipo}'"));
        bindings.push(("tipo_proceso", tipo.to_string()));
    }
    if let Some(region) = slots.region {
        conditions.push(format!("{column_prefix}region = '{region}'"));
        bindings.push(("region", region.to_string()));
    }
    if let Some(anio) = slots.anio {
        conditions.push(format!("{column_prefix}anio = {anio}"));
        bindings.push(("anio", anio.to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let table = schema::LICITACIONES_CABECERA.name;
    let sql = match kind {
        TemplateKind::CountTenders | TemplateKind::CountByTipo => {
            format!("SELECT COUNT(*) AS total FROM {table}{where_clause}")
        }
        TemplateKind::SumAmount => {
            format!("SELECT SUM(monto_referencial) AS monto_total FROM {table}{where_clause}")
        }
        TemplateKind::TopByAmount => {
            let n = slots.top_n.unwrap_or(5).clamp(1, MAX_TOP_N);
            bindings.push(("top_n", n.to_string()));
            format!(
                "SELECT nomenclatura, descripcion, region, monto_referencial \
                 FROM {table}{where_clause} \
                 ORDER BY monto_referencial DESC LIMIT {n}"
            )
        }
        TemplateKind::TopWinners => {
            format!(
                "SELECT a.ganador_nombre, COUNT(*) AS total_adjudicaciones \
                 FROM {awards} a JOIN {table} l ON l.id = a.licitacion_id{where_clause} \
                 GROUP BY a.ganador_nombre \
                 ORDER BY total_adjudicaciones DESC LIMIT {WINNERS_LIMIT}",
                awards = schema::ADJUDICACIONES.name,
            )
        }
    };

    CandidateQuery::from_template(sql, bindings)
}

#[cfg(test)]
mod tests {
    use super::{build_sql, SlotValues, TemplateKind, TemplateRegistry};

    #[test]
    fn registry_orders_most_specific_first() {
        let registry = TemplateRegistry::standard().expect("registry");
        let kinds: Vec<_> = registry.templates().iter().map(|template| template.kind).collect();

        assert_eq!(
            kinds,
            vec![
                TemplateKind::TopByAmount,
                TemplateKind::TopWinners,
                TemplateKind::SumAmount,
                TemplateKind::CountByTipo,
                TemplateKind::CountTenders,
            ]
        );
    }

    #[test]
    fn count_sql_inlines_canonical_region() {
        let slots = SlotValues { region: Some("LIMA"), ..SlotValues::default() };
        let query = build_sql(TemplateKind::CountTenders, &slots);

        assert_eq!(
            query.sql,
            "SELECT COUNT(*) AS total FROM licitaciones_cabecera WHERE region = 'LIMA'"
        );
        assert_eq!(query.bindings, vec![("region", "LIMA".to_string())]);
    }

    #[test]
    fn count_sql_combines_estado_region_and_year() {
        let slots = SlotValues {
            region: Some("CUSCO"),
            estado: Some("ADJUDICADO"),
            anio: Some(2023),
            ..SlotValues::default()
        };
        let query = build_sql(TemplateKind::CountTenders, &slots);

        assert_eq!(
            query.sql,
            "SELECT COUNT(*) AS total FROM licitaciones_cabecera \
             WHERE estado = 'ADJUDICADO' AND region = 'CUSCO' AND anio = 2023"
        );
    }

    #[test]
    fn top_by_amount_clamps_n_and_orders_by_amount() {
        let slots = SlotValues { top_n: Some(99), ..SlotValues::default() };
        let query = build_sql(TemplateKind::TopByAmount, &slots);

        assert!(query.sql.contains("ORDER BY monto_referencial DESC LIMIT 20"));
    }

    #[test]
    fn winners_sql_joins_awards_to_tenders() {
        let slots = SlotValues { region: Some("LIMA"), ..SlotValues::default() };
        let query = build_sql(TemplateKind::TopWinners, &slots);

        assert!(query.sql.contains("FROM adjudicaciones a JOIN licitaciones_cabecera l"));
        assert!(query.sql.contains("l.region = 'LIMA'"));
        assert!(query.sql.contains("GROUP BY a.ganador_nombre"));
    }
}
